/// Bounds applied while decoding nested structures.
///
/// Each nested message costs one level of recursion, so `max_depth` protects
/// the call stack against deeply nested input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Number of nested message levels below the top level that are decoded.
    pub max_depth: usize,
}

impl Limits {
    /// Same as protobuf's default recursion limit.
    pub const DEFAULT_MAX_DEPTH: usize = 100;

    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DEPTH)
    }
}
