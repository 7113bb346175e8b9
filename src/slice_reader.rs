/// A mutable reader of an immutable data source
pub struct SliceReader<'x> {
    data: &'x [u8],
    pos: usize,
}

impl<'x> SliceReader<'x> {
    pub fn new(data: &'x [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Remaining data to read
    pub fn len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Offset of the next byte to read, relative to the start of the data source
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Advances the position by `n`.
    /// Note that advancing beyond the end of the data source is illegal and undefined behaviour.
    fn advance_by(&mut self, n: usize) {
        self.pos += n;
        debug_assert!(self.pos <= self.data.len())
    }

    /// Reads `n` bytes and advances the reader by `n`
    pub fn read(&mut self, n: usize) -> Option<&'x [u8]> {
        if self.len() < n {
            return None;
        }
        let out = &self.data[self.pos..self.pos + n];
        self.advance_by(n);
        Some(out)
    }

    /// Reads `N` bytes and advances the reader by `N`.
    /// The result is copied into an array
    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let consumed = self.read(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(consumed);
        Some(out)
    }

    /// Reads all bytes up to and including the first one with the high bit cleared.
    /// Returns None without advancing if no such byte remains.
    pub fn read_varint_groups(&mut self) -> Option<&'x [u8]> {
        let rest = &self.data[self.pos..];
        let end = rest.iter().position(|byte| byte & 0x80 == 0)?;
        self.read(end + 1)
    }
}
