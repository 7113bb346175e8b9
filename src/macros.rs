/// Declares structs that implement [`Record`](crate::Record).
///
/// Each field is written as `name: Type = number`. Leaving out `= number`
/// declares a field that is not mapped to the wire. Every declared struct can
/// in turn be used as a nested field of another record.
///
/// ## Example
///
/// ```
/// use partbuf::{decode_record, encode_record, record};
///
/// record! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Author {
///         pub id: u64 = 1,
///         pub name: String = 2,
///     }
///
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Post {
///         pub title: String = 1,
///         pub author: Option<Box<Author>> = 2,
///         pub tags: Vec<String> = 3,
///         pub views: u64,
///     }
/// }
///
/// let post = Post {
///     title: "Hello".to_string(),
///     author: Some(Box::new(Author { id: 7, name: "Ann".to_string() })),
///     tags: vec!["intro".to_string()],
///     views: 12,
/// };
/// let bytes = encode_record(&post).unwrap();
///
/// let mut decoded = Post::default();
/// decode_record(&bytes, &mut decoded).unwrap();
/// assert_eq!(decoded, Post { views: 0, ..post });
/// ```
#[macro_export]
macro_rules! record {
    ($(
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(= $number:literal)?
            ),* $(,)?
        }
    )*) => {$(
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            fn fields(&self) -> ::std::vec::Vec<$crate::Field<$crate::FieldRef<'_>>> {
                ::std::vec![$(
                    $crate::Field {
                        name: ::core::stringify!($field),
                        number: $crate::__field_number!($($number)?),
                        slot: $crate::FieldType::as_field(&self.$field),
                    }
                ),*]
            }

            fn fields_mut(&mut self) -> ::std::vec::Vec<$crate::Field<$crate::FieldMut<'_>>> {
                ::std::vec![$(
                    $crate::Field {
                        name: ::core::stringify!($field),
                        number: $crate::__field_number!($($number)?),
                        slot: $crate::FieldType::as_field_mut(&mut self.$field),
                    }
                ),*]
            }
        }

        impl $crate::FieldType for $name {
            fn as_field(&self) -> $crate::FieldRef<'_> {
                $crate::FieldRef::Message(self)
            }

            fn as_field_mut(&mut self) -> $crate::FieldMut<'_> {
                $crate::FieldMut::Message(self)
            }
        }
    )*};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_number {
    () => {
        ::core::option::Option::None
    };
    ($number:literal) => {
        ::core::option::Option::Some($number)
    };
}
