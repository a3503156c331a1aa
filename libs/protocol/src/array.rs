//! Borrowed views over packed little-endian element arrays.

use core::fmt;
use core::marker::PhantomData;
use core::slice::ChunksExact;

use crate::Error;

/// Fixed-width scalar that can live inside a packed array.
pub trait Element: Copy + fmt::Debug {
    const WIDTH: usize;

    /// Decode from exactly `WIDTH` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode into exactly `WIDTH` bytes.
    fn write_le(self, out: &mut [u8]);
}

macro_rules! impl_element {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Element for $ty {
                const WIDTH: usize = core::mem::size_of::<$ty>();

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_element!(u8, i8, u16, i16, u32, i32);

/// Non-owning view of `T` elements packed in a byte region.
///
/// The view never copies; element values are decoded on access so the
/// underlying bytes need no particular alignment.
#[derive(Clone, Copy)]
pub struct ArrayView<'a, T: Element> {
    bytes: &'a [u8],
    _element: PhantomData<T>,
}

impl<'a, T: Element> ArrayView<'a, T> {
    pub const fn empty() -> Self {
        Self {
            bytes: &[],
            _element: PhantomData,
        }
    }

    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, Error> {
        if bytes.len() % T::WIDTH != 0 {
            return Err(Error::MisalignedArray);
        }
        Ok(Self {
            bytes,
            _element: PhantomData,
        })
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.bytes.len() / T::WIDTH
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn get(&self, index: usize) -> Option<T> {
        let start = index.checked_mul(T::WIDTH)?;
        let end = start.checked_add(T::WIDTH)?;
        self.bytes.get(start..end).map(T::read_le)
    }

    pub fn iter(&self) -> Iter<'a, T> {
        Iter {
            chunks: self.bytes.chunks_exact(T::WIDTH),
            _element: PhantomData,
        }
    }
}

impl<'a> From<&'a [u8]> for ArrayView<'a, u8> {
    fn from(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            _element: PhantomData,
        }
    }
}

impl<T: Element> PartialEq for ArrayView<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<T: Element> Eq for ArrayView<'_, T> {}

impl<T: Element> fmt::Debug for ArrayView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(feature = "defmt")]
impl<T: Element> defmt::Format for ArrayView<'_, T> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ArrayView(len={}, {=[u8]:x})", self.len(), self.bytes)
    }
}

impl<'a, T: Element> IntoIterator for ArrayView<'a, T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, T: Element> {
    chunks: ChunksExact<'a, u8>,
    _element: PhantomData<T>,
}

impl<T: Element> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.chunks.next().map(T::read_le)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl<T: Element> ExactSizeIterator for Iter<'_, T> {}
