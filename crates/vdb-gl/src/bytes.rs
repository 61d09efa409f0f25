//! Byte views of plain numeric data for buffer uploads.

/// Marker for plain numeric types that can be viewed as raw bytes.
///
/// # Safety
///
/// Only implement on types with no padding, no pointers and no invalid bit
/// patterns (f32, u32 and the like, or `#[repr(C)]` aggregates of them).
pub unsafe trait AsBytes: Copy {
    /// View `self` as a byte slice of length `size_of::<Self>()`.
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: implementors are padding-free plain data, so all
        // `size_of::<Self>()` bytes behind the reference are initialised.
        unsafe {
            std::slice::from_raw_parts(self as *const Self as *const u8, std::mem::size_of::<Self>())
        }
    }
}

unsafe impl AsBytes for u32 {}
unsafe impl AsBytes for f32 {}

/// View a slice of plain values as bytes in native byte order.
pub fn slice_as_bytes<T: AsBytes>(data: &[T]) -> &[u8] {
    // SAFETY: `T: AsBytes` guarantees every byte of the slice is initialised
    // plain data; the length covers exactly the slice's memory.
    unsafe { std::slice::from_raw_parts(data.as_ptr().cast::<u8>(), std::mem::size_of_val(data)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_view_covers_every_element() {
        let data = [1u32, 2, 3];
        let bytes = slice_as_bytes(&data);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[4..8], &2u32.to_ne_bytes());
    }

    #[test]
    fn empty_slice_has_no_bytes() {
        let data: [f32; 0] = [];
        assert!(slice_as_bytes(&data).is_empty());
    }

    #[test]
    fn single_value_view() {
        assert_eq!(1.0f32.as_bytes(), &1.0f32.to_ne_bytes());
    }
}
