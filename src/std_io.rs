//! `std::io` integration, enabled by the `std` feature.

use std::io;

use crate::{DynVec, SocowVec};

impl io::Write for DynVec<u8> {
    /// Appends the buffer, growing as needed. Never errors.
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }

    #[inline]
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<const N: usize> io::Write for SocowVec<u8, N> {
    /// Appends the buffer, growing (and unsharing) as needed. Never errors.
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }

    #[inline]
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{DynVec, SocowVec};
    use std::io::Write;

    #[test]
    fn write_into_dyn_vec() {
        let mut vec: DynVec<u8> = DynVec::new();
        write!(vec, "{}-{}", 1, 2).unwrap();
        assert_eq!(vec.as_slice(), b"1-2");
    }

    #[test]
    fn write_into_socow_vec_unshares() {
        let mut vec: SocowVec<u8, 2> = crate::socowvec![b'a', b'b', b'c'];
        let original = vec.clone();
        vec.write_all(b"de").unwrap();
        assert_eq!(vec.as_slice(), b"abcde");
        assert_eq!(original.as_slice(), b"abc");
    }
}
