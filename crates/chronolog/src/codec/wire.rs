//! Big-endian primitives shared by the binary codec

use chronolog_core::error::{CodecError, Result};

#[derive(Default)]
pub(crate) struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_bits().to_be_bytes());
    }

    /// `[len: u32][utf8]`
    pub fn put_str(&mut self, field: &'static str, s: &str) -> Result<()> {
        let len = u32::try_from(s.len()).map_err(|_| CodecError::NameTooLong {
            field,
            len: s.len(),
            max: u32::MAX as usize,
        })?;
        self.put_u32(len);
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// Presence flag, then the string when present
    pub fn put_opt_str(&mut self, field: &'static str, s: Option<&str>) -> Result<()> {
        self.put_bool(s.is_some());
        match s {
            Some(s) => self.put_str(field, s),
            None => Ok(()),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

pub(crate) struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(CodecError::Truncated { needed, remaining }.into());
        }
        let slice = &self.buf[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn get_bool(&mut self) -> Result<bool> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidFlag(other).into()),
        }
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    pub fn get_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(u64::from_be_bytes(self.take_array()?)))
    }

    /// Reads a length-prefixed string; the length is checked against the
    /// remaining input before anything is allocated.
    pub fn get_str(&mut self, field: &'static str) -> Result<String> {
        let len = self.get_u32()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8(field).into())
    }

    /// Like `get_str`, but a length prefix above `max` fails before any read
    pub fn get_bounded_str(&mut self, field: &'static str, max: usize) -> Result<String> {
        let len = self.get_u32()? as usize;
        if len > max {
            return Err(CodecError::NameTooLong { field, len, max }.into());
        }
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8(field).into())
    }

    pub fn get_opt_str(&mut self, field: &'static str) -> Result<Option<String>> {
        if self.get_bool()? {
            self.get_str(field).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Read a count of items each at least `min_item_bytes` long
    pub fn get_count(&mut self, min_item_bytes: usize) -> Result<usize> {
        let count = self.get_u32()? as usize;
        let needed = count.saturating_mul(min_item_bytes);
        let remaining = self.remaining();
        if needed > remaining {
            return Err(CodecError::Truncated { needed, remaining }.into());
        }
        Ok(count)
    }

    /// Fails if input remains
    pub fn finish(self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronolog_core::ChronologError;

    #[test]
    fn test_length_prefix_checked_before_allocation() {
        let mut w = WireWriter::default();
        w.put_u32(u32::MAX);
        w.put_u8(b'x');
        let bytes = w.into_bytes();

        let mut r = WireReader::new(&bytes);
        let err = r.get_str("message").unwrap_err();
        assert!(matches!(
            err,
            ChronologError::Codec(CodecError::Truncated { remaining: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_flag() {
        let mut r = WireReader::new(&[2]);
        assert!(matches!(
            r.get_bool(),
            Err(ChronologError::Codec(CodecError::InvalidFlag(2)))
        ));
    }

    #[test]
    fn test_count_bounded_by_remaining() {
        let mut w = WireWriter::default();
        w.put_u32(1_000_000);
        let bytes = w.into_bytes();
        assert!(WireReader::new(&bytes).get_count(1).is_err());
    }

    #[test]
    fn test_trailing_bytes() {
        let mut r = WireReader::new(&[0, 0, 0, 1, 9]);
        assert_eq!(r.get_u32().unwrap(), 1);
        assert!(matches!(
            r.finish(),
            Err(ChronologError::Codec(CodecError::TrailingBytes(1)))
        ));
    }
}
