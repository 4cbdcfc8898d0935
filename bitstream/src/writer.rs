//! Growable byte writer for encoding big-endian records.

/// A byte writer that appends big-endian integers to a growable buffer.
///
/// Writes never fail; the buffer grows as needed. Bounding the output is the
/// job of the frame layer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    /// Creates a new empty `ByteWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `ByteWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
        }
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Discards everything written, keeping the allocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    /// Writes a big-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a big-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a big-endian `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Finishes writing and returns the byte buffer.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// Finishes writing and appends to the provided buffer.
    pub fn finish_into(mut self, buf: &mut Vec<u8>) {
        buf.append(&mut self.bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_writer() {
        let writer = ByteWriter::new();
        assert_eq!(writer.len(), 0);
        assert!(writer.is_empty());
        assert!(writer.finish().is_empty());
    }

    #[test]
    fn write_u8_appends() {
        let mut writer = ByteWriter::new();
        writer.write_u8(0xAB);
        writer.write_u8(0x01);
        assert_eq!(writer.finish(), vec![0xAB, 0x01]);
    }

    #[test]
    fn write_u16_is_big_endian() {
        let mut writer = ByteWriter::new();
        writer.write_u16(0xABCD);
        assert_eq!(writer.finish(), vec![0xAB, 0xCD]);
    }

    #[test]
    fn write_u32_is_big_endian() {
        let mut writer = ByteWriter::new();
        writer.write_u32(0x1234_5678);
        assert_eq!(writer.finish(), vec![0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn write_i32_negative() {
        let mut writer = ByteWriter::new();
        writer.write_i32(-2);
        assert_eq!(writer.finish(), vec![0xFF, 0xFF, 0xFF, 0xFE]);
    }

    #[test]
    fn clear_keeps_writer_usable() {
        let mut writer = ByteWriter::with_capacity(8);
        writer.write_u32(7);
        writer.clear();
        assert!(writer.is_empty());
        writer.write_u8(3);
        assert_eq!(writer.as_slice(), &[3]);
    }

    #[test]
    fn finish_into() {
        let mut writer = ByteWriter::new();
        writer.write_u8(0xAB);

        let mut buf = vec![0x00, 0x11];
        writer.finish_into(&mut buf);
        assert_eq!(buf, vec![0x00, 0x11, 0xAB]);
    }
}
