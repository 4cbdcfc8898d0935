//! Frame record layout: `(serializer_index, payload)` pairs.
//!
//! The frame carries no header and no record lengths. Each payload is
//! self-delimiting for the serializer that wrote it, so a reader must hand
//! control to that serializer's decoder after reading the index byte.

use bitstream::{ByteReader, ByteWriter};

use crate::error::{DecodeError, EncodeError, WireResult};
use crate::limits::Limits;

/// Number of distinct serializer indices a single index byte can address.
pub const MAX_SERIALIZERS: usize = 256;

/// Position of a serializer in an entity's registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SerializerIndex(u8);

impl SerializerIndex {
    /// Creates an index from its wire byte.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Returns the wire byte.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns the index as a slot position.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<usize> for SerializerIndex {
    type Error = EncodeError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        u8::try_from(index)
            .map(Self)
            .map_err(|_| EncodeError::SerializerIndexOutOfRange {
                index,
                limit: MAX_SERIALIZERS,
            })
    }
}

/// Builds one frame from per-serializer payloads.
#[derive(Debug)]
pub struct FrameWriter {
    bytes: ByteWriter,
    max_frame_bytes: usize,
    records: usize,
}

impl FrameWriter {
    /// Creates an empty frame bounded by `limits`.
    #[must_use]
    pub fn new(limits: &Limits) -> Self {
        Self {
            bytes: ByteWriter::new(),
            max_frame_bytes: limits.max_frame_bytes,
            records: 0,
        }
    }

    /// Appends `index` followed by `payload`.
    ///
    /// Empty payloads are skipped and no index byte is written; returns
    /// whether a record was appended.
    pub fn write_record(
        &mut self,
        index: SerializerIndex,
        payload: &[u8],
    ) -> Result<bool, EncodeError> {
        if payload.is_empty() {
            return Ok(false);
        }
        let needed = self.bytes.len() + 1 + payload.len();
        if needed > self.max_frame_bytes {
            return Err(EncodeError::FrameTooLarge {
                needed,
                limit: self.max_frame_bytes,
            });
        }
        self.bytes.write_u8(index.raw());
        self.bytes.write_bytes(payload);
        self.records += 1;
        Ok(true)
    }

    /// Number of records appended so far.
    #[must_use]
    pub const fn record_count(&self) -> usize {
        self.records
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if no record has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the finished frame.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes.finish()
    }
}

/// Walks the index bytes of a received frame.
///
/// After [`next_record`](Self::next_record) returns an index, the caller
/// decodes that serializer's payload from [`payload`](Self::payload) before
/// asking for the next record.
#[derive(Debug)]
pub struct FrameReader<'a> {
    reader: ByteReader<'a>,
    max_serializers: usize,
    seen: [u64; 4],
}

impl<'a> FrameReader<'a> {
    /// Creates a reader, rejecting frames larger than the limit.
    pub fn new(bytes: &'a [u8], limits: &Limits) -> WireResult<Self> {
        if bytes.len() > limits.max_frame_bytes {
            return Err(DecodeError::FrameTooLarge {
                actual: bytes.len(),
                limit: limits.max_frame_bytes,
            });
        }
        Ok(Self {
            reader: ByteReader::new(bytes),
            max_serializers: limits.max_serializers.min(MAX_SERIALIZERS),
            seen: [0; 4],
        })
    }

    /// Reads the next serializer index, or `None` at the end of the frame.
    pub fn next_record(&mut self) -> WireResult<Option<SerializerIndex>> {
        if self.reader.is_empty() {
            return Ok(None);
        }
        let raw = self.reader.read_u8()?;
        if usize::from(raw) >= self.max_serializers {
            return Err(DecodeError::SerializerIndexOutOfRange {
                index: raw,
                limit: self.max_serializers,
            });
        }
        let word = usize::from(raw / 64);
        let bit = 1u64 << (raw % 64);
        if self.seen[word] & bit != 0 {
            return Err(DecodeError::DuplicateRecord { index: raw });
        }
        self.seen[word] |= bit;
        Ok(Some(SerializerIndex::new(raw)))
    }

    /// Cursor positioned at the current record's payload.
    pub fn payload(&mut self) -> &mut ByteReader<'a> {
        &mut self.reader
    }

    /// Current byte offset within the frame.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.reader.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_skipped() {
        let mut writer = FrameWriter::new(&Limits::default());
        assert!(!writer.write_record(SerializerIndex::new(0), &[]).unwrap());
        assert!(writer.is_empty());
        assert_eq!(writer.record_count(), 0);
        assert!(writer.finish().is_empty());
    }

    #[test]
    fn records_are_index_prefixed() {
        let mut writer = FrameWriter::new(&Limits::default());
        writer.write_record(SerializerIndex::new(0), &[0x02]).unwrap();
        writer
            .write_record(SerializerIndex::new(2), &[0x01, 0xFF])
            .unwrap();
        assert_eq!(writer.record_count(), 2);
        assert_eq!(writer.finish(), vec![0, 0x02, 2, 0x01, 0xFF]);
    }

    #[test]
    fn writer_enforces_frame_limit() {
        let limits = Limits {
            max_frame_bytes: 4,
            ..Limits::for_testing()
        };
        let mut writer = FrameWriter::new(&limits);
        writer.write_record(SerializerIndex::new(0), &[1, 2]).unwrap();
        let err = writer
            .write_record(SerializerIndex::new(1), &[3])
            .unwrap_err();
        assert_eq!(err, EncodeError::FrameTooLarge { needed: 5, limit: 4 });
        assert_eq!(writer.len(), 3);
    }

    #[test]
    fn reader_walks_records() {
        let bytes = [0, 0xAA, 1, 0xBB, 0xCC];
        let mut reader = FrameReader::new(&bytes, &Limits::default()).unwrap();
        assert_eq!(reader.next_record().unwrap(), Some(SerializerIndex::new(0)));
        assert_eq!(reader.payload().read_u8().unwrap(), 0xAA);
        assert_eq!(reader.next_record().unwrap(), Some(SerializerIndex::new(1)));
        assert_eq!(reader.payload().read_u16().unwrap(), 0xBBCC);
        assert_eq!(reader.next_record().unwrap(), None);
    }

    #[test]
    fn reader_rejects_oversized_frame() {
        let bytes = vec![0u8; 300];
        let err = FrameReader::new(&bytes, &Limits::for_testing()).unwrap_err();
        assert!(matches!(err, DecodeError::FrameTooLarge { actual: 300, .. }));
    }

    #[test]
    fn reader_rejects_index_past_limit() {
        let bytes = [9, 0];
        let mut reader = FrameReader::new(&bytes, &Limits::for_testing()).unwrap();
        let err = reader.next_record().unwrap_err();
        assert_eq!(
            err,
            DecodeError::SerializerIndexOutOfRange { index: 9, limit: 8 }
        );
    }

    #[test]
    fn reader_rejects_duplicate_index() {
        let bytes = [1, 1];
        let mut reader = FrameReader::new(&bytes, &Limits::default()).unwrap();
        assert!(reader.next_record().unwrap().is_some());
        let err = reader.next_record().unwrap_err();
        assert_eq!(err, DecodeError::DuplicateRecord { index: 1 });
    }

    #[test]
    fn index_from_usize() {
        assert_eq!(
            SerializerIndex::try_from(3usize).unwrap(),
            SerializerIndex::new(3)
        );
        assert!(SerializerIndex::try_from(256usize).is_err());
    }
}
