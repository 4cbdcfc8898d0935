//! Boolean flags packed into one byte.

use std::time::Duration;

use bitstream::{pack_flags_u8, unpack_flags_u8, ByteReader, ByteWriter};
use schema::{FlagDef, SerializerKind, SyncConfig};

use crate::error::{CodecError, CodecResult};
use crate::host::EntityHost;
use crate::record::Record;
use crate::serializer::StateSerializer;
use crate::types::ReceiveInfo;

/// Replicates up to eight host flags.
///
/// The byte is re-sent when it changes or when the resend interval elapses.
/// On receive, flags with `apply_remote = false` (see
/// [`FlagDef::local_only`]) are cached but left untouched on the host.
#[derive(Debug)]
pub struct FlagStateSerializer {
    flags: Vec<FlagDef>,
    resend: Duration,
    current: u8,
    last_sent: u8,
    last_sent_at: Option<Duration>,
    /// `last_sent` and `last_sent_at` before the uncommitted send.
    staged: Option<(u8, Option<Duration>)>,
}

impl FlagStateSerializer {
    pub fn new(flags: Vec<FlagDef>, sync: &SyncConfig, host: &dyn EntityHost) -> CodecResult<Self> {
        let mut serializer = Self {
            flags,
            resend: sync.flag_resend(),
            current: 0,
            last_sent: 0,
            last_sent_at: None,
            staged: None,
        };
        serializer.current = serializer.read_host(host)?;
        serializer.last_sent = serializer.current;
        Ok(serializer)
    }

    /// The most recently observed or applied flag byte.
    #[must_use]
    pub const fn current(&self) -> u8 {
        self.current
    }

    fn read_host(&self, host: &dyn EntityHost) -> CodecResult<u8> {
        let values = self
            .flags
            .iter()
            .map(|flag| {
                host.flag(&flag.name).ok_or_else(|| CodecError::MissingFlag {
                    name: flag.name.clone(),
                })
            })
            .collect::<CodecResult<Vec<bool>>>()?;
        Ok(pack_flags_u8(&values)?)
    }
}

/// Reads a flag record.
pub(crate) fn decode_flags(reader: &mut ByteReader<'_>) -> CodecResult<Record> {
    Ok(Record::Flags {
        bits: reader.read_u8()?,
    })
}

impl StateSerializer for FlagStateSerializer {
    fn kind(&self) -> SerializerKind {
        SerializerKind::Flags
    }

    fn observe(&mut self, host: &dyn EntityHost, _now: Duration) -> CodecResult<()> {
        self.current = self.read_host(host)?;
        Ok(())
    }

    fn serialize(
        &mut self,
        host: &dyn EntityHost,
        now: Duration,
        out: &mut ByteWriter,
    ) -> CodecResult<()> {
        self.current = self.read_host(host)?;
        let due = self
            .last_sent_at
            .map_or(true, |at| now.saturating_sub(at) >= self.resend);
        self.staged = None;
        if !due && self.current == self.last_sent {
            return Ok(());
        }
        out.write_u8(self.current);
        self.staged = Some((self.last_sent, self.last_sent_at));
        self.last_sent = self.current;
        self.last_sent_at = Some(now);
        Ok(())
    }

    fn commit(&mut self) {
        self.staged = None;
    }

    fn rollback(&mut self) {
        if let Some((last_sent, last_sent_at)) = self.staged.take() {
            self.last_sent = last_sent;
            self.last_sent_at = last_sent_at;
        }
    }

    fn decode(&self, reader: &mut ByteReader<'_>) -> CodecResult<Record> {
        decode_flags(reader)
    }

    fn apply(
        &mut self,
        record: &Record,
        host: &mut dyn EntityHost,
        _info: ReceiveInfo,
    ) -> CodecResult<()> {
        let Record::Flags { bits } = *record else {
            return Err(CodecError::RecordMismatch {
                expected: SerializerKind::Flags,
            });
        };
        let values = unpack_flags_u8(bits);
        for (flag, value) in self.flags.iter().zip(values) {
            if flag.apply_remote {
                host.set_flag(&flag.name, value);
            }
        }
        self.current = bits;
        self.last_sent = bits;
        Ok(())
    }

    fn force_resync(&mut self) {
        self.last_sent_at = None;
    }
}
