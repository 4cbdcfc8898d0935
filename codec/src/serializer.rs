//! The serializer contract and slot construction.

use std::fmt;
use std::time::Duration;

use bitstream::{ByteReader, ByteWriter};
use schema::{SerializerDef, SerializerKind, SyncConfig};

use crate::error::CodecResult;
use crate::flags::FlagStateSerializer;
use crate::host::EntityHost;
use crate::params::AnimatorParamSerializer;
use crate::record::Record;
use crate::state::AnimatorStateSerializer;
use crate::types::ReceiveInfo;

/// One replicated feature of an entity.
///
/// `now` is the local clock of the peer calling in; it drives resend
/// deadlines and is never put on the wire.
pub trait StateSerializer: fmt::Debug {
    fn kind(&self) -> SerializerKind;

    /// Mirrors live host state into the serializer between sends.
    fn observe(&mut self, host: &dyn EntityHost, now: Duration) -> CodecResult<()>;

    /// Appends this serializer's delta to `out`, or nothing if there is none.
    ///
    /// Cache updates made here can be undone with [`rollback`](Self::rollback)
    /// until the next call to `serialize` or [`commit`](Self::commit).
    fn serialize(
        &mut self,
        host: &dyn EntityHost,
        now: Duration,
        out: &mut ByteWriter,
    ) -> CodecResult<()>;

    /// Keeps the cache updates of the last `serialize`.
    fn commit(&mut self);

    /// Restores the cache to its state before the last `serialize`, so an
    /// unsent delta goes out with the next frame. No-op after `commit`.
    fn rollback(&mut self);

    /// Consumes exactly one record from `reader`. No side effects.
    fn decode(&self, reader: &mut ByteReader<'_>) -> CodecResult<Record>;

    /// Writes a decoded record to the host and the serializer cache.
    fn apply(
        &mut self,
        record: &Record,
        host: &mut dyn EntityHost,
        info: ReceiveInfo,
    ) -> CodecResult<()>;

    /// Decodes one record and applies it.
    fn deserialize(
        &mut self,
        reader: &mut ByteReader<'_>,
        host: &mut dyn EntityHost,
        info: ReceiveInfo,
    ) -> CodecResult<Record> {
        let record = self.decode(reader)?;
        self.apply(&record, host, info)?;
        Ok(record)
    }

    /// Forgets every last-sent timestamp so the next send carries full state.
    fn force_resync(&mut self);

    /// Drops unsent trigger and toggle events. Called on authority changes so
    /// a new owner only reports events it observes itself.
    fn discard_pending(&mut self) {}
}

/// Builds the serializer for one layout slot, caching the host's live values.
pub fn build_serializer(
    def: &SerializerDef,
    sync: &SyncConfig,
    host: &dyn EntityHost,
) -> CodecResult<Box<dyn StateSerializer>> {
    Ok(match def {
        SerializerDef::Flags { flags } => {
            Box::new(FlagStateSerializer::new(flags.clone(), sync, host)?)
        }
        SerializerDef::AnimatorParams { params } => {
            Box::new(AnimatorParamSerializer::new(params.clone(), sync, host)?)
        }
        SerializerDef::AnimatorState => Box::new(AnimatorStateSerializer::new(sync, host)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use schema::{EntityLayout, FlagDef, ParamDef, ParamKind, SerializerKind};

    #[test]
    fn builds_each_kind() {
        let layout = EntityLayout::builder("player")
            .flags(vec![FlagDef::new("facing_left")])
            .animator_params(vec![ParamDef::new("speed", ParamKind::Float)])
            .animator_state()
            .build()
            .unwrap();
        let host = MemoryHost::from_layout(&layout);
        let kinds: Vec<SerializerKind> = layout
            .serializers
            .iter()
            .map(|def| build_serializer(def, &layout.sync, &host).unwrap().kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                SerializerKind::Flags,
                SerializerKind::AnimatorParams,
                SerializerKind::AnimatorState
            ]
        );
    }

    #[test]
    fn deserialize_is_decode_then_apply() {
        let layout = EntityLayout::builder("coin")
            .flags(vec![FlagDef::new("collected")])
            .build()
            .unwrap();
        let mut host = MemoryHost::from_layout(&layout);
        let mut serializer = build_serializer(&layout.serializers[0], &layout.sync, &host).unwrap();

        let bytes = [0b1];
        let mut reader = ByteReader::new(&bytes);
        let record = serializer
            .deserialize(&mut reader, &mut host, ReceiveInfo::new(1.into()))
            .unwrap();
        assert_eq!(record, Record::Flags { bits: 1 });
        assert!(reader.is_empty());
        assert_eq!(host.flag("collected"), Some(true));
    }
}
