//! Coarse animator state resync.

use std::time::Duration;

use bitstream::{pack_to_byte, unpack_from_byte, ByteReader, ByteWriter, QuantRange};
use schema::{SerializerKind, SyncConfig};

use crate::animator::AnimatorStateInfo;
use crate::error::{CodecError, CodecResult};
use crate::host::EntityHost;
use crate::record::Record;
use crate::serializer::StateSerializer;
use crate::types::ReceiveInfo;

/// Periodically sends the animator's current state hash and normalized time.
///
/// Parameter replication keeps remote animators close; this record corrects
/// drift on a slow timer rather than tracking every transition.
#[derive(Debug)]
pub struct AnimatorStateSerializer {
    resync: Duration,
    state: AnimatorStateInfo,
    last_sent_at: Option<Duration>,
    staged: Option<(AnimatorStateInfo, Option<Duration>)>,
}

impl AnimatorStateSerializer {
    pub fn new(sync: &SyncConfig, host: &dyn EntityHost) -> CodecResult<Self> {
        let animator = host.animator().ok_or(CodecError::MissingAnimator)?;
        Ok(Self {
            resync: sync.state_resync(),
            state: animator.current_state(),
            last_sent_at: None,
            staged: None,
        })
    }

    /// The last observed, sent, or applied state.
    #[must_use]
    pub const fn state(&self) -> AnimatorStateInfo {
        self.state
    }
}

pub(crate) fn decode_state(reader: &mut ByteReader<'_>) -> CodecResult<Record> {
    let state_hash = reader.read_i32()?;
    let normalized_time = unpack_from_byte(reader.read_u8()?, QuantRange::UNIT);
    Ok(Record::State {
        state: AnimatorStateInfo {
            state_hash,
            normalized_time,
        },
    })
}

impl StateSerializer for AnimatorStateSerializer {
    fn kind(&self) -> SerializerKind {
        SerializerKind::AnimatorState
    }

    fn observe(&mut self, host: &dyn EntityHost, _now: Duration) -> CodecResult<()> {
        let animator = host.animator().ok_or(CodecError::MissingAnimator)?;
        self.state = animator.current_state();
        Ok(())
    }

    fn serialize(
        &mut self,
        host: &dyn EntityHost,
        now: Duration,
        out: &mut ByteWriter,
    ) -> CodecResult<()> {
        self.staged = None;
        let due = self
            .last_sent_at
            .map_or(true, |at| now.saturating_sub(at) >= self.resync);
        if !due {
            return Ok(());
        }
        let animator = host.animator().ok_or(CodecError::MissingAnimator)?;
        let live = animator.current_state();
        let packed = pack_to_byte(live.normalized_time, QuantRange::UNIT);
        out.write_i32(live.state_hash);
        out.write_u8(packed);
        self.staged = Some((self.state, self.last_sent_at));
        self.state = AnimatorStateInfo {
            state_hash: live.state_hash,
            normalized_time: unpack_from_byte(packed, QuantRange::UNIT),
        };
        self.last_sent_at = Some(now);
        Ok(())
    }

    fn commit(&mut self) {
        self.staged = None;
    }

    fn rollback(&mut self) {
        if let Some((state, last_sent_at)) = self.staged.take() {
            self.state = state;
            self.last_sent_at = last_sent_at;
        }
    }

    fn decode(&self, reader: &mut ByteReader<'_>) -> CodecResult<Record> {
        decode_state(reader)
    }

    fn apply(
        &mut self,
        record: &Record,
        host: &mut dyn EntityHost,
        _info: ReceiveInfo,
    ) -> CodecResult<()> {
        let Record::State { state } = *record else {
            return Err(CodecError::RecordMismatch {
                expected: SerializerKind::AnimatorState,
            });
        };
        let animator = host.animator_mut().ok_or(CodecError::MissingAnimator)?;
        animator.play(state.state_hash, state.normalized_time);
        self.state = state;
        Ok(())
    }

    fn force_resync(&mut self) {
        self.last_sent_at = None;
    }
}
