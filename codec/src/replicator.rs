//! Per-entity frame multiplexing.

use std::time::Duration;

use bitstream::ByteWriter;
use schema::{layout_fingerprint, EntityLayout, SerializerKind};
use wire::{FrameWriter, Limits, SerializerIndex};

use crate::error::{CodecError, CodecResult};
use crate::frame::decode_frame;
use crate::host::EntityHost;
use crate::record::DecodedFrame;
use crate::serializer::{build_serializer, StateSerializer};
use crate::stats::ReplicationStats;
use crate::types::{Authority, EntityId, ReceiveInfo, SendTimestamp};

/// Result of feeding a frame to [`EntityReplicator::on_receive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Every record in the frame was applied.
    Applied { records: usize },
    /// The frame was not newer than the last applied one and was dropped.
    Stale { last_applied: SendTimestamp },
}

#[derive(Debug)]
struct Slot {
    active: bool,
    serializer: Box<dyn StateSerializer>,
}

/// Owns the serializers of one entity and moves frames in and out of them.
///
/// Slot `i` is the layout's serializer `i` and is written on the wire as
/// index byte `i`. The owning peer calls [`tick`](Self::tick) every game
/// update and [`on_send`](Self::on_send) once per network send; remote peers
/// call [`on_receive`](Self::on_receive) for every frame the transport
/// delivers.
#[derive(Debug)]
pub struct EntityReplicator {
    id: EntityId,
    layout: EntityLayout,
    fingerprint: u64,
    limits: Limits,
    authority: Authority,
    slots: Vec<Slot>,
    payload: ByteWriter,
    last_applied: Option<SendTimestamp>,
    stats: ReplicationStats,
}

impl EntityReplicator {
    /// Builds a replicator with default frame limits.
    pub fn new(
        id: EntityId,
        layout: EntityLayout,
        host: &dyn EntityHost,
        authority: Authority,
    ) -> CodecResult<Self> {
        Self::with_limits(id, layout, host, authority, Limits::default())
    }

    /// Builds a replicator, validating the layout and checking the host
    /// against it. Serializer caches start at the host's live values.
    pub fn with_limits(
        id: EntityId,
        layout: EntityLayout,
        host: &dyn EntityHost,
        authority: Authority,
        limits: Limits,
    ) -> CodecResult<Self> {
        layout.validate()?;
        let limit = limits.max_serializers.min(wire::MAX_SERIALIZERS);
        if layout.serializers.len() > limit {
            return Err(CodecError::TooManySerializers {
                count: layout.serializers.len(),
                limit,
            });
        }
        if layout.needs_animator() && host.animator().is_none() {
            return Err(CodecError::MissingAnimator);
        }

        let slots = layout
            .serializers
            .iter()
            .map(|def| {
                Ok(Slot {
                    active: true,
                    serializer: build_serializer(def, &layout.sync, host)?,
                })
            })
            .collect::<CodecResult<Vec<_>>>()?;

        tracing::debug!(
            entity = %id,
            layout = %layout.name,
            serializers = slots.len(),
            "replicator created"
        );

        Ok(Self {
            id,
            fingerprint: layout_fingerprint(&layout),
            layout,
            limits,
            authority,
            slots,
            payload: ByteWriter::with_capacity(64),
            last_applied: None,
            stats: ReplicationStats::default(),
        })
    }

    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub const fn layout(&self) -> &EntityLayout {
        &self.layout
    }

    /// Layout fingerprint for out-of-band comparison between peers.
    #[must_use]
    pub const fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    #[must_use]
    pub const fn authority(&self) -> Authority {
        self.authority
    }

    #[must_use]
    pub const fn stats(&self) -> &ReplicationStats {
        &self.stats
    }

    /// Timestamp of the last applied frame, if any.
    #[must_use]
    pub const fn last_applied(&self) -> Option<SendTimestamp> {
        self.last_applied
    }

    /// Number of serializer slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the kind of the serializer at `index`.
    #[must_use]
    pub fn kind(&self, index: usize) -> Option<SerializerKind> {
        self.slots.get(index).map(|slot| slot.serializer.kind())
    }

    /// Enables or disables sending for one slot. Receiving is unaffected.
    pub fn set_active(&mut self, index: usize, active: bool) -> CodecResult<()> {
        let count = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(CodecError::UnknownSerializer {
                index: u8::try_from(index).unwrap_or(u8::MAX),
                count,
            })?;
        slot.active = active;
        Ok(())
    }

    #[must_use]
    pub fn is_active(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|slot| slot.active)
    }

    /// Hands authority to this or another peer.
    ///
    /// The ordering guard restarts, since the new sender's clock is unrelated
    /// to the old one. A peer that becomes owner sends full state next.
    pub fn set_authority(&mut self, authority: Authority) {
        if authority == self.authority {
            return;
        }
        tracing::debug!(entity = %self.id, ?authority, "authority changed");
        self.authority = authority;
        self.last_applied = None;
        for slot in &mut self.slots {
            slot.serializer.discard_pending();
        }
        if authority.is_owner() {
            self.force_resync();
        }
    }

    /// Makes every serializer send full state on the next `on_send`.
    pub fn force_resync(&mut self) {
        for slot in &mut self.slots {
            slot.serializer.force_resync();
        }
    }

    /// Mirrors live host state into the serializers.
    pub fn tick(&mut self, host: &dyn EntityHost, now: Duration) -> CodecResult<()> {
        for slot in &mut self.slots {
            slot.serializer.observe(host, now)?;
        }
        Ok(())
    }

    /// Produces this send cycle's frame. An empty frame means no deltas.
    ///
    /// If the frame cannot be built (for example it exceeds
    /// `max_frame_bytes`), every serializer keeps its unsent deltas for the
    /// next call.
    pub fn on_send(&mut self, host: &dyn EntityHost, now: Duration) -> CodecResult<Vec<u8>> {
        if !self.authority.is_owner() {
            return Err(CodecError::NotAuthoritative);
        }
        let frame = match self.write_frame(host, now) {
            Ok(frame) => {
                for slot in &mut self.slots {
                    slot.serializer.commit();
                }
                frame
            }
            Err(err) => {
                for slot in &mut self.slots {
                    slot.serializer.rollback();
                }
                tracing::warn!(entity = %self.id, error = %err, "frame not sent");
                return Err(err);
            }
        };

        let records = frame.record_count();
        let bytes = frame.finish();
        if !bytes.is_empty() {
            self.stats.frames_sent += 1;
            self.stats.bytes_sent += bytes.len() as u64;
            self.stats.records_sent += records as u64;
            tracing::trace!(entity = %self.id, records, bytes = bytes.len(), "frame sent");
        }
        Ok(bytes)
    }

    /// Validates and applies one incoming frame.
    ///
    /// Frames not newer than the last applied one are dropped as stale. A
    /// malformed frame is rejected whole: nothing is applied and the ordering
    /// guard does not advance.
    pub fn on_receive(
        &mut self,
        host: &mut dyn EntityHost,
        bytes: &[u8],
        info: ReceiveInfo,
    ) -> CodecResult<ApplyOutcome> {
        if let Some(last_applied) = self.last_applied {
            if info.timestamp <= last_applied {
                self.stats.frames_stale += 1;
                tracing::debug!(
                    entity = %self.id,
                    timestamp = info.timestamp.raw(),
                    last_applied = last_applied.raw(),
                    "dropping stale frame"
                );
                return Ok(ApplyOutcome::Stale { last_applied });
            }
        }

        let frame = match self.validate(host, bytes) {
            Ok(frame) => frame,
            Err(err) => {
                self.stats.frames_rejected += 1;
                tracing::warn!(entity = %self.id, error = %err, "rejecting frame");
                return Err(err);
            }
        };

        for decoded in &frame.records {
            let slot = &mut self.slots[decoded.index.as_usize()];
            slot.serializer.apply(&decoded.record, host, info)?;
        }
        self.last_applied = Some(info.timestamp);
        self.stats.frames_applied += 1;
        self.stats.records_applied += frame.len() as u64;
        Ok(ApplyOutcome::Applied {
            records: frame.len(),
        })
    }

    /// Consumes the replicator, returning its final counters.
    pub fn teardown(self) -> ReplicationStats {
        tracing::debug!(entity = %self.id, "replicator torn down");
        self.stats
    }

    fn write_frame(&mut self, host: &dyn EntityHost, now: Duration) -> CodecResult<FrameWriter> {
        let mut frame = FrameWriter::new(&self.limits);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.active {
                continue;
            }
            self.payload.clear();
            slot.serializer.serialize(host, now, &mut self.payload)?;
            frame.write_record(SerializerIndex::try_from(index)?, self.payload.as_slice())?;
        }
        Ok(frame)
    }

    fn validate(&self, host: &dyn EntityHost, bytes: &[u8]) -> CodecResult<DecodedFrame> {
        let frame = decode_frame(&self.layout, bytes, &self.limits)?;
        if frame.touches_animator() && host.animator().is_none() {
            return Err(CodecError::MissingAnimator);
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::Animator;
    use crate::host::MemoryHost;
    use schema::{FlagDef, ParamDef, ParamKind};

    const MS: Duration = Duration::from_millis(1);

    fn coin() -> EntityLayout {
        EntityLayout::builder("coin")
            .flags(vec![FlagDef::new("collected")])
            .build()
            .unwrap()
    }

    fn info(ts: u64) -> ReceiveInfo {
        ReceiveInfo::new(SendTimestamp::new(ts))
    }

    #[test]
    fn remote_cannot_send() {
        let host = MemoryHost::from_layout(&coin());
        let mut r =
            EntityReplicator::new(EntityId::new(1), coin(), &host, Authority::Remote).unwrap();
        assert_eq!(
            r.on_send(&host, Duration::ZERO).unwrap_err(),
            CodecError::NotAuthoritative
        );
    }

    #[test]
    fn inactive_slot_is_skipped() {
        let host = MemoryHost::from_layout(&coin());
        let mut r =
            EntityReplicator::new(EntityId::new(1), coin(), &host, Authority::Owner).unwrap();
        r.set_active(0, false).unwrap();
        assert!(!r.is_active(0));
        assert!(r.on_send(&host, Duration::ZERO).unwrap().is_empty());
        r.set_active(0, true).unwrap();
        assert_eq!(r.on_send(&host, MS).unwrap(), vec![0, 0]);
        assert!(r.set_active(5, true).is_err());
    }

    #[test]
    fn animator_layout_requires_animator() {
        let layout = EntityLayout::builder("npc")
            .animator_params(vec![ParamDef::new("speed", ParamKind::Float)])
            .build()
            .unwrap();
        let err = EntityReplicator::new(EntityId::new(1), layout, &MemoryHost::new(), Authority::Owner)
            .unwrap_err();
        assert_eq!(err, CodecError::MissingAnimator);
    }

    #[test]
    fn serializer_limit_enforced() {
        let layout = EntityLayout::builder("wide")
            .animator_state()
            .animator_state()
            .animator_state()
            .build()
            .unwrap();
        let host = MemoryHost::from_layout(&layout);
        let limits = Limits {
            max_serializers: 2,
            ..Limits::default()
        };
        let err = EntityReplicator::with_limits(
            EntityId::new(1),
            layout,
            &host,
            Authority::Owner,
            limits,
        )
        .unwrap_err();
        assert_eq!(err, CodecError::TooManySerializers { count: 3, limit: 2 });
    }

    #[test]
    fn rejected_frame_does_not_advance_guard() {
        let mut host = MemoryHost::from_layout(&coin());
        let mut r =
            EntityReplicator::new(EntityId::new(1), coin(), &host, Authority::Remote).unwrap();
        assert!(r.on_receive(&mut host, &[4, 1], info(10)).is_err());
        assert_eq!(r.last_applied(), None);
        assert_eq!(r.stats().frames_rejected, 1);
        assert_eq!(
            r.on_receive(&mut host, &[0, 1], info(5)).unwrap(),
            ApplyOutcome::Applied { records: 1 }
        );
        assert_eq!(host.flag("collected"), Some(true));
    }

    #[test]
    fn authority_handoff_resets_guard_and_resyncs() {
        let mut host = MemoryHost::from_layout(&coin());
        let mut r =
            EntityReplicator::new(EntityId::new(1), coin(), &host, Authority::Remote).unwrap();
        r.on_receive(&mut host, &[0, 1], info(100)).unwrap();
        assert!(r.last_applied().is_some());

        r.set_authority(Authority::Owner);
        assert_eq!(r.last_applied(), None);
        assert_eq!(r.on_send(&host, Duration::ZERO).unwrap(), vec![0, 1]);
    }

    #[test]
    fn oversized_frame_keeps_deltas_for_next_send() {
        let layout = EntityLayout::builder("player")
            .animator_params(vec![ParamDef::new("jump", ParamKind::Trigger)])
            .flags(vec![FlagDef::new("facing_left")])
            .build()
            .unwrap();
        let mut host = MemoryHost::from_layout(&layout);
        let limits = Limits {
            max_frame_bytes: 3,
            ..Limits::default()
        };
        let mut r = EntityReplicator::with_limits(
            EntityId::new(1),
            layout,
            &host,
            Authority::Owner,
            limits,
        )
        .unwrap();
        host.memory_animator_mut().unwrap().set_trigger(0);
        r.tick(&host, MS).unwrap();

        // [0, 0, 0xFF] + [1, bits] does not fit in three bytes
        assert!(matches!(
            r.on_send(&host, 2 * MS).unwrap_err(),
            CodecError::Encode(_)
        ));
        assert_eq!(r.stats().frames_sent, 0);

        r.set_active(1, false).unwrap();
        assert_eq!(r.on_send(&host, 3 * MS).unwrap(), vec![0, 0, 0xFF]);

        // the flag record was never sent either, so it is still due
        r.set_active(0, false).unwrap();
        r.set_active(1, true).unwrap();
        assert_eq!(r.on_send(&host, 4 * MS).unwrap(), vec![1, 0]);
    }

    #[test]
    fn received_trigger_is_not_echoed_after_handoff() {
        let layout = EntityLayout::builder("player")
            .animator_params(vec![ParamDef::new("jump", ParamKind::Trigger)])
            .build()
            .unwrap();
        let mut owner_host = MemoryHost::from_layout(&layout);
        let mut owner = EntityReplicator::new(
            EntityId::new(1),
            layout.clone(),
            &owner_host,
            Authority::Owner,
        )
        .unwrap();
        owner_host.memory_animator_mut().unwrap().set_trigger(0);
        let frame = owner.on_send(&owner_host, Duration::ZERO).unwrap();
        assert_eq!(frame, vec![0, 0, 0xFF]);

        let mut host = MemoryHost::from_layout(&layout);
        let mut r =
            EntityReplicator::new(EntityId::new(1), layout, &host, Authority::Remote).unwrap();
        r.on_receive(&mut host, &frame, info(1)).unwrap();
        assert!(host.animator().unwrap().trigger(0));

        r.set_authority(Authority::Owner);
        r.tick(&host, MS).unwrap();
        assert!(r.on_send(&host, 2 * MS).unwrap().is_empty());

        // a fresh firing by the new owner still goes out
        let animator = host.memory_animator_mut().unwrap();
        animator.reset_trigger(0);
        r.tick(&host, 3 * MS).unwrap();
        host.memory_animator_mut().unwrap().set_trigger(0);
        assert_eq!(r.on_send(&host, 4 * MS).unwrap(), vec![0, 0, 0xFF]);
    }

    #[test]
    fn teardown_returns_stats() {
        let host = MemoryHost::from_layout(&coin());
        let mut r =
            EntityReplicator::new(EntityId::new(1), coin(), &host, Authority::Owner).unwrap();
        r.on_send(&host, Duration::ZERO).unwrap();
        let stats = r.teardown();
        assert_eq!(stats.frames_sent, 1);
        assert_eq!(stats.bytes_sent, 2);
        assert_eq!(stats.records_sent, 1);
    }
}
