//! Animator parameter replication.
//!
//! Payload: a run of parameter tags closed by the `0xFF` sentinel. A tag is
//! the parameter index, with the bool value in the high bit for bool
//! parameters. Int and float tags are followed by a big-endian `u16`
//! quantized over the layout's numeric range.

use std::time::Duration;

use bitstream::{pack_to_short, unpack_from_short, ByteReader, ByteWriter, QuantRange};
use schema::{ParamDef, ParamKind, SerializerKind, SyncConfig};
use wire::{read_param_tag, ParamTag, PARAM_SENTINEL};

use crate::animator::Animator;
use crate::error::{CodecError, CodecResult};
use crate::host::EntityHost;
use crate::record::{ParamUpdate, Record};
use crate::serializer::StateSerializer;
use crate::types::ReceiveInfo;

#[derive(Debug, Clone, Copy, Default)]
struct ParamCache {
    /// Trigger or bool value seen by the last observation.
    observed: bool,
    /// Set when a trigger fired or a bool toggled since the last send.
    pending: bool,
    /// Last sent or applied value; bools as `0.0`/`1.0`, numbers quantized.
    value: f32,
    sent_at: Option<Duration>,
}

/// Replicates an animator's parameter list.
#[derive(Debug)]
pub struct AnimatorParamSerializer {
    params: Vec<ParamDef>,
    cache: Vec<ParamCache>,
    range: QuantRange,
    epsilon: f32,
    resend: Duration,
    /// Cache as observed before the uncommitted send.
    staged: Option<Vec<ParamCache>>,
}

impl AnimatorParamSerializer {
    /// Creates the serializer, checking the host animator's parameter list
    /// against `params` and caching its live values.
    pub fn new(params: Vec<ParamDef>, sync: &SyncConfig, host: &dyn EntityHost) -> CodecResult<Self> {
        let animator = host.animator().ok_or(CodecError::MissingAnimator)?;
        check_parameters(&params, animator)?;

        let range = sync.float_range()?;
        let cache = params
            .iter()
            .enumerate()
            .map(|(index, def)| {
                let (observed, value) = match def.kind {
                    ParamKind::Trigger => (animator.trigger(index), 0.0),
                    ParamKind::Bool => {
                        let v = animator.bool_value(index);
                        (v, bool_to_f32(v))
                    }
                    ParamKind::Int | ParamKind::Float => {
                        (false, quantized(number_value(animator, index, def.kind), range))
                    }
                };
                ParamCache {
                    observed,
                    value,
                    ..ParamCache::default()
                }
            })
            .collect();

        Ok(Self {
            params,
            cache,
            range,
            epsilon: sync.float_epsilon,
            resend: sync.param_resend(),
            staged: None,
        })
    }

    /// Returns `true` if the parameter at `index` has an unsent trigger or toggle.
    #[must_use]
    pub fn is_pending(&self, index: usize) -> bool {
        self.cache.get(index).is_some_and(|c| c.pending)
    }

    fn observe_animator(&mut self, animator: &dyn Animator) {
        for (index, (def, cache)) in self.params.iter().zip(&mut self.cache).enumerate() {
            if def.ignored {
                continue;
            }
            let live = match def.kind {
                ParamKind::Trigger => animator.trigger(index),
                ParamKind::Bool => animator.bool_value(index),
                ParamKind::Int | ParamKind::Float => continue,
            };
            // Triggers are edge-detected so a trigger held across ticks fires once.
            let fired = match def.kind {
                ParamKind::Trigger => live && !cache.observed,
                _ => live != cache.observed,
            };
            if fired {
                cache.pending = true;
            }
            cache.observed = live;
        }
    }
}

/// Reads a parameter record against the parameter definitions.
pub(crate) fn decode_params(
    params: &[ParamDef],
    range: QuantRange,
    reader: &mut ByteReader<'_>,
) -> CodecResult<Record> {
    let mut updates = Vec::new();
    while let Some(tag) = read_param_tag(reader)? {
        let index = usize::from(tag.index);
        let def = params.get(index).ok_or(CodecError::UnknownParameter {
            index,
            count: params.len(),
        })?;
        if def.ignored {
            return Err(CodecError::IgnoredParameter { index });
        }
        updates.push(match def.kind {
            ParamKind::Trigger => ParamUpdate::Trigger { index },
            ParamKind::Bool => ParamUpdate::Bool {
                index,
                value: tag.value,
            },
            ParamKind::Int | ParamKind::Float => ParamUpdate::Number {
                index,
                value: unpack_from_short(reader.read_u16()?, range),
            },
        });
    }
    Ok(Record::Params { updates })
}

impl StateSerializer for AnimatorParamSerializer {
    fn kind(&self) -> SerializerKind {
        SerializerKind::AnimatorParams
    }

    fn observe(&mut self, host: &dyn EntityHost, _now: Duration) -> CodecResult<()> {
        let animator = host.animator().ok_or(CodecError::MissingAnimator)?;
        self.observe_animator(animator);
        Ok(())
    }

    fn serialize(
        &mut self,
        host: &dyn EntityHost,
        now: Duration,
        out: &mut ByteWriter,
    ) -> CodecResult<()> {
        let animator = host.animator().ok_or(CodecError::MissingAnimator)?;
        self.observe_animator(animator);
        self.staged = Some(self.cache.clone());

        let mut emitted = false;
        for (index, (def, cache)) in self.params.iter().zip(&mut self.cache).enumerate() {
            if def.ignored {
                continue;
            }
            let due = cache
                .sent_at
                .map_or(true, |at| now.saturating_sub(at) >= self.resend);
            match def.kind {
                ParamKind::Trigger => {
                    if !cache.pending {
                        continue;
                    }
                    out.write_u8(ParamTag::new(index, false)?.encode());
                }
                ParamKind::Bool => {
                    let live = animator.bool_value(index);
                    let changed = bool_to_f32(live) != cache.value;
                    if !(changed || cache.pending || due) {
                        continue;
                    }
                    out.write_u8(ParamTag::new(index, live)?.encode());
                    cache.value = bool_to_f32(live);
                }
                ParamKind::Int | ParamKind::Float => {
                    let live = number_value(animator, index, def.kind);
                    if !(due || (live - cache.value).abs() > self.epsilon) {
                        continue;
                    }
                    let packed = pack_to_short(live, self.range);
                    out.write_u8(ParamTag::new(index, false)?.encode());
                    out.write_u16(packed);
                    cache.value = unpack_from_short(packed, self.range);
                }
            }
            cache.pending = false;
            cache.sent_at = Some(now);
            emitted = true;
        }
        if emitted {
            out.write_u8(PARAM_SENTINEL);
        }
        Ok(())
    }

    fn commit(&mut self) {
        self.staged = None;
    }

    fn rollback(&mut self) {
        if let Some(cache) = self.staged.take() {
            self.cache = cache;
        }
    }

    fn decode(&self, reader: &mut ByteReader<'_>) -> CodecResult<Record> {
        decode_params(&self.params, self.range, reader)
    }

    fn apply(
        &mut self,
        record: &Record,
        host: &mut dyn EntityHost,
        _info: ReceiveInfo,
    ) -> CodecResult<()> {
        let Record::Params { updates } = record else {
            return Err(CodecError::RecordMismatch {
                expected: SerializerKind::AnimatorParams,
            });
        };
        let animator = host.animator_mut().ok_or(CodecError::MissingAnimator)?;
        for update in updates {
            let index = update.index();
            let (Some(def), Some(cache)) = (self.params.get(index), self.cache.get_mut(index))
            else {
                return Err(CodecError::UnknownParameter {
                    index,
                    count: self.params.len(),
                });
            };
            match *update {
                ParamUpdate::Trigger { .. } => {
                    animator.set_trigger(index);
                    cache.observed = true;
                }
                ParamUpdate::Bool { value, .. } => {
                    animator.set_bool(index, value);
                    cache.observed = value;
                    cache.value = bool_to_f32(value);
                }
                ParamUpdate::Number { value, .. } => {
                    if def.kind == ParamKind::Int {
                        animator.set_int(index, value.round() as i32);
                    } else {
                        animator.set_float(index, value);
                    }
                    cache.value = value;
                }
            }
        }
        Ok(())
    }

    fn force_resync(&mut self) {
        for cache in &mut self.cache {
            cache.sent_at = None;
        }
    }

    fn discard_pending(&mut self) {
        for cache in &mut self.cache {
            cache.pending = false;
        }
    }
}

fn check_parameters(params: &[ParamDef], animator: &dyn Animator) -> CodecResult<()> {
    let found = animator.parameters();
    if found.len() != params.len() {
        return Err(CodecError::ParameterCountMismatch {
            expected: params.len(),
            found: found.len(),
        });
    }
    for (index, (def, live)) in params.iter().zip(found).enumerate() {
        if def.name != live.name || def.kind != live.kind {
            return Err(CodecError::ParameterMismatch {
                index,
                expected_name: def.name.clone(),
                expected_kind: def.kind,
                found_name: live.name.clone(),
                found_kind: live.kind,
            });
        }
    }
    Ok(())
}

fn number_value(animator: &dyn Animator, index: usize, kind: ParamKind) -> f32 {
    if kind == ParamKind::Int {
        animator.int_value(index) as f32
    } else {
        animator.float_value(index)
    }
}

fn quantized(value: f32, range: QuantRange) -> f32 {
    unpack_from_short(pack_to_short(value, range), range)
}

fn bool_to_f32(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::MemoryAnimator;
    use crate::host::MemoryHost;

    const MS: Duration = Duration::from_millis(1);

    fn params() -> Vec<ParamDef> {
        vec![
            ParamDef::new("jump", ParamKind::Trigger),
            ParamDef::new("on_ground", ParamKind::Bool),
            ParamDef::new("velocity_x", ParamKind::Float),
            ParamDef::new("combo", ParamKind::Int),
            ParamDef::new("debug", ParamKind::Bool).ignored(),
        ]
    }

    fn host() -> MemoryHost {
        MemoryHost::new().with_animator(MemoryAnimator::from_defs(&params()))
    }

    fn animator(host: &mut MemoryHost) -> &mut MemoryAnimator {
        host.memory_animator_mut().unwrap()
    }

    fn serializer(host: &MemoryHost) -> AnimatorParamSerializer {
        AnimatorParamSerializer::new(params(), &SyncConfig::default(), host).unwrap()
    }

    fn send(s: &mut AnimatorParamSerializer, host: &MemoryHost, now: Duration) -> Vec<u8> {
        let mut out = ByteWriter::new();
        s.serialize(host, now, &mut out).unwrap();
        out.finish()
    }

    fn decode(s: &AnimatorParamSerializer, bytes: &[u8]) -> Vec<ParamUpdate> {
        let mut reader = ByteReader::new(bytes);
        match s.decode(&mut reader).unwrap() {
            Record::Params { updates } => updates,
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn first_send_carries_bools_and_numbers() {
        let host = host();
        let mut s = serializer(&host);
        let bytes = send(&mut s, &host, Duration::ZERO);
        // on_ground=false, velocity_x=0.0, combo=0; no trigger, nothing for ignored
        let mid = pack_to_short(0.0, SyncConfig::default().float_range().unwrap());
        let [hi, lo] = mid.to_be_bytes();
        assert_eq!(bytes, vec![0x01, 0x02, hi, lo, 0x03, hi, lo, PARAM_SENTINEL]);
    }

    #[test]
    fn no_change_emits_nothing() {
        let host = host();
        let mut s = serializer(&host);
        send(&mut s, &host, Duration::ZERO);
        assert!(send(&mut s, &host, 100 * MS).is_empty());
    }

    #[test]
    fn change_within_epsilon_is_suppressed() {
        let mut host = host();
        let mut s = serializer(&host);
        send(&mut s, &host, Duration::ZERO);
        animator(&mut host).set_float(2, 0.015);
        assert!(send(&mut s, &host, 10 * MS).is_empty());
        animator(&mut host).set_float(2, 1.0);
        let bytes = send(&mut s, &host, 20 * MS);
        let updates = decode(&s, &bytes);
        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], ParamUpdate::Number { index: 2, value } if (value - 1.0).abs() < 0.01));
    }

    #[test]
    fn trigger_sent_once_per_firing() {
        let mut host = host();
        let mut s = serializer(&host);
        send(&mut s, &host, Duration::ZERO);
        animator(&mut host).set_trigger(0);
        s.observe(&host, 5 * MS).unwrap();
        assert!(s.is_pending(0));
        assert_eq!(send(&mut s, &host, 10 * MS), vec![0x00, PARAM_SENTINEL]);
        // still set on the animator, but already reported
        assert!(send(&mut s, &host, 20 * MS).is_empty());
        // triggers never ride the resend deadline
        let bytes = send(&mut s, &host, 2_000 * MS);
        assert!(!decode(&s, &bytes)
            .iter()
            .any(|u| matches!(u, ParamUpdate::Trigger { .. })));
    }

    #[test]
    fn trigger_refires_after_reset() {
        let mut host = host();
        let mut s = serializer(&host);
        send(&mut s, &host, Duration::ZERO);
        animator(&mut host).set_trigger(0);
        assert_eq!(send(&mut s, &host, 10 * MS), vec![0x00, PARAM_SENTINEL]);
        animator(&mut host).reset_trigger(0);
        s.observe(&host, 15 * MS).unwrap();
        animator(&mut host).set_trigger(0);
        assert_eq!(send(&mut s, &host, 20 * MS), vec![0x00, PARAM_SENTINEL]);
    }

    #[test]
    fn bool_change_carries_value_bit() {
        let mut host = host();
        let mut s = serializer(&host);
        send(&mut s, &host, Duration::ZERO);
        animator(&mut host).set_bool(1, true);
        assert_eq!(send(&mut s, &host, 10 * MS), vec![0x81, PARAM_SENTINEL]);
    }

    #[test]
    fn toggle_with_unchanged_net_value_is_reported_once() {
        let mut host = host();
        let mut s = serializer(&host);
        send(&mut s, &host, Duration::ZERO);

        animator(&mut host).set_bool(1, true);
        s.observe(&host, 5 * MS).unwrap();
        animator(&mut host).set_bool(1, false);
        s.observe(&host, 6 * MS).unwrap();
        assert!(s.is_pending(1));

        assert_eq!(send(&mut s, &host, 10 * MS), vec![0x01, PARAM_SENTINEL]);
        assert!(send(&mut s, &host, 20 * MS).is_empty());
    }

    #[test]
    fn resend_after_interval_skips_triggers_and_ignored() {
        let host = host();
        let mut s = serializer(&host);
        send(&mut s, &host, Duration::ZERO);
        let bytes = send(&mut s, &host, 500 * MS);
        let updates = decode(&s, &bytes);
        let indices: Vec<usize> = updates.iter().map(ParamUpdate::index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn decode_rejects_unknown_index() {
        let host = host();
        let s = serializer(&host);
        let bytes = [0x09, PARAM_SENTINEL];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(
            s.decode(&mut reader).unwrap_err(),
            CodecError::UnknownParameter { index: 9, count: 5 }
        );
    }

    #[test]
    fn decode_rejects_ignored_index() {
        let host = host();
        let s = serializer(&host);
        let bytes = [0x84, PARAM_SENTINEL];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(
            s.decode(&mut reader).unwrap_err(),
            CodecError::IgnoredParameter { index: 4 }
        );
    }

    #[test]
    fn decode_without_sentinel_is_truncated() {
        let host = host();
        let s = serializer(&host);
        let bytes = [0x02, 0x80];
        let mut reader = ByteReader::new(&bytes);
        assert!(s.decode(&mut reader).is_err());
    }

    #[test]
    fn apply_writes_animator_and_cache() {
        let owner = host();
        let mut remote = host();
        let mut tx = serializer(&owner);
        let mut rx = serializer(&remote);

        let mut owner = owner;
        animator(&mut owner).set_trigger(0);
        animator(&mut owner).set_bool(1, true);
        animator(&mut owner).set_float(2, 12.5);
        animator(&mut owner).set_int(3, 7);
        let bytes = send(&mut tx, &owner, Duration::ZERO);

        let mut reader = ByteReader::new(&bytes);
        rx.deserialize(&mut reader, &mut remote, ReceiveInfo::new(1.into()))
            .unwrap();

        let a = remote.memory_animator().unwrap();
        assert!(a.trigger(0));
        assert!(a.bool_value(1));
        assert!((a.float_value(2) - 12.5).abs() < 0.01);
        assert_eq!(a.int_value(3), 7);
        for index in 0..4 {
            assert_eq!(rx.cache[index].value, tx.cache[index].value);
        }
        // the applied trigger counts as seen, so a later observe does not refire it
        rx.observe(&remote, MS).unwrap();
        assert!(!rx.is_pending(0));
    }

    #[test]
    fn rollback_restores_unsent_trigger() {
        let mut host = host();
        let mut s = serializer(&host);
        send(&mut s, &host, Duration::ZERO);
        s.commit();

        animator(&mut host).set_trigger(0);
        animator(&mut host).set_float(2, 40.0);
        let first = send(&mut s, &host, 10 * MS);
        s.rollback();
        assert!(s.is_pending(0));
        assert_eq!(send(&mut s, &host, 20 * MS), first);
        s.commit();
        s.rollback();
        assert!(send(&mut s, &host, 30 * MS).is_empty());
    }

    #[test]
    fn discard_pending_drops_unsent_events() {
        let mut host = host();
        let mut s = serializer(&host);
        send(&mut s, &host, Duration::ZERO);
        animator(&mut host).set_trigger(0);
        s.observe(&host, 5 * MS).unwrap();
        s.discard_pending();
        assert!(send(&mut s, &host, 10 * MS).is_empty());
    }

    #[test]
    fn init_rejects_mismatched_animator() {
        let host = MemoryHost::new().with_animator(MemoryAnimator::from_defs(&[
            ParamDef::new("jump", ParamKind::Trigger),
            ParamDef::new("on_ground", ParamKind::Float),
        ]));
        let defs = vec![
            ParamDef::new("jump", ParamKind::Trigger),
            ParamDef::new("on_ground", ParamKind::Bool),
        ];
        let err = AnimatorParamSerializer::new(defs, &SyncConfig::default(), &host).unwrap_err();
        assert!(matches!(err, CodecError::ParameterMismatch { index: 1, .. }));

        let err =
            AnimatorParamSerializer::new(params(), &SyncConfig::default(), &host).unwrap_err();
        assert_eq!(
            err,
            CodecError::ParameterCountMismatch {
                expected: 5,
                found: 2
            }
        );
    }

    #[test]
    fn init_requires_animator() {
        let err = AnimatorParamSerializer::new(params(), &SyncConfig::default(), &MemoryHost::new())
            .unwrap_err();
        assert_eq!(err, CodecError::MissingAnimator);
    }
}
