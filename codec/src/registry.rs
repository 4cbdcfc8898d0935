//! Explicit registry of replicated entities.

use std::collections::BTreeMap;
use std::time::Duration;

use schema::EntityLayout;
use wire::Limits;

use crate::error::{CodecError, CodecResult};
use crate::host::EntityHost;
use crate::replicator::{ApplyOutcome, EntityReplicator};
use crate::stats::ReplicationStats;
use crate::types::{Authority, EntityId, ReceiveInfo, SendTimestamp};

/// A frame ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingFrame {
    pub entity: EntityId,
    pub timestamp: SendTimestamp,
    pub bytes: Vec<u8>,
}

/// A registered entity: its host state and its replicator.
#[derive(Debug)]
pub struct Entity<H> {
    pub host: H,
    replicator: EntityReplicator,
}

impl<H> Entity<H> {
    #[must_use]
    pub const fn replicator(&self) -> &EntityReplicator {
        &self.replicator
    }

    pub fn replicator_mut(&mut self) -> &mut EntityReplicator {
        &mut self.replicator
    }
}

/// Every replicated entity on one peer, iterated in id order.
#[derive(Debug)]
pub struct EntityRegistry<H: EntityHost> {
    entities: BTreeMap<EntityId, Entity<H>>,
    limits: Limits,
    retired: ReplicationStats,
}

impl<H: EntityHost> Default for EntityRegistry<H> {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl<H: EntityHost> EntityRegistry<H> {
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self {
            entities: BTreeMap::new(),
            limits,
            retired: ReplicationStats::default(),
        }
    }

    /// Registers an entity and builds its replicator from `layout`.
    pub fn spawn(
        &mut self,
        id: EntityId,
        layout: EntityLayout,
        host: H,
        authority: Authority,
    ) -> CodecResult<&mut Entity<H>> {
        if self.entities.contains_key(&id) {
            return Err(CodecError::EntityExists(id));
        }
        let replicator =
            EntityReplicator::with_limits(id, layout, &host, authority, self.limits.clone())?;
        Ok(self
            .entities
            .entry(id)
            .or_insert(Entity { host, replicator }))
    }

    /// Removes an entity, returning its host and final counters.
    pub fn despawn(&mut self, id: EntityId) -> CodecResult<(H, ReplicationStats)> {
        let entity = self
            .entities
            .remove(&id)
            .ok_or(CodecError::EntityNotFound(id))?;
        let stats = entity.replicator.teardown();
        self.retired.merge(&stats);
        Ok((entity.host, stats))
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity<H>> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity<H>> {
        self.entities.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Observes live state on every owned entity.
    pub fn tick(&mut self, now: Duration) -> CodecResult<()> {
        for entity in self.entities.values_mut() {
            if entity.replicator.authority().is_owner() {
                entity.replicator.tick(&entity.host, now)?;
            }
        }
        Ok(())
    }

    /// Runs one send cycle over owned entities, returning non-empty frames.
    pub fn collect_outgoing(&mut self, now: Duration) -> CodecResult<Vec<OutgoingFrame>> {
        let timestamp = SendTimestamp::from_duration(now);
        let mut frames = Vec::new();
        for (&id, entity) in &mut self.entities {
            if !entity.replicator.authority().is_owner() {
                continue;
            }
            let bytes = entity.replicator.on_send(&entity.host, now)?;
            if !bytes.is_empty() {
                frames.push(OutgoingFrame {
                    entity: id,
                    timestamp,
                    bytes,
                });
            }
        }
        Ok(frames)
    }

    /// Hands an incoming frame to the entity it belongs to.
    pub fn deliver(
        &mut self,
        id: EntityId,
        bytes: &[u8],
        info: ReceiveInfo,
    ) -> CodecResult<ApplyOutcome> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(CodecError::EntityNotFound(id))?;
        entity.replicator.on_receive(&mut entity.host, bytes, info)
    }

    pub fn set_authority(&mut self, id: EntityId, authority: Authority) -> CodecResult<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(CodecError::EntityNotFound(id))?;
        entity.replicator.set_authority(authority);
        Ok(())
    }

    /// Counters summed over live and despawned entities.
    #[must_use]
    pub fn stats(&self) -> ReplicationStats {
        let mut total = self.retired;
        for entity in self.entities.values() {
            total.merge(entity.replicator.stats());
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use schema::FlagDef;

    fn coin() -> EntityLayout {
        EntityLayout::builder("coin")
            .flags(vec![FlagDef::new("collected")])
            .build()
            .unwrap()
    }

    fn spawn(registry: &mut EntityRegistry<MemoryHost>, id: u32, authority: Authority) {
        let layout = coin();
        let host = MemoryHost::from_layout(&layout);
        registry
            .spawn(EntityId::new(id), layout, host, authority)
            .unwrap();
    }

    #[test]
    fn spawn_rejects_duplicates() {
        let mut registry = EntityRegistry::default();
        spawn(&mut registry, 1, Authority::Owner);
        let layout = coin();
        let host = MemoryHost::from_layout(&layout);
        let err = registry
            .spawn(EntityId::new(1), layout, host, Authority::Owner)
            .unwrap_err();
        assert_eq!(err, CodecError::EntityExists(EntityId::new(1)));
    }

    #[test]
    fn collect_outgoing_only_owned() {
        let mut registry = EntityRegistry::default();
        spawn(&mut registry, 1, Authority::Owner);
        spawn(&mut registry, 2, Authority::Remote);
        spawn(&mut registry, 3, Authority::Owner);

        let frames = registry.collect_outgoing(Duration::from_millis(5)).unwrap();
        let ids: Vec<u32> = frames.iter().map(|f| f.entity.raw()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(frames[0].timestamp, SendTimestamp::new(5_000));

        // nothing changed, nothing due
        assert!(registry
            .collect_outgoing(Duration::from_millis(10))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn deliver_routes_to_entity() {
        let mut registry = EntityRegistry::default();
        spawn(&mut registry, 7, Authority::Remote);
        let outcome = registry
            .deliver(EntityId::new(7), &[0, 1], ReceiveInfo::new(SendTimestamp::new(1)))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied { records: 1 });
        let entity = registry.get(EntityId::new(7)).unwrap();
        assert_eq!(entity.host.flag("collected"), Some(true));

        let err = registry
            .deliver(EntityId::new(8), &[0, 1], ReceiveInfo::new(SendTimestamp::new(2)))
            .unwrap_err();
        assert_eq!(err, CodecError::EntityNotFound(EntityId::new(8)));
    }

    #[test]
    fn despawn_keeps_totals() {
        let mut registry = EntityRegistry::default();
        spawn(&mut registry, 1, Authority::Owner);
        registry.collect_outgoing(Duration::ZERO).unwrap();
        let (_host, stats) = registry.despawn(EntityId::new(1)).unwrap();
        assert_eq!(stats.frames_sent, 1);
        assert!(registry.is_empty());
        assert_eq!(registry.stats().frames_sent, 1);
        assert!(registry.despawn(EntityId::new(1)).is_err());
    }

    #[test]
    fn set_authority_switches_sender() {
        let mut registry = EntityRegistry::default();
        spawn(&mut registry, 1, Authority::Remote);
        assert!(registry.collect_outgoing(Duration::ZERO).unwrap().is_empty());
        registry
            .set_authority(EntityId::new(1), Authority::Owner)
            .unwrap();
        assert_eq!(registry.collect_outgoing(Duration::ZERO).unwrap().len(), 1);
    }
}
