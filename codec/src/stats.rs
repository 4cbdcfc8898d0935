//! Replication counters.

/// Per-entity send and receive counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplicationStats {
    /// Non-empty frames produced by `on_send`.
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub records_sent: u64,
    pub frames_applied: u64,
    pub records_applied: u64,
    /// Frames dropped by the ordering guard.
    pub frames_stale: u64,
    /// Frames dropped as malformed.
    pub frames_rejected: u64,
}

impl ReplicationStats {
    /// Adds another set of counters into this one.
    pub fn merge(&mut self, other: &Self) {
        self.frames_sent += other.frames_sent;
        self.bytes_sent += other.bytes_sent;
        self.records_sent += other.records_sent;
        self.frames_applied += other.frames_applied;
        self.records_applied += other.records_applied;
        self.frames_stale += other.frames_stale;
        self.frames_rejected += other.frames_rejected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_adds_counters() {
        let mut total = ReplicationStats {
            frames_sent: 1,
            bytes_sent: 10,
            ..ReplicationStats::default()
        };
        total.merge(&ReplicationStats {
            frames_sent: 2,
            frames_stale: 1,
            ..ReplicationStats::default()
        });
        assert_eq!(total.frames_sent, 3);
        assert_eq!(total.bytes_sent, 10);
        assert_eq!(total.frames_stale, 1);
    }
}
