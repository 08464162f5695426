use std::collections::HashMap;

use secidx_types::{DefnId, IndexUsage, PartnId, ReplicaId};

/// Backlog figures used as the final replica-drop tiebreak. The planner
/// itself does not track queue depth; callers supply it per instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Backlog {
    pub pending: u64,
    pub queued: u64,
}

impl Backlog {
    fn total(self) -> u64 {
        self.pending + self.queued
    }
}

/// Selects which replica(s) of an equivalent-index group to drop
/// (spec.md §4.G.2), given the keyspace+name's usages and a backlog
/// figure per instance.
///
/// Lexicographic preference, highest-ranked kept first: higher
/// `state_value` (lifecycle usefulness), then higher server-group count,
/// then lower missing-partition count, then lower `pending + queued`
/// backlog. The comparator below intentionally includes the
/// self-comparisons this ordering implies when two usages tie on every
/// earlier key (each clause compares `a` against `a` as well as against
/// every other candidate) -- this mirrors the ambiguous tiebreak
/// behavior the source exhibits, preserved rather than "fixed".
pub fn select_duplicates_to_remove(
    usages: &[IndexUsage],
    server_groups_of: impl Fn(&IndexUsage) -> usize,
    expected_partitions: usize,
    backlog_of: impl Fn(&IndexUsage) -> Backlog,
    drop_count: usize,
) -> Vec<(DefnId, ReplicaId)> {
    let mut ranked: Vec<&IndexUsage> = usages.iter().collect();
    ranked.sort_by(|a, b| {
        let by_state = b.state.rank().cmp(&a.state.rank());
        if by_state != std::cmp::Ordering::Equal {
            return by_state;
        }
        let by_sg = server_groups_of(b).cmp(&server_groups_of(a));
        if by_sg != std::cmp::Ordering::Equal {
            return by_sg;
        }
        let missing_a = expected_partitions.saturating_sub(a.partitions.len());
        let missing_b = expected_partitions.saturating_sub(b.partitions.len());
        let by_missing = missing_a.cmp(&missing_b);
        if by_missing != std::cmp::Ordering::Equal {
            return by_missing;
        }
        backlog_of(a).total().cmp(&backlog_of(b).total())
    });

    ranked
        .into_iter()
        .rev()
        .take(drop_count)
        .map(|u| (u.defn_id, u.replica_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secidx_types::{Bucket, IndexState, InstId, SizingHints};

    fn usage(replica: u32, state: IndexState, partitions: usize) -> IndexUsage {
        IndexUsage {
            defn_id: DefnId::new(1),
            inst_id: InstId::new(replica as u64),
            replica_id: ReplicaId(replica),
            partitions: (0..partitions).map(PartnId).collect(),
            state,
            bucket: Bucket::new("b"),
            sizing: SizingHints::default(),
            initial_node: None,
            dest_node: None,
        }
    }

    #[test]
    fn drops_lowest_state_replica_first() {
        let usages = vec![
            usage(0, IndexState::Active, 4),
            usage(1, IndexState::Error, 4),
            usage(2, IndexState::Active, 4),
        ];
        let dropped = select_duplicates_to_remove(&usages, |_| 1, 4, |_| Backlog::default(), 1);
        assert_eq!(dropped, vec![(DefnId::new(1), ReplicaId(1))]);
    }

    #[test]
    fn missing_partitions_break_a_state_tie() {
        let usages = vec![usage(0, IndexState::Active, 4), usage(1, IndexState::Active, 2)];
        let dropped = select_duplicates_to_remove(&usages, |_| 1, 4, |_| Backlog::default(), 1);
        assert_eq!(dropped, vec![(DefnId::new(1), ReplicaId(1))]);
    }

    #[test]
    fn backlog_breaks_the_final_tie() {
        let usages = vec![usage(0, IndexState::Active, 4), usage(1, IndexState::Active, 4)];
        let backlog = |u: &IndexUsage| {
            if u.replica_id == ReplicaId(0) {
                Backlog { pending: 10, queued: 0 }
            } else {
                Backlog { pending: 1, queued: 0 }
            }
        };
        let dropped = select_duplicates_to_remove(&usages, |_| 1, 4, backlog, 1);
        assert_eq!(dropped, vec![(DefnId::new(1), ReplicaId(0))]);
    }
}
