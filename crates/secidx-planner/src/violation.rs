use secidx_types::{DefnId, IndexerNode, PartnId};

/// Result of checking a candidate placement against one constraint
/// (spec.md §4.G). A closed enum so every constraint predicate is
/// exhaustively matched by callers deciding whether to accept a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationCode {
    NoViolation,
    Memory,
    Cpu,
    /// Two replicas of the same `(DefnId, PartnId)` landed on one node.
    Replica,
    /// Two definition-equivalent indexes (same keyspace+shape) on one node.
    EquivIndex,
    /// A replica's server group has another replica while a live SG has none.
    ServerGroup,
    /// The candidate node is marked for removal.
    DeleteNode,
}

/// Checks whether placing `defn_id`/`partn_id` onto `target` (alongside
/// the rest of `nodes`) is sound.
///
/// `equiv_relaxed` disables the [`ViolationCode::EquivIndex`] check for
/// this index (spec.md: `NumEquivalentIndex > NumLiveNode` auto-relaxes
/// the check, since there is nowhere left to separate every instance).
pub fn check_move(
    nodes: &[IndexerNode],
    target: &IndexerNode,
    defn_id: DefnId,
    partn_id: PartnId,
    added_memory: u64,
    added_cpu: f64,
    equiv_relaxed: bool,
) -> ViolationCode {
    if target.is_delete {
        return ViolationCode::DeleteNode;
    }
    if target.mem_quota > 0 && target.used_memory_bytes() + added_memory > target.mem_quota {
        return ViolationCode::Memory;
    }
    if target.cpu_quota > 0.0 && target.used_cpu() + added_cpu > target.cpu_quota {
        return ViolationCode::Cpu;
    }
    if target.has_replica(defn_id, partn_id) {
        return ViolationCode::Replica;
    }
    if !equiv_relaxed {
        let equiv_on_target = target
            .indexes
            .iter()
            .any(|u| u.defn_id == defn_id && u.partitions.contains(&partn_id));
        if equiv_on_target {
            return ViolationCode::EquivIndex;
        }
    }
    if server_group_violated(nodes, target, defn_id, partn_id) {
        return ViolationCode::ServerGroup;
    }
    ViolationCode::NoViolation
}

/// Whether adding a replica of `(defn_id, partn_id)` to `target` leaves
/// some other live server group with zero replicas of it while
/// `target`'s group already hosts one.
fn server_group_violated(
    nodes: &[IndexerNode],
    target: &IndexerNode,
    defn_id: DefnId,
    partn_id: PartnId,
) -> bool {
    let live_groups: std::collections::HashSet<&str> = nodes
        .iter()
        .filter(|n| !n.is_delete)
        .map(|n| n.server_group.0.as_str())
        .collect();
    if live_groups.len() < 2 {
        return false;
    }
    let groups_with_replica: std::collections::HashSet<&str> = nodes
        .iter()
        .filter(|n| n.has_replica(defn_id, partn_id))
        .map(|n| n.server_group.0.as_str())
        .collect();
    groups_with_replica.contains(target.server_group.0.as_str())
        && live_groups.iter().any(|g| !groups_with_replica.contains(g))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secidx_types::{Bucket, IndexState, IndexUsage, NodeId, NodeUuid, ReplicaId, ServerGroup, SizingHints};

    fn node(id: u32, sg: &str, indexes: Vec<IndexUsage>) -> IndexerNode {
        IndexerNode {
            node_id: NodeId(id),
            node_uuid: NodeUuid(id as u128),
            server_group: ServerGroup(sg.to_string()),
            mem_quota: 1_000_000,
            cpu_quota: 10.0,
            indexes,
            is_delete: false,
            is_new: false,
        }
    }

    fn usage(defn: u64, replica: u32) -> IndexUsage {
        IndexUsage {
            defn_id: DefnId::new(defn),
            inst_id: secidx_types::InstId::new(defn),
            replica_id: ReplicaId(replica),
            partitions: vec![PartnId(0)],
            state: IndexState::Active,
            bucket: Bucket::new("b"),
            sizing: SizingHints::default(),
            initial_node: None,
            dest_node: None,
        }
    }

    #[test]
    fn replica_violation_on_same_node() {
        let target = node(1, "sg1", vec![usage(1, 0)]);
        let nodes = vec![target.clone()];
        let v = check_move(&nodes, &target, DefnId::new(1), PartnId(0), 0, 0.0, false);
        assert_eq!(v, ViolationCode::Replica);
    }

    #[test]
    fn delete_marked_node_is_rejected() {
        let mut target = node(1, "sg1", vec![]);
        target.is_delete = true;
        let v = check_move(&[target.clone()], &target, DefnId::new(1), PartnId(0), 0, 0.0, false);
        assert_eq!(v, ViolationCode::DeleteNode);
    }

    #[test]
    fn server_group_violation_when_other_group_is_empty() {
        let a = node(1, "sg1", vec![usage(1, 0)]);
        let b = node(2, "sg1", vec![]);
        let c = node(3, "sg2", vec![]);
        let nodes = vec![a, b.clone(), c];
        let v = check_move(&nodes, &b, DefnId::new(1), PartnId(0), 0, 0.0, false);
        assert_eq!(v, ViolationCode::ServerGroup);
    }

    #[test]
    fn no_violation_onto_distinct_server_group() {
        let a = node(1, "sg1", vec![usage(1, 0)]);
        let c = node(3, "sg2", vec![]);
        let nodes = vec![a, c.clone()];
        let v = check_move(&nodes, &c, DefnId::new(1), PartnId(0), 0, 0.0, false);
        assert_eq!(v, ViolationCode::NoViolation);
    }
}
