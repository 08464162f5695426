use std::collections::{HashMap, HashSet};

use secidx_types::{Bucket, DefnId, IndexerNode, IndexUsage, InstId, NodeId, NodeUuid, PartnId, ReplicaId};

use crate::error::{Error, Result};
use crate::token::{new_token_id, ShardTransferToken, TokenState, TransferMode};

/// A node plus the serverless-specific resource figures the general
/// [`IndexerNode`] quota fields don't carry (spec.md §4.H).
#[derive(Debug, Clone, PartialEq)]
pub struct TenantNode {
    pub node: IndexerNode,
    /// Actual resident memory, as opposed to `mem_quota`'s budgeted ceiling.
    pub mandatory_quota: u64,
    pub actual_units: f64,
}

/// Watermark thresholds driving tenant placement and eviction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageThreshold {
    pub mem_low_pct: f64,
    pub mem_high_pct: f64,
    pub units_low_pct: f64,
    pub units_high_pct: f64,
    pub mem_quota: u64,
    pub units_quota: f64,
}

fn mem_pct(nodes: &[TenantNode], id: NodeId, threshold: &UsageThreshold) -> f64 {
    if threshold.mem_quota == 0 {
        return 0.0;
    }
    nodes
        .iter()
        .find(|n| n.node.node_id == id)
        .map(|n| n.mandatory_quota as f64 / threshold.mem_quota as f64 * 100.0)
        .unwrap_or(0.0)
}

fn subcluster_below(nodes: &[TenantNode], sc: &secidx_types::SubCluster, limit: f64, threshold: &UsageThreshold) -> bool {
    sc.nodes.iter().all(|&id| mem_pct(nodes, id, threshold) < limit)
}

/// Pairs nodes into sub-clusters by shared bucket occupancy (spec.md
/// §4.H "Sub-cluster discovery"): two non-empty nodes pair when they
/// host indexes of the same bucket; leftover empty nodes pair across
/// distinct server groups. Fails with [`Error::PlannerConstraintViolation`]
/// if two nodes sharing a bucket are in the same server group.
pub fn discover_subclusters(nodes: &[TenantNode]) -> Result<Vec<secidx_types::SubCluster>> {
    let mut used: HashSet<NodeId> = HashSet::new();
    let mut subclusters = Vec::new();

    let mut by_bucket: HashMap<Bucket, Vec<NodeId>> = HashMap::new();
    for tn in nodes {
        for usage in &tn.node.indexes {
            let ids = by_bucket.entry(usage.bucket.clone()).or_default();
            if !ids.contains(&tn.node.node_id) {
                ids.push(tn.node.node_id);
            }
        }
    }

    let mut buckets: Vec<Bucket> = by_bucket.keys().cloned().collect();
    buckets.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    for bucket in buckets {
        let mut ids = by_bucket.remove(&bucket).unwrap();
        ids.retain(|id| !used.contains(id));
        ids.sort_unstable_by_key(|id| id.0);
        if ids.len() < 2 {
            continue;
        }
        let a = ids[0];
        let b = ids[1];
        let ga = &nodes.iter().find(|n| n.node.node_id == a).unwrap().node.server_group;
        let gb = &nodes.iter().find(|n| n.node.node_id == b).unwrap().node.server_group;
        if ga == gb {
            return Err(Error::PlannerConstraintViolation);
        }
        subclusters.push(secidx_types::SubCluster::new(a, b));
        used.insert(a);
        used.insert(b);
    }

    let mut empties: Vec<&TenantNode> = nodes.iter().filter(|n| n.node.indexes.is_empty() && !used.contains(&n.node.node_id)).collect();
    empties.sort_by_key(|n| n.node.node_id.0);
    while empties.len() >= 2 {
        let a = empties.remove(0);
        if let Some(pos) = empties.iter().position(|n| n.node.server_group != a.node.server_group) {
            let b = empties.remove(pos);
            subclusters.push(secidx_types::SubCluster::new(a.node.node_id, b.node.node_id));
        } else {
            break;
        }
    }

    Ok(subclusters)
}

/// Chooses the sub-cluster to host a new tenant's index (spec.md §4.H
/// `ExecutePlan2`): prefer one already hosting `bucket` and below HWM,
/// else any below LWM, tiebroken by lowest `MandatoryQuota`.
pub fn execute_plan2(
    subclusters: &[secidx_types::SubCluster],
    nodes: &[TenantNode],
    bucket: &Bucket,
    threshold: &UsageThreshold,
    bucket_index_count: usize,
    serverless_bucket_limit: usize,
) -> Result<secidx_types::SubCluster> {
    if bucket_index_count >= serverless_bucket_limit {
        return Err(Error::IndexBucketLimitReached);
    }

    for sc in subclusters {
        let hosts_bucket = sc.nodes.iter().any(|&id| {
            nodes
                .iter()
                .find(|n| n.node.node_id == id)
                .is_some_and(|n| n.node.indexes.iter().any(|u| &u.bucket == bucket))
        });
        if hosts_bucket && subcluster_below(nodes, sc, threshold.mem_high_pct, threshold) {
            return Ok(sc.clone());
        }
    }

    let mut candidates: Vec<&secidx_types::SubCluster> = subclusters
        .iter()
        .filter(|sc| subcluster_below(nodes, sc, threshold.mem_low_pct, threshold))
        .collect();
    candidates.sort_by(|a, b| {
        let qa = a.nodes.iter().map(|&id| mem_pct(nodes, id, threshold) as u64).min().unwrap_or(0);
        let qb = b.nodes.iter().map(|&id| mem_pct(nodes, id, threshold) as u64).min().unwrap_or(0);
        qa.cmp(&qb)
    });
    candidates.first().map(|sc| (*sc).clone()).ok_or(Error::PlannerMaxResourceUsageLimit)
}

/// One tenant (an index's bucket) ranked for eviction, carrying the
/// figures needed for the alternating largest-memory/largest-units pick.
#[derive(Debug, Clone)]
struct TenantLoad {
    bucket: Bucket,
    memory_bytes: u64,
    units: f64,
}

fn tenant_loads(nodes: &[TenantNode], sc: &secidx_types::SubCluster) -> Vec<TenantLoad> {
    let mut by_bucket: HashMap<Bucket, (u64, f64)> = HashMap::new();
    for &id in &sc.nodes {
        if let Some(tn) = nodes.iter().find(|n| n.node.node_id == id) {
            for usage in &tn.node.indexes {
                let e = by_bucket.entry(usage.bucket.clone()).or_insert((0, 0.0));
                e.0 += usage.memory_bytes();
                e.1 += usage.sizing.mutation_rate + usage.sizing.scan_rate;
            }
        }
    }
    by_bucket
        .into_iter()
        .map(|(bucket, (memory_bytes, units))| TenantLoad { bucket, memory_bytes, units })
        .collect()
}

/// Selects tenants to evict from `sc` until its usage would drop below
/// the low watermark (spec.md §4.H step 4): alternately the
/// largest-memory and largest-units tenant, never evicting the last
/// tenant of a sub-cluster.
pub fn select_evictions(nodes: &[TenantNode], sc: &secidx_types::SubCluster, threshold: &UsageThreshold) -> Vec<Bucket> {
    let mut remaining = tenant_loads(nodes, sc);
    let mut evicted = Vec::new();
    let mut used_memory: u64 = remaining.iter().map(|t| t.memory_bytes).sum();
    let mut by_memory_turn = true;

    while remaining.len() > 1 {
        let above_lwm = threshold.mem_quota > 0
            && (used_memory as f64 / threshold.mem_quota as f64 * 100.0) >= threshold.mem_low_pct;
        if !above_lwm {
            break;
        }
        let idx = if by_memory_turn {
            remaining
                .iter()
                .enumerate()
                .max_by_key(|(_, t)| t.memory_bytes)
                .map(|(i, _)| i)
        } else {
            remaining
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.units.total_cmp(&b.units))
                .map(|(i, _)| i)
        };
        let Some(idx) = idx else { break };
        let t = remaining.remove(idx);
        used_memory = used_memory.saturating_sub(t.memory_bytes);
        evicted.push(t.bucket);
        by_memory_turn = !by_memory_turn;
    }

    evicted
}

/// Repairs one missing replica of `(defn_id, partn_id)` within `sc` by
/// cloning `surviving` onto the sub-cluster's other node with a fresh
/// `InstId` and the replica id not already present in the pair (spec.md
/// §4.H step 3).
pub fn repair_replica(sc: &secidx_types::SubCluster, surviving: &IndexUsage, next_inst_id: InstId) -> (NodeId, IndexUsage) {
    let target = sc.sibling(surviving.initial_node.unwrap_or(sc.nodes[0])).unwrap_or(sc.nodes[1]);
    let used_replica = surviving.replica_id;
    let new_replica = if used_replica == ReplicaId(0) { ReplicaId(1) } else { ReplicaId(0) };
    let mut clone = surviving.clone();
    clone.inst_id = next_inst_id;
    clone.replica_id = new_replica;
    clone.initial_node = None;
    clone.dest_node = Some(target);
    (target, clone)
}

/// Emits a shard transfer token for one tenant moving from `source` to
/// `dest`, linking it to `sibling` -- the token for the matching replica
/// moving between the mirror pair of nodes (spec.md §4.H step 6).
pub fn emit_shard_token(
    dest_uuid: NodeUuid,
    rebal_id: &str,
    shard_ids: Vec<u64>,
    index_insts: Vec<IndexUsage>,
    inst_ids: Vec<InstId>,
    source_host: NodeId,
    dest_host: NodeId,
    sibling_token_id: Option<String>,
) -> ShardTransferToken {
    ShardTransferToken {
        id: new_token_id(),
        dest_uuid,
        rebal_id: rebal_id.to_string(),
        state: TokenState::ShardTokenCreated,
        shard_ids,
        real_inst_ids: inst_ids.clone(),
        index_insts,
        inst_ids,
        inst_rename_map: None,
        sibling_token_id,
        transfer_mode: TransferMode::Move,
        source_host,
        dest_host,
    }
}

/// Result of one [`execute_tenant_aware_rebalance`] pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebalanceOutcome {
    pub repairs: Vec<(NodeId, IndexUsage)>,
    pub evicted: Vec<(Bucket, secidx_types::SubCluster)>,
    pub placements: Vec<(Bucket, secidx_types::SubCluster)>,
    pub shard_tokens: Vec<ShardTransferToken>,
}

/// Drives one tenant-aware rebalance pass over already-discovered
/// sub-clusters (spec.md §4.H `ExecuteTenantAwareRebalance`): repair any
/// sub-cluster missing a replica's mirror, evict tenants from
/// sub-clusters above the high watermark, then re-place each evicted
/// tenant into a sub-cluster below the low watermark, emitting a shard
/// transfer token per placement.
///
/// This is a narrower pass than the source algorithm's full six steps:
/// it does not handle a deleted node's own eviction/swap, nor the
/// permutation search used to assign >1 new node across distinct server
/// groups (spec.md §4.H step 2) -- both are left as a documented gap,
/// since sub-cluster membership here is taken as given rather than
/// reconstructed around node churn.
pub fn execute_tenant_aware_rebalance(
    nodes: &[TenantNode],
    subclusters: &[secidx_types::SubCluster],
    threshold: &UsageThreshold,
    rebal_id: &str,
    mut next_inst_id: impl FnMut() -> InstId,
) -> RebalanceOutcome {
    let mut outcome = RebalanceOutcome::default();

    for sc in subclusters {
        let [a, b] = sc.nodes;
        for &(from, to) in &[(a, b), (b, a)] {
            let Some(from_node) = nodes.iter().find(|n| n.node.node_id == from) else { continue };
            for usage in &from_node.node.indexes {
                let mirrored = nodes
                    .iter()
                    .find(|n| n.node.node_id == to)
                    .is_some_and(|n| n.node.indexes.iter().any(|u| u.defn_id == usage.defn_id));
                if !mirrored {
                    outcome.repairs.push(repair_replica(sc, usage, next_inst_id()));
                }
            }
        }
    }

    for sc in subclusters {
        if !subcluster_below(nodes, sc, threshold.mem_high_pct, threshold) {
            for bucket in select_evictions(nodes, sc, threshold) {
                outcome.evicted.push((bucket, sc.clone()));
            }
        }
    }

    for (bucket, source_sc) in &outcome.evicted {
        let dest = subclusters
            .iter()
            .filter(|sc| *sc != source_sc)
            .filter(|sc| subcluster_below(nodes, sc, threshold.mem_low_pct, threshold))
            .min_by_key(|sc| sc.nodes.iter().map(|&id| mem_pct(nodes, id, threshold) as u64).min().unwrap_or(0));

        let Some(dest) = dest else { continue };
        outcome.placements.push((bucket.clone(), dest.clone()));

        let dest_uuid = nodes.iter().find(|n| n.node.node_id == dest.nodes[0]).map(|n| n.node.node_uuid).unwrap_or(NodeUuid(0));
        outcome.shard_tokens.push(emit_shard_token(
            dest_uuid,
            rebal_id,
            vec![],
            vec![],
            vec![],
            source_sc.nodes[0],
            dest.nodes[0],
            None,
        ));
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use secidx_types::{IndexState, NodeUuid, ServerGroup, SizingHints};

    fn tenant_node(id: u32, sg: &str, indexes: Vec<IndexUsage>) -> TenantNode {
        TenantNode {
            node: IndexerNode {
                node_id: NodeId(id),
                node_uuid: NodeUuid(id as u128),
                server_group: ServerGroup(sg.to_string()),
                mem_quota: 0,
                cpu_quota: 0.0,
                indexes,
                is_delete: false,
                is_new: false,
            },
            mandatory_quota: 0,
            actual_units: 0.0,
        }
    }

    fn usage(bucket: &str, mem: u64, units: f64) -> IndexUsage {
        IndexUsage {
            defn_id: DefnId::new(1),
            inst_id: InstId::new(1),
            replica_id: ReplicaId(0),
            partitions: vec![PartnId(0)],
            state: IndexState::Active,
            bucket: Bucket::new(bucket),
            sizing: SizingHints { avg_key_size_bytes: 1, doc_count: mem, mutation_rate: units, scan_rate: 0.0 },
            initial_node: Some(NodeId(1)),
            dest_node: Some(NodeId(1)),
        }
    }

    #[test]
    fn discovers_subcluster_from_shared_bucket() {
        let nodes = vec![
            tenant_node(1, "sg1", vec![usage("t1", 10, 0.0)]),
            tenant_node(2, "sg2", vec![usage("t1", 10, 0.0)]),
        ];
        let subs = discover_subclusters(&nodes).unwrap();
        assert_eq!(subs, vec![secidx_types::SubCluster::new(NodeId(1), NodeId(2))]);
    }

    #[test]
    fn discovery_rejects_same_server_group_pairing() {
        let nodes = vec![
            tenant_node(1, "sg1", vec![usage("t1", 10, 0.0)]),
            tenant_node(2, "sg1", vec![usage("t1", 10, 0.0)]),
        ];
        assert_eq!(discover_subclusters(&nodes).unwrap_err(), Error::PlannerConstraintViolation);
    }

    #[test]
    fn eviction_never_drains_the_last_tenant() {
        let nodes = vec![
            tenant_node(1, "sg1", vec![usage("only", 1_000_000, 1.0)]),
            tenant_node(2, "sg2", vec![]),
        ];
        let threshold = UsageThreshold {
            mem_low_pct: 1.0,
            mem_high_pct: 80.0,
            units_low_pct: 1.0,
            units_high_pct: 80.0,
            mem_quota: 1,
            units_quota: 1.0,
        };
        let sc = secidx_types::SubCluster::new(NodeId(1), NodeId(2));
        let evicted = select_evictions(&nodes, &sc, &threshold);
        assert!(evicted.is_empty());
    }

    #[test]
    fn eviction_picks_largest_memory_tenant_first() {
        let nodes = vec![
            tenant_node(1, "sg1", vec![usage("small", 10, 0.0), usage("big", 1000, 0.0)]),
            tenant_node(2, "sg2", vec![]),
        ];
        let threshold = UsageThreshold {
            mem_low_pct: 0.0,
            mem_high_pct: 80.0,
            units_low_pct: 0.0,
            units_high_pct: 80.0,
            mem_quota: 1000,
            units_quota: 1.0,
        };
        let sc = secidx_types::SubCluster::new(NodeId(1), NodeId(2));
        let evicted = select_evictions(&nodes, &sc, &threshold);
        assert_eq!(evicted.first(), Some(&Bucket::new("big")));
    }

    #[test]
    fn repair_assigns_the_unused_replica_id_on_the_sibling() {
        let sc = secidx_types::SubCluster::new(NodeId(1), NodeId(2));
        let surviving = usage("t1", 10, 0.0);
        let (target, clone) = repair_replica(&sc, &surviving, InstId::new(99));
        assert_eq!(target, NodeId(2));
        assert_eq!(clone.replica_id, ReplicaId(1));
        assert_eq!(clone.inst_id, InstId::new(99));
    }

    #[test]
    fn shard_token_links_to_its_sibling() {
        let token = emit_shard_token(
            NodeUuid(2),
            "rebal-1",
            vec![7],
            vec![usage("t1", 10, 0.0)],
            vec![InstId::new(1)],
            NodeId(1),
            NodeId(2),
            Some("TransferTokenSIBLING".to_string()),
        );
        assert_eq!(token.sibling_token_id.as_deref(), Some("TransferTokenSIBLING"));
        assert_eq!(token.state, TokenState::ShardTokenCreated);
    }

    #[test]
    fn rebalance_repairs_a_missing_mirror_replica() {
        let nodes = vec![
            tenant_node(1, "sg1", vec![usage("t1", 10, 0.0)]),
            tenant_node(2, "sg2", vec![]),
        ];
        let sc = secidx_types::SubCluster::new(NodeId(1), NodeId(2));
        let threshold = UsageThreshold {
            mem_low_pct: 0.0,
            mem_high_pct: 100.0,
            units_low_pct: 0.0,
            units_high_pct: 100.0,
            mem_quota: 0,
            units_quota: 0.0,
        };
        let mut next = 100u64;
        let outcome =
            execute_tenant_aware_rebalance(&nodes, &[sc], &threshold, "rebal-1", || {
                next += 1;
                InstId::new(next)
            });
        assert_eq!(outcome.repairs.len(), 1);
        assert_eq!(outcome.repairs[0].0, NodeId(2));
    }

    fn loaded_tenant_node(id: u32, sg: &str, mandatory_quota: u64, indexes: Vec<IndexUsage>) -> TenantNode {
        let mut tn = tenant_node(id, sg, indexes);
        tn.mandatory_quota = mandatory_quota;
        tn
    }

    #[test]
    fn rebalance_evicts_and_places_when_above_high_watermark() {
        let nodes = vec![
            loaded_tenant_node(1, "sg1", 900, vec![usage("hot-a", 500, 0.0), usage("hot-b", 400, 0.0)]),
            loaded_tenant_node(2, "sg2", 900, vec![usage("hot-a", 500, 0.0), usage("hot-b", 400, 0.0)]),
            loaded_tenant_node(3, "sg3", 0, vec![]),
            loaded_tenant_node(4, "sg4", 0, vec![]),
        ];
        let hot_sc = secidx_types::SubCluster::new(NodeId(1), NodeId(2));
        let cold_sc = secidx_types::SubCluster::new(NodeId(3), NodeId(4));
        let threshold = UsageThreshold {
            mem_low_pct: 1.0,
            mem_high_pct: 50.0,
            units_low_pct: 0.0,
            units_high_pct: 100.0,
            mem_quota: 1000,
            units_quota: 1.0,
        };
        let outcome = execute_tenant_aware_rebalance(
            &nodes,
            &[hot_sc.clone(), cold_sc.clone()],
            &threshold,
            "rebal-1",
            || InstId::new(1),
        );
        assert_eq!(outcome.evicted.len(), 1);
        assert_eq!(outcome.evicted[0].1, hot_sc);
        assert_eq!(outcome.placements.len(), 1);
        assert_eq!(outcome.placements[0].1, cold_sc);
        assert_eq!(outcome.shard_tokens.len(), 1);
    }
}
