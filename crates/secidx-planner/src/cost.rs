use secidx_types::IndexerNode;

/// Weights for each cost component (spec.md §4.G). Defaults to a
/// balanced weighting: every component counted equally unless
/// overridden.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostWeights {
    pub memory: f64,
    pub cpu: f64,
    pub empty_index: f64,
    pub data_movement: f64,
    pub index_movement: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            memory: 1.0,
            cpu: 1.0,
            empty_index: 1.0,
            data_movement: 1.0,
            index_movement: 1.0,
        }
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

fn stddev(xs: &[f64], m: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64).sqrt()
}

/// `stddev / mean`, or `None` if the mean is zero (component skipped).
fn deviation_ratio(xs: &[f64]) -> Option<f64> {
    let m = mean(xs);
    if m == 0.0 {
        None
    } else {
        Some(stddev(xs, m) / m)
    }
}

/// Total cost of `nodes` relative to `initial`, the arithmetic mean of
/// whichever components have a non-zero denominator (spec.md §4.G: "Cost
/// is the arithmetic mean of the contributing components; components
/// with zero denominator are skipped").
pub fn cost(nodes: &[IndexerNode], initial: &[IndexerNode], weights: CostWeights) -> f64 {
    let mem: Vec<f64> = nodes.iter().map(|n| n.used_memory_bytes() as f64).collect();
    let cpu: Vec<f64> = nodes.iter().map(IndexerNode::used_cpu).collect();
    let empty_counts: Vec<f64> = nodes
        .iter()
        .map(|n| n.indexes.iter().filter(|u| u.sizing.is_no_usage()).count() as f64)
        .collect();

    let mut components = Vec::new();
    if let Some(r) = deviation_ratio(&mem) {
        components.push(r * weights.memory);
    }
    if let Some(r) = deviation_ratio(&cpu) {
        components.push(r * weights.cpu);
    }
    if let Some(r) = deviation_ratio(&empty_counts) {
        components.push(r * weights.empty_index);
    }

    let total_bytes: u64 = initial.iter().map(IndexerNode::used_memory_bytes).sum();
    let total_indexes: usize = initial.iter().map(|n| n.indexes.len()).sum();
    let usage_cost = components.iter().sum::<f64>() / (components.len().max(1) as f64);
    let damping = 1.0 - usage_cost.min(1.0);

    if total_bytes > 0 {
        let moved_bytes: u64 = nodes
            .iter()
            .flat_map(|n| n.indexes.iter())
            .filter(|u| u.is_moving())
            .map(|u| u.memory_bytes())
            .sum();
        components.push((moved_bytes as f64 / total_bytes as f64) * damping * weights.data_movement);
    }
    if total_indexes > 0 {
        let moved_indexes = nodes
            .iter()
            .flat_map(|n| n.indexes.iter())
            .filter(|u| u.is_moving())
            .count();
        components.push((moved_indexes as f64 / total_indexes as f64) * damping * weights.index_movement);
    }

    if components.is_empty() {
        0.0
    } else {
        components.iter().sum::<f64>() / components.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secidx_types::{Bucket, DefnId, IndexState, IndexUsage, InstId, NodeId, NodeUuid, PartnId, ReplicaId, ServerGroup, SizingHints};

    fn node_with(id: u32, mem: u64) -> IndexerNode {
        IndexerNode {
            node_id: NodeId(id),
            node_uuid: NodeUuid(id as u128),
            server_group: ServerGroup("sg".into()),
            mem_quota: 1_000_000,
            cpu_quota: 10.0,
            indexes: vec![IndexUsage {
                defn_id: DefnId::new(id as u64),
                inst_id: InstId::new(id as u64),
                replica_id: ReplicaId(0),
                partitions: vec![PartnId(0)],
                state: IndexState::Active,
                bucket: Bucket::new("b"),
                sizing: SizingHints { avg_key_size_bytes: 1, doc_count: mem, mutation_rate: 0.0, scan_rate: 0.0 },
                initial_node: Some(NodeId(id)),
                dest_node: Some(NodeId(id)),
            }],
            is_delete: false,
            is_new: false,
        }
    }

    #[test]
    fn balanced_cluster_has_near_zero_cost() {
        let nodes = vec![node_with(1, 100), node_with(2, 100), node_with(3, 100)];
        let c = cost(&nodes, &nodes, CostWeights::default());
        assert!(c < 0.01, "cost was {c}");
    }

    #[test]
    fn skewed_cluster_has_higher_cost_than_balanced() {
        let balanced = vec![node_with(1, 100), node_with(2, 100)];
        let skewed = vec![node_with(1, 10), node_with(2, 190)];
        assert!(cost(&skewed, &balanced, CostWeights::default()) > cost(&balanced, &balanced, CostWeights::default()));
    }
}
