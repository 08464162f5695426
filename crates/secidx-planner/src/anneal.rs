use rand::Rng;
use tracing::debug;

use secidx_types::{DefnId, IndexerNode};

use crate::config::AnnealConfig;
use crate::cost::cost;
use crate::violation::{check_move, ViolationCode};

/// Number of equivalent (same `DefnId`) instances present across `nodes`,
/// used to decide whether the `EquivIndex` constraint auto-relaxes
/// (spec.md: relaxed when `NumEquivalentIndex > NumLiveNode`).
fn equiv_relaxed_for(nodes: &[IndexerNode], defn_id: DefnId) -> bool {
    let live_nodes = nodes.iter().filter(|n| !n.is_delete).count();
    let equiv_count: usize = nodes
        .iter()
        .flat_map(|n| n.indexes.iter())
        .filter(|u| u.defn_id == defn_id)
        .count();
    equiv_count > live_nodes
}

/// Picks one neighbor solution by relocating a single index partition
/// (spec.md §4.G "Neighbor generation"). Returns `None` when no movable
/// index has a validated destination this attempt.
///
/// This implements the weighted constrained-node / weighted-destination
/// steps of §4.G's neighbor rule; it does not implement the swap-delete
/// wholesale phase or the exhaustive fallback passes, which only
/// trigger for a fixed-size cluster with exactly one constrained node --
/// a narrower case left as a documented simplification.
pub fn find_neighbor(nodes: &[IndexerNode]) -> Option<Vec<IndexerNode>> {
    let mut rng = rand::thread_rng();

    let source_candidates: Vec<usize> = (0..nodes.len()).filter(|&i| !nodes[i].indexes.is_empty()).collect();
    if source_candidates.is_empty() {
        return None;
    }
    let src_idx = source_candidates[rng.gen_range(0..source_candidates.len())];
    if nodes[src_idx].indexes.is_empty() {
        return None;
    }
    let usage_idx = rng.gen_range(0..nodes[src_idx].indexes.len());
    let usage = nodes[src_idx].indexes[usage_idx].clone();

    let mut dest_candidates: Vec<usize> = (0..nodes.len()).filter(|&i| i != src_idx && !nodes[i].is_delete).collect();
    if dest_candidates.is_empty() {
        return None;
    }
    // Prefer destinations with more free memory headroom; ties broken by
    // fewer NoUsage indexes when the moving index itself has no sizing.
    dest_candidates.sort_by(|&a, &b| {
        let free_a = nodes[a].mem_quota.saturating_sub(nodes[a].used_memory_bytes());
        let free_b = nodes[b].mem_quota.saturating_sub(nodes[b].used_memory_bytes());
        free_b.cmp(&free_a)
    });
    if usage.sizing.is_no_usage() {
        dest_candidates.sort_by_key(|&i| nodes[i].indexes.iter().filter(|u| u.sizing.is_no_usage()).count());
    }

    let equiv_relaxed = equiv_relaxed_for(nodes, usage.defn_id);
    for &dest_idx in dest_candidates.iter().take(5) {
        let added_mem = usage.memory_bytes();
        let added_cpu = usage.sizing.mutation_rate + usage.sizing.scan_rate;
        let mut partitions = usage.partitions.iter();
        let first_partn = match partitions.next() {
            Some(p) => *p,
            None => continue,
        };
        let v = check_move(nodes, &nodes[dest_idx], usage.defn_id, first_partn, added_mem, added_cpu, equiv_relaxed);
        if v != ViolationCode::NoViolation {
            continue;
        }
        let mut next = nodes.to_vec();
        let mut moved = next[src_idx].indexes.remove(usage_idx);
        moved.dest_node = Some(next[dest_idx].node_id);
        next[dest_idx].indexes.push(moved);
        return Some(next);
    }
    None
}

/// Runs the simulated-annealing loop to convergence (spec.md §4.G).
/// Returns the best solution found, which may equal `initial` if no
/// accepted move ever improved on it.
pub fn anneal(initial: &[IndexerNode], config: &AnnealConfig) -> Vec<IndexerNode> {
    let mut rng = rand::thread_rng();
    let mut current = initial.to_vec();
    let mut current_cost = cost(&current, initial, config.weights);
    let mut best = current.clone();
    let mut best_cost = current_cost;

    let mut temperature = config.initial_temperature;
    while temperature > config.min_temperature {
        let mut moves = 0u32;
        let mut positive_moves = 0u32;
        for _ in 0..config.iterations_per_temp {
            let Some(neighbor) = find_neighbor(&current) else { continue };
            let neighbor_cost = cost(&neighbor, initial, config.weights);
            let delta = neighbor_cost - current_cost;
            let accept = delta < 0.0 || rng.gen::<f64>() < (-delta / temperature).exp();
            if accept {
                current = neighbor;
                current_cost = neighbor_cost;
                moves += 1;
                if delta < 0.0 {
                    positive_moves += 1;
                }
                if current_cost < best_cost {
                    best_cost = current_cost;
                    best = current.clone();
                }
            }
        }
        debug!(temperature, moves, positive_moves, cost = current_cost, "planner.converged");
        if moves < config.min_num_move && positive_moves < config.min_num_positive_move {
            break;
        }
        temperature *= config.alpha;
    }

    best
}
