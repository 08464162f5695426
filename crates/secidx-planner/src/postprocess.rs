use std::collections::HashMap;

use secidx_types::{DefnId, IndexerNode, NodeId, NodeUuid};

use crate::token::{new_token_id, TokenState, TransferMode, TransferToken};

/// Repeatedly rewrites a `source -> dest` map to eliminate transitive
/// chains and cycles (spec.md §4.G.1 step 2): `transferMap[A] = B` and
/// `transferMap[B] = C` collapse to `transferMap[A] = C` with `B`
/// dropped; if that makes `C == A` the `A` entry is dropped too.
fn eliminate_cycles(map: &mut HashMap<NodeId, NodeId>) {
    loop {
        let mut changed = false;
        let snapshot: Vec<(NodeId, NodeId)> = map.iter().map(|(&a, &b)| (a, b)).collect();
        for (a, b) in snapshot {
            if a == b {
                map.remove(&a);
                changed = true;
                continue;
            }
            if let Some(&c) = map.get(&b) {
                if c != b {
                    map.insert(a, c);
                    map.remove(&b);
                    changed = true;
                    if c == a {
                        map.remove(&a);
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
}

/// Post-processes a planned solution in place (spec.md §4.G.1): groups
/// moving usages by `DefnId`, collapses cyclic/transitive transfer
/// chains, and rewrites each usage's `dest_node` to the chain's final
/// target. An index whose initial and final destination coincide after
/// this pass is left with `dest_node == initial_node`, so it emits no
/// token in [`emit_transfer_tokens`].
///
/// Idempotent: a solution already free of cycles/transitive chains is
/// returned unchanged by a second call.
pub fn filter_solution(nodes: &mut [IndexerNode]) {
    let mut groups: HashMap<DefnId, Vec<(usize, usize)>> = HashMap::new();
    for (ni, node) in nodes.iter().enumerate() {
        for (ui, usage) in node.indexes.iter().enumerate() {
            groups.entry(usage.defn_id).or_default().push((ni, ui));
        }
    }

    for entries in groups.values() {
        if entries.len() <= 1 {
            continue;
        }
        let mut transfer_map: HashMap<NodeId, NodeId> = HashMap::new();
        for &(ni, ui) in entries {
            let usage = &nodes[ni].indexes[ui];
            if let (Some(a), Some(b)) = (usage.initial_node, usage.dest_node) {
                if a != b {
                    transfer_map.insert(a, b);
                }
            }
        }
        eliminate_cycles(&mut transfer_map);

        for &(ni, ui) in entries {
            let usage = &mut nodes[ni].indexes[ui];
            if let Some(initial) = usage.initial_node {
                usage.dest_node = Some(transfer_map.get(&initial).copied().unwrap_or(initial));
            }
        }
    }
}

fn uuid_of(nodes: &[IndexerNode], id: NodeId) -> NodeUuid {
    nodes
        .iter()
        .find(|n| n.node_id == id)
        .map(|n| n.node_uuid)
        .unwrap_or(NodeUuid(0))
}

/// Emits one classic transfer token per moved replica-partition set,
/// after [`filter_solution`] has already collapsed no-op/cyclic moves.
pub fn emit_transfer_tokens(nodes: &[IndexerNode], rebal_id: &str) -> Vec<TransferToken> {
    let mut tokens = Vec::new();
    for node in nodes {
        for usage in &node.indexes {
            let (Some(src), Some(dst)) = (usage.initial_node, usage.dest_node) else { continue };
            if src == dst {
                continue;
            }
            tokens.push(TransferToken {
                id: new_token_id(),
                master_id: src,
                source_uuid: uuid_of(nodes, src),
                dest_uuid: uuid_of(nodes, dst),
                rebal_id: rebal_id.to_string(),
                state: TokenState::Created,
                inst_id: usage.inst_id,
                index_inst: usage.clone(),
                transfer_mode: TransferMode::Move,
                source_host: src,
                dest_host: dst,
            });
        }
    }
    tokens
}
