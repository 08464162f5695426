use std::collections::BTreeMap;

use secidx_types::Vbno;

use crate::error::{Error, Result};

/// Merges per-node high-seqno vectors into one vector sorted ascending
/// by VB, keeping the max seqno seen for each VB across nodes.
///
/// Fails with [`Error::IncompleteSeqnos`] if fewer distinct VBs were
/// observed than `want`.
pub fn merge_max(per_node: &[Vec<(Vbno, u64)>], want: usize) -> Result<Vec<(Vbno, u64)>> {
    let mut merged: BTreeMap<Vbno, u64> = BTreeMap::new();
    for node in per_node {
        for &(vb, seqno) in node {
            merged
                .entry(vb)
                .and_modify(|cur| *cur = (*cur).max(seqno))
                .or_insert(seqno);
        }
    }
    if merged.len() != want {
        return Err(Error::IncompleteSeqnos {
            got: merged.len(),
            want,
        });
    }
    Ok(merged.into_iter().collect())
}

/// Merges per-node min-seqno vectors, 0-aware: a `0` means "no replica
/// yet" for that VB on that node and is ignored unless every node
/// reports 0, in which case the VB's merged value is `0`.
pub fn merge_min(per_node: &[Vec<(Vbno, u64)>], want: usize) -> Result<Vec<(Vbno, u64)>> {
    let mut merged: BTreeMap<Vbno, Option<u64>> = BTreeMap::new();
    for node in per_node {
        for &(vb, seqno) in node {
            let entry = merged.entry(vb).or_insert(None);
            if seqno == 0 {
                entry.get_or_insert(0);
                continue;
            }
            *entry = Some(match *entry {
                Some(0) | None => seqno,
                Some(cur) => cur.min(seqno),
            });
        }
    }
    if merged.len() != want {
        return Err(Error::IncompleteSeqnos {
            got: merged.len(),
            want,
        });
    }
    Ok(merged
        .into_iter()
        .map(|(vb, seqno)| (vb, seqno.unwrap_or(0)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_max_takes_highest_per_vb() {
        let a = vec![(Vbno(0), 10), (Vbno(1), 5)];
        let b = vec![(Vbno(0), 8), (Vbno(1), 20)];
        let merged = merge_max(&[a, b], 2).unwrap();
        assert_eq!(merged, vec![(Vbno(0), 10), (Vbno(1), 20)]);
    }

    #[test]
    fn merge_max_rejects_short_result() {
        let a = vec![(Vbno(0), 10)];
        let err = merge_max(&[a], 2).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompleteSeqnos { got: 1, want: 2 }
        ));
    }

    #[test]
    fn merge_min_ignores_zero_unless_unanimous() {
        let a = vec![(Vbno(0), 0), (Vbno(1), 7)];
        let b = vec![(Vbno(0), 5), (Vbno(1), 3)];
        let merged = merge_min(&[a, b], 2).unwrap();
        assert_eq!(merged, vec![(Vbno(0), 5), (Vbno(1), 3)]);
    }

    #[test]
    fn merge_min_is_zero_when_every_node_reports_zero() {
        let a = vec![(Vbno(0), 0)];
        let b = vec![(Vbno(0), 0)];
        let merged = merge_min(&[a, b], 1).unwrap();
        assert_eq!(merged, vec![(Vbno(0), 0)]);
    }
}
