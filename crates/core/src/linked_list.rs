//! Pure algorithms over rows that encode an ordered list as forward pointers.
//!
//! A well-formed list of `n > 0` nodes has exactly one node no other node
//! points at (the head), exactly one node with `next_id == None` (the tail),
//! no cycles, and every node reachable from the head. An empty list has no
//! nodes and no head.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;

use crate::error::CoreError;
use crate::types::DbId;

/// One row of a deck or pile list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: DbId,
    pub code: String,
    pub next_id: Option<DbId>,
}

/// Follow the list from `head`, returning nodes head-to-tail.
///
/// Fails on a cycle, on a pointer to a missing node, on a head that
/// disagrees with emptiness, and on nodes unreachable from the head.
pub fn walk(head: Option<DbId>, nodes: &[Node]) -> Result<Vec<&Node>, CoreError> {
    let by_id: HashMap<DbId, &Node> = nodes.iter().map(|n| (n.id, n)).collect();

    let Some(mut current) = head else {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        return Err(CoreError::CorruptedList(format!(
            "list has {} nodes but no head",
            nodes.len()
        )));
    };

    let mut visited = HashSet::with_capacity(nodes.len());
    let mut ordered = Vec::with_capacity(nodes.len());
    loop {
        if !visited.insert(current) {
            return Err(CoreError::CorruptedList(format!(
                "cycle detected at node {current}"
            )));
        }
        let node = by_id.get(&current).ok_or_else(|| {
            CoreError::CorruptedList(format!("pointer to missing node {current}"))
        })?;
        ordered.push(*node);
        match node.next_id {
            Some(next) => current = next,
            None => break,
        }
    }

    if ordered.len() != nodes.len() {
        return Err(CoreError::CorruptedList(format!(
            "{} of {} nodes unreachable from head",
            nodes.len() - ordered.len(),
            nodes.len()
        )));
    }
    Ok(ordered)
}

/// Locate the head by structure alone: the one id nobody points at.
///
/// Returns `None` for an empty list. Zero or several candidates mean the
/// list is broken; no guess is made.
pub fn structural_head(nodes: &[Node]) -> Result<Option<DbId>, CoreError> {
    if nodes.is_empty() {
        return Ok(None);
    }
    let referenced: HashSet<DbId> = nodes.iter().filter_map(|n| n.next_id).collect();
    let mut candidates = nodes.iter().filter(|n| !referenced.contains(&n.id));

    match (candidates.next(), candidates.next()) {
        (Some(head), None) => Ok(Some(head.id)),
        (None, _) => Err(CoreError::CorruptedList(
            "every node is referenced; list has no head".to_string(),
        )),
        (Some(_), Some(_)) => Err(CoreError::CorruptedList(
            "more than one unreferenced node".to_string(),
        )),
    }
}

/// `(id, new next_id)` pairs that link `order` head-to-tail.
pub fn relink_plan(order: &[DbId]) -> Vec<(DbId, Option<DbId>)> {
    order
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, order.get(i + 1).copied()))
        .collect()
}

/// Uniform in-place permutation (Fisher–Yates).
pub fn shuffle<T>(items: &mut [T]) {
    items.shuffle(&mut rand::rng());
}

/// Map a caller-proposed code order onto node ids.
///
/// `proposed` must be a permutation of the codes in `current` (same
/// multiset). Repeated codes are matched to nodes in their current order.
pub fn assign_order(current: &[&Node], proposed: &[String]) -> Result<Vec<DbId>, CoreError> {
    if current.len() != proposed.len() {
        return Err(CoreError::Conflict(format!(
            "pile holds {} cards but {} were given",
            current.len(),
            proposed.len()
        )));
    }

    let mut pools: HashMap<&str, Vec<DbId>> = HashMap::new();
    for node in current.iter().rev() {
        pools.entry(node.code.as_str()).or_default().push(node.id);
    }

    proposed
        .iter()
        .map(|code| {
            pools
                .get_mut(code.as_str())
                .and_then(Vec::pop)
                .ok_or_else(|| {
                    CoreError::Conflict(format!(
                        "order is not a permutation of the pile: unexpected {code}"
                    ))
                })
        })
        .collect()
}
