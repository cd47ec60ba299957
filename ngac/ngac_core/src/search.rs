//! Graph traversal.
//!
//! Traversals walk assignment edges in one [`Direction`] starting at a node,
//! calling a visitor once per reachable node and a propagator on each edge.
//! Every walk keeps an explicit work list, so traversal depth is not bounded
//! by the call stack.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::Result;
use crate::traits::Graph;

/// Which assignment edges a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From a node towards the nodes it is assigned to.
    Parents,
    /// From a node towards the nodes assigned to it.
    Children,
}

impl Direction {
    /// Names of the nodes adjacent to `name` in this direction.
    pub fn adjacent(&self, graph: &dyn Graph, name: &str) -> Result<Vec<String>> {
        let mut next: Vec<String> = match self {
            Self::Parents => graph.parents(name)?,
            Self::Children => graph.children(name)?,
        }
        .into_iter()
        .collect();
        // Deterministic order for callers that record visit order.
        next.sort();
        Ok(next)
    }
}

/// Post-order depth-first traversal.
///
/// `visitor` runs on each reachable node (including `start`) after every
/// node adjacent to it has been visited. `propagator(adjacent, node)` runs
/// once per traversed edge, after `adjacent` has been visited, so values can
/// flow from the far end of the walk back towards `start`. No node is
/// visited twice.
pub fn dfs<V, P>(
    graph: &dyn Graph,
    start: &str,
    direction: Direction,
    mut visitor: V,
    mut propagator: P,
) -> Result<()>
where
    V: FnMut(&str) -> Result<()>,
    P: FnMut(&str, &str) -> Result<()>,
{
    struct Frame {
        node: String,
        adjacent: Vec<String>,
        next: usize,
    }

    let mut visited = HashSet::new();
    visited.insert(start.to_string());
    let mut stack = vec![Frame {
        node: start.to_string(),
        adjacent: direction.adjacent(graph, start)?,
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        if frame.next < frame.adjacent.len() {
            let adjacent = frame.adjacent[frame.next].clone();
            frame.next += 1;

            if visited.contains(&adjacent) {
                propagator(&adjacent, &frame.node)?;
                continue;
            }

            visited.insert(adjacent.clone());
            let next_adjacent = direction.adjacent(graph, &adjacent)?;
            stack.push(Frame {
                node: adjacent,
                adjacent: next_adjacent,
                next: 0,
            });
        } else {
            let done = match stack.pop() {
                Some(frame) => frame.node,
                None => break,
            };
            visitor(&done)?;
            if let Some(below) = stack.last() {
                propagator(&done, &below.node)?;
            }
        }
    }

    Ok(())
}

/// Breadth-first traversal.
///
/// `visitor` runs on each reachable node in order of distance from `start`.
/// `propagator(adjacent, node)` runs on each edge as it is examined.
pub fn bfs<V, P>(
    graph: &dyn Graph,
    start: &str,
    direction: Direction,
    mut visitor: V,
    mut propagator: P,
) -> Result<()>
where
    V: FnMut(&str) -> Result<()>,
    P: FnMut(&str, &str) -> Result<()>,
{
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start.to_string());
    queue.push_back(start.to_string());

    while let Some(node) = queue.pop_front() {
        visitor(&node)?;
        for adjacent in direction.adjacent(graph, &node)? {
            propagator(&adjacent, &node)?;
            if visited.insert(adjacent.clone()) {
                queue.push_back(adjacent);
            }
        }
    }

    Ok(())
}

/// Iterative-deepening depth-first traversal.
///
/// Runs depth-limited walks from `start` with a bound that grows by one
/// per round, stopping after a round that reaches no new node. `visitor`
/// runs once per reachable node, in order of distance from `start` and in
/// depth-first order within one distance. `propagator(adjacent, node)` runs
/// on the edge that first reached `adjacent`, right after it is visited.
///
/// A round only descends through nodes found in earlier rounds at exactly
/// one less than their depth, so each round walks the shortest-path tree
/// and expands each node at most once.
pub fn iddfs<V, P>(
    graph: &dyn Graph,
    start: &str,
    direction: Direction,
    mut visitor: V,
    mut propagator: P,
) -> Result<()>
where
    V: FnMut(&str) -> Result<()>,
    P: FnMut(&str, &str) -> Result<()>,
{
    // Distance from `start` of every node visited so far.
    let mut depth_of: HashMap<String, usize> = HashMap::new();
    // Fails on a missing start node before anything is visited.
    direction.adjacent(graph, start)?;
    depth_of.insert(start.to_string(), 0);
    visitor(start)?;

    let mut limit = 1;
    loop {
        let mut found = false;
        let mut expanded = HashSet::new();
        let mut stack = vec![(start.to_string(), 0usize)];

        while let Some((node, depth)) = stack.pop() {
            if !expanded.insert(node.clone()) {
                continue;
            }
            let mut deeper = Vec::new();
            for adjacent in direction.adjacent(graph, &node)? {
                match depth_of.get(&adjacent) {
                    None if depth + 1 == limit => {
                        depth_of.insert(adjacent.clone(), limit);
                        visitor(&adjacent)?;
                        propagator(&adjacent, &node)?;
                        found = true;
                    }
                    Some(&d) if d == depth + 1 && d < limit => deeper.push(adjacent),
                    _ => {}
                }
            }
            // Reversed so the smallest name is expanded first.
            for adjacent in deeper.into_iter().rev() {
                stack.push((adjacent, depth + 1));
            }
        }

        if !found {
            return Ok(());
        }
        limit += 1;
    }
}

/// Every node `name` is transitively assigned to, excluding itself.
pub fn ancestors(graph: &dyn Graph, name: &str) -> Result<HashSet<String>> {
    reachable(graph, name, Direction::Parents)
}

/// Every node transitively assigned to `name`, excluding itself.
pub fn descendants(graph: &dyn Graph, name: &str) -> Result<HashSet<String>> {
    reachable(graph, name, Direction::Children)
}

fn reachable(graph: &dyn Graph, name: &str, direction: Direction) -> Result<HashSet<String>> {
    let mut found = HashSet::new();
    bfs(
        graph,
        name,
        direction,
        |node| {
            if node != name {
                found.insert(node.to_string());
            }
            Ok(())
        },
        |_, _| Ok(()),
    )?;
    Ok(found)
}

/// Whether `name` is `container` or is transitively assigned to it.
pub fn is_contained_in(graph: &dyn Graph, name: &str, container: &str) -> Result<bool> {
    if name == container {
        return Ok(true);
    }

    let mut visited = HashSet::new();
    let mut stack = vec![name.to_string()];
    while let Some(node) = stack.pop() {
        for parent in graph.parents(&node)? {
            if parent == container {
                return Ok(true);
            }
            if visited.insert(parent.clone()) {
                stack.push(parent);
            }
        }
    }

    Ok(false)
}

/// Names of the policy classes `name` is contained in.
pub fn policy_classes_of(graph: &dyn Graph, name: &str) -> Result<HashSet<String>> {
    let pcs = graph.policy_classes()?;
    if pcs.contains(name) {
        return Ok(HashSet::from([name.to_string()]));
    }
    Ok(ancestors(graph, name)?
        .into_iter()
        .filter(|node| pcs.contains(node))
        .collect())
}
