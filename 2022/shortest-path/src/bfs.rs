use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};

/// A graph with unit-weight edges, described only by the successors of each node.
///
/// Nodes are discovered lazily while traversing, so implementors never need to
/// enumerate the whole node set up front.
pub trait Graph<N> {
    fn successors(&self, node: &N) -> Vec<N>;
}

/// An explicit adjacency map. A node that is not a key has no successors.
impl<N, S> Graph<N> for HashMap<N, Vec<N>, S>
where
    N: Hash + Eq + Clone,
    S: BuildHasher,
{
    fn successors(&self, node: &N) -> Vec<N> {
        self.get(node).cloned().unwrap_or_default()
    }
}

impl<N, G> Graph<N> for &G
where
    G: Graph<N> + ?Sized,
{
    fn successors(&self, node: &N) -> Vec<N> {
        (**self).successors(node)
    }
}

/// Graph whose edges are computed on demand by a closure.
#[derive(Clone, Copy)]
pub struct FromFn<F>(F);

pub fn from_fn<N, F>(successors: F) -> FromFn<F>
where
    F: Fn(&N) -> Vec<N>,
{
    FromFn(successors)
}

impl<N, F> Graph<N> for FromFn<F>
where
    F: Fn(&N) -> Vec<N>,
{
    fn successors(&self, node: &N) -> Vec<N> {
        (self.0)(node)
    }
}

/// Minimal edge count from `source` to every node reachable from it.
///
/// Nodes that cannot be reached are absent from the result, and `source`
/// always maps to 0 even when the graph knows nothing about it. Every node is
/// enqueued exactly once: in a FIFO traversal with unit weights the first
/// distance assigned to a node is already minimal, so the traversal runs in
/// O(V + E).
#[tracing::instrument(level = "debug", skip_all)]
pub fn shortest_paths<N, G>(graph: &G, source: N) -> HashMap<N, usize>
where
    N: Hash + Eq + Clone,
    G: Graph<N> + ?Sized,
{
    let mut distances = HashMap::from([(source.clone(), 0)]);
    let mut queue = VecDeque::from([source]);

    while let Some(node) = queue.pop_front() {
        let next = distances[&node] + 1;
        for successor in graph.successors(&node) {
            if let Entry::Vacant(slot) = distances.entry(successor) {
                queue.push_back(slot.key().clone());
                slot.insert(next);
            }
        }
    }

    tracing::debug!(reached = distances.len(), "traversal finished");
    distances
}

/// Closest node satisfying `is_target`, together with its distance.
///
/// Stops as soon as the first target is popped, so it never explores past
/// the target's distance layer.
pub fn first_reached<N, G, P>(graph: &G, source: N, mut is_target: P) -> Option<(N, usize)>
where
    N: Hash + Eq + Clone,
    G: Graph<N> + ?Sized,
    P: FnMut(&N) -> bool,
{
    let mut distances = HashMap::from([(source.clone(), 0)]);
    let mut queue = VecDeque::from([source]);

    while let Some(node) = queue.pop_front() {
        let here = distances[&node];
        if is_target(&node) {
            return Some((node, here));
        }
        for successor in graph.successors(&node) {
            if let Entry::Vacant(slot) = distances.entry(successor) {
                queue.push_back(slot.key().clone());
                slot.insert(here + 1);
            }
        }
    }

    None
}

/// Edge count from `source` to `target`, or `None` when unreachable.
pub fn distance<N, G>(graph: &G, source: N, target: &N) -> Option<usize>
where
    N: Hash + Eq + Clone,
    G: Graph<N> + ?Sized,
{
    first_reached(graph, source, |node| node == target).map(|(_, steps)| steps)
}

/// The same graph with every edge pointing the other way.
///
/// Every node of the input, including ones with no incoming edges, is a key of
/// the output.
pub fn reversed<N, S>(graph: &HashMap<N, Vec<N>, S>) -> HashMap<N, Vec<N>>
where
    N: Hash + Eq + Clone,
    S: BuildHasher,
{
    let mut result: HashMap<N, Vec<N>> = graph.keys().map(|node| (node.clone(), Vec::new())).collect();
    for (node, successors) in graph {
        for successor in successors {
            result
                .entry(successor.clone())
                .or_default()
                .push(node.clone());
        }
    }
    result
}
