//! Based on petgraph

use std::cell::{Ref, RefCell};
use std::cmp::Ordering;
use std::collections::hash_map::Entry::{Occupied, Vacant};
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;
use std::ops::Deref;

use petgraph::algo::Measure;
use petgraph::visit::{EdgeRef, IntoEdges, VisitMap, Visitable};

/// Contains allocations to reuse
pub struct SearchContext<N, E, K, V>(RefCell<SearchContextInner<N, E, K, V>>)
where
    N: Eq + Hash + Copy,
    E: Copy,
    K: Measure + Copy,
    V: VisitMap<N>;

struct SearchContextInner<N, E, K, V>
where
    N: Eq + Hash + Copy,
    E: Copy,
    K: Measure + Copy,
    V: VisitMap<N>,
{
    visited: V,
    visit_next: BinaryHeap<MinScored<K, N>>,
    scores: HashMap<N, K>,
    path_tracker: PathTracker<N, E>,
    result: Vec<(N, E)>,
}

/// Returns the cost to the goal on success, with the path in the context. The path doesn't include
/// the start node, so is empty if the start is the goal.
///
/// Stale frontier entries are skipped rather than updated in place, and a relaxation with equal
/// cost replaces the predecessor
pub fn astar<G, F, H, K, IsGoal>(
    graph: G,
    start: G::NodeId,
    mut is_goal: IsGoal,
    mut edge_cost: F,
    mut estimate_cost: H,
    context: &SearchContext<G::NodeId, G::EdgeId, K, G::Map>,
) -> Option<K>
where
    G: IntoEdges + Visitable,
    IsGoal: FnMut(G::NodeId) -> bool,
    G::NodeId: Eq + Hash + Copy + Ord,
    F: FnMut(G::EdgeRef) -> K,
    H: FnMut(G::NodeId) -> K,
    K: Measure + Copy,
{
    let mut ctx = context.0.borrow_mut();
    let ctx = &mut *ctx;
    ctx.reset_for(graph);

    let zero_score = K::default();
    ctx.scores.insert(start, zero_score);
    ctx.visit_next.push(MinScored(estimate_cost(start), start));

    while let Some(MinScored(_, node)) = ctx.visit_next.pop() {
        if is_goal(node) {
            ctx.path_tracker.reconstruct_path_to(node, &mut ctx.result);
            return ctx.scores.get(&node).copied();
        }

        // Don't visit the same node several times, as the first time it was visited it was using
        // the shortest available path.
        if !ctx.visited.visit(node) {
            continue;
        }

        // This lookup can be unwrapped without fear of panic since the node was necessarily scored
        // before adding him to `visit_next`.
        let node_score = ctx.scores[&node];

        for edge in graph.edges(node) {
            let next = edge.target();
            if ctx.visited.is_visited(&next) {
                continue;
            }

            let next_score = node_score + edge_cost(edge);

            match ctx.scores.entry(next) {
                Occupied(ent) => {
                    if next_score > *ent.get() {
                        continue;
                    }
                    *ent.into_mut() = next_score;
                }
                Vacant(ent) => {
                    ent.insert(next_score);
                }
            }

            ctx.path_tracker.set_predecessor(next, node, edge.id());
            let next_estimate_score = next_score + estimate_cost(next);
            ctx.visit_next.push(MinScored(next_estimate_score, next));
        }
    }

    // leave result empty
    debug_assert!(ctx.result.is_empty());
    None
}

/// Settles nodes outwards from `start` until every goal is settled or the graph is exhausted.
/// Settled costs are read with [SearchContext::settled_cost]
pub fn dijkstra<G, F, K>(
    graph: G,
    start: G::NodeId,
    goals: &[G::NodeId],
    mut edge_cost: F,
    context: &SearchContext<G::NodeId, G::EdgeId, K, G::Map>,
) where
    G: IntoEdges + Visitable,
    G::NodeId: Eq + Hash + Copy + Ord,
    F: FnMut(G::EdgeRef) -> K,
    K: Measure + Copy,
{
    let mut ctx = context.0.borrow_mut();
    let ctx = &mut *ctx;
    ctx.reset_for(graph);

    let mut remaining = goals.to_vec();
    remaining.sort_unstable();
    remaining.dedup();

    ctx.scores.insert(start, K::default());
    ctx.visit_next.push(MinScored(K::default(), start));

    while let Some(MinScored(node_score, node)) = ctx.visit_next.pop() {
        if !ctx.visited.visit(node) {
            // stale duplicate
            continue;
        }

        if let Ok(idx) = remaining.binary_search(&node) {
            remaining.remove(idx);
            if remaining.is_empty() {
                break;
            }
        }

        for edge in graph.edges(node) {
            let next = edge.target();
            if ctx.visited.is_visited(&next) {
                continue;
            }

            let next_score = node_score + edge_cost(edge);
            match ctx.scores.entry(next) {
                Occupied(ent) => {
                    if next_score > *ent.get() {
                        continue;
                    }
                    *ent.into_mut() = next_score;
                }
                Vacant(ent) => {
                    ent.insert(next_score);
                }
            }

            ctx.visit_next.push(MinScored(next_score, next));
        }
    }
}

struct PathTracker<N, E>
where
    N: Eq + Hash,
    E: Copy,
{
    came_from: HashMap<N, (N, E)>,
}

impl<N, E> PathTracker<N, E>
where
    N: Eq + Hash + Copy,
    E: Copy,
{
    fn new() -> Self {
        PathTracker {
            came_from: HashMap::new(),
        }
    }

    fn set_predecessor(&mut self, node: N, previous: N, edge: E) {
        self.came_from.insert(node, (previous, edge));
    }

    /// Returns (node, edge entering it), missing the start node
    fn reconstruct_path_to(&self, last: N, path_out: &mut Vec<(N, E)>) {
        path_out.clear();

        let mut current = last;
        while let Some(&(previous, edge)) = self.came_from.get(&current) {
            path_out.push((current, edge));
            current = previous;
        }

        path_out.reverse();
    }
}

/// `MinScored<K, T>` holds a score `K` and a scored object `T` in
/// a pair for use with a `BinaryHeap`.
///
/// `MinScored` compares in reverse order by the score, so that we can
/// use `BinaryHeap` as a min-heap to extract the score-value pair with the
/// least score. Equal scores pop the lowest `T` first.
///
/// **Note:** `MinScored` implements a total order (`Ord`), so that it is
/// possible to use float types as scores.
#[derive(Copy, Clone, Debug)]
struct MinScored<K, T>(pub K, pub T);

impl<K: PartialOrd, T: Ord> PartialEq for MinScored<K, T> {
    #[inline]
    fn eq(&self, other: &MinScored<K, T>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: PartialOrd, T: Ord> Eq for MinScored<K, T> {}

impl<K: PartialOrd, T: Ord> PartialOrd for MinScored<K, T> {
    #[inline]
    fn partial_cmp(&self, other: &MinScored<K, T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[allow(clippy::eq_op)]
impl<K: PartialOrd, T: Ord> Ord for MinScored<K, T> {
    #[inline]
    fn cmp(&self, other: &MinScored<K, T>) -> Ordering {
        let a = &self.0;
        let b = &other.0;
        let by_score = if a == b {
            Ordering::Equal
        } else if a < b {
            Ordering::Greater
        } else if a > b {
            Ordering::Less
        } else if a != a && b != b {
            // these are the NaN cases
            Ordering::Equal
        } else if a != a {
            // Order NaN less, so that it is last in the MinScore order
            Ordering::Less
        } else {
            Ordering::Greater
        };

        by_score.then_with(|| other.1.cmp(&self.1))
    }
}

impl<N, E, K, V> SearchContext<N, E, K, V>
where
    N: Eq + Hash + Copy + Ord,
    E: Copy,
    K: Measure + Copy,
    V: VisitMap<N>,
{
    pub fn new_with(graph: impl Visitable<Map = V>) -> Self {
        Self(RefCell::new(SearchContextInner {
            visited: graph.visit_map(),
            visit_next: BinaryHeap::new(),
            scores: HashMap::new(),
            path_tracker: PathTracker::new(),
            result: Vec::new(),
        }))
    }

    pub fn result(&self) -> impl Deref<Target = [(N, E)]> + '_ {
        Ref::map(self.0.borrow(), |inner| &inner.result[..])
    }

    /// Final cost of a node settled by the last [dijkstra], None if it was never reached
    pub fn settled_cost(&self, node: N) -> Option<K> {
        let inner = self.0.borrow();
        if inner.visited.is_visited(&node) {
            inner.scores.get(&node).copied()
        } else {
            None
        }
    }
}

impl<N, E, K, V> SearchContextInner<N, E, K, V>
where
    N: Eq + Hash + Copy + Ord,
    E: Copy,
    K: Measure + Copy,
    V: VisitMap<N>,
{
    fn reset_for(&mut self, graph: impl Visitable<Map = V>) {
        graph.reset_map(&mut self.visited);
        self.visit_next.clear();
        self.scores.clear();
        self.path_tracker.came_from.clear();
        self.result.clear();
    }
}

#[cfg(test)]
mod tests {
    use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

    use super::*;

    /// Bidirectional edges
    fn graph(edges: &[(u32, u32, f32)]) -> DiGraph<(), f32> {
        let mut graph = DiGraph::new();
        for &(a, b, w) in edges {
            graph.extend_with_edges(&[(a, b, w), (b, a, w)]);
        }
        graph
    }

    type Ctx = SearchContext<NodeIndex, EdgeIndex, f32, <DiGraph<(), f32> as Visitable>::Map>;

    fn nodes(ctx: &Ctx) -> Vec<u32> {
        ctx.result().iter().map(|(n, _)| n.index() as u32).collect()
    }

    #[test]
    fn min_scored_tie_break() {
        let mut heap = BinaryHeap::new();
        heap.push(MinScored(2.0, 1));
        heap.push(MinScored(1.0, 5));
        heap.push(MinScored(1.0, 3));
        heap.push(MinScored(1.0, 4));

        let order = std::iter::from_fn(|| heap.pop().map(|MinScored(_, n)| n)).collect::<Vec<_>>();
        assert_eq!(order, vec![3, 4, 5, 1]);
    }

    #[test]
    fn astar_shortest() {
        //  0 - 1 - 3
        //   \     /
        //    - 2 -
        let g = graph(&[(0, 1, 1.0), (1, 3, 1.0), (0, 2, 0.5), (2, 3, 2.0)]);
        let ctx = Ctx::new_with(&g);

        let cost = astar(
            &g,
            NodeIndex::new(0),
            |n| n == NodeIndex::new(3),
            |e| *e.weight(),
            |_| 0.0,
            &ctx,
        );

        assert_eq!(cost, Some(2.0));
        assert_eq!(nodes(&ctx), vec![1, 3]);
    }

    #[test]
    fn astar_equal_cost_takes_latest() {
        // both ways are equal, the relaxation through the higher node comes second
        let g = graph(&[(0, 1, 1.0), (1, 3, 1.0), (0, 2, 1.0), (2, 3, 1.0)]);
        let ctx = Ctx::new_with(&g);

        let cost = astar(
            &g,
            NodeIndex::new(0),
            |n| n == NodeIndex::new(3),
            |e| *e.weight(),
            |_| 0.0,
            &ctx,
        );

        assert_eq!(cost, Some(2.0));
        assert_eq!(nodes(&ctx), vec![2, 3]);
    }

    #[test]
    fn astar_unreachable() {
        let mut g = graph(&[(0, 1, 1.0)]);
        g.add_node(());
        let ctx = Ctx::new_with(&g);

        let cost = astar(
            &g,
            NodeIndex::new(0),
            |n| n == NodeIndex::new(2),
            |e| *e.weight(),
            |_| 0.0,
            &ctx,
        );

        assert_eq!(cost, None);
        assert!(ctx.result().is_empty());
    }

    #[test]
    fn astar_start_is_goal() {
        let g = graph(&[(0, 1, 1.0)]);
        let ctx = Ctx::new_with(&g);

        let cost = astar(&g, NodeIndex::new(1), |n| n.index() == 1, |_| 1.0, |_| 0.0, &ctx);
        assert_eq!(cost, Some(0.0));
        assert!(ctx.result().is_empty());
    }

    #[test]
    fn dijkstra_multiple_goals() {
        // 0 - 1 - 2 - 3    4
        let mut g = graph(&[(0, 1, 1.0), (1, 2, 2.0), (2, 3, 4.0)]);
        g.add_node(());
        let ctx = Ctx::new_with(&g);

        let goals = [NodeIndex::new(2), NodeIndex::new(0), NodeIndex::new(2)];
        dijkstra(&g, NodeIndex::new(0), &goals, |e| *e.weight(), &ctx);

        assert_eq!(ctx.settled_cost(NodeIndex::new(0)), Some(0.0));
        assert_eq!(ctx.settled_cost(NodeIndex::new(2)), Some(3.0));

        // stopped before settling the far end
        assert_eq!(ctx.settled_cost(NodeIndex::new(3)), None);

        dijkstra(&g, NodeIndex::new(0), &[NodeIndex::new(4)], |e| *e.weight(), &ctx);
        assert_eq!(ctx.settled_cost(NodeIndex::new(4)), None);
        assert_eq!(ctx.settled_cost(NodeIndex::new(3)), Some(7.0));
    }

    #[test]
    fn context_is_reusable() {
        let g = graph(&[(0, 1, 1.0), (1, 2, 1.0)]);
        let ctx = Ctx::new_with(&g);

        for _ in 0..3 {
            let cost = astar(&g, NodeIndex::new(0), |n| n.index() == 2, |_| 1.0, |_| 0.0, &ctx);
            assert_eq!(cost, Some(2.0));
            assert_eq!(nodes(&ctx), vec![1, 2]);
        }
    }
}
