use petgraph::visit::EdgeRef;

use common::*;

use crate::graph::{AreaId, AreaSearchContext, NavigationGraph};
use crate::portal::Portal;
use crate::search::{astar, dijkstra};
use crate::waypoints::Waypoints;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("Source {0:?} is not on the navmesh")]
    UnresolvedSource(Point2),

    #[error("Destination {0:?} is not on the navmesh")]
    UnresolvedDestination(Point2),

    #[error("No path between source and destination areas")]
    NoPath,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RouteStep {
    pub area: AreaId,
    pub center: Point2,
    /// None for the first area only
    pub entry: Option<Portal>,
}

/// Areas from the source to the destination, never empty
#[derive(Clone, Debug, PartialEq)]
pub struct Route(Vec<RouteStep>);

impl Route {
    pub(crate) fn from_steps(steps: Vec<RouteStep>) -> Self {
        debug_assert!(!steps.is_empty());
        Self(steps)
    }

    pub fn steps(&self) -> &[RouteStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn areas(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.0.iter().map(|step| step.area)
    }

    pub fn portals(&self) -> impl Iterator<Item = &Portal> + '_ {
        self.0.iter().filter_map(|step| step.entry.as_ref())
    }
}

impl NavigationGraph {
    /// A* over area centers, with the straight line to the destination area's center as the
    /// estimate
    pub fn compute_route(&self, src: Point2, dst: Point2) -> Result<Route, RouteError> {
        self.compute_route_with(&self.search_context(), src, dst)
    }

    pub(crate) fn compute_route_with(
        &self,
        context: &AreaSearchContext,
        src: Point2,
        dst: Point2,
    ) -> Result<Route, RouteError> {
        let src_area = self
            .containing_area(src)
            .ok_or(RouteError::UnresolvedSource(src))?;
        let dst_area = self
            .containing_area(dst)
            .ok_or(RouteError::UnresolvedDestination(dst))?;

        let graph = self.inner();
        let goal_node = dst_area.node();
        let goal = self.area_unchecked(goal_node).center();

        let cost = astar(
            graph,
            src_area.node(),
            |n| n == goal_node,
            |e| graph[e.source()].distance_to(&graph[e.target()]),
            |n| graph[n].center().distance(goal),
            context,
        )
        .ok_or(RouteError::NoPath)?;

        let path = context.result();
        let mut steps = Vec::with_capacity(path.len() + 1);
        steps.push(RouteStep {
            area: src_area,
            center: self.area_unchecked(src_area.node()).center(),
            entry: None,
        });
        steps.extend(path.iter().map(|&(node, edge)| RouteStep {
            area: AreaId::from_node(node),
            center: graph[node].center(),
            entry: Some(graph[edge]),
        }));

        trace!("found route"; "from" => src_area, "to" => dst_area,
            "areas" => steps.len(), "cost" => cost);
        Ok(Route::from_steps(steps))
    }

    /// Distance from the source area to each destination's area along area centers, None for
    /// each destination that is off the navmesh or can't be reached. Destinations in the same
    /// area get the same distance
    pub fn compute_distances(&self, src: Point2, dsts: &[Point2]) -> Vec<Option<F>> {
        let unreachable = || vec![None; dsts.len()];

        let src_area = match self.containing_area(src) {
            Some(area) => area,
            None => return unreachable(),
        };

        let targets = dsts
            .iter()
            .map(|dst| self.containing_area(*dst))
            .collect_vec();

        let goals = targets.iter().flatten().map(|a| a.node()).collect_vec();
        if goals.is_empty() {
            return unreachable();
        }

        let graph = self.inner();
        let context = self.search_context();
        dijkstra(
            graph,
            src_area.node(),
            &goals,
            |e| graph[e.source()].distance_to(&graph[e.target()]),
            &context,
        );

        targets
            .into_iter()
            .map(|area| area.and_then(|a| context.settled_cost(a.node())))
            .collect()
    }

    /// Route from `src` to `dst` smoothed into waypoints
    pub fn waypoint_generator(&self, src: Point2, dst: Point2) -> Result<Waypoints, RouteError> {
        self.compute_route(src, dst)
            .map(|route| Waypoints::new(route, src, dst))
    }
}

slog_value_debug!(RouteError);
