use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::{EdgeRef, Visitable};

use common::*;

use crate::params::GraphParams;
use crate::portal::Portal;
use crate::raster::ObstructionRaster;
use crate::region::{Rect, Region};
use crate::search::SearchContext;
use crate::surface::HeightSurface;

/// Index of a free area, equal to its node index in the graph
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct AreaId(pub u32);

/// A free leaf of the region tree
#[derive(Clone, Debug)]
pub struct Area {
    id: AreaId,
    rect: Rect,
}

#[derive(Debug, Error)]
pub enum GraphBuildError {
    #[error("Raster has no area ({width}x{height})")]
    EmptyRaster { width: usize, height: usize },

    #[error("Decomposition depth {0} is above the max of {}", MAX_DEPTH)]
    DepthTooLarge(u8),

    #[error("Expected {expected} heights but got {actual}")]
    BadHeights { expected: usize, actual: usize },
}

pub const MAX_DEPTH: u8 = 12;

/// Both directions of an adjacency are stored as separate edges, each derived independently
pub(crate) type AreaGraph = DiGraph<Area, Portal, u32>;

pub(crate) type AreaSearchContext =
    SearchContext<NodeIndex, EdgeIndex, F, <AreaGraph as Visitable>::Map>;

/// Free areas of the terrain and the portals between them. Immutable once built
#[derive(Clone)]
pub struct NavigationGraph {
    root: Option<Region>,
    graph: AreaGraph,
    dims: [usize; 2],
}

slog_value_debug!(AreaId);

impl Area {
    pub fn id(&self) -> AreaId {
        self.id
    }

    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    pub fn center(&self) -> Point2 {
        self.rect.center()
    }

    /// Between centers
    pub fn distance_to(&self, other: &Area) -> F {
        self.center().distance(other.center())
    }

    pub fn contains(&self, point: Point2) -> bool {
        self.rect.contains(point)
    }
}

impl AreaId {
    pub(crate) fn node(self) -> NodeIndex {
        NodeIndex::new(self.0 as usize)
    }

    pub(crate) fn from_node(node: NodeIndex) -> Self {
        Self(node.index() as u32)
    }
}

impl NavigationGraph {
    /// Slope raster from the surface, then [Self::from_raster]
    pub fn build(
        surface: &impl HeightSurface,
        params: &GraphParams,
        seed: Option<Point2>,
    ) -> Result<Self, GraphBuildError> {
        check_depth(params.depth)?;

        let raster = ObstructionRaster::from_surface(
            surface,
            params.max_slope_deg,
            params.smoothing_threshold,
        )?;
        Self::from_raster(raster, params.depth, seed)
    }

    /// Unreachable cells are filtered out first if a seed is given
    pub fn from_raster(
        mut raster: ObstructionRaster,
        depth: u8,
        seed: Option<Point2>,
    ) -> Result<Self, GraphBuildError> {
        check_depth(depth)?;

        if let Some(seed) = seed {
            raster.filter_unreachable(seed);
        }

        let dims = raster.dimensions();
        let mut rects = Vec::new();
        let root = Region::decompose(&raster, Rect::with_dimensions(dims), depth, &mut rects);

        let mut graph = AreaGraph::with_capacity(rects.len(), rects.len() * 4);
        for (i, rect) in rects.iter().enumerate() {
            let id = AreaId(i as u32);
            let node = graph.add_node(Area { id, rect: *rect });
            debug_assert_eq!(node, id.node());
        }

        if let Some(root) = root.as_ref() {
            for (i, rect) in rects.iter().enumerate() {
                let this = AreaId(i as u32);
                root.touching_leaves(rect, &mut |other, other_rect| {
                    if other == this {
                        return;
                    }

                    if let Some(portal) = Portal::between(rect, other_rect) {
                        graph.add_edge(this.node(), other.node(), portal);
                    }
                });
            }
        }

        let nav = Self { root, graph, dims };
        if nav.area_count() == 0 {
            warn!("navigation graph has no free areas"; "width" => dims[0], "height" => dims[1]);
        } else {
            info!("built navigation graph";
                "areas" => nav.area_count(),
                "portals" => nav.portal_count(),
                "tree_depth" => nav.root.as_ref().map(Region::depth).unwrap_or_default(),
                "max_depth" => depth,
            );
        }

        Ok(nav)
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.graph.node_weight(id.node())
    }

    /// Ordered by id
    pub fn areas(&self) -> impl Iterator<Item = &Area> + '_ {
        self.graph.raw_nodes().iter().map(|n| &n.weight)
    }

    /// Neighbouring areas with the portal into each
    pub fn adjacencies(&self, id: AreaId) -> impl Iterator<Item = (AreaId, &Portal)> + '_ {
        self.graph
            .edges(id.node())
            .map(|e| (AreaId::from_node(e.target()), e.weight()))
    }

    /// None if off the navmesh
    pub fn containing_area(&self, point: Point2) -> Option<AreaId> {
        self.root.as_ref().and_then(|root| root.containing_area(point))
    }

    pub fn area_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Each shared boundary once
    pub fn portal_count(&self) -> usize {
        self.graph.edge_count() / 2
    }

    pub fn dimensions(&self) -> [usize; 2] {
        self.dims
    }

    /// None if nothing is walkable
    pub fn root(&self) -> Option<&Region> {
        self.root.as_ref()
    }

    pub(crate) fn inner(&self) -> &AreaGraph {
        &self.graph
    }

    pub(crate) fn search_context(&self) -> AreaSearchContext {
        SearchContext::new_with(&self.graph)
    }

    pub(crate) fn area_unchecked(&self, node: NodeIndex) -> &Area {
        &self.graph[node]
    }
}

fn check_depth(depth: u8) -> Result<(), GraphBuildError> {
    if depth > MAX_DEPTH {
        Err(GraphBuildError::DepthTooLarge(depth))
    } else {
        Ok(())
    }
}

impl Debug for NavigationGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("NavigationGraph")
            .field("dimensions", &self.dims)
            .field("areas", &self.area_count())
            .field("portals", &self.portal_count())
            .finish()
    }
}
