use common::*;

use crate::raster::{Obstruction, ObstructionRaster};
use crate::AreaId;

/// Axis-aligned rectangle in raster coordinates, y grows downwards
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    pub x0: F,
    pub y0: F,
    pub x1: F,
    pub y1: F,
}

/// Retained quadtree node. Fully blocked regions, and mixed regions with no depth left, are never
/// constructed
#[derive(Clone, Debug)]
pub enum Region {
    Free { rect: Rect, area: AreaId },
    /// Only the children that kept at least one free leaf, in top-left, top-right,
    /// bottom-left, bottom-right order
    Internal { rect: Rect, children: Vec<Region> },
}

impl Rect {
    pub const fn new(x0: F, y0: F, x1: F, y1: F) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn with_dimensions([w, h]: [usize; 2]) -> Self {
        Self::new(0.0, 0.0, w as F, h as F)
    }

    pub fn width(&self) -> F {
        self.x1 - self.x0
    }

    pub fn height(&self) -> F {
        self.y1 - self.y0
    }

    pub fn center(&self) -> Point2 {
        Point2::new((self.x0 + self.x1) * 0.5, (self.y0 + self.y1) * 0.5)
    }

    /// Inclusive of edges
    pub fn contains(&self, point: Point2) -> bool {
        point.x >= self.x0 && point.x <= self.x1 && point.y >= self.y0 && point.y <= self.y1
    }

    /// Overlapping or sharing an edge or corner
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.x0 > other.x1 || other.x0 > self.x1 || self.y0 > other.y1 || other.y0 > self.y1)
    }

    /// Quadrants split at the midpoint
    pub fn quadrants(&self) -> [Rect; 4] {
        let Rect { x0, y0, x1, y1 } = *self;
        let xm = (x0 + x1) * 0.5;
        let ym = (y0 + y1) * 0.5;

        [
            Rect::new(x0, y0, xm, ym),
            Rect::new(xm, y0, x1, ym),
            Rect::new(x0, ym, xm, y1),
            Rect::new(xm, ym, x1, y1),
        ]
    }
}

impl Region {
    /// Free leaves are registered in `areas` in visit order, so a leaf's [AreaId] is its index.
    /// None if nothing under `rect` is kept
    pub fn decompose(
        raster: &ObstructionRaster,
        rect: Rect,
        depth: u8,
        areas: &mut Vec<Rect>,
    ) -> Option<Region> {
        match raster.classify(&rect) {
            Obstruction::Unobstructed => {
                let area = AreaId(areas.len() as u32);
                areas.push(rect);
                Some(Region::Free { rect, area })
            }
            Obstruction::FullyBlocked => None,
            Obstruction::Mixed if depth == 0 => None,
            Obstruction::Mixed => {
                let children = rect
                    .quadrants()
                    .iter()
                    .filter_map(|quad| Self::decompose(raster, *quad, depth - 1, areas))
                    .collect_vec();

                (!children.is_empty()).as_some(Region::Internal { rect, children })
            }
        }
    }

    pub fn rect(&self) -> &Rect {
        match self {
            Region::Free { rect, .. } | Region::Internal { rect, .. } => rect,
        }
    }

    /// First free leaf containing the point, depth first
    pub fn containing_area(&self, point: Point2) -> Option<AreaId> {
        if !self.rect().contains(point) {
            return None;
        }

        match self {
            Region::Free { area, .. } => Some(*area),
            Region::Internal { children, .. } => {
                children.iter().find_map(|c| c.containing_area(point))
            }
        }
    }

    /// Every free leaf touching `rect`, calling `found` with its id and rectangle
    pub fn touching_leaves(&self, rect: &Rect, found: &mut impl FnMut(AreaId, &Rect)) {
        if !self.rect().intersects(rect) {
            return;
        }

        match self {
            Region::Free { rect: leaf, area } => found(*area, leaf),
            Region::Internal { children, .. } => {
                for child in children {
                    child.touching_leaves(rect, found);
                }
            }
        }
    }

    /// 0 for a single leaf
    pub fn depth(&self) -> usize {
        match self {
            Region::Free { .. } => 0,
            Region::Internal { children, .. } => {
                1 + children.iter().map(Region::depth).max().unwrap_or(0)
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Region::Free { .. } => 1,
            Region::Internal { children, .. } => children.iter().map(Region::leaf_count).sum(),
        }
    }
}
