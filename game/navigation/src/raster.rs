use common::*;
use grid::DynamicGrid;

use crate::region::Rect;
use crate::surface::HeightSurface;
use crate::GraphBuildError;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Cell {
    Free,
    Blocked,
}

/// How much of a rectangle is blocked
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Obstruction {
    Unobstructed,
    Mixed,
    FullyBlocked,
}

/// Walkability of every cell of the terrain raster. Immutable once the graph is built from it
#[derive(Clone)]
pub struct ObstructionRaster {
    grid: DynamicGrid<Cell>,
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Free
    }
}

impl ObstructionRaster {
    /// `blocked(x, y)` decides each cell
    pub fn from_fn(
        dims: [usize; 2],
        mut blocked: impl FnMut(usize, usize) -> bool,
    ) -> Result<Self, GraphBuildError> {
        check_dims(dims)?;

        let grid = DynamicGrid::from_fn(dims, |[x, y]| {
            if blocked(x, y) {
                Cell::Blocked
            } else {
                Cell::Free
            }
        });
        Ok(Self { grid })
    }

    /// A cell is steep if its normal is more than `max_slope_deg` from vertical, and blocked if at
    /// least `threshold` cells of its 3x3 neighbourhood (wrapping around the edges) are steep
    pub fn from_surface(
        surface: &impl HeightSurface,
        max_slope_deg: F,
        threshold: u8,
    ) -> Result<Self, GraphBuildError> {
        let dims = surface.dimensions();
        check_dims(dims)?;

        let min_z = Deg(max_slope_deg).cos();
        let steep = DynamicGrid::from_fn(dims, |[x, y]| {
            let (_, normal) = surface.elevation_and_normal(x as F, y as F);
            normal.z < min_z
        });

        let grid = dilate(&steep, threshold);
        let raster = Self { grid };

        debug!("built obstruction raster";
            "width" => dims[0], "height" => dims[1],
            "steep" => steep.iter().filter(|s| **s).count(),
            "blocked" => raster.blocked_count(),
            "max_slope" => max_slope_deg, "threshold" => threshold,
        );

        Ok(raster)
    }

    pub fn dimensions(&self) -> [usize; 2] {
        self.grid.dimensions()
    }

    /// Out of range is blocked
    pub fn is_blocked(&self, x: usize, y: usize) -> bool {
        !matches!(self.grid.get([x, y]), Some(Cell::Free))
    }

    pub fn blocked_count(&self) -> usize {
        self.grid.iter().filter(|c| **c == Cell::Blocked).count()
    }

    pub fn free_count(&self) -> usize {
        self.grid.len() - self.blocked_count()
    }

    /// Flood fills orthogonally from the cell under `seed`, and blocks every free cell that isn't
    /// reached. A seed outside the raster or on a blocked cell leaves nothing reachable
    pub fn filter_unreachable(&mut self, seed: Point2) {
        let [w, h] = self.dimensions();
        let (sx, sy) = (seed.x.floor(), seed.y.floor());

        let seed_cell = (sx >= 0.0 && sy >= 0.0 && sx < w as F && sy < h as F)
            .as_some_from(|| [sx as usize, sy as usize])
            .filter(|&[x, y]| !self.is_blocked(x, y));

        let before = self.free_count();
        let seed_cell = match seed_cell {
            Some(cell) => cell,
            None => {
                warn!("reachability seed is not on a walkable cell, nothing is reachable";
                    "seed" => ?seed);
                self.grid.iter_mut().for_each(|c| *c = Cell::Blocked);
                return;
            }
        };

        let mut reached = DynamicGrid::<bool>::new([w, h]);
        let mut frontier = vec![self.grid.flatten_coords(seed_cell)];
        reached[frontier[0]] = true;

        while let Some(idx) = frontier.pop() {
            for n in self.grid.neighbours(idx) {
                if !reached[n] && self.grid[n] == Cell::Free {
                    reached[n] = true;
                    frontier.push(n);
                }
            }
        }

        for (cell, reached) in self.grid.iter_mut().zip(reached.iter()) {
            if !*reached {
                *cell = Cell::Blocked;
            }
        }

        debug!("filtered unreachable cells";
            "seed" => ?seed, "reachable" => self.free_count(),
            "removed" => before - self.free_count());
    }

    /// Covers every cell the rectangle touches, so partially covered cells count too
    pub(crate) fn classify(&self, rect: &Rect) -> Obstruction {
        let [w, h] = self.dimensions();
        let clamp_x = |f: F| (f.max(0.0) as usize).min(w);
        let clamp_y = |f: F| (f.max(0.0) as usize).min(h);

        let xs = clamp_x(rect.x0.floor())..clamp_x(rect.x1.ceil());
        let ys = clamp_y(rect.y0.floor())..clamp_y(rect.y1.ceil());
        if xs.is_empty() || ys.is_empty() {
            return Obstruction::FullyBlocked;
        }

        let (mut free, mut blocked) = (false, false);
        for (y, x) in ys.cartesian_product(xs) {
            match self.grid[[x, y]] {
                Cell::Free => free = true,
                Cell::Blocked => blocked = true,
            }

            if free && blocked {
                return Obstruction::Mixed;
            }
        }

        if blocked {
            Obstruction::FullyBlocked
        } else {
            Obstruction::Unobstructed
        }
    }
}

fn check_dims([width, height]: [usize; 2]) -> Result<(), GraphBuildError> {
    if width == 0 || height == 0 {
        Err(GraphBuildError::EmptyRaster { width, height })
    } else {
        Ok(())
    }
}

fn dilate(steep: &DynamicGrid<bool>, threshold: u8) -> DynamicGrid<Cell> {
    DynamicGrid::from_fn(steep.dimensions(), |coord| {
        let idx = steep.flatten_coords(coord);
        let count = usize::from(steep[idx])
            + steep
                .wrapping_neighbours(idx)
                .filter(|n| steep[*n])
                .count();

        if count >= usize::from(threshold) {
            Cell::Blocked
        } else {
            Cell::Free
        }
    })
}

impl Debug for ObstructionRaster {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let [w, h] = self.dimensions();
        writeln!(f, "ObstructionRaster({}x{})", w, h)?;
        for y in 0..h {
            for x in 0..w {
                let c = if self.is_blocked(x, y) { '#' } else { '.' };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use matches::assert_matches;

    use super::*;
    use crate::surface::HeightMap;

    fn steep_cells(dims: [usize; 2], cells: &[[usize; 2]]) -> DynamicGrid<bool> {
        DynamicGrid::from_fn(dims, |c| cells.contains(&c))
    }

    fn blocked_cells(grid: &DynamicGrid<Cell>) -> Vec<[usize; 2]> {
        grid.iter_coords()
            .filter(|(_, c)| **c == Cell::Blocked)
            .map(|(coord, _)| coord)
            .collect()
    }

    #[test]
    fn empty_raster() {
        assert_matches!(
            ObstructionRaster::from_fn([0, 5], |_, _| false),
            Err(GraphBuildError::EmptyRaster {
                width: 0,
                height: 5
            })
        );
    }

    #[test]
    fn single_steep_cell_dilation() {
        let steep = steep_cells([8, 8], &[[4, 4]]);

        // whole ring is blocked when 1 is enough
        let blocked = blocked_cells(&dilate(&steep, 1));
        assert_eq!(blocked.len(), 9);
        assert!(blocked.contains(&[3, 3]));
        assert!(blocked.contains(&[5, 5]));

        // lone steep cell isn't enough
        assert!(blocked_cells(&dilate(&steep, 2)).is_empty());
    }

    #[test]
    fn dilation_wraps_around_edges() {
        let steep = steep_cells([8, 8], &[[0, 0]]);
        let blocked = blocked_cells(&dilate(&steep, 1));

        assert_eq!(blocked.len(), 9);
        assert!(blocked.contains(&[7, 7]));
        assert!(blocked.contains(&[7, 0]));
        assert!(blocked.contains(&[0, 7]));
    }

    #[test]
    fn threshold_counts_self_and_neighbours() {
        let steep = steep_cells([8, 8], &[[2, 2], [3, 2], [4, 2]]);
        let blocked = blocked_cells(&dilate(&steep, 3));

        // only the centre of the line and the cells directly above and below it see all 3
        assert_eq!(blocked, vec![[3, 1], [3, 2], [3, 3]]);
    }

    #[test]
    fn cliff_from_surface() {
        let map = HeightMap::from_fn([8, 8], |x, _| if x >= 4 { 10.0 } else { 0.0 })
            .expect("valid");
        let raster = ObstructionRaster::from_surface(&map, 30.0, 3).expect("valid");

        // columns 3 and 4 are steep, dilated by one either side
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(raster.is_blocked(x, y), (2..=5).contains(&x), "{},{}", x, y);
            }
        }
        assert_eq!(raster.free_count(), 32);
    }

    #[test]
    fn flat_surface_is_free() {
        let map = HeightMap::flat([16, 16], 3.0).expect("valid");
        let raster = ObstructionRaster::from_surface(&map, 30.0, 3).expect("valid");
        assert_eq!(raster.blocked_count(), 0);
    }

    #[test]
    fn unreachable_island_removed() {
        // wall down x=3
        let mut raster = ObstructionRaster::from_fn([8, 4], |x, _| x == 3).expect("valid");
        raster.filter_unreachable(Point2::new(1.5, 1.5));

        assert_eq!(raster.free_count(), 3 * 4);
        assert!(!raster.is_blocked(0, 3));
        assert!(raster.is_blocked(5, 1));
    }

    #[test]
    fn diagonal_gap_is_not_a_connection() {
        // free cells only touch at a corner
        let mut raster =
            ObstructionRaster::from_fn([2, 2], |x, y| x != y).expect("valid");
        raster.filter_unreachable(Point2::new(0.5, 0.5));

        assert_eq!(raster.free_count(), 1);
        assert!(raster.is_blocked(1, 1));
    }

    #[test]
    fn bad_seed_blocks_everything() {
        let mut raster = ObstructionRaster::from_fn([4, 4], |x, y| x == 0 && y == 0).expect("valid");
        raster.filter_unreachable(Point2::new(0.5, 0.5));
        assert_eq!(raster.free_count(), 0);

        let mut raster = ObstructionRaster::from_fn([4, 4], |_, _| false).expect("valid");
        raster.filter_unreachable(Point2::new(-1.0, 2.0));
        assert_eq!(raster.free_count(), 0);
    }

    #[test]
    fn classify_rects() {
        // bottom right quadrant blocked
        let raster = ObstructionRaster::from_fn([4, 4], |x, y| x >= 2 && y >= 2).expect("valid");

        assert_eq!(
            raster.classify(&Rect::new(0.0, 0.0, 4.0, 4.0)),
            Obstruction::Mixed
        );
        assert_eq!(
            raster.classify(&Rect::new(0.0, 0.0, 2.0, 2.0)),
            Obstruction::Unobstructed
        );
        assert_eq!(
            raster.classify(&Rect::new(2.0, 2.0, 4.0, 4.0)),
            Obstruction::FullyBlocked
        );

        // touches a blocked cell partially
        assert_eq!(
            raster.classify(&Rect::new(0.0, 0.0, 2.5, 2.0)),
            Obstruction::Unobstructed
        );
        assert_eq!(
            raster.classify(&Rect::new(0.0, 0.0, 2.5, 2.5)),
            Obstruction::Mixed
        );

        // nothing covered
        assert_eq!(
            raster.classify(&Rect::new(5.0, 5.0, 6.0, 6.0)),
            Obstruction::FullyBlocked
        );
    }
}
