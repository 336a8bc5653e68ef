use std::ops::{Add, Mul};
use std::sync::Arc;

use common::*;
use grid::DynamicGrid;

use crate::GraphBuildError;

/// Terrain that can be sampled anywhere over its raster, read-only
pub trait HeightSurface {
    /// Width and height of the underlying raster in cells
    fn dimensions(&self) -> [usize; 2];

    /// 0 outside of the raster
    fn elevation(&self, x: F, y: F) -> F;

    /// (0, +Z) outside of the raster
    fn elevation_and_normal(&self, x: F, y: F) -> (F, Vector3);
}

/// Heights on a regular grid with precomputed per-cell normals, interpolated bilinearly
#[derive(Clone)]
pub struct HeightMap {
    heights: DynamicGrid<F>,
    normals: DynamicGrid<Vector3>,
}

/// Cell corners and fractional offsets for a sample point
struct Bilinear {
    lo: [usize; 2],
    hi: [usize; 2],
    frac: (F, F),
}

impl HeightMap {
    pub fn from_heights(dims: [usize; 2], heights: Vec<F>) -> Result<Self, GraphBuildError> {
        let [width, height] = dims;
        if width == 0 || height == 0 {
            return Err(GraphBuildError::EmptyRaster { width, height });
        }

        let actual = heights.len();
        let heights = DynamicGrid::from_vec(dims, heights).ok_or(GraphBuildError::BadHeights {
            expected: width * height,
            actual,
        })?;

        Ok(Self::with_heights(heights))
    }

    pub fn from_fn(
        dims: [usize; 2],
        mut f: impl FnMut(usize, usize) -> F,
    ) -> Result<Self, GraphBuildError> {
        let [width, height] = dims;
        if width == 0 || height == 0 {
            return Err(GraphBuildError::EmptyRaster { width, height });
        }

        Ok(Self::with_heights(DynamicGrid::from_fn(dims, |[x, y]| {
            f(x, y)
        })))
    }

    pub fn flat(dims: [usize; 2], height: F) -> Result<Self, GraphBuildError> {
        Self::from_fn(dims, |_, _| height)
    }

    fn with_heights(heights: DynamicGrid<F>) -> Self {
        let normals = DynamicGrid::from_fn(heights.dimensions(), |coord| {
            let (gx, gy) = gradient(&heights, coord);
            Vector3::new(-gx, -gy, 1.0).normalize()
        });

        Self { heights, normals }
    }

    /// Height of a single cell, None if out of range
    pub fn cell_height(&self, x: usize, y: usize) -> Option<F> {
        self.heights.get([x, y]).copied()
    }

    /// Normal of a single cell, None if out of range
    pub fn cell_normal(&self, x: usize, y: usize) -> Option<Vector3> {
        self.normals.get([x, y]).copied()
    }

    fn bilinear(&self, x: F, y: F) -> Option<Bilinear> {
        let [w, h] = self.heights.dimensions();

        // also rejects NaN
        let in_range = x >= 0.0 && y >= 0.0 && x <= (w - 1) as F && y <= (h - 1) as F;
        if !in_range {
            return None;
        }

        let lo = [x.floor() as usize, y.floor() as usize];
        let hi = [(lo[0] + 1).min(w - 1), (lo[1] + 1).min(h - 1)];
        Some(Bilinear {
            lo,
            hi,
            frac: (x.fract(), y.fract()),
        })
    }
}

impl Bilinear {
    fn sample<T>(&self, grid: &DynamicGrid<T>) -> T
    where
        T: Copy + Mul<F, Output = T> + Add<Output = T>,
    {
        let (fx, fy) = self.frac;
        let [x0, y0] = self.lo;
        let [x1, y1] = self.hi;

        let top = grid[[x0, y0]] * (1.0 - fx) + grid[[x1, y0]] * fx;
        let bottom = grid[[x0, y1]] * (1.0 - fx) + grid[[x1, y1]] * fx;
        top * (1.0 - fy) + bottom * fy
    }
}

/// Central differences inside, one-sided on the borders
fn gradient(heights: &DynamicGrid<F>, [x, y]: [usize; 2]) -> (F, F) {
    let [w, h] = heights.dimensions();

    let diff = |len: usize, i: usize, at: &dyn Fn(usize) -> F| -> F {
        if len < 2 {
            0.0
        } else if i == 0 {
            at(1) - at(0)
        } else if i == len - 1 {
            at(i) - at(i - 1)
        } else {
            (at(i + 1) - at(i - 1)) * 0.5
        }
    };

    let gx = diff(w, x, &|i| heights[[i, y]]);
    let gy = diff(h, y, &|i| heights[[x, i]]);
    (gx, gy)
}

impl Debug for HeightMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("HeightMap")
            .field("dimensions", &self.heights.dimensions())
            .finish()
    }
}

impl HeightSurface for HeightMap {
    fn dimensions(&self) -> [usize; 2] {
        self.heights.dimensions()
    }

    fn elevation(&self, x: F, y: F) -> F {
        self.bilinear(x, y)
            .map(|b| b.sample(&self.heights))
            .unwrap_or(0.0)
    }

    fn elevation_and_normal(&self, x: F, y: F) -> (F, Vector3) {
        match self.bilinear(x, y) {
            Some(b) => {
                let normal = b.sample(&self.normals);
                let normal = if normal.magnitude2() > 0.0 {
                    normal.normalize()
                } else {
                    Vector3::unit_z()
                };
                (b.sample(&self.heights), normal)
            }
            None => (0.0, Vector3::unit_z()),
        }
    }
}

impl<S: HeightSurface + ?Sized> HeightSurface for &S {
    fn dimensions(&self) -> [usize; 2] {
        (**self).dimensions()
    }

    fn elevation(&self, x: F, y: F) -> F {
        (**self).elevation(x, y)
    }

    fn elevation_and_normal(&self, x: F, y: F) -> (F, Vector3) {
        (**self).elevation_and_normal(x, y)
    }
}

impl<S: HeightSurface + ?Sized> HeightSurface for Arc<S> {
    fn dimensions(&self) -> [usize; 2] {
        (**self).dimensions()
    }

    fn elevation(&self, x: F, y: F) -> F {
        (**self).elevation(x, y)
    }

    fn elevation_and_normal(&self, x: F, y: F) -> (F, Vector3) {
        (**self).elevation_and_normal(x, y)
    }
}
