use common::{ArrayVec, Boolinator, Itertools};
use std::ops::{Deref, DerefMut, Index, IndexMut};

/// Runtime-sized 2D grid, stored row-major
#[derive(Clone)]
pub struct DynamicGrid<T> {
    dims: [usize; 2],
    data: Box<[T]>,
}

pub trait GridCoord<T> {
    fn into_coord(self, grid: &DynamicGrid<T>) -> [usize; 2];
}

impl<T: Default> DynamicGrid<T> {
    /// Panics if either dimension is 0
    pub fn new(dims: [usize; 2]) -> Self {
        Self::from_fn(dims, |_| T::default())
    }
}

impl<T> DynamicGrid<T> {
    /// Panics if either dimension is 0
    pub fn from_fn(dims: [usize; 2], f: impl FnMut([usize; 2]) -> T) -> Self {
        let len = dims[0] * dims[1];
        assert_ne!(len, 0, "grid must not be empty");

        let data = Self::iter_coords_alone_static(dims)
            .map(f)
            .collect::<Vec<_>>()
            .into_boxed_slice();

        debug_assert_eq!(data.len(), len);
        DynamicGrid { dims, data }
    }

    /// None if `data` doesn't match the dimensions or either dimension is 0
    pub fn from_vec(dims: [usize; 2], data: Vec<T>) -> Option<Self> {
        let len = dims[0] * dims[1];
        (len != 0 && data.len() == len).as_some_from(|| DynamicGrid {
            dims,
            data: data.into_boxed_slice(),
        })
    }

    pub fn flatten_coords(&self, [x, y]: [usize; 2]) -> usize {
        let [xs, _ys] = self.dims;
        x + xs * y
    }

    pub fn unflatten_index(&self, index: usize) -> [usize; 2] {
        let [xs, _ys] = self.dims;
        [index % xs, index / xs]
    }

    #[inline]
    pub fn is_coord_in_range(&self, [x, y]: [usize; 2]) -> bool {
        x < self.dims[0] && y < self.dims[1]
    }

    /// Wraps both axes around the edges, so the grid behaves as a torus
    #[inline]
    pub fn wrap_coord(&self, coord: [isize; 2]) -> [usize; 2] {
        let [x, y] = coord;
        let [w, h] = [self.dims[0] as isize, self.dims[1] as isize];

        let new_coord = [x.rem_euclid(w) as usize, y.rem_euclid(h) as usize];
        debug_assert!(
            self.is_coord_in_range(new_coord),
            "wrapped {:?} to bad coord {:?}",
            coord,
            new_coord
        );
        new_coord
    }

    pub fn dimensions(&self) -> [usize; 2] {
        self.dims
    }

    pub fn get(&self, coord: impl GridCoord<T>) -> Option<&T> {
        let [x, y] = coord.into_coord(self);
        if self.is_coord_in_range([x, y]) {
            Some(&self.data[self.flatten_coords([x, y])])
        } else {
            None
        }
    }

    pub fn iter_coords(&self) -> impl Iterator<Item = ([usize; 2], &T)> + '_ {
        Self::iter_coords_alone_static(self.dims).zip(self.data.iter())
    }

    /// Row-major, matching the storage order
    pub fn iter_coords_alone_static(dims: [usize; 2]) -> impl Iterator<Item = [usize; 2]> {
        (0..dims[1])
            .cartesian_product(0..dims[0])
            .map(move |(y, x)| [x, y])
    }

    /// Orthogonal neighbours, filters out out-of-bounds
    pub fn neighbours(&self, coord: impl GridCoord<T>) -> impl Iterator<Item = usize> + '_ {
        let [x, y] = coord.into_coord(self);

        let x0 = Some(x);
        let xp1 = Some(x + 1);
        let xs1 = x.checked_sub(1);

        let y0 = Some(y);
        let yp1 = Some(y + 1);
        let ys1 = y.checked_sub(1);

        ArrayVec::from([x0.zip(ys1), xp1.zip(y0), x0.zip(yp1), xs1.zip(y0)])
            .into_iter()
            .flatten()
            .filter_map(move |(x, y)| {
                let coord = [x, y];
                self.is_coord_in_range(coord)
                    .as_some_from(|| self.flatten_coords(coord))
            })
    }

    /// All 8 surrounding cells, wrapping around the edges. On a grid narrower than 3 in either
    /// direction the same cell may be yielded more than once
    pub fn wrapping_neighbours(
        &self,
        coord: impl GridCoord<T>,
    ) -> impl ExactSizeIterator<Item = usize> + Clone + '_ {
        let [x, y] = coord.into_coord(self);
        let (x, y) = (x as isize, y as isize);

        ArrayVec::from([
            (x, y - 1),
            (x + 1, y - 1),
            (x + 1, y),
            (x + 1, y + 1),
            (x, y + 1),
            (x - 1, y + 1),
            (x - 1, y),
            (x - 1, y - 1),
        ])
        .into_iter()
        .map(move |(x, y)| self.flatten_coords(self.wrap_coord([x, y])))
    }
}

impl<T> GridCoord<T> for usize {
    fn into_coord(self, grid: &DynamicGrid<T>) -> [usize; 2] {
        grid.unflatten_index(self)
    }
}

impl<T> GridCoord<T> for [usize; 2] {
    fn into_coord(self, _: &DynamicGrid<T>) -> [usize; 2] {
        self
    }
}

impl<T> Index<usize> for DynamicGrid<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for DynamicGrid<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T> Index<[usize; 2]> for DynamicGrid<T> {
    type Output = T;

    fn index(&self, coords: [usize; 2]) -> &Self::Output {
        self.index(self.flatten_coords(coords))
    }
}

impl<T> Deref for DynamicGrid<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for DynamicGrid<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}
