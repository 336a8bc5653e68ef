pub use arrayvec::ArrayVec;
pub use boolinator::Boolinator;
pub use cgmath;
pub use cgmath::{Angle, Deg, EuclideanSpace, InnerSpace, MetricSpace, Rad, VectorSpace, Zero};
pub use derive_more;
pub use float_cmp::{ApproxEq, F32Margin};
pub use itertools::Itertools;
pub use lazy_static::lazy_static;
pub use num_traits;
pub use parking_lot;
pub use rand::prelude::*;
pub use smallvec::{smallvec, SmallVec};
pub use thiserror::{self, Error};

pub use logging::prelude::*;
pub use logging::{slog_kv_debug, slog_value_debug, slog_value_display};

pub use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

pub type F = f32;
pub type Vector3 = cgmath::Vector3<F>;
pub type Vector2 = cgmath::Vector2<F>;
pub type Point3 = cgmath::Point3<F>;
pub type Point2 = cgmath::Point2<F>;

pub type BoxedResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Seeded if given, otherwise random
pub fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// Linear interpolation between two points
pub fn lerp2(a: Point2, b: Point2, t: F) -> Point2 {
    a + (b - a) * t
}

/// Midpoint of two points
pub fn midpoint2(a: Point2, b: Point2) -> Point2 {
    lerp2(a, b, 0.5)
}

/// Approximate float equality with default margins
pub fn approx_eq(a: F, b: F) -> bool {
    a.approx_eq(b, F32Margin::default().epsilon(1e-4))
}
