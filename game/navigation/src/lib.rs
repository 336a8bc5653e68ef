pub use self::graph::{Area, AreaId, GraphBuildError, NavigationGraph, MAX_DEPTH};
pub use self::jobs::{Dispatched, JobId, JobQueueError, PathCallback, PathJobQueue, PathResult};
pub use self::owner::{OwnerHandle, OwnerRegistry};
pub use self::params::{GraphParams, JobQueueParams, TravellerParams};
pub use self::portal::{Crossing, Portal};
pub use self::raster::{Cell, Obstruction, ObstructionRaster};
pub use self::region::{Rect, Region};
pub use self::route::{Route, RouteError, RouteStep};
pub use self::surface::{HeightMap, HeightSurface};
pub use self::traveller::{Shaper, Traveller, TravellerBuilder};
pub use self::waypoints::Waypoints;

mod graph;
mod jobs;
mod owner;
mod params;
mod portal;
mod raster;
mod region;
mod route;
mod search;
mod surface;
mod traveller;
mod waypoints;
