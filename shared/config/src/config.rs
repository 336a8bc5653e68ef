use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub navigation: Navigation,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Navigation {
    /// Degrees from vertical above which a cell is too steep to walk on
    pub max_slope_deg: f32,

    /// Number of steep cells in a 3x3 neighbourhood needed to block the centre cell
    pub smoothing_threshold: u8,

    /// Max quadtree subdivision depth
    pub depth: u8,

    /// How long the path worker waits for a request before checking for shutdown
    pub worker_poll_ms: u64,

    /// Max completed paths waiting to be dispatched
    pub result_capacity: usize,

    pub traveller: Traveller,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Traveller {
    /// Distance per second
    pub speed: f32,

    /// Height above the terrain that waypoints are lifted to
    pub cruise_height: f32,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            max_slope_deg: 30.0,
            smoothing_threshold: 3,
            depth: 6,
            worker_poll_ms: 500,
            result_capacity: 64,
            traveller: Traveller::default(),
        }
    }
}

impl Default for Traveller {
    fn default() -> Self {
        Self {
            speed: 3.0,
            cruise_height: 1.0,
        }
    }
}
