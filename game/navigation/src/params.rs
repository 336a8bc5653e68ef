use std::time::Duration;

use common::*;

/// Inputs to [NavigationGraph::build](crate::NavigationGraph::build)
#[derive(Clone, Debug)]
pub struct GraphParams {
    /// Degrees from vertical
    pub max_slope_deg: F,
    pub smoothing_threshold: u8,
    pub depth: u8,
}

#[derive(Clone, Debug)]
pub struct JobQueueParams {
    /// Longest the worker waits for a request before checking whether it should stop
    pub worker_poll: Duration,
    pub result_capacity: usize,
}

#[derive(Clone, Debug)]
pub struct TravellerParams {
    pub speed: F,
    pub cruise_height: F,
}

impl Default for GraphParams {
    fn default() -> Self {
        (&config::Navigation::default()).into()
    }
}

impl Default for JobQueueParams {
    fn default() -> Self {
        (&config::Navigation::default()).into()
    }
}

impl Default for TravellerParams {
    fn default() -> Self {
        (&config::Navigation::default()).into()
    }
}

impl From<&config::Navigation> for GraphParams {
    fn from(cfg: &config::Navigation) -> Self {
        Self {
            max_slope_deg: cfg.max_slope_deg,
            smoothing_threshold: cfg.smoothing_threshold,
            depth: cfg.depth,
        }
    }
}

impl From<&config::Navigation> for JobQueueParams {
    fn from(cfg: &config::Navigation) -> Self {
        Self {
            worker_poll: Duration::from_millis(cfg.worker_poll_ms),
            // a zero capacity channel would make the worker rendezvous with every tick
            result_capacity: cfg.result_capacity.max(1),
        }
    }
}

impl From<&config::Navigation> for TravellerParams {
    fn from(cfg: &config::Navigation) -> Self {
        Self {
            speed: cfg.traveller.speed,
            cruise_height: cfg.traveller.cruise_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_config() {
        let graph = GraphParams::default();
        assert!(approx_eq(graph.max_slope_deg, 30.0));
        assert_eq!(graph.smoothing_threshold, 3);
        assert_eq!(graph.depth, 6);

        let jobs = JobQueueParams::default();
        assert_eq!(jobs.worker_poll, Duration::from_millis(500));
        assert_eq!(jobs.result_capacity, 64);
    }

    #[test]
    fn zero_capacity_is_bumped() {
        let cfg = config::Navigation {
            result_capacity: 0,
            ..Default::default()
        };

        assert_eq!(JobQueueParams::from(&cfg).result_capacity, 1);
    }
}
