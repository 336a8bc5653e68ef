use std::iter::FusedIterator;

use common::*;

use crate::route::Route;

/// Lazily smooths a route into 2D points, from exactly the source to exactly the destination.
/// Always at least 3 points, and can't be restarted
#[derive(Clone, Debug)]
pub struct Waypoints {
    route: Route,
    src: Point2,
    dst: Point2,
    state: State,
    /// Last point yielded
    pos: Point2,
}

#[derive(Copy, Clone, Debug)]
enum State {
    Start,
    /// Next route step to enter
    Step(usize),
    /// Point on the portal of a detour, then the next step
    Crossing { through: Point2, next: usize },
    Destination,
    Done,
}

enum Entry {
    Straight(Point2),
    Detour { pulled: Point2, through: Point2 },
}

/// Keeps crossings away from the ends of a portal
const PORTAL_MARGIN: F = 0.1;

/// How far a detour point is pulled towards the center of the area being entered
const CENTER_PULL: F = 0.1;

impl Waypoints {
    pub(crate) fn new(route: Route, src: Point2, dst: Point2) -> Self {
        Self {
            route,
            src,
            dst,
            state: State::Start,
            pos: src,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn source(&self) -> Point2 {
        self.src
    }

    pub fn destination(&self) -> Point2 {
        self.dst
    }

    /// Heads straight for the next area's center if that line passes through the portal,
    /// otherwise detours through a point on the portal
    fn enter_step(&mut self, idx: usize) -> Entry {
        let next = &self.route.steps()[idx];

        let portal = match next.entry {
            Some(portal) => portal,
            None => {
                debug_assert!(false, "route step {} has no entry portal", idx);
                self.pos = next.center;
                return Entry::Straight(next.center);
            }
        };

        let crossing = portal.crossing(self.pos, next.center);
        if let Some(crossing) = crossing.filter(|c| c.is_within()) {
            trace!("straight into next area"; "area" => next.area, "crossing" => ?crossing.point);
            self.pos = next.center;
            return Entry::Straight(next.center);
        }

        // parallel lines cross in the middle
        let s = crossing
            .map(|c| c.along_portal)
            .unwrap_or(0.5)
            .clamp(PORTAL_MARGIN, 1.0 - PORTAL_MARGIN);

        let through = portal.point_at(s);
        let halfway = midpoint2(self.pos, through);
        self.pos = through;

        Entry::Detour {
            pulled: lerp2(halfway, next.center, CENTER_PULL),
            through,
        }
    }
}

impl Iterator for Waypoints {
    type Item = Point2;

    fn next(&mut self) -> Option<Self::Item> {
        let (point, next_state) = match self.state {
            State::Start => (self.src, State::Step(1)),
            State::Step(idx) if idx < self.route.len() => match self.enter_step(idx) {
                Entry::Straight(center) => (center, State::Step(idx + 1)),
                Entry::Detour { pulled, through } => (
                    pulled,
                    State::Crossing {
                        through,
                        next: idx + 1,
                    },
                ),
            },
            // so there are always at least 3
            State::Step(_) if self.route.len() < 2 => {
                (midpoint2(self.src, self.dst), State::Destination)
            }
            State::Step(_) => (self.dst, State::Done),
            State::Crossing { through, next } => (through, State::Step(next)),
            State::Destination => (self.dst, State::Done),
            State::Done => return None,
        };

        self.state = next_state;
        Some(point)
    }
}

impl FusedIterator for Waypoints {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AreaId, NavigationGraph};
    use crate::portal::Portal;
    use crate::raster::ObstructionRaster;
    use crate::route::RouteStep;

    fn graph(dims: [usize; 2], depth: u8, blocked: impl FnMut(usize, usize) -> bool) -> NavigationGraph {
        let raster = ObstructionRaster::from_fn(dims, blocked).expect("valid");
        NavigationGraph::from_raster(raster, depth, None).expect("valid")
    }

    fn assert_points(actual: Vec<Point2>, expected: &[(F, F)]) {
        assert_eq!(actual.len(), expected.len(), "{:?}", actual);
        for (a, &(x, y)) in actual.iter().zip(expected) {
            assert!(approx_eq(a.x, x) && approx_eq(a.y, y), "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn single_area_has_midpoint() {
        let nav = graph([4, 4], 1, |_, _| false);
        let points = nav
            .waypoint_generator(Point2::new(1.0, 1.0), Point2::new(3.0, 3.0))
            .expect("route")
            .collect_vec();

        assert_eq!(
            points,
            vec![Point2::new(1.0, 1.0), Point2::new(2.0, 2.0), Point2::new(3.0, 3.0)]
        );
    }

    #[test]
    fn straight_through_portal() {
        // bottom half blocked
        let nav = graph([4, 4], 1, |_, y| y >= 2);
        let points = nav
            .waypoint_generator(Point2::new(1.0, 1.0), Point2::new(3.5, 1.5))
            .expect("route")
            .collect_vec();

        assert_points(points, &[(1.0, 1.0), (3.0, 1.0), (3.5, 1.5)]);
    }

    #[test]
    fn detour_through_narrow_portal() {
        // blocked cell in the top right quadrant, leaving a narrow gap at the top
        let nav = graph([4, 4], 2, |x, y| x == 2 && y == 1);
        let mut waypoints = nav
            .waypoint_generator(Point2::new(1.9, 1.9), Point2::new(3.5, 1.5))
            .expect("route");

        assert_eq!(
            waypoints.route().areas().collect_vec(),
            vec![AreaId(0), AreaId(1), AreaId(2), AreaId(3)]
        );

        let points = waypoints.by_ref().collect_vec();
        assert_points(
            points,
            &[
                (1.9, 1.9),
                // halfway to the clamped portal point, pulled towards the next area's center
                (2.005, 1.31),
                (2.0, 0.9),
                (3.5, 0.5),
                (3.5, 1.5),
                (3.5, 1.5),
            ],
        );

        // not restartable
        assert_eq!(waypoints.next(), None);
        assert_eq!(waypoints.next(), None);
    }

    #[test]
    fn parallel_line_crosses_middle() {
        let portal = Portal { x0: 2.0, y0: 0.0, x1: 2.0, y1: 2.0 };
        let route = Route::from_steps(vec![
            RouteStep {
                area: AreaId(0),
                center: Point2::new(1.0, 1.0),
                entry: None,
            },
            RouteStep {
                area: AreaId(1),
                center: Point2::new(2.0, 4.0),
                entry: Some(portal),
            },
        ]);

        let src = Point2::new(2.0, 3.0);
        let dst = Point2::new(2.0, 5.0);
        let points = Waypoints::new(route, src, dst).collect_vec();
        assert_points(points, &[(2.0, 3.0), (2.0, 2.2), (2.0, 1.0), (2.0, 5.0)]);
    }

    #[test]
    fn detour_is_pulled_towards_next_area() {
        let portal = Portal { x0: 2.0, y0: 0.0, x1: 2.0, y1: 2.0 };
        let next_center = Point2::new(3.0, 10.0);
        let route = Route::from_steps(vec![
            RouteStep {
                area: AreaId(0),
                center: Point2::new(1.0, 1.0),
                entry: None,
            },
            RouteStep {
                area: AreaId(1),
                center: next_center,
                entry: Some(portal),
            },
        ]);

        let src = Point2::new(1.0, 1.0);
        let points = Waypoints::new(route, src, next_center).collect_vec();
        assert_points(points.clone(), &[(1.0, 1.0), (1.65, 2.26), (2.0, 1.8), (3.0, 10.0)]);

        // closer to the next center than the unpulled halfway point
        let halfway = midpoint2(src, points[2]);
        assert!(points[1].distance(next_center) < halfway.distance(next_center));
    }

    #[test]
    fn always_at_least_three_points() {
        let mut rng = seeded_rng(Some(0x7770));
        let blocked = (0..32 * 32).map(|_| rng.gen_bool(0.2)).collect_vec();
        let nav = graph([32, 32], 6, |x, y| blocked[x + y * 32]);

        let centers = nav.areas().map(|a| a.center()).collect_vec();
        let mut routes = 0;
        for (src, dst) in centers.iter().step_by(7).cartesian_product(centers.iter().step_by(5)) {
            let points = match nav.waypoint_generator(*src, *dst) {
                Ok(waypoints) => waypoints.collect_vec(),
                Err(_) => continue,
            };

            routes += 1;
            assert!(points.len() >= 3);
            assert_eq!(points.first(), Some(src));
            assert_eq!(points.last(), Some(dst));
        }

        assert!(routes > 0);
    }
}
