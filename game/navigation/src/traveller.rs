use std::collections::VecDeque;

use common::*;

use crate::params::TravellerParams;
use crate::surface::HeightSurface;
use crate::waypoints::Waypoints;

/// Replaces the first or last pair of lifted waypoints with its own points
pub type Shaper = Box<dyn FnMut(Point3, Point3) -> Vec<Point3> + Send>;

/// Follows waypoints at a constant speed, one [advance](Self::advance) per tick. Can't be reused
/// once done
pub struct Traveller<S, I = Waypoints> {
    surface: S,
    waypoints: Lifted<I>,
    speed: F,
    pos: Point3,
    target: Point3,
    done: bool,
}

pub struct TravellerBuilder<I> {
    waypoints: I,
    speed: F,
    cruise_height: F,
    intro: Option<Shaper>,
    outro: Option<Shaper>,
}

/// Waypoints lifted to `elevation + cruise_height`, pulled lazily and passed through the shapers
struct Lifted<I> {
    route: I,
    cruise_height: F,
    intro: Option<Shaper>,
    outro: Option<Shaper>,
    shaped: VecDeque<Point3>,
    started: bool,
    /// Last point handed out
    prev: Option<Point3>,
    /// Next point, held back until it's known whether it is the last
    held: Option<Point3>,
}

impl<I: Iterator<Item = Point2>> TravellerBuilder<I> {
    pub fn new(waypoints: impl IntoIterator<IntoIter = I>, params: &TravellerParams) -> Self {
        Self {
            waypoints: waypoints.into_iter(),
            speed: params.speed,
            cruise_height: params.cruise_height,
            intro: None,
            outro: None,
        }
    }

    pub fn speed(mut self, speed: F) -> Self {
        self.speed = speed;
        self
    }

    pub fn cruise_height(mut self, height: F) -> Self {
        self.cruise_height = height;
        self
    }

    /// Called with the first 2 waypoints, and must end with the second
    pub fn intro(mut self, shaper: impl FnMut(Point3, Point3) -> Vec<Point3> + Send + 'static) -> Self {
        self.intro = Some(Box::new(shaper));
        self
    }

    /// Called with the last 2 waypoints, and replaces the last
    pub fn outro(mut self, shaper: impl FnMut(Point3, Point3) -> Vec<Point3> + Send + 'static) -> Self {
        self.outro = Some(Box::new(shaper));
        self
    }

    /// None if there are no waypoints
    pub fn build<S: HeightSurface>(self, surface: S) -> Option<Traveller<S, I>> {
        let mut waypoints = Lifted {
            route: self.waypoints,
            cruise_height: self.cruise_height,
            intro: self.intro,
            outro: self.outro,
            shaped: VecDeque::new(),
            started: false,
            prev: None,
            held: None,
        };

        let start = waypoints.next(&surface)?;
        Some(Traveller {
            surface,
            waypoints,
            speed: self.speed,
            pos: start,
            target: start,
            done: false,
        })
    }
}

impl<S: HeightSurface, I: Iterator<Item = Point2>> Traveller<S, I> {
    /// Moves `dt * speed` along the waypoints, never below the terrain. Returns the final position
    /// once on arrival, then None forever
    pub fn advance(&mut self, dt: F) -> Option<Point3> {
        if self.done {
            return None;
        }

        let mut to_travel = (dt * self.speed).max(0.0);
        loop {
            let v = self.target - self.pos;
            let d = v.magnitude();

            if to_travel > d {
                self.pos = self.target;
                to_travel -= d;

                match self.waypoints.next(&self.surface) {
                    Some(next) => self.target = next,
                    None => {
                        trace!("traveller arrived"; "pos" => ?self.pos);
                        self.done = true;
                        return Some(self.pos);
                    }
                }
            } else {
                if d > 0.0 {
                    self.pos += v * (to_travel / d);
                }

                let ground = self.surface.elevation(self.pos.x, self.pos.y);
                self.pos.z = self.pos.z.max(ground);
                return Some(self.pos);
            }
        }
    }

    pub fn position(&self) -> Point3 {
        self.pos
    }

    /// Waypoint currently being moved towards
    pub fn target(&self) -> Point3 {
        self.target
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl<I: Iterator<Item = Point2>> Lifted<I> {
    fn lift(&mut self, surface: &impl HeightSurface) -> Option<Point3> {
        self.route.next().map(|p| {
            let z = surface.elevation(p.x, p.y) + self.cruise_height;
            Point3::new(p.x, p.y, z)
        })
    }

    fn next(&mut self, surface: &impl HeightSurface) -> Option<Point3> {
        let point = self.shaped.pop_front().or_else(|| self.next_unshaped(surface));
        if point.is_some() {
            self.prev = point;
        }
        point
    }

    fn next_unshaped(&mut self, surface: &impl HeightSurface) -> Option<Point3> {
        if !self.started {
            self.started = true;
            let first = self.lift(surface)?;

            let mut intro = match self.intro.take() {
                Some(intro) => intro,
                None => {
                    self.held = self.lift(surface);
                    return Some(first);
                }
            };

            let second = match self.lift(surface) {
                Some(p) => p,
                // nothing to lead into
                None => return Some(first),
            };

            self.shaped.extend(intro(first, second));
            self.held = self.lift(surface);
            return self.shaped.pop_front().or(Some(second));
        }

        let current = self.held.take()?;
        match self.lift(surface) {
            Some(next) => {
                self.held = Some(next);
                Some(current)
            }
            None => match (self.outro.take(), self.prev) {
                (Some(mut outro), Some(prev)) => {
                    self.shaped.extend(outro(prev, current));
                    self.shaped.pop_front()
                }
                _ => Some(current),
            },
        }
    }
}
