use common::*;

use crate::region::Rect;

/// Shared boundary segment between two touching areas. Always axis aligned and never a single
/// point
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Portal {
    pub x0: F,
    pub y0: F,
    pub x1: F,
    pub y1: F,
}

/// Where a line crosses the infinite extension of a portal
#[derive(Copy, Clone, Debug)]
pub struct Crossing {
    pub point: Point2,
    /// Parameter along the portal, 0 at its start and 1 at its end
    pub along_portal: F,
    /// Parameter along the line
    pub along_line: F,
}

/// Below this the portal and line are parallel
const PARALLEL_EPSILON: F = 1e-5;

impl Portal {
    /// Edges are compared exactly, which holds for quadtree splits of an integer raster
    pub fn between(a: &Rect, b: &Rect) -> Option<Portal> {
        let (x0, y0, x1, y1);

        if a.x0 == b.x1 || b.x0 == a.x1 {
            // vertical
            x0 = if a.x0 == b.x1 { a.x0 } else { b.x0 };
            x1 = x0;
            y0 = a.y0.max(b.y0);
            y1 = a.y1.min(b.y1);
        } else if a.y0 == b.y1 || b.y0 == a.y1 {
            // horizontal
            y0 = if a.y0 == b.y1 { a.y0 } else { b.y0 };
            y1 = y0;
            x0 = a.x0.max(b.x0);
            x1 = a.x1.min(b.x1);
        } else {
            return None;
        }

        let degenerate = x0 >= x1 && y0 >= y1;
        (!degenerate).as_some(Portal { x0, y0, x1, y1 })
    }

    pub fn start(&self) -> Point2 {
        Point2::new(self.x0, self.y0)
    }

    pub fn end(&self) -> Point2 {
        Point2::new(self.x1, self.y1)
    }

    pub fn midpoint(&self) -> Point2 {
        self.point_at(0.5)
    }

    /// 0 is the start, 1 the end
    pub fn point_at(&self, s: F) -> Point2 {
        lerp2(self.start(), self.end(), s)
    }

    pub fn length(&self) -> F {
        self.start().distance(self.end())
    }

    pub fn is_vertical(&self) -> bool {
        self.x0 == self.x1
    }

    /// Intersection with the line from `from` to `to`, extended beyond both segments. None if
    /// parallel
    pub fn crossing(&self, from: Point2, to: Point2) -> Option<Crossing> {
        let s1 = self.end() - self.start();
        let s2 = to - from;

        let d = -s2.x * s1.y + s1.x * s2.y;
        if d.abs() < PARALLEL_EPSILON {
            return None;
        }

        let dx = self.x0 - from.x;
        let dy = self.y0 - from.y;
        let along_line = (-s1.y * dx + s1.x * dy) / d;
        let along_portal = (s2.x * dy - s2.y * dx) / d;

        Some(Crossing {
            point: self.start() + s1 * along_portal,
            along_portal,
            along_line,
        })
    }
}

impl Crossing {
    /// Inside both the portal and the line
    pub fn is_within(&self) -> bool {
        let unit = 0.0..=1.0;
        unit.contains(&self.along_portal) && unit.contains(&self.along_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_portal() {
        let left = Rect::new(0.0, 0.0, 2.0, 4.0);
        let right = Rect::new(2.0, 1.0, 4.0, 2.0);

        let portal = Portal::between(&left, &right).expect("touching");
        assert_eq!(portal, Portal { x0: 2.0, y0: 1.0, x1: 2.0, y1: 2.0 });
        assert!(portal.is_vertical());

        // same segment from either side
        assert_eq!(Portal::between(&right, &left), Some(portal));
    }

    #[test]
    fn horizontal_portal() {
        let top = Rect::new(0.0, 0.0, 4.0, 2.0);
        let bottom = Rect::new(2.0, 2.0, 4.0, 4.0);

        let portal = Portal::between(&top, &bottom).expect("touching");
        assert_eq!(portal, Portal { x0: 2.0, y0: 2.0, x1: 4.0, y1: 2.0 });
        assert!(approx_eq(portal.length(), 2.0));
        assert_eq!(Portal::between(&bottom, &top), Some(portal));
    }

    #[test]
    fn corners_are_not_portals() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(2.0, 2.0, 4.0, 4.0);
        assert_eq!(Portal::between(&a, &b), None);
        assert_eq!(Portal::between(&b, &a), None);

        // or itself, or something far away
        assert_eq!(Portal::between(&a, &a), None);
        assert_eq!(Portal::between(&a, &Rect::new(5.0, 5.0, 6.0, 6.0)), None);
    }

    #[test]
    fn line_crossing() {
        let portal = Portal { x0: 2.0, y0: 0.0, x1: 2.0, y1: 2.0 };

        let crossing = portal
            .crossing(Point2::new(1.0, 1.0), Point2::new(3.0, 1.0))
            .expect("not parallel");
        assert!(approx_eq(crossing.along_portal, 0.5));
        assert!(approx_eq(crossing.along_line, 0.5));
        assert!(approx_eq(crossing.point.x, 2.0));
        assert!(approx_eq(crossing.point.y, 1.0));
        assert!(crossing.is_within());
    }

    #[test]
    fn crossing_outside_portal() {
        let portal = Portal { x0: 2.0, y0: 0.0, x1: 2.0, y1: 2.0 };

        // passes below the end of the portal
        let crossing = portal
            .crossing(Point2::new(1.0, 3.0), Point2::new(3.0, 3.0))
            .expect("not parallel");
        assert!(approx_eq(crossing.along_portal, 1.5));
        assert!(!crossing.is_within());

        // stops short of the portal
        let crossing = portal
            .crossing(Point2::new(0.0, 1.0), Point2::new(1.0, 1.0))
            .expect("not parallel");
        assert!(approx_eq(crossing.along_line, 2.0));
        assert!(!crossing.is_within());
    }

    #[test]
    fn parallel_line() {
        let portal = Portal { x0: 2.0, y0: 0.0, x1: 2.0, y1: 2.0 };
        assert!(portal
            .crossing(Point2::new(1.0, 0.0), Point2::new(1.0, 5.0))
            .is_none());
    }
}
