use std::path::Path;

use common::*;
use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use navigation::{HeightMap, HeightSurface, NavigationGraph, Rect, Route};

const AREA_OUTLINE: Rgba<u8> = Rgba([40, 90, 160, 255]);
const ROUTE_FILL: Rgba<u8> = Rgba([120, 200, 120, 255]);
const PORTAL: Rgba<u8> = Rgba([230, 160, 30, 255]);
const WAYPOINT: Rgba<u8> = Rgba([200, 30, 30, 255]);
const TRACE: Rgba<u8> = Rgba([250, 250, 250, 255]);

/// Draws a navigation graph over its terrain, scaled up by a whole number of pixels per cell
pub struct Render {
    image: RgbaImage,
    scale: u32,
}

impl Render {
    /// Terrain in greyscale, with cells that are in no area tinted red
    pub fn with_terrain(map: &HeightMap, graph: &NavigationGraph, scale: u32) -> Self {
        let scale = scale.max(1);
        let [w, h] = map.dimensions();

        let (lo, hi) = (0..w)
            .cartesian_product(0..h)
            .filter_map(|(x, y)| map.cell_height(x, y))
            .fold((F::MAX, F::MIN), |(lo, hi), z| (lo.min(z), hi.max(z)));
        let range = (hi - lo).max(F::EPSILON);

        let image = ImageBuffer::from_fn(w as u32 * scale, h as u32 * scale, |px, py| {
            let (x, y) = ((px / scale) as usize, (py / scale) as usize);
            let z = map.cell_height(x, y).unwrap_or(lo);
            let grey = (40.0 + 160.0 * (z - lo) / range) as u8;

            let center = Point2::new(x as F + 0.5, y as F + 0.5);
            if graph.containing_area(center).is_some() {
                Rgba([grey, grey, grey, 255])
            } else {
                Rgba([grey.saturating_add(60), grey / 2, grey / 2, 255])
            }
        });

        Self { image, scale }
    }

    pub fn draw_areas(&mut self, graph: &NavigationGraph) {
        for area in graph.areas() {
            let rect = self.rect(area.rect());
            draw_hollow_rect_mut(&mut self.image, rect, AREA_OUTLINE);
        }
    }

    /// Route areas filled, with the portals between them
    pub fn draw_route(&mut self, graph: &NavigationGraph, route: &Route) {
        for area in route.areas().filter_map(|id| graph.area(id)) {
            let rect = self.rect(area.rect());
            draw_filled_rect_mut(&mut self.image, rect, ROUTE_FILL);
            draw_hollow_rect_mut(&mut self.image, rect, AREA_OUTLINE);
        }

        for portal in route.portals() {
            let (start, end) = (self.pixel(portal.start()), self.pixel(portal.end()));
            draw_line_segment_mut(&mut self.image, start, end, PORTAL);
        }
    }

    pub fn draw_waypoints(&mut self, waypoints: &[Point2]) {
        let radius = (self.scale as i32 / 2).max(1);
        for p in waypoints {
            let (x, y) = self.pixel(*p);
            draw_filled_circle_mut(&mut self.image, (x as i32, y as i32), radius, WAYPOINT);
        }
    }

    /// Line through consecutive positions, ignoring height
    pub fn draw_trace(&mut self, trace: &[Point3]) {
        for (a, b) in trace.iter().tuple_windows() {
            let (a, b) = (self.pixel(Point2::new(a.x, a.y)), self.pixel(Point2::new(b.x, b.y)));
            draw_line_segment_mut(&mut self.image, a, b, TRACE);
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> BoxedResult<()> {
        let path = path.as_ref();
        self.image.save(path)?;
        info!("saved image"; "path" => %path.display());
        Ok(())
    }

    fn pixel(&self, p: Point2) -> (f32, f32) {
        let scale = self.scale as F;
        (p.x * scale, p.y * scale)
    }

    fn rect(&self, rect: &Rect) -> imageproc::rect::Rect {
        let scale = self.scale as F;
        let w = (rect.width() * scale).round().max(1.0) as u32;
        let h = (rect.height() * scale).round().max(1.0) as u32;
        imageproc::rect::Rect::at((rect.x0 * scale) as i32, (rect.y0 * scale) as i32).of_size(w, h)
    }
}
