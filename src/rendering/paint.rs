/// Turning styled layers into tiny-skia paths and paints

use log::warn;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::rendering::Viewport;
use crate::style::{Color, Geometry, Layer, Symbolizer};

pub fn paint_for(color: Color, opacity: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    let alpha = (color.a as f32 * opacity).round().clamp(0.0, 255.0) as u8;
    paint.set_color_rgba8(color.r, color.g, color.b, alpha);
    paint.anti_alias = true;
    paint
}

pub fn stroke_for(style: &Symbolizer) -> Stroke {
    Stroke {
        width: style.stroke_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

/// Build a path through `points`, optionally closing it.
pub fn line_path(points: &[[f64; 2]], viewport: &Viewport, closed: bool) -> Option<Path> {
    let mut pb = PathBuilder::new();
    push_line(&mut pb, points, viewport, closed);
    pb.finish()
}

/// Build one path holding every ring of a polygon (drawn with the even-odd rule).
pub fn polygon_path(rings: &[Vec<[f64; 2]>], viewport: &Viewport) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for ring in rings.iter().filter(|r| r.len() >= 3) {
        push_line(&mut pb, ring, viewport, true);
    }
    pb.finish()
}

fn push_line(pb: &mut PathBuilder, points: &[[f64; 2]], viewport: &Viewport, closed: bool) {
    for (i, &[x, y]) in points.iter().enumerate() {
        let (px, py) = viewport.to_pixel(x, y);
        if i == 0 {
            pb.move_to(px as f32, py as f32);
        } else {
            pb.line_to(px as f32, py as f32);
        }
    }
    if closed {
        pb.close();
    }
}

/// Draw every feature of `layer`. Returns the number of features skipped
/// because they had no drawable geometry.
pub fn draw_layer(pixmap: &mut Pixmap, layer: &Layer, viewport: &Viewport) -> usize {
    let style = &layer.style;
    let mut skipped = 0;
    for feature in &layer.features {
        let drawn = match feature {
            Geometry::Point(p) => draw_points(pixmap, std::slice::from_ref(p), style, viewport),
            Geometry::MultiPoint(ps) => draw_points(pixmap, ps, style, viewport),
            Geometry::LineString(line) => draw_lines(pixmap, std::slice::from_ref(line), style, viewport),
            Geometry::MultiLineString(lines) => draw_lines(pixmap, lines, style, viewport),
            Geometry::Polygon(rings) => draw_polygons(pixmap, std::slice::from_ref(rings), style, viewport),
            Geometry::MultiPolygon(polys) => draw_polygons(pixmap, polys, style, viewport),
        };
        if !drawn {
            skipped += 1;
        }
    }
    if skipped > 0 {
        warn!("layer {}: skipped {} degenerate feature(s)", layer.name, skipped);
    }
    skipped
}

fn fill_and_stroke(pixmap: &mut Pixmap, path: &Path, style: &Symbolizer, fill: Option<Color>) {
    if let Some(color) = fill {
        pixmap.fill_path(path, &paint_for(color, style.opacity), FillRule::EvenOdd, Transform::identity(), None);
    }
    if let Some(color) = style.stroke.filter(|_| style.stroke_width > 0.0) {
        pixmap.stroke_path(path, &paint_for(color, style.opacity), &stroke_for(style), Transform::identity(), None);
    }
}

fn draw_points(pixmap: &mut Pixmap, points: &[[f64; 2]], style: &Symbolizer, viewport: &Viewport) -> bool {
    let mut any = false;
    for &[x, y] in points {
        let (px, py) = viewport.to_pixel(x, y);
        if let Some(circle) = PathBuilder::from_circle(px as f32, py as f32, style.point_radius) {
            fill_and_stroke(pixmap, &circle, style, style.fill);
            any = true;
        }
    }
    any
}

fn draw_lines(pixmap: &mut Pixmap, lines: &[Vec<[f64; 2]>], style: &Symbolizer, viewport: &Viewport) -> bool {
    let mut any = false;
    for line in lines.iter().filter(|l| l.len() >= 2) {
        if let Some(path) = line_path(line, viewport, false) {
            // lines are never filled
            fill_and_stroke(pixmap, &path, style, None);
            any = true;
        }
    }
    any
}

fn draw_polygons(pixmap: &mut Pixmap, polygons: &[Vec<Vec<[f64; 2]>>], style: &Symbolizer, viewport: &Viewport) -> bool {
    let mut any = false;
    for rings in polygons {
        if let Some(path) = polygon_path(rings, viewport) {
            fill_and_stroke(pixmap, &path, style, style.fill);
            any = true;
        }
    }
    any
}
