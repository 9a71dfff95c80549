// src/canvas/paint.rs
//
// Replays recorded FrameCanvas commands onto a nannou Draw.
// Script space (top-left origin, y down) is mapped into nannou's
// centered, y-up view space here.

use nannou::lyon::tessellation::LineCap;
use nannou::prelude::*;

use super::frame_canvas::{DrawCommand, FrameCanvas};

/// Maps script-space points into nannou view space.
#[derive(Debug, Clone, Copy)]
pub struct CanvasMapping {
    width: f32,
    height: f32,
    centered: bool,
}

impl CanvasMapping {
    pub fn new(width: f32, height: f32, centered: bool) -> Self {
        Self {
            width,
            height,
            centered,
        }
    }

    // Translate to center-origin (unless already centered), then invert y
    // to match nannou.
    pub fn to_view(&self, p: Point2) -> Point2 {
        if self.centered {
            pt2(p.x, -p.y)
        } else {
            pt2(p.x - self.width / 2.0, self.height / 2.0 - p.y)
        }
    }
}

/// Replays every command in `canvas` onto `draw`.
pub fn render(draw: &Draw, canvas: &FrameCanvas, centered: bool) {
    let mapping = CanvasMapping::new(canvas.width(), canvas.height(), centered);
    for command in canvas.commands() {
        render_command(draw, command, &mapping);
    }
}

fn render_command(draw: &Draw, command: &DrawCommand, mapping: &CanvasMapping) {
    match command {
        DrawCommand::Line { from, to, paint } => {
            let Some(stroke) = paint.stroke else { return };
            if paint.weight <= 0.0 {
                return;
            }
            draw.line()
                .points(mapping.to_view(*from), mapping.to_view(*to))
                .color(stroke)
                .stroke_weight(paint.weight)
                .caps(LineCap::Round);
        }
        DrawCommand::Dot { at, paint } => {
            // A dot is the pen making a round mark, so it takes the
            // stroke color and the stroke weight as its diameter.
            let Some(stroke) = paint.stroke else { return };
            if paint.weight <= 0.0 {
                return;
            }
            let p = mapping.to_view(*at);
            draw.ellipse()
                .x_y(p.x, p.y)
                .radius(paint.weight / 2.0)
                .color(stroke);
        }
        DrawCommand::Polyline {
            points,
            closed,
            paint,
        } => {
            let Some(stroke) = paint.stroke else { return };
            if paint.weight <= 0.0 {
                return;
            }
            let mut pts: Vec<Point2> = points.iter().map(|p| mapping.to_view(*p)).collect();
            if *closed {
                pts.push(pts[0]);
            }
            draw.polyline()
                .weight(paint.weight)
                .color(stroke)
                .points(pts);
        }
        DrawCommand::Polygon { points, paint } => {
            if paint.stroke.is_none() && paint.fill.is_none() {
                return;
            }
            let pts: Vec<Point2> = points.iter().map(|p| mapping.to_view(*p)).collect();
            let mut poly = draw.polygon();
            poly = match paint.fill {
                Some(fill) => poly.color(fill),
                None => poly.no_fill(),
            };
            if let Some(stroke) = paint.stroke {
                poly = poly.stroke(stroke).stroke_weight(paint.weight);
            }
            poly.points(pts);
        }
        DrawCommand::Rect { x, y, w, h, paint } => {
            if paint.stroke.is_none() && paint.fill.is_none() {
                return;
            }
            if *w <= 0.0 || *h <= 0.0 {
                return;
            }
            let center = mapping.to_view(pt2(x + w / 2.0, y + h / 2.0));
            let mut rect = draw.rect().x_y(center.x, center.y).w_h(*w, *h);
            rect = match paint.fill {
                Some(fill) => rect.color(fill),
                None => rect.no_fill(),
            };
            if let Some(stroke) = paint.stroke {
                rect = rect.stroke(stroke).stroke_weight(paint.weight);
            }
            let _ = rect;
        }
        DrawCommand::Circle { at, radius, paint } => {
            if paint.stroke.is_none() && paint.fill.is_none() {
                return;
            }
            let p = mapping.to_view(*at);
            let mut ellipse = draw.ellipse().x_y(p.x, p.y).radius(*radius);
            ellipse = match paint.fill {
                Some(fill) => ellipse.color(fill),
                None => ellipse.no_fill(),
            };
            if let Some(stroke) = paint.stroke {
                ellipse = ellipse.stroke(stroke).stroke_weight(paint.weight);
            }
            let _ = ellipse;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_left_space_maps_to_centered_y_up() {
        let m = CanvasMapping::new(100.0, 100.0, false);
        assert_eq!(m.to_view(pt2(0.0, 0.0)), pt2(-50.0, 50.0));
        assert_eq!(m.to_view(pt2(50.0, 50.0)), pt2(0.0, 0.0));
        assert_eq!(m.to_view(pt2(100.0, 100.0)), pt2(50.0, -50.0));
    }

    #[test]
    fn centered_space_only_flips_y() {
        let m = CanvasMapping::new(100.0, 100.0, true);
        assert_eq!(m.to_view(pt2(0.0, 0.0)), pt2(0.0, 0.0));
        assert_eq!(m.to_view(pt2(10.0, 20.0)), pt2(10.0, -20.0));
    }
}
