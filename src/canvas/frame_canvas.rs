// src/canvas/frame_canvas.rs
//
// The retained drawing surface handed to the scene script each frame.
// Scripts record draw commands against it; paint.rs replays them onto
// a nannou Draw afterwards.
//
// Coordinates are in script space: origin at the top-left with y growing
// downward (or at the canvas center when the host runs centered).

use nannou::prelude::*;

/// Stroke/fill/weight state captured alongside every recorded command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub stroke: Option<Rgba>,
    pub fill: Option<Rgba>,
    pub weight: f32,
}

impl Default for Paint {
    fn default() -> Self {
        // QPainter-style defaults: thin black pen, no brush.
        Self {
            stroke: Some(rgba(0.0, 0.0, 0.0, 1.0)),
            fill: None,
            weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line {
        from: Point2,
        to: Point2,
        paint: Paint,
    },
    /// A single dot with diameter equal to the stroke weight.
    Dot {
        at: Point2,
        paint: Paint,
    },
    Polyline {
        points: Vec<Point2>,
        closed: bool,
        paint: Paint,
    },
    Polygon {
        points: Vec<Point2>,
        paint: Paint,
    },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        paint: Paint,
    },
    Circle {
        at: Point2,
        radius: f32,
        paint: Paint,
    },
}

#[derive(Debug, Clone, Default)]
pub struct FrameCanvas {
    width: f32,
    height: f32,
    frame: u64,
    time: f32,
    dt: f32,

    paint: Paint,
    commands: Vec<DrawCommand>,
}

impl FrameCanvas {
    pub fn new(width: f32, height: f32, frame: u64, time: f32, dt: f32) -> Self {
        Self {
            width,
            height,
            frame,
            time,
            dt,
            paint: Paint::default(),
            commands: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.paint.weight = weight.max(0.0);
        self
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn paint(&self) -> Paint {
        self.paint
    }

    // ------------------------- paint state -------------------------

    /// Sets the stroke color; `None` disables the stroke.
    pub fn set_stroke(&mut self, color: Option<Rgba>) {
        self.paint.stroke = color;
    }

    /// Sets the fill color; `None` disables the fill.
    pub fn set_fill(&mut self, color: Option<Rgba>) {
        self.paint.fill = color;
    }

    /// Sets the stroke weight, which is also the diameter used for points.
    pub fn set_weight(&mut self, weight: f32) {
        self.paint.weight = weight.max(0.0);
    }

    // ------------------------- draw commands -------------------------

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.commands.push(DrawCommand::Line {
            from: pt2(x1, y1),
            to: pt2(x2, y2),
            paint: self.paint,
        });
    }

    pub fn point(&mut self, x: f32, y: f32) {
        self.commands.push(DrawCommand::Dot {
            at: pt2(x, y),
            paint: self.paint,
        });
    }

    pub fn points(&mut self, points: &[Point2]) {
        for p in points {
            self.commands.push(DrawCommand::Dot {
                at: *p,
                paint: self.paint,
            });
        }
    }

    /// Connected line segments. Fewer than 2 points is ignored.
    pub fn polyline(&mut self, points: Vec<Point2>, closed: bool) {
        if points.len() < 2 {
            return;
        }
        self.commands.push(DrawCommand::Polyline {
            points,
            closed,
            paint: self.paint,
        });
    }

    /// Closed polygon using the current fill and stroke.
    /// Fewer than 3 points is ignored.
    pub fn polygon(&mut self, points: Vec<Point2>) {
        if points.len() < 3 {
            return;
        }
        self.commands.push(DrawCommand::Polygon {
            points,
            paint: self.paint,
        });
    }

    /// Rectangle by top-left origin and size.
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            w,
            h,
            paint: self.paint,
        });
    }

    /// Rectangle by two corners. Flipped corner pairs are normalized so
    /// they describe the same rectangle.
    pub fn rect_corners(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let (x1, x2) = if x2 < x1 { (x2, x1) } else { (x1, x2) };
        let (y1, y2) = if y2 < y1 { (y2, y1) } else { (y1, y2) };
        self.rect(x1, y1, x2 - x1, y2 - y1);
    }

    pub fn circle(&mut self, x: f32, y: f32, radius: f32) {
        self.commands.push(DrawCommand::Circle {
            at: pt2(x, y),
            radius,
            paint: self.paint,
        });
    }
}
