// src/scene/api.rs
//
// Rhai bindings for the frame canvas. The script receives a Canvas
// handle (`ani`) whose getters expose frame metadata and whose methods
// mirror every FrameCanvas operation.
//
// All bindings follow: `engine.register_fn("name", |handle, ...| { ... })`

use std::cell::RefCell;
use std::rc::Rc;

use nannou::prelude::*;
use rhai::{Array, Dynamic, Engine, EvalAltResult};

use crate::canvas::{color, FrameCanvas};

/// Shared handle around the frame canvas for script access.
#[derive(Clone)]
pub struct CanvasHandle {
    inner: Rc<RefCell<FrameCanvas>>,
}

impl CanvasHandle {
    pub fn new(canvas: FrameCanvas) -> Self {
        Self {
            inner: Rc::new(RefCell::new(canvas)),
        }
    }

    /// Recovers the canvas. Falls back to a clone when the script kept a
    /// handle alive (e.g. stashed `ani` in its state map).
    pub fn take(self) -> FrameCanvas {
        match Rc::try_unwrap(self.inner) {
            Ok(cell) => cell.into_inner(),
            Err(shared) => shared.borrow().clone(),
        }
    }
}

type ScriptResult<T> = std::result::Result<T, Box<EvalAltResult>>;

fn num(v: &Dynamic) -> ScriptResult<f32> {
    v.clone()
        .as_float()
        .map(|f| f as f32)
        .or_else(|_| v.clone().as_int().map(|i| i as f32))
        .map_err(|t| format!("expected a number, found {t}").into())
}

// 0-255 channel to 0.0-1.0.
fn channel(v: &Dynamic) -> ScriptResult<f32> {
    Ok((num(v)? / 255.0).clamp(0.0, 1.0))
}

fn hex_color(value: &str) -> ScriptResult<Rgba> {
    color::parse_hex(value)
        .ok_or_else(|| format!("'{value}' is not a valid hex color").into())
}

/// Accepts a flat `[x1, y1, x2, y2, ...]` list or a list of `[x, y]`
/// pairs, the way the canvas batch operations document it.
fn parse_points(values: &Array) -> ScriptResult<Vec<Point2>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    if values[0].is_array() {
        let mut points = Vec::with_capacity(values.len());
        for value in values {
            let pair = value
                .read_lock::<Array>()
                .ok_or_else(|| "expected a list of [x, y] pairs".to_string())?;
            if pair.len() != 2 {
                return Err("each point must be an [x, y] pair".into());
            }
            points.push(pt2(num(&pair[0])?, num(&pair[1])?));
        }
        return Ok(points);
    }

    if values.len() % 2 != 0 {
        return Err("a flat point list needs an even number of coordinates".into());
    }
    let mut points = Vec::with_capacity(values.len() / 2);
    for chunk in values.chunks(2) {
        points.push(pt2(num(&chunk[0])?, num(&chunk[1])?));
    }
    Ok(points)
}

/// Registers the canvas API into the provided Rhai `Engine`.
pub fn register_api(engine: &mut Engine) {
    engine.register_type_with_name::<CanvasHandle>("Canvas");

    // Randomness
    engine.register_fn("rand_float", |min: f64, max: f64| {
        use rand::Rng;
        if min < max {
            rand::thread_rng().gen_range(min..max)
        } else {
            min
        }
    });

    // Frame metadata
    engine.register_get("width", |c: &mut CanvasHandle| {
        c.inner.borrow().width() as f64
    });
    engine.register_get("height", |c: &mut CanvasHandle| {
        c.inner.borrow().height() as f64
    });
    engine.register_get("frame", |c: &mut CanvasHandle| {
        c.inner.borrow().frame() as i64
    });
    engine.register_get("time", |c: &mut CanvasHandle| c.inner.borrow().time() as f64);
    engine.register_get("dt", |c: &mut CanvasHandle| c.inner.borrow().dt() as f64);

    // Paint state
    engine.register_fn(
        "color",
        |c: &mut CanvasHandle, r: Dynamic, g: Dynamic, b: Dynamic| -> ScriptResult<()> {
            let color = rgba(channel(&r)?, channel(&g)?, channel(&b)?, 1.0);
            c.inner.borrow_mut().set_stroke(Some(color));
            Ok(())
        },
    );
    engine.register_fn(
        "color",
        |c: &mut CanvasHandle,
         r: Dynamic,
         g: Dynamic,
         b: Dynamic,
         a: Dynamic|
         -> ScriptResult<()> {
            let color = rgba(channel(&r)?, channel(&g)?, channel(&b)?, channel(&a)?);
            c.inner.borrow_mut().set_stroke(Some(color));
            Ok(())
        },
    );
    engine.register_fn(
        "color",
        |c: &mut CanvasHandle, hex: &str| -> ScriptResult<()> {
            let color = hex_color(hex)?;
            c.inner.borrow_mut().set_stroke(Some(color));
            Ok(())
        },
    );
    engine.register_fn("no_stroke", |c: &mut CanvasHandle| {
        c.inner.borrow_mut().set_stroke(None);
    });

    engine.register_fn(
        "fill",
        |c: &mut CanvasHandle, r: Dynamic, g: Dynamic, b: Dynamic| -> ScriptResult<()> {
            let color = rgba(channel(&r)?, channel(&g)?, channel(&b)?, 1.0);
            c.inner.borrow_mut().set_fill(Some(color));
            Ok(())
        },
    );
    engine.register_fn(
        "fill",
        |c: &mut CanvasHandle,
         r: Dynamic,
         g: Dynamic,
         b: Dynamic,
         a: Dynamic|
         -> ScriptResult<()> {
            let color = rgba(channel(&r)?, channel(&g)?, channel(&b)?, channel(&a)?);
            c.inner.borrow_mut().set_fill(Some(color));
            Ok(())
        },
    );
    engine.register_fn(
        "fill",
        |c: &mut CanvasHandle, hex: &str| -> ScriptResult<()> {
            let color = hex_color(hex)?;
            c.inner.borrow_mut().set_fill(Some(color));
            Ok(())
        },
    );
    engine.register_fn("no_fill", |c: &mut CanvasHandle| {
        c.inner.borrow_mut().set_fill(None);
    });

    engine.register_fn(
        "size",
        |c: &mut CanvasHandle, weight: Dynamic| -> ScriptResult<()> {
            c.inner.borrow_mut().set_weight(num(&weight)?);
            Ok(())
        },
    );

    // Draw commands
    engine.register_fn(
        "line",
        |c: &mut CanvasHandle,
         x1: Dynamic,
         y1: Dynamic,
         x2: Dynamic,
         y2: Dynamic|
         -> ScriptResult<()> {
            c.inner
                .borrow_mut()
                .line(num(&x1)?, num(&y1)?, num(&x2)?, num(&y2)?);
            Ok(())
        },
    );
    engine.register_fn(
        "point",
        |c: &mut CanvasHandle, x: Dynamic, y: Dynamic| -> ScriptResult<()> {
            c.inner.borrow_mut().point(num(&x)?, num(&y)?);
            Ok(())
        },
    );
    engine.register_fn(
        "points",
        |c: &mut CanvasHandle, values: Array| -> ScriptResult<()> {
            let points = parse_points(&values)?;
            c.inner.borrow_mut().points(&points);
            Ok(())
        },
    );
    engine.register_fn(
        "lines",
        |c: &mut CanvasHandle, values: Array| -> ScriptResult<()> {
            let points = parse_points(&values)?;
            c.inner.borrow_mut().polyline(points, false);
            Ok(())
        },
    );
    engine.register_fn(
        "lines",
        |c: &mut CanvasHandle, values: Array, closed: bool| -> ScriptResult<()> {
            let points = parse_points(&values)?;
            c.inner.borrow_mut().polyline(points, closed);
            Ok(())
        },
    );
    engine.register_fn(
        "polygon",
        |c: &mut CanvasHandle, values: Array| -> ScriptResult<()> {
            let points = parse_points(&values)?;
            c.inner.borrow_mut().polygon(points);
            Ok(())
        },
    );
    engine.register_fn(
        "box",
        |c: &mut CanvasHandle,
         x: Dynamic,
         y: Dynamic,
         w: Dynamic,
         h: Dynamic|
         -> ScriptResult<()> {
            c.inner
                .borrow_mut()
                .rect(num(&x)?, num(&y)?, num(&w)?, num(&h)?);
            Ok(())
        },
    );
    engine.register_fn(
        "rect",
        |c: &mut CanvasHandle,
         x1: Dynamic,
         y1: Dynamic,
         x2: Dynamic,
         y2: Dynamic|
         -> ScriptResult<()> {
            c.inner
                .borrow_mut()
                .rect_corners(num(&x1)?, num(&y1)?, num(&x2)?, num(&y2)?);
            Ok(())
        },
    );
    engine.register_fn(
        "circle",
        |c: &mut CanvasHandle, x: Dynamic, y: Dynamic, r: Dynamic| -> ScriptResult<()> {
            c.inner.borrow_mut().circle(num(&x)?, num(&y)?, num(&r)?);
            Ok(())
        },
    );
}
