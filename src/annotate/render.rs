//! Cairo rendering for annotation strokes.

use std::f64::consts::PI;

use cairo::{Context, LineCap, LineJoin};

use super::stroke::{Pen, Stroke};

/// Renders strokes in order (first = bottom).
pub fn render_strokes(ctx: &Context, strokes: &[Stroke]) -> Result<(), cairo::Error> {
    for stroke in strokes {
        render_stroke(ctx, stroke)?;
    }
    Ok(())
}

pub fn render_stroke(ctx: &Context, stroke: &Stroke) -> Result<(), cairo::Error> {
    match stroke {
        Stroke::Freehand { points, pen } => render_polyline(ctx, points, *pen),
        Stroke::Line { from, to, pen } => render_polyline(ctx, &[*from, *to], *pen),
        Stroke::Rect { x, y, w, h, pen } => {
            apply_pen(ctx, *pen);
            ctx.set_line_join(LineJoin::Miter);
            let (x, w) = normalize_span(*x, *w);
            let (y, h) = normalize_span(*y, *h);
            ctx.rectangle(x, y, w, h);
            ctx.stroke()
        }
        Stroke::Ellipse {
            cx,
            cy,
            rx,
            ry,
            pen,
        } => {
            if *rx == 0 || *ry == 0 {
                return Ok(());
            }
            apply_pen(ctx, *pen);
            ctx.save()?;
            ctx.translate(*cx as f64, *cy as f64);
            ctx.scale(*rx as f64, *ry as f64);
            ctx.arc(0.0, 0.0, 1.0, 0.0, 2.0 * PI);
            ctx.restore()?;
            ctx.stroke()
        }
        Stroke::Arrow {
            tip,
            tail,
            pen,
            head_length,
            head_angle_degrees,
        } => {
            render_polyline(ctx, &[*tail, *tip], *pen)?;
            let [left, right] = arrowhead_points(*tip, *tail, *head_length, *head_angle_degrees);
            apply_pen(ctx, *pen);
            ctx.move_to(left.0, left.1);
            ctx.line_to(tip.0 as f64, tip.1 as f64);
            ctx.line_to(right.0, right.1);
            ctx.stroke()
        }
    }
}

/// Computes the two barb endpoints of an arrowhead at `tip`.
///
/// The barb length is capped at 30% of the shaft so short arrows stay readable.
/// Degenerate shafts (< 1px) collapse both barbs onto the tip.
pub fn arrowhead_points(
    tip: (i32, i32),
    tail: (i32, i32),
    length: f64,
    angle_degrees: f64,
) -> [(f64, f64); 2] {
    let (tx, ty) = (tip.0 as f64, tip.1 as f64);
    let dx = tx - tail.0 as f64;
    let dy = ty - tail.1 as f64;
    let shaft = dx.hypot(dy);
    if shaft < 1.0 {
        return [(tx, ty), (tx, ty)];
    }

    let (ux, uy) = (dx / shaft, dy / shaft);
    let barb = length.min(shaft * 0.3);
    let (sin_a, cos_a) = angle_degrees.to_radians().sin_cos();

    [
        (
            tx - barb * (ux * cos_a - uy * sin_a),
            ty - barb * (uy * cos_a + ux * sin_a),
        ),
        (
            tx - barb * (ux * cos_a + uy * sin_a),
            ty - barb * (uy * cos_a - ux * sin_a),
        ),
    ]
}

fn render_polyline(ctx: &Context, points: &[(i32, i32)], pen: Pen) -> Result<(), cairo::Error> {
    let Some((&(x0, y0), rest)) = points.split_first() else {
        return Ok(());
    };

    apply_pen(ctx, pen);
    ctx.set_line_join(LineJoin::Round);
    ctx.move_to(x0 as f64, y0 as f64);
    if rest.is_empty() {
        // A single sample still leaves a dot
        ctx.line_to(x0 as f64, y0 as f64);
    }
    for &(x, y) in rest {
        ctx.line_to(x as f64, y as f64);
    }
    ctx.stroke()
}

fn apply_pen(ctx: &Context, pen: Pen) {
    pen.color.apply(ctx);
    ctx.set_line_width(pen.thickness);
    ctx.set_line_cap(LineCap::Round);
}

fn normalize_span(origin: i32, size: i32) -> (f64, f64) {
    if size >= 0 {
        (origin as f64, size as f64)
    } else {
        ((origin + size) as f64, (-size) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrowhead_is_symmetric_around_shaft() {
        let [left, right] = arrowhead_points((100, 0), (0, 0), 10.0, 30.0);
        assert!((left.0 - right.0).abs() < 1e-9);
        assert!((left.1 + right.1).abs() < 1e-9);
        assert!(left.0 < 100.0);
    }

    #[test]
    fn arrowhead_is_capped_on_short_shafts() {
        let [left, _] = arrowhead_points((10, 0), (0, 0), 50.0, 0.0);
        assert!((left.0 - 7.0).abs() < 1e-9, "barb should be 30% of 10px");
    }

    #[test]
    fn degenerate_arrow_collapses_to_tip() {
        let points = arrowhead_points((5, 5), (5, 5), 20.0, 30.0);
        assert_eq!(points, [(5.0, 5.0), (5.0, 5.0)]);
    }

    #[test]
    fn negative_rect_spans_are_normalized() {
        assert_eq!(normalize_span(10, -4), (6.0, 4.0));
        assert_eq!(normalize_span(10, 4), (10.0, 4.0));
    }
}
