use super::color::Color;

/// Color and line width shared by every stroke kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub thickness: f64,
}

impl Pen {
    pub fn new(color: Color, thickness: f64) -> Self {
        Self { color, thickness }
    }
}

/// A finished annotation stroke in canvas pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Stroke {
    /// Polyline through the sampled pointer positions
    Freehand { points: Vec<(i32, i32)>, pen: Pen },
    Line {
        from: (i32, i32),
        to: (i32, i32),
        pen: Pen,
    },
    /// Outline rectangle; negative sizes extend left/up from the origin
    Rect {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        pen: Pen,
    },
    Ellipse {
        cx: i32,
        cy: i32,
        rx: i32,
        ry: i32,
        pen: Pen,
    },
    /// Line with the arrowhead at `tip`
    Arrow {
        tip: (i32, i32),
        tail: (i32, i32),
        pen: Pen,
        head_length: f64,
        head_angle_degrees: f64,
    },
}

impl Stroke {
    pub fn pen(&self) -> Pen {
        match self {
            Stroke::Freehand { pen, .. }
            | Stroke::Line { pen, .. }
            | Stroke::Rect { pen, .. }
            | Stroke::Ellipse { pen, .. }
            | Stroke::Arrow { pen, .. } => *pen,
        }
    }
}
