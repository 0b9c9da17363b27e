use sv_core::{Point2f, Vec2f};

/// Cubic Bernstein basis at `t`.
#[inline]
pub fn bernstein(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p0: Point2f,
    pub p1: Point2f,
    pub p2: Point2f,
    pub p3: Point2f,
}

impl CubicBezier {
    pub fn new(p0: Point2f, p1: Point2f, p2: Point2f, p3: Point2f) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Straight segment with inner controls at 1/3 and 2/3.
    pub fn line(p0: Point2f, p3: Point2f) -> Self {
        Self {
            p0,
            p1: p0.lerp(p3, 1.0 / 3.0),
            p2: p0.lerp(p3, 2.0 / 3.0),
            p3,
        }
    }

    pub fn eval(&self, t: f32) -> Point2f {
        let [b0, b1, b2, b3] = bernstein(t);
        Point2f {
            x: b0 * self.p0.x + b1 * self.p1.x + b2 * self.p2.x + b3 * self.p3.x,
            y: b0 * self.p0.y + b1 * self.p1.y + b2 * self.p2.y + b3 * self.p3.y,
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            p0: self.p3,
            p1: self.p2,
            p2: self.p1,
            p3: self.p0,
        }
    }

    /// Direction in which the curve leaves `p0`; zero for a point curve.
    pub fn start_tangent(&self) -> Vec2f {
        leaving_direction(self.p0, [self.p1, self.p2, self.p3])
    }

    /// Direction in which the curve leaves `p3` when walked backwards.
    pub fn end_tangent(&self) -> Vec2f {
        leaving_direction(self.p3, [self.p2, self.p1, self.p0])
    }

    pub fn control_points(&self) -> [Point2f; 4] {
        [self.p0, self.p1, self.p2, self.p3]
    }
}

fn leaving_direction(from: Point2f, towards: [Point2f; 3]) -> Vec2f {
    for p in towards {
        let d = p - from;
        if d.norm() > 1e-6 {
            return d.normalize();
        }
    }
    Vec2f::default()
}
