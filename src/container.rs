//! The box (or circle) bodies live in.

use crate::float::Float;
use crate::params::SimulationParams;
use crate::vec::Vec2;

/// Canvas extent, margin and shape of the container.
///
/// Clamping is positional: a point outside is moved back onto the boundary
/// and loses the velocity component that carried it out.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Container<F: Float> {
    pub width: F,
    pub height: F,
    pub margin: F,
    pub rounded: bool,
}

impl<F: Float> Container<F> {
    pub fn new(width: F, height: F, margin: F, rounded: bool) -> Self {
        Container { width, height, margin, rounded }
    }

    pub fn from_params(params: &SimulationParams) -> Self {
        Container {
            width: F::from_f32(params.canvas_width),
            height: F::from_f32(params.canvas_height),
            margin: F::from_f32(params.container_margin),
            rounded: params.rounded,
        }
    }

    pub fn center(&self) -> Vec2<F> {
        Vec2::new(self.width * F::half(), self.height * F::half())
    }

    /// Radius of the inscribed circle minus the margin.
    pub fn radius(&self) -> F {
        (self.width.min(self.height) * F::half() - self.margin).max(F::zero())
    }

    /// Axis-aligned bounds `(min, max)` inside the margin.
    pub fn bounds(&self) -> (Vec2<F>, Vec2<F>) {
        let min = Vec2::new(self.margin, self.margin);
        let max = Vec2::new(
            (self.width - self.margin).max(self.margin),
            (self.height - self.margin).max(self.margin),
        );
        (min, max)
    }

    /// Whether `p` is inside, allowing `slack` past the boundary.
    pub fn contains(&self, p: Vec2<F>, slack: F) -> bool {
        if self.rounded {
            let r = self.radius() + slack;
            p.distance_sq(self.center()) <= r * r
        } else {
            let (min, max) = self.bounds();
            p.x >= min.x - slack && p.x <= max.x + slack && p.y >= min.y - slack && p.y <= max.y + slack
        }
    }

    /// Move `pos` back inside. Returns true if it had escaped.
    pub fn confine(&self, pos: &mut Vec2<F>, vel: &mut Vec2<F>) -> bool {
        if self.rounded {
            self.confine_circle(pos, vel)
        } else {
            self.confine_rect(pos, vel)
        }
    }

    fn confine_rect(&self, pos: &mut Vec2<F>, vel: &mut Vec2<F>) -> bool {
        let (min, max) = self.bounds();
        let mut hit = false;
        if pos.x < min.x {
            pos.x = min.x;
            vel.x = vel.x.max(F::zero());
            hit = true;
        } else if pos.x > max.x {
            pos.x = max.x;
            vel.x = vel.x.min(F::zero());
            hit = true;
        }
        if pos.y < min.y {
            pos.y = min.y;
            vel.y = vel.y.max(F::zero());
            hit = true;
        } else if pos.y > max.y {
            pos.y = max.y;
            vel.y = vel.y.min(F::zero());
            hit = true;
        }
        hit
    }

    fn confine_circle(&self, pos: &mut Vec2<F>, vel: &mut Vec2<F>) -> bool {
        let center = self.center();
        let r = self.radius();
        let offset = *pos - center;
        let dist_sq = offset.length_sq();
        if dist_sq <= r * r {
            return false;
        }
        let normal = offset.normalize();
        *pos = center + normal.scale(r);
        let outward = vel.dot(normal);
        if outward > F::zero() {
            *vel -= normal.scale(outward);
        }
        true
    }
}
