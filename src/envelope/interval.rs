//! Envelope segments.
//!
//! One interval per construction point. The interval anchored at `x` owns
//! the span between the transformed-space intersection points of its
//! tangent with the neighbouring tangents (or the domain boundary at the
//! outer ends), so the spans tile the domain and the hat over a span is a
//! single mapped-back tangent line.

use crate::transform::Transform;
use crate::Float;

/// The squeeze attached to an interval's span.
#[derive(Debug, Copy, Clone)]
pub enum Squeeze {
    /// Transformed secants toward the previous/next construction point,
    /// both anchored at `(x, tfx)`. `None` on a side without a neighbour;
    /// the squeeze is zero there.
    Secant {
        left: Option<Float>,
        right: Option<Float>,
    },
    /// Squeeze proportional to the hat on the whole span: the smallest
    /// density/hat ratio at the span's finite ends.
    Proportional { ratio: Float },
}

/// One segment of the envelope, anchored at a construction point.
#[derive(Debug, Copy, Clone)]
pub struct Interval {
    /// Construction point.
    pub(crate) x: Float,
    /// Density at the construction point.
    pub(crate) fx: Float,
    /// Transformed density at the construction point.
    pub(crate) tfx: Float,
    /// Tangent slope in transformed space.
    pub(crate) dtfx: Float,
    /// Left end of the span (previous intersection point, or the domain
    /// boundary; may be -inf).
    pub(crate) xl: Float,
    /// Right end of the span (may be +inf).
    pub(crate) xr: Float,
    /// Squeeze descriptor for this span.
    pub(crate) squeeze: Squeeze,
    /// Hat area over `[xl, x]`.
    pub(crate) a_hat_left: Float,
    /// Hat area over `[x, xr]`.
    pub(crate) a_hat_right: Float,
    /// Squeeze area over the span.
    pub(crate) a_squeeze: Float,
    /// Hat area of all intervals up to and including this one.
    pub(crate) a_cum: Float,
}

impl Interval {
    /// Tangent skeleton at a construction point; span, squeeze and areas
    /// are filled in by the envelope once the neighbours are known.
    pub(crate) fn at(x: Float, fx: Float, dfx: Float, transform: &Transform) -> Self {
        Self {
            x,
            fx,
            tfx: transform.forward(fx),
            dtfx: transform.slope(fx, dfx),
            xl: x,
            xr: x,
            squeeze: Squeeze::Secant {
                left: None,
                right: None,
            },
            a_hat_left: 0.0,
            a_hat_right: 0.0,
            a_squeeze: 0.0,
            a_cum: 0.0,
        }
    }

    /// The construction point.
    pub fn x(&self) -> Float {
        self.x
    }

    /// Total hat area over the span.
    pub fn a_hat(&self) -> Float {
        self.a_hat_left + self.a_hat_right
    }

    /// Squeeze area over the span.
    pub fn a_squeeze(&self) -> Float {
        self.a_squeeze
    }

    /// Cumulative hat area up to and including this interval.
    pub fn a_cum(&self) -> Float {
        self.a_cum
    }

    /// Hat value at `x` (valid on the span).
    pub fn hat_value(&self, transform: &Transform, x: Float) -> Float {
        transform.hat_value(self.fx, self.tfx, self.dtfx, x - self.x)
    }

    /// Squeeze value at `x` (valid on the span; zero where no squeeze
    /// exists).
    pub fn squeeze_value(&self, transform: &Transform, x: Float) -> Float {
        match self.squeeze {
            Squeeze::Secant { left, right } => {
                let dt = x - self.x;
                let side = if dt < 0.0 { left } else { right };
                match side {
                    Some(slope) => transform.hat_value(self.fx, self.tfx, slope, dt),
                    None => 0.0,
                }
            }
            Squeeze::Proportional { ratio } => ratio * self.hat_value(transform, x),
        }
    }

    /// The proportional squeeze ratio, or zero for the secant variant.
    pub(crate) fn squeeze_ratio(&self) -> Float {
        match self.squeeze {
            Squeeze::Proportional { ratio } => ratio,
            Squeeze::Secant { .. } => 0.0,
        }
    }

    /// Invert the hat restricted to the span: the abscissa splitting the
    /// span's hat area into `r` (left) and `a_hat() - r` (right).
    ///
    /// The result is clamped into the span; a non-finite value (possible
    /// only for `r = 0` against an infinite left end) signals the caller to
    /// discard the draw.
    pub(crate) fn invert(&self, transform: &Transform, r: Float) -> Float {
        let r = r.clamp(0.0, self.a_hat());
        let dt = transform.invert_area(self.fx, self.tfx, self.dtfx, self.xl - self.x, r);
        (self.x + dt).clamp(self.xl, self.xr)
    }
}
