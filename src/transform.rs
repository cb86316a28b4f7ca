//! # Concave-preserving transforms for density rejection
//! Gilks, W. R., & Wild, P. (1992).
//! [Adaptive Rejection Sampling for Gibbs Sampling](https://doi.org/10.2307/2347565).
//! *Applied Statistics*, 41(2), 337-348; and
//! Hörmann, W. (1995).
//! [A rejection technique for sampling from T-concave distributions](https://doi.org/10.1145/203082.203089).
//! *ACM Transactions on Mathematical Software*, 21(2), 182-193.
//!
//! A transform `T` maps the density into a space where it is concave, so
//! that tangents dominate it and secants stay below it. Everything the
//! envelope needs — mapping a tangent back to the original scale,
//! integrating under it in closed form, and inverting that integral — lives
//! here, parameterized by the transform variant.

use crate::Float;

/// The supported monotone concave-preserving transforms.
///
/// All three are increasing, so concavity of `T∘pdf` is exactly the
/// precondition for the tangents to dominate the density. `Power(c)`
/// requires `c` in `[-1, 0)`; the range is validated by the configuration,
/// not here. `InvSqrt` is the `c = -1/2` member of the power family kept as
/// its own variant for the common case.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Transform {
    /// `T(f) = log(f)` — for log-concave densities.
    Log,
    /// `T(f) = -1/sqrt(f)`.
    InvSqrt,
    /// `T(f) = -f^c` for `c` in `[-1, 0)`.
    Power(Float),
}

impl Transform {
    /// Map a density value into transformed space.
    pub fn forward(&self, f: Float) -> Float {
        match *self {
            Transform::Log => f.ln(),
            Transform::InvSqrt => -1.0 / f.sqrt(),
            Transform::Power(c) => -f.powf(c),
        }
    }

    /// Map a transformed value back to the density scale.
    ///
    /// For the negative-range transforms a value at or above zero is past
    /// the pole of `T⁻¹`; the hat is unbounded there and the result is
    /// infinite.
    pub fn inverse(&self, t: Float) -> Float {
        match *self {
            Transform::Log => t.exp(),
            Transform::InvSqrt => {
                if t < 0.0 {
                    1.0 / (t * t)
                } else {
                    Float::INFINITY
                }
            }
            Transform::Power(c) => {
                if t < 0.0 {
                    (-t).powf(1.0 / c)
                } else {
                    Float::INFINITY
                }
            }
        }
    }

    /// Derivative of `T∘pdf` at a point, from the density value and its
    /// derivative there.
    pub fn slope(&self, fx: Float, dfx: Float) -> Float {
        match *self {
            Transform::Log => dfx / fx,
            Transform::InvSqrt => 0.5 * dfx / (fx * fx.sqrt()),
            Transform::Power(c) => -c * fx.powf(c - 1.0) * dfx,
        }
    }

    /// Value of the mapped-back tangent at offset `dt` from the
    /// construction point.
    ///
    /// `fx`/`tfx` are the density and transformed density at the
    /// construction point, `slope` the tangent slope in transformed space.
    pub fn hat_value(&self, fx: Float, tfx: Float, slope: Float, dt: Float) -> Float {
        match *self {
            // Factored through fx so that extreme tfx never over/underflows.
            Transform::Log => fx * (slope * dt).exp(),
            _ => self.inverse(tfx + slope * dt),
        }
    }

    /// Area under the mapped-back tangent over the offset range
    /// `[dtl, dtr]` (offsets relative to the construction point; either end
    /// may be infinite).
    ///
    /// Returns `inf` whenever the hat is not integrable over the range — an
    /// unbounded tail with the wrong slope sign, or a tangent reaching the
    /// pole of `T⁻¹`. Callers turn that into an error instead of letting it
    /// contaminate the aggregate areas.
    pub fn area(&self, fx: Float, tfx: Float, slope: Float, dtl: Float, dtr: Float) -> Float {
        if slope == 0.0 {
            return if dtl.is_finite() && dtr.is_finite() {
                fx * (dtr - dtl)
            } else {
                Float::INFINITY
            };
        }
        match *self {
            Transform::Log => {
                let el = (slope * dtl).exp();
                let er = (slope * dtr).exp();
                if el > 0.0 && el.is_finite() {
                    fx / slope * el * (slope * (dtr - dtl)).exp_m1()
                } else {
                    fx * (er - el) / slope
                }
            }
            _ => {
                let (ul, ur) = match self.transformed_ends(tfx, slope, dtl, dtr) {
                    Some(ends) => ends,
                    None => return Float::INFINITY,
                };
                (self.phi_end(ur) - self.phi_end(ul)) / slope
            }
        }
    }

    /// Invert the area function: the offset `dt` such that the hat area
    /// over `[dtl, dt]` equals `r`.
    ///
    /// Precondition: the total area over the range is finite and
    /// `0 <= r <=` that area. A non-finite result (possible only at the
    /// extreme `r = 0` against an infinite left end) is the caller's cue to
    /// discard the draw.
    pub fn invert_area(&self, fx: Float, tfx: Float, slope: Float, dtl: Float, r: Float) -> Float {
        if slope == 0.0 {
            return dtl + r / fx;
        }
        match *self {
            Transform::Log => {
                let el = (slope * dtl).exp();
                if el > 0.0 && el.is_finite() {
                    dtl + (slope * r / (fx * el)).ln_1p() / slope
                } else {
                    (slope * r / fx).ln() / slope
                }
            }
            _ => {
                let ul = if dtl.is_finite() {
                    tfx + slope * dtl
                } else {
                    Float::NEG_INFINITY
                };
                let v = self.phi_end(ul) + slope * r;
                (self.phi_inv(v) - tfx) / slope
            }
        }
    }

    /// Transformed tangent values at both range ends, or `None` when the
    /// tangent leaves the valid (negative) range of `T⁻¹`.
    fn transformed_ends(
        &self,
        tfx: Float,
        slope: Float,
        dtl: Float,
        dtr: Float,
    ) -> Option<(Float, Float)> {
        let ul = if dtl.is_finite() {
            tfx + slope * dtl
        } else if slope > 0.0 {
            Float::NEG_INFINITY
        } else {
            return None;
        };
        let ur = if dtr.is_finite() {
            tfx + slope * dtr
        } else if slope < 0.0 {
            Float::NEG_INFINITY
        } else {
            return None;
        };
        if ul >= 0.0 || ur >= 0.0 {
            return None;
        }
        Some((ul, ur))
    }

    /// Antiderivative of `T⁻¹`, extended to the infinite end of the range.
    fn phi_end(&self, u: Float) -> Float {
        if u == Float::NEG_INFINITY {
            return match *self {
                // The hat tail of T(f) = -1/f has infinite mass.
                Transform::Power(c) if c == -1.0 => Float::NEG_INFINITY,
                _ => 0.0,
            };
        }
        self.phi(u)
    }

    /// Antiderivative of `T⁻¹` for `u < 0` (unused for `Log`, which takes
    /// the factored path).
    fn phi(&self, u: Float) -> Float {
        match *self {
            Transform::Log => u.exp(),
            Transform::InvSqrt => -1.0 / u,
            Transform::Power(c) => {
                if c == -1.0 {
                    -(-u).ln()
                } else {
                    -c / (1.0 + c) * (-u).powf((1.0 + c) / c)
                }
            }
        }
    }

    /// Inverse of [`Transform::phi`].
    fn phi_inv(&self, v: Float) -> Float {
        match *self {
            Transform::Log => v.ln(),
            Transform::InvSqrt => -1.0 / v,
            Transform::Power(c) => {
                if c == -1.0 {
                    -(-v).exp()
                } else {
                    let scale = -c / (1.0 + c);
                    -(v / scale).powf(c / (1.0 + c))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSFORMS: [Transform; 4] = [
        Transform::Log,
        Transform::InvSqrt,
        Transform::Power(-0.5),
        Transform::Power(-1.0),
    ];

    /// Midpoint-rule reference for the closed-form tangent areas.
    fn numeric_area(t: &Transform, fx: Float, tfx: Float, slope: Float, dtl: Float, dtr: Float) -> Float {
        let steps = 20_000;
        let width = (dtr - dtl) / steps as Float;
        let mut sum = 0.0;
        for i in 0..steps {
            let dt = dtl + (i as Float + 0.5) * width;
            sum += t.hat_value(fx, tfx, slope, dt) * width;
        }
        sum
    }

    #[test]
    fn round_trip_forward_inverse() {
        for t in TRANSFORMS {
            for &f in &[1e-6, 0.1, 0.5, 1.0, 3.0, 1e4] {
                let back = t.inverse(t.forward(f));
                assert!(
                    (back - f).abs() <= 1e-9 * f,
                    "{t:?}: round trip of {f} gave {back}"
                );
            }
        }
    }

    #[test]
    fn inv_sqrt_agrees_with_power_half() {
        let a = Transform::InvSqrt;
        let b = Transform::Power(-0.5);
        for &f in &[0.03, 0.7, 2.5] {
            assert!((a.forward(f) - b.forward(f)).abs() < 1e-12);
            assert!((a.slope(f, 0.3) - b.slope(f, 0.3)).abs() < 1e-12);
        }
        let (fx, dfx) = (0.8, -0.4);
        let tfx = a.forward(fx);
        let s = a.slope(fx, dfx);
        let area_a = a.area(fx, tfx, s, -0.5, 1.5);
        let area_b = b.area(fx, tfx, s, -0.5, 1.5);
        assert!((area_a - area_b).abs() < 1e-10 * area_a);
    }

    #[test]
    fn closed_form_area_matches_numeric_integration() {
        for t in TRANSFORMS {
            let (fx, dfx) = (0.6, -0.25);
            let tfx = t.forward(fx);
            let slope = t.slope(fx, dfx);
            let (dtl, dtr) = (-1.2, 2.0);

            let closed = t.area(fx, tfx, slope, dtl, dtr);
            let numeric = numeric_area(&t, fx, tfx, slope, dtl, dtr);
            assert!(
                (closed - numeric).abs() < 1e-4 * closed,
                "{t:?}: closed {closed} vs numeric {numeric}"
            );
        }
    }

    #[test]
    fn area_of_flat_tangent_is_a_rectangle() {
        for t in TRANSFORMS {
            let fx = 0.9;
            let tfx = t.forward(fx);
            let area = t.area(fx, tfx, 0.0, -1.0, 3.0);
            assert!((area - fx * 4.0).abs() < 1e-12, "{t:?}: got {area}");
            assert_eq!(t.area(fx, tfx, 0.0, Float::NEG_INFINITY, 0.0), Float::INFINITY);
        }
    }

    #[test]
    fn invert_area_inverts_area() {
        for t in TRANSFORMS {
            let (fx, dfx) = (0.7, -0.2);
            let tfx = t.forward(fx);
            let slope = t.slope(fx, dfx);
            let dtl = -0.8;
            for &dt in &[-0.5, 0.0, 0.4, 1.1] {
                let r = t.area(fx, tfx, slope, dtl, dt);
                let back = t.invert_area(fx, tfx, slope, dtl, r);
                assert!(
                    (back - dt).abs() < 1e-8,
                    "{t:?}: inverting area {r} gave {back}, expected {dt}"
                );
            }
        }
    }

    #[test]
    fn falling_log_tangent_has_finite_right_tail() {
        // Tangent e^{-dt}: area over [0, inf) is exactly fx.
        let t = Transform::Log;
        let fx = 2.0;
        let tfx = t.forward(fx);
        let area = t.area(fx, tfx, -1.0, 0.0, Float::INFINITY);
        assert!((area - fx).abs() < 1e-12, "got {area}");

        // And inversion lands at -ln(1 - r/fx).
        let r = 0.5 * fx;
        let dt = t.invert_area(fx, tfx, -1.0, 0.0, r);
        assert!((dt - (2.0 as Float).ln()).abs() < 1e-12, "got {dt}");
    }

    #[test]
    fn rising_tail_into_the_pole_is_unbounded() {
        // A rising tangent eventually crosses the pole of the negative-range
        // transforms, and has un-integrable mass for Log too.
        for t in TRANSFORMS {
            let fx = 0.5;
            let tfx = t.forward(fx);
            let area = t.area(fx, tfx, 0.3, 0.0, Float::INFINITY);
            assert_eq!(area, Float::INFINITY, "{t:?}");
        }
    }

    #[test]
    fn infinite_falling_tail_is_finite_except_reciprocal() {
        for t in [Transform::Log, Transform::InvSqrt, Transform::Power(-0.5)] {
            let fx = 1.0;
            let tfx = t.forward(fx);
            let area = t.area(fx, tfx, -0.7, 0.0, Float::INFINITY);
            assert!(area.is_finite() && area > 0.0, "{t:?}: got {area}");
        }
        // T(f) = -1/f cannot integrate an unbounded tail.
        let t = Transform::Power(-1.0);
        let area = t.area(1.0, t.forward(1.0), -0.7, 0.0, Float::INFINITY);
        assert_eq!(area, Float::INFINITY);
    }

    #[test]
    fn tangent_crossing_the_pole_reports_unbounded() {
        let t = Transform::InvSqrt;
        let fx = 1.0;
        let tfx = t.forward(fx); // -1
        // Slope 2 reaches u = 0 at dt = 0.5, inside the range.
        assert_eq!(t.area(fx, tfx, 2.0, 0.0, 1.0), Float::INFINITY);
    }
}
