//! The adaptive hat/squeeze envelope.
//!
//! An ordered sequence of [`Interval`]s whose spans tile the domain, plus
//! the aggregate hat and squeeze areas. The only mutation is the insertion
//! of a new construction point; everything an insertion needs is computed
//! into temporaries and validated before the sequence is touched, so a
//! declined insertion leaves the envelope exactly as it was.

use crate::config::Variant;
use crate::density::Density;
use crate::transform::Transform;
use crate::{Float, REL_TOL};

pub mod guide;
pub mod interval;

pub use guide::GuideTable;
pub use interval::{Interval, Squeeze};

/// Errors raised while constructing envelope intervals.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeError {
    /// The hat has unbounded area: a tail tangent with the wrong slope
    /// sign, or a tangent reaching the pole of the transform inverse.
    UnboundedHat,
    /// Adjacent tangent slopes are ordered the wrong way; the transformed
    /// density is not concave at the construction points. Only raised in
    /// pedantic mode.
    NotConcave,
    /// The envelope degenerates to zero or non-finite total area.
    Degenerate,
}

impl std::fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnboundedHat => {
                write!(f, "hat has unbounded area (wrong tail slope or transform pole reached)")
            }
            Self::NotConcave => {
                write!(f, "transformed density is not concave at the construction points")
            }
            Self::Degenerate => write!(f, "envelope has zero or non-finite total area"),
        }
    }
}

impl std::error::Error for EnvelopeError {}

/// The piecewise hat/squeeze envelope over a density's domain.
#[derive(Debug, Clone)]
pub struct Envelope {
    transform: Transform,
    variant: Variant,
    domain: (Float, Float),
    intervals: Vec<Interval>,
    a_total: Float,
    a_squeeze_total: Float,
    pedantic: bool,
}

impl Envelope {
    /// Build the initial envelope from construction points.
    ///
    /// `points` are `(x, pdf(x), dpdf(x))` triples, strictly increasing in
    /// `x`, all with positive finite density; the setup engine is
    /// responsible for screening them.
    pub fn from_points<D: Density>(
        transform: Transform,
        variant: Variant,
        domain: (Float, Float),
        points: &[(Float, Float, Float)],
        density: &D,
        pedantic: bool,
    ) -> Result<Self, EnvelopeError> {
        debug_assert!(points.len() >= 2);

        let skeletons: Vec<Interval> = points
            .iter()
            .map(|&(x, fx, dfx)| Interval::at(x, fx, dfx, &transform))
            .collect();
        if skeletons
            .iter()
            .any(|iv| !iv.tfx.is_finite() || !iv.dtfx.is_finite())
        {
            return Err(EnvelopeError::Degenerate);
        }

        let n = skeletons.len();
        let mut intervals = Vec::with_capacity(n);
        for i in 0..n {
            let prev = if i > 0 { Some(&skeletons[i - 1]) } else { None };
            let next = skeletons.get(i + 1);
            let iv = Self::rebuilt(
                &transform,
                variant,
                domain,
                &skeletons[i],
                prev,
                next,
                density,
                pedantic,
            )?;
            if !(iv.a_hat() > 0.0) {
                return Err(EnvelopeError::Degenerate);
            }
            intervals.push(iv);
        }

        let mut envelope = Self {
            transform,
            variant,
            domain,
            intervals,
            a_total: 0.0,
            a_squeeze_total: 0.0,
            pedantic,
        };
        envelope.refresh_cumulative();
        if !envelope.a_total.is_finite() || envelope.a_total <= 0.0 {
            return Err(EnvelopeError::Degenerate);
        }
        Ok(envelope)
    }

    /// Insert a new construction point, splitting the interval containing
    /// it. Returns whether the point was actually inserted.
    ///
    /// The point is declined (and the envelope left untouched) when its
    /// density value is unusable, it is indistinguishable from an existing
    /// construction point, or the updated intervals would not validate.
    pub fn insert<D: Density>(&mut self, x: Float, fx: Float, density: &D) -> bool {
        if !x.is_finite() || !fx.is_finite() || fx <= 0.0 {
            return false;
        }
        let (lo, hi) = self.domain;
        if x < lo || x > hi {
            return false;
        }

        let p = self.intervals.partition_point(|iv| iv.x < x);
        let tol = REL_TOL * (1.0 + x.abs());
        if p > 0 && x - self.intervals[p - 1].x <= tol {
            return false;
        }
        if p < self.intervals.len() && self.intervals[p].x - x <= tol {
            return false;
        }

        let dfx = density.dpdf(x);
        if !dfx.is_finite() {
            return false;
        }
        let skeleton = Interval::at(x, fx, dfx, &self.transform);
        if !skeleton.tfx.is_finite() || !skeleton.dtfx.is_finite() {
            return false;
        }

        // Compute the new interval and the updated neighbours into
        // temporaries; nothing is committed until all of them validate.
        let prev = if p > 0 {
            Some(self.intervals[p - 1])
        } else {
            None
        };
        let next = self.intervals.get(p).copied();

        let new_iv = match Self::rebuilt(
            &self.transform,
            self.variant,
            self.domain,
            &skeleton,
            prev.as_ref(),
            next.as_ref(),
            density,
            self.pedantic,
        ) {
            Ok(iv) if iv.a_hat() > 0.0 => iv,
            _ => return false,
        };

        let new_prev = match prev.as_ref() {
            Some(pv) => {
                let prev_prev = if p >= 2 {
                    Some(self.intervals[p - 2])
                } else {
                    None
                };
                match Self::rebuilt(
                    &self.transform,
                    self.variant,
                    self.domain,
                    pv,
                    prev_prev.as_ref(),
                    Some(&skeleton),
                    density,
                    self.pedantic,
                ) {
                    Ok(iv) if iv.a_hat() > 0.0 => Some(iv),
                    _ => return false,
                }
            }
            None => None,
        };

        let new_next = match next.as_ref() {
            Some(nx) => {
                let next_next = self.intervals.get(p + 1).copied();
                match Self::rebuilt(
                    &self.transform,
                    self.variant,
                    self.domain,
                    nx,
                    Some(&skeleton),
                    next_next.as_ref(),
                    density,
                    self.pedantic,
                ) {
                    Ok(iv) if iv.a_hat() > 0.0 => Some(iv),
                    _ => return false,
                }
            }
            None => None,
        };

        if let Some(iv) = new_prev {
            self.intervals[p - 1] = iv;
        }
        if let Some(iv) = new_next {
            self.intervals[p] = iv;
        }
        self.intervals.insert(p, new_iv);
        self.refresh_cumulative();
        true
    }

    /// Recompute the cumulative areas and the exact aggregate totals.
    ///
    /// Called after every change to the interval sequence, so the
    /// cumulative areas the guide table and the sampler see are always
    /// consistent with the sequence.
    pub fn refresh_cumulative(&mut self) {
        let mut cum = 0.0;
        let mut squeeze = 0.0;
        for iv in &mut self.intervals {
            cum += iv.a_hat_left + iv.a_hat_right;
            iv.a_cum = cum;
            squeeze += iv.a_squeeze;
        }
        self.a_total = cum;
        self.a_squeeze_total = squeeze;
    }

    /// Number of intervals (= construction points).
    pub fn n(&self) -> usize {
        self.intervals.len()
    }

    /// Total hat area.
    pub fn total_hat(&self) -> Float {
        self.a_total
    }

    /// Total squeeze area.
    pub fn total_squeeze(&self) -> Float {
        self.a_squeeze_total
    }

    /// Global squeeze/hat area ratio, the envelope's quality measure.
    pub fn squeeze_ratio(&self) -> Float {
        if self.a_total > 0.0 {
            self.a_squeeze_total / self.a_total
        } else {
            0.0
        }
    }

    /// The interval at `idx`.
    pub fn interval(&self, idx: usize) -> &Interval {
        &self.intervals[idx]
    }

    /// All intervals in ascending-`x` order.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Cumulative hat area of all intervals before `idx`.
    pub fn cum_before(&self, idx: usize) -> Float {
        if idx == 0 {
            0.0
        } else {
            self.intervals[idx - 1].a_cum
        }
    }

    /// The active transform.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// The active squeeze variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// The density's domain.
    pub fn domain(&self) -> (Float, Float) {
        self.domain
    }

    /// Full invariant walk: ordering, span tiling, area signs, cumulative
    /// consistency. Used by pedantic mode and tests.
    pub fn check_invariants(&self) -> bool {
        let n = self.intervals.len();
        if n == 0 || !self.a_total.is_finite() || self.a_total <= 0.0 {
            return false;
        }
        let mut prev_cum = 0.0;
        for (i, iv) in self.intervals.iter().enumerate() {
            if !(iv.xl <= iv.x && iv.x <= iv.xr) {
                return false;
            }
            if i > 0 {
                let before = &self.intervals[i - 1];
                if !(before.x < iv.x) {
                    return false;
                }
                let tol = REL_TOL * (1.0 + iv.xl.abs());
                if (before.xr - iv.xl).abs() > tol {
                    return false;
                }
            }
            let a_hat = iv.a_hat();
            if !a_hat.is_finite() || a_hat < 0.0 || !iv.a_squeeze.is_finite() || iv.a_squeeze < 0.0
            {
                return false;
            }
            if iv.a_squeeze > a_hat * (1.0 + REL_TOL) {
                return false;
            }
            if !(iv.a_cum > prev_cum) {
                return false;
            }
            prev_cum = iv.a_cum;
        }
        let last = self.intervals[n - 1].a_cum;
        (last - self.a_total).abs() <= REL_TOL * self.a_total
            && self.a_squeeze_total <= self.a_total * (1.0 + REL_TOL)
    }

    /// Recompute span, squeeze and areas for one interval against its
    /// neighbours, into a fresh value.
    #[allow(clippy::too_many_arguments)]
    fn rebuilt<D: Density>(
        transform: &Transform,
        variant: Variant,
        domain: (Float, Float),
        iv: &Interval,
        prev: Option<&Interval>,
        next: Option<&Interval>,
        density: &D,
        pedantic: bool,
    ) -> Result<Interval, EnvelopeError> {
        let mut out = *iv;
        out.xl = match prev {
            Some(p) => Self::intersection(p, iv, pedantic)?,
            None => domain.0,
        };
        out.xr = match next {
            Some(nx) => Self::intersection(iv, nx, pedantic)?,
            None => domain.1,
        };

        out.a_hat_left = transform.area(iv.fx, iv.tfx, iv.dtfx, out.xl - iv.x, 0.0);
        out.a_hat_right = transform.area(iv.fx, iv.tfx, iv.dtfx, 0.0, out.xr - iv.x);
        if !out.a_hat_left.is_finite()
            || !out.a_hat_right.is_finite()
            || out.a_hat_left < 0.0
            || out.a_hat_right < 0.0
        {
            return Err(EnvelopeError::UnboundedHat);
        }

        match variant {
            Variant::Secant => {
                let left = prev.map(|p| Self::secant_slope(p, iv));
                let right = next.map(|nx| Self::secant_slope(iv, nx));
                let mut a_squeeze = 0.0;
                if let Some(slope) = left {
                    a_squeeze += transform.area(iv.fx, iv.tfx, slope, out.xl - iv.x, 0.0);
                }
                if let Some(slope) = right {
                    a_squeeze += transform.area(iv.fx, iv.tfx, slope, 0.0, out.xr - iv.x);
                }
                out.squeeze = Squeeze::Secant { left, right };
                out.a_squeeze = a_squeeze;
            }
            Variant::Proportional | Variant::ImmediateAcceptance => {
                // The proportional squeeze covers the whole span, so an
                // infinite span end forces the ratio to zero.
                let mut ratio: Float = 1.0;
                for end in [out.xl, out.xr] {
                    if !end.is_finite() {
                        ratio = 0.0;
                        break;
                    }
                    let hat = out.hat_value(transform, end);
                    if hat.is_finite() && hat > 0.0 {
                        let r = density.pdf(end) / hat;
                        if r.is_finite() {
                            ratio = ratio.min(r.clamp(0.0, 1.0));
                        } else {
                            ratio = 0.0;
                        }
                    } else {
                        ratio = 0.0;
                    }
                }
                out.squeeze = Squeeze::Proportional { ratio };
                out.a_squeeze = ratio * out.a_hat();
            }
        }

        if !out.a_squeeze.is_finite() {
            return Err(EnvelopeError::UnboundedHat);
        }
        out.a_squeeze = out.a_squeeze.clamp(0.0, out.a_hat());
        Ok(out)
    }

    /// Abscissa where the tangents of two adjacent construction points
    /// intersect in transformed space; clamped into `[a.x, b.x]`.
    ///
    /// Parallel tangents meet nowhere and the midpoint serves instead;
    /// slopes ordered against concavity fall back to the midpoint too,
    /// unless pedantic mode turns them into an error.
    fn intersection(a: &Interval, b: &Interval, pedantic: bool) -> Result<Float, EnvelopeError> {
        let ds = a.dtfx - b.dtfx;
        let scale = a.dtfx.abs().max(b.dtfx.abs());
        let mid = 0.5 * (a.x + b.x);
        if !ds.is_finite() {
            return Err(EnvelopeError::Degenerate);
        }
        if scale == 0.0 || ds.abs() <= scale * REL_TOL {
            return Ok(mid);
        }
        if ds < 0.0 {
            if pedantic {
                return Err(EnvelopeError::NotConcave);
            }
            return Ok(mid);
        }
        let z = (b.tfx - b.dtfx * b.x - a.tfx + a.dtfx * a.x) / ds;
        if !z.is_finite() {
            return Ok(mid);
        }
        Ok(z.clamp(a.x, b.x))
    }

    /// Slope of the transformed secant between two construction points.
    fn secant_slope(a: &Interval, b: &Interval) -> Float {
        (b.tfx - a.tfx) / (b.x - a.x)
    }
}
