//! Setup engine: from configuration and density to a ready generator.
//!
//! Assembles the starting construction points, screens them against the
//! density, builds the initial envelope, optionally pre-refines it
//! deterministically (DARS) until the squeeze target or the interval cap is
//! reached, and hands back a [`Generator`] with a fresh guide table.

use crate::config::{Config, ConfigError};
use crate::density::Density;
use crate::envelope::{Envelope, EnvelopeError, GuideTable, Interval};
use crate::generator::Generator;
use crate::transform::Transform;
use crate::{Float, REL_TOL};

/// Errors for a failed setup. No generator is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    /// The configuration is invalid; rejected before any density call.
    Config(ConfigError),
    /// The density's domain is empty, reversed or NaN.
    InvalidDomain { lo: Float, hi: Float },
    /// Fewer than two starting points carry a positive finite density.
    PdfNotPositive,
    /// The hat has unbounded area over the domain.
    UnboundedHat,
    /// The transformed density is not concave at the construction points
    /// (pedantic mode only).
    NotConcave,
    /// The envelope degenerates to zero or non-finite total area.
    DegenerateEnvelope,
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::InvalidDomain { lo, hi } => {
                write!(f, "domain is empty or reversed: [{lo}, {hi}]")
            }
            Self::PdfNotPositive => {
                write!(f, "density is not positive and finite at two or more starting points")
            }
            Self::UnboundedHat => {
                write!(f, "hat has unbounded area (wrong tail slope or transform pole reached)")
            }
            Self::NotConcave => {
                write!(f, "transformed density is not concave at the construction points")
            }
            Self::DegenerateEnvelope => {
                write!(f, "envelope has zero or non-finite total area")
            }
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SetupError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<EnvelopeError> for SetupError {
    fn from(e: EnvelopeError) -> Self {
        match e {
            EnvelopeError::UnboundedHat => Self::UnboundedHat,
            EnvelopeError::NotConcave => Self::NotConcave,
            EnvelopeError::Degenerate => Self::DegenerateEnvelope,
        }
    }
}

/// Build a generator for `density` according to `config`.
///
/// # Example
/// ```
/// use tdr::{build, Config, DensityFn};
///
/// let density = DensityFn::new(|x: f64| (-0.5 * x * x).exp()).with_mode(0.0);
/// let generator = build(Config::new(), density).expect("log-concave");
/// assert!(generator.stats().n_intervals >= 2);
/// ```
pub fn build<D: Density>(config: Config, density: D) -> Result<Generator<D>, SetupError> {
    config.validate()?;

    let (lo, hi) = density.domain();
    if lo.is_nan() || hi.is_nan() || !(lo < hi) {
        return Err(SetupError::InvalidDomain { lo, hi });
    }

    let points = starting_points(&config, &density, lo, hi);

    let mut evaluated: Vec<(Float, Float, Float)> = Vec::with_capacity(points.len());
    for &x in &points {
        let fx = density.pdf(x);
        if !fx.is_finite() || fx <= 0.0 {
            continue;
        }
        let dfx = density.dpdf(x);
        if dfx.is_finite() {
            evaluated.push((x, fx, dfx));
        }
    }
    if evaluated.len() < 2 {
        return Err(SetupError::PdfNotPositive);
    }
    evaluated.truncate(config.max_intervals);

    let mut envelope = Envelope::from_points(
        config.transform,
        config.variant,
        (lo, hi),
        &evaluated,
        &density,
        config.pedantic,
    )?;

    let limit_reached = if config.presplit {
        presplit(&mut envelope, &config, &density)
    } else {
        false
    };

    if config.pedantic && !envelope.check_invariants() {
        return Err(SetupError::DegenerateEnvelope);
    }

    let mut guide = GuideTable::new(config.guide_factor);
    guide.rebuild(&envelope);

    Ok(Generator::from_parts(density, envelope, guide, &config, limit_reached))
}

/// Assemble the sorted, deduplicated starting points: explicit points and
/// mode/center when enabled, with domain-derived fallbacks when fewer than
/// two candidates remain.
fn starting_points<D: Density>(config: &Config, density: &D, lo: Float, hi: Float) -> Vec<Float> {
    let in_domain = |x: Float| x.is_finite() && x >= lo && x <= hi;

    let mut points: Vec<Float> = config
        .starting_points
        .iter()
        .copied()
        .filter(|&x| in_domain(x))
        .collect();
    if config.use_mode {
        if let Some(m) = density.mode().filter(|&m| in_domain(m)) {
            points.push(m);
        }
    }
    if config.use_center {
        if let Some(c) = density.center().filter(|&c| in_domain(c)) {
            points.push(c);
        }
    }
    sort_dedup(&mut points);

    if points.len() < 2 {
        let anchor = match points.first() {
            Some(&x) => x,
            None if lo.is_finite() && hi.is_finite() => 0.5 * (lo + hi),
            None if lo.is_finite() => lo + 1.0,
            None if hi.is_finite() => hi - 1.0,
            None => 0.0,
        };
        let fallback: [Float; 3] = if lo.is_finite() && hi.is_finite() {
            let w = hi - lo;
            [lo + 0.25 * w, lo + 0.5 * w, lo + 0.75 * w]
        } else if lo.is_finite() {
            let base = if anchor > lo { anchor } else { lo + 1.0 };
            [base, base + 1.0, base + 2.0]
        } else if hi.is_finite() {
            let base = if anchor < hi { anchor } else { hi - 1.0 };
            [base - 2.0, base - 1.0, base]
        } else {
            [anchor - 1.0, anchor, anchor + 1.0]
        };
        points.extend(fallback.iter().copied().filter(|&x| in_domain(x)));
        sort_dedup(&mut points);
    }

    points
}

fn sort_dedup(points: &mut Vec<Float>) {
    points.sort_by(|a, b| a.partial_cmp(b).expect("starting points are finite"));
    points.dedup_by(|a, b| (*a - *b).abs() <= REL_TOL * (1.0 + b.abs()));
}

/// Deterministic pre-refinement: split every interval whose hat/squeeze
/// gap is above its fair share until the squeeze target is met, the
/// interval cap is hit (returned as the non-fatal limit flag) or a full
/// pass makes no progress.
fn presplit<D: Density>(envelope: &mut Envelope, config: &Config, density: &D) -> bool {
    loop {
        if envelope.squeeze_ratio() >= config.squeeze_target {
            return false;
        }
        if envelope.n() >= config.max_intervals {
            return true;
        }

        let n = envelope.n();
        let threshold =
            config.bound_for_adding * (envelope.total_hat() - envelope.total_squeeze()) / n as Float;
        let transform = envelope.transform();

        let mut splits = Vec::new();
        for i in 0..n {
            let iv = envelope.interval(i);
            if iv.a_hat() - iv.a_squeeze() > threshold {
                if let Some(x) = split_point(&transform, iv) {
                    splits.push(x);
                }
            }
        }

        let mut progress = false;
        for x in splits {
            if envelope.n() >= config.max_intervals
                || envelope.squeeze_ratio() >= config.squeeze_target
            {
                break;
            }
            let fx = density.pdf(x);
            if envelope.insert(x, fx, density) {
                progress = true;
            }
        }
        if !progress {
            return false;
        }
    }
}

/// Deterministic split point for a flagged interval: the abscissa halving
/// the interval's hat area, with the midpoint of the wider half as a
/// fallback when the median degenerates onto the construction point or a
/// span end.
fn split_point(transform: &Transform, iv: &Interval) -> Option<Float> {
    let a_hat = iv.a_hat();
    if !(a_hat > 0.0) || !a_hat.is_finite() {
        return None;
    }

    let usable = |x: Float| {
        x.is_finite()
            && x - iv.xl > REL_TOL * (1.0 + x.abs())
            && iv.xr - x > REL_TOL * (1.0 + x.abs())
            && (x - iv.x()).abs() > REL_TOL * (1.0 + x.abs())
    };

    let median = iv.invert(transform, 0.5 * a_hat);
    if usable(median) {
        return Some(median);
    }

    let (half_lo, half_hi) = if iv.a_hat_left > iv.a_hat_right {
        (iv.xl, iv.x())
    } else {
        (iv.x(), iv.xr)
    };
    let fallback = if half_lo.is_finite() && half_hi.is_finite() {
        0.5 * (half_lo + half_hi)
    } else if half_hi.is_finite() {
        half_hi - (1.0 + half_hi.abs())
    } else {
        half_lo + (1.0 + half_lo.abs())
    };
    usable(fallback).then_some(fallback)
}
