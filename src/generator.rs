//! Sampling engine: the per-draw rejection state machine.
//!
//! Each draw selects an interval through the guide table, inverts the hat
//! restricted to that interval, and runs the squeeze/density acceptance
//! tests. Rejected candidates optionally become new construction points, so
//! the envelope keeps tightening while the generator is in use; the guide
//! table is rebuilt after every successful insertion.

use rand::Rng;

use crate::config::{Config, Variant};
use crate::density::Density;
use crate::envelope::{Envelope, GuideTable};
use crate::{Float, VERIFY_TOL};

/// A recorded hat/density/squeeze ordering violation (verify mode).
///
/// Signals either a density that is not concave under the configured
/// transform, or a numerical edge case; diagnostic data, never fatal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Violation {
    /// The accepted point where the ordering broke.
    pub x: Float,
    /// Density value at `x`.
    pub pdf: Float,
    /// Hat value at `x`.
    pub hat: Float,
    /// Squeeze value at `x`.
    pub squeeze: Float,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "envelope ordering violated at {}: squeeze {} / density {} / hat {}",
            self.x, self.squeeze, self.pdf, self.hat
        )
    }
}

/// Introspection snapshot of a generator's envelope.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Stats {
    /// Number of envelope intervals (= construction points).
    pub n_intervals: usize,
    /// Total hat area.
    pub total_hat_area: Float,
    /// Total squeeze area.
    pub total_squeeze_area: Float,
}

impl Stats {
    /// The squeeze/hat area ratio; the expected number of density
    /// evaluations per draw shrinks toward zero as this approaches one.
    pub fn squeeze_ratio(&self) -> Float {
        if self.total_hat_area > 0.0 {
            self.total_squeeze_area / self.total_hat_area
        } else {
            0.0
        }
    }
}

/// A ready-to-sample generator produced by [`crate::build`].
///
/// A generator is cheap to sample from and mutates itself while sampling
/// (adaptive refinement); share it across threads only after disabling
/// refinement, or behind external synchronization.
pub struct Generator<D: Density> {
    density: D,
    envelope: Envelope,
    guide: GuideTable,
    max_intervals: usize,
    squeeze_target: Float,
    adaptive: bool,
    verify: bool,
    limit_reached: bool,
    violations: u64,
    last_violation: Option<Violation>,
}

impl<D: Density> std::fmt::Debug for Generator<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("n_intervals", &self.envelope.n())
            .field("total_hat_area", &self.envelope.total_hat())
            .field("total_squeeze_area", &self.envelope.total_squeeze())
            .field("max_intervals", &self.max_intervals)
            .field("squeeze_target", &self.squeeze_target)
            .field("adaptive", &self.adaptive)
            .field("verify", &self.verify)
            .field("limit_reached", &self.limit_reached)
            .finish()
    }
}

impl<D: Density> Generator<D> {
    pub(crate) fn from_parts(
        density: D,
        envelope: Envelope,
        guide: GuideTable,
        config: &Config,
        limit_reached: bool,
    ) -> Self {
        Self {
            density,
            envelope,
            guide,
            max_intervals: config.max_intervals,
            squeeze_target: config.squeeze_target,
            adaptive: config.adaptive_on_reject,
            verify: config.verify,
            limit_reached,
            violations: 0,
            last_violation: None,
        }
    }

    /// Draw one variate.
    ///
    /// The loop is probabilistically bounded: the expected number of
    /// iterations is the hat/squeeze area ratio, which setup keeps small
    /// and adaptive refinement keeps shrinking.
    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Float {
        loop {
            let u = rng.random::<Float>() * self.envelope.total_hat();
            let idx = self.guide.locate(&self.envelope, u);
            let r = (u - self.envelope.cum_before(idx)).max(0.0);

            let accepted = match self.envelope.variant() {
                Variant::ImmediateAcceptance => self.attempt_immediate(idx, r, rng),
                Variant::Secant | Variant::Proportional => self.attempt_rejection(idx, r, rng),
            };
            if let Some(x) = accepted {
                return x;
            }
        }
    }

    /// Draw `n` variates into a vector.
    pub fn sample_n<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Vec<Float> {
        (0..n).map(|_| self.sample(rng)).collect()
    }

    /// One accept/reject attempt for the secant and proportional variants.
    fn attempt_rejection<R: Rng + ?Sized>(
        &mut self,
        idx: usize,
        r: Float,
        rng: &mut R,
    ) -> Option<Float> {
        let transform = self.envelope.transform();
        let (x, hat, squeeze) = {
            let iv = self.envelope.interval(idx);
            let x = iv.invert(&transform, r);
            if !x.is_finite() {
                return None;
            }
            let hat = iv.hat_value(&transform, x);
            if !hat.is_finite() || hat <= 0.0 {
                return None;
            }
            (x, hat, iv.squeeze_value(&transform, x))
        };

        let u2 = rng.random::<Float>();
        if u2 * hat <= squeeze {
            // Squeeze shortcut: accepted without touching the density.
            self.verify_accepted(x, hat, squeeze);
            return Some(x);
        }
        let fx = self.density.pdf(x);
        if fx.is_finite() && u2 * hat <= fx {
            self.verify_accepted(x, hat, squeeze);
            return Some(x);
        }
        self.refine_at(x, fx);
        None
    }

    /// One attempt for the immediate-acceptance variant.
    ///
    /// The squeeze is `ratio × hat`, so an offset landing under the
    /// interval's squeeze area is an exact draw from the squeeze region:
    /// rescale by the ratio, invert the hat, accept — one uniform, no
    /// density evaluation. The leftover region is hat-shaped and is
    /// rejected against `(pdf - squeeze)/(hat - squeeze)`.
    fn attempt_immediate<R: Rng + ?Sized>(
        &mut self,
        idx: usize,
        r: Float,
        rng: &mut R,
    ) -> Option<Float> {
        let transform = self.envelope.transform();
        let (immediate, x, hat, squeeze) = {
            let iv = self.envelope.interval(idx);
            let ratio = iv.squeeze_ratio();
            let a_hat = iv.a_hat();
            if r < iv.a_squeeze() && ratio > 0.0 {
                let x = iv.invert(&transform, (r / ratio).min(a_hat));
                if !x.is_finite() {
                    return None;
                }
                let hat = iv.hat_value(&transform, x);
                (true, x, hat, ratio * hat)
            } else {
                let rr = if ratio < 1.0 {
                    ((r - iv.a_squeeze()) / (1.0 - ratio)).clamp(0.0, a_hat)
                } else {
                    r.min(a_hat)
                };
                let x = iv.invert(&transform, rr);
                if !x.is_finite() {
                    return None;
                }
                let hat = iv.hat_value(&transform, x);
                if !hat.is_finite() || hat <= 0.0 {
                    return None;
                }
                (false, x, hat, ratio * hat)
            }
        };

        if immediate {
            self.verify_accepted(x, hat, squeeze);
            return Some(x);
        }

        let u2 = rng.random::<Float>();
        let fx = self.density.pdf(x);
        if fx.is_finite() && squeeze + u2 * (hat - squeeze) <= fx {
            self.verify_accepted(x, hat, squeeze);
            return Some(x);
        }
        self.refine_at(x, fx);
        None
    }

    /// Adaptive refinement at a rejected candidate.
    fn refine_at(&mut self, x: Float, fx: Float) {
        if !self.adaptive {
            return;
        }
        if self.envelope.n() >= self.max_intervals {
            self.limit_reached = true;
            return;
        }
        if self.envelope.squeeze_ratio() >= self.squeeze_target {
            return;
        }
        if !fx.is_finite() || fx <= 0.0 {
            return;
        }
        if self.envelope.insert(x, fx, &self.density) {
            self.guide.rebuild(&self.envelope);
        }
    }

    /// Verify-mode consistency check at an accepted point.
    fn verify_accepted(&mut self, x: Float, hat: Float, squeeze: Float) {
        if !self.verify {
            return;
        }
        let fx = self.density.pdf(x);
        let tol = VERIFY_TOL * hat.max(1.0);
        if squeeze > fx + tol || fx > hat + tol {
            self.violations += 1;
            self.last_violation = Some(Violation {
                x,
                pdf: fx,
                hat,
                squeeze,
            });
        }
    }

    /// Envelope snapshot for testing and tuning.
    pub fn stats(&self) -> Stats {
        Stats {
            n_intervals: self.envelope.n(),
            total_hat_area: self.envelope.total_hat(),
            total_squeeze_area: self.envelope.total_squeeze(),
        }
    }

    /// Adjust the interval cap for future adaptive insertions. Clamped to
    /// the current interval count, so the envelope never exceeds the cap.
    pub fn set_max_intervals(&mut self, max_intervals: usize) {
        self.max_intervals = max_intervals.max(self.envelope.n());
    }

    /// Adjust the squeeze target for future adaptive insertions.
    /// # Panic
    /// This function panics if `squeeze_target` is outside `(0, 1)`
    pub fn set_squeeze_target(&mut self, squeeze_target: Float) {
        assert!(
            squeeze_target > 0.0 && squeeze_target < 1.0,
            "Squeeze target ({squeeze_target}) must be in (0, 1)"
        );
        self.squeeze_target = squeeze_target;
    }

    /// Toggle the runtime hat/density/squeeze consistency check.
    pub fn enable_verify(&mut self, verify: bool) {
        self.verify = verify;
    }

    /// Whether refinement ever stopped because the interval cap was hit.
    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }

    /// Number of consistency violations recorded so far (verify mode).
    pub fn violations(&self) -> u64 {
        self.violations
    }

    /// The most recent consistency violation, if any.
    pub fn last_violation(&self) -> Option<&Violation> {
        self.last_violation.as_ref()
    }

    /// Read access to the envelope.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// The wrapped density.
    pub fn density(&self) -> &D {
        &self.density
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::DensityFn;
    use crate::setup::build;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn normal() -> impl Density {
        DensityFn::new(|x: Float| (-0.5 * x * x).exp())
            .with_dpdf(|x: Float| -x * (-0.5 * x * x).exp())
            .with_mode(0.0)
    }

    fn normal_config() -> Config {
        Config::new().with_starting_points(vec![-1.0, 0.0, 1.0])
    }

    #[test]
    fn samples_stay_inside_a_bounded_domain() {
        let density = DensityFn::new(|x: Float| (-x).exp())
            .with_dpdf(|x: Float| -(-x).exp())
            .with_domain(0.0, 4.0);
        let mut generator = build(Config::new(), density).expect("bounded setup");
        let mut rng = StdRng::from_seed([3; 32]);

        for _ in 0..5_000 {
            let x = generator.sample(&mut rng);
            assert!((0.0..=4.0).contains(&x), "sample {x} escaped the domain");
        }
    }

    #[test]
    fn reproducible_with_seed() {
        let seed = [123; 32];
        let mut gen1 = build(normal_config(), normal()).expect("setup");
        let mut gen2 = build(normal_config(), normal()).expect("setup");

        let mut rng1 = StdRng::from_seed(seed);
        let mut rng2 = StdRng::from_seed(seed);

        for _ in 0..1000 {
            let val1 = gen1.sample(&mut rng1);
            let val2 = gen2.sample(&mut rng2);
            assert_eq!(val1, val2, "Values should be equal with same seed");
        }
    }

    #[test]
    fn verify_mode_records_no_violations_for_log_concave_input() {
        for variant in [Variant::Secant, Variant::Proportional, Variant::ImmediateAcceptance] {
            let config = normal_config().with_variant(variant).with_verify(true);
            let mut generator = build(config, normal()).expect("setup");
            let mut rng = StdRng::from_seed([7; 32]);

            for _ in 0..2_000 {
                let x = generator.sample(&mut rng);
                assert!(x.is_finite());
            }
            assert_eq!(generator.violations(), 0, "{variant:?}");
            assert!(generator.last_violation().is_none());
        }
    }

    #[test]
    fn adaptive_growth_respects_the_interval_cap() {
        let config = normal_config()
            .with_max_intervals(8)
            .with_squeeze_target(0.99)
            .with_presplit(false);
        let mut generator = build(config, normal()).expect("setup");
        let mut rng = StdRng::from_seed([9; 32]);

        for _ in 0..5_000 {
            generator.sample(&mut rng);
            assert!(generator.stats().n_intervals <= 8);
        }
        assert_eq!(generator.stats().n_intervals, 8);
        assert!(generator.limit_reached());
    }

    #[test]
    fn frozen_generator_never_mutates() {
        let config = normal_config().with_adaptive_on_reject(false).with_presplit(false);
        let mut generator = build(config, normal()).expect("setup");
        let before = generator.stats();
        let mut rng = StdRng::from_seed([11; 32]);

        for _ in 0..2_000 {
            generator.sample(&mut rng);
        }
        assert_eq!(generator.stats(), before);
    }

    #[test]
    fn refinement_improves_the_squeeze_ratio_while_sampling() {
        let config = normal_config().with_presplit(false).with_squeeze_target(0.99);
        let mut generator = build(config, normal()).expect("setup");
        let before = generator.stats().squeeze_ratio();
        let mut rng = StdRng::from_seed([13; 32]);

        generator.sample_n(2_000, &mut rng);
        let after = generator.stats().squeeze_ratio();
        assert!(after > before, "ratio did not improve: {before} -> {after}");
        assert!(generator.envelope().check_invariants());
    }

    #[test]
    fn sample_mean_is_near_zero_for_the_standard_normal() {
        let mut generator = build(normal_config(), normal()).expect("setup");
        let mut rng = StdRng::from_seed([42; 32]);
        let samples = generator.sample_n(5_000, &mut rng);

        let mean = samples.iter().sum::<Float>() / samples.len() as Float;
        assert!(mean.abs() < 0.05, "mean too far from zero: {mean}");
    }

    #[test]
    fn threshold_setters_take_effect() {
        let mut generator = build(normal_config(), normal()).expect("setup");
        let n = generator.stats().n_intervals;

        generator.set_max_intervals(1);
        // Clamped to the current count: the envelope never exceeds the cap.
        let mut rng = StdRng::from_seed([17; 32]);
        generator.sample_n(500, &mut rng);
        assert_eq!(generator.stats().n_intervals, n);

        generator.set_squeeze_target(0.5);
        generator.enable_verify(true);
        generator.sample_n(100, &mut rng);
        assert_eq!(generator.violations(), 0);
    }

    #[test]
    #[should_panic]
    fn squeeze_target_setter_rejects_out_of_range() {
        let mut generator = build(normal_config(), normal()).expect("setup");
        generator.set_squeeze_target(0.0);
    }
}
