//! The density interface consumed by the sampling engine.
//!
//! The engine only ever sees a density through this trait: pointwise PDF
//! evaluations, an optional derivative, and domain/mode/center metadata.
//! The PDF does not need to be normalized; any positive multiple of a
//! probability density yields the same samples.

use crate::Float;

/// Step factor for the central-difference fallback derivative.
#[cfg(feature = "f32")]
const DERIV_STEP: Float = 5e-3;
#[cfg(feature = "f64")]
const DERIV_STEP: Float = 6e-6;

/// A univariate density known pointwise.
///
/// Correct sampling requires the density to be log-concave (or T_c-concave
/// for the configured transform) on its domain; this is an assumed
/// precondition, only checked at runtime when verify mode is enabled.
pub trait Density {
    /// Evaluate the (possibly unnormalized) density at `x`. Must be `>= 0`.
    fn pdf(&self, x: Float) -> Float;

    /// Derivative of the density at `x`.
    ///
    /// The default implementation uses a scaled central difference of
    /// [`Density::pdf`], one-sided at a domain boundary; override it when a
    /// closed form is available, both for speed and to keep the hat
    /// construction exact.
    fn dpdf(&self, x: Float) -> Float {
        let h = x.abs().max(1.0) * DERIV_STEP;
        let (lo, hi) = self.domain();
        let a = (x - h).max(lo);
        let b = (x + h).min(hi);
        if !(b > a) {
            return 0.0;
        }
        (self.pdf(b) - self.pdf(a)) / (b - a)
    }

    /// Support of the density as `(lower, upper)`; either end may be
    /// infinite. Defaults to the whole real line.
    fn domain(&self) -> (Float, Float) {
        (Float::NEG_INFINITY, Float::INFINITY)
    }

    /// The mode of the density, if known. Used as a construction point
    /// during setup when enabled in the configuration.
    fn mode(&self) -> Option<Float> {
        None
    }

    /// A "typical" point of the density, if known. A cheaper stand-in for
    /// the mode when only a rough location is available.
    fn center(&self) -> Option<Float> {
        None
    }
}

impl<D: Density + ?Sized> Density for &D {
    fn pdf(&self, x: Float) -> Float {
        (**self).pdf(x)
    }

    fn dpdf(&self, x: Float) -> Float {
        (**self).dpdf(x)
    }

    fn domain(&self) -> (Float, Float) {
        (**self).domain()
    }

    fn mode(&self) -> Option<Float> {
        (**self).mode()
    }

    fn center(&self) -> Option<Float> {
        (**self).center()
    }
}

/// A density defined by a PDF closure.
///
/// The derivative falls back to the numerical default; use
/// [`DensityFn::with_dpdf`] to supply a closed form.
///
/// # Example
/// ```
/// use tdr::{Density, DensityFn};
///
/// let expo = DensityFn::new(|x: f64| (-x).exp()).with_domain(0.0, f64::INFINITY);
/// assert_eq!(expo.pdf(0.0), 1.0);
/// assert_eq!(expo.domain(), (0.0, f64::INFINITY));
/// ```
#[derive(Debug, Copy, Clone)]
pub struct DensityFn<F> {
    pdf: F,
    domain: (Float, Float),
    mode: Option<Float>,
    center: Option<Float>,
}

impl<F> DensityFn<F>
where
    F: Fn(Float) -> Float,
{
    /// Create a new [DensityFn] from a PDF closure, supported on the whole
    /// real line.
    pub fn new(pdf: F) -> Self {
        Self {
            pdf,
            domain: (Float::NEG_INFINITY, Float::INFINITY),
            mode: None,
            center: None,
        }
    }

    /// Restrict the support to `[lo, hi]`; either end may be infinite.
    pub fn with_domain(mut self, lo: Float, hi: Float) -> Self {
        self.domain = (lo, hi);
        self
    }

    /// Declare the mode of the density.
    pub fn with_mode(mut self, mode: Float) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Declare a typical point of the density.
    pub fn with_center(mut self, center: Float) -> Self {
        self.center = Some(center);
        self
    }

    /// Attach a closed-form derivative, producing a [DensityFnWithDeriv].
    pub fn with_dpdf<G>(self, dpdf: G) -> DensityFnWithDeriv<F, G>
    where
        G: Fn(Float) -> Float,
    {
        DensityFnWithDeriv {
            pdf: self.pdf,
            dpdf,
            domain: self.domain,
            mode: self.mode,
            center: self.center,
        }
    }
}

impl<F> Density for DensityFn<F>
where
    F: Fn(Float) -> Float,
{
    fn pdf(&self, x: Float) -> Float {
        (self.pdf)(x)
    }

    fn domain(&self) -> (Float, Float) {
        self.domain
    }

    fn mode(&self) -> Option<Float> {
        self.mode
    }

    fn center(&self) -> Option<Float> {
        self.center
    }
}

/// A density defined by PDF and derivative closures.
///
/// Built via [`DensityFn::with_dpdf`].
#[derive(Debug, Copy, Clone)]
pub struct DensityFnWithDeriv<F, G> {
    pdf: F,
    dpdf: G,
    domain: (Float, Float),
    mode: Option<Float>,
    center: Option<Float>,
}

impl<F, G> DensityFnWithDeriv<F, G>
where
    F: Fn(Float) -> Float,
    G: Fn(Float) -> Float,
{
    /// Restrict the support to `[lo, hi]`; either end may be infinite.
    pub fn with_domain(mut self, lo: Float, hi: Float) -> Self {
        self.domain = (lo, hi);
        self
    }

    /// Declare the mode of the density.
    pub fn with_mode(mut self, mode: Float) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Declare a typical point of the density.
    pub fn with_center(mut self, center: Float) -> Self {
        self.center = Some(center);
        self
    }
}

impl<F, G> Density for DensityFnWithDeriv<F, G>
where
    F: Fn(Float) -> Float,
    G: Fn(Float) -> Float,
{
    fn pdf(&self, x: Float) -> Float {
        (self.pdf)(x)
    }

    fn dpdf(&self, x: Float) -> Float {
        (self.dpdf)(x)
    }

    fn domain(&self) -> (Float, Float) {
        self.domain
    }

    fn mode(&self) -> Option<Float> {
        self.mode
    }

    fn center(&self) -> Option<Float> {
        self.center
    }
}
