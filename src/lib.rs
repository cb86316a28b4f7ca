//! Welcome to tdr, a library for sampling from arbitrary univariate
//! continuous distributions by transformed density rejection.
//!
//! Given a density that is known only pointwise (and is log-concave, or
//! T_c-concave for one of the supported transforms), the setup step builds a
//! piecewise-linear hat function in transformed space that dominates the
//! density everywhere, together with a squeeze function lying below it.
//! Samples are then drawn exactly from the hat by closed-form inversion and
//! thinned by rejection; rejected candidates optionally become new
//! construction points, so the envelope tightens as sampling proceeds.
//!
//! The density does not need to be normalized: any positive multiple of a
//! probability density produces the same samples.
//!
//! # Example
//! ```
//! use rand::{rngs::StdRng, SeedableRng};
//! use tdr::{build, Config, DensityFn};
//!
//! // Standard normal, up to its normalization constant.
//! let density = DensityFn::new(|x: f64| (-0.5 * x * x).exp())
//!     .with_dpdf(|x: f64| -x * (-0.5 * x * x).exp())
//!     .with_mode(0.0);
//!
//! let config = Config::new().with_starting_points(vec![-1.0, 0.0, 1.0]);
//! let mut generator = build(config, density).expect("normal density is log-concave");
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let x = generator.sample(&mut rng);
//! assert!(x.is_finite());
//! ```

/// The numeric type used throughout tdr.
///
/// Currently set to `f64` for performance and precision.
/// Can be changed later if needed (e.g., `f32` or `Decimal`).
#[cfg(feature = "f32")]
pub type Float = f32;

/// The numeric type used throughout tdr.
///
/// Currently set to `f64` for performance and precision.
/// Can be changed later if needed (e.g., `f32` or `Decimal`).
#[cfg(feature = "f64")]
pub type Float = f64;

/// Relative tolerance for deciding that two abscissae coincide.
#[cfg(feature = "f32")]
pub(crate) const REL_TOL: Float = 1e-4;
#[cfg(feature = "f64")]
pub(crate) const REL_TOL: Float = 1e-10;

/// Relative tolerance for the hat/density/squeeze ordering check.
#[cfg(feature = "f32")]
pub(crate) const VERIFY_TOL: Float = 1e-3;
#[cfg(feature = "f64")]
pub(crate) const VERIFY_TOL: Float = 1e-8;

pub mod test_utils;

pub mod config;
pub mod density;
pub mod envelope;
pub mod generator;
pub mod math;
pub mod setup;
pub mod transform;

pub use config::{Config, ConfigError, Variant};
pub use density::{Density, DensityFn, DensityFnWithDeriv};
pub use generator::{Generator, Stats, Violation};
pub use setup::{build, SetupError};
pub use transform::Transform;
