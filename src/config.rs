//! Configuration for the setup and sampling engines.

use crate::transform::Transform;
use crate::Float;

/// Which squeeze construction the envelope uses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Variant {
    /// Squeeze from the secants between adjacent construction points
    /// (Gilks & Wild); zero outside the outermost points.
    Secant,
    /// Squeeze proportional to the hat on each interval; the squeeze test
    /// needs no evaluation at all.
    Proportional,
    /// Proportional squeeze with the immediate-acceptance shortcut: draws
    /// landing under the squeeze share of an interval are accepted with a
    /// single uniform and no density evaluation.
    ImmediateAcceptance,
}

/// Errors for invalid configuration.
///
/// All of these are raised by [`Config::validate`] before the density is
/// evaluated even once.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `Power(c)` shape parameter outside `[-1, 0)`.
    InvalidShapeParameter(Float),
    /// Squeeze target outside `(0, 1)`.
    InvalidSqueezeTarget(Float),
    /// Refinement bound not a positive finite number.
    InvalidBoundForAdding(Float),
    /// Guide factor negative or non-finite.
    InvalidGuideFactor(Float),
    /// Interval cap too small to hold two construction points.
    MaxIntervalsTooSmall(usize),
    /// More explicit starting points than the interval cap allows.
    TooManyStartingPoints { points: usize, max_intervals: usize },
    /// A starting point is NaN or infinite.
    NonFiniteStartingPoint(Float),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidShapeParameter(c) => {
                write!(f, "power transform parameter must be in [-1, 0) (got {c})")
            }
            Self::InvalidSqueezeTarget(s) => {
                write!(f, "squeeze target must be in (0, 1) (got {s})")
            }
            Self::InvalidBoundForAdding(b) => {
                write!(f, "bound for adding must be positive and finite (got {b})")
            }
            Self::InvalidGuideFactor(g) => {
                write!(f, "guide factor must be non-negative and finite (got {g})")
            }
            Self::MaxIntervalsTooSmall(n) => {
                write!(f, "max intervals must be at least 2 (got {n})")
            }
            Self::TooManyStartingPoints { points, max_intervals } => {
                write!(f, "{points} starting points exceed the interval cap {max_intervals}")
            }
            Self::NonFiniteStartingPoint(x) => {
                write!(f, "starting points must be finite (got {x})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration consumed by [`crate::build`].
///
/// Construct with [`Config::new`] (or [`Config::default`]) and adjust with
/// the chainable setters.
///
/// # Example
/// ```
/// use tdr::{Config, Transform, Variant};
///
/// let config = Config::new()
///     .with_transform(Transform::Log)
///     .with_variant(Variant::ImmediateAcceptance)
///     .with_starting_points(vec![-1.0, 0.0, 1.0])
///     .with_squeeze_target(0.95);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) transform: Transform,
    pub(crate) variant: Variant,
    pub(crate) starting_points: Vec<Float>,
    pub(crate) use_mode: bool,
    pub(crate) use_center: bool,
    pub(crate) max_intervals: usize,
    pub(crate) squeeze_target: Float,
    pub(crate) bound_for_adding: Float,
    pub(crate) guide_factor: Float,
    pub(crate) presplit: bool,
    pub(crate) adaptive_on_reject: bool,
    pub(crate) verify: bool,
    pub(crate) pedantic: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transform: Transform::Log,
            variant: Variant::Proportional,
            starting_points: Vec::new(),
            use_mode: true,
            use_center: true,
            max_intervals: 2048,
            squeeze_target: 0.9,
            bound_for_adding: 0.99,
            guide_factor: 1.0,
            presplit: true,
            adaptive_on_reject: true,
            verify: false,
            pedantic: false,
        }
    }
}

impl Config {
    /// Create a configuration with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the concave-preserving transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Choose the squeeze variant.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Explicit construction points; points outside the density's domain
    /// are dropped during setup.
    pub fn with_starting_points(mut self, points: Vec<Float>) -> Self {
        self.starting_points = points;
        self
    }

    /// Whether the density's mode joins the starting points.
    pub fn with_use_mode(mut self, use_mode: bool) -> Self {
        self.use_mode = use_mode;
        self
    }

    /// Whether the density's center joins the starting points.
    pub fn with_use_center(mut self, use_center: bool) -> Self {
        self.use_center = use_center;
        self
    }

    /// Hard cap on the number of envelope intervals.
    pub fn with_max_intervals(mut self, max_intervals: usize) -> Self {
        self.max_intervals = max_intervals;
        self
    }

    /// Target lower bound for the global squeeze/hat area ratio; setup and
    /// adaptive refinement stop improving the envelope once it is reached.
    pub fn with_squeeze_target(mut self, squeeze_target: Float) -> Self {
        self.squeeze_target = squeeze_target;
        self
    }

    /// Relative hat/squeeze gap an interval must carry before the setup
    /// refinement considers splitting it.
    pub fn with_bound_for_adding(mut self, bound_for_adding: Float) -> Self {
        self.bound_for_adding = bound_for_adding;
        self
    }

    /// Guide table size relative to the interval count; zero degrades the
    /// table to a plain linear scan.
    pub fn with_guide_factor(mut self, guide_factor: Float) -> Self {
        self.guide_factor = guide_factor;
        self
    }

    /// Whether setup runs the deterministic pre-refinement (DARS).
    pub fn with_presplit(mut self, presplit: bool) -> Self {
        self.presplit = presplit;
        self
    }

    /// Whether rejected candidates become new construction points during
    /// sampling.
    pub fn with_adaptive_on_reject(mut self, adaptive_on_reject: bool) -> Self {
        self.adaptive_on_reject = adaptive_on_reject;
        self
    }

    /// Check `squeeze <= pdf <= hat` at every accepted point; violations
    /// are recorded on the generator, not fatal.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Upgrade concavity fallbacks during envelope construction into hard
    /// setup errors.
    pub fn with_pedantic(mut self, pedantic: bool) -> Self {
        self.pedantic = pedantic;
        self
    }

    /// Validate the configuration.
    ///
    /// Runs before any density evaluation; see [`ConfigError`] for the
    /// possible rejections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Transform::Power(c) = self.transform {
            if !c.is_finite() || !(-1.0..0.0).contains(&c) {
                return Err(ConfigError::InvalidShapeParameter(c));
            }
        }
        if !self.squeeze_target.is_finite()
            || self.squeeze_target <= 0.0
            || self.squeeze_target >= 1.0
        {
            return Err(ConfigError::InvalidSqueezeTarget(self.squeeze_target));
        }
        if !self.bound_for_adding.is_finite() || self.bound_for_adding <= 0.0 {
            return Err(ConfigError::InvalidBoundForAdding(self.bound_for_adding));
        }
        if !self.guide_factor.is_finite() || self.guide_factor < 0.0 {
            return Err(ConfigError::InvalidGuideFactor(self.guide_factor));
        }
        if self.max_intervals < 2 {
            return Err(ConfigError::MaxIntervalsTooSmall(self.max_intervals));
        }
        if self.starting_points.len() > self.max_intervals {
            return Err(ConfigError::TooManyStartingPoints {
                points: self.starting_points.len(),
                max_intervals: self.max_intervals,
            });
        }
        if let Some(&x) = self.starting_points.iter().find(|x| !x.is_finite()) {
            return Err(ConfigError::NonFiniteStartingPoint(x));
        }
        Ok(())
    }
}
