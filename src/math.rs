//! Math utilities

use super::Float;

/// Gamma function
pub fn gamma(x: Float) -> Float {
    #[cfg(feature = "f32")]
    { libm::tgammaf(x) }

    #[cfg(feature = "f64")]
    { libm::tgamma(x) }
}

/// Error function
pub fn erf(x: Float) -> Float {
    #[cfg(feature = "f32")]
    { libm::erff(x) }

    #[cfg(feature = "f64")]
    { libm::erf(x) }
}

/// Cumulative distribution function of the standard normal distribution
pub fn normal_cdf(x: Float) -> Float {
    #[cfg(feature = "f32")]
    { 0.5 * (1.0 + erf(x / core::f32::consts::SQRT_2)) }

    #[cfg(feature = "f64")]
    { 0.5 * (1.0 + erf(x / core::f64::consts::SQRT_2)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamma_at_integers() {
        assert!((gamma(1.0) - 1.0).abs() < 1e-6);
        assert!((gamma(2.0) - 1.0).abs() < 1e-6);
        assert!((gamma(5.0) - 24.0).abs() < 1e-4);
    }

    #[test]
    fn erf_is_odd_and_bounded() {
        assert_eq!(erf(0.0), 0.0);
        assert!((erf(1.0) + erf(-1.0)).abs() < 1e-12);
        assert!(erf(10.0) <= 1.0 && erf(10.0) > 0.9999);
    }

    #[test]
    fn normal_cdf_known_values() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-12);
        // Phi(1.96) ~ 0.975
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 1e-3);
    }
}
