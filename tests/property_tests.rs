use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tdr::{build, Config, DensityFn, Transform, Variant};

proptest! {
    #[test]
    fn prop_transform_round_trip(
        f in 1e-3f64..1e3,
        c in -1.0f64..-0.01,
    ) {
        for t in [Transform::Log, Transform::InvSqrt, Transform::Power(c)] {
            let back = t.inverse(t.forward(f));
            prop_assert!(
                (back - f).abs() <= 1e-8 * f,
                "{:?}: {} round-tripped to {}", t, f, back
            );
        }
    }

    #[test]
    fn prop_inv_sqrt_is_power_minus_half(f in 1e-3f64..1e3, df in -10.0f64..10.0) {
        let a = Transform::InvSqrt;
        let b = Transform::Power(-0.5);
        prop_assert!((a.forward(f) - b.forward(f)).abs() <= 1e-10 * a.forward(f).abs());
        let sa = a.slope(f, df);
        let sb = b.slope(f, df);
        prop_assert!((sa - sb).abs() <= 1e-10 * sa.abs().max(1e-300));
    }

    #[test]
    fn prop_tangent_area_is_additive(
        fx in 0.05f64..20.0,
        dfx in -2.0f64..2.0,
        split in 0.1f64..0.9,
    ) {
        for t in [Transform::Log, Transform::InvSqrt, Transform::Power(-0.7)] {
            let tfx = t.forward(fx);
            let slope = t.slope(fx, dfx);
            // Stay well clear of the transform pole on both sides; Log has
            // no pole.
            let width = if t == Transform::Log || slope.abs() <= 1e-12 {
                5.0
            } else {
                (0.4 * tfx.abs() / slope.abs()).min(5.0)
            };
            let (dtl, dtr) = (-width, width);
            let mid = dtl + split * (dtr - dtl);

            let whole = t.area(fx, tfx, slope, dtl, dtr);
            let parts = t.area(fx, tfx, slope, dtl, mid) + t.area(fx, tfx, slope, mid, dtr);
            prop_assert!(whole.is_finite() && whole > 0.0);
            prop_assert!(
                (whole - parts).abs() <= 1e-9 * whole,
                "{:?}: {} != {} + split", t, whole, parts
            );

            // And the area inversion is the inverse of the area.
            let r = t.area(fx, tfx, slope, dtl, mid);
            let back = t.invert_area(fx, tfx, slope, dtl, r);
            prop_assert!((back - mid).abs() <= 1e-6 * width, "{:?}: {} vs {}", t, back, mid);
        }
    }

    #[test]
    fn prop_generator_invariants_hold_under_adaptive_sampling(
        seed in 0u64..1000,
        spread in 0.5f64..3.0,
        max_intervals in 4usize..40,
    ) {
        let density = DensityFn::new(|x: f64| (-0.5 * x * x).exp())
            .with_dpdf(|x: f64| -x * (-0.5 * x * x).exp());
        let config = Config::new()
            .with_starting_points(vec![-spread, 0.0, spread])
            .with_max_intervals(max_intervals)
            .with_squeeze_target(0.99)
            .with_presplit(false);
        let mut generator = build(config, density).expect("normal setup");

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..200 {
            let x = generator.sample(&mut rng);
            prop_assert!(x.is_finite());
        }

        let stats = generator.stats();
        prop_assert!(stats.n_intervals <= max_intervals);
        prop_assert!(stats.total_squeeze_area <= stats.total_hat_area * (1.0 + 1e-10));
        prop_assert!(generator.envelope().check_invariants());

        // Cumulative areas are strictly increasing and end at the total.
        let intervals = generator.envelope().intervals();
        let mut prev = 0.0;
        for iv in intervals {
            prop_assert!(iv.a_cum() > prev);
            prev = iv.a_cum();
        }
        prop_assert!((prev - stats.total_hat_area).abs() <= 1e-9 * stats.total_hat_area);
    }

    #[test]
    fn prop_samples_respect_a_bounded_domain(
        seed in 0u64..500,
        lo in -2.0f64..0.0,
        width in 0.5f64..4.0,
    ) {
        let hi = lo + width;
        let density = DensityFn::new(|x: f64| (-0.5 * x * x).exp())
            .with_dpdf(|x: f64| -x * (-0.5 * x * x).exp())
            .with_domain(lo, hi);
        let mut generator = build(Config::new(), density).expect("truncated normal setup");

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..100 {
            let x = generator.sample(&mut rng);
            prop_assert!(x >= lo && x <= hi, "sample {} outside [{}, {}]", x, lo, hi);
        }
    }

    #[test]
    fn prop_all_variants_agree_on_finiteness(seed in 0u64..200) {
        for variant in [Variant::Secant, Variant::Proportional, Variant::ImmediateAcceptance] {
            let density = DensityFn::new(|x: f64| (-0.5 * x * x).exp())
                .with_dpdf(|x: f64| -x * (-0.5 * x * x).exp())
                .with_mode(0.0);
            let config = Config::new().with_variant(variant).with_verify(true);
            let mut generator = build(config, density).expect("setup");

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for _ in 0..100 {
                let x = generator.sample(&mut rng);
                prop_assert!(x.is_finite());
            }
            prop_assert_eq!(generator.violations(), 0);
        }
    }
}
