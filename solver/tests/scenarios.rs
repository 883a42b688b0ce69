//! End-to-end propagation scenarios on small columns

use std::sync::Arc;

use approx::assert_relative_eq;
use shearwave_motion::{MotionType, TimeSeriesMotion};
use shearwave_numerics::{complex_shear_modulus, UnitSystem};
use shearwave_profile::{Bedrock, Location, NonlinearCurve, Profile, SoilLayer, SoilType};
use shearwave_solver::{CancelToken, IterationMode, SiteResponseCalculator, WaveField};

const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

fn sine_motion(freq_hz: f64, pga: f64, duration: f64, dt: f64) -> TimeSeriesMotion {
    let count = (duration / dt) as usize;
    let accel: Vec<f64> = (0..count)
        .map(|i| pga * (TWO_PI * freq_hz * i as f64 * dt).sin())
        .collect();

    TimeSeriesMotion::from_accel("sine", accel, dt, MotionType::Within, UnitSystem::Metric)
        .unwrap()
}

/// Interpolate a transfer-function magnitude to an off-grid frequency.
fn interp_magnitude(freq: &[f64], magnitude: &[f64], target: f64) -> f64 {
    let upper = freq.partition_point(|&f| f < target);
    let t = (target - freq[upper - 1]) / (freq[upper] - freq[upper - 1]);
    magnitude[upper - 1] + t * (magnitude[upper] - magnitude[upper - 1])
}

/// Homogeneous half-space: free-surface doubling of a bedrock within motion.
#[test]
fn homogeneous_half_space_doubles_surface_motion() {
    // 2000 kg/m3 expressed as a unit weight in kN/m3
    let unit_weight = 2000.0 * 9.80665 / 1000.0;
    let soil = Arc::new(SoilType::linear_elastic("rock", unit_weight, 2.0));

    let mut profile = Profile::new(
        UnitSystem::Metric,
        vec![SoilLayer::new(soil, 10.0, 300.0)],
        Bedrock::new(unit_weight, 300.0, 2.0),
    )
    .unwrap();
    profile.set_disable_auto_discretization(true);
    profile.discretize().unwrap();

    let motion = sine_motion(5.0, 0.1, 10.0, 0.005);

    let mut calc = SiteResponseCalculator::new(IterationMode::LinearElastic);
    let summary = calc
        .run(&motion, &mut profile, &CancelToken::new())
        .unwrap();
    assert!(summary.converged);

    // Transfer function magnitude at 5 Hz: with omega H / Vs = pi/3 the
    // column amplifies a bedrock within motion by a factor of two
    let tf = calc.field().accel_tf(
        &profile.input_location(),
        MotionType::Within,
        &Location::surface(),
        MotionType::Outcrop,
    );
    let magnitude: Vec<f64> = tf.iter().map(|c| c.norm()).collect();
    let at_5hz = interp_magnitude(motion.freq(), &magnitude, 5.0);
    assert!(
        (at_5hz - 2.0).abs() < 0.015,
        "magnitude at 5 Hz was {}",
        at_5hz
    );

    // Surface PGA doubles the 0.1 g input
    let surface_pga = calc.surface_pga(&motion, &profile).unwrap();
    assert_relative_eq!(surface_pga, 0.2, max_relative = 0.02);
}

fn soft_over_stiff_profile(soil: Arc<SoilType>) -> Profile {
    let mut profile = Profile::new(
        UnitSystem::Metric,
        vec![SoilLayer::new(soil, 20.0, 200.0)],
        Bedrock::new(2400.0 * 9.80665 / 1000.0, 1500.0, 1.0),
    )
    .unwrap();
    profile.discretize().unwrap();
    profile
}

/// Soft layer over stiff rock: fundamental-mode peak at Vs / 4H.
#[test]
fn soft_layer_resonates_at_quarter_wavelength() {
    let unit_weight = 1800.0 * 9.80665 / 1000.0;
    let soil = Arc::new(SoilType::linear_elastic("soft soil", unit_weight, 5.0));
    let mut profile = soft_over_stiff_profile(soil);

    let motion = sine_motion(5.0, 0.1, 10.0, 0.005);

    let mut calc = SiteResponseCalculator::new(IterationMode::LinearElastic);
    calc.run(&motion, &mut profile, &CancelToken::new()).unwrap();

    let tf = calc.field().accel_tf(
        &profile.input_location(),
        MotionType::Outcrop,
        &Location::surface(),
        MotionType::Outcrop,
    );

    // Search the magnitude peak below 5 Hz
    let mut peak_freq = 0.0;
    let mut peak_mag = 0.0;
    for (j, value) in tf.iter().enumerate() {
        let f = motion.freq_at(j);
        if f > 5.0 {
            break;
        }
        if value.norm() > peak_mag {
            peak_mag = value.norm();
            peak_freq = f;
        }
    }

    // f0 = Vs / 4H = 200 / 80 = 2.5 Hz
    assert!(
        (peak_freq - 2.5).abs() <= 0.05,
        "fundamental frequency at {} Hz",
        peak_freq
    );
    assert!(
        peak_mag > 5.0 && peak_mag < 12.0,
        "amplification {} outside the impedance-limited range",
        peak_mag
    );
}

/// Equivalent-linear iteration on a soft nonlinear column.
#[test]
fn eql_converges_on_strong_motion() {
    let unit_weight = 1800.0 * 9.80665 / 1000.0;
    let soil = Arc::new(SoilType::new(
        "soft soil",
        unit_weight,
        NonlinearCurve::new(
            vec![1e-4, 1e-3, 1e-2, 1e-1, 1.0],
            vec![1.0, 0.97, 0.85, 0.5, 0.15],
        ),
        NonlinearCurve::new(
            vec![1e-4, 1e-3, 1e-2, 1e-1, 1.0],
            vec![0.7, 1.0, 3.0, 10.0, 18.0],
        ),
        0.7,
    ));
    let mut profile = soft_over_stiff_profile(soil);

    let motion = sine_motion(5.0, 0.3, 10.0, 0.005);

    let mut calc = SiteResponseCalculator::new(IterationMode::EquivalentLinear {
        strain_ratio: 0.65,
    });
    let summary = calc
        .run(&motion, &mut profile, &CancelToken::new())
        .unwrap();

    assert!(summary.converged, "not converged: {:?}", summary);
    assert!(summary.iterations <= 10);
    assert!(summary.max_error <= 2.0);

    let mid = profile.depth_to_location(10.0).layer();
    let sublayer = &profile.sub_layers()[mid];

    assert!(
        sublayer.eff_strain() > 0.03 && sublayer.eff_strain() < 0.2,
        "effective strain {} % at mid-depth",
        sublayer.eff_strain()
    );
    assert!(
        sublayer.damping() > 6.0 && sublayer.damping() < 14.0,
        "damping {} % at mid-depth",
        sublayer.damping()
    );
}

/// The linear-elastic mode reproduces a propagation with untouched
/// small-strain properties.
#[test]
fn linear_elastic_matches_initial_property_propagation() {
    let unit_weight = 1800.0 * 9.80665 / 1000.0;
    let soil = Arc::new(SoilType::linear_elastic("soft soil", unit_weight, 5.0));
    let mut profile = soft_over_stiff_profile(soil);

    let motion = sine_motion(5.0, 0.1, 10.0, 0.005);

    let mut calc = SiteResponseCalculator::new(IterationMode::LinearElastic);
    calc.run(&motion, &mut profile, &CancelToken::new()).unwrap();

    // Hand-built field with the initial properties
    let mut field = WaveField::new(profile.sub_layer_count(), motion.freq_count());
    for i in 0..=profile.sub_layer_count() {
        field.fill_layer_modulus(
            i,
            complex_shear_modulus(profile.shear_mod(i), profile.damping(i) / 100.0),
        );
    }
    field.calc_waves(&profile, &motion).unwrap();

    let input = profile.input_location();
    let expected = field.accel_tf(
        &input,
        MotionType::Within,
        &Location::surface(),
        MotionType::Outcrop,
    );
    let actual = calc.field().accel_tf(
        &input,
        MotionType::Within,
        &Location::surface(),
        MotionType::Outcrop,
    );

    for (a, b) in actual.iter().zip(&expected) {
        assert_relative_eq!(a.re, b.re, max_relative = 1e-12, epsilon = 1e-12);
        assert_relative_eq!(a.im, b.im, max_relative = 1e-12, epsilon = 1e-12);
    }
}
