//! Table-driven tests for the parameter resolver.

use forecast_common::parameter::{resolve, KELVIN_OFFSET, MS_TO_KNOTS};
use forecast_common::{
    Colormap, Derivation, ForecastError, ForecastStep, GriddedField, Parameter, RenderMode,
    UnitConversion,
};

fn step(h: i64) -> ForecastStep {
    ForecastStep::new(h).unwrap()
}

struct Case {
    input: &'static str,
    fields: &'static [&'static str],
    label: &'static str,
    range: (f32, f32),
    mode: RenderMode,
    colormap: Colormap,
}

const CASES: &[Case] = &[
    Case {
        input: "Curah Hujan per jam (pratesfc)",
        fields: &["pratesfc"],
        label: "Curah Hujan (mm/jam)",
        range: (0.0, 50.0),
        mode: RenderMode::Filled,
        colormap: Colormap::Blues,
    },
    Case {
        input: "Suhu Permukaan (tmp2m)",
        fields: &["tmp2m"],
        label: "Suhu (°C)",
        range: (-5.0, 35.0),
        mode: RenderMode::Filled,
        colormap: Colormap::Coolwarm,
    },
    Case {
        input: "Angin Permukaan (ugrd10m & vgrd10m)",
        fields: &["ugrd10m", "vgrd10m"],
        label: "Kecepatan Angin (knot)",
        range: (0.0, 30.0),
        mode: RenderMode::FilledWithVectors,
        colormap: Colormap::RdYlGnReversed { bins: 10 },
    },
    Case {
        input: "Tekanan Permukaan Laut (prmslmsl)",
        fields: &["prmslmsl"],
        label: "Tekanan Permukaan Laut (hPa)",
        range: (990.0, 1025.0),
        mode: RenderMode::Contour { levels: 15 },
        colormap: Colormap::Cool,
    },
];

#[test]
fn test_resolver_table() {
    for case in CASES {
        let spec = resolve(case.input, step(6)).unwrap();
        assert_eq!(spec.fields, case.fields, "{}", case.input);
        assert_eq!(spec.label, case.label, "{}", case.input);
        assert_eq!(spec.value_range, case.range, "{}", case.input);
        assert_eq!(spec.render_mode, case.mode, "{}", case.input);
        assert_eq!(spec.colormap, case.colormap, "{}", case.input);
        assert_eq!(spec.step.hour(), 6);
    }
}

#[test]
fn test_bare_identifiers() {
    assert_eq!(Parameter::from_identifier("pratesfc").unwrap(), Parameter::PrecipitationRate);
    assert_eq!(Parameter::from_identifier("TMP2M").unwrap(), Parameter::Temperature2m);
    assert_eq!(Parameter::from_identifier("ugrd10m").unwrap(), Parameter::Wind10m);
    assert_eq!(Parameter::from_identifier("prmslmsl").unwrap(), Parameter::MeanSeaLevelPressure);
}

#[test]
fn test_invalid_parameter() {
    for input in ["", "rh2m", "Kelembapan", "vgrd10m"] {
        let err = resolve(input, step(0)).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)), "{input}");
    }
}

#[test]
fn test_temperature_derivation_exact() {
    let spec = resolve("tmp2m", step(0)).unwrap();
    let field = GriddedField::constant("tmp2m", vec![-10.0], vec![121.5], 300.15);
    let derived = spec.derivation.apply(&[field], "t").unwrap();
    assert_eq!(derived.values, vec![27.0]);
    assert_eq!(
        spec.derivation,
        Derivation::Convert(UnitConversion::Offset(-KELVIN_OFFSET))
    );
}

#[test]
fn test_precipitation_derivation() {
    let spec = resolve("pratesfc", step(0)).unwrap();
    let field = GriddedField::constant("pratesfc", vec![-10.0], vec![121.5], 0.002);
    let derived = spec.derivation.apply(&[field], "p").unwrap();
    assert!((derived.values[0] - 7.2).abs() < 1e-4);
}

#[test]
fn test_pressure_derivation() {
    let spec = resolve("prmsl", step(0)).unwrap();
    let field = GriddedField::constant("prmslmsl", vec![-10.0], vec![121.5], 101_000.0);
    let derived = spec.derivation.apply(&[field], "p").unwrap();
    assert!((derived.values[0] - 1010.0).abs() < 1e-3);
}

#[test]
fn test_wind_derivation() {
    let spec = resolve("ugrd10m", step(0)).unwrap();
    let u = GriddedField::constant("ugrd10m", vec![-10.0, -9.75], vec![121.5], 3.0);
    let v = GriddedField::constant("vgrd10m", vec![-10.0, -9.75], vec![121.5], 4.0);
    let speed = spec.derivation.apply(&[u, v], "speed").unwrap();
    for value in speed.values {
        assert!((value - 5.0 * MS_TO_KNOTS).abs() < 1e-4);
        assert!((value - 9.7192).abs() < 1e-4);
    }
}

#[test]
fn test_wind_derivation_needs_two_fields() {
    let spec = resolve("ugrd10m", step(0)).unwrap();
    let u = GriddedField::constant("ugrd10m", vec![0.0], vec![0.0], 3.0);
    assert!(spec.derivation.apply(&[u], "speed").is_err());
}

#[test]
fn test_unit_conversion_needs_one_field() {
    let spec = resolve("tmp2m", step(0)).unwrap();
    let a = GriddedField::constant("tmp2m", vec![0.0], vec![0.0], 300.0);
    let b = a.clone();
    assert!(spec.derivation.apply(&[a, b], "t").is_err());
    assert!(spec.derivation.apply(&[], "t").is_err());
}

#[test]
fn test_wind_derivation_grid_mismatch() {
    let spec = resolve("ugrd10m", step(0)).unwrap();
    let u = GriddedField::constant("ugrd10m", vec![0.0], vec![0.0], 3.0);
    let v = GriddedField::constant("vgrd10m", vec![0.25], vec![0.0], 4.0);
    assert!(spec.derivation.apply(&[u, v], "speed").is_err());
}

#[test]
fn test_constant_precipitation_field() {
    let spec = resolve("pratesfc", step(0)).unwrap();
    let lats: Vec<f64> = (0..9).map(|j| -12.0 + j as f64 * 0.25).collect();
    let lons: Vec<f64> = (0..9).map(|i| 121.0 + i as f64 * 0.25).collect();
    let field = GriddedField::constant("pratesfc", lats, lons, 0.01);
    let bbox = forecast_common::Region::builtin("sabu-raijua").unwrap().bbox;
    let subset = field.subset(&bbox).unwrap();
    let derived = spec.derivation.apply(&[subset], "p").unwrap();
    assert!(!derived.values.is_empty());
    for v in derived.values {
        assert!((v - 36.0).abs() < 1e-4);
    }
}
