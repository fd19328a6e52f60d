//! Cross-model pipeline behavior: the whole catalogue driven the way
//! the calculator drives it — prepare once, then compute per rupture
//! with whatever IMT pairs the run produced.

use temblor_core::{ConfigError, Imt};
use temblor_sep::{instantiate, supported_models, PerilParams};
use temblor_test_utils::peril_site_collection;

const MAGNITUDE: f64 = 6.5;

fn all_models_prepared() -> (
    Vec<Box<dyn temblor_sep::SecondaryPeril>>,
    temblor_core::SiteCollection,
) {
    let names: Vec<String> = supported_models().iter().map(|s| s.to_string()).collect();
    let models = instantiate(&names, &PerilParams::new()).unwrap();
    let mut sites = peril_site_collection();
    for model in &models {
        model.prepare(&mut sites).unwrap();
    }
    (models, sites)
}

#[test]
fn full_catalogue_computes_with_both_imts() {
    let (models, sites) = all_models_prepared();
    let subset = sites.filter_by_distance(0.0, 0.0, None).unwrap();
    let pga = vec![0.3; sites.len()];
    let pgv = vec![30.0; sites.len()];
    let pairs = [(Imt::Pga, pga.as_slice()), (Imt::Pgv, pgv.as_slice())];

    for model in &models {
        let outputs = model.compute(MAGNITUDE, &pairs, &sites, &subset).unwrap();
        assert!(!outputs.is_empty(), "{} produced nothing", model.name());
        for out in &outputs {
            assert!(
                model.outputs().contains(&out.imt),
                "{} emitted undeclared output {}",
                model.name(),
                out.imt
            );
            assert_eq!(out.values.len(), subset.len());
            assert!(out.values.iter().all(|v| v.is_finite()));
        }
    }
}

#[test]
fn single_imt_models_skip_silently_when_input_is_absent() {
    let (models, sites) = all_models_prepared();
    let subset = sites.filter_by_distance(0.0, 0.0, None).unwrap();
    let pgv = vec![30.0; sites.len()];
    let pgv_only = [(Imt::Pgv, pgv.as_slice())];

    for model in &models {
        if model.name() == "RashidianBaise2020Liquefaction"
            || model.name() == "AllstadtEtAl2022Liquefaction"
        {
            continue;
        }
        // PGA-only models see nothing they need and contribute nothing;
        // PGV models produce their column. Either way, no error.
        let outputs = model.compute(MAGNITUDE, &pgv_only, &sites, &subset).unwrap();
        for out in &outputs {
            assert_eq!(out.values.len(), subset.len());
        }
    }
}

#[test]
fn dual_mandatory_models_raise_on_a_missing_imt() {
    let (models, sites) = all_models_prepared();
    let subset = sites.filter_by_distance(0.0, 0.0, None).unwrap();
    let pga = vec![0.3; sites.len()];
    let pgv = vec![30.0; sites.len()];

    for name in ["RashidianBaise2020Liquefaction", "AllstadtEtAl2022Liquefaction"] {
        let model = models
            .iter()
            .find(|m| m.name() == name)
            .unwrap_or_else(|| panic!("{name} not in catalogue"));

        let pga_only = [(Imt::Pga, pga.as_slice())];
        assert!(
            matches!(
                model.compute(MAGNITUDE, &pga_only, &sites, &subset),
                Err(ConfigError::MandatoryImtMissing { imt: Imt::Pgv, .. })
            ),
            "{name} accepted a PGA-only call"
        );

        let pgv_only = [(Imt::Pgv, pgv.as_slice())];
        assert!(
            matches!(
                model.compute(MAGNITUDE, &pgv_only, &sites, &subset),
                Err(ConfigError::MandatoryImtMissing { imt: Imt::Pga, .. })
            ),
            "{name} accepted a PGV-only call"
        );
    }
}

#[test]
fn newmark_without_prepare_is_a_config_error() {
    let models = instantiate(
        &["NewmarkDisplacement".to_string()],
        &PerilParams::new(),
    )
    .unwrap();
    let sites = peril_site_collection();
    let subset = sites.filter_by_distance(0.0, 0.0, None).unwrap();
    let pga = vec![0.3; sites.len()];
    let pairs = [(Imt::Pga, pga.as_slice())];
    assert!(matches!(
        models[0].compute(MAGNITUDE, &pairs, &sites, &subset),
        Err(ConfigError::PerilNotPrepared { .. })
    ));
}

#[test]
fn double_prepare_rejects_duplicate_columns() {
    // Two models caching the same derived columns is the misconfigured
    // case the column guard exists for.
    let models = instantiate(
        &["NewmarkDisplacement".to_string()],
        &PerilParams::new(),
    )
    .unwrap();
    let mut sites = peril_site_collection();
    models[0].prepare(&mut sites).unwrap();
    assert!(models[0].prepare(&mut sites).is_err());
}
