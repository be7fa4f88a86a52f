//! End-to-end pipeline tests: raw dataset in, contrast draws out.

use banova_common::Error;
use banova_core::config::{DataSource, RunConfig};
use banova_core::contrast::{Contrast, ContrastDocument};
use banova_core::data::{DataDocument, Dataset, Factor, ResponseTransform};
use banova_core::sampler::CancelToken;
use banova_core::{run_analysis, Pipeline};

fn two_by_two() -> Dataset {
    Dataset::new(&[1.0, 2.0, 3.0, 4.0], &[0, 0, 1, 1], &[0, 1, 0, 1], 2, 2).unwrap()
}

fn short_chain(seed: u64) -> RunConfig {
    RunConfig {
        chain_length: 1000,
        burnin: 100,
        thin: 1,
        seed: Some(seed),
        ..RunConfig::default()
    }
}

/// A replicated 3 x 2 design with clear x1 effects.
fn replicated() -> Dataset {
    let mut values = Vec::new();
    let mut l1 = Vec::new();
    let mut l2 = Vec::new();
    let means = [[10.0, 11.0], [14.0, 15.0], [10.5, 11.5]];
    let noise = [-0.3, 0.1, 0.25, -0.05];
    for (i, row) in means.iter().enumerate() {
        for (j, m) in row.iter().enumerate() {
            for e in noise {
                values.push(m + e);
                l1.push(i);
                l2.push(j);
            }
        }
    }
    Dataset::new(&values, &l1, &l2, 3, 2).unwrap()
}

#[test]
fn two_by_two_run_yields_one_value_per_retained_draw() {
    let contrasts = vec![Contrast::main_effect("AvB", Factor::X1, vec![1.0, -1.0])];
    let analysis =
        run_analysis(&two_by_two(), contrasts, &short_chain(1), &CancelToken::new()).unwrap();

    assert_eq!(analysis.chain.len(), 1000);
    assert_eq!(analysis.posterior.len(), 900);
    assert_eq!(analysis.contrasts.len(), 1);
    assert_eq!(analysis.contrasts[0].draws.len(), 900);

    for sample in analysis.posterior.iter() {
        assert!(sample.b1.iter().sum::<f64>().abs() < 1e-9);
        assert!(sample.b2.iter().sum::<f64>().abs() < 1e-9);
        assert!(sample.sigma > 0.0);
    }
}

#[test]
fn all_zero_contrast_is_exactly_zero() {
    let contrasts = vec![
        Contrast::main_effect("zero_x2", Factor::X2, vec![0.0, 0.0]),
        Contrast::interaction("zero_x1x2", vec![0.0, 0.0], vec![0.0, 0.0]),
    ];
    let analysis =
        run_analysis(&two_by_two(), contrasts, &short_chain(2), &CancelToken::new()).unwrap();
    for draws in &analysis.contrasts {
        assert!(draws.draws.iter().all(|v| *v == 0.0), "{}", draws.name);
    }
}

#[test]
fn wrong_length_contrast_fails_before_sampling() {
    let contrasts = vec![Contrast::main_effect("bad", Factor::X1, vec![1.0, -1.0, 0.0])];
    let err =
        run_analysis(&two_by_two(), contrasts, &short_chain(3), &CancelToken::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::ContrastDimension {
            expected: 2,
            actual: 3,
            ..
        }
    ));
}

#[test]
fn constant_response_is_rejected() {
    let data = Dataset::new(&[5.0; 4], &[0, 0, 1, 1], &[0, 1, 0, 1], 2, 2).unwrap();
    let err = run_analysis(&data, Vec::new(), &short_chain(4), &CancelToken::new()).unwrap_err();
    assert!(matches!(err, Error::DataValidation(_)));
}

#[test]
fn constant_response_with_inexact_mean_is_rejected() {
    let cases = [
        Dataset::new(&[0.1; 3], &[0, 0, 1], &[0, 1, 0], 2, 2).unwrap(),
        Dataset::new(&[123.456; 5], &[0, 0, 1, 1, 0], &[0, 1, 0, 1, 0], 2, 2).unwrap(),
    ];
    for data in cases {
        let err = run_analysis(&data, Vec::new(), &short_chain(4), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, Error::DataValidation(_)), "{err}");
    }
}

#[test]
fn invalid_chain_settings_are_rejected() {
    let config = RunConfig {
        chain_length: 100,
        burnin: 100,
        ..RunConfig::default()
    };
    let err = run_analysis(&two_by_two(), Vec::new(), &config, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "burnin"));
}

#[test]
fn equal_seeds_reproduce_the_run() {
    let contrasts = || vec![Contrast::main_effect("AvB", Factor::X1, vec![1.0, -1.0])];
    let a = run_analysis(&two_by_two(), contrasts(), &short_chain(9), &CancelToken::new()).unwrap();
    let b = run_analysis(&two_by_two(), contrasts(), &short_chain(9), &CancelToken::new()).unwrap();
    assert_eq!(a.contrasts, b.contrasts);
    assert_eq!(a.chain.log_densities(), b.chain.log_densities());
    assert_eq!(a.seed, 9);
}

#[test]
fn missing_seed_is_drawn_and_reported() {
    let config = RunConfig {
        seed: None,
        ..short_chain(0)
    };
    let a = run_analysis(&two_by_two(), Vec::new(), &config, &CancelToken::new()).unwrap();
    let replay = run_analysis(
        &two_by_two(),
        Vec::new(),
        &RunConfig {
            seed: Some(a.seed),
            ..config.clone()
        },
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(a.chain.log_densities(), replay.chain.log_densities());
}

#[test]
fn cancelled_run_returns_no_result() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = run_analysis(&two_by_two(), Vec::new(), &short_chain(5), &cancel).unwrap_err();
    assert!(matches!(err, Error::Cancelled { completed: 0, .. }));
}

#[test]
fn replicated_design_recovers_the_main_effect() {
    let config = RunConfig {
        chain_length: 6000,
        burnin: 1000,
        thin: 5,
        seed: Some(17),
        ..RunConfig::default()
    };
    let contrasts = vec![
        Contrast::main_effect("BvA", Factor::X1, vec![-1.0, 1.0, 0.0]),
        Contrast::main_effect("uvv", Factor::X2, vec![1.0, -1.0]),
    ];
    let analysis = run_analysis(&replicated(), contrasts, &config, &CancelToken::new()).unwrap();
    assert_eq!(analysis.posterior.len(), 1000);

    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
    // Cell means differ by about 4 between x1 levels 0 and 1 and by 1 between x2 levels.
    let bva = mean(&analysis.contrasts[0].draws);
    let uvv = mean(&analysis.contrasts[1].draws);
    assert!((bva - 4.0).abs() < 1.0, "BvA mean {bva}");
    assert!((uvv + 1.0).abs() < 0.6, "uvv mean {uvv}");

    let baseline = mean(&analysis.posterior.baseline());
    assert!((baseline - 12.0).abs() < 2.0, "baseline {baseline}");
}

#[test]
fn pipeline_keeps_its_run_id() {
    let pipeline = Pipeline::new(short_chain(6)).unwrap().with_run_id("run-fixed");
    let analysis = pipeline
        .run(&two_by_two(), Vec::new(), &CancelToken::new())
        .unwrap();
    assert_eq!(analysis.run_id, "run-fixed");
}

#[test]
fn salary_style_document_runs_with_presets() {
    let orgs = ["BFIN", "CEDP", "CHEM", "THTR"];
    let posts = ["FT1", "FT2", "FT3"];
    let mut doc = DataDocument {
        response: Vec::new(),
        factor1: Vec::new(),
        factor2: Vec::new(),
    };
    for (i, org) in orgs.iter().enumerate() {
        for (j, post) in posts.iter().enumerate() {
            for k in 0..3 {
                doc.response
                    .push(100_000.0 + 20_000.0 * i as f64 - 15_000.0 * j as f64 + 500.0 * k as f64);
                doc.factor1.push(org.to_string());
                doc.factor2.push(post.to_string());
            }
        }
    }
    let data = doc.into_dataset(DataSource::Salary.transform()).unwrap();
    let config = RunConfig {
        chain_length: 600,
        burnin: 100,
        thin: 5,
        seed: Some(21),
        ..RunConfig::default()
    };
    let analysis = run_analysis(
        &data,
        DataSource::Salary.preset_contrasts().unwrap(),
        &config,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(analysis.contrasts.len(), 6);
    assert!(analysis.contrasts.iter().all(|c| c.draws.len() == 100));
}

#[test]
fn contrast_document_feeds_the_pipeline() {
    let doc = ContrastDocument::from_json(
        r#"{"x1": {"AvB": [1, -1]}, "x1x2": {"cross": {"factor1": [1, -1], "factor2": [1, -1]}}}"#,
    )
    .unwrap();
    let analysis = run_analysis(
        &two_by_two(),
        doc.into_contrasts(),
        &short_chain(8),
        &CancelToken::new(),
    )
    .unwrap();
    let names: Vec<_> = analysis.contrasts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["AvB", "cross"]);
}

#[test]
fn logit_transform_rejects_out_of_range_percentages() {
    let doc = DataDocument {
        response: vec![10.0, 100.0],
        factor1: vec!["a".into(), "b".into()],
        factor2: vec!["u".into(), "u".into()],
    };
    let err = doc.into_dataset(ResponseTransform::LogitPercent).unwrap_err();
    assert!(matches!(err, Error::DataValidation(_)));
}
