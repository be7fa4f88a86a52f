//! The end-to-end analysis: standardize, build, sample, process, contrast.
//!
//! Every validation (config, contrasts, response, model shapes) runs before the
//! sampler starts. A failure at any stage returns the error and nothing else.

use banova_common::Result;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::RunConfig;
use crate::contrast::{Contrast, ContrastDraws, ContrastSet};
use crate::data::{Dataset, Standardizer};
use crate::logging::{event_names, generate_run_id, LogContext, Stage};
use crate::model::{ModelBuilder, ParameterLayout};
use crate::posterior::{PosteriorProcessor, PosteriorSamples};
use crate::sampler::{CancelToken, Chain, LogDensity, MetropolisSampler};

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub run_id: String,
    pub seed: u64,
    pub config: RunConfig,
    pub standardizer: Standardizer,
    /// Dataset on the standardized scale, as the model saw it.
    pub standardized: Dataset,
    pub layout: ParameterLayout,
    pub coordinate_names: Vec<String>,
    pub chain: Chain,
    pub posterior: PosteriorSamples,
    pub contrasts: Vec<ContrastDraws>,
}

/// One configured analysis.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: RunConfig,
    log: LogContext,
}

impl Pipeline {
    /// Validates `config` up front.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            log: LogContext::new(generate_run_id()),
        })
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.log = LogContext::new(run_id);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.log.run_id
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the analysis on a raw-scale dataset.
    pub fn run(&self, data: &Dataset, contrasts: Vec<Contrast>, cancel: &CancelToken) -> Result<Analysis> {
        let _run = self.log.run_span().entered();
        let config = &self.config;
        let seed = config.seed.unwrap_or_else(rand::random::<u64>);

        tracing::info!(
            target: event_names::RUN_STARTED,
            observations = data.len(),
            chain_length = config.chain_length,
            seed,
            "analysis started"
        );

        let mut registry = ContrastSet::for_dataset(data);
        registry.extend(contrasts)?;

        let standardizer = self.log.stage_span(Stage::Standardize).in_scope(|| {
            let standardizer = Standardizer::fit(&data.response())?;
            tracing::debug!(
                target: event_names::STANDARDIZE_FINISHED,
                mean = standardizer.mean(),
                std = standardizer.std(),
                "response standardized"
            );
            Ok::<_, banova_common::Error>(standardizer)
        })?;
        let standardized = data.map_response(|v| standardizer.standardize(v));

        let model = self.log.stage_span(Stage::Build).in_scope(|| {
            let model = ModelBuilder::new(&standardized)
                .constants(config.prior_constants())
                .build()?;
            tracing::debug!(
                target: event_names::BUILD_FINISHED,
                dim = model.dim(),
                "model built"
            );
            Ok::<_, banova_common::Error>(model)
        })?;

        let sampler = MetropolisSampler::new(config.sampler_settings())?;
        let (start, info) = self
            .log
            .stage_span(Stage::Optimize)
            .in_scope(|| sampler.initialize(&model))?;

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let chain = self
            .log
            .stage_span(Stage::Sample)
            .in_scope(|| sampler.sample_from(&model, start, info, &mut rng, cancel))?;

        let posterior = self.log.stage_span(Stage::Process).in_scope(|| {
            let posterior = PosteriorProcessor::new(config.burnin, config.thin)?.process(
                &chain,
                model.layout(),
                model.prior(),
                &standardizer,
            )?;
            tracing::debug!(
                target: event_names::PROCESS_FINISHED,
                retained = posterior.len(),
                "posterior processed"
            );
            Ok::<_, banova_common::Error>(posterior)
        })?;

        let contrast_draws = self
            .log
            .stage_span(Stage::Contrast)
            .in_scope(|| registry.evaluate(&posterior))?;

        tracing::info!(
            target: event_names::RUN_FINISHED,
            retained = posterior.len(),
            contrasts = contrast_draws.len(),
            acceptance = chain.overall_acceptance(),
            "analysis finished"
        );

        let layout = *model.layout();
        let coordinate_names = model.coordinate_names();

        Ok(Analysis {
            run_id: self.log.run_id.clone(),
            seed,
            config: config.clone(),
            standardizer,
            standardized,
            layout,
            coordinate_names,
            chain,
            posterior,
            contrasts: contrast_draws,
        })
    }
}

/// Validate `config`, then run one analysis with a fresh run id.
pub fn run_analysis(
    data: &Dataset,
    contrasts: Vec<Contrast>,
    config: &RunConfig,
    cancel: &CancelToken,
) -> Result<Analysis> {
    Pipeline::new(config.clone())?.run(data, contrasts, cancel)
}
