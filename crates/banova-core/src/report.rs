//! The analysis report printed by `banova run`.

use std::fmt::Write as _;

use banova_common::{OutputFormat, Result, SCHEMA_VERSION};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigSnapshot, DataSource};
use crate::contrast::ContrastDraws;
use crate::data::{Factor, Standardizer};
use crate::pipeline::Analysis;
use crate::sampler::StartInfo;
use crate::summary::{summarize_contrasts, summarize_effects, EffectSummaries, PosteriorSummary};

/// Shape of the analysed design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DesignInfo {
    pub observations: usize,
    pub levels1: usize,
    pub levels2: usize,
    pub level_names1: Vec<String>,
    pub level_names2: Vec<String>,
    /// Observations per (x1, x2) cell, row-major.
    pub cell_counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CoordinateDiagnostics {
    pub name: String,
    pub acceptance_rate: f64,
    pub proposal_scale: Option<f64>,
}

/// How the chain behaved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SamplerDiagnostics {
    pub chain_length: usize,
    pub burnin: usize,
    pub thin: usize,
    pub retained: usize,
    pub start: StartInfo,
    pub overall_acceptance: f64,
    pub coordinates: Vec<CoordinateDiagnostics>,
}

/// Complete result of one `banova run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    pub schema_version: String,
    pub run_id: String,
    /// RFC 3339 timestamp.
    pub generated_at: String,
    /// Seed actually used, drawn from entropy when the config had none.
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DataSource>,
    pub config: ConfigSnapshot,
    pub design: DesignInfo,
    pub standardizer: Standardizer,
    pub sampler: SamplerDiagnostics,
    /// Absent only when no draws were retained.
    pub effects: Option<EffectSummaries>,
    pub contrasts: Vec<PosteriorSummary>,
    /// Raw contrast draws, included on request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draws: Option<Vec<ContrastDraws>>,
}

impl AnalysisReport {
    pub fn build(
        analysis: &Analysis,
        config: ConfigSnapshot,
        source: Option<DataSource>,
        include_draws: bool,
    ) -> Self {
        let data = &analysis.standardized;
        let options = analysis.config.summary_options();
        let names = |factor: Factor| {
            (0..data.levels(factor))
                .map(|l| data.level_label(factor, l))
                .collect::<Vec<_>>()
        };

        let chain = &analysis.chain;
        let coordinates = analysis
            .coordinate_names
            .iter()
            .zip(chain.acceptance_rates())
            .enumerate()
            .map(|(i, (name, rate))| CoordinateDiagnostics {
                name: name.clone(),
                acceptance_rate: rate,
                proposal_scale: chain.proposal_scales().get(i).copied(),
            })
            .collect();

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            run_id: analysis.run_id.clone(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            seed: analysis.seed,
            source,
            config,
            design: DesignInfo {
                observations: data.len(),
                levels1: data.levels(Factor::X1),
                levels2: data.levels(Factor::X2),
                level_names1: names(Factor::X1),
                level_names2: names(Factor::X2),
                cell_counts: data.cell_counts(),
            },
            standardizer: analysis.standardizer,
            sampler: SamplerDiagnostics {
                chain_length: chain.len(),
                burnin: analysis.posterior.burnin,
                thin: analysis.posterior.thin,
                retained: analysis.posterior.len(),
                start: chain.start().clone(),
                overall_acceptance: chain.overall_acceptance(),
                coordinates,
            },
            effects: summarize_effects(&analysis.posterior, data, &options),
            contrasts: summarize_contrasts(&analysis.contrasts, &options),
            draws: include_draws.then(|| analysis.contrasts.clone()),
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Md => Ok(self.render_md()),
            OutputFormat::Summary => Ok(self.render_summary()),
        }
    }

    fn render_md(&self) -> String {
        let mut out = String::new();
        let d = &self.design;
        let s = &self.sampler;
        let _ = writeln!(out, "# banova analysis");
        let _ = writeln!(out);
        let _ = writeln!(out, "- Run: `{}`", self.run_id);
        if let Some(source) = self.source {
            let _ = writeln!(out, "- Source: {}", source);
        }
        let _ = writeln!(
            out,
            "- Design: {} observations, {} x {} levels",
            d.observations, d.levels1, d.levels2
        );
        let _ = writeln!(out, "- Seed: {}", self.seed);
        let _ = writeln!(
            out,
            "- Chain: {} iterations, burnin {}, thin {}, {} retained",
            s.chain_length, s.burnin, s.thin, s.retained
        );
        let _ = writeln!(
            out,
            "- Start: {:?} after {} sweeps, acceptance {:.3}",
            s.start.kind, s.start.iterations, s.overall_acceptance
        );

        if let Some(effects) = &self.effects {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Effects");
            let _ = writeln!(out);
            md_table_header(&mut out, effects.baseline.credible_mass);
            md_row(&mut out, &effects.baseline);
            md_row(&mut out, &effects.sigma);
            for row in effects.b1.iter().chain(&effects.b2).chain(&effects.b1a2) {
                md_row(&mut out, row);
            }
        }

        if !self.contrasts.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Contrasts");
            let _ = writeln!(out);
            md_table_header(&mut out, self.contrasts[0].credible_mass);
            for row in &self.contrasts {
                md_row(&mut out, row);
            }
        }
        out
    }

    fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "[{}] {} retained draws, acceptance {:.3}, seed {}",
            self.run_id, self.sampler.retained, self.sampler.overall_acceptance, self.seed
        );
        if let Some(effects) = &self.effects {
            summary_line(&mut out, &effects.baseline);
            summary_line(&mut out, &effects.sigma);
        }
        for row in &self.contrasts {
            summary_line(&mut out, row);
        }
        out
    }
}

fn md_table_header(out: &mut String, mass: f64) {
    let _ = writeln!(
        out,
        "| quantity | mean | median | sd | {:.0}% HDI | P(< ref) | P(> ref) |",
        mass * 100.0
    );
    let _ = writeln!(out, "|---|---:|---:|---:|---|---:|---:|");
}

fn md_row(out: &mut String, s: &PosteriorSummary) {
    let _ = writeln!(
        out,
        "| {} | {:.4} | {:.4} | {:.4} | [{:.4}, {:.4}] | {:.3} | {:.3} |",
        s.label, s.mean, s.median, s.sd, s.hdi_lower, s.hdi_upper, s.prob_below, s.prob_above
    );
}

fn summary_line(out: &mut String, s: &PosteriorSummary) {
    let marker = if s.excludes_comparison() { "*" } else { " " };
    let _ = writeln!(
        out,
        "{}{} mean={:.4} hdi=[{:.4}, {:.4}]",
        marker, s.label, s.mean, s.hdi_lower, s.hdi_upper
    );
}
