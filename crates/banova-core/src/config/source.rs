//! Named data sources and their preset analyses.

use std::str::FromStr;

use banova_common::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::contrast::Contrast;
use crate::data::{Factor, ResponseTransform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum DataSource {
    /// Seaweed grazing experiment (Qian and Shen 2007): `TREAT` x `BLOCK`, `COVER`.
    #[serde(rename = "QianS2007")]
    QianS2007,
    /// Faculty salaries: `Org` x `Post`, `Salary`.
    #[serde(rename = "Salary")]
    Salary,
    #[serde(rename = "Random")]
    Random,
    #[serde(rename = "Ex19.3")]
    Ex19_3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Available,
    NotImplemented,
}

/// Row of `banova sources`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceInfo {
    pub name: String,
    pub status: SourceStatus,
    pub factor1: Option<String>,
    pub factor2: Option<String>,
    pub response: Option<String>,
    pub transform: ResponseTransform,
    pub preset_contrasts: Vec<String>,
}

impl DataSource {
    pub const ALL: [DataSource; 4] = [
        DataSource::QianS2007,
        DataSource::Salary,
        DataSource::Random,
        DataSource::Ex19_3,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DataSource::QianS2007 => "QianS2007",
            DataSource::Salary => "Salary",
            DataSource::Random => "Random",
            DataSource::Ex19_3 => "Ex19.3",
        }
    }

    pub fn status(self) -> SourceStatus {
        match self {
            DataSource::QianS2007 | DataSource::Salary => SourceStatus::Available,
            DataSource::Random | DataSource::Ex19_3 => SourceStatus::NotImplemented,
        }
    }

    /// Fails with `UnsupportedSource` for declared sources without a loader.
    pub fn ensure_supported(self) -> Result<()> {
        match self.status() {
            SourceStatus::Available => Ok(()),
            SourceStatus::NotImplemented => Err(Error::UnsupportedSource(self.name().to_string())),
        }
    }

    /// Column names: `(factor1, factor2, response)`.
    pub fn columns(self) -> Option<(&'static str, &'static str, &'static str)> {
        match self {
            DataSource::QianS2007 => Some(("TREAT", "BLOCK", "COVER")),
            DataSource::Salary => Some(("Org", "Post", "Salary")),
            DataSource::Random | DataSource::Ex19_3 => None,
        }
    }

    /// Response transform applied before standardizing.
    pub fn transform(self) -> ResponseTransform {
        match self {
            DataSource::QianS2007 => ResponseTransform::LogitPercent,
            _ => ResponseTransform::Identity,
        }
    }

    /// Contrasts the source's analysis reports by default.
    ///
    /// Weights follow the sorted level order of each factor.
    pub fn preset_contrasts(self) -> Result<Vec<Contrast>> {
        self.ensure_supported()?;
        Ok(match self {
            DataSource::QianS2007 => vec![
                Contrast::main_effect(
                    "f_Effect",
                    Factor::X1,
                    vec![1.0 / 2.0, -1.0 / 2.0, 0.0, 1.0 / 2.0, -1.0 / 2.0, 0.0],
                ),
                Contrast::main_effect(
                    "F_Effect",
                    Factor::X1,
                    vec![0.0, 1.0 / 2.0, -1.0 / 2.0, 0.0, 1.0 / 2.0, -1.0 / 2.0],
                ),
                Contrast::main_effect(
                    "L_Effect",
                    Factor::X1,
                    vec![
                        1.0 / 3.0,
                        1.0 / 3.0,
                        1.0 / 3.0,
                        -1.0 / 3.0,
                        -1.0 / 3.0,
                        -1.0 / 3.0,
                    ],
                ),
            ],
            DataSource::Salary => vec![
                Contrast::main_effect("BFINvCEDP", Factor::X1, vec![1.0, -1.0, 0.0, 0.0]),
                Contrast::main_effect("CEDPvTHTR", Factor::X1, vec![0.0, 1.0, 0.0, -1.0]),
                Contrast::main_effect("FT1vFT2", Factor::X2, vec![1.0, -1.0, 0.0]),
                Contrast::main_effect("FT2vFT3", Factor::X2, vec![0.0, 1.0, -1.0]),
                Contrast::interaction(
                    "CHEMvTHTRxFT1vFT3",
                    vec![0.0, 0.0, 1.0, -1.0],
                    vec![1.0, 0.0, -1.0],
                ),
                Contrast::interaction(
                    "BFINvOTHxFT1vOTH",
                    vec![1.0, -1.0 / 3.0, -1.0 / 3.0, -1.0 / 3.0],
                    vec![1.0, -1.0 / 2.0, -1.0 / 2.0],
                ),
            ],
            DataSource::Random | DataSource::Ex19_3 => Vec::new(),
        })
    }

    pub fn info(self) -> SourceInfo {
        let columns = self.columns();
        SourceInfo {
            name: self.name().to_string(),
            status: self.status(),
            factor1: columns.map(|c| c.0.to_string()),
            factor2: columns.map(|c| c.1.to_string()),
            response: columns.map(|c| c.2.to_string()),
            transform: self.transform(),
            preset_contrasts: self
                .preset_contrasts()
                .map(|cs| cs.into_iter().map(|c| c.name).collect())
                .unwrap_or_default(),
        }
    }
}

impl FromStr for DataSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DataSource::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownSource(s.to_string()))
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contrast::ContrastSet;

    #[test]
    fn names_round_trip() {
        for source in DataSource::ALL {
            assert_eq!(source.name().parse::<DataSource>().unwrap(), source);
            assert_eq!(
                serde_json::to_string(&source).unwrap(),
                format!("\"{}\"", source.name())
            );
        }
        assert_eq!("salary".parse::<DataSource>().unwrap(), DataSource::Salary);
    }

    #[test]
    fn unknown_source() {
        let err = "Iris".parse::<DataSource>().unwrap_err();
        assert!(matches!(err, Error::UnknownSource(_)));
    }

    #[test]
    fn unimplemented_sources_fail_explicitly() {
        for source in [DataSource::Random, DataSource::Ex19_3] {
            let err = source.preset_contrasts().unwrap_err();
            assert!(matches!(err, Error::UnsupportedSource(ref n) if n == source.name()));
            assert!(err.to_string().contains("not yet implemented"));
        }
    }

    #[test]
    fn salary_presets_fit_a_four_by_three_design() {
        let mut set = ContrastSet::new(4, 3);
        set.extend(DataSource::Salary.preset_contrasts().unwrap())
            .unwrap();
        assert_eq!(set.len(), 6);
    }

    #[test]
    fn qian_presets_fit_six_treatments() {
        let mut set = ContrastSet::new(6, 8);
        set.extend(DataSource::QianS2007.preset_contrasts().unwrap())
            .unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(DataSource::QianS2007.transform(), ResponseTransform::LogitPercent);
    }

    #[test]
    fn info_lists_columns_and_contrasts() {
        let info = DataSource::Salary.info();
        assert_eq!(info.status, SourceStatus::Available);
        assert_eq!(info.factor1.as_deref(), Some("Org"));
        assert_eq!(info.preset_contrasts.len(), 6);

        let info = DataSource::Random.info();
        assert_eq!(info.status, SourceStatus::NotImplemented);
        assert!(info.preset_contrasts.is_empty());
    }
}
