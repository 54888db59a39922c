//! Tax-year configuration files.
//!
//! A configuration is a TOML document holding every constant the engine
//! needs for one tax year and filing status. Bracket tables are given inline
//! or in a bracket CSV named by `brackets_csv`, resolved relative to the TOML
//! file.
//!
//! ```toml
//! tax_year = 2025
//! filing_status = "MFJ"
//!
//! [[jurisdictions]]
//! id = "federal"
//! name = "Federal"
//! standard_deduction = "30000"
//! brackets_csv = "brackets_2025_mfj.csv"
//!
//! [fica]
//! social_security_rate = "0.062"
//! # ...
//! ```
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{
    Bracket, BracketTable, ConfigError, FicaConfig, FilingStatusCode, JurisdictionConfig,
    QuarterlyConfig, RetirementPlanConfig, TaxYearConfig,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::bracket_csv::{BracketCsvError, BracketCsvLoader};

const BUNDLED_2025_MFJ: &str = include_str!("../data/tax_year_2025_mfj.toml");

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tax-year configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown filing status '{0}'")]
    UnknownFilingStatus(String),

    #[error("jurisdiction '{0}' sets both inline brackets and brackets_csv")]
    ConflictingBrackets(String),

    #[error("jurisdiction '{0}' has no brackets")]
    MissingBrackets(String),

    #[error("bracket file {}: {source}", path.display())]
    BracketCsv {
        path: PathBuf,
        #[source]
        source: BracketCsvError,
    },

    #[error("bracket file {} has no rows for jurisdiction '{jurisdiction}'", path.display())]
    MissingBracketRows { path: PathBuf, jurisdiction: String },

    #[error("invalid tax-year configuration: {0}")]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    tax_year: i32,
    filing_status: String,
    jurisdictions: Vec<RawJurisdiction>,
    fica: FicaConfig,
    retirement_plan: RetirementPlanConfig,
    quarterly: QuarterlyConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawJurisdiction {
    id: String,
    name: String,
    #[serde(default)]
    standard_deduction: Decimal,
    #[serde(default)]
    sourced_only: bool,
    #[serde(default)]
    credit_for_taxes_paid_to: Vec<String>,
    #[serde(default)]
    brackets: Option<Vec<Bracket>>,
    #[serde(default)]
    brackets_csv: Option<PathBuf>,
}

pub struct TaxYearConfigLoader;

impl TaxYearConfigLoader {
    /// The built-in 2025 Married Filing Jointly configuration.
    pub fn bundled() -> Result<TaxYearConfig, ConfigLoadError> {
        Self::parse_str(BUNDLED_2025_MFJ, Path::new("."))
    }

    pub fn from_file(path: &Path) -> Result<TaxYearConfig, ConfigLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::parse_str(&contents, base_dir)?;
        info!(
            path = %path.display(),
            tax_year = config.tax_year,
            filing_status = %config.filing_status,
            "Loaded tax-year configuration"
        );
        Ok(config)
    }

    /// Parses and validates a configuration. `base_dir` resolves relative
    /// `brackets_csv` paths.
    pub fn parse_str(
        contents: &str,
        base_dir: &Path,
    ) -> Result<TaxYearConfig, ConfigLoadError> {
        let raw: RawConfig = toml::from_str(contents)?;

        let filing_status = FilingStatusCode::parse(&raw.filing_status)
            .ok_or_else(|| ConfigLoadError::UnknownFilingStatus(raw.filing_status.clone()))?;

        let mut csv_tables: BTreeMap<PathBuf, BTreeMap<String, BracketTable>> = BTreeMap::new();
        let jurisdictions = raw
            .jurisdictions
            .into_iter()
            .map(|jurisdiction| Self::jurisdiction(jurisdiction, base_dir, &mut csv_tables))
            .collect::<Result<Vec<_>, _>>()?;

        let config = TaxYearConfig {
            tax_year: raw.tax_year,
            filing_status,
            jurisdictions,
            fica: raw.fica,
            retirement_plan: raw.retirement_plan,
            quarterly: raw.quarterly,
        };
        config.validate()?;
        Ok(config)
    }

    fn jurisdiction(
        raw: RawJurisdiction,
        base_dir: &Path,
        csv_tables: &mut BTreeMap<PathBuf, BTreeMap<String, BracketTable>>,
    ) -> Result<JurisdictionConfig, ConfigLoadError> {
        let brackets = match (raw.brackets, raw.brackets_csv) {
            (Some(_), Some(_)) => return Err(ConfigLoadError::ConflictingBrackets(raw.id)),
            (None, None) => return Err(ConfigLoadError::MissingBrackets(raw.id)),
            (Some(brackets), None) => {
                BracketTable::new(brackets).map_err(|source| ConfigError::Brackets {
                    jurisdiction: raw.id.clone(),
                    source,
                })?
            }
            (None, Some(csv_path)) => {
                let path = base_dir.join(csv_path);
                if !csv_tables.contains_key(&path) {
                    let tables = Self::load_bracket_csv(&path)?;
                    csv_tables.insert(path.clone(), tables);
                }
                csv_tables
                    .get(&path)
                    .and_then(|tables| tables.get(&raw.id))
                    .cloned()
                    .ok_or_else(|| ConfigLoadError::MissingBracketRows {
                        path: path.clone(),
                        jurisdiction: raw.id.clone(),
                    })?
            }
        };

        Ok(JurisdictionConfig {
            id: raw.id,
            name: raw.name,
            brackets,
            standard_deduction: raw.standard_deduction,
            sourced_only: raw.sourced_only,
            credit_for_taxes_paid_to: raw.credit_for_taxes_paid_to,
        })
    }

    fn load_bracket_csv(path: &Path) -> Result<BTreeMap<String, BracketTable>, ConfigLoadError> {
        let file = File::open(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tables = BracketCsvLoader::load(file).map_err(|source| ConfigLoadError::BracketCsv {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), tables = tables.len(), "Loaded bracket CSV");
        Ok(tables)
    }
}
