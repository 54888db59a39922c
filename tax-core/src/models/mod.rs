mod fica;
mod filing_status;
mod jurisdiction;
mod quarterly;
mod retirement;
mod rsu;
mod tax_bracket;
mod tax_year_config;

pub use fica::FicaConfig;
pub use filing_status::FilingStatusCode;
pub use jurisdiction::{JurisdictionConfig, validate_jurisdictions};
pub use quarterly::{Quarter, QuarterlyConfig, QuarterlyPayment};
pub use retirement::RetirementPlanConfig;
pub use rsu::{NewRsuVestingEvent, RsuVestingEvent, RsuVestingEventInput};
pub use tax_bracket::{Bracket, BracketBand, BracketTable, BracketTableError};
pub use tax_year_config::TaxYearConfig;
