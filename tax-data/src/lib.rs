pub mod bracket_csv;
pub mod config_loader;
pub mod fields;
pub mod rsu_csv;

pub use bracket_csv::{BracketCsvError, BracketCsvLoader, BracketRecord};
pub use config_loader::{ConfigLoadError, TaxYearConfigLoader};
pub use fields::{FieldError, parse_date, parse_money, parse_share_count};
pub use rsu_csv::{RsuCsvError, RsuCsvLoader, RsuImport};
