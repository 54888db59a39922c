pub mod calculations;
pub mod db;
pub mod error;
pub mod models;

#[cfg(test)]
mod fixtures;

pub use db::{DbConfig, PlannerRepository, RepositoryError, RepositoryFactory, RepositoryRegistry};
pub use error::{CalculationError, Component, ConfigError};
pub use models::*;
