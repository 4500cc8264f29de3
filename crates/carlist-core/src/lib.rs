pub mod app_config;
pub mod config;
pub mod dataset;
pub mod listing;
pub mod locales;

pub use app_config::{AppConfig, DelayRange};
pub use config::{load_app_config, load_app_config_from_env};
pub use dataset::{dedup_records, DatasetSummary};
pub use listing::{
    validate_bounds, BodyType, FuelType, ListingFields, ListingRecord, MileageBracket,
    PriceBracket, Transmission, ValidationError, MAX_MILEAGE_KM, MAX_PRICE, MAX_YEAR,
    MIN_MILEAGE_KM, MIN_PRICE, MIN_YEAR,
};
pub use locales::{locale_display_name, DEFAULT_LOCALES};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("config validation error: {0}")]
    Validation(String),
}
