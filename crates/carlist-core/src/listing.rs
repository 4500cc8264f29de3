//! The validated listing record and its derived attributes.
//!
//! Prices are in units of 10 000 CNY (万元), mileage in kilometres. A
//! [`ListingRecord`] can only be built through [`ListingRecord::from_fields`],
//! which enforces the numeric bounds below, so every stored record is valid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PRICE: f64 = 0.1;
pub const MAX_PRICE: f64 = 2000.0;
pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2025;
pub const MIN_MILEAGE_KM: i64 = 0;
pub const MAX_MILEAGE_KM: i64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("price {0} outside [0.1, 2000]")]
    PriceOutOfRange(f64),

    #[error("year {0} outside [2000, 2025]")]
    YearOutOfRange(i32),

    #[error("mileage {0} km outside [0, 1000000]")]
    MileageOutOfRange(i64),
}

/// Checks the primary numeric fields against the accepted bounds.
///
/// # Errors
///
/// Returns the first violated bound, checked in price, year, mileage order.
/// A `NaN` price is out of range.
pub fn validate_bounds(price: f64, year: i32, mileage_km: i64) -> Result<(), ValidationError> {
    if !(MIN_PRICE..=MAX_PRICE).contains(&price) {
        return Err(ValidationError::PriceOutOfRange(price));
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValidationError::YearOutOfRange(year));
    }
    if !(MIN_MILEAGE_KM..=MAX_MILEAGE_KM).contains(&mileage_km) {
        return Err(ValidationError::MileageOutOfRange(mileage_km));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Gasoline,
    Electric,
    PlugInHybrid,
    Hybrid,
}

impl FuelType {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FuelType::Gasoline => "汽油",
            FuelType::Electric => "电动",
            FuelType::PlugInHybrid => "插电混动",
            FuelType::Hybrid => "混动",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transmission {
    Automatic,
    Manual,
    Cvt,
    DualClutch,
}

impl Transmission {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Transmission::Automatic => "自动",
            Transmission::Manual => "手动",
            Transmission::Cvt => "CVT",
            Transmission::DualClutch => "双离合",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    Sedan,
    Suv,
    Mpv,
}

impl BodyType {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BodyType::Sedan => "轿车",
            BodyType::Suv => "SUV",
            BodyType::Mpv => "MPV",
        }
    }
}

/// Price band in 万元, lower bound inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBracket {
    Under10,
    From10To20,
    From20To30,
    From30To50,
    From50To100,
    Over100,
}

impl PriceBracket {
    #[must_use]
    pub fn for_price(price: f64) -> Self {
        if price < 10.0 {
            PriceBracket::Under10
        } else if price < 20.0 {
            PriceBracket::From10To20
        } else if price < 30.0 {
            PriceBracket::From20To30
        } else if price < 50.0 {
            PriceBracket::From30To50
        } else if price < 100.0 {
            PriceBracket::From50To100
        } else {
            PriceBracket::Over100
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PriceBracket::Under10 => "10万以下",
            PriceBracket::From10To20 => "10-20万",
            PriceBracket::From20To30 => "20-30万",
            PriceBracket::From30To50 => "30-50万",
            PriceBracket::From50To100 => "50-100万",
            PriceBracket::Over100 => "100万以上",
        }
    }
}

/// Mileage band in kilometres, lower bound inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MileageBracket {
    Under10k,
    From10kTo30k,
    From30kTo50k,
    From50kTo100k,
    Over100k,
}

impl MileageBracket {
    #[must_use]
    pub fn for_mileage(mileage_km: u32) -> Self {
        match mileage_km {
            0..=9_999 => MileageBracket::Under10k,
            10_000..=29_999 => MileageBracket::From10kTo30k,
            30_000..=49_999 => MileageBracket::From30kTo50k,
            50_000..=99_999 => MileageBracket::From50kTo100k,
            _ => MileageBracket::Over100k,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MileageBracket::Under10k => "1万公里以下",
            MileageBracket::From10kTo30k => "1-3万公里",
            MileageBracket::From30kTo50k => "3-5万公里",
            MileageBracket::From50kTo100k => "5-10万公里",
            MileageBracket::Over100k => "10万公里以上",
        }
    }
}

/// Unvalidated attributes extracted from one listing card.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFields {
    pub brand: String,
    pub model: String,
    pub price: f64,
    pub year: i32,
    pub mileage_km: i64,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub body_type: BodyType,
    pub source: String,
    pub locale: String,
    pub displacement_l: Option<f64>,
    pub color: Option<String>,
    pub condition_score: Option<f64>,
    pub fuel_consumption: Option<f64>,
    pub top_speed_kmh: Option<f64>,
    pub acceleration_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub brand: String,
    pub model: String,
    pub price: f64,
    pub year: i32,
    pub mileage_km: u32,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub body_type: BodyType,
    pub source: String,
    /// Locale code the listing was collected under (e.g. `"bj"`).
    pub locale: String,
    #[serde(default)]
    pub displacement_l: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub condition_score: Option<f64>,
    #[serde(default)]
    pub fuel_consumption: Option<f64>,
    #[serde(default)]
    pub top_speed_kmh: Option<f64>,
    #[serde(default)]
    pub acceleration_s: Option<f64>,
    pub age_years: i32,
    pub price_bracket: PriceBracket,
    pub mileage_bracket: MileageBracket,
}

impl ListingRecord {
    /// Validates `fields` and computes the derived attributes.
    ///
    /// `reference_year` is the year the age is measured against.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for a blank brand or model,
    /// or the bound error from [`validate_bounds`].
    pub fn from_fields(fields: ListingFields, reference_year: i32) -> Result<Self, ValidationError> {
        if fields.brand.trim().is_empty() {
            return Err(ValidationError::MissingField("brand"));
        }
        if fields.model.trim().is_empty() {
            return Err(ValidationError::MissingField("model"));
        }
        validate_bounds(fields.price, fields.year, fields.mileage_km)?;

        let mileage_km = u32::try_from(fields.mileage_km)
            .map_err(|_| ValidationError::MileageOutOfRange(fields.mileage_km))?;

        Ok(Self {
            age_years: reference_year - fields.year,
            price_bracket: PriceBracket::for_price(fields.price),
            mileage_bracket: MileageBracket::for_mileage(mileage_km),
            brand: fields.brand,
            model: fields.model,
            price: fields.price,
            year: fields.year,
            mileage_km,
            fuel_type: fields.fuel_type,
            transmission: fields.transmission,
            body_type: fields.body_type,
            source: fields.source,
            locale: fields.locale,
            displacement_l: fields.displacement_l,
            color: fields.color,
            condition_score: fields.condition_score,
            fuel_consumption: fields.fuel_consumption,
            top_speed_kmh: fields.top_speed_kmh,
            acceleration_s: fields.acceleration_s,
        })
    }
}

#[cfg(test)]
#[path = "listing_test.rs"]
mod tests;
