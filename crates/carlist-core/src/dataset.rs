//! Whole-dataset operations run after collection: duplicate removal and the
//! summary printed at the end of a run.

use std::collections::{HashMap, HashSet};

use crate::listing::{ListingRecord, PriceBracket};

const TOP_N: usize = 10;

/// Drops repeated listings and rounds price and displacement to one decimal.
///
/// Two records are duplicates when brand, model, year, mileage and price all
/// match; the first occurrence wins. The price bracket is recomputed from the
/// rounded price.
#[must_use]
pub fn dedup_records(records: Vec<ListingRecord>) -> Vec<ListingRecord> {
    let mut seen: HashSet<(String, String, i32, u32, u64)> = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            seen.insert((
                r.brand.clone(),
                r.model.clone(),
                r.year,
                r.mileage_km,
                r.price.to_bits(),
            ))
        })
        .map(|mut r| {
            r.price = round_one_decimal(r.price);
            r.displacement_l = r.displacement_l.map(round_one_decimal);
            r.price_bracket = PriceBracket::for_price(r.price);
            r
        })
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Aggregate statistics over a collected dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub total: usize,
    pub by_source: Vec<(String, usize)>,
    pub top_brands: Vec<(String, usize)>,
    pub top_locales: Vec<(String, usize)>,
    pub price_min: f64,
    pub price_max: f64,
    pub price_mean: f64,
    pub year_min: i32,
    pub year_max: i32,
}

impl DatasetSummary {
    /// Returns `None` for an empty dataset.
    #[must_use]
    pub fn from_records(records: &[ListingRecord]) -> Option<Self> {
        let first = records.first()?;

        let mut price_min = first.price;
        let mut price_max = first.price;
        let mut price_sum = 0.0;
        let mut year_min = first.year;
        let mut year_max = first.year;
        for r in records {
            price_min = price_min.min(r.price);
            price_max = price_max.max(r.price);
            price_sum += r.price;
            year_min = year_min.min(r.year);
            year_max = year_max.max(r.year);
        }

        #[allow(clippy::cast_precision_loss)]
        let price_mean = price_sum / records.len() as f64;

        Some(Self {
            total: records.len(),
            by_source: ranked_counts(records.iter().map(|r| r.source.as_str()), usize::MAX),
            top_brands: ranked_counts(records.iter().map(|r| r.brand.as_str()), TOP_N),
            top_locales: ranked_counts(records.iter().map(|r| r.locale.as_str()), TOP_N),
            price_min,
            price_max,
            price_mean,
            year_min,
            year_max,
        })
    }
}

/// Counts occurrences, sorted by count descending then key ascending.
fn ranked_counts<'a>(values: impl Iterator<Item = &'a str>, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}
