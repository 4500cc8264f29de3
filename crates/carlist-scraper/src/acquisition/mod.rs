//! The listing acquisition loop.
//!
//! Walks (locale, category, page) tuples in order, fetches each page once,
//! parses its cards into validated records and accumulates them in a
//! [`Checkpoint`](crate::checkpoint::Checkpoint) that is persisted at a fixed
//! cadence.

mod run;

use std::fmt;
use std::future::Future;

use carlist_core::{AppConfig, DelayRange};

use crate::error::ScraperError;

pub use run::{
    run_acquisition, run_acquisition_with_progress, AcquisitionReport, LocaleReport,
};

/// Category path segments, in the order they are walked. The empty segment
/// is the unfiltered listing.
pub const CATEGORIES: &[&str] = &["", "suv/", "mpv/", "pickup/", "coupe/"];

/// One results page: the unit of fetching and of visited-set tracking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub locale: String,
    pub category: String,
    pub page: u32,
}

impl PageKey {
    #[must_use]
    pub fn new(locale: &str, category: &str, page: u32) -> Self {
        Self {
            locale: locale.to_owned(),
            category: category.to_owned(),
            page,
        }
    }

    /// Stable visited-set key, `"{locale}|{category}|{page}"`.
    #[must_use]
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.locale, self.category, self.page)
    }
}

/// Anything that can turn a [`PageKey`] into a results page body.
///
/// Implemented by [`ListingClient`](crate::client::ListingClient) for live
/// fetching; tests supply canned pages.
pub trait PageSource {
    /// Fetches the page body. Implementations retry internally; an `Err`
    /// means the page is given up on.
    fn fetch_page(&mut self, key: &PageKey)
        -> impl Future<Output = Result<String, ScraperError>>;
}

/// Loop parameters. Built from [`AppConfig`] in production.
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    pub target_count: usize,
    pub locales: Vec<String>,
    pub categories: Vec<String>,
    pub max_pages_per_locale: u32,
    pub locale_floor: usize,
    pub locale_ceiling: usize,
    pub checkpoint_interval: usize,
    pub page_delay: DelayRange,
    pub locale_pause: DelayRange,
    pub reference_year: i32,
}

impl AcquisitionConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            target_count: config.target_count,
            locales: config.locales.clone(),
            categories: CATEGORIES.iter().map(|c| (*c).to_owned()).collect(),
            max_pages_per_locale: config.max_pages_per_locale,
            locale_floor: config.locale_floor,
            locale_ceiling: config.locale_ceiling,
            checkpoint_interval: config.checkpoint_interval,
            page_delay: config.page_delay,
            locale_pause: config.locale_pause,
            reference_year: config.reference_year,
        }
    }
}

/// Per-locale record goal.
///
/// The remaining global target is spread over the remaining locales minus
/// one, so earlier locales over-collect slightly to absorb thin ones later,
/// then clamped to `[floor, ceiling]`.
#[must_use]
pub fn locale_sub_target(
    remaining_target: usize,
    remaining_locales: usize,
    floor: usize,
    ceiling: usize,
) -> usize {
    let share = remaining_target / remaining_locales.saturating_sub(1).max(1);
    share.max(floor).min(ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_key_id_format() {
        assert_eq!(PageKey::new("bj", "suv/", 3).id(), "bj|suv/|3");
        assert_eq!(PageKey::new("sh", "", 1).id(), "sh||1");
    }

    #[test]
    fn sub_target_spreads_over_remaining_locales() {
        // 20000 over 36 locales: 20000 / 35 = 571
        assert_eq!(locale_sub_target(20_000, 36, 200, 1500), 571);
    }

    #[test]
    fn sub_target_clamped_to_floor_and_ceiling() {
        assert_eq!(locale_sub_target(100, 10, 200, 1500), 200);
        assert_eq!(locale_sub_target(20_000, 3, 200, 1500), 1500);
    }

    #[test]
    fn sub_target_last_locale_takes_remainder() {
        assert_eq!(locale_sub_target(900, 1, 200, 1500), 900);
        assert_eq!(locale_sub_target(900, 2, 200, 1500), 900);
    }

    #[test]
    fn default_categories_start_with_unfiltered() {
        assert_eq!(CATEGORIES[0], "");
        assert_eq!(CATEGORIES.len(), 5);
    }
}
