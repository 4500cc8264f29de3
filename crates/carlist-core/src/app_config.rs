use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;

/// Inclusive range of milliseconds a throttling sleep is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A range that never sleeps. Used by tests and dry runs.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Parses `"500-2000"` (or a single `"750"`) into a range.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when either bound is not an integer or
    /// when `min > max`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (min_raw, max_raw) = raw.split_once('-').unwrap_or((raw, raw));
        let min_ms = min_raw
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid lower bound \"{min_raw}\": {e}"))?;
        let max_ms = max_raw
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid upper bound \"{max_raw}\": {e}"))?;
        if min_ms > max_ms {
            return Err(format!("lower bound {min_ms} exceeds upper bound {max_ms}"));
        }
        Ok(Self { min_ms, max_ms })
    }

    /// Draws a uniformly random duration from the range.
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.max_ms == 0
    }
}

impl std::fmt::Display for DelayRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}ms", self.min_ms, self.max_ms)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub base_url: String,
    pub target_count: usize,
    pub max_pages_per_locale: u32,
    pub locales: Vec<String>,
    pub locale_floor: usize,
    pub locale_ceiling: usize,
    pub checkpoint_path: PathBuf,
    pub checkpoint_interval: usize,
    pub proxies_path: PathBuf,
    pub output_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub request_delay: DelayRange,
    pub page_delay: DelayRange,
    pub retry_backoff: DelayRange,
    pub locale_pause: DelayRange,
    /// Calendar year the derived vehicle age is measured against.
    pub reference_year: i32,
}
