//! Round-robin proxy rotation.
//!
//! The pool is loaded once from a plain-text file with one proxy per line.
//! A missing or empty file is not an error: the scraper then connects
//! directly.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct ProxyPool {
    entries: Vec<String>,
    cursor: AtomicUsize,
}

impl ProxyPool {
    #[must_use]
    pub fn new(entries: Vec<String>) -> Self {
        Self {
            entries,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Parses the proxy file format.
    ///
    /// Blank lines and `#` comments are skipped. Entries without a scheme are
    /// treated as HTTP proxies (`127.0.0.1:8080` becomes
    /// `http://127.0.0.1:8080`).
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let entries = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                if line.contains("://") {
                    line.to_owned()
                } else {
                    format!("http://{line}")
                }
            })
            .collect();
        Self::new(entries)
    }

    /// Loads the pool from `path`, falling back to an empty pool when the
    /// file is missing or unreadable.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let pool = Self::parse(&contents);
                tracing::info!(path = %path.display(), proxies = pool.len(), "loaded proxy list");
                pool
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no proxy file; connecting directly");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read proxy file; connecting directly"
                );
                Self::default()
            }
        }
    }

    /// Returns the next proxy in rotation, or `None` for an empty pool.
    ///
    /// With `n` entries, calls `k` and `k + n` return the same proxy.
    pub fn next_proxy(&self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.entries.len();
        Some(&self.entries[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
