use carlist_core::{locale_display_name, DelayRange};
use indicatif::ProgressBar;

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::listing_page::parse_listing_page;
use crate::rate_limit::pause;

use super::{locale_sub_target, AcquisitionConfig, PageKey, PageSource};

/// Records collected for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleReport {
    pub locale: String,
    pub sub_target: usize,
    pub added: usize,
}

/// Counters for one call to [`run_acquisition`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquisitionReport {
    pub records_added: usize,
    pub pages_fetched: usize,
    /// Pages skipped because their key was already in the visited set.
    pub pages_skipped: usize,
    pub pages_failed: usize,
    pub cards_rejected: usize,
    pub per_locale: Vec<LocaleReport>,
    pub target_reached: bool,
}

/// Why a category walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CategoryEnd {
    /// Page cap reached or a page yielded nothing new.
    Exhausted,
    LocaleSatisfied,
    TargetReached,
}

/// Mutable per-run bookkeeping shared by the nested loops.
struct Run<'a, S> {
    config: &'a AcquisitionConfig,
    source: &'a mut S,
    store: Option<&'a CheckpointStore>,
    state: &'a mut Checkpoint,
    report: AcquisitionReport,
    last_saved_len: usize,
    progress: &'a ProgressBar,
}

/// Collects records into `state` until the target count is reached or every
/// locale is exhausted.
///
/// Pages whose key is already in `state.visited` are skipped without I/O. A
/// page that fails to fetch, has no cards, or yields no valid record ends its
/// category. When `store` is given, `state` is saved each time
/// `checkpoint_interval` records have accumulated since the last save; save
/// failures are logged and the run continues.
///
/// The loop borrows `state` mutably for its whole duration. Dropping the
/// returned future (on interrupt) leaves `state` holding everything collected
/// so far.
pub async fn run_acquisition<S: PageSource>(
    config: &AcquisitionConfig,
    source: &mut S,
    store: Option<&CheckpointStore>,
    state: &mut Checkpoint,
) -> AcquisitionReport {
    run_acquisition_with_progress(config, source, store, state, &ProgressBar::hidden()).await
}

/// [`run_acquisition`] that also advances `progress` to the record count,
/// with the current city as its message.
pub async fn run_acquisition_with_progress<S: PageSource>(
    config: &AcquisitionConfig,
    source: &mut S,
    store: Option<&CheckpointStore>,
    state: &mut Checkpoint,
    progress: &ProgressBar,
) -> AcquisitionReport {
    progress.set_position(state.records.len() as u64);
    let mut run = Run {
        config,
        source,
        store,
        last_saved_len: state.records.len(),
        state,
        report: AcquisitionReport::default(),
        progress,
    };

    if run.target_reached() {
        tracing::info!(
            records = run.state.records.len(),
            target = config.target_count,
            "checkpoint already holds the target; nothing to fetch"
        );
        run.report.target_reached = true;
        return run.report;
    }

    let total_locales = config.locales.len();
    for (index, locale) in config.locales.iter().enumerate() {
        let locale = locale.as_str();
        if run.target_reached() {
            break;
        }
        let remaining_target = config.target_count - run.state.records.len();
        let sub_target = locale_sub_target(
            remaining_target,
            total_locales - index,
            config.locale_floor,
            config.locale_ceiling,
        );
        tracing::info!(
            locale,
            city = locale_display_name(locale),
            position = index + 1,
            total_locales,
            sub_target,
            remaining_target,
            "starting locale"
        );
        progress.set_message(locale_display_name(locale).to_owned());

        let added = run.acquire_locale(locale, sub_target).await;
        run.report.per_locale.push(LocaleReport {
            locale: locale.to_owned(),
            sub_target,
            added,
        });

        if added < config.locale_floor {
            tracing::warn!(
                locale,
                added,
                floor = config.locale_floor,
                "locale finished below floor"
            );
        } else {
            tracing::info!(locale, added, sub_target, "locale finished");
        }

        if run.target_reached() || index + 1 == total_locales {
            continue;
        }
        if added > 0 {
            pause(config.locale_pause).await;
        } else {
            pause(idle_pause(config.locale_pause)).await;
        }
    }

    run.report.target_reached = run.target_reached();
    tracing::info!(
        added = run.report.records_added,
        total = run.state.records.len(),
        pages_fetched = run.report.pages_fetched,
        pages_skipped = run.report.pages_skipped,
        pages_failed = run.report.pages_failed,
        "acquisition finished"
    );
    run.report
}

/// Shorter pause after a locale that produced nothing: the lower half of the
/// configured range.
fn idle_pause(range: DelayRange) -> DelayRange {
    DelayRange::new(range.min_ms / 2, range.min_ms)
}

impl<S: PageSource> Run<'_, S> {
    fn target_reached(&self) -> bool {
        self.state.records.len() >= self.config.target_count
    }

    fn locale_satisfied(&self, added: usize, sub_target: usize) -> bool {
        added >= sub_target && added >= self.config.locale_floor
    }

    async fn acquire_locale(&mut self, locale: &str, sub_target: usize) -> usize {
        let config = self.config;
        let mut added = 0usize;
        for category in &config.categories {
            if self.target_reached() || self.locale_satisfied(added, sub_target) {
                break;
            }
            match self.acquire_category(locale, category, sub_target, &mut added).await {
                CategoryEnd::Exhausted => {}
                CategoryEnd::LocaleSatisfied | CategoryEnd::TargetReached => break,
            }
        }
        added
    }

    async fn acquire_category(
        &mut self,
        locale: &str,
        category: &str,
        sub_target: usize,
        added: &mut usize,
    ) -> CategoryEnd {
        for page in 1..=self.config.max_pages_per_locale {
            if self.target_reached() {
                return CategoryEnd::TargetReached;
            }
            if self.locale_satisfied(*added, sub_target) {
                return CategoryEnd::LocaleSatisfied;
            }

            let key = PageKey::new(locale, category, page);
            let id = key.id();
            if self.state.visited.contains(&id) {
                tracing::debug!(key = %id, "page already visited; skipping");
                self.report.pages_skipped += 1;
                continue;
            }

            let html = match self.source.fetch_page(&key).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(key = %id, error = %e, "page fetch failed; leaving category");
                    self.report.pages_failed += 1;
                    return CategoryEnd::Exhausted;
                }
            };
            self.state.visited.insert(id);
            self.report.pages_fetched += 1;

            let parsed = parse_listing_page(&html, locale, self.config.reference_year);
            self.report.cards_rejected += parsed.rejected;

            let mut page_added = 0usize;
            for record in parsed.records {
                if self.target_reached() {
                    break;
                }
                self.state.records.push(record);
                page_added += 1;
            }
            *added += page_added;
            self.report.records_added += page_added;
            self.progress.inc(page_added as u64);

            if page_added > 0 {
                tracing::info!(
                    locale,
                    category,
                    page,
                    cards = parsed.cards_found,
                    added = page_added,
                    total = self.state.records.len(),
                    "page processed"
                );
            } else {
                tracing::debug!(
                    locale,
                    category,
                    page,
                    cards = parsed.cards_found,
                    "page yielded no records; leaving category"
                );
            }

            self.maybe_checkpoint();

            if page_added == 0 {
                return CategoryEnd::Exhausted;
            }
            pause(self.config.page_delay).await;
        }
        CategoryEnd::Exhausted
    }

    fn maybe_checkpoint(&mut self) {
        let Some(store) = self.store else {
            return;
        };
        let len = self.state.records.len();
        if len >= self.last_saved_len + self.config.checkpoint_interval {
            store.save_best_effort(self.state);
            self.last_saved_len = len;
        }
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
