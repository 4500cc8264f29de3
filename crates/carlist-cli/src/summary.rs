use carlist_core::{locale_display_name, AppConfig, DatasetSummary, ListingRecord};
use carlist_scraper::CheckpointStore;

/// Renders the dataset summary as printable lines.
pub(crate) fn summary_lines(summary: &DatasetSummary) -> Vec<String> {
    let mut lines = vec![
        format!("records: {}", summary.total),
        format!(
            "price (万元): min {:.1}, max {:.1}, mean {:.2}",
            summary.price_min, summary.price_max, summary.price_mean
        ),
        format!("years: {}-{}", summary.year_min, summary.year_max),
        "by source:".to_owned(),
    ];
    lines.extend(
        summary
            .by_source
            .iter()
            .map(|(source, n)| format!("  {source}: {n}")),
    );
    lines.push("top brands:".to_owned());
    lines.extend(
        summary
            .top_brands
            .iter()
            .map(|(brand, n)| format!("  {brand}: {n}")),
    );
    lines.push("top cities:".to_owned());
    lines.extend(
        summary
            .top_locales
            .iter()
            .map(|(code, n)| format!("  {} ({code}): {n}", locale_display_name(code))),
    );
    lines
}

pub(crate) fn print_summary(records: &[ListingRecord]) {
    match DatasetSummary::from_records(records) {
        Some(summary) => {
            for line in summary_lines(&summary) {
                println!("{line}");
            }
        }
        None => println!("no records collected"),
    }
}

/// `stats` command.
pub(crate) fn run_stats(config: &AppConfig) {
    let state = CheckpointStore::new(&config.checkpoint_path).load();
    if let Some(saved_at) = state.saved_at {
        println!("checkpoint saved at {saved_at}");
    }
    println!("pages visited: {}", state.visited.len());
    print_summary(&state.records);
}
