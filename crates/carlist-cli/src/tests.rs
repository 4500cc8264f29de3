use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["carlist-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_scrape_with_target_and_dedup() {
    let cli = Cli::try_parse_from(["carlist-cli", "scrape", "--target", "500", "--dedup"])
        .expect("expected valid cli args");

    let Some(Commands::Scrape(args)) = cli.command else {
        panic!("expected scrape command");
    };
    assert_eq!(args.target, Some(500));
    assert!(args.export.dedup);
    assert!(args.export.output.is_none());
}

#[test]
fn parses_export_with_output() {
    let cli = Cli::try_parse_from(["carlist-cli", "export", "--output", "out/cars.csv"])
        .expect("expected valid cli args");

    let Some(Commands::Export(args)) = cli.command else {
        panic!("expected export command");
    };
    assert!(!args.dedup);
    assert_eq!(args.output, Some(PathBuf::from("out/cars.csv")));
}

#[test]
fn parses_stats() {
    let cli = Cli::try_parse_from(["carlist-cli", "stats"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Stats)));
}

#[test]
fn rejects_non_numeric_target() {
    assert!(Cli::try_parse_from(["carlist-cli", "scrape", "--target", "many"]).is_err());
}
