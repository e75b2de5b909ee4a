use super::*;

#[test]
fn parses_fetch_by_dealer_with_defaults() {
    let cli = Cli::try_parse_from(["cnfeed-cli", "fetch", "--dealer", "autos-sol"])
        .expect("expected valid cli args");

    match cli.command {
        Commands::Fetch {
            dealer,
            url,
            output,
        } => {
            assert_eq!(dealer.as_deref(), Some("autos-sol"));
            assert!(url.is_none());
            assert_eq!(output.format, OutputFormat::Json);
            assert!(!output.pretty);
            assert!(output.output.is_none());
        }
        other @ Commands::Parse { .. } => panic!("expected fetch, got {other:?}"),
    }
}

#[test]
fn parses_fetch_by_url_with_format_and_output() {
    let cli = Cli::try_parse_from([
        "cnfeed-cli",
        "fetch",
        "--url",
        "https://www.coches.net/concesionario/autos-sol/",
        "--format",
        "CSV",
        "-o",
        "out.csv",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Fetch {
            dealer: None,
            url: Some(_),
            output: OutputArgs {
                format: OutputFormat::Csv,
                pretty: false,
                output: Some(_),
            },
        }
    ));
}

#[test]
fn fetch_requires_a_target() {
    assert!(Cli::try_parse_from(["cnfeed-cli", "fetch"]).is_err());
}

#[test]
fn fetch_rejects_both_dealer_and_url() {
    let result = Cli::try_parse_from([
        "cnfeed-cli",
        "fetch",
        "--dealer",
        "a",
        "--url",
        "https://www.coches.net/concesionario/b/",
    ]);
    assert!(result.is_err());
}

#[test]
fn unknown_format_is_rejected() {
    let result = Cli::try_parse_from(["cnfeed-cli", "fetch", "--dealer", "a", "--format", "xml"]);
    assert!(result.is_err());
}

#[test]
fn parses_parse_command() {
    let cli = Cli::try_parse_from([
        "cnfeed-cli",
        "parse",
        "page.html",
        "--base",
        "https://www.coches.net",
        "--source-url",
        "https://www.coches.net/concesionario/autos-sol/",
        "--format",
        "jsonl",
        "--pretty",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Parse {
            html_file,
            base,
            source_url,
            output,
        } => {
            assert_eq!(html_file, PathBuf::from("page.html"));
            assert_eq!(base.as_deref(), Some("https://www.coches.net"));
            assert!(source_url.is_some());
            assert_eq!(output.format, OutputFormat::Jsonl);
            assert!(output.pretty);
        }
        other @ Commands::Fetch { .. } => panic!("expected parse, got {other:?}"),
    }
}

#[test]
fn parse_requires_a_file() {
    assert!(Cli::try_parse_from(["cnfeed-cli", "parse"]).is_err());
}

#[test]
fn no_command_is_an_error() {
    assert!(Cli::try_parse_from(["cnfeed-cli"]).is_err());
}
