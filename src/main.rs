use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use site_palette::analyze::parse_page_url;
use site_palette::cli::Args;
use site_palette::page::HttpFetcher;
use site_palette::sample::{ComputedStyleSource, FixtureSource};
use site_palette::Analyzer;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = args.analyzer_config();
    let fetcher = HttpFetcher::new(config.timeout, &config.user_agent)?;
    let analyzer = Analyzer::new(config, fetcher);

    let fixture = args.samples.as_ref().map(FixtureSource::new);
    let source = fixture.as_ref().map(|s| s as &dyn ComputedStyleSource);

    let result = match &args.html {
        Some(path) => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let page = parse_page_url(&args.url)?;
            analyzer.analyze_document(&page, &html, source)
        }
        None => analyzer.analyze(&args.url, source),
    }
    .with_context(|| format!("failed to analyze {}", args.url))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if !args.no_print {
        result.print_report(&mut out, args.preview)?;
    }

    let backend = args.format.backend();
    match &args.output {
        Some(path) => {
            backend.write_to(&result, path)?;
            eprintln!("Wrote {} report to {}", backend.name(), path.display());
        }
        None if args.no_print => out.write_all(backend.serialize(&result)?.as_bytes())?,
        None => {}
    }

    Ok(())
}

/// Logs go to stderr; `RUST_LOG` overrides -v/-q.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,site_palette={}", args.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
