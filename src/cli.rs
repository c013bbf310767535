use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::analyze::{AnalyzerConfig, DEFAULT_USER_AGENT};
use crate::backends::{CssBackend, JsonBackend, ReportBackend};

/// Extract the color palette and typography of a website and infer design tokens.
#[derive(Parser, Debug)]
#[command(name = "site-palette", version, about)]
pub struct Args {
    /// Website URL to analyze (https:// is assumed when no scheme is given)
    pub url: String,

    /// Write the serialized report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Serialization format for --output (or stdout with --no-print)
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 10)]
    pub timeout: u64,

    /// Don't print the console report
    #[arg(long)]
    pub no_print: bool,

    /// JSON file of captured computed-style samples
    #[arg(long, value_name = "FILE")]
    pub samples: Option<PathBuf>,

    /// Analyze a saved HTML document instead of fetching the page
    #[arg(long, value_name = "FILE")]
    pub html: Option<PathBuf>,

    /// Show color swatches in the console report
    #[arg(long)]
    pub preview: bool,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Maximum number of linked stylesheets to fetch
    #[arg(long, default_value_t = 50)]
    pub max_stylesheets: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            timeout: Duration::from_secs(self.timeout),
            user_agent: self.user_agent.clone(),
            max_stylesheets: self.max_stylesheets,
        }
    }

    /// Default log directive for the crate when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Css,
}

impl OutputFormat {
    pub fn backend(self) -> Box<dyn ReportBackend> {
        match self {
            OutputFormat::Json => Box::new(JsonBackend),
            OutputFormat::Css => Box::new(CssBackend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["site-palette", "example.com"]).unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.log_level(), "warn");
        let config = args.analyzer_config();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_stylesheets, 50);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn verbosity_and_quiet() {
        let args = Args::try_parse_from(["site-palette", "x", "-vv"]).unwrap();
        assert_eq!(args.log_level(), "debug");
        let args = Args::try_parse_from(["site-palette", "x", "-q"]).unwrap();
        assert_eq!(args.log_level(), "error");
        assert!(Args::try_parse_from(["site-palette", "x", "-q", "-v"]).is_err());
    }

    #[test]
    fn format_selects_backend() {
        let args = Args::try_parse_from(["site-palette", "x", "--format", "css", "-t", "3"]).unwrap();
        assert_eq!(args.format.backend().name(), "CSS");
        assert_eq!(args.analyzer_config().timeout, Duration::from_secs(3));
    }
}
