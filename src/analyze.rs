use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::page::{same_origin_stylesheets, PageDocument, ResourceFetcher};
use crate::pipeline::extract::{StyleExtractor, StyleInventory};
use crate::report::AnalysisResult;
use crate::sample::ComputedStyleSource;

pub const DEFAULT_USER_AGENT: &str = concat!("site-palette/", env!("CARGO_PKG_VERSION"));

/// Runtime settings for one analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Upper bound on linked stylesheets fetched per page.
    pub max_stylesheets: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_stylesheets: 50,
        }
    }
}

/// Parse a page URL, assuming `https://` when no scheme is given.
pub fn parse_page_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let candidate = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    Url::parse(&candidate).map_err(|source| Error::InvalidUrl { url: raw.to_string(), source })
}

/// Drives one page through fetch, extraction, capture and the derived stages.
pub struct Analyzer<F> {
    config: AnalyzerConfig,
    fetcher: F,
}

impl<F: ResourceFetcher> Analyzer<F> {
    pub fn new(config: AnalyzerConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Fetch and analyze `url`.
    pub fn analyze(
        &self,
        url: &str,
        source: Option<&dyn ComputedStyleSource>,
    ) -> Result<AnalysisResult> {
        let page = parse_page_url(url)?;
        info!(url = %page, "analyzing");
        let html = self.fetcher.fetch_page(&page)?;
        self.analyze_document(&page, &html, source)
    }

    /// Analyze HTML already in hand. Linked stylesheets are still fetched
    /// relative to `page`.
    pub fn analyze_document(
        &self,
        page: &Url,
        html: &str,
        source: Option<&dyn ComputedStyleSource>,
    ) -> Result<AnalysisResult> {
        let inventory = self.extract(page, html);

        let samples = match source {
            Some(source) => {
                info!(source = source.name(), "capturing computed styles");
                let samples = source.capture(page)?;
                info!(count = samples.len(), "captured computed-style samples");
                samples
            }
            None => Vec::new(),
        };

        Ok(AnalysisResult::new(page.as_str(), inventory, &samples))
    }

    /// Static extraction in scan order: inline styles, `<style>` blocks,
    /// then same-origin linked stylesheets.
    pub fn extract(&self, page: &Url, html: &str) -> StyleInventory {
        let doc = PageDocument::parse(html);
        let mut extractor = StyleExtractor::new();

        info!(count = doc.inline_styles.len(), "extracting inline styles");
        for inline in &doc.inline_styles {
            extractor.extract_inline(&inline.element(), &inline.style);
        }

        info!(count = doc.style_blocks.len(), "extracting style blocks");
        for css in &doc.style_blocks {
            extractor.extract_stylesheet(css);
        }

        let mut sheets = same_origin_stylesheets(page, &doc.stylesheet_links);
        if sheets.len() > self.config.max_stylesheets {
            debug!(
                found = sheets.len(),
                limit = self.config.max_stylesheets,
                "truncating stylesheet list"
            );
            sheets.truncate(self.config.max_stylesheets);
        }
        info!(count = sheets.len(), "extracting external stylesheets");
        for sheet in &sheets {
            match self.fetcher.fetch_stylesheet(sheet) {
                Ok(css) => extractor.extract_stylesheet(&css),
                Err(err) => warn!(url = %sheet, %err, "could not fetch stylesheet"),
            }
        }

        extractor.finish()
    }
}
