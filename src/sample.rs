use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Which kind of page element a computed-style sample was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementRole {
    Body,
    Main,
    Container,
    Button,
    Link,
    Heading,
    Paragraph,
}

impl ElementRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementRole::Body => "body",
            ElementRole::Main => "main",
            ElementRole::Container => "container",
            ElementRole::Button => "button",
            ElementRole::Link => "link",
            ElementRole::Heading => "heading",
            ElementRole::Paragraph => "paragraph",
        }
    }
}

/// Rendered style of one element, as reported by a rendering backend.
///
/// Colors are kept as the raw computed strings (`rgb(...)`, `rgba(...)`,
/// keywords); nothing here is trusted until the sample filter has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStyleSample {
    pub role: ElementRole,
    #[serde(default)]
    pub tag: String,
    /// Short CSS-like selector, for display only.
    #[serde(default)]
    pub selector: String,
    pub width: f64,
    pub height: f64,
    /// Layout area; `width * height` when the backend does not report it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub border_color: Option<String>,
    #[serde(default)]
    pub border_top_width: f64,
    #[serde(default)]
    pub border_right_width: f64,
    #[serde(default)]
    pub border_bottom_width: f64,
    #[serde(default)]
    pub border_left_width: f64,
}

impl ComputedStyleSample {
    pub fn new(role: ElementRole, width: f64, height: f64) -> Self {
        Self {
            role,
            tag: String::new(),
            selector: String::new(),
            width,
            height,
            area: None,
            color: None,
            background_color: None,
            border_color: None,
            border_top_width: 0.0,
            border_right_width: 0.0,
            border_bottom_width: 0.0,
            border_left_width: 0.0,
        }
    }

    pub fn with_tag(mut self, tag: &str, selector: &str) -> Self {
        self.tag = tag.to_string();
        self.selector = selector.to_string();
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn with_background(mut self, color: &str) -> Self {
        self.background_color = Some(color.to_string());
        self
    }

    /// Set the border color and the same width on all four edges.
    pub fn with_border(mut self, color: &str, width: f64) -> Self {
        self.border_color = Some(color.to_string());
        self.border_top_width = width;
        self.border_right_width = width;
        self.border_bottom_width = width;
        self.border_left_width = width;
        self
    }

    pub fn area(&self) -> f64 {
        self.area.unwrap_or(self.width * self.height)
    }

    pub fn border_widths(&self) -> [f64; 4] {
        [
            self.border_top_width,
            self.border_right_width,
            self.border_bottom_width,
            self.border_left_width,
        ]
    }
}

/// Capability: given a page, return a snapshot of rendered element styles.
///
/// One call is one capture. Implementations that drive a browser open an
/// isolated session inside `capture` and must release it before returning,
/// on both the success and the error path (a guard dropped at end of scope
/// is enough). Failures surface as [`Error::Capture`] and are not retried.
pub trait ComputedStyleSource {
    fn name(&self) -> &str;

    fn capture(&self, page: &Url) -> Result<Vec<ComputedStyleSample>>;
}

/// Reads a previously captured snapshot from a JSON file: an array of
/// samples in the camelCase form produced by browser-side collectors.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    path: PathBuf,
}

impl FixtureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ComputedStyleSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    fn capture(&self, page: &Url) -> Result<Vec<ComputedStyleSample>> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Capture(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let samples: Vec<ComputedStyleSample> = serde_json::from_str(&text).map_err(|e| {
            Error::Capture(format!("malformed samples in {}: {e}", self.path.display()))
        })?;
        debug!(%page, path = %self.path.display(), count = samples.len(), "loaded sample fixture");
        Ok(samples)
    }
}

/// An in-memory snapshot, for callers that already hold the samples.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    samples: Vec<ComputedStyleSample>,
}

impl SnapshotSource {
    pub fn new(samples: Vec<ComputedStyleSample>) -> Self {
        Self { samples }
    }
}

impl ComputedStyleSource for SnapshotSource {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn capture(&self, _page: &Url) -> Result<Vec<ComputedStyleSample>> {
        Ok(self.samples.clone())
    }
}
