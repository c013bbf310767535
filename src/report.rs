use std::collections::BTreeMap;
use std::io::{self, Write};

use crossterm::style::{Color as TermColor, Stylize};
use serde::{Serialize, Serializer};

use crate::color::{color_variants, Color};
use crate::pipeline::categorize::{categorize_inventory, CategorizedColor, Category};
use crate::pipeline::extract::{ColorRecord, CssVariableTable, FontRecord, StyleInventory};
use crate::pipeline::filter::{contributions, filter_samples, FilteredSample};
use crate::pipeline::rank::{rank, RankedColors};
use crate::pipeline::tokens::{infer_tokens, TokenSet};
use crate::sample::ComputedStyleSample;

const RULE_WIDTH: usize = 70;
const COLORS_PER_CATEGORY: usize = 5;
const TOP_FONTS: usize = 10;
const TOP_FONT_VALUES: usize = 3;
const RANKED_PER_ROLE: usize = 5;
const SELECTOR_PREVIEW: usize = 60;

/// Headline counts for a finished analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_unique_colors: usize,
    pub total_unique_fonts: usize,
    pub total_css_variables: usize,
    pub total_samples: usize,
    pub total_filtered_samples: usize,
    pub colors_by_category: BTreeMap<Category, usize>,
}

/// Everything learned about one page. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    url: String,
    inventory: StyleInventory,
    categories: BTreeMap<Category, Vec<CategorizedColor>>,
    total_samples: usize,
    samples: Vec<FilteredSample>,
    ranked: RankedColors,
    tokens: TokenSet,
}

impl AnalysisResult {
    /// Run the derived stages over an extracted inventory and a sample
    /// snapshot: categorize, filter, rank, infer.
    pub fn new(
        url: impl Into<String>,
        inventory: StyleInventory,
        samples: &[ComputedStyleSample],
    ) -> Self {
        let categories = categorize_inventory(&inventory);
        let filtered = filter_samples(samples);
        let contributions = contributions(&filtered);
        let ranked = rank(&contributions);
        let tokens = infer_tokens(&contributions);

        Self {
            url: url.into(),
            inventory,
            categories,
            total_samples: samples.len(),
            samples: filtered,
            ranked,
            tokens,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn colors(&self) -> &BTreeMap<Color, ColorRecord> {
        &self.inventory.colors
    }

    pub fn fonts(&self) -> &BTreeMap<String, FontRecord> {
        &self.inventory.fonts
    }

    pub fn css_variables(&self) -> &CssVariableTable {
        &self.inventory.variables
    }

    pub fn colors_by_category(&self) -> &BTreeMap<Category, Vec<CategorizedColor>> {
        &self.categories
    }

    pub fn filtered_samples(&self) -> &[FilteredSample] {
        &self.samples
    }

    pub fn ranked_colors(&self) -> &RankedColors {
        &self.ranked
    }

    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    pub fn summary(&self) -> Summary {
        Summary {
            total_unique_colors: self.inventory.colors.len(),
            total_unique_fonts: self.inventory.fonts.len(),
            total_css_variables: self.inventory.variables.len(),
            total_samples: self.total_samples,
            total_filtered_samples: self.samples.len(),
            colors_by_category: self
                .categories
                .iter()
                .map(|(category, entries)| (*category, entries.len()))
                .collect(),
        }
    }

    /// Write the human-readable report. With `preview`, colors are shown as
    /// terminal swatches.
    pub fn print_report(&self, out: &mut impl Write, preview: bool) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(out, "\n{rule}")?;
        writeln!(out, "COLOR AND FONT ANALYSIS REPORT")?;
        writeln!(out, "{rule}")?;
        writeln!(out, "\nURL: {}", self.url)?;

        let summary = self.summary();
        writeln!(out, "\n--- SUMMARY ---")?;
        writeln!(out, "Total unique colors: {}", summary.total_unique_colors)?;
        writeln!(out, "Total unique fonts: {}", summary.total_unique_fonts)?;
        writeln!(out, "CSS variables defined: {}", summary.total_css_variables)?;
        writeln!(
            out,
            "Rendered samples: {} ({} kept)",
            summary.total_samples, summary.total_filtered_samples
        )?;

        writeln!(out, "\n--- COLORS BY CATEGORY ---")?;
        for (category, entries) in &self.categories {
            let heading = category.as_str().to_uppercase().replace('_', " ");
            writeln!(out, "\n{heading} ({} colors):", entries.len())?;
            let mut top: Vec<&CategorizedColor> = entries.iter().collect();
            top.sort_by(|a, b| b.frequency.cmp(&a.frequency));
            for entry in top.into_iter().take(COLORS_PER_CATEGORY) {
                writeln!(out, "  • {} ({})", swatch(entry.normalized, preview), entry.color)?;
                writeln!(out, "    Property: {}", entry.property)?;
                writeln!(out, "    Variants: {}", color_variants(&entry.color).join(", "))?;
                writeln!(out, "    Selector: {}", truncate(&entry.selector, SELECTOR_PREVIEW))?;
            }
        }

        writeln!(out, "\n--- FONT FAMILIES ---")?;
        let mut fonts: Vec<(&String, &FontRecord)> = self.inventory.fonts.iter().collect();
        fonts.sort_by(|a, b| b.1.frequency.cmp(&a.1.frequency));
        for (name, font) in fonts.into_iter().take(TOP_FONTS) {
            writeln!(out, "\n{name} (used {} times)", font.frequency)?;
            if !font.sizes.is_empty() {
                writeln!(out, "  Sizes: {}", top_counts(&font.sizes))?;
            }
            if !font.weights.is_empty() {
                writeln!(out, "  Weights: {}", top_counts(&font.weights))?;
            }
        }

        if !self.ranked.is_empty() {
            writeln!(out, "\n--- RENDERED COLORS ---")?;
            for (role, entries) in &self.ranked {
                writeln!(out, "\n{}:", role.as_str().to_uppercase())?;
                for entry in entries.iter().take(RANKED_PER_ROLE) {
                    writeln!(
                        out,
                        "  {} score {:.0} ({}x, area {:.0})",
                        swatch(entry.color, preview),
                        entry.score,
                        entry.occurrence_count,
                        entry.area_sum
                    )?;
                }
            }
        }

        writeln!(out, "\n--- DESIGN TOKENS ---")?;
        for (name, value) in self.tokens.iter() {
            match value {
                Some(color) => writeln!(out, "  {:<16} {}", name.key(), swatch(color, preview))?,
                None => writeln!(out, "  {:<16} -", name.key())?,
            }
        }

        writeln!(out, "\n{rule}")
    }
}

/// Serialized form: the full report, with tokens repeated under the
/// `design_tokens` alias.
#[derive(Serialize)]
struct ReportDocument<'a> {
    url: &'a str,
    summary: Summary,
    colors: &'a BTreeMap<Color, ColorRecord>,
    colors_by_category: &'a BTreeMap<Category, Vec<CategorizedColor>>,
    fonts: &'a BTreeMap<String, FontRecord>,
    css_variables: &'a CssVariableTable,
    samples: &'a [FilteredSample],
    ranked_colors: &'a RankedColors,
    tokens: &'a TokenSet,
    design_tokens: &'a TokenSet,
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReportDocument {
            url: &self.url,
            summary: self.summary(),
            colors: &self.inventory.colors,
            colors_by_category: &self.categories,
            fonts: &self.inventory.fonts,
            css_variables: &self.inventory.variables,
            samples: &self.samples,
            ranked_colors: &self.ranked,
            tokens: &self.tokens,
            design_tokens: &self.tokens,
        }
        .serialize(serializer)
    }
}

/// Hex label, or a colored block when previewing.
fn swatch(color: Color, preview: bool) -> String {
    let label = color.to_hex();
    if !preview {
        return label;
    }
    let bg = TermColor::Rgb { r: color.r, g: color.g, b: color.b };
    let fg = if color.luminance() > 0.4 { TermColor::Black } else { TermColor::White };
    format!(" {label} ").with(fg).on(bg).to_string()
}

fn top_counts(counts: &BTreeMap<String, u32>) -> String {
    let mut entries: Vec<(&String, &u32)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));
    entries
        .into_iter()
        .take(TOP_FONT_VALUES)
        .map(|(value, count)| format!("{value} ({count}x)"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut short: String = s.chars().take(max).collect();
    short.push_str("...");
    short
}
