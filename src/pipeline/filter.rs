use serde::Serialize;
use tracing::{debug, trace};

use crate::color::{normalize_computed_color, Color};
use crate::pipeline::rank::{ColorRole, Contribution};
use crate::sample::{ComputedStyleSample, ElementRole};

/// Minimum width of a border edge that counts as drawn.
pub const MIN_VISIBLE_BORDER: f64 = 1.0;

/// Width, height or area at or below this is treated as collapsed.
pub const NEAR_ZERO_EXTENT: f64 = 1.0;

/// A sample that survived filtering, with its colors normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredSample {
    pub role: ElementRole,
    pub tag: String,
    pub selector: String,
    pub area: f64,
    pub text: Option<Color>,
    pub background: Option<Color>,
    pub border: Option<Color>,
}

impl FilteredSample {
    fn is_empty(&self) -> bool {
        self.text.is_none() && self.background.is_none() && self.border.is_none()
    }
}

/// Apply the noise rules to one sample.
///
/// Returns `None` for samples with no area and for samples left without any
/// color once collapsed surfaces, undrawn borders and invisible or leaked
/// values are removed.
pub fn filter_sample(sample: &ComputedStyleSample) -> Option<FilteredSample> {
    let area = sample.area();
    if area.is_nan() || area <= 0.0 {
        trace!(selector = %sample.selector, area, "dropping sample without area");
        return None;
    }

    let visible_border = sample
        .border_widths()
        .iter()
        .any(|w| *w >= MIN_VISIBLE_BORDER);
    let near_zero = sample.width <= NEAR_ZERO_EXTENT
        || sample.height <= NEAR_ZERO_EXTENT
        || area <= NEAR_ZERO_EXTENT;
    let keep_fill = !near_zero || visible_border;

    let normalize = |raw: &Option<String>, keep: bool| {
        if keep {
            raw.as_deref().and_then(normalize_computed_color)
        } else {
            None
        }
    };

    let filtered = FilteredSample {
        role: sample.role,
        tag: sample.tag.clone(),
        selector: sample.selector.clone(),
        area,
        text: normalize(&sample.color, keep_fill),
        background: normalize(&sample.background_color, keep_fill),
        border: normalize(&sample.border_color, visible_border),
    };

    if filtered.is_empty() {
        trace!(selector = %sample.selector, "dropping sample with no visible color");
        None
    } else {
        Some(filtered)
    }
}

pub fn filter_samples(samples: &[ComputedStyleSample]) -> Vec<FilteredSample> {
    let filtered: Vec<FilteredSample> = samples.iter().filter_map(filter_sample).collect();
    debug!(
        total = samples.len(),
        kept = filtered.len(),
        "filtered computed-style samples"
    );
    filtered
}

/// Flatten filtered samples into per-role contributions, in sample order.
pub fn contributions(samples: &[FilteredSample]) -> Vec<Contribution> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let surfaces = [
            (ColorRole::Text, sample.text),
            (ColorRole::Background, sample.background),
            (ColorRole::Border, sample.border),
        ];
        for (role, color) in surfaces {
            if let Some(color) = color {
                out.push(Contribution {
                    role,
                    color,
                    area: sample.area,
                    element: sample.role,
                });
            }
        }
    }
    out
}
