use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::color::Color;
use crate::sample::ElementRole;

/// Which painted part of an element a color covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorRole {
    Text,
    Background,
    Border,
}

impl ColorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorRole::Text => "text",
            ColorRole::Background => "background",
            ColorRole::Border => "border",
        }
    }
}

/// One colored surface of one filtered sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub role: ColorRole,
    pub color: Color,
    pub area: f64,
    pub element: ElementRole,
}

/// A color aggregated over all its contributions in one role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedColorEntry {
    pub role: ColorRole,
    pub color: Color,
    /// `area_sum * occurrence_count`
    pub score: f64,
    pub occurrence_count: u32,
    pub area_sum: f64,
    pub element_roles: BTreeSet<ElementRole>,
}

pub type RankedColors = BTreeMap<ColorRole, Vec<RankedColorEntry>>;

/// Rank every contribution, grouped by color role.
///
/// Roles without contributions are absent from the map. Each list is sorted
/// by descending score; ties keep first-seen order.
pub fn rank(contributions: &[Contribution]) -> RankedColors {
    let mut ranked = RankedColors::new();
    for entry in aggregate(contributions.iter()) {
        ranked.entry(entry.role).or_default().push(entry);
    }
    for entries in ranked.values_mut() {
        sort_by_score(entries);
    }
    ranked
}

/// Rank only contributions in `role` that came from one of `elements`.
pub fn rank_subset(
    contributions: &[Contribution],
    role: ColorRole,
    elements: &[ElementRole],
) -> Vec<RankedColorEntry> {
    let mut entries = aggregate(
        contributions
            .iter()
            .filter(|c| c.role == role && elements.contains(&c.element)),
    );
    sort_by_score(&mut entries);
    entries
}

fn aggregate<'a>(contributions: impl Iterator<Item = &'a Contribution>) -> Vec<RankedColorEntry> {
    let mut index: HashMap<(ColorRole, Color), usize> = HashMap::new();
    let mut entries: Vec<RankedColorEntry> = Vec::new();

    for c in contributions {
        match index.entry((c.role, c.color)) {
            Entry::Occupied(slot) => {
                let entry = &mut entries[*slot.get()];
                entry.occurrence_count += 1;
                entry.area_sum += c.area;
                entry.element_roles.insert(c.element);
            }
            Entry::Vacant(slot) => {
                slot.insert(entries.len());
                entries.push(RankedColorEntry {
                    role: c.role,
                    color: c.color,
                    score: 0.0,
                    occurrence_count: 1,
                    area_sum: c.area,
                    element_roles: BTreeSet::from([c.element]),
                });
            }
        }
    }

    for entry in &mut entries {
        entry.score = entry.area_sum * f64::from(entry.occurrence_count);
    }
    entries
}

fn sort_by_score(entries: &mut [RankedColorEntry]) {
    // slice::sort_by is stable
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contrib(role: ColorRole, hex: &str, area: f64, element: ElementRole) -> Contribution {
        Contribution {
            role,
            color: Color::from_hex(hex).unwrap(),
            area,
            element,
        }
    }

    #[test]
    fn score_is_area_times_occurrences() {
        let contributions = vec![
            contrib(ColorRole::Text, "#111111", 10.0, ElementRole::Paragraph),
            contrib(ColorRole::Text, "#111111", 40.0, ElementRole::Heading),
            contrib(ColorRole::Text, "#222222", 50.0, ElementRole::Paragraph),
        ];
        let ranked = rank(&contributions);
        let text = &ranked[&ColorRole::Text];

        assert_eq!(text.len(), 2);
        assert_eq!(text[0].color, Color::from_hex("#111111").unwrap());
        assert_eq!(text[0].score, 100.0);
        assert_eq!(text[0].occurrence_count, 2);
        assert_eq!(text[0].area_sum, 50.0);
        assert_eq!(
            text[0].element_roles,
            BTreeSet::from([ElementRole::Heading, ElementRole::Paragraph])
        );
        assert_eq!(text[1].score, 50.0);
    }

    #[test]
    fn frequent_small_color_outranks_single_large_one() {
        let mut contributions = vec![contrib(ColorRole::Text, "#111111", 100.0, ElementRole::Heading)];
        for _ in 0..5 {
            contributions.push(contrib(ColorRole::Text, "#222222", 10.0, ElementRole::Paragraph));
        }
        let text = &rank(&contributions)[&ColorRole::Text];

        assert_eq!(text[0].color.to_hex(), "#222222");
        assert_eq!(text[0].occurrence_count, 5);
        assert_eq!(text[0].area_sum, 50.0);
        assert_eq!(text[0].score, 250.0);
        assert_eq!(text[1].color.to_hex(), "#111111");
        assert_eq!(text[1].occurrence_count, 1);
        assert_eq!(text[1].area_sum, 100.0);
        assert_eq!(text[1].score, 100.0);
    }

    #[test]
    fn roles_are_ranked_separately() {
        let contributions = vec![
            contrib(ColorRole::Text, "#000000", 10.0, ElementRole::Body),
            contrib(ColorRole::Background, "#000000", 10.0, ElementRole::Body),
        ];
        let ranked = rank(&contributions);
        assert_eq!(ranked.len(), 2);
        assert!(!ranked.contains_key(&ColorRole::Border));
        assert_eq!(ranked[&ColorRole::Text].len(), 1);
        assert_eq!(ranked[&ColorRole::Background].len(), 1);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let contributions = vec![
            contrib(ColorRole::Background, "#aaaaaa", 20.0, ElementRole::Container),
            contrib(ColorRole::Background, "#bbbbbb", 20.0, ElementRole::Container),
            contrib(ColorRole::Background, "#cccccc", 20.0, ElementRole::Container),
        ];
        let ranked = rank(&contributions);
        let hexes: Vec<String> = ranked[&ColorRole::Background]
            .iter()
            .map(|e| e.color.to_hex())
            .collect();
        assert_eq!(hexes, ["#aaaaaa", "#bbbbbb", "#cccccc"]);
    }

    #[test]
    fn subset_filters_by_role_and_element() {
        let contributions = vec![
            contrib(ColorRole::Background, "#ffffff", 1000.0, ElementRole::Body),
            contrib(ColorRole::Background, "#0066cc", 40.0, ElementRole::Button),
            contrib(ColorRole::Text, "#0066cc", 40.0, ElementRole::Link),
        ];
        let buttons = rank_subset(&contributions, ColorRole::Background, &[ElementRole::Button]);
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].color.to_hex(), "#0066cc");

        let none = rank_subset(&contributions, ColorRole::Border, &[ElementRole::Body]);
        assert!(none.is_empty());
    }

    #[test]
    fn empty_input_ranks_nothing() {
        assert!(rank(&[]).is_empty());
    }
}
