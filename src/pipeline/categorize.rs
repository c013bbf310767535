use std::collections::BTreeMap;

use serde::Serialize;

use crate::color::Color;
use crate::pipeline::extract::StyleInventory;

/// Usage category inferred from where a color was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SemanticSuccess,
    SemanticError,
    SemanticWarning,
    SemanticInfo,
    Interactive,
    Border,
    Background,
    Text,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::SemanticSuccess => "semantic_success",
            Category::SemanticError => "semantic_error",
            Category::SemanticWarning => "semantic_warning",
            Category::SemanticInfo => "semantic_info",
            Category::Interactive => "interactive",
            Category::Border => "border",
            Category::Background => "background",
            Category::Text => "text",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One test inside a rule. Selector and property are lowercased first.
#[derive(Debug, Clone, Copy)]
enum Matcher {
    SelectorContainsAny(&'static [&'static str]),
    PropertyContains(&'static str),
    PropertyIs(&'static str),
}

impl Matcher {
    fn matches(self, selector: &str, property: &str) -> bool {
        match self {
            Matcher::SelectorContainsAny(keywords) => keywords.iter().any(|k| selector.contains(k)),
            Matcher::PropertyContains(needle) => property.contains(needle),
            Matcher::PropertyIs(name) => property == name,
        }
    }
}

/// A category and the matchers that select it; any one matcher is enough.
#[derive(Debug, Clone, Copy)]
struct CategoryRule {
    category: Category,
    matchers: &'static [Matcher],
}

const SUCCESS_KEYWORDS: &[&str] = &["success", "positive", "green", "valid"];
const ERROR_KEYWORDS: &[&str] = &["error", "danger", "red", "invalid", "alert"];
const WARNING_KEYWORDS: &[&str] = &["warning", "caution", "yellow", "orange"];
const INFO_KEYWORDS: &[&str] = &["info", "information", "blue", "notice"];
const INTERACTIVE_KEYWORDS: &[&str] = &[
    "button", "btn", "link", "anchor", "input", "focus", "hover", "active",
];
const BORDER_KEYWORDS: &[&str] = &["border", "outline", "divider", "separator", "stroke"];
const BACKGROUND_KEYWORDS: &[&str] = &[
    "background", "bg", "surface", "card", "modal", "overlay", "section",
];
const TEXT_KEYWORDS: &[&str] = &[
    "text", "color", "font", "heading", "paragraph", "caption", "label",
];

/// Evaluated top to bottom; the first rule with a matching matcher wins.
const RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::SemanticSuccess,
        matchers: &[Matcher::SelectorContainsAny(SUCCESS_KEYWORDS)],
    },
    CategoryRule {
        category: Category::SemanticError,
        matchers: &[Matcher::SelectorContainsAny(ERROR_KEYWORDS)],
    },
    CategoryRule {
        category: Category::SemanticWarning,
        matchers: &[Matcher::SelectorContainsAny(WARNING_KEYWORDS)],
    },
    CategoryRule {
        category: Category::SemanticInfo,
        matchers: &[Matcher::SelectorContainsAny(INFO_KEYWORDS)],
    },
    CategoryRule {
        category: Category::Interactive,
        matchers: &[Matcher::SelectorContainsAny(INTERACTIVE_KEYWORDS)],
    },
    CategoryRule {
        category: Category::Border,
        matchers: &[
            Matcher::PropertyContains("border"),
            Matcher::SelectorContainsAny(BORDER_KEYWORDS),
        ],
    },
    CategoryRule {
        category: Category::Background,
        matchers: &[
            Matcher::PropertyContains("background"),
            Matcher::SelectorContainsAny(BACKGROUND_KEYWORDS),
        ],
    },
    CategoryRule {
        category: Category::Text,
        matchers: &[
            Matcher::PropertyIs("color"),
            Matcher::SelectorContainsAny(TEXT_KEYWORDS),
        ],
    },
];

/// Classify a color usage by the selector and property that declared it.
pub fn categorize(selector: &str, property: &str) -> Category {
    let selector = selector.to_lowercase();
    let property = property.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matchers.iter().any(|m| m.matches(&selector, &property)))
        .map_or(Category::Other, |rule| rule.category)
}

/// A single categorized usage of an inventory color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedColor {
    /// Raw representation last seen for this color.
    pub color: String,
    pub normalized: Color,
    pub selector: String,
    pub property: String,
    /// Total frequency of the color across the inventory.
    pub frequency: u32,
}

/// Group every observed (selector, property) usage of every color by category.
pub fn categorize_inventory(inventory: &StyleInventory) -> BTreeMap<Category, Vec<CategorizedColor>> {
    let mut categories: BTreeMap<Category, Vec<CategorizedColor>> = BTreeMap::new();
    for record in inventory.colors.values() {
        for (selector, property) in &record.usages {
            categories
                .entry(categorize(selector, property))
                .or_default()
                .push(CategorizedColor {
                    color: record.value.clone(),
                    normalized: record.normalized,
                    selector: selector.clone(),
                    property: property.clone(),
                    frequency: record.frequency,
                });
        }
    }
    categories
}
