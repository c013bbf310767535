use std::collections::{BTreeMap, BTreeSet};

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, Token,
};
use serde::Serialize;
use tracing::trace;

use crate::color::{normalize_color, Color};

/// At-rules whose blocks hold ordinary style rules.
const GROUPING_AT_RULES: &[&str] = &["media", "supports", "layer", "container", "document"];

/// Properties whose identifiers are names, not colors (`font: 12px Red Hat`).
const NON_COLOR_PROPERTIES: &[&str] = &["font-family", "font"];

/// Everything known about one normalized color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorRecord {
    /// Raw representation last seen.
    pub value: String,
    pub normalized: Color,
    pub selectors: BTreeSet<String>,
    pub properties: BTreeSet<String>,
    pub frequency: u32,
    /// Custom properties that resolved to this color.
    pub css_variables: BTreeSet<String>,
    /// Observed (selector, property) pairs.
    #[serde(skip)]
    pub usages: BTreeSet<(String, String)>,
}

impl ColorRecord {
    fn new(normalized: Color) -> Self {
        Self {
            value: String::new(),
            normalized,
            selectors: BTreeSet::new(),
            properties: BTreeSet::new(),
            frequency: 0,
            css_variables: BTreeSet::new(),
            usages: BTreeSet::new(),
        }
    }
}

/// Typography observed for one font family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontRecord {
    /// Full family list as last declared.
    pub family: String,
    pub sizes: BTreeMap<String, u32>,
    pub weights: BTreeMap<String, u32>,
    pub line_heights: BTreeMap<String, u32>,
    pub selectors: BTreeSet<String>,
    pub frequency: u32,
}

impl FontRecord {
    fn new(family: &str) -> Self {
        Self {
            family: family.to_string(),
            sizes: BTreeMap::new(),
            weights: BTreeMap::new(),
            line_heights: BTreeMap::new(),
            selectors: BTreeSet::new(),
            frequency: 0,
        }
    }
}

/// Custom property name → raw color, filled in scan order.
///
/// Only definitions seen before a `var()` use can resolve it; later
/// definitions and cascade overrides are not revisited.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CssVariableTable(BTreeMap<String, String>);

impl CssVariableTable {
    pub fn define(&mut self, name: &str, raw: &str) {
        self.0.insert(name.to_string(), raw.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Colors, fonts and variables gathered from CSS at rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleInventory {
    pub colors: BTreeMap<Color, ColorRecord>,
    pub fonts: BTreeMap<String, FontRecord>,
    pub variables: CssVariableTable,
}

impl StyleInventory {
    /// Insert or update the record for `color`.
    pub fn record_color(
        &mut self,
        raw: &str,
        color: Color,
        selector: &str,
        property: &str,
        variable: Option<&str>,
    ) {
        let record = self
            .colors
            .entry(color)
            .or_insert_with(|| ColorRecord::new(color));
        record.value = raw.to_string();
        record.selectors.insert(selector.to_string());
        record.properties.insert(property.to_string());
        record
            .usages
            .insert((selector.to_string(), property.to_string()));
        record.frequency += 1;
        if let Some(name) = variable {
            record.css_variables.insert(name.to_string());
        }
    }

    /// Insert or update the record keyed by the first family in `font.family`.
    fn record_font(&mut self, selector: &str, font: FontDeclarations) {
        let Some(family) = font.family else {
            return;
        };
        let key = first_family_name(&family);
        if key.is_empty() {
            return;
        }
        let record = self
            .fonts
            .entry(key)
            .or_insert_with(|| FontRecord::new(&family));
        record.family = family;
        record.selectors.insert(selector.to_string());
        record.frequency += 1;
        if let Some(size) = font.size {
            *record.sizes.entry(size).or_insert(0) += 1;
        }
        if let Some(weight) = font.weight {
            *record.weights.entry(weight).or_insert(0) += 1;
        }
        if let Some(line_height) = font.line_height {
            *record.line_heights.entry(line_height).or_insert(0) += 1;
        }
    }
}

/// Incremental extractor over the CSS sources of one page.
///
/// Feed sources in scan order; custom properties resolve against whatever
/// was defined before them.
#[derive(Debug, Default)]
pub struct StyleExtractor {
    inventory: StyleInventory,
}

impl StyleExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan one inline `style` attribute. `element` is a short selector for the
    /// owning element such as `div.hero`.
    pub fn extract_inline(&mut self, element: &str, style: &str) {
        let mut input = ParserInput::new(style);
        let mut parser = Parser::new(&mut input);
        let declarations = parse_declaration_list(&mut parser);
        self.apply_declarations(element, &declarations, true);
    }

    /// Scan a stylesheet body (a `<style>` block or a fetched sheet).
    pub fn extract_stylesheet(&mut self, css: &str) {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut collector = RuleCollector::default();
        for result in cssparser::StyleSheetParser::new(&mut parser, &mut collector) {
            if let Err((err, slice)) = result {
                trace!(?err, slice, "skipping unparseable rule");
            }
        }
        for rule in collector.rules {
            self.apply_declarations(&rule.selector, &rule.declarations, false);
        }
    }

    pub fn inventory(&self) -> &StyleInventory {
        &self.inventory
    }

    pub fn finish(self) -> StyleInventory {
        self.inventory
    }

    fn apply_declarations(&mut self, selector: &str, declarations: &[Declaration], inline: bool) {
        let mut font = FontDeclarations::default();

        for decl in declarations {
            if decl.name.starts_with("--") {
                if let Some(raw) = self.first_color(&decl.colors) {
                    self.inventory.variables.define(&decl.name, &raw);
                }
                continue;
            }

            font.observe(decl);
            if NON_COLOR_PROPERTIES.contains(&decl.name.as_str()) {
                continue;
            }

            let usage_selector = if inline {
                format!("{selector}[style*=\"{}\"]", decl.name)
            } else {
                selector.to_string()
            };

            for token in &decl.colors {
                let (raw, variable) = match token {
                    ColorToken::Literal(raw) => (raw.clone(), None),
                    ColorToken::Var(name) => match self.inventory.variables.get(name) {
                        Some(raw) => (raw.to_string(), Some(name.as_str())),
                        None => {
                            trace!(variable = %name, "unresolved custom property");
                            continue;
                        }
                    },
                };
                match normalize_color(&raw) {
                    Some(color) => self.inventory.record_color(
                        &raw,
                        color,
                        &usage_selector,
                        &decl.name,
                        variable,
                    ),
                    None => trace!(value = %raw, "skipping unparseable color"),
                }
            }
        }

        self.inventory.record_font(selector, font);
    }

    /// First token of a custom property value that yields a valid color.
    fn first_color(&self, tokens: &[ColorToken]) -> Option<String> {
        tokens.iter().find_map(|token| {
            let raw = match token {
                ColorToken::Literal(raw) => raw.clone(),
                ColorToken::Var(name) => self.inventory.variables.get(name)?.to_string(),
            };
            normalize_color(&raw).map(|_| raw)
        })
    }
}

/// Convenience: extract a single stylesheet into a fresh inventory.
pub fn extract_css(css: &str) -> StyleInventory {
    let mut extractor = StyleExtractor::new();
    extractor.extract_stylesheet(css);
    extractor.finish()
}

/// The first family of a `font-family` list, quotes stripped.
pub fn first_family_name(family: &str) -> String {
    let first = family.split(',').next().unwrap_or_default().trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            first
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(first);
    unquoted.trim().to_string()
}

// ---------------------------------------------------------------------------
// Declaration model
// ---------------------------------------------------------------------------

/// A color-bearing token found in a declaration value.
#[derive(Debug, Clone, PartialEq)]
enum ColorToken {
    /// Hex, named or functional notation, as written.
    Literal(String),
    /// `var(--name)`; resolved against the variable table when applied.
    Var(String),
}

#[derive(Debug, Clone)]
struct Declaration {
    name: String,
    value: String,
    colors: Vec<ColorToken>,
}

#[derive(Debug)]
struct StyleRule {
    selector: String,
    declarations: Vec<Declaration>,
}

/// Font properties seen in one declaration block.
#[derive(Debug, Default)]
struct FontDeclarations {
    family: Option<String>,
    size: Option<String>,
    weight: Option<String>,
    line_height: Option<String>,
}

impl FontDeclarations {
    fn observe(&mut self, decl: &Declaration) {
        let value = strip_important(&decl.value);
        if value.is_empty() {
            return;
        }
        match decl.name.as_str() {
            "font-family" => self.family = Some(value.to_string()),
            "font-size" => self.size = Some(value.to_string()),
            "font-weight" => self.weight = Some(value.to_string()),
            "line-height" => self.line_height = Some(value.to_string()),
            "font" => self.observe_shorthand(value),
            _ => {}
        }
    }

    /// `font: [style] [weight] size[/line-height] family[, family]*`
    fn observe_shorthand(&mut self, value: &str) {
        let parts: Vec<&str> = value.split_whitespace().collect();
        let Some(idx) = parts.iter().position(|p| is_size_token(p)) else {
            return;
        };

        let mut family_start = idx + 1;
        match parts[idx].split_once('/') {
            Some((size, line_height)) => {
                self.size = Some(size.to_string());
                if !line_height.is_empty() {
                    self.line_height = Some(line_height.to_string());
                } else if let Some(lh) = parts.get(idx + 1) {
                    self.line_height = Some(lh.to_string());
                    family_start += 1;
                }
            }
            None => {
                self.size = Some(parts[idx].to_string());
                if parts.get(idx + 1) == Some(&"/") {
                    if let Some(lh) = parts.get(idx + 2) {
                        self.line_height = Some(lh.to_string());
                    }
                    family_start += 2;
                } else if let Some(lh) = parts.get(idx + 1).and_then(|p| p.strip_prefix('/')) {
                    self.line_height = Some(lh.to_string());
                    family_start += 1;
                }
            }
        }

        if let Some(weight) = parts[..idx].iter().find(|p| is_weight_token(p)) {
            self.weight = Some(weight.to_string());
        }
        if family_start < parts.len() {
            self.family = Some(parts[family_start..].join(" "));
        }
    }
}

fn strip_important(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_suffix("!important")
        .map(str::trim_end)
        .unwrap_or(value)
}

fn is_size_token(part: &str) -> bool {
    let head = part.split('/').next().unwrap_or_default();
    head.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && (head.ends_with("px") || head.ends_with("em") || head.ends_with('%'))
}

fn is_weight_token(part: &str) -> bool {
    matches!(part, "bold" | "bolder" | "lighter")
        || part
            .parse::<u16>()
            .is_ok_and(|w| (1..=1000).contains(&w))
}

// ---------------------------------------------------------------------------
// cssparser glue
// ---------------------------------------------------------------------------

fn parse_declaration_list<'i>(input: &mut Parser<'i, '_>) -> Vec<Declaration> {
    let mut collector = DeclarationCollector;
    let mut declarations = Vec::new();
    for result in RuleBodyParser::new(input, &mut collector) {
        match result {
            Ok(decl) => declarations.push(decl),
            Err((err, slice)) => trace!(?err, slice, "skipping malformed declaration"),
        }
    }
    declarations
}

/// Walk a value, pulling out every color-bearing token. Recurses into
/// functions other than the color functions (gradients, `color-mix`, ...).
fn collect_color_tokens<'i>(input: &mut Parser<'i, '_>, out: &mut Vec<ColorToken>) {
    while let Ok(token) = input.next().cloned() {
        match token {
            Token::Hash(value) | Token::IDHash(value) => {
                out.push(ColorToken::Literal(format!("#{}", value.as_ref())));
            }
            Token::Ident(name) => {
                if Color::from_name(&name).is_some() {
                    out.push(ColorToken::Literal(name.as_ref().to_string()));
                }
            }
            Token::Function(name) => {
                let name = name.to_ascii_lowercase();
                let _ = input.parse_nested_block(|block| {
                    match name.as_str() {
                        "rgb" | "rgba" | "hsl" | "hsla" => {
                            let start = block.position();
                            while block.next().is_ok() {}
                            let args = block.slice_from(start).trim();
                            out.push(ColorToken::Literal(format!("{name}({args})")));
                        }
                        "var" => {
                            if let Ok(var) = block.expect_ident_cloned() {
                                out.push(ColorToken::Var(var.as_ref().to_string()));
                            }
                            // Fallback values are ignored.
                            while block.next().is_ok() {}
                        }
                        _ => collect_color_tokens(block, out),
                    }
                    Ok::<(), ParseError<'i, ()>>(())
                });
            }
            _ => {}
        }
    }
}

#[derive(Default)]
struct RuleCollector {
    rules: Vec<StyleRule>,
}

impl<'i> QualifiedRuleParser<'i> for RuleCollector {
    type Prelude = String;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next().is_ok() {}
        Ok(input.slice_from(start).trim().to_string())
    }

    fn parse_block<'t>(
        &mut self,
        selector: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let declarations = parse_declaration_list(input);
        self.rules.push(StyleRule {
            selector,
            declarations,
        });
        Ok(())
    }
}

impl<'i> AtRuleParser<'i> for RuleCollector {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        if GROUPING_AT_RULES.contains(&name.to_ascii_lowercase().as_str()) {
            while input.next().is_ok() {}
            Ok(())
        } else {
            Err(input.new_custom_error::<(), ()>(()))
        }
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        for result in cssparser::StyleSheetParser::new(input, self) {
            if let Err((err, slice)) = result {
                trace!(?err, slice, "skipping unparseable nested rule");
            }
        }
        Ok(())
    }
}

struct DeclarationCollector;

impl<'i> DeclarationParser<'i> for DeclarationCollector {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let name = if name.starts_with("--") {
            name.as_ref().to_string()
        } else {
            name.to_ascii_lowercase()
        };
        let start = input.position();
        let mut colors = Vec::new();
        collect_color_tokens(input, &mut colors);
        let value = input.slice_from(start).trim().to_string();
        Ok(Declaration {
            name,
            value,
            colors,
        })
    }
}

impl<'i> AtRuleParser<'i> for DeclarationCollector {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for DeclarationCollector {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();
}

impl<'i> RuleBodyItemParser<'i, Declaration, ()> for DeclarationCollector {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Color {
        Color::from_hex(s).unwrap()
    }

    #[test]
    fn collects_hex_rgb_hsl_and_named() {
        let inv = extract_css(
            ".a { color: #fff; background: rgb(255, 0, 0); }
             .b { border-color: hsl(240, 100%, 50%); outline-color: black; }",
        );
        assert_eq!(inv.colors.len(), 4);
        assert!(inv.colors.contains_key(&hex("#ffffff")));
        assert!(inv.colors.contains_key(&hex("#ff0000")));
        assert!(inv.colors.contains_key(&hex("#0000ff")));
        assert!(inv.colors.contains_key(&hex("#000000")));

        let red = &inv.colors[&hex("#ff0000")];
        assert_eq!(red.value, "rgb(255, 0, 0)");
        assert!(red.selectors.contains(".a"));
        assert!(red.properties.contains("background"));
    }

    #[test]
    fn same_color_in_different_notations_merges() {
        let inv = extract_css(
            ".a { color: red; } .b { color: #f00; } .c { background-color: rgb(255,0,0); }",
        );
        assert_eq!(inv.colors.len(), 1);
        let record = &inv.colors[&hex("#ff0000")];
        assert_eq!(record.frequency, 3);
        assert_eq!(record.selectors.len(), 3);
        assert_eq!(record.value, "rgb(255,0,0)");
    }

    #[test]
    fn custom_properties_resolve_in_scan_order() {
        let inv = extract_css(
            ":root { --brand: #336699; --spacing: 4px; }
             .cta { background: var(--brand); }",
        );
        assert_eq!(inv.variables.len(), 1);
        assert_eq!(inv.variables.get("--brand"), Some("#336699"));

        let record = &inv.colors[&hex("#336699")];
        assert_eq!(record.frequency, 1);
        assert!(record.selectors.contains(".cta"));
        assert!(record.css_variables.contains("--brand"));
    }

    #[test]
    fn forward_references_stay_unresolved() {
        let inv = extract_css(
            ".cta { color: var(--late); }
             :root { --late: #123456; }",
        );
        assert!(inv.colors.is_empty());
        assert_eq!(inv.variables.get("--late"), Some("#123456"));
    }

    #[test]
    fn var_fallback_is_ignored() {
        let inv = extract_css(".x { color: var(--missing, #abcdef); }");
        assert!(inv.colors.is_empty());
    }

    #[test]
    fn variable_chains_resolve() {
        let inv = extract_css(
            ":root { --base: #0a0a0a; --text: var(--base); } p { color: var(--text); }",
        );
        assert_eq!(inv.variables.get("--text"), Some("#0a0a0a"));
        assert!(inv.colors[&hex("#0a0a0a")].css_variables.contains("--text"));
    }

    #[test]
    fn colors_inside_gradients_are_found() {
        let inv = extract_css(".hero { background: linear-gradient(90deg, #111111, rgba(0,0,255,0.5)); }");
        assert!(inv.colors.contains_key(&hex("#111111")));
        assert!(inv.colors.contains_key(&hex("#0000ff")));
    }

    #[test]
    fn media_blocks_are_scanned() {
        let inv = extract_css("@media (max-width: 600px) { .m { color: #222; } } @font-face { color: #333; }");
        assert!(inv.colors.contains_key(&hex("#222222")));
        assert!(!inv.colors.contains_key(&hex("#333333")));
    }

    #[test]
    fn malformed_rules_are_skipped() {
        let inv = extract_css(".a { color: #abc; } }}} .b { color: ; background: #zzz; } .c { color: #def; }");
        assert!(inv.colors.contains_key(&hex("#aabbcc")));
        assert!(inv.colors.contains_key(&hex("#ddeeff")));
    }

    #[test]
    fn repeated_passes_accumulate() {
        let css = ".a { color: #111; } .b { color: #111; background: #222; }";
        let once = extract_css(css);

        let mut extractor = StyleExtractor::new();
        extractor.extract_stylesheet(css);
        extractor.extract_stylesheet(css);
        let twice = extractor.finish();

        for (color, record) in &once.colors {
            let doubled = &twice.colors[color];
            assert_eq!(doubled.frequency, record.frequency * 2);
            assert_eq!(doubled.selectors, record.selectors);
            assert_eq!(doubled.properties, record.properties);
        }
    }

    #[test]
    fn inline_styles_get_attribute_selectors() {
        let mut extractor = StyleExtractor::new();
        extractor.extract_inline("div.hero", "background-color: #fafafa; color: navy");
        let inv = extractor.finish();

        let bg = &inv.colors[&hex("#fafafa")];
        assert!(bg.selectors.contains("div.hero[style*=\"background-color\"]"));
        let navy = &inv.colors[&hex("#000080")];
        assert!(navy.selectors.contains("div.hero[style*=\"color\"]"));
    }

    #[test]
    fn font_family_and_properties() {
        let inv = extract_css(
            "body { font-family: \"Inter\", Arial, sans-serif; font-size: 16px; font-weight: 400; line-height: 1.5; }
             h1 { font-family: 'Inter', sans-serif; font-size: 32px; }",
        );
        assert_eq!(inv.fonts.len(), 1);
        let inter = &inv.fonts["Inter"];
        assert_eq!(inter.frequency, 2);
        assert_eq!(inter.family, "'Inter', sans-serif");
        assert_eq!(inter.sizes["16px"], 1);
        assert_eq!(inter.sizes["32px"], 1);
        assert_eq!(inter.weights["400"], 1);
        assert_eq!(inter.line_heights["1.5"], 1);
        assert!(inter.selectors.contains("body"));
        assert!(inter.selectors.contains("h1"));
    }

    #[test]
    fn font_shorthand() {
        let inv = extract_css(".t { font: italic bold 14px/1.4 Georgia, serif; }");
        let georgia = &inv.fonts["Georgia"];
        assert_eq!(georgia.family, "Georgia, serif");
        assert_eq!(georgia.sizes["14px"], 1);
        assert_eq!(georgia.line_heights["1.4"], 1);
        assert_eq!(georgia.weights["bold"], 1);
    }

    #[test]
    fn font_shorthand_without_size_is_ignored() {
        let inv = extract_css(".t { font: inherit; }");
        assert!(inv.fonts.is_empty());
    }

    #[test]
    fn font_names_are_not_colors() {
        let inv = extract_css(".t { font-family: Red Hat Display, sans-serif; }");
        assert!(inv.colors.is_empty());
        assert!(inv.fonts.contains_key("Red Hat Display"));
    }

    #[test]
    fn important_is_stripped_from_font_values() {
        let inv = extract_css("p { font-family: Roboto !important; font-size: 12px !important; }");
        assert_eq!(inv.fonts["Roboto"].sizes["12px"], 1);
    }

    #[test]
    fn first_family_strips_matching_quotes_only() {
        assert_eq!(first_family_name("\"Open Sans\", Arial"), "Open Sans");
        assert_eq!(first_family_name("'Lato'"), "Lato");
        assert_eq!(first_family_name("\"Odd'"), "\"Odd'");
    }
}
