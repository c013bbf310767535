use once_cell::sync::Lazy;
use palette::Srgb;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Core color type used throughout the pipeline.
///
/// Always an opaque sRGB triple; its canonical text form is lowercase
/// `#rrggbb`, which is also the dedup key everywhere downstream of parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const WHITE: Color = Color {
    r: 255,
    g: 255,
    b: 255,
};
pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

/// A parsed color plus the alpha it was written with.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Parsed {
    color: Color,
    alpha: f32,
}

static RGB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^rgba?\(\s*(\d+)\s*(?:,\s*|\s+)(\d+)\s*(?:,\s*|\s+)(\d+)\s*(?:[,/]\s*([0-9]*\.?[0-9]+%?)\s*)?\)$",
    )
    .expect("rgb pattern is valid")
});

static HSL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^hsla?\(\s*(\d+)(?:deg)?\s*(?:,\s*|\s+)(\d+)%\s*(?:,\s*|\s+)(\d+)%\s*(?:[,/]\s*([0-9]*\.?[0-9]+%?)\s*)?\)$",
    )
    .expect("hsl pattern is valid")
});

/// CSS color keywords, in the order used for reverse lookup.
const CSS_COLOR_NAMES: &[&str] = &[
    "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque", "black",
    "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue", "chartreuse",
    "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan", "darkblue", "darkcyan",
    "darkgoldenrod", "darkgray", "darkgreen", "darkgrey", "darkkhaki", "darkmagenta",
    "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon", "darkseagreen",
    "darkslateblue", "darkslategray", "darkslategrey", "darkturquoise", "darkviolet", "deeppink",
    "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick", "floralwhite", "forestgreen",
    "fuchsia", "gainsboro", "ghostwhite", "gold", "goldenrod", "gray", "green", "greenyellow",
    "grey", "honeydew", "hotpink", "indianred", "indigo", "ivory", "khaki", "lavender",
    "lavenderblush", "lawngreen", "lemonchiffon", "lightblue", "lightcoral", "lightcyan",
    "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey", "lightpink", "lightsalmon",
    "lightseagreen", "lightskyblue", "lightslategray", "lightslategrey", "lightsteelblue",
    "lightyellow", "lime", "limegreen", "linen", "magenta", "maroon", "mediumaquamarine",
    "mediumblue", "mediumorchid", "mediumpurple", "mediumseagreen", "mediumslateblue",
    "mediumspringgreen", "mediumturquoise", "mediumvioletred", "midnightblue", "mintcream",
    "mistyrose", "moccasin", "navajowhite", "navy", "oldlace", "olive", "olivedrab", "orange",
    "orangered", "orchid", "palegoldenrod", "palegreen", "paleturquoise", "palevioletred",
    "papayawhip", "peachpuff", "peru", "pink", "plum", "powderblue", "purple", "rebeccapurple",
    "red", "rosybrown", "royalblue", "saddlebrown", "salmon", "sandybrown", "seagreen",
    "seashell", "sienna", "silver", "skyblue", "slateblue", "slategray", "slategrey", "snow",
    "springgreen", "steelblue", "tan", "teal", "thistle", "tomato", "turquoise", "violet",
    "wheat", "white", "whitesmoke", "yellow", "yellowgreen",
];

/// Keywords a computed style reports for "no color here".
const EMPTY_KEYWORDS: &[&str] = &["transparent", "none", "initial", "inherit", "unset"];

/// Fragments that only show up when a custom property leaked through unresolved.
const LEAK_MARKERS: &[&str] = &["var(", "{{", "${"];

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex color string like `#ff8800`, `#F80` or `ff8800cc`.
    ///
    /// Alpha digits are accepted and discarded.
    pub fn from_hex(hex: &str) -> Result<Self> {
        parse_hex(hex.strip_prefix('#').unwrap_or(hex))
            .map(|p| p.color)
            .ok_or_else(|| Error::InvalidColor(hex.to_string()))
    }

    /// Serialize to lowercase hex `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Serialize to the legacy comma form `rgb(r, g, b)`.
    pub fn to_rgb_string(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// Convert to `palette::Srgb<u8>`.
    pub fn to_srgb_u8(self) -> Srgb<u8> {
        Srgb::new(self.r, self.g, self.b)
    }

    /// Create from `palette::Srgb<u8>`.
    pub fn from_srgb_u8(srgb: Srgb<u8>) -> Self {
        Self {
            r: srgb.red,
            g: srgb.green,
            b: srgb.blue,
        }
    }

    /// Look up a CSS color keyword (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        if let Some(srgb) = palette::named::from_str(&name) {
            return Some(Self::from_srgb_u8(srgb));
        }
        // Newer than the SVG keyword set palette ships.
        (name == "rebeccapurple").then(|| Self::new(0x66, 0x33, 0x99))
    }

    /// The first CSS keyword naming exactly this color, if any.
    pub fn name(self) -> Option<&'static str> {
        CSS_COLOR_NAMES
            .iter()
            .copied()
            .find(|name| Self::from_name(name) == Some(self))
    }

    /// WCAG relative luminance.
    ///
    /// Linearizes each sRGB channel, then computes the weighted sum.
    pub fn luminance(self) -> f64 {
        fn linearize(c: u8) -> f64 {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        let r = linearize(self.r);
        let g = linearize(self.g);
        let b = linearize(self.b);
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }

    /// WCAG contrast ratio between two colors.
    ///
    /// Returns a value in [1, 21]. Higher means more contrast.
    pub fn contrast_ratio(c1: &Color, c2: &Color) -> f64 {
        let l1 = c1.luminance();
        let l2 = c2.luminance();
        let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
        (lighter + 0.05) / (darker + 0.05)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::str::FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        normalize_color(s).ok_or_else(|| Error::InvalidColor(s.to_string()))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Normalize any supported CSS color notation to a [`Color`].
///
/// Accepts hex (3, 4, 6 or 8 digits), the CSS keyword table, integer
/// `rgb()`/`rgba()` and `hsl()`/`hsla()`. Alpha is parsed but dropped, so
/// `rgba(0, 0, 0, 0)` normalizes to black here; see
/// [`normalize_computed_color`] for the variant that rejects it.
pub fn normalize_color(raw: &str) -> Option<Color> {
    parse(raw).map(|p| p.color)
}

/// Normalize a value read from a rendered element's computed style.
///
/// Stricter than [`normalize_color`]: empty values, the "no color" keywords,
/// fully transparent values and unresolved custom-property leakage are all
/// rejected.
pub fn normalize_computed_color(raw: &str) -> Option<Color> {
    let value = raw.trim().to_ascii_lowercase();
    if value.is_empty() || EMPTY_KEYWORDS.contains(&value.as_str()) {
        return None;
    }
    if value.starts_with("--") || LEAK_MARKERS.iter().any(|m| value.contains(m)) {
        return None;
    }
    let parsed = parse(&value)?;
    (parsed.alpha > 0.0).then_some(parsed.color)
}

/// All equivalent textual forms of a color, for display and dedup.
///
/// Best effort: input that does not parse comes back as the only variant.
pub fn color_variants(raw: &str) -> Vec<String> {
    let Some(color) = normalize_color(raw) else {
        return vec![raw.to_string()];
    };
    let mut variants = vec![color.to_hex(), raw.trim().to_string()];
    if let Some(name) = color.name() {
        variants.push(name.to_string());
    }
    variants.push(color.to_rgb_string());

    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| seen.insert(v.clone()));
    variants
}

fn parse(raw: &str) -> Option<Parsed> {
    let value = raw.trim().to_ascii_lowercase();
    if value.is_empty() {
        return None;
    }
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    if value.starts_with("rgb") {
        return parse_rgb(&value);
    }
    if value.starts_with("hsl") {
        return parse_hsl(&value);
    }
    Color::from_name(&value).map(|color| Parsed { color, alpha: 1.0 })
}

fn parse_hex(hex: &str) -> Option<Parsed> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    let (r, g, b, a) = match hex.len() {
        3 => (nibble(0)?, nibble(1)?, nibble(2)?, 255),
        4 => (nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?),
        6 => (byte(0)?, byte(2)?, byte(4)?, 255),
        8 => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
        _ => return None,
    };
    Some(Parsed {
        color: Color::new(r, g, b),
        alpha: a as f32 / 255.0,
    })
}

fn parse_rgb(value: &str) -> Option<Parsed> {
    let caps = RGB_RE.captures(value)?;
    let channel = |i: usize| caps.get(i)?.as_str().parse::<u8>().ok();
    let color = Color::new(channel(1)?, channel(2)?, channel(3)?);
    let alpha = match caps.get(4) {
        Some(m) => parse_alpha(m.as_str())?,
        None => 1.0,
    };
    Some(Parsed { color, alpha })
}

fn parse_hsl(value: &str) -> Option<Parsed> {
    let caps = HSL_RE.captures(value)?;
    let number = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    let h = number(1)? % 360;
    let s = number(2)?.min(100);
    let l = number(3)?.min(100);
    let alpha = match caps.get(4) {
        Some(m) => parse_alpha(m.as_str())?,
        None => 1.0,
    };
    Some(Parsed {
        color: hsl_to_rgb(h, s, l),
        alpha,
    })
}

fn parse_alpha(raw: &str) -> Option<f32> {
    let alpha = match raw.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok()? / 100.0,
        None => raw.parse::<f32>().ok()?,
    };
    Some(alpha.clamp(0.0, 1.0))
}

/// Chroma / intermediate / match conversion with 60° hue sectors.
fn hsl_to_rgb(h: u32, s: u32, l: u32) -> Color {
    let s = s as f64 / 100.0;
    let l = l as f64 / 100.0;
    let hue = h as f64;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |ch: f64| ((ch + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color::new(to_u8(r), to_u8(g), to_u8(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(raw: &str) -> Option<String> {
        normalize_color(raw).map(Color::to_hex)
    }

    #[test]
    fn hex_round_trip() {
        let original = Color::from_hex("#ff8800").unwrap();
        assert_eq!(original.r, 255);
        assert_eq!(original.g, 136);
        assert_eq!(original.b, 0);
        assert_eq!(original.to_hex(), "#ff8800");
    }

    #[test]
    fn hex_uppercase_input() {
        assert_eq!(hex("#FF8800").as_deref(), Some("#ff8800"));
    }

    #[test]
    fn hex_without_hash() {
        let color = Color::from_hex("aabbcc").unwrap();
        assert_eq!(color.to_hex(), "#aabbcc");
    }

    #[test]
    fn short_hex_expands() {
        assert_eq!(hex("#fff").as_deref(), Some("#ffffff"));
        assert_eq!(hex("#abc").as_deref(), Some("#aabbcc"));
        assert_eq!(hex("#000000").as_deref(), Some("#000000"));
    }

    #[test]
    fn alpha_hex_digits_are_dropped() {
        assert_eq!(hex("#f008").as_deref(), Some("#ff0000"));
        assert_eq!(hex("#12345680").as_deref(), Some("#123456"));
    }

    #[test]
    fn hex_invalid_length_or_chars() {
        assert!(Color::from_hex("#ff").is_err());
        assert!(Color::from_hex("#fffff").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
    }

    #[test]
    fn named_colors() {
        assert_eq!(hex("red").as_deref(), Some("#ff0000"));
        assert_eq!(hex("White").as_deref(), Some("#ffffff"));
        assert_eq!(hex("black").as_deref(), Some("#000000"));
        assert_eq!(hex("rebeccapurple").as_deref(), Some("#663399"));
        assert_eq!(hex("transparent"), None);
    }

    #[test]
    fn rgb_functions() {
        assert_eq!(hex("rgb(255,0,0)").as_deref(), Some("#ff0000"));
        assert_eq!(hex("rgb(255, 255, 255)").as_deref(), Some("#ffffff"));
        assert_eq!(hex("rgba(0, 0, 0, 0.5)").as_deref(), Some("#000000"));
        assert_eq!(hex("rgb(12 34 56 / 50%)").as_deref(), Some("#0c2238"));
        assert_eq!(hex("rgb(256, 0, 0)"), None);
    }

    #[test]
    fn hsl_functions() {
        assert_eq!(hex("hsl(0,100%,50%)").as_deref(), Some("#ff0000"));
        assert_eq!(hex("hsl(120, 100%, 50%)").as_deref(), Some("#00ff00"));
        assert_eq!(hex("hsl(240,100%,50%)").as_deref(), Some("#0000ff"));
        assert_eq!(hex("hsla(0, 0%, 100%, 0.3)").as_deref(), Some("#ffffff"));
        // 50% gray rounds up: 0.5 * 255 = 127.5
        assert_eq!(hex("hsl(0, 0%, 50%)").as_deref(), Some("#808080"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(hex(""), None);
        assert_eq!(hex("   "), None);
        assert_eq!(hex("not-a-color"), None);
        assert_eq!(hex("invalid"), None);
        assert_eq!(hex("rgb(red)"), None);
    }

    #[test]
    fn computed_rejects_transparent_and_keywords() {
        assert_eq!(normalize_computed_color("rgba(0, 0, 0, 0)"), None);
        assert_eq!(normalize_computed_color("hsla(10, 50%, 50%, 0)"), None);
        assert_eq!(normalize_computed_color("#fff0"), None);
        assert_eq!(normalize_computed_color("#ffffff00"), None);
        assert_eq!(normalize_computed_color("transparent"), None);
        assert_eq!(normalize_computed_color("inherit"), None);
        assert_eq!(normalize_computed_color(""), None);
    }

    #[test]
    fn computed_rejects_leaked_variables() {
        assert_eq!(normalize_computed_color("var(--tw-ring-color)"), None);
        assert_eq!(normalize_computed_color("--brand-primary"), None);
        assert_eq!(normalize_computed_color("{{ theme.bg }}"), None);
    }

    #[test]
    fn computed_keeps_translucent_colors() {
        assert_eq!(
            normalize_computed_color("rgba(10, 20, 30, 0.4)"),
            Some(Color::new(10, 20, 30))
        );
        assert_eq!(
            normalize_computed_color("rgb(17, 17, 17)"),
            Some(Color::new(17, 17, 17))
        );
    }

    #[test]
    fn variants_include_all_forms() {
        let variants = color_variants("#ff0000");
        assert!(variants.contains(&"#ff0000".to_string()));
        assert!(variants.contains(&"rgb(255, 0, 0)".to_string()));
        assert!(variants.contains(&"red".to_string()));

        let variants = color_variants("white");
        assert!(variants.contains(&"#ffffff".to_string()));
        assert!(variants.contains(&"white".to_string()));
        assert_eq!(variants.iter().filter(|v| *v == "white").count(), 1);
    }

    #[test]
    fn variants_of_garbage_is_the_input() {
        assert_eq!(color_variants("nope"), vec!["nope".to_string()]);
    }

    #[test]
    fn reverse_name_prefers_table_order() {
        assert_eq!(Color::new(0, 255, 255).name(), Some("aqua"));
        assert_eq!(Color::new(128, 128, 128).name(), Some("gray"));
        assert_eq!(Color::new(1, 2, 3).name(), None);
    }

    #[test]
    fn contrast_ratio_black_white() {
        let ratio = Color::contrast_ratio(&BLACK, &WHITE);
        assert!(
            ratio > 20.0 && ratio < 22.0,
            "black/white contrast should be ~21:1, got {ratio}"
        );
    }

    #[test]
    fn contrast_ratio_same_color() {
        let red = Color::new(255, 0, 0);
        let ratio = Color::contrast_ratio(&red, &red);
        assert!(
            (ratio - 1.0).abs() < 0.001,
            "same color contrast should be 1:1, got {ratio}"
        );
    }

    #[test]
    fn contrast_ratio_is_symmetric() {
        let a = Color::new(200, 50, 50);
        let b = Color::new(50, 200, 50);
        let ratio_ab = Color::contrast_ratio(&a, &b);
        let ratio_ba = Color::contrast_ratio(&b, &a);
        assert!(
            (ratio_ab - ratio_ba).abs() < 1e-9,
            "contrast ratio should be symmetric: {ratio_ab} vs {ratio_ba}"
        );
    }

    #[test]
    fn luminance_bounds() {
        assert!(BLACK.luminance() < 0.001);
        assert!((WHITE.luminance() - 1.0).abs() < 0.001);
    }

    #[test]
    fn serde_uses_canonical_hex() {
        let json = serde_json::to_string(&Color::new(171, 205, 239)).unwrap();
        assert_eq!(json, "\"#abcdef\"");
        let back: Color = serde_json::from_str("\"rgb(171, 205, 239)\"").unwrap();
        assert_eq!(back, Color::new(171, 205, 239));
        assert!(serde_json::from_str::<Color>("\"bogus\"").is_err());
    }

    #[test]
    fn display_matches_to_hex() {
        let color = Color::new(171, 205, 239);
        assert_eq!(format!("{color}"), color.to_hex());
    }
}
