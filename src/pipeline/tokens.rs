use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{Color, BLACK, WHITE};
use crate::pipeline::rank::{rank_subset, ColorRole, Contribution};
use crate::sample::ElementRole;

/// Names of the inferred design tokens, in inference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenName {
    WidgetBg,
    Border,
    TextPrimary,
    TextMuted,
    Accent,
    AccentHover,
    BotBubbleBg,
    UserBubbleBg,
    UserBubbleText,
}

impl TokenName {
    pub const ALL: [TokenName; 9] = [
        TokenName::WidgetBg,
        TokenName::Border,
        TokenName::TextPrimary,
        TokenName::TextMuted,
        TokenName::Accent,
        TokenName::AccentHover,
        TokenName::BotBubbleBg,
        TokenName::UserBubbleBg,
        TokenName::UserBubbleText,
    ];

    /// The camelCase key used in serialized output.
    pub fn key(self) -> &'static str {
        match self {
            TokenName::WidgetBg => "widgetBg",
            TokenName::Border => "border",
            TokenName::TextPrimary => "textPrimary",
            TokenName::TextMuted => "textMuted",
            TokenName::Accent => "accent",
            TokenName::AccentHover => "accentHover",
            TokenName::BotBubbleBg => "botBubbleBg",
            TokenName::UserBubbleBg => "userBubbleBg",
            TokenName::UserBubbleText => "userBubbleText",
        }
    }

    /// Kebab-case name for stylesheet custom properties.
    pub fn css_name(self) -> &'static str {
        match self {
            TokenName::WidgetBg => "widget-bg",
            TokenName::Border => "border",
            TokenName::TextPrimary => "text-primary",
            TokenName::TextMuted => "text-muted",
            TokenName::Accent => "accent",
            TokenName::AccentHover => "accent-hover",
            TokenName::BotBubbleBg => "bot-bubble-bg",
            TokenName::UserBubbleBg => "user-bubble-bg",
            TokenName::UserBubbleText => "user-bubble-text",
        }
    }
}

/// Inferred design palette. Every slot may be absent; absence serializes
/// as `null` and is never replaced with a guessed color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSet {
    pub widget_bg: Option<Color>,
    pub border: Option<Color>,
    pub text_primary: Option<Color>,
    pub text_muted: Option<Color>,
    pub accent: Option<Color>,
    pub accent_hover: Option<Color>,
    pub bot_bubble_bg: Option<Color>,
    pub user_bubble_bg: Option<Color>,
    pub user_bubble_text: Option<Color>,
}

impl TokenSet {
    pub fn get(&self, name: TokenName) -> Option<Color> {
        *self.slot(name)
    }

    pub fn set(&mut self, name: TokenName, value: Option<Color>) {
        *self.slot_mut(name) = value;
    }

    /// Tokens in inference order, present or not.
    pub fn iter(&self) -> impl Iterator<Item = (TokenName, Option<Color>)> + '_ {
        TokenName::ALL.into_iter().map(|name| (name, self.get(name)))
    }

    pub fn present(&self) -> usize {
        self.iter().filter(|(_, value)| value.is_some()).count()
    }

    fn slot(&self, name: TokenName) -> &Option<Color> {
        match name {
            TokenName::WidgetBg => &self.widget_bg,
            TokenName::Border => &self.border,
            TokenName::TextPrimary => &self.text_primary,
            TokenName::TextMuted => &self.text_muted,
            TokenName::Accent => &self.accent,
            TokenName::AccentHover => &self.accent_hover,
            TokenName::BotBubbleBg => &self.bot_bubble_bg,
            TokenName::UserBubbleBg => &self.user_bubble_bg,
            TokenName::UserBubbleText => &self.user_bubble_text,
        }
    }

    fn slot_mut(&mut self, name: TokenName) -> &mut Option<Color> {
        match name {
            TokenName::WidgetBg => &mut self.widget_bg,
            TokenName::Border => &mut self.border,
            TokenName::TextPrimary => &mut self.text_primary,
            TokenName::TextMuted => &mut self.text_muted,
            TokenName::Accent => &mut self.accent,
            TokenName::AccentHover => &mut self.accent_hover,
            TokenName::BotBubbleBg => &mut self.bot_bubble_bg,
            TokenName::UserBubbleBg => &mut self.user_bubble_bg,
            TokenName::UserBubbleText => &mut self.user_bubble_text,
        }
    }
}

/// Where a token's value may come from.
#[derive(Debug, Clone, Copy)]
enum Source {
    /// The `rank`-th entry of the subset ranking.
    Ranked {
        role: ColorRole,
        elements: &'static [ElementRole],
        rank: usize,
    },
    /// The best entry of the subset ranking that differs from another token.
    DistinctFrom {
        role: ColorRole,
        elements: &'static [ElementRole],
        other: TokenName,
    },
    /// A token inferred earlier in the table.
    Token(TokenName),
    /// White or black, whichever reads on an earlier token.
    ReadableOn(TokenName),
}

#[derive(Debug, Clone, Copy)]
struct TokenRule {
    token: TokenName,
    chain: &'static [Source],
}

const SURFACES: &[ElementRole] = &[ElementRole::Body, ElementRole::Main, ElementRole::Container];
const FRAMES: &[ElementRole] = &[ElementRole::Container, ElementRole::Body, ElementRole::Main];
const COPY: &[ElementRole] = &[ElementRole::Heading, ElementRole::Paragraph];
const BUTTONS: &[ElementRole] = &[ElementRole::Button];
const LINKS: &[ElementRole] = &[ElementRole::Link];
const CONTAINERS: &[ElementRole] = &[ElementRole::Container];

/// Luminance below which white text is used on a filled bubble.
const DARK_LUMINANCE: f64 = 0.5;

/// Evaluated top to bottom; a rule may only refer to tokens above it.
const TOKEN_RULES: &[TokenRule] = &[
    TokenRule {
        token: TokenName::WidgetBg,
        chain: &[Source::Ranked { role: ColorRole::Background, elements: SURFACES, rank: 0 }],
    },
    TokenRule {
        token: TokenName::Border,
        chain: &[Source::Ranked { role: ColorRole::Border, elements: FRAMES, rank: 0 }],
    },
    TokenRule {
        token: TokenName::TextPrimary,
        chain: &[Source::Ranked { role: ColorRole::Text, elements: COPY, rank: 0 }],
    },
    TokenRule {
        token: TokenName::TextMuted,
        chain: &[Source::Ranked { role: ColorRole::Text, elements: COPY, rank: 1 }],
    },
    TokenRule {
        token: TokenName::Accent,
        chain: &[
            Source::Ranked { role: ColorRole::Background, elements: BUTTONS, rank: 0 },
            Source::Ranked { role: ColorRole::Text, elements: LINKS, rank: 0 },
        ],
    },
    TokenRule {
        token: TokenName::AccentHover,
        chain: &[Source::DistinctFrom {
            role: ColorRole::Background,
            elements: BUTTONS,
            other: TokenName::Accent,
        }],
    },
    TokenRule {
        token: TokenName::BotBubbleBg,
        chain: &[
            Source::Ranked { role: ColorRole::Background, elements: CONTAINERS, rank: 0 },
            Source::Token(TokenName::WidgetBg),
        ],
    },
    TokenRule {
        token: TokenName::UserBubbleBg,
        chain: &[
            Source::Token(TokenName::Accent),
            Source::Ranked { role: ColorRole::Text, elements: LINKS, rank: 0 },
        ],
    },
    TokenRule {
        token: TokenName::UserBubbleText,
        chain: &[Source::ReadableOn(TokenName::UserBubbleBg)],
    },
];

/// Infer the design tokens from ranked contributions.
pub fn infer_tokens(contributions: &[Contribution]) -> TokenSet {
    let mut tokens = TokenSet::default();
    for rule in TOKEN_RULES {
        let value = rule
            .chain
            .iter()
            .find_map(|source| resolve(*source, contributions, &tokens));
        debug!(token = rule.token.key(), value = ?value.map(Color::to_hex), "inferred token");
        tokens.set(rule.token, value);
    }
    tokens
}

fn resolve(source: Source, contributions: &[Contribution], tokens: &TokenSet) -> Option<Color> {
    match source {
        Source::Ranked { role, elements, rank } => rank_subset(contributions, role, elements)
            .get(rank)
            .map(|entry| entry.color),
        Source::DistinctFrom { role, elements, other } => {
            let other = tokens.get(other);
            rank_subset(contributions, role, elements)
                .into_iter()
                .map(|entry| entry.color)
                .find(|color| Some(*color) != other)
        }
        Source::Token(name) => tokens.get(name),
        Source::ReadableOn(name) => tokens.get(name).map(|bg| {
            if bg.luminance() < DARK_LUMINANCE {
                WHITE
            } else {
                BLACK
            }
        }),
    }
}
