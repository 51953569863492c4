//! Icon classification for event titles.
//!
//! A plain ordered table of (patterns, icon) rules, evaluated top to bottom
//! with first match winning. Ordering is a correctness requirement: "raid
//! hour" must sit above "raid battles" or it becomes unreachable. Matching
//! is a case-insensitive substring test against the title, and there is
//! always an answer — titles that match nothing get the default icon.

use serde::Deserialize;

/// One classification rule: any of `patterns` appearing in the lowercased
/// title selects `icon`.
#[derive(Debug, Clone, Deserialize)]
pub struct IconRule {
    pub patterns: Vec<String>,
    pub icon: String,
}

/// The ordered rule table plus the fallback icon.
#[derive(Debug, Clone)]
pub struct IconTable {
    rules: Vec<IconRule>,
    default_icon: String,
}

/// Fallback icon for titles no rule matches.
pub const DEFAULT_ICON: &str = "📅";

/// Built-in rules for LeekDuck event titles, most specific first.
const LEEKDUCK_RULES: &[(&[&str], &str)] = &[
    (&["raid hour"], "⏰"),
    (&["raid day", "raid weekend"], "🎯"),
    (&["mega raid", "in mega raids"], "💫"),
    (
        &[
            "in 1-star", "in 2-star", "in 3-star", "in 4-star", "in 5-star", "in 6-star",
            "raid battles",
        ],
        "⚔️",
    ),
    (&["max battle", "max monday", "dynamax", "gigantamax"], "⭐"),
    (&["spotlight hour"], "🔦"),
    (&["community day"], "👥"),
    (&["go battle", "battle league", "pvp"], "🥊"),
    (&["festival", "celebration"], "🎉"),
    (&["halloween"], "🎃"),
    (&["go pass"], "🎫"),
    (&["wild area", "safari"], "🗺️"),
    (&["season", "tales of transformation"], "🌍"),
    (&["trade"], "🤝"),
    (&["showcase"], "📸"),
    (&["research"], "🔍"),
];

impl IconTable {
    pub fn new(rules: Vec<IconRule>, default_icon: String) -> Self {
        IconTable {
            rules,
            default_icon,
        }
    }

    /// The built-in LeekDuck rule table.
    pub fn leekduck_defaults() -> Self {
        let rules = LEEKDUCK_RULES
            .iter()
            .map(|(patterns, icon)| IconRule {
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
                icon: icon.to_string(),
            })
            .collect();

        IconTable::new(rules, DEFAULT_ICON.to_string())
    }

    /// Replace the fallback icon, keeping the rules.
    pub fn set_default_icon(&mut self, icon: String) {
        self.default_icon = icon;
    }

    /// Map a title to its icon. Total: every input gets exactly one icon,
    /// and the first matching rule wins.
    pub fn classify(&self, title: &str) -> &str {
        let title_lower = title.to_lowercase();

        for rule in &self.rules {
            if rule.patterns.iter().any(|p| title_lower.contains(p.as_str())) {
                return &rule.icon;
            }
        }

        &self.default_icon
    }
}
