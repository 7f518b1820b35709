// ABOUTME: Deterministic message-intent classification and location/time extraction
// ABOUTME: Ordered rule table with fixed priority: reminder > voting > restaurant > general

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Classified purpose of a user message, driving which reply card is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Reminder,
    Voting,
    RestaurantRecommendation,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Reminder => "reminder",
            Intent::Voting => "voting",
            Intent::RestaurantRecommendation => "restaurant_recommendation",
            Intent::General => "general",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Best-effort location/time substrings pulled from a message.
/// Absence is represented, never defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.time.is_none()
    }
}

/// One row of the classification table: keywords are matched as substrings
/// of the lowercased message, compound patterns catch multi-word phrasings
/// a flat keyword scan misses.
struct IntentRule {
    intent: Intent,
    keywords: &'static [&'static str],
    patterns: Vec<Regex>,
}

impl IntentRule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|kw| lowered.contains(kw))
            || self.patterns.iter().any(|p| p.is_match(lowered))
    }
}

const REMINDER_KEYWORDS: &[&str] = &[
    "remind",
    "reminder",
    "don't forget",
    "dont forget",
    "alert me",
    "notify me",
    "time to",
];

const VOTING_KEYWORDS: &[&str] = &["vote", "voting", "poll", "ballot"];

const RESTAURANT_KEYWORDS: &[&str] = &[
    "restaurant",
    "eat",
    "food",
    "hungry",
    "dinner",
    "lunch",
    "breakfast",
    "brunch",
    "sushi",
    "pizza",
    "cuisine",
    "near me",
    "around here",
];

/// Compiles the rule table once; classification itself is pure and
/// safe to call concurrently.
pub struct PatternMatcher {
    rules: Vec<IntentRule>,
    location_patterns: Vec<Regex>,
    time_patterns: Vec<Regex>,
}

impl PatternMatcher {
    pub fn new() -> Result<Self> {
        let compile = |patterns: &[&str]| -> Result<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| Regex::new(p).with_context(|| format!("Invalid pattern: {}", p)))
                .collect()
        };

        // Evaluated top-to-bottom; order is the priority invariant.
        // Reminders are time-critical and must never be masked by a looser
        // restaurant keyword collision ("best time to eat dinner").
        let rules = vec![
            IntentRule {
                intent: Intent::Reminder,
                keywords: REMINDER_KEYWORDS,
                patterns: compile(&[r"set (a |an )?\w*\s*reminder", r"don'?t let (me|us) forget"])?,
            },
            IntentRule {
                intent: Intent::Voting,
                keywords: VOTING_KEYWORDS,
                patterns: compile(&[
                    r"which \w+( \w+)* should",
                    r"(create|start|make|generate) (a |the )?\w*\s*(vote|poll)",
                    r"let'?s (vote|decide)",
                ])?,
            },
            IntentRule {
                intent: Intent::RestaurantRecommendation,
                keywords: RESTAURANT_KEYWORDS,
                patterns: compile(&[
                    r"recommend \w+( \w+)* (place|spot|restaurant)",
                    r"where (should|can|do) (we|i) (eat|go)",
                    r"find (me|us) (a |some )?\w*\s*(place|food|restaurant)",
                    r"(good|best) (place|spot) to eat",
                ])?,
            },
        ];

        // Applied to the original-case text; the whole match is returned
        // ("in Houston", not "Houston"). First pattern that hits wins.
        let location_patterns = compile(&[
            r"\b(?:in|near|at)\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*",
            r"\b\d{5}\b",
            r"\b[A-Z][a-zA-Z]+,\s?[A-Z]{2}\b",
        ])?;

        let time_patterns = compile(&[
            r"(?i)\b\d{1,2}:\d{2}\s*(?:am|pm)\b",
            r"(?i)\b\d{1,2}\s*(?:am|pm)\b",
            r"(?i)\b(?:at|around|by)\s+\d{1,2}(?::\d{2})?\s*(?:am|pm)?\b",
        ])?;

        Ok(PatternMatcher {
            rules,
            location_patterns,
            time_patterns,
        })
    }

    /// Classify a message into exactly one intent. Pure and deterministic;
    /// ambiguity is resolved by table order, never surfaced as an error.
    pub fn classify(&self, message: &str) -> Intent {
        let lowered = message.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.intent)
            .unwrap_or(Intent::General)
    }

    /// First location pattern that matches anywhere in the text wins;
    /// multiple candidates are never merged. Relative phrases like
    /// "near me" are intent keywords, not extractable locations.
    pub fn extract_location(&self, message: &str) -> Option<String> {
        self.location_patterns
            .iter()
            .find_map(|p| p.find(message))
            .map(|m| m.as_str().to_string())
    }

    /// First clock-time pattern that matches anywhere in the text wins.
    pub fn extract_time(&self, message: &str) -> Option<String> {
        self.time_patterns
            .iter()
            .find_map(|p| p.find(message))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract(&self, message: &str) -> Extraction {
        Extraction {
            location: self.extract_location(message),
            time: self.extract_time(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> PatternMatcher {
        PatternMatcher::new().unwrap()
    }

    #[test]
    fn test_classify_restaurant_keyword() {
        let m = matcher();
        assert_eq!(
            m.classify("find me a good sushi place near me"),
            Intent::RestaurantRecommendation
        );
        assert_eq!(m.classify("I'm so hungry"), Intent::RestaurantRecommendation);
    }

    #[test]
    fn test_classify_voting() {
        let m = matcher();
        assert_eq!(m.classify("let's start a poll"), Intent::Voting);
        assert_eq!(m.classify("which restaurant should we pick"), Intent::Voting);
    }

    #[test]
    fn test_classify_reminder() {
        let m = matcher();
        assert_eq!(m.classify("remind me tomorrow"), Intent::Reminder);
        assert_eq!(m.classify("set a lunch reminder"), Intent::Reminder);
    }

    #[test]
    fn test_reminder_wins_over_restaurant() {
        // Priority invariant: a reminder keyword must never be masked by a
        // looser restaurant keyword collision.
        let m = matcher();
        assert_eq!(
            m.classify("what's the best time to eat dinner"),
            Intent::Reminder
        );
        assert_eq!(
            m.classify("remind me to book the restaurant"),
            Intent::Reminder
        );
    }

    #[test]
    fn test_reminder_wins_over_voting() {
        let m = matcher();
        assert_eq!(
            m.classify("remind everyone to vote on the poll"),
            Intent::Reminder
        );
    }

    #[test]
    fn test_voting_wins_over_restaurant() {
        let m = matcher();
        assert_eq!(m.classify("vote for your favorite restaurant"), Intent::Voting);
    }

    #[test]
    fn test_classify_general_fallback() {
        let m = matcher();
        assert_eq!(m.classify("hello everyone"), Intent::General);
        assert_eq!(m.classify(""), Intent::General);
        assert_eq!(m.classify("how was your weekend?"), Intent::General);
    }

    #[test]
    fn test_classify_case_insensitive() {
        let m = matcher();
        assert_eq!(m.classify("REMIND me later"), Intent::Reminder);
        assert_eq!(m.classify("Create A Poll"), Intent::Voting);
    }

    #[test]
    fn test_extract_location_after_preposition() {
        let m = matcher();
        assert_eq!(
            m.extract_location("Let's go in Houston"),
            Some("in Houston".to_string())
        );
        assert_eq!(
            m.extract_location("somewhere near Sugar Land please"),
            Some("near Sugar Land".to_string())
        );
    }

    #[test]
    fn test_extract_location_postal_code() {
        let m = matcher();
        assert_eq!(m.extract_location("deliver to 77005"), Some("77005".to_string()));
    }

    #[test]
    fn test_extract_location_city_state() {
        let m = matcher();
        assert_eq!(
            m.extract_location("flying to Austin, TX next week"),
            Some("Austin, TX".to_string())
        );
    }

    #[test]
    fn test_extract_location_relative_phrase_not_captured() {
        // "near me" triggers restaurant intent but is deliberately not an
        // extractable location; coordinates come from a separate input.
        let m = matcher();
        assert_eq!(m.extract_location("find me a good sushi place near me"), None);
    }

    #[test]
    fn test_extract_location_absent() {
        let m = matcher();
        assert_eq!(m.extract_location("no places here"), None);
    }

    #[test]
    fn test_extract_time_clock() {
        let m = matcher();
        assert_eq!(
            m.extract_time("Let's meet at 7:30pm"),
            Some("7:30pm".to_string())
        );
    }

    #[test]
    fn test_extract_time_first_match_wins() {
        // Two time-like substrings: only the first pattern's hit is returned.
        let m = matcher();
        assert_eq!(
            m.extract_time("either at 7:30pm or around 9pm"),
            Some("7:30pm".to_string())
        );
    }

    #[test]
    fn test_extract_time_hour_only() {
        let m = matcher();
        assert_eq!(m.extract_time("dinner at 8pm?"), Some("8pm".to_string()));
    }

    #[test]
    fn test_extract_time_preposition_form() {
        let m = matcher();
        assert_eq!(m.extract_time("be there by 6"), Some("by 6".to_string()));
    }

    #[test]
    fn test_extract_time_absent() {
        let m = matcher();
        assert_eq!(m.extract_time("no schedule yet"), None);
    }

    #[test]
    fn test_extract_both() {
        let m = matcher();
        let e = m.extract("dinner in Houston at 7:30pm");
        assert_eq!(e.location, Some("in Houston".to_string()));
        assert_eq!(e.time, Some("7:30pm".to_string()));
        assert!(!e.is_empty());
    }

    #[test]
    fn test_extraction_empty() {
        let m = matcher();
        assert!(m.extract("hello").is_empty());
    }
}
