// ABOUTME: Intent-to-card routing for structured assistant replies
// ABOUTME: Total 1:1 mapping consumed by the rendering layer; general gets no card

use crate::intent::Intent;
use serde::{Deserialize, Serialize};

/// Presentation card attached to an assistant reply.
/// Wire names match the sub-agent output schemas of the backend
/// ("recommendation_card", "vote_card").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    RecommendationCard,
    VoteCard,
    ReminderCard,
    /// Plain text reply, no special card.
    None,
}

impl CardType {
    /// Route a classified intent to its card type. Total over the intent
    /// enumeration; no side effects, no failure modes.
    pub fn for_intent(intent: Intent) -> CardType {
        match intent {
            Intent::RestaurantRecommendation => CardType::RecommendationCard,
            Intent::Voting => CardType::VoteCard,
            Intent::Reminder => CardType::ReminderCard,
            Intent::General => CardType::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::RecommendationCard => "recommendation_card",
            CardType::VoteCard => "vote_card",
            CardType::ReminderCard => "reminder_card",
            CardType::None => "none",
        }
    }
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
