// ABOUTME: Assistant reply composition: intent-routed payloads and prompt wrapping
// ABOUTME: Defines the CompletionBackend boundary; the LLM call itself lives outside the core

use crate::cards::CardType;
use crate::intent::{Extraction, Intent, PatternMatcher};
use crate::session::SessionUser;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Display name of the assistant persona.
pub const ASSISTANT_NAME: &str = "Burpla";

/// User id the assistant's own messages carry on the wire.
pub const ASSISTANT_USER_ID: &str = "bot";

/// Boundary to the external language-model completion call. The core
/// supplies the prompt payload; streaming and retries are the backend's
/// concern, not ours.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// The intent-routed reply payload attached to an assistant response.
/// Carries the assistant's own wire identity so clients render it like
/// any other member's message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    #[serde(rename = "senderId")]
    pub sender_id: String,
    #[serde(rename = "senderName")]
    pub sender_name: String,
    pub intent: Intent,
    #[serde(rename = "cardType")]
    pub card_type: CardType,
    #[serde(skip_serializing_if = "Extraction::is_empty", default)]
    pub extraction: Extraction,
    /// Completion text, present when a backend is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

/// Classifies a message and builds the structured reply plus the prompt
/// payload for the downstream completion call.
pub struct ReplyComposer {
    matcher: PatternMatcher,
    name: String,
}

impl ReplyComposer {
    /// `name` is the persona the replies are attributed to and the voice
    /// the composed prompt speaks in; it comes from configuration.
    pub fn new(name: &str) -> Result<Self> {
        Ok(ReplyComposer {
            matcher: PatternMatcher::new()?,
            name: name.to_string(),
        })
    }

    /// Classify and route without invoking any backend. Never fails:
    /// classification and routing are total.
    pub fn classify(&self, message: &str) -> AssistantReply {
        let intent = self.matcher.classify(message);
        let extraction = self.matcher.extract(message);
        crate::metrics::record_message_classified(intent.as_str());
        tracing::debug!(
            intent = %intent,
            has_location = extraction.location.is_some(),
            has_time = extraction.time.is_some(),
            "Message classified"
        );
        AssistantReply {
            sender_id: ASSISTANT_USER_ID.to_string(),
            sender_name: self.name.clone(),
            intent,
            card_type: CardType::for_intent(intent),
            extraction,
            reply: None,
        }
    }

    /// Wrap the user query with session member context and the computed
    /// intent/extraction for the completion call.
    pub fn compose_prompt(
        &self,
        message: &str,
        sender_name: &str,
        members: &[SessionUser],
        reply: &AssistantReply,
    ) -> String {
        let member_names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        let mut prompt = format!(
            "You are {}, the group dining assistant.\n\
             Information about the session for more context: Members: {}\n\
             Sender: {}\n\
             Detected intent: {} (card: {})\n",
            self.name,
            if member_names.is_empty() {
                "none".to_string()
            } else {
                member_names.join(", ")
            },
            sender_name,
            reply.intent,
            reply.card_type,
        );
        if let Some(ref location) = reply.extraction.location {
            prompt.push_str(&format!("Mentioned location: {}\n", location));
        }
        if let Some(ref time) = reply.extraction.time {
            prompt.push_str(&format!("Mentioned time: {}\n", time));
        }
        prompt.push_str(&format!("Query: {}", message));
        prompt
    }
}
