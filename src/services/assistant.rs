//! Conversational assistant grounded in retrieved evidence.

use crate::config::{OperationTimeoutConfig, OperationType};
use crate::evidence::EvidenceStore;
use crate::llm::{SYSTEM_PROMPT, TextGenerator};
use crate::models::{ChatReply, ChatTurn, EvidenceHit, EvidenceSnippet, UserProfile};
use crate::{Result, with_timeout};
use std::fmt::Write as _;
use std::sync::Arc;

/// Prior turns included in the prompt.
const HISTORY_TURNS: usize = 6;

/// Evidence hits retrieved per message.
const CONTEXT_DOCS: usize = 3;

/// Evidence snippets attached to a reply.
const REPLY_SNIPPETS: usize = 2;

/// Characters kept from each snippet.
const SNIPPET_CHARS: usize = 150;

/// Answers free-form questions using the evidence store and text generator.
#[derive(Clone)]
pub struct AssistantService {
    evidence: Arc<dyn EvidenceStore>,
    generator: Arc<dyn TextGenerator>,
    timeouts: OperationTimeoutConfig,
    offline: bool,
}

impl AssistantService {
    /// Creates a new assistant service.
    #[must_use]
    pub fn new(evidence: Arc<dyn EvidenceStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            evidence,
            generator,
            timeouts: OperationTimeoutConfig::default(),
            offline: false,
        }
    }

    /// Sets operation timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: OperationTimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Skips evidence retrieval.
    #[must_use]
    pub const fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Replies to `message` given the conversation so far.
    ///
    /// Never fails: any retrieval or generation error yields the canned
    /// fallback reply with `degraded` set.
    #[tracing::instrument(skip_all, fields(user_id = %user.id, history = history.len()))]
    pub async fn reply(&self, user: &UserProfile, history: &[ChatTurn], message: &str) -> ChatReply {
        match self.try_reply(user, history, message).await {
            Ok(reply) => {
                metrics::counter!("assistant_replies_total", "status" => "complete").increment(1);
                reply
            },
            Err(e) => {
                tracing::warn!(error = %e, "Assistant reply degraded");
                metrics::counter!("assistant_replies_total", "status" => "degraded").increment(1);
                ChatReply {
                    content: fallback_reply(user, message),
                    evidence: Vec::new(),
                    degraded: true,
                }
            },
        }
    }

    async fn try_reply(
        &self,
        user: &UserProfile,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<ChatReply> {
        let context = if self.offline {
            Vec::new()
        } else {
            with_timeout(
                "evidence_search",
                self.timeouts.get(OperationType::Evidence),
                self.evidence.similarity_search(message, CONTEXT_DOCS),
            )
            .await?
        };

        let prompt = chat_prompt(user, history, &context, message);
        let content = with_timeout(
            "text_generation",
            self.timeouts.get(OperationType::TextGeneration),
            self.generator.complete_with_system(SYSTEM_PROMPT, &prompt),
        )
        .await?;

        let evidence = context.iter().take(REPLY_SNIPPETS).map(snippet).collect();
        Ok(ChatReply {
            content,
            evidence,
            degraded: false,
        })
    }
}

fn snippet(hit: &EvidenceHit) -> EvidenceSnippet {
    let excerpt: String = hit.content.chars().take(SNIPPET_CHARS).collect();
    EvidenceSnippet {
        source: hit.source.clone(),
        snippet: format!("{excerpt}..."),
    }
}

fn fallback_reply(user: &UserProfile, message: &str) -> String {
    let city = user.city.as_deref().unwrap_or("your area");
    format!(
        "I understand your question about \"{message}\". While I'm experiencing some technical difficulties accessing my full knowledge base, I recommend: 1) Check current weather conditions in {city}, 2) Follow general health safety guidelines, 3) Consult a healthcare provider if you have specific health concerns. Stay safe!"
    )
}

fn chat_prompt(
    user: &UserProfile,
    history: &[ChatTurn],
    context: &[EvidenceHit],
    message: &str,
) -> String {
    let recent = &history[history.len().saturating_sub(HISTORY_TURNS)..];
    let conversation = recent
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.content))
        .collect::<Vec<_>>()
        .join("\n");

    let mut relevant = String::new();
    if !context.is_empty() {
        relevant.push_str("Relevant Information:");
        for (i, hit) in context.iter().enumerate() {
            let _ = write!(relevant, "\n{}. {}", i + 1, hit.content);
        }
    }

    format!(
        "You are a helpful Climate-Health AI Assistant. Provide accurate, evidence-based health advice related to climate and environmental factors.

User Context:
- Location: {location}
- Age: {age}
- Health Conditions: {conditions}

Recent Conversation:
{conversation}

{relevant}

User Question: {message}

Guidelines:
1. Provide clear, actionable advice
2. Be safety-first: if serious symptoms, recommend consulting a doctor
3. Cite evidence when available
4. Keep response concise (3-4 sentences)
5. Be empathetic and reassuring

Response:",
        location = user.city.as_deref().unwrap_or("Not specified"),
        age = user.health.age_summary(),
        conditions = user.health.conditions_summary(),
    )
}
