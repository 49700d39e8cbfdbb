//! Model-facing context for one turn.
//!
//! `TurnContext` snapshots everything the runner sends to the model: the
//! system prompt (store facts + conversation memory digest + grounding
//! instructions, in XML-tagged sections) and a bounded window of recent
//! messages. The runner appends assistant/tool messages to it as the loop
//! progresses.

use patter_types::conversation::Conversation;
use patter_types::llm::{MessageRole, ModelMessage};
use patter_types::metadata::ConversationMetadata;
use patter_types::tenant::TenantConfig;

use crate::tool::registry::ToolRegistry;

/// How many recent conversation messages are replayed to the model.
const HISTORY_WINDOW: usize = 20;

/// Everything the reasoning loop needs for one turn.
pub struct TurnContext {
    pub tenant: TenantConfig,
    pub registry: ToolRegistry,
    /// Assembled system prompt for this turn.
    pub system: String,
    /// Model-facing message window, oldest first.
    pub messages: Vec<ModelMessage>,
}

impl TurnContext {
    /// Build the context from a conversation snapshot.
    ///
    /// Past turns are replayed as plain user/assistant text; their tool
    /// transcripts are not resent, the stored assistant reply already
    /// carries what they produced.
    pub fn build(tenant: &TenantConfig, registry: ToolRegistry, conversation: &Conversation) -> Self {
        let start = conversation.messages.len().saturating_sub(HISTORY_WINDOW);
        let messages = conversation.messages[start..]
            .iter()
            .filter_map(|message| match message.role {
                MessageRole::User => Some(ModelMessage::user(message.content.clone())),
                MessageRole::Assistant => Some(ModelMessage::assistant(message.content.clone())),
                MessageRole::System | MessageRole::Tool => None,
            })
            .collect();

        Self {
            tenant: tenant.clone(),
            registry,
            system: build_system_prompt(tenant, &conversation.metadata),
            messages,
        }
    }

    /// Append a note to the latest user message in the window.
    ///
    /// Only the model-facing copy changes; the persisted message keeps the
    /// user's raw text.
    pub fn annotate_last_user(&mut self, note: &str) {
        if let Some(message) = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.role == MessageRole::User)
        {
            message.content.push_str("\n[");
            message.content.push_str(note);
            message.content.push(']');
        }
    }
}

/// Assemble the system prompt from XML-tagged sections.
fn build_system_prompt(tenant: &TenantConfig, metadata: &ConversationMetadata) -> String {
    let mut sections = Vec::with_capacity(3);

    let platform = if tenant.integrations.woocommerce.is_some() {
        "woocommerce"
    } else if tenant.integrations.shopify.is_some() {
        "shopify"
    } else {
        "none configured"
    };
    let order_lookup = if tenant.order_lookup_configured() {
        "available"
    } else {
        "not available"
    };
    sections.push(format!(
        "<store>\nDomain: {}\nCommerce platform: {platform}\nOrder lookup: {order_lookup}\n</store>",
        tenant.domain
    ));

    if let Some(digest) = memory_digest(metadata) {
        sections.push(format!(
            "<conversation_memory>\n{digest}\n</conversation_memory>"
        ));
    }

    sections.push(format!(
        "<instructions>\n\
        You are the shopping assistant for {}.\n\
        Answer from tool results gathered in this conversation; never invent \
        products, prices, or stock levels.\n\
        If a search reports an infrastructure problem (provider_unavailable or \
        domain_lookup_failed), say you could not check the catalog right now. \
        Never claim an item does not exist unless a search genuinely returned \
        no matches.\n\
        When the user refers to a numbered option, count from 1 on the most \
        recent list shown.\n\
        Keep replies short and concrete; include prices and links when the \
        tool results carry them.\n\
        </instructions>",
        tenant.domain
    ));

    sections.join("\n\n")
}

/// Render the metadata into prompt lines, or None when there is nothing
/// worth telling the model.
fn memory_digest(metadata: &ConversationMetadata) -> Option<String> {
    let mut lines = Vec::new();

    if !metadata.summary.is_empty() {
        lines.push(format!("Summary: {}", metadata.summary));
    }

    let recent: Vec<String> = metadata
        .entities
        .iter()
        .filter_map(|(kind, mentions)| mentions.last().map(|e| format!("- {kind}: {}", e.label)))
        .collect();
    if !recent.is_empty() {
        lines.push("Recently discussed:".to_string());
        lines.extend(recent);
    }

    if let Some(list) = &metadata.last_list {
        lines.push("Last list shown (positions are 1-based):".to_string());
        for (i, item) in list.items.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, item.label));
        }
    }

    let corrections: Vec<String> = metadata
        .corrections
        .iter()
        .rev()
        .take(3)
        .rev()
        .map(|c| format!("the user said \"{}\", not \"{}\"", c.to, c.from))
        .collect();
    if !corrections.is_empty() {
        lines.push(format!("Corrections: {}", corrections.join("; ")));
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
