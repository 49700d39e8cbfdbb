//! Turn service orchestrating one conversation turn end to end.
//!
//! `TurnService` loads the tenant and conversation, resolves references
//! against the conversation memory, runs the reasoning loop, folds the
//! finished turn back into the metadata, and saves. Generic over
//! `ConversationStore` and `TenantConfigSource` so patter-core never
//! depends on patter-infra.

use std::sync::Arc;
use std::time::Duration;

use patter_types::conversation::{Conversation, Message};
use patter_types::error::{StoreError, TurnError};
use patter_types::event::TurnEvent;
use patter_types::llm::Usage;
use patter_types::tenant::TenantConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::event::bus::EventBus;
use crate::memory::manager::MetadataManager;
use crate::search::domain::normalize_domain;
use crate::store::{ConversationStore, TenantConfigSource};
use crate::tool::registry::ToolRegistry;

use super::context::TurnContext;
use super::runner::{TurnOutcome, TurnRunner};

/// Canned reply for the worst case: the model itself is unreachable.
const DEGRADED_REPLY: &str =
    "I'm having trouble right now. Please try again in a moment.";

/// Reply handed back to the transport layer for one user turn.
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub conversation_id: Uuid,
    pub message: String,
    pub iterations_used: u32,
    pub capped: bool,
    pub aborted: bool,
    /// The model was unreachable and the reply is canned.
    pub degraded: bool,
}

/// Orchestrates the full lifecycle of a conversation turn.
pub struct TurnService<S: ConversationStore, T: TenantConfigSource> {
    store: S,
    tenants: T,
    runner: Arc<TurnRunner>,
    bus: EventBus,
}

impl<S: ConversationStore, T: TenantConfigSource> TurnService<S, T> {
    pub fn new(store: S, tenants: T, runner: Arc<TurnRunner>, bus: EventBus) -> Self {
        Self {
            store,
            tenants,
            runner,
            bus,
        }
    }

    /// Process one user turn for a tenant domain.
    ///
    /// `conversation_id = None` starts a new conversation. A model outage
    /// degrades into a canned reply rather than an error; the turn is still
    /// recorded so the conversation stays consistent.
    pub async fn handle_turn(
        &self,
        domain: &str,
        conversation_id: Option<Uuid>,
        user_text: &str,
    ) -> Result<TurnReply, TurnError> {
        let domain = normalize_domain(domain);
        let tenant = match self.tenants.load(&domain).await? {
            Some(tenant) => tenant,
            None => {
                warn!(domain = %domain, "no tenant config for domain, using defaults");
                TenantConfig::new(&domain)
            }
        };

        let mut conversation = match conversation_id {
            Some(id) => self.store.load(&id).await?.ok_or(StoreError::NotFound)?,
            None => Conversation::new(&domain),
        };

        // Resolve referring phrases against the memory as it stood before
        // this turn; the model sees the resolution as an annotation while
        // the stored message keeps the user's raw words.
        let resolved = MetadataManager::resolve_reference(&conversation.metadata, user_text);

        conversation.push_message(Message::user(user_text));

        let registry = ToolRegistry::for_tenant(&tenant);
        let mut context = TurnContext::build(&tenant, registry, &conversation);
        if let Some(resolved) = &resolved {
            context.annotate_last_user(&format!(
                "the user is referring to: {} ({})",
                resolved.entity.label, resolved.entity.value
            ));
            MetadataManager::note_reference(&mut conversation.metadata, resolved);
        }

        let turn_id = Uuid::now_v7();
        self.bus.publish(TurnEvent::TurnStarted {
            turn_id,
            conversation_id: conversation.id,
            domain: domain.clone(),
        });

        let cancel = CancellationToken::new();
        let watchdog = tenant.ai_limits.turn_budget_ms.map(|budget_ms| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(budget_ms)).await;
                warn!(budget_ms, "turn budget expired, aborting the loop");
                cancel.cancel();
            })
        });

        let run_result = self.runner.run(context, turn_id, &cancel).await;
        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }
        let (outcome, degraded) = match run_result {
            Ok(outcome) => (outcome, false),
            Err(TurnError::Model(err)) => {
                warn!(%turn_id, error = %err, "model unavailable, replying degraded");
                let outcome = TurnOutcome {
                    final_text: DEGRADED_REPLY.to_string(),
                    tool_calls: Vec::new(),
                    iterations_used: 0,
                    capped: false,
                    aborted: false,
                    usage: Usage::default(),
                };
                (outcome, true)
            }
            Err(err) => return Err(err),
        };

        MetadataManager::absorb_turn(&mut conversation.metadata, user_text, &outcome.tool_calls);
        conversation.push_message(Message::assistant_with_tools(
            outcome.final_text.clone(),
            outcome.tool_calls,
        ));
        self.store.save(&conversation).await?;

        info!(
            %turn_id,
            conversation_id = %conversation.id,
            iterations = outcome.iterations_used,
            capped = outcome.capped,
            aborted = outcome.aborted,
            degraded,
            "turn handled"
        );

        Ok(TurnReply {
            conversation_id: conversation.id,
            message: outcome.final_text,
            iterations_used: outcome.iterations_used,
            capped: outcome.capped,
            aborted: outcome.aborted,
            degraded,
        })
    }
}
