//! The bounded tool-calling loop.
//!
//! `TurnRunner` alternates model calls and parallel tool execution until the
//! model answers in plain text or the iteration cap is hit. Tool calls fan
//! out through a `JoinSet` with settle-all semantics: every call gets an
//! outcome (success, typed failure, timeout, or cancellation) and results are
//! re-associated by call id in request order before going back to the model.
//!
//! When the cap is reached the runner makes one more call with tools
//! withheld; if the model still will not answer, a reply is synthesized from
//! the gathered results. A turn therefore never ends silent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use patter_types::config::ModelConfig;
use patter_types::conversation::{ToolCallRecord, ToolFailureKind, ToolOutcome};
use patter_types::error::{ToolError, TurnError};
use patter_types::event::TurnEvent;
use patter_types::llm::{
    CompletionRequest, CompletionResponse, ModelMessage, ToolCallRequest, ToolChoice, Usage,
};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::event::bus::EventBus;
use crate::llm::boxed::BoxModelClient;
use crate::retry::RetryPolicy;
use crate::tool::executor::ToolExecutor;

use super::context::TurnContext;
use super::fallback;

/// What one loop run produced.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The reply text; never empty.
    pub final_text: String,
    /// Every tool call executed across all iterations, in execution order.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Iterations started (model calls made inside the loop).
    pub iterations_used: u32,
    /// The iteration cap forced finalization.
    pub capped: bool,
    /// Cancellation stopped the loop before the model finished.
    pub aborted: bool,
    /// Token usage accumulated across all model calls.
    pub usage: Usage,
}

/// Drives the reasoning loop for one turn.
pub struct TurnRunner {
    model: BoxModelClient,
    executor: Arc<ToolExecutor>,
    config: ModelConfig,
    bus: EventBus,
}

impl TurnRunner {
    pub fn new(
        model: BoxModelClient,
        executor: Arc<ToolExecutor>,
        config: ModelConfig,
        bus: EventBus,
    ) -> Self {
        Self {
            model,
            executor,
            config,
            bus,
        }
    }

    /// Run the loop to completion for one turn.
    ///
    /// Only model failures that survive the retry budget are errors here;
    /// tool failures, the iteration cap, and cancellation all degrade into
    /// the reply instead.
    pub async fn run(
        &self,
        mut context: TurnContext,
        turn_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, TurnError> {
        let start = Instant::now();
        let max_iterations = context.tenant.ai_limits.max_iterations;
        let mut gathered: Vec<ToolCallRecord> = Vec::new();
        let mut usage = Usage::default();
        let mut iterations_used = 0u32;
        let mut final_text: Option<String> = None;
        let mut aborted = false;

        for iteration in 1..=max_iterations {
            if cancel.is_cancelled() {
                aborted = true;
                break;
            }
            iterations_used = iteration;
            let iteration_start = Instant::now();
            self.bus
                .publish(TurnEvent::IterationStarted { turn_id, iteration });

            let request = self.build_request(&context, ToolChoice::Auto);
            let response = tokio::select! {
                _ = cancel.cancelled() => {
                    aborted = true;
                    break;
                }
                result = self.call_model(turn_id, &request) => result?,
            };
            usage.add(response.usage);

            if !response.wants_tools() {
                self.bus.publish(TurnEvent::IterationCompleted {
                    turn_id,
                    iteration,
                    tool_calls_requested: 0,
                    duration_ms: iteration_start.elapsed().as_millis() as u64,
                });
                final_text = Some(response.content);
                break;
            }

            let calls = response.tool_calls.clone();
            context
                .messages
                .push(ModelMessage::assistant_with_tools(response.content, calls.clone()));

            let records = self.execute_tools(turn_id, &context, &calls, cancel).await;
            for record in &records {
                context.messages.push(ModelMessage::tool_result(
                    record.id.clone(),
                    record.outcome.as_model_content(),
                ));
            }
            gathered.extend(records);

            self.bus.publish(TurnEvent::IterationCompleted {
                turn_id,
                iteration,
                tool_calls_requested: calls.len(),
                duration_ms: iteration_start.elapsed().as_millis() as u64,
            });
        }

        let capped = final_text.is_none() && !aborted;
        if capped {
            info!(%turn_id, iterations = max_iterations, "iteration cap reached, forcing a final answer");
            let request = self.build_request(&context, ToolChoice::None);
            match self.call_model(turn_id, &request).await {
                Ok(response) => {
                    usage.add(response.usage);
                    if !response.wants_tools() && !response.content.trim().is_empty() {
                        final_text = Some(response.content);
                    }
                }
                Err(err) => {
                    warn!(%turn_id, error = %err, "forced final call failed, synthesizing a reply");
                }
            }
        }

        let final_text = final_text.unwrap_or_else(|| fallback::synthesize_reply(&gathered));

        let duration_ms = start.elapsed().as_millis() as u64;
        self.bus.publish(TurnEvent::TurnFinalized {
            turn_id,
            iterations_used,
            capped,
            aborted,
            duration_ms,
        });
        info!(%turn_id, iterations_used, capped, aborted, duration_ms, "turn finalized");

        Ok(TurnOutcome {
            final_text,
            tool_calls: gathered,
            iterations_used,
            capped,
            aborted,
            usage,
        })
    }

    /// One model call with bounded retry on transient failures.
    async fn call_model(
        &self,
        turn_id: Uuid,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, TurnError> {
        let retry = RetryPolicy::exponential(self.config.max_retries, self.config.retry_backoff_ms);
        let mut attempt = 1u32;
        loop {
            let span = info_span!(
                "gen_ai.complete",
                gen_ai.system = self.model.name(),
                gen_ai.request.model = %request.model,
                gen_ai.request.max_tokens = request.max_tokens,
            );
            match self.model.complete(request).instrument(span).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() && retry.should_retry(attempt) => {
                    warn!(%turn_id, attempt, error = %err, "transient model failure, retrying");
                    self.bus.publish(TurnEvent::ModelRetried {
                        turn_id,
                        attempt,
                        error: err.to_string(),
                    });
                    tokio::time::sleep(retry.delay_after(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Fan out one iteration's tool calls and settle every outcome.
    ///
    /// Each call runs under the tenant's per-tool timeout; a slow or failing
    /// call never blocks or cancels its siblings. Results come back in
    /// request order regardless of completion order, and a panicked task is
    /// recorded as an execution failure for its call.
    async fn execute_tools(
        &self,
        turn_id: Uuid,
        context: &TurnContext,
        calls: &[ToolCallRequest],
        cancel: &CancellationToken,
    ) -> Vec<ToolCallRecord> {
        let timeout_ms = context.tenant.ai_limits.tool_timeout_ms;
        let deadline = Duration::from_millis(timeout_ms);
        let mut set: JoinSet<(String, ToolOutcome, u64)> = JoinSet::new();

        for call in calls {
            let executor = self.executor.clone();
            let tenant = context.tenant.clone();
            let registry = context.registry.clone();
            let call = call.clone();
            let cancel = cancel.clone();
            set.spawn(async move {
                let call_start = Instant::now();
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => ToolOutcome::from(ToolError::Cancelled),
                    result = tokio::time::timeout(deadline, executor.execute(&tenant, &registry, &call)) => {
                        match result {
                            Ok(Ok(value)) => ToolOutcome::success(value),
                            Ok(Err(err)) => ToolOutcome::from(err),
                            Err(_) => ToolOutcome::from(ToolError::Timeout {
                                name: call.name.clone(),
                                timeout_ms,
                            }),
                        }
                    }
                };
                (call.id.clone(), outcome, call_start.elapsed().as_millis() as u64)
            });
        }

        let mut by_id: HashMap<String, (ToolOutcome, u64)> = HashMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((id, outcome, duration_ms)) => {
                    by_id.insert(id, (outcome, duration_ms));
                }
                Err(join_error) => {
                    warn!(%turn_id, error = %join_error, "tool task panicked");
                }
            }
        }

        calls
            .iter()
            .map(|call| {
                let (outcome, duration_ms) = by_id.remove(&call.id).unwrap_or_else(|| {
                    (
                        ToolOutcome::Failure {
                            kind: ToolFailureKind::Execution,
                            message: "tool task panicked".to_string(),
                        },
                        0,
                    )
                });
                match &outcome {
                    ToolOutcome::Success { .. } => self.bus.publish(TurnEvent::ToolCompleted {
                        turn_id,
                        call_id: call.id.clone(),
                        tool: call.name.clone(),
                        duration_ms,
                    }),
                    ToolOutcome::Failure { message, .. } => self.bus.publish(TurnEvent::ToolFailed {
                        turn_id,
                        call_id: call.id.clone(),
                        tool: call.name.clone(),
                        error: message.clone(),
                        duration_ms,
                    }),
                }
                ToolCallRecord {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    outcome,
                    duration_ms,
                }
            })
            .collect()
    }

    fn build_request(&self, context: &TurnContext, tool_choice: ToolChoice) -> CompletionRequest {
        let tools = match tool_choice {
            ToolChoice::None => Vec::new(),
            ToolChoice::Auto | ToolChoice::Required => context.registry.definitions(),
        };
        CompletionRequest {
            model: self.config.model.clone(),
            messages: context.messages.clone(),
            system: Some(context.system.clone()),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            tools,
            tool_choice,
        }
    }
}
