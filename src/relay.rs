use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::api::{DispatchOutcome, Dispatcher};
use crate::command::{normalize, CommandMatcher, MatchResult, NormalizedPayload};
use crate::config::{AckConfig, Config};
use crate::platform::{ChatEvent, ChatSink};
use crate::request::{self, CorrelationId, SchemaKind};

/// How far a single chat event got through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// No command marker.
    Ignored,
    /// Marker present but nothing after it.
    EmptyPayload,
    Dispatched(DispatchOutcome),
}

/// Turns chat commands into API requests and acknowledges accepted ones.
///
/// Holds only read-only state, so one instance is shared by every
/// concurrently handled event.
pub struct Relay {
    matcher: CommandMatcher,
    dispatcher: Dispatcher,
    schema: SchemaKind,
    ack: AckConfig,
    sink: Arc<dyn ChatSink>,
}

impl Relay {
    pub fn new(config: &Config, sink: Arc<dyn ChatSink>) -> Result<Self> {
        Ok(Self {
            matcher: CommandMatcher::new(&config.command.markers)?,
            dispatcher: Dispatcher::new(
                config.api.endpoint(),
                config.api.api_key().map(str::to_string),
            ),
            schema: config.api.schema,
            ack: config.ack.clone(),
            sink,
        })
    }

    /// Run one event through match, normalize, build, dispatch and ack.
    ///
    /// Returns `Err` only when the request body cannot be encoded.
    pub async fn handle(&self, event: &ChatEvent) -> Result<EventOutcome> {
        let raw = match self.matcher.matches(&event.text) {
            MatchResult::Matched(raw) => raw,
            MatchResult::NoMatch => return Ok(EventOutcome::Ignored),
        };

        let rid = CorrelationId::new();
        info!("{} captured: {}", rid, raw.trim());

        let Some(payload) = normalize(&raw) else {
            info!("{} empty title from {}", rid, event.sender);
            return Ok(EventOutcome::EmptyPayload);
        };

        let body = request::build(&payload, &event.sender, self.schema);
        let outcome = self.dispatcher.dispatch(&body, &rid).await?;

        match &outcome {
            DispatchOutcome::Success(status) => {
                info!(
                    "{} {} added to list for user {} ({})",
                    rid, payload, event.sender, status
                );
            }
            DispatchOutcome::RejectedStatus(status) => {
                warn!(
                    "{} failed to add {} for user {}: API returned {}",
                    rid, payload, event.sender, status
                );
            }
            DispatchOutcome::TransportFailure(e) => {
                warn!(
                    "{} failed to add {} for user {}: {}",
                    rid, payload, event.sender, e
                );
            }
        }

        self.notify(&rid, &outcome, &event.sender, &payload, &event.channel)
            .await;

        Ok(EventOutcome::Dispatched(outcome))
    }

    /// Post the acknowledgement for a successful dispatch. Failures stay
    /// out of chat, and send errors are only logged.
    async fn notify(
        &self,
        rid: &CorrelationId,
        outcome: &DispatchOutcome,
        sender: &str,
        payload: &NormalizedPayload,
        channel: &str,
    ) {
        if !outcome.is_success() || !self.ack.enabled {
            return;
        }

        let text = render_ack(&self.ack.template, sender, payload.as_str());
        if let Err(e) = self.sink.say(channel, &text).await {
            warn!("{} failed to send acknowledgement to {}: {:#}", rid, channel, e);
        }
    }
}

pub fn render_ack(template: &str, user: &str, item: &str) -> String {
    template.replace("{user}", user).replace("{item}", item)
}
