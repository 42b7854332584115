use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::command::NormalizedPayload;

/// Per-event token used to tie together log lines for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// Body layout expected by the receiving API. Fixed per deployment.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// `{"name"}`
    Minimal,
    /// `{"name", "audience"}`
    Audience,
    /// `{"name", "audience", "bot": true}`
    Bot,
    /// `{"title", "requester"}`
    #[default]
    Requester,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Minimal => write!(f, "minimal"),
            SchemaKind::Audience => write!(f, "audience"),
            SchemaKind::Bot => write!(f, "bot"),
            SchemaKind::Requester => write!(f, "requester"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MinimalBody {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AudienceBody {
    pub name: String,
    pub audience: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BotBody {
    pub name: String,
    pub audience: String,
    pub bot: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequesterBody {
    pub title: String,
    pub requester: String,
}

/// Wire body sent to the API; serializes as the inner struct only.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum OutboundRequest {
    Minimal(MinimalBody),
    Audience(AudienceBody),
    Bot(BotBody),
    Requester(RequesterBody),
}

pub fn build(payload: &NormalizedPayload, sender: &str, schema: SchemaKind) -> OutboundRequest {
    let name = payload.as_str().to_string();
    match schema {
        SchemaKind::Minimal => OutboundRequest::Minimal(MinimalBody { name }),
        SchemaKind::Audience => OutboundRequest::Audience(AudienceBody {
            name,
            audience: sender.to_string(),
        }),
        SchemaKind::Bot => OutboundRequest::Bot(BotBody {
            name,
            audience: sender.to_string(),
            bot: true,
        }),
        SchemaKind::Requester => OutboundRequest::Requester(RequesterBody {
            title: name,
            requester: sender.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::normalize;
    use serde_json::{json, Value};

    fn to_value(schema: SchemaKind) -> Value {
        let payload = normalize("Song Name").unwrap();
        serde_json::to_value(build(&payload, "Alice", schema)).unwrap()
    }

    #[test]
    fn test_minimal_has_only_name() {
        assert_eq!(to_value(SchemaKind::Minimal), json!({"name": "Song Name"}));
        assert_eq!(
            serde_json::to_string(&build(
                &normalize("Song Name").unwrap(),
                "Alice",
                SchemaKind::Minimal
            ))
            .unwrap(),
            r#"{"name":"Song Name"}"#
        );
    }

    #[test]
    fn test_audience_carries_sender() {
        assert_eq!(
            to_value(SchemaKind::Audience),
            json!({"name": "Song Name", "audience": "Alice"})
        );
    }

    #[test]
    fn test_bot_flag() {
        assert_eq!(
            to_value(SchemaKind::Bot),
            json!({"name": "Song Name", "audience": "Alice", "bot": true})
        );
    }

    #[test]
    fn test_requester_schema() {
        assert_eq!(
            to_value(SchemaKind::Requester),
            json!({"title": "Song Name", "requester": "Alice"})
        );
    }

    #[test]
    fn test_schema_kind_from_config_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            schema: SchemaKind,
        }
        let w: Wrapper = toml::from_str(r#"schema = "bot""#).unwrap();
        assert_eq!(w.schema, SchemaKind::Bot);
        assert!(toml::from_str::<Wrapper>(r#"schema = "fancy""#).is_err());
    }

    #[test]
    fn test_correlation_ids_differ() {
        let a = CorrelationId::new();
        let b = CorrelationId::new();
        assert_ne!(a, b);
        let tag = a.to_string();
        assert!(tag.starts_with('[') && tag.ends_with(']'));
    }
}
