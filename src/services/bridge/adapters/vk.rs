//! VK Adapter
//!
//! Source Platform implemented against the VK API with reqwest: user
//! long-poll (version 3) for incoming events, `messages.send` for outgoing
//! text and `messages.getConversations` for the conversation listing.

use super::SourcePlatform;
use crate::services::bridge::types::{BridgeError, SourceEvent, SourceMessage, VkAdapterConfig};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use vk_tg_bridge_core::{Conversation, ConversationKind};

/// Long-poll event code for a new message.
const EVENT_NEW_MESSAGE: i64 = 4;

/// Message flag set on messages sent by the account itself.
const FLAG_OUTBOX: i64 = 2;

/// Conversations fetched per listing (API maximum).
const CONVERSATION_PAGE: u32 = 200;

/// Long-poll server coordinates from `messages.getLongPollServer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LongPollServer {
    pub server: String,
    pub key: String,
    pub ts: i64,
}

impl LongPollServer {
    pub(crate) fn from_value(value: &Value) -> Result<Self, BridgeError> {
        let server = value
            .get("server")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::Parse("long-poll server missing 'server'".to_string()))?;
        let key = value
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::Parse("long-poll server missing 'key'".to_string()))?;
        let ts = value
            .get("ts")
            .and_then(value_as_i64)
            .ok_or_else(|| BridgeError::Parse("long-poll server missing 'ts'".to_string()))?;
        Ok(Self {
            server: server.to_string(),
            key: key.to_string(),
            ts,
        })
    }

    /// Full URL of the long-poll endpoint.
    pub(crate) fn url(&self) -> String {
        if self.server.starts_with("http://") || self.server.starts_with("https://") {
            self.server.clone()
        } else {
            format!("https://{}", self.server)
        }
    }
}

/// Result of one long-poll request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LongPollOutcome {
    Updates { ts: i64, events: Vec<SourceEvent> },
    /// History is outdated; continue from the given ts
    OutdatedTs { ts: i64 },
    /// Key expired or user info lost; a new server must be requested
    Expired,
}

/// VK user-token adapter.
pub struct VkAdapter {
    pub(crate) config: VkAdapterConfig,
    pub(crate) client: reqwest::Client,
    pub(crate) long_poll: Mutex<Option<LongPollServer>>,
}

impl VkAdapter {
    /// Create a new VK adapter.
    ///
    /// The HTTP timeout leaves room above the long-poll wait so a held
    /// request is not cut short.
    pub fn new(config: VkAdapterConfig) -> Result<Self, BridgeError> {
        if config.access_token.as_deref().map_or(true, str::is_empty) {
            return Err(BridgeError::ConfigError(
                "VK access token is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.longpoll_wait_secs + 10))
            .build()
            .map_err(|e| BridgeError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            long_poll: Mutex::new(None),
        })
    }

    /// Call a VK API method and unwrap its `response` field.
    async fn call_method<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, BridgeError> {
        let url = format!(
            "{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            method
        );

        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("access_token", self.config.access_token.clone().unwrap_or_default()));
        form.push(("v", self.config.api_version.clone()));

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| BridgeError::Transport(format!("{} request failed: {}", method, e)))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| BridgeError::Transport(format!("{} returned invalid body: {}", method, e)))?;

        parse_api_response(body)
    }

    async fn fetch_long_poll_server(&self) -> Result<LongPollServer, BridgeError> {
        let raw: Value = self
            .call_method("messages.getLongPollServer", &[("lp_version", "3".to_string())])
            .await?;
        let server = LongPollServer::from_value(&raw)?;
        tracing::debug!(ts = server.ts, "obtained VK long-poll server");
        Ok(server)
    }

    async fn current_server(&self) -> Result<LongPollServer, BridgeError> {
        if let Some(server) = self.long_poll.lock().await.clone() {
            return Ok(server);
        }
        let server = self.fetch_long_poll_server().await?;
        *self.long_poll.lock().await = Some(server.clone());
        Ok(server)
    }
}

#[async_trait]
impl SourcePlatform for VkAdapter {
    async fn poll_events(&self) -> Result<Vec<SourceEvent>, BridgeError> {
        let server = self.current_server().await?;

        let query: Vec<(&str, String)> = vec![
            ("act", "a_check".to_string()),
            ("key", server.key.clone()),
            ("ts", server.ts.to_string()),
            ("wait", self.config.longpoll_wait_secs.to_string()),
            ("mode", "2".to_string()),
            ("version", "3".to_string()),
        ];

        let response = self
            .client
            .get(server.url())
            .query(&query)
            .send()
            .await
            .map_err(|e| BridgeError::Transport(format!("long-poll request failed: {}", e)))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| BridgeError::Transport(format!("long-poll returned invalid body: {}", e)))?;

        match parse_long_poll(&body)? {
            LongPollOutcome::Updates { ts, events } => {
                if let Some(server) = self.long_poll.lock().await.as_mut() {
                    server.ts = ts;
                }
                Ok(events)
            }
            LongPollOutcome::OutdatedTs { ts } => {
                tracing::warn!(ts, "VK long-poll history outdated, skipping ahead");
                if let Some(server) = self.long_poll.lock().await.as_mut() {
                    server.ts = ts;
                }
                Ok(Vec::new())
            }
            LongPollOutcome::Expired => {
                tracing::debug!("VK long-poll key expired, requesting a new server");
                *self.long_poll.lock().await = None;
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(&self, peer_id: i64, text: &str) -> Result<(), BridgeError> {
        let params = [
            ("peer_id", peer_id.to_string()),
            ("random_id", rand::random::<i32>().to_string()),
            ("message", text.to_string()),
        ];
        let _message_id: Value = self
            .call_method("messages.send", &params)
            .await
            .map_err(|e| match e {
                BridgeError::Transport(msg) => BridgeError::SendFailed(msg),
                other => other,
            })?;
        Ok(())
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, BridgeError> {
        let params = [
            ("count", CONVERSATION_PAGE.to_string()),
            ("extended", "1".to_string()),
        ];
        let response: ConversationsResponse = self
            .call_method("messages.getConversations", &params)
            .await?;
        Ok(conversations_from_response(response))
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Unwrap a VK API envelope: `{"response": ...}` or `{"error": {...}}`.
pub(crate) fn parse_api_response<T: DeserializeOwned>(body: Value) -> Result<T, BridgeError> {
    if let Some(error) = body.get("error") {
        let code = error.get("error_code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("error_msg")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(BridgeError::Api { code, message });
    }

    let response = body
        .get("response")
        .cloned()
        .ok_or_else(|| BridgeError::Parse("missing 'response' field".to_string()))?;
    serde_json::from_value(response).map_err(|e| BridgeError::Parse(e.to_string()))
}

/// Interpret a long-poll response body.
pub(crate) fn parse_long_poll(body: &Value) -> Result<LongPollOutcome, BridgeError> {
    if let Some(failed) = body.get("failed").and_then(value_as_i64) {
        return match failed {
            1 => {
                let ts = body.get("ts").and_then(value_as_i64).ok_or_else(|| {
                    BridgeError::Parse("long-poll failure 1 without 'ts'".to_string())
                })?;
                Ok(LongPollOutcome::OutdatedTs { ts })
            }
            2 | 3 => Ok(LongPollOutcome::Expired),
            other => Err(BridgeError::Api {
                code: other,
                message: "long-poll request rejected".to_string(),
            }),
        };
    }

    let ts = body
        .get("ts")
        .and_then(value_as_i64)
        .ok_or_else(|| BridgeError::Parse("long-poll response missing 'ts'".to_string()))?;

    let mut events = Vec::new();
    if let Some(updates) = body.get("updates").and_then(Value::as_array) {
        for update in updates {
            match parse_update(update) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!("Skipping malformed long-poll update: {}", e),
            }
        }
    }

    Ok(LongPollOutcome::Updates { ts, events })
}

/// Parse one update array, e.g. `[4, message_id, flags, peer_id, ts, text, {...}]`.
pub(crate) fn parse_update(update: &Value) -> Result<SourceEvent, BridgeError> {
    let fields = update
        .as_array()
        .ok_or_else(|| BridgeError::Parse(format!("update is not an array: {}", update)))?;
    let code = fields
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| BridgeError::Parse(format!("update without event code: {}", update)))?;

    if code != EVENT_NEW_MESSAGE {
        return Ok(SourceEvent::Other { code });
    }

    let int_field = |index: usize, name: &str| {
        fields
            .get(index)
            .and_then(value_as_i64)
            .ok_or_else(|| BridgeError::Parse(format!("new message without {}: {}", name, update)))
    };

    let message_id = int_field(1, "message_id")?;
    let flags = int_field(2, "flags")?;
    let peer_id = int_field(3, "peer_id")?;
    let timestamp = fields.get(4).and_then(value_as_i64).unwrap_or(0);
    let text = fields.get(5).and_then(Value::as_str).unwrap_or_default();

    Ok(SourceEvent::NewMessage(SourceMessage {
        message_id,
        peer_id,
        text: unescape_longpoll_text(text),
        outgoing: flags & FLAG_OUTBOX != 0,
        timestamp,
    }))
}

/// Undo the HTML transport encoding long-poll applies to message text.
pub(crate) fn unescape_longpoll_text(text: &str) -> String {
    text.replace("<br>", "\n")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Accept integers encoded as numbers or numeric strings.
fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationsResponse {
    #[serde(default)]
    items: Vec<ConversationItem>,
    #[serde(default)]
    profiles: Vec<Profile>,
    #[serde(default)]
    groups: Vec<Group>,
}

#[derive(Debug, Deserialize)]
struct ConversationItem {
    conversation: ConversationInfo,
}

#[derive(Debug, Deserialize)]
struct ConversationInfo {
    peer: Peer,
    #[serde(default)]
    chat_settings: Option<ChatSettings>,
}

#[derive(Debug, Deserialize)]
struct Peer {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ChatSettings {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    id: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[derive(Debug, Deserialize)]
struct Group {
    id: i64,
    #[serde(default)]
    name: String,
}

/// Build conversations, resolving names from the extended profile data.
pub(crate) fn conversations_from_response(response: ConversationsResponse) -> Vec<Conversation> {
    let profiles: HashMap<i64, String> = response
        .profiles
        .into_iter()
        .map(|p| (p.id, format!("{} {}", p.first_name, p.last_name).trim().to_string()))
        .collect();
    let groups: HashMap<i64, String> = response
        .groups
        .into_iter()
        .map(|g| (g.id, g.name))
        .collect();

    response
        .items
        .into_iter()
        .map(|item| {
            let peer = item.conversation.peer;
            let (kind, name) = match peer.kind.as_str() {
                "chat" => (
                    ConversationKind::Group,
                    item.conversation.chat_settings.and_then(|s| s.title),
                ),
                // Community peers are negative group ids
                "group" => (ConversationKind::Channel, groups.get(&-peer.id).cloned()),
                _ => (ConversationKind::Direct, profiles.get(&peer.id).cloned()),
            };
            Conversation::new(peer.id, name.filter(|n| !n.is_empty()), kind)
        })
        .collect()
}
