//! Session Router
//!
//! Holds the single active conversation binding and the reply-continuation
//! state. Shared as `Arc<SessionRouter>` between the control dispatch loop
//! and the inbound relay task.

use super::response_mapper::ResponseMapper;
use serde::Serialize;
use tokio::sync::RwLock;
use vk_tg_bridge_core::fallback_name;

/// The conversation outbound text is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveConversation {
    pub id: i64,
    pub name: String,
}

/// Session state. At most one active conversation at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub active_conversation: Option<ActiveConversation>,
    /// Set after an inbound relay, cleared once the operator replies
    pub awaiting_reply: bool,
    /// Peer of the most recent inbound relay
    pub last_relayed: Option<i64>,
}

/// Confirmation produced by a new binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationNotice {
    pub text: String,
    /// Whether the confirmation message should be pinned
    pub pin: bool,
}

/// Owner of the [`Session`].
///
/// Lock guards never escape a method, so no guard is ever held across
/// platform I/O.
#[derive(Debug, Default)]
pub struct SessionRouter {
    pub(crate) session: RwLock<Session>,
}

impl SessionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `conversation_id` as the active destination, replacing any
    /// previous binding. `awaiting_reply` is left as is.
    pub async fn set_active(&self, conversation_id: i64, name: &str) -> ActivationNotice {
        let name = if name.trim().is_empty() {
            fallback_name(conversation_id)
        } else {
            name.to_string()
        };

        let text = ResponseMapper::format_now_talking(&name);
        {
            let mut session = self.session.write().await;
            session.active_conversation = Some(ActiveConversation {
                id: conversation_id,
                name,
            });
        }

        tracing::info!(conversation_id, "active conversation changed");
        ActivationNotice { text, pin: true }
    }

    /// Current destination peer, if any.
    pub async fn active_destination(&self) -> Option<i64> {
        self.session
            .read()
            .await
            .active_conversation
            .as_ref()
            .map(|active| active.id)
    }

    pub async fn active_conversation(&self) -> Option<ActiveConversation> {
        self.session.read().await.active_conversation.clone()
    }

    /// Operator-facing description of the binding.
    pub async fn describe_active(&self) -> String {
        ResponseMapper::describe(self.active_conversation().await.as_ref())
    }

    pub async fn awaiting_reply(&self) -> bool {
        self.session.read().await.awaiting_reply
    }

    pub async fn clear_awaiting_reply(&self) {
        self.session.write().await.awaiting_reply = false;
    }

    /// Whether a relay from `peer_id` would continue an unanswered run.
    /// Does not change the session.
    pub async fn is_continuation(&self, peer_id: i64) -> bool {
        let session = self.session.read().await;
        session.awaiting_reply && session.last_relayed == Some(peer_id)
    }

    /// Record an inbound relay from `peer_id` the operator has been shown.
    ///
    /// Returns true when the relay continues an unanswered run from the same
    /// peer, in which case the header and reply button can be omitted.
    pub async fn mark_relayed(&self, peer_id: i64) -> bool {
        let mut session = self.session.write().await;
        let continuation = session.awaiting_reply && session.last_relayed == Some(peer_id);
        session.awaiting_reply = true;
        session.last_relayed = Some(peer_id);
        continuation
    }

    /// Copy of the full session state.
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }
}
