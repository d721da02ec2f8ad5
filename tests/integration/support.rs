//! Recording adapters shared by the integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use vk_tg_bridge::services::bridge::adapters::{ControlChannel, SourcePlatform};
use vk_tg_bridge::services::bridge::{BridgeError, ControlEvent, Keyboard, SourceEvent};
use vk_tg_bridge_core::Conversation;

/// One message the bridge put into the control chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message {
        id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Replied {
        id: i64,
        reply_to: i64,
        text: String,
    },
    Edited {
        id: i64,
        text: String,
        keyboard: Keyboard,
    },
    Pinned {
        id: i64,
    },
}

pub struct RecordingControl {
    pub sent: Mutex<Vec<Sent>>,
    pub events: Mutex<Option<mpsc::Sender<ControlEvent>>>,
    next_id: AtomicI64,
}

impl RecordingControl {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            events: Mutex::new(None),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message { text, .. } | Sent::Replied { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Deliver an event as if typed or pressed in the control chat.
    pub async fn emit(&self, event: ControlEvent) {
        let tx = self
            .events
            .lock()
            .unwrap()
            .clone()
            .expect("control channel not started");
        tx.send(event).await.expect("dispatch loop gone");
    }

    fn push_message(&self, text: &str, keyboard: Option<Keyboard>) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(Sent::Message {
            id,
            text: text.to_string(),
            keyboard,
        });
        id
    }
}

#[async_trait]
impl ControlChannel for RecordingControl {
    async fn start(&self, event_tx: mpsc::Sender<ControlEvent>) -> Result<(), BridgeError> {
        *self.events.lock().unwrap() = Some(event_tx);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BridgeError> {
        self.events.lock().unwrap().take();
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<i64, BridgeError> {
        Ok(self.push_message(text, None))
    }

    async fn reply_text(&self, reply_to: i64, text: &str) -> Result<i64, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(Sent::Replied {
            id,
            reply_to,
            text: text.to_string(),
        });
        Ok(id)
    }

    async fn send_keyboard(&self, text: &str, keyboard: &Keyboard) -> Result<i64, BridgeError> {
        Ok(self.push_message(text, Some(keyboard.clone())))
    }

    async fn edit_keyboard(
        &self,
        message_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), BridgeError> {
        self.sent.lock().unwrap().push(Sent::Edited {
            id: message_id,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(())
    }

    async fn pin_message(&self, message_id: i64) -> Result<(), BridgeError> {
        self.sent.lock().unwrap().push(Sent::Pinned { id: message_id });
        Ok(())
    }

    async fn health_check(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

pub struct ScriptedSource {
    pub conversations: Vec<Conversation>,
    pub batches: Mutex<VecDeque<Vec<SourceEvent>>>,
    pub delivered: Mutex<Vec<(i64, String)>>,
}

impl ScriptedSource {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self {
            conversations,
            batches: Mutex::new(VecDeque::new()),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn queue(&self, batch: Vec<SourceEvent>) {
        self.batches.lock().unwrap().push_back(batch);
    }

    pub fn delivered(&self) -> Vec<(i64, String)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourcePlatform for ScriptedSource {
    async fn poll_events(&self) -> Result<Vec<SourceEvent>, BridgeError> {
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => Ok(batch),
            None => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(&self, peer_id: i64, text: &str) -> Result<(), BridgeError> {
        self.delivered
            .lock()
            .unwrap()
            .push((peer_id, text.to_string()));
        Ok(())
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, BridgeError> {
        Ok(self.conversations.clone())
    }
}

/// Poll `check` until it holds or a second has passed.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
