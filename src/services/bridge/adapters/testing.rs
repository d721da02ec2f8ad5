//! In-memory adapters recording every call, for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use vk_tg_bridge_core::Conversation;

use super::{ControlChannel, SourcePlatform};
use crate::services::bridge::types::{BridgeError, ControlEvent, Keyboard, SourceEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ControlCall {
    Text {
        message_id: i64,
        text: String,
    },
    Reply {
        message_id: i64,
        reply_to: i64,
        text: String,
    },
    Keyboard {
        message_id: i64,
        text: String,
        keyboard: Keyboard,
    },
    Edit {
        message_id: i64,
        text: String,
        keyboard: Keyboard,
    },
    Pin {
        message_id: i64,
    },
}

pub(crate) struct MockControl {
    pub calls: Mutex<Vec<ControlCall>>,
    pub event_tx: Mutex<Option<mpsc::Sender<ControlEvent>>>,
    pub fail_sends: AtomicBool,
    pub starts: AtomicUsize,
    next_id: AtomicI64,
}

impl MockControl {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            event_tx: Mutex::new(None),
            fail_sends: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            next_id: AtomicI64::new(1000),
        }
    }

    pub fn calls(&self) -> Vec<ControlCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ControlCall::Text { text, .. }
                | ControlCall::Reply { text, .. }
                | ControlCall::Keyboard { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record_send(&self, build: impl FnOnce(i64) -> ControlCall) -> Result<i64, BridgeError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BridgeError::SendFailed("mock send failure".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(build(id));
        Ok(id)
    }
}

#[async_trait]
impl ControlChannel for MockControl {
    async fn start(&self, event_tx: mpsc::Sender<ControlEvent>) -> Result<(), BridgeError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.event_tx.lock().unwrap() = Some(event_tx);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BridgeError> {
        self.event_tx.lock().unwrap().take();
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<i64, BridgeError> {
        self.record_send(|message_id| ControlCall::Text {
            message_id,
            text: text.to_string(),
        })
    }

    async fn reply_text(&self, reply_to: i64, text: &str) -> Result<i64, BridgeError> {
        self.record_send(|message_id| ControlCall::Reply {
            message_id,
            reply_to,
            text: text.to_string(),
        })
    }

    async fn send_keyboard(&self, text: &str, keyboard: &Keyboard) -> Result<i64, BridgeError> {
        self.record_send(|message_id| ControlCall::Keyboard {
            message_id,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        })
    }

    async fn edit_keyboard(
        &self,
        message_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), BridgeError> {
        self.calls.lock().unwrap().push(ControlCall::Edit {
            message_id,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(())
    }

    async fn pin_message(&self, message_id: i64) -> Result<(), BridgeError> {
        self.calls.lock().unwrap().push(ControlCall::Pin { message_id });
        Ok(())
    }

    async fn health_check(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

pub(crate) struct MockSource {
    pub conversations: Mutex<Vec<Conversation>>,
    pub batches: Mutex<VecDeque<Result<Vec<SourceEvent>, BridgeError>>>,
    pub sent: Mutex<Vec<(i64, String)>>,
    pub fail_listing: AtomicBool,
    pub fail_sends: AtomicBool,
}

impl MockSource {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self {
            conversations: Mutex::new(conversations),
            batches: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            fail_listing: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
        }
    }

    pub fn push_batch(&self, batch: Result<Vec<SourceEvent>, BridgeError>) {
        self.batches.lock().unwrap().push_back(batch);
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourcePlatform for MockSource {
    async fn poll_events(&self) -> Result<Vec<SourceEvent>, BridgeError> {
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(&self, peer_id: i64, text: &str) -> Result<(), BridgeError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BridgeError::Transport("mock transport failure".to_string()));
        }
        self.sent.lock().unwrap().push((peer_id, text.to_string()));
        Ok(())
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, BridgeError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(BridgeError::Transport("mock listing failure".to_string()));
        }
        Ok(self.conversations.lock().unwrap().clone())
    }
}
