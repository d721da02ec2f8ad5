//! Bridge Flow Integration Tests
//!
//! Drives a started gateway through recording adapters.

use std::sync::Arc;

use vk_tg_bridge::services::bridge::{
    BridgeGateway, BridgeSettings, ControlEvent, SessionRouter, SourceEvent, SourceMessage,
};
use vk_tg_bridge_core::{Conversation, ConversationKind};

use crate::support::{eventually, RecordingControl, ScriptedSource, Sent};

fn listing() -> Vec<Conversation> {
    vec![
        Conversation::new(100, Some("Alice".to_string()), ConversationKind::Direct),
        Conversation::new(200, Some("Bob".to_string()), ConversationKind::Direct),
    ]
}

async fn started(
    page_size: usize,
) -> (Arc<RecordingControl>, Arc<ScriptedSource>, BridgeGateway) {
    let control = Arc::new(RecordingControl::new());
    let source = Arc::new(ScriptedSource::new(listing()));
    let settings = BridgeSettings {
        page_size,
        ..Default::default()
    };
    let gateway = BridgeGateway::new(control.clone(), source.clone(), settings);
    gateway.start().await.unwrap();
    (control, source, gateway)
}

fn text(text: &str) -> ControlEvent {
    ControlEvent::Text {
        message_id: 0,
        text: text.to_string(),
    }
}

fn press(message_id: i64, payload: &str) -> ControlEvent {
    ControlEvent::ButtonPress {
        message_id,
        payload: payload.to_string(),
    }
}

fn incoming(peer_id: i64, text: &str) -> SourceEvent {
    SourceEvent::NewMessage(SourceMessage {
        message_id: 1,
        peer_id,
        text: text.to_string(),
        outgoing: false,
        timestamp: 1700000000,
    })
}

// ============================================================================
// Session Router
// ============================================================================

#[tokio::test]
async fn test_single_active_destination() {
    let router = SessionRouter::new();
    let sequence = [(100, "Alice"), (200, "Bob"), (100, "Alice"), (300, "")];
    for (id, name) in sequence {
        router.set_active(id, name).await;
    }
    assert_eq!(router.active_destination().await, Some(300));
    assert_eq!(router.describe_active().await, "Now talking with Chat 300");
}

// ============================================================================
// Gateway Scenarios
// ============================================================================

#[tokio::test]
async fn test_no_selection_guard() {
    let (control, source, gateway) = started(8).await;

    control.emit(text("hello")).await;

    assert!(eventually(|| !control.texts().is_empty()).await);
    assert_eq!(control.texts(), vec!["No chat selected"]);
    assert!(source.delivered().is_empty());
    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_select_then_relay() {
    let (control, source, gateway) = started(8).await;

    control.emit(press(1, "answer.100.Alice")).await;
    control.emit(text("hello")).await;

    assert!(eventually(|| !source.delivered().is_empty()).await);
    assert_eq!(source.delivered(), vec![(100, "hello".to_string())]);

    let sent = control.sent();
    assert_eq!(
        sent,
        vec![
            Sent::Replied {
                id: 1,
                reply_to: 1,
                text: "Now talking with Alice".to_string(),
            },
            Sent::Pinned { id: 1 },
        ]
    );
    assert_eq!(gateway.get_status().await.outbound_relayed, 1);
    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_navigation_does_not_mutate_session() {
    let (control, source, gateway) = started(1).await;

    control.emit(text("/chats")).await;
    assert!(eventually(|| !control.sent().is_empty()).await);
    let picker_id = match &control.sent()[0] {
        Sent::Message { id, text, keyboard } => {
            assert_eq!(text, "Chats (page 1/2)");
            assert!(keyboard.is_some());
            *id
        }
        other => panic!("Expected picker message, got {:?}", other),
    };
    let before = gateway.session_router().snapshot().await;

    control.emit(press(picker_id, "chat.1.nav")).await;
    assert!(eventually(|| control.sent().len() == 2).await);

    match &control.sent()[1] {
        Sent::Edited { id, text, keyboard } => {
            assert_eq!(*id, picker_id);
            assert_eq!(text, "Chats (page 2/2)");
            let payloads: Vec<_> = keyboard.buttons().map(|b| b.payload.as_str()).collect();
            assert_eq!(payloads, vec!["answer.200.Bob", "chat.0.nav"]);
        }
        other => panic!("Expected an edit, got {:?}", other),
    }
    assert_eq!(gateway.session_router().snapshot().await, before);
    assert!(source.delivered().is_empty());
    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_action_ignored() {
    let (control, source, gateway) = started(8).await;

    control.emit(press(1, "foo.1.2")).await;
    // Anything queued after the press is handled after it
    control.emit(text("/now")).await;

    assert!(eventually(|| !control.sent().is_empty()).await);
    assert_eq!(control.texts(), vec!["No chat selected"]);
    assert!(source.delivered().is_empty());
    assert!(gateway.session_router().active_destination().await.is_none());
    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_inbound_relay_then_reply_button() {
    let (control, source, gateway) = started(8).await;
    source.queue(vec![incoming(200, "are you there?"), incoming(200, "hello?")]);

    assert!(eventually(|| control.sent().len() == 2).await);
    let reply_payload = match &control.sent()[0] {
        Sent::Message {
            text,
            keyboard: Some(keyboard),
            ..
        } => {
            assert_eq!(text, "Bob:\nare you there?");
            keyboard.buttons().next().unwrap().payload.clone()
        }
        other => panic!("Expected relayed message with Reply, got {:?}", other),
    };
    assert_eq!(reply_payload, "answer.200.Bob");
    // Second message of the same unanswered run is bare
    assert_eq!(
        control.sent()[1],
        Sent::Message {
            id: 2,
            text: "hello?".to_string(),
            keyboard: None
        }
    );

    control.emit(press(1, &reply_payload)).await;
    control.emit(text("yes")).await;
    assert!(eventually(|| !source.delivered().is_empty()).await);
    assert_eq!(source.delivered(), vec![(200, "yes".to_string())]);
    assert_eq!(
        control.sent()[2],
        Sent::Replied {
            id: 3,
            reply_to: 1,
            text: "Now talking with Bob".to_string(),
        }
    );

    let status = gateway.get_status().await;
    assert_eq!(status.inbound_relayed, 2);
    assert_eq!(status.active_conversation.as_deref(), Some("Bob (200)"));
    gateway.stop().await.unwrap();
}
