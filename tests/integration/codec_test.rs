//! Codec and Directory Integration Tests

use vk_tg_bridge_core::{
    ActionCodec, CallbackAction, Conversation, ConversationDirectory, ConversationKind,
    MAX_CALLBACK_BYTES,
};

fn directory(n: i64) -> ConversationDirectory {
    ConversationDirectory::from_listing(
        (1..=n)
            .map(|i| Conversation::new(i, Some(format!("Conversation {}", i)), ConversationKind::Direct))
            .collect(),
    )
}

// ============================================================================
// Wire Format
// ============================================================================

#[test]
fn test_round_trip_with_dotted_names() {
    for name in ["Alice", "Mr. Smith", "a.b.c.", ".", ""] {
        let payload = ActionCodec::encode("answer", &["100", name]).unwrap();
        let raw = ActionCodec::split(&payload);
        assert_eq!(raw.command, "answer");
        assert_eq!(raw.param.as_deref(), Some("100"));
        assert_eq!(raw.rest.as_deref(), Some(name));
    }
}

#[test]
fn test_decode_answer_and_page() {
    assert_eq!(
        CallbackAction::decode("answer.100.Alice"),
        CallbackAction::Answer {
            conversation_id: 100,
            name: "Alice".to_string()
        }
    );
    assert_eq!(
        CallbackAction::decode("chat.1.nav"),
        CallbackAction::ChatPage { index: 1 }
    );
}

#[test]
fn test_unknown_command_is_unrecognized() {
    assert_eq!(
        CallbackAction::decode("foo.1.2"),
        CallbackAction::Unrecognized {
            raw: "foo.1.2".to_string()
        }
    );
    assert!(matches!(
        CallbackAction::decode("answer.abc.Alice"),
        CallbackAction::Unrecognized { .. }
    ));
}

#[test]
fn test_bounded_payload_fits_callback_limit() {
    let action = CallbackAction::Answer {
        conversation_id: 2000000042,
        name: "Беседа выпускников 2009 года. Основной чат".to_string(),
    };
    let payload = action.to_payload_bounded(MAX_CALLBACK_BYTES).unwrap();
    assert!(payload.len() <= MAX_CALLBACK_BYTES);
    match CallbackAction::decode(&payload) {
        CallbackAction::Answer {
            conversation_id,
            name,
        } => {
            assert_eq!(conversation_id, 2000000042);
            assert!("Беседа выпускников 2009 года. Основной чат".starts_with(&name));
        }
        other => panic!("Expected Answer, got {:?}", other),
    }
}

// ============================================================================
// Pagination
// ============================================================================

#[test]
fn test_page_clamps_negative_and_beyond_range() {
    let directory = directory(20);

    let first = directory.page(-5, 8);
    assert_eq!(first.index, 0);
    assert_eq!(first.items.len(), 8);
    assert_eq!(first.items[0].id, 1);

    let last = directory.page(99, 8);
    assert_eq!(last.index, 2);
    assert_eq!(last.total, 3);
    assert_eq!(last.items.len(), 4);
    assert_eq!(last.items[0].id, 17);
}

#[test]
fn test_page_count_rounds_up() {
    assert_eq!(directory(0).page_count(8), 0);
    assert_eq!(directory(16).page_count(8), 2);
    assert_eq!(directory(17).page_count(8), 3);
}
