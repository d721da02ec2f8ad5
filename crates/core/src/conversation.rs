//! Conversation Directory
//!
//! In-memory listing of Source Platform conversations with pure pagination
//! helpers. The listing is replaced wholesale on every refresh; there is no
//! incremental diffing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a Source Platform conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Direct,
    Group,
    Channel,
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationKind::Direct => write!(f, "direct"),
            ConversationKind::Group => write!(f, "group"),
            ConversationKind::Channel => write!(f, "channel"),
        }
    }
}

/// A conversation as returned by the Source Platform listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    pub id: i64,
    pub name: Option<String>,
    pub kind: ConversationKind,
}

impl Conversation {
    pub fn new(id: i64, name: Option<String>, kind: ConversationKind) -> Self {
        Self { id, name, kind }
    }

    /// Display name, falling back to a label derived from the id.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => fallback_name(self.id),
        }
    }
}

/// Label used when a conversation has no usable name.
pub fn fallback_name(id: i64) -> String {
    format!("Chat {}", id)
}

/// One page of the directory, derived at render time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationPage {
    /// Zero-based page index (already clamped)
    pub index: usize,
    /// Total number of pages (0 for an empty directory)
    pub total: usize,
    pub items: Vec<Conversation>,
}

impl ConversationPage {
    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Most recent conversation listing.
#[derive(Debug, Clone, Default)]
pub struct ConversationDirectory {
    conversations: Vec<Conversation>,
}

impl ConversationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_listing(conversations: Vec<Conversation>) -> Self {
        Self { conversations }
    }

    /// Replace the listing with a fresh fetch.
    pub fn replace(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn find(&self, id: i64) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Display name for an id, whether or not it is in the listing.
    pub fn display_name_for(&self, id: i64) -> String {
        self.find(id)
            .map(Conversation::display_name)
            .unwrap_or_else(|| fallback_name(id))
    }

    /// Number of pages for a page size. Zero when empty or `page_size == 0`.
    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.conversations.len().div_ceil(page_size)
    }

    /// Page at `index`, clamped into `[0, page_count - 1]`.
    ///
    /// Out-of-range requests never fail: negative indices give the first page
    /// and indices past the end give the last one.
    pub fn page(&self, index: i64, page_size: usize) -> ConversationPage {
        let total = self.page_count(page_size);
        if total == 0 {
            return ConversationPage {
                index: 0,
                total,
                items: Vec::new(),
            };
        }

        let last = (total - 1) as i64;
        let index = index.clamp(0, last) as usize;
        let items = self
            .conversations
            .iter()
            .skip(index * page_size)
            .take(page_size)
            .cloned()
            .collect();

        ConversationPage {
            index,
            total,
            items,
        }
    }
}
