//! Picker Controller
//!
//! Paginated conversation picker driven by inline-keyboard buttons. Opening
//! the picker refreshes the directory, navigation edits the picker message in
//! place, and selecting a conversation binds it in the [`SessionRouter`].

use super::adapters::{ControlChannel, SourcePlatform};
use super::response_mapper::ResponseMapper;
use super::session_router::SessionRouter;
use super::types::{BridgeError, Keyboard, KeyboardButton, RenderedMessage};
use std::sync::Arc;
use tokio::sync::RwLock;
use vk_tg_bridge_core::{CallbackAction, ConversationDirectory, CoreResult, MAX_CALLBACK_BYTES};

/// Previous-page button label.
pub const PREV_LABEL: &str = "« Prev";

/// Next-page button label.
pub const NEXT_LABEL: &str = "Next »";

pub struct PickerController {
    source: Arc<dyn SourcePlatform>,
    control: Arc<dyn ControlChannel>,
    router: Arc<SessionRouter>,
    directory: Arc<RwLock<ConversationDirectory>>,
    /// Index of the page last shown
    current_page: RwLock<usize>,
    page_size: usize,
}

impl PickerController {
    pub fn new(
        source: Arc<dyn SourcePlatform>,
        control: Arc<dyn ControlChannel>,
        router: Arc<SessionRouter>,
        directory: Arc<RwLock<ConversationDirectory>>,
        page_size: usize,
    ) -> Self {
        Self {
            source,
            control,
            router,
            directory,
            current_page: RwLock::new(0),
            page_size,
        }
    }

    /// Render one page: a button per conversation plus a navigation row.
    ///
    /// The index is clamped; the returned index is the one actually shown.
    pub fn render_page(
        directory: &ConversationDirectory,
        index: i64,
        page_size: usize,
    ) -> CoreResult<(usize, RenderedMessage)> {
        let page = directory.page(index, page_size);
        let header = ResponseMapper::format_picker_header(&page);
        if page.is_empty() {
            return Ok((page.index, RenderedMessage::plain(header)));
        }

        let mut keyboard = Keyboard::new();
        for conversation in &page.items {
            let name = conversation.display_name();
            let payload = CallbackAction::Answer {
                conversation_id: conversation.id,
                name: name.clone(),
            }
            .to_payload_bounded(MAX_CALLBACK_BYTES)?;
            keyboard.push_row(vec![KeyboardButton::new(
                ResponseMapper::button_label(&name),
                payload,
            )]);
        }

        let mut nav = Vec::new();
        if page.has_previous() {
            let index = page.index as i64 - 1;
            nav.push(KeyboardButton::new(
                PREV_LABEL,
                CallbackAction::ChatPage { index }.to_payload()?,
            ));
        }
        if page.has_next() {
            let index = page.index as i64 + 1;
            nav.push(KeyboardButton::new(
                NEXT_LABEL,
                CallbackAction::ChatPage { index }.to_payload()?,
            ));
        }
        keyboard.push_row(nav);

        Ok((page.index, RenderedMessage::with_keyboard(header, keyboard)))
    }

    /// Open the picker at the first page with a freshly fetched listing.
    ///
    /// A failed refresh keeps the previous listing.
    pub async fn open(&self) -> Result<(), BridgeError> {
        match self.source.list_conversations().await {
            Ok(listing) => {
                tracing::debug!(count = listing.len(), "conversation directory refreshed");
                self.directory.write().await.replace(listing);
            }
            Err(e) => {
                tracing::warn!("Failed to refresh conversations, showing cached listing: {}", e);
            }
        }

        let (index, rendered) = {
            let directory = self.directory.read().await;
            Self::render_page(&directory, 0, self.page_size)?
        };
        *self.current_page.write().await = index;

        self.control.send_rendered(&rendered).await?;
        Ok(())
    }

    /// Re-render the picker message `message_id` at page `index`.
    ///
    /// The session is not touched.
    pub async fn navigate(&self, message_id: i64, index: i64) -> Result<(), BridgeError> {
        let (index, rendered) = {
            let directory = self.directory.read().await;
            Self::render_page(&directory, index, self.page_size)?
        };
        *self.current_page.write().await = index;

        let keyboard = rendered.keyboard.unwrap_or_default();
        self.control
            .edit_keyboard(message_id, &rendered.text, &keyboard)
            .await
    }

    /// Bind a conversation, confirm it and pin the confirmation.
    ///
    /// The confirmation is a reply to `message_id`, the message whose button
    /// was pressed. The directory name wins over the one carried in the
    /// payload, which may have been truncated.
    pub async fn select(
        &self,
        message_id: i64,
        conversation_id: i64,
        name: &str,
    ) -> Result<(), BridgeError> {
        let name = {
            let directory = self.directory.read().await;
            directory
                .find(conversation_id)
                .map(|c| c.display_name())
                .unwrap_or_else(|| name.to_string())
        };

        let notice = self.router.set_active(conversation_id, &name).await;
        let confirmation_id = self.control.reply_text(message_id, &notice.text).await?;

        if notice.pin {
            if let Err(e) = self.control.pin_message(confirmation_id).await {
                tracing::warn!("Failed to pin confirmation: {}", e);
            }
        }
        Ok(())
    }

    /// Dispatch a decoded button action.
    pub async fn handle_action(
        &self,
        message_id: i64,
        action: CallbackAction,
    ) -> Result<(), BridgeError> {
        match action {
            CallbackAction::Answer {
                conversation_id,
                name,
            } => self.select(message_id, conversation_id, &name).await,
            CallbackAction::ChatPage { index } => self.navigate(message_id, index).await,
            CallbackAction::Unrecognized { raw } => {
                tracing::debug!(payload = %raw, "ignoring unrecognized button payload");
                Ok(())
            }
        }
    }

    pub async fn current_page(&self) -> usize {
        *self.current_page.read().await
    }

    pub fn directory(&self) -> Arc<RwLock<ConversationDirectory>> {
        Arc::clone(&self.directory)
    }
}
