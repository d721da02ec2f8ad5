//! VK Conversation Bridge
//!
//! Lets one operator read and answer VK conversations from a single Telegram
//! chat.
//!
//! ## Architecture
//!
//! ```text
//! VK long-poll → SourcePlatform → InboundRelay → ResponseMapper → ControlChannel
//!                                      ↓ mark_relayed
//!                                 SessionRouter
//!                                      ↑ set_active / active_destination
//! Telegram → ControlChannel → mpsc → BridgeGateway
//!                                      ↓
//!                      CommandRouter.parse() / CallbackAction::decode()
//!                                      ↓
//!                      PickerController | OutboundRelay → SourcePlatform.send_message()
//! ```

pub mod adapters;
pub mod command_router;
pub mod gateway;
pub mod inbound;
pub mod outbound;
pub mod picker;
pub mod response_mapper;
pub mod session_router;
pub mod types;

pub use gateway::BridgeGateway;
pub use session_router::{ActivationNotice, ActiveConversation, Session, SessionRouter};
pub use types::*;
