//! chatctl library root.

pub mod cache;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod rpc;

pub use chat::{
    AliasShortener, ChatUi, Conversation, ConversationId, ConversationResolver, Directory,
    ResolutionResult, ResolvingBehavior, ResolvingRequest,
};
pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use error::{Error, Result};
