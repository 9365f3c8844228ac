//! Chat module - conversation lookup and display.
//!
//! This module contains the pieces commands share when they act on a
//! conversation:
//! - Resolving a name/channel reference to one conversation
//! - Short hex aliases for conversation ids
//! - The UI surface used to disambiguate

pub mod alias;
pub mod directory;
pub mod render;
pub mod resolver;
pub mod types;
pub mod ui;

pub use alias::{full_alias, parse_alias, AliasShortener};
pub use directory::{ConversationQuery, Directory};
pub use resolver::{ConversationResolver, ResolutionResult, ResolvingBehavior, ResolvingRequest};
pub use types::{
    Conversation, ConversationId, ConversationInfo, IdentifyBehavior, MembersType, TopicType,
    Visibility,
};
pub use ui::{ChatUi, Terminal};
