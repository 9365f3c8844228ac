//! Conversation directory: the service-side capabilities the resolver consumes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{Conversation, IdentifyBehavior, MembersType, TopicType, Visibility};
use crate::error::Result;

/// Criteria for finding or creating a conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConversationQuery {
    pub tlf_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    pub topic_type: TopicType,
    pub visibility: Visibility,
    pub members_type: MembersType,
    pub identify_behavior: IdentifyBehavior,
}

/// Chat service operations used to turn a name into a conversation.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Canonical form of a user list or team name.
    ///
    /// Fails with `Error::Resolution` when the name maps to no known user or team.
    async fn canonicalize(
        &self,
        name: &str,
        members_type: MembersType,
        visibility: Visibility,
    ) -> Result<String>;

    /// All conversations matching `query`. Empty when nothing matches.
    async fn find_conversations(&self, query: &ConversationQuery) -> Result<Vec<Conversation>>;

    /// Create a conversation matching `query`.
    async fn create_conversation(&self, query: &ConversationQuery) -> Result<Conversation>;
}
