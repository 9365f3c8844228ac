//! Conversation identifiers and the enumerations used to look conversations up.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Channel name used by team conversations when none is given.
pub const DEFAULT_TEAM_TOPIC: &str = "general";

/// Opaque conversation identifier assigned by the chat service.
///
/// The first two bytes are shard bits and are currently always zero.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(Vec<u8>);

impl ConversationId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConversationId({})", self)
    }
}

impl FromStr for ConversationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| Error::InvalidRequest(format!("invalid conversation id '{}': {}", s, e)))?;
        if bytes.is_empty() {
            return Err(Error::InvalidRequest("empty conversation id".to_string()));
        }
        Ok(Self(bytes))
    }
}

impl Serialize for ConversationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ConversationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Coarse category of a conversation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TopicType {
    #[default]
    Chat,
    Dev,
}

impl TopicType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicType::Chat => "chat",
            TopicType::Dev => "dev",
        }
    }
}

impl FromStr for TopicType {
    type Err = Error;

    /// The empty string means `chat`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "chat" => Ok(TopicType::Chat),
            "dev" => Ok(TopicType::Dev),
            other => Err(Error::InvalidRequest(format!("invalid topic type: '{}'", other))),
        }
    }
}

impl fmt::Display for TopicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Private,
    Public,
    Any,
}

impl Visibility {
    /// Map the `--public` / `--private` flag pair onto a visibility.
    pub fn from_flags(public: bool, private: bool) -> Result<Self> {
        match (public, private) {
            (true, true) => Err(Error::InvalidRequest(
                "--public and --private are mutually exclusive".to_string(),
            )),
            (true, false) => Ok(Visibility::Public),
            _ => Ok(Visibility::Private),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
            Visibility::Any => "any",
        }
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            "any" => Ok(Visibility::Any),
            other => Err(Error::InvalidRequest(format!("invalid visibility: '{}'", other))),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership model backing a conversation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MembersType {
    Kbfs,
    Team,
    #[default]
    ImpTeamNative,
    ImpTeamUpgrade,
}

impl MembersType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembersType::Kbfs => "kbfs",
            MembersType::Team => "team",
            MembersType::ImpTeamNative => "impteamnative",
            MembersType::ImpTeamUpgrade => "impteamupgrade",
        }
    }

    /// Parse a members type, falling back to `default` for the empty string.
    pub fn parse_or(s: &str, default: MembersType) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(default);
        }
        s.parse()
    }
}

impl FromStr for MembersType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kbfs" => Ok(MembersType::Kbfs),
            "team" => Ok(MembersType::Team),
            "impteamnative" => Ok(MembersType::ImpTeamNative),
            "impteamupgrade" => Ok(MembersType::ImpTeamUpgrade),
            other => Err(Error::InvalidRequest(format!("invalid members type: '{}'", other))),
        }
    }
}

impl fmt::Display for MembersType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity verification strictness, forwarded to the service untouched.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentifyBehavior {
    Default,
    #[default]
    ChatCli,
    ChatGui,
    ChatSkip,
}

/// Identity of a conversation as known to the directory.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConversationInfo {
    pub id: ConversationId,
    pub tlf_name: String,
    #[serde(default)]
    pub topic_name: Option<String>,
    pub topic_type: TopicType,
    pub visibility: Visibility,
    pub members_type: MembersType,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationErrorKind {
    /// The caller's account was reset since they last used the conversation.
    Reset,
    /// The caller was removed from the conversation.
    Removed,
    Other,
}

/// Per-conversation failure reported by the directory alongside the result.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConversationError {
    pub kind: ConversationErrorKind,
    pub message: String,
}

impl ConversationError {
    pub fn is_benign(&self) -> bool {
        matches!(
            self.kind,
            ConversationErrorKind::Reset | ConversationErrorKind::Removed
        )
    }
}

/// A conversation together with the fields the service derives for the caller.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    pub info: ConversationInfo,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub error: Option<ConversationError>,
    /// Set only by [`Conversation::degraded`].
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    degraded: bool,
}

impl Conversation {
    pub fn new(info: ConversationInfo) -> Self {
        Self {
            info,
            members: Vec::new(),
            snippet: None,
            unread: false,
            error: None,
            degraded: false,
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.info.id
    }

    /// Handle with identity only; derived fields are dropped.
    pub fn degraded(&self) -> Self {
        Self {
            info: self.info.clone(),
            members: Vec::new(),
            snippet: None,
            unread: false,
            error: self.error.clone(),
            degraded: true,
        }
    }

    /// Whether this is an identity-only handle from [`Conversation::degraded`].
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}
