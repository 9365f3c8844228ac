//! Conversation resolution.
//!
//! Turns a name plus optional channel, visibility and membership constraints
//! into exactly one conversation, creating it, refusing it, or asking the user
//! to pick, depending on the behavior the command asks for.

use std::future::Future;
use tokio_util::sync::CancellationToken;

use super::alias::AliasShortener;
use super::directory::{ConversationQuery, Directory};
use super::types::{
    Conversation, IdentifyBehavior, MembersType, TopicType, Visibility, DEFAULT_TEAM_TOPIC,
};
use super::ui::ChatUi;
use crate::error::{Error, Result};

/// What the user asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvingRequest {
    /// Username, comma-separated usernames, or team name.
    pub name: String,
    /// Channel name; empty for none.
    pub topic_name: String,
    pub topic_type: TopicType,
    pub visibility: Visibility,
    pub members_type: MembersType,
}

impl ResolvingRequest {
    pub fn new(name: impl Into<String>, members_type: MembersType) -> Self {
        Self {
            name: name.into(),
            members_type,
            ..Default::default()
        }
    }

    pub fn with_topic_name(mut self, topic_name: impl Into<String>) -> Self {
        self.topic_name = topic_name.into();
        self
    }

    pub fn with_topic_type(mut self, topic_type: TopicType) -> Self {
        self.topic_type = topic_type;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Validated copy of the request with the default team channel filled in.
    pub fn normalize(&self) -> Result<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidRequest(
                "a user, user list or team name is required".to_string(),
            ));
        }

        let mut topic_name = self.topic_name.trim().trim_start_matches('#').to_string();

        if !topic_name.is_empty()
            && self.topic_type == TopicType::Chat
            && self.members_type != MembersType::Team
        {
            return Err(Error::InvalidRequest(format!(
                "channel '{}' given for '{}', but named channels only exist in team conversations",
                topic_name, name
            )));
        }

        if self.members_type == MembersType::Team && topic_name.is_empty() {
            topic_name = DEFAULT_TEAM_TOPIC.to_string();
        }

        Ok(Self {
            name: name.to_string(),
            topic_name,
            topic_type: self.topic_type,
            visibility: self.visibility,
            members_type: self.members_type,
        })
    }
}

/// What the resolver is allowed to do about what it finds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvingBehavior {
    pub create_if_not_exists: bool,
    pub must_not_exist: bool,
    pub interactive: bool,
    pub ignore_conversation_error: bool,
    pub identify_behavior: IdentifyBehavior,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub conversation: Conversation,
    /// The user picked this conversation from several candidates. Sending
    /// flows should confirm before acting on it.
    pub user_chose: bool,
}

/// Resolves requests against a [`Directory`] for one CLI session.
pub struct ConversationResolver<D> {
    directory: D,
    ui: ChatUi,
    cancel: CancellationToken,
    alias_min_bytes: usize,
}

impl<D: Directory> ConversationResolver<D> {
    pub fn new(directory: D, ui: ChatUi, cancel: CancellationToken) -> Self {
        Self {
            directory,
            ui,
            cancel,
            alias_min_bytes: 2,
        }
    }

    /// Alias width floor used for the disambiguation menu.
    pub fn with_alias_min_bytes(mut self, min_bytes: usize) -> Self {
        self.alias_min_bytes = min_bytes;
        self
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn alias_min_bytes(&self) -> usize {
        self.alias_min_bytes
    }

    async fn cancellable<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::transport("operation cancelled")),
            r = fut => r,
        }
    }

    fn query_for(
        request: &ResolvingRequest,
        canonical: String,
        behavior: &ResolvingBehavior,
    ) -> ConversationQuery {
        ConversationQuery {
            tlf_name: canonical,
            topic_name: Some(request.topic_name.clone()).filter(|t| !t.is_empty()),
            topic_type: request.topic_type,
            visibility: request.visibility,
            members_type: request.members_type,
            identify_behavior: behavior.identify_behavior,
        }
    }

    async fn lookup(
        &self,
        request: &ResolvingRequest,
        behavior: &ResolvingBehavior,
    ) -> Result<(ConversationQuery, Vec<Conversation>)> {
        let canonical = self
            .cancellable(self.directory.canonicalize(
                &request.name,
                request.members_type,
                request.visibility,
            ))
            .await?;
        tracing::debug!("canonicalized '{}' as '{}'", request.name, canonical);

        let query = Self::query_for(request, canonical, behavior);
        let matches = self
            .cancellable(self.directory.find_conversations(&query))
            .await?;
        tracing::debug!(
            "{} conversation(s) match {}#{:?} ({}, {}, {})",
            matches.len(),
            query.tlf_name,
            query.topic_name,
            query.topic_type,
            query.visibility,
            query.members_type
        );
        Ok((query, matches))
    }

    /// Every conversation matching `request`, without applying any behavior.
    ///
    /// Unlike [`resolve`](Self::resolve), an empty channel name lists every
    /// channel of a team rather than only the default one.
    pub async fn find_all(
        &self,
        request: &ResolvingRequest,
        identify_behavior: IdentifyBehavior,
    ) -> Result<Vec<Conversation>> {
        let mut normalized = request.normalize()?;
        if request.topic_name.trim().trim_start_matches('#').is_empty() {
            normalized.topic_name.clear();
        }
        let request = normalized;
        let behavior = ResolvingBehavior {
            identify_behavior,
            ..Default::default()
        };
        let (_, matches) = self.lookup(&request, &behavior).await?;
        Ok(matches)
    }

    /// Resolve `request` to a single conversation.
    ///
    /// `Ok(None)` means nothing matched and `behavior` did not ask for creation.
    pub async fn resolve(
        &mut self,
        request: &ResolvingRequest,
        behavior: &ResolvingBehavior,
    ) -> Result<Option<ResolutionResult>> {
        let request = request.normalize()?;
        let (query, mut matches) = self.lookup(&request, behavior).await?;

        match matches.len() {
            0 => {
                if !behavior.create_if_not_exists {
                    tracing::debug!("no conversation for '{}'", query.tlf_name);
                    return Ok(None);
                }
                let created = self
                    .cancellable(self.directory.create_conversation(&query))
                    .await?;
                tracing::info!(
                    "created conversation {} for '{}'",
                    created.id(),
                    query.tlf_name
                );
                let conversation = check_conversation_error(created, behavior)?;
                Ok(Some(ResolutionResult {
                    conversation,
                    user_chose: false,
                }))
            }
            1 => {
                let found = matches.remove(0);
                if behavior.must_not_exist {
                    return Err(Error::AlreadyExists(describe(&query)));
                }
                let conversation = check_conversation_error(found, behavior)?;
                Ok(Some(ResolutionResult {
                    conversation,
                    user_chose: false,
                }))
            }
            count => {
                if behavior.must_not_exist {
                    return Err(Error::AlreadyExists(describe(&query)));
                }
                let ambiguous = || Error::AmbiguousConversation {
                    name: describe(&query),
                    count,
                };
                if !behavior.interactive {
                    return Err(ambiguous());
                }

                let ids: Vec<_> = matches.iter().map(|c| c.id().clone()).collect();
                let shortener = AliasShortener::try_new(&ids, self.alias_min_bytes)?;
                let picked = match &mut self.ui {
                    ChatUi::Terminal(term) => term.choose(&matches, &shortener, &self.cancel).await?,
                    ChatUi::Api => {
                        tracing::debug!("api session cannot prompt, {} candidates", count);
                        return Err(ambiguous());
                    }
                };

                let chosen = matches.swap_remove(picked);
                tracing::info!("user chose conversation {}", chosen.id());
                let conversation = check_conversation_error(chosen, behavior)?;
                Ok(Some(ResolutionResult {
                    conversation,
                    user_chose: true,
                }))
            }
        }
    }
}

fn describe(query: &ConversationQuery) -> String {
    match &query.topic_name {
        Some(topic) => format!("{}#{}", query.tlf_name, topic),
        None => query.tlf_name.clone(),
    }
}

/// Fail on a per-conversation error unless it is benign and the caller opted
/// to tolerate it, in which case a degraded handle is returned.
fn check_conversation_error(
    conversation: Conversation,
    behavior: &ResolvingBehavior,
) -> Result<Conversation> {
    match &conversation.error {
        None => Ok(conversation),
        Some(err) if err.is_benign() && behavior.ignore_conversation_error => {
            tracing::warn!(
                "using degraded conversation {}: {}",
                conversation.id(),
                err.message
            );
            Ok(conversation.degraded())
        }
        Some(err) => Err(Error::ConversationUnavailable {
            id: conversation.id().to_string(),
            reason: err.message.clone(),
        }),
    }
}
