//! CLI commands for chatctl using clap.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::cache::InboxCache;
use crate::chat::render::{render_conversation_line, render_menu};
use crate::chat::types::{ConversationId, ConversationInfo, MembersType, Visibility};
use crate::chat::{
    AliasShortener, ChatUi, ConversationResolver, ResolvingBehavior, ResolvingRequest, Terminal,
};
use crate::config::{load_settings, Settings};
use crate::rpc::ServiceClient;

/// chatctl - find, create and alias chat conversations.
#[derive(Parser)]
#[command(name = "chatctl")]
#[command(version = "0.1.0")]
#[command(about = "chatctl - find, create and alias chat conversations", long_about = None)]
pub struct Commands {
    /// Chat service endpoint (overrides settings)
    #[arg(long, global = true, env = "CHATCTL_ENDPOINT")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags naming a conversation.
#[derive(Args, Debug, Clone)]
pub struct ConversationArgs {
    /// User, comma-separated users, or team name
    pub name: String,

    /// Topic type: chat or dev
    #[arg(long = "topic-type", default_value = "chat")]
    pub topic_type: String,

    /// Channel name (chat channels exist only in teams)
    #[arg(long = "topic-name", alias = "channel", default_value = "")]
    pub topic_name: String,

    /// Public conversation
    #[arg(long, conflicts_with = "private")]
    pub public: bool,

    /// Private conversation (default)
    #[arg(long)]
    pub private: bool,

    /// Team conversation (same as --members-type team)
    #[arg(long, conflicts_with = "members_type")]
    pub team: bool,

    /// Members type: kbfs, team, impteamnative, impteamupgrade
    #[arg(long = "members-type")]
    pub members_type: Option<String>,
}

impl ConversationArgs {
    pub fn to_request(
        &self,
        default_members_type: MembersType,
    ) -> crate::error::Result<ResolvingRequest> {
        let members_type = if self.team {
            MembersType::Team
        } else {
            MembersType::parse_or(
                self.members_type.as_deref().unwrap_or_default(),
                default_members_type,
            )?
        };

        Ok(ResolvingRequest {
            name: self.name.clone(),
            topic_name: self.topic_name.clone(),
            topic_type: self.topic_type.parse()?,
            visibility: Visibility::from_flags(self.public, self.private)?,
            members_type,
        })
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve a name (and optional channel) to one conversation
    Resolve {
        #[command(flatten)]
        conv: ConversationArgs,

        /// Create the conversation if it does not exist
        #[arg(long)]
        create: bool,

        /// Fail instead of prompting when several conversations match
        #[arg(long)]
        non_interactive: bool,

        /// Accept conversations with a reset or removed member
        #[arg(long)]
        ignore_conversation_error: bool,

        /// Print the result as JSON (never prompts)
        #[arg(long)]
        json: bool,
    },

    /// List conversations matching a name, with short aliases
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        conv: ConversationArgs,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new team channel
    CreateChannel {
        /// Team name
        team: String,

        /// Channel name
        channel: String,

        /// Topic type: chat or dev
        #[arg(long = "topic-type", default_value = "chat")]
        topic_type: String,
    },

    /// Expand an alias printed by the last `list`
    Show {
        /// Alias such as :0100
        alias: String,
    },

    /// Print the effective settings
    Config,
}

impl Commands {
    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        let mut settings = load_settings()?;
        if let Some(endpoint) = &self.endpoint {
            settings.service.endpoint = endpoint.clone();
        }

        let cancel = CancellationToken::new();
        let watcher = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling");
                watcher.cancel();
            }
        });

        match &self.command {
            Command::Resolve {
                conv,
                create,
                non_interactive,
                ignore_conversation_error,
                json,
            } => {
                let behavior = ResolvingBehavior {
                    create_if_not_exists: *create,
                    must_not_exist: false,
                    interactive: !*non_interactive && !*json,
                    ignore_conversation_error: *ignore_conversation_error,
                    identify_behavior: settings.chat.identify_behavior,
                };
                cmd_resolve(&settings, cancel, conv, &behavior, *json).await
            }
            Command::List { conv, json } => cmd_list(&settings, cancel, conv, *json).await,
            Command::CreateChannel {
                team,
                channel,
                topic_type,
            } => cmd_create_channel(&settings, cancel, team, channel, topic_type).await,
            Command::Show { alias } => cmd_show(&settings, alias),
            Command::Config => cmd_config(&settings),
        }
    }
}

fn connect(
    settings: &Settings,
    ui: ChatUi,
    cancel: CancellationToken,
) -> Result<ConversationResolver<ServiceClient>> {
    let client = ServiceClient::new(&settings.service.endpoint, settings.service.timeout())
        .context("Failed to build service client")?;
    tracing::debug!(
        "Connecting to {} with {} UI",
        client.base_url(),
        ui.name()
    );
    Ok(ConversationResolver::new(client, ui, cancel)
        .with_alias_min_bytes(settings.chat.alias_min_bytes))
}

fn short_alias(id: &ConversationId, min_bytes: usize) -> String {
    AliasShortener::new(std::slice::from_ref(id), min_bytes)
        .shorten(0)
        .to_string()
}

// Command implementations

async fn cmd_resolve(
    settings: &Settings,
    cancel: CancellationToken,
    conv: &ConversationArgs,
    behavior: &ResolvingBehavior,
    json: bool,
) -> Result<()> {
    let request = conv.to_request(settings.chat.default_members_type)?;
    let ui = if behavior.interactive {
        ChatUi::Terminal(Terminal::stdio()?)
    } else {
        ChatUi::Api
    };
    let mut resolver = connect(settings, ui, cancel)?;

    let resolved = resolver.resolve(&request, behavior).await?;

    if json {
        let value = match &resolved {
            Some(result) => json!({
                "conversation": result.conversation,
                "user_chose": result.user_chose,
            }),
            None => json!({ "conversation": null, "user_chose": false }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match resolved {
        Some(result) => {
            let conv = &result.conversation;
            let alias = short_alias(conv.id(), settings.chat.alias_min_bytes);
            println!("{}", render_conversation_line(1, &alias, conv));
            println!("id: {}", conv.id());
            if result.user_chose {
                println!("(selected interactively; confirm before sending)");
            }
        }
        None => println!("No conversation found for {}", request.name.trim()),
    }
    Ok(())
}

async fn cmd_list(
    settings: &Settings,
    cancel: CancellationToken,
    conv: &ConversationArgs,
    json: bool,
) -> Result<()> {
    let request = conv.to_request(settings.chat.default_members_type)?;
    let resolver = connect(settings, ChatUi::Api, cancel)?;

    let convs = resolver
        .find_all(&request, settings.chat.identify_behavior)
        .await?;

    let infos: Vec<ConversationInfo> = convs.iter().map(|c| c.info.clone()).collect();
    if let Err(e) = record_listing(&infos) {
        tracing::warn!("Failed to record listing: {}", e);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&convs)?);
        return Ok(());
    }

    if convs.is_empty() {
        println!("No conversations found for {}", request.name.trim());
        return Ok(());
    }

    let ids: Vec<ConversationId> = infos.iter().map(|c| c.id.clone()).collect();
    let shortener = AliasShortener::try_new(&ids, settings.chat.alias_min_bytes)?;
    println!("{}", render_menu(&convs, &shortener));
    Ok(())
}

fn record_listing(infos: &[ConversationInfo]) -> Result<()> {
    let mut cache = InboxCache::open_default()?;
    cache.record(infos)?;
    Ok(())
}

async fn cmd_create_channel(
    settings: &Settings,
    cancel: CancellationToken,
    team: &str,
    channel: &str,
    topic_type: &str,
) -> Result<()> {
    if channel.trim().trim_start_matches('#').is_empty() {
        bail!("Channel name is required");
    }

    let request = ResolvingRequest::new(team, MembersType::Team)
        .with_topic_name(channel)
        .with_topic_type(topic_type.parse()?);
    let behavior = ResolvingBehavior {
        create_if_not_exists: true,
        must_not_exist: true,
        identify_behavior: settings.chat.identify_behavior,
        ..Default::default()
    };

    let mut resolver = connect(settings, ChatUi::Api, cancel)?;
    let Some(result) = resolver.resolve(&request, &behavior).await? else {
        bail!("Channel {} was not created", channel);
    };

    let conv = &result.conversation;
    let alias = short_alias(conv.id(), settings.chat.alias_min_bytes);
    println!("Created {}", render_conversation_line(1, &alias, conv));
    Ok(())
}

fn cmd_show(settings: &Settings, alias: &str) -> Result<()> {
    let cache = InboxCache::open_default()?;
    match cache.expand(alias, settings.chat.alias_min_bytes)? {
        Some(info) => {
            let topic = info
                .topic_name
                .as_deref()
                .map(|t| format!("#{}", t))
                .unwrap_or_default();
            println!(
                "{} {}{} ({}, {})",
                info.id, info.tlf_name, topic, info.visibility, info.members_type
            );
            Ok(())
        }
        None => bail!("No conversation in the last listing matches {}", alias),
    }
}

fn cmd_config(settings: &Settings) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}
