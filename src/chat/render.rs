//! Plain-text rendering of conversation listings.

use super::alias::AliasShortener;
use super::types::{Conversation, ConversationErrorKind};

/// One listing line: `[n] <alias> <name>[#topic] (<visibility>, <members type>)`.
pub fn render_conversation_line(position: usize, alias: &str, conv: &Conversation) -> String {
    let info = &conv.info;
    let mut line = format!("[{}] {} {}", position, alias, info.tlf_name);

    if let Some(topic) = info.topic_name.as_deref().filter(|t| !t.is_empty()) {
        line.push('#');
        line.push_str(topic);
    }

    line.push_str(&format!(" ({}, {})", info.visibility, info.members_type));

    if let Some(err) = &conv.error {
        let marker = match err.kind {
            ConversationErrorKind::Reset => "reset",
            ConversationErrorKind::Removed => "removed",
            ConversationErrorKind::Other => "error",
        };
        line.push_str(&format!(" ({})", marker));
    } else if conv.unread {
        line.push_str(" *");
    }

    line
}

/// Numbered listing, one line per conversation, using short aliases.
///
/// `shortener` must have been built over `convs` in the same order.
pub fn render_menu(convs: &[Conversation], shortener: &AliasShortener) -> String {
    convs
        .iter()
        .enumerate()
        .map(|(i, conv)| render_conversation_line(i + 1, shortener.shorten(i), conv))
        .collect::<Vec<_>>()
        .join("\n")
}
