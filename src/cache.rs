//! SQLite snapshot of the last conversation listing.
//!
//! `list` prints short aliases; later commands accept those aliases back, so
//! the listing they were computed over is kept here.

use rusqlite::{params, Connection};
use std::path::Path;

use crate::chat::alias::{parse_alias, AliasShortener};
use crate::chat::types::{ConversationId, ConversationInfo};
use crate::config::get_home_dir;
use crate::error::{Error, Result};

pub struct InboxCache {
    conn: Connection,
}

type Row = (String, String, Option<String>, String, String, String);

impl InboxCache {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS listing (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL,
                tlf_name TEXT NOT NULL,
                topic_name TEXT,
                topic_type TEXT NOT NULL,
                visibility TEXT NOT NULL,
                members_type TEXT NOT NULL,
                recorded_at INTEGER NOT NULL
            );
            "#,
        )?;
        tracing::debug!("opened inbox cache at {}", path.display());
        Ok(Self { conn })
    }

    /// Cache under the chatctl home directory.
    pub fn open_default() -> Result<Self> {
        Self::open(&get_home_dir()?.join("inbox.db"))
    }

    /// Replace the stored listing with `convs`, keeping their order.
    pub fn record(&mut self, convs: &[ConversationInfo]) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM listing", [])?;
        for (position, info) in convs.iter().enumerate() {
            tx.execute(
                "INSERT INTO listing (position, id, tlf_name, topic_name, topic_type, visibility, members_type, recorded_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    position as i64,
                    info.id.to_string(),
                    info.tlf_name,
                    info.topic_name,
                    info.topic_type.as_str(),
                    info.visibility.as_str(),
                    info.members_type.as_str(),
                    now,
                ],
            )?;
        }
        tx.commit()?;
        tracing::debug!("recorded {} conversation(s) in inbox cache", convs.len());
        Ok(())
    }

    /// The stored listing, in listing order.
    pub fn load(&self) -> Result<Vec<ConversationInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tlf_name, topic_name, topic_type, visibility, members_type \
             FROM listing ORDER BY position",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<Row>>>()?;

        rows.into_iter().map(decode_row).collect()
    }

    /// Conversation the alias points at in the stored listing.
    pub fn expand(&self, alias: &str, min_bytes: usize) -> Result<Option<ConversationInfo>> {
        let alias = parse_alias(alias)?;
        let mut listing = self.load()?;
        let ids: Vec<ConversationId> = listing.iter().map(|c| c.id.clone()).collect();
        let shortener = AliasShortener::try_new(&ids, min_bytes)?;
        Ok(shortener.find(&alias).map(|i| listing.swap_remove(i)))
    }
}

fn decode_row(row: Row) -> Result<ConversationInfo> {
    let (id, tlf_name, topic_name, topic_type, visibility, members_type) = row;
    let corrupt = |e: Error| Error::Cache(format!("corrupt listing row for {}: {}", id, e));
    Ok(ConversationInfo {
        id: id.parse().map_err(corrupt)?,
        tlf_name,
        topic_name,
        topic_type: topic_type.parse().map_err(corrupt)?,
        visibility: visibility.parse().map_err(corrupt)?,
        members_type: members_type.parse().map_err(corrupt)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::{MembersType, TopicType, Visibility};
    use tempfile::TempDir;

    fn info(id: &str, topic: Option<&str>) -> ConversationInfo {
        ConversationInfo {
            id: id.parse().unwrap(),
            tlf_name: "acme".to_string(),
            topic_name: topic.map(|t| t.to_string()),
            topic_type: TopicType::Chat,
            visibility: Visibility::Private,
            members_type: MembersType::Team,
        }
    }

    #[test]
    fn test_record_and_load_keeps_order() {
        let dir = TempDir::new().unwrap();
        let mut cache = InboxCache::open(&dir.path().join("nested").join("inbox.db")).unwrap();

        let listing = vec![
            info("00000300000000000000", Some("ops")),
            info("00000100000000000000", None),
        ];
        cache.record(&listing).unwrap();
        assert_eq!(cache.load().unwrap(), listing);

        // a new listing replaces the old one
        cache.record(&listing[1..]).unwrap();
        assert_eq!(cache.load().unwrap(), listing[1..].to_vec());
    }

    #[test]
    fn test_expand_alias() {
        let dir = TempDir::new().unwrap();
        let mut cache = InboxCache::open(&dir.path().join("inbox.db")).unwrap();
        cache
            .record(&[
                info("00000100000000000000", Some("general")),
                info("00000200000000000000", Some("random")),
            ])
            .unwrap();

        let found = cache.expand(":0200", 2).unwrap().unwrap();
        assert_eq!(found.topic_name.as_deref(), Some("random"));
        assert!(cache.expand(":0300", 2).unwrap().is_none());
        assert!(matches!(
            cache.expand("0200", 2),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_corrupt_row() {
        let dir = TempDir::new().unwrap();
        let cache = InboxCache::open(&dir.path().join("inbox.db")).unwrap();
        cache
            .conn
            .execute(
                "INSERT INTO listing VALUES (0, '0000ab', 'acme', NULL, 'video', 'private', 'team', 0)",
                [],
            )
            .unwrap();
        assert!(matches!(cache.load(), Err(Error::Cache(_))));
    }
}
