//! Conversation repository
//!
//! Stores each user/assistant exchange so the AI responder can build a
//! bounded context window from recent history.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DbPool;
use crate::{Error, Result};

/// One user/assistant exchange
#[derive(Debug, Clone)]
pub struct ConversationEntry {
    pub id: String,
    /// What the user said
    pub user_msg: String,
    /// What the bot answered
    pub bot_msg: String,
    pub created_at: DateTime<Utc>,
}

/// Conversation repository
#[derive(Clone)]
pub struct ConversationRepo {
    pool: DbPool,
}

impl ConversationRepo {
    /// Create a new conversation repository
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append an exchange
    ///
    /// # Errors
    ///
    /// Returns error if the database operation fails
    pub fn append(&self, user_msg: &str, bot_msg: &str) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO conversations (id, user_msg, bot_msg, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            [id.as_str(), user_msg, bot_msg, now.as_str()],
        )?;
        Ok(())
    }

    /// Fetch the `n` most recent exchanges in chronological order
    ///
    /// # Errors
    ///
    /// Returns error if the database operation fails
    pub fn recent(&self, n: usize) -> Result<Vec<ConversationEntry>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT id, user_msg, bot_msg, created_at FROM conversations
             ORDER BY created_at DESC LIMIT ?1",
        )?;
        let mut entries: Vec<ConversationEntry> = stmt
            .query_map([n], |row| {
                Ok(ConversationEntry {
                    id: row.get(0)?,
                    user_msg: row.get(1)?,
                    bot_msg: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            })?
            .collect::<std::result::Result<_, _>>()?;

        // Query returns newest first; callers want chronological order
        entries.reverse();
        Ok(entries)
    }

    /// Delete all stored exchanges
    ///
    /// # Errors
    ///
    /// Returns error if the database operation fails
    pub fn clear_all(&self) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute("DELETE FROM conversations", [])?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn append_and_recent_chronological() {
        let pool = db::init_memory().unwrap();
        let repo = ConversationRepo::new(pool);

        for i in 0..3 {
            repo.append(&format!("q{i}"), &format!("a{i}")).unwrap();
            // Distinct timestamps so ordering is deterministic
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        let entries = repo.recent(5).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].user_msg, "q0");
        assert_eq!(entries[2].user_msg, "q2");
    }

    #[test]
    fn recent_respects_window() {
        let pool = db::init_memory().unwrap();
        let repo = ConversationRepo::new(pool);

        for i in 0..8 {
            repo.append(&format!("q{i}"), "a").unwrap();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        let entries = repo.recent(5).unwrap();
        assert_eq!(entries.len(), 5);
        // Oldest of the window is q3, newest is q7
        assert_eq!(entries[0].user_msg, "q3");
        assert_eq!(entries[4].user_msg, "q7");
    }

    #[test]
    fn clear_all_empties_store() {
        let pool = db::init_memory().unwrap();
        let repo = ConversationRepo::new(pool);

        repo.append("q", "a").unwrap();
        repo.clear_all().unwrap();
        assert!(repo.recent(5).unwrap().is_empty());
    }
}
