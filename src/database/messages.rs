use chrono::{DateTime, Utc};

use super::{Database, Message};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, message, sent_at, is_read";

impl Database {
    pub async fn insert_message(&self, sender_id: i64, receiver_id: i64, text: &str) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO messages (sender_id, receiver_id, message, sent_at, is_read) VALUES (?, ?, ?, ?, 0)",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Messages exchanged between two users in either direction, oldest first.
    pub async fn conversation(&self, user_a: i64, user_b: i64) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE (sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?)
             ORDER BY sent_at, id"
        ))
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_all(&self.pool)
        .await
    }

    /// Marks every unread message from `sender_id` to `receiver_id` as read.
    /// Returns how many rows changed.
    pub async fn mark_read(&self, sender_id: i64, receiver_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = 1 WHERE sender_id = ? AND receiver_id = ? AND is_read = 0",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, sender_id: i64, receiver_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE sender_id = ? AND receiver_id = ? AND is_read = 0",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn messages_received_since(
        &self,
        receiver_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE receiver_id = ? AND sent_at >= ? ORDER BY id"
        ))
        .bind(receiver_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
    }
}
