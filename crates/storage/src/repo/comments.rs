use crate::{models::SqlComment, CommentRepo, Db};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::Comment;

const COLUMNS: &str = "id, name, content, date, approved, ip, reply, reply_date";

#[async_trait]
impl CommentRepo for Db {
    async fn insert_comment(&self, c: &Comment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, name, content, date, approved, ip, reply, reply_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&c.id)
        .bind(&c.name)
        .bind(&c.content)
        .bind(c.date)
        .bind(c.approved)
        .bind(&c.ip)
        .bind(&c.reply)
        .bind(c.reply_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_comment(&self, id: &str) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(&format!(
            "SELECT {COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_comments(&self, limit: i64, offset: i64) -> anyhow::Result<(Vec<Comment>, i64)> {
        let rows = sqlx::query_as::<_, SqlComment>(&format!(
            "SELECT {COLUMNS} FROM comments ORDER BY date DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = self.count_comments().await?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn approve_comment(&self, id: &str) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(&format!(
            "UPDATE comments SET approved = TRUE WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn reply_comment(
        &self,
        id: &str,
        reply: &str,
        reply_date: DateTime<Utc>,
        content: Option<&str>,
    ) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(&format!(
            r#"
            UPDATE comments
            SET reply = $2, reply_date = $3, approved = TRUE, content = COALESCE($4, content)
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(reply)
        .bind(reply_date)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn clear_reply(&self, id: &str) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(&format!(
            "UPDATE comments SET reply = NULL, reply_date = NULL WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn edit_comment_content(
        &self,
        id: &str,
        content: &str,
    ) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(&format!(
            "UPDATE comments SET content = $2 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_comment(&self, id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_comments(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_pending(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE approved = FALSE")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_replied(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments WHERE reply IS NOT NULL AND reply <> ''",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
