use chrono::{DateTime, Utc};
use domain::{Child, ChildKind, Comment};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: String,
    pub name: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub approved: bool,
    pub ip: String,
    pub reply: Option<String>,
    pub reply_date: Option<DateTime<Utc>>,
}

impl From<SqlComment> for Comment {
    fn from(sql: SqlComment) -> Self {
        Comment {
            id: sql.id,
            name: sql.name,
            content: sql.content,
            date: sql.date,
            approved: sql.approved,
            ip: sql.ip,
            reply: sql.reply,
            reply_date: sql.reply_date,
        }
    }
}

#[derive(FromRow)]
pub struct SqlFolder {
    pub id: String,
    pub name: String,
    pub note: String,
}

#[derive(FromRow)]
pub struct SqlChild {
    pub id: String,
    pub folder_id: String,
    pub kind: String,
    pub name: String,
    pub url: Option<String>,
    pub created_at: String,
}

impl From<SqlChild> for Child {
    fn from(sql: SqlChild) -> Self {
        let kind = ChildKind::parse(&sql.kind).unwrap_or(ChildKind::File);
        Child {
            id: sql.id,
            name: sql.name,
            url: if kind.is_divider() { None } else { sql.url },
            kind,
            created_at: sql.created_at,
        }
    }
}
