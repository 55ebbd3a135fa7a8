use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        OnceLock,
    },
};

use crate::masking::{mask, MaskRule};

/// Contact types the public form offers. Storage does not enforce them.
pub const QQ: &str = "QQ";

const ID_SUFFIX_SPACE: u32 = 1_000_000;

static ID_SEQ: AtomicU32 = AtomicU32::new(0);
static ID_BASE: OnceLock<u32> = OnceLock::new();

/// Generates an opaque, timestamp-derived identifier.
///
/// The 6-digit suffix is a per-process sequence from a random start, so ids
/// minted in the same millisecond by one process never collide.
pub fn new_id() -> String {
    let base = *ID_BASE.get_or_init(|| rand::thread_rng().gen_range(0..ID_SUFFIX_SPACE));
    let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed) % ID_SUFFIX_SPACE;
    let suffix = (base + seq) % ID_SUFFIX_SPACE;
    format!("{}{:06}", Utc::now().timestamp_millis(), suffix)
}

/// Trims and checks a comment body. The trimmed body must be longer than 3 chars.
pub fn validate_content(content: &str) -> Result<String, String> {
    let trimmed = content.trim();
    if trimmed.chars().count() <= 3 {
        return Err("Comment content must be longer than 3 characters.".to_string());
    }
    Ok(trimmed.to_string())
}

/// The `"<contact-type>:<contact-value>"` composite stored in `Comment::name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    kind: Option<String>,
    value: String,
}

impl Contact {
    /// Splits a stored name without validating it.
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((kind, value)) if !kind.trim().is_empty() => Self {
                kind: Some(kind.trim().to_string()),
                value: value.trim().to_string(),
            },
            _ => Self {
                kind: None,
                value: name.trim().to_string(),
            },
        }
    }

    /// Parses a submitted name, applying the public-form rules.
    pub fn new(name: &str) -> Result<Self, String> {
        let contact = Self::parse(name);
        if contact.value.chars().count() <= 5 {
            return Err("Contact must be longer than 5 characters.".to_string());
        }
        if contact.is_qq() && !contact.value.chars().all(|c| c.is_ascii_digit()) {
            return Err("QQ number may only contain digits.".to_string());
        }
        Ok(contact)
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn is_qq(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|k| k.eq_ignore_ascii_case(QQ))
    }

    /// Display form for anonymous viewers, e.g. `QQ: 12**56`.
    pub fn masked(&self, rule: MaskRule) -> String {
        let value = mask(&self.value, rule);
        match &self.kind {
            Some(kind) => format!("{}: {}", kind, value),
            None => value,
        }
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{}:{}", kind, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub name: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub approved: bool,
    pub ip: String,
    pub reply: Option<String>,
    pub reply_date: Option<DateTime<Utc>>,
}

impl Comment {
    /// A fresh, unapproved submission.
    pub fn submitted(contact: &Contact, content: String, ip: String) -> Self {
        Self {
            id: new_id(),
            name: contact.to_string(),
            content,
            date: Utc::now(),
            approved: false,
            ip,
            reply: None,
            reply_date: None,
        }
    }

    pub fn is_replied(&self) -> bool {
        self.reply.as_deref().is_some_and(|r| !r.is_empty())
    }

    /// Redacted projection shown to visitors without an admin token.
    pub fn to_public(&self, rule: MaskRule, placeholder: &str) -> PublicComment {
        PublicComment {
            id: self.id.clone(),
            name: Contact::parse(&self.name).masked(rule),
            content: if self.approved {
                self.content.clone()
            } else {
                placeholder.to_string()
            },
            date: self.date,
            approved: self.approved,
            reply: self.reply.clone(),
            reply_date: self.reply_date,
        }
    }
}

/// Public listing entry. Carries no submitter address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicComment {
    pub id: String,
    pub name: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub approved: bool,
    pub reply: Option<String>,
    pub reply_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentStats {
    pub total: u64,
    pub pending: u64,
    pub replied: u64,
}
