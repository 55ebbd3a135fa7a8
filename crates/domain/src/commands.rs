use serde::Deserialize;

/// Admin-side change set for a single comment, as sent by the console.
///
/// Every field is optional; the comment service decides which workflow a
/// combination maps to (approve, reply, edit, clear reply).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentUpdate {
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl CommentUpdate {
    pub fn is_empty(&self) -> bool {
        self.approved.is_none() && self.reply.is_none() && self.content.is_none()
    }
}
