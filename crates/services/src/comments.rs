use std::sync::Arc;

use chrono::Utc;
use domain::{
    validate_content, Comment, CommentPage, CommentStats, CommentUpdate, Contact, MaskRule,
    PageRequest, PublicComment,
};
use serde::Serialize;
use storage::Store;
use tracing::info;

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct CommentSettings {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Shown to visitors in place of unapproved content.
    pub placeholder: String,
    pub mask_rule: MaskRule,
}

impl Default for CommentSettings {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            placeholder: "This comment is awaiting review".to_string(),
            mask_rule: MaskRule::Narrow,
        }
    }
}

/// A page of comments in the shape the caller is allowed to see.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CommentListing {
    Admin(CommentPage<Comment>),
    Public(CommentPage<PublicComment>),
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn Store>,
    settings: CommentSettings,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>, settings: CommentSettings) -> Self {
        Self { store, settings }
    }

    pub async fn submit(&self, name: &str, content: &str, ip: &str) -> Result<Comment> {
        let content = validate_content(content).map_err(AppError::Validation)?;
        let contact = Contact::new(name).map_err(AppError::Validation)?;

        let comment = Comment::submitted(&contact, content, ip.trim().to_string());
        self.store.insert_comment(&comment).await?;

        info!(comment_id = %comment.id, ip = %comment.ip, "Comment submitted");
        Ok(comment)
    }

    /// Newest first. Visitors get masked names and placeholder content for
    /// anything not yet approved.
    pub async fn list(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
        is_admin: bool,
    ) -> Result<CommentListing> {
        let request = PageRequest::new(
            page,
            limit,
            self.settings.default_page_size,
            self.settings.max_page_size,
        );
        let (comments, total) = self
            .store
            .list_comments(request.limit as i64, request.offset() as i64)
            .await?;
        let page = CommentPage::new(comments, request, total.max(0) as u64);

        if is_admin {
            return Ok(CommentListing::Admin(page));
        }
        let rule = self.settings.mask_rule;
        let placeholder = self.settings.placeholder.as_str();
        Ok(CommentListing::Public(
            page.map(|c| c.to_public(rule, placeholder)),
        ))
    }

    pub async fn get(&self, id: &str) -> Result<Comment> {
        self.store
            .get_comment(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn approve(&self, id: &str) -> Result<Comment> {
        let comment = self
            .store
            .approve_comment(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        info!(comment_id = %id, "Comment approved");
        Ok(comment)
    }

    /// Saves an admin reply. Replying always publishes the comment.
    pub async fn reply(
        &self,
        id: &str,
        reply_text: &str,
        edited_content: Option<&str>,
    ) -> Result<Comment> {
        let reply_text = reply_text.trim();
        if reply_text.is_empty() {
            return Err(AppError::Validation("Reply must not be empty.".to_string()));
        }

        let current = self.get(id).await?;
        let content = match edited_content.map(str::trim) {
            Some(edited) if edited != current.content => {
                Some(validate_content(edited).map_err(AppError::Validation)?)
            }
            _ => None,
        };

        let comment = self
            .store
            .reply_comment(id, reply_text, Utc::now(), content.as_deref())
            .await?
            .ok_or_else(|| not_found(id))?;
        info!(comment_id = %id, content_edited = content.is_some(), "Comment replied");
        Ok(comment)
    }

    /// Applies an admin change set.
    ///
    /// A non-empty `reply` runs the reply workflow (with `content` as the
    /// edited body). An empty `reply` clears the reply. `approved: false` on a
    /// published comment is rejected; there is no unpublish.
    pub async fn update(&self, id: &str, update: CommentUpdate) -> Result<Comment> {
        if update.is_empty() {
            return Err(AppError::Validation("Nothing to update.".to_string()));
        }

        let mut current = self.get(id).await?;
        if update.approved == Some(false) && current.approved {
            return Err(AppError::Validation(
                "Approved comments cannot be unpublished.".to_string(),
            ));
        }

        let content = match update.content.as_deref().map(str::trim) {
            Some(edited) if edited != current.content => {
                Some(validate_content(edited).map_err(AppError::Validation)?)
            }
            _ => None,
        };

        match update.reply.as_deref().map(str::trim) {
            Some(reply) if !reply.is_empty() => {
                return self.reply(id, reply, content.as_deref()).await;
            }
            Some(_) if current.reply.is_some() => {
                current = self
                    .store
                    .clear_reply(id)
                    .await?
                    .ok_or_else(|| not_found(id))?;
                info!(comment_id = %id, "Comment reply cleared");
            }
            _ => {}
        }

        if let Some(content) = content {
            current = self
                .store
                .edit_comment_content(id, &content)
                .await?
                .ok_or_else(|| not_found(id))?;
            info!(comment_id = %id, "Comment content edited");
        }

        if update.approved == Some(true) && !current.approved {
            current = self.approve(id).await?;
        }
        Ok(current)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.store.delete_comment(id).await? {
            return Err(not_found(id));
        }
        info!(comment_id = %id, "Comment deleted");
        Ok(())
    }

    pub async fn count_pending(&self) -> Result<u64> {
        Ok(self.store.count_pending().await?.max(0) as u64)
    }

    pub async fn count_replied(&self) -> Result<u64> {
        Ok(self.store.count_replied().await?.max(0) as u64)
    }

    pub async fn stats(&self) -> Result<CommentStats> {
        Ok(CommentStats {
            total: self.store.count_comments().await?.max(0) as u64,
            pending: self.count_pending().await?,
            replied: self.count_replied().await?,
        })
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("comment {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::MemoryDb;

    fn service() -> CommentService {
        CommentService::new(Arc::new(MemoryDb::new()), CommentSettings::default())
    }

    fn public(listing: CommentListing) -> CommentPage<PublicComment> {
        match listing {
            CommentListing::Public(page) => page,
            CommentListing::Admin(_) => panic!("expected public listing"),
        }
    }

    fn admin(listing: CommentListing) -> CommentPage<Comment> {
        match listing {
            CommentListing::Admin(page) => page,
            CommentListing::Public(_) => panic!("expected admin listing"),
        }
    }

    #[tokio::test]
    async fn submit_validates_and_stores_unapproved() {
        let svc = service();

        let c = svc.submit("QQ:123456", "hello world", "10.0.0.1").await.unwrap();
        assert!(!c.approved);
        assert!(!c.id.is_empty());
        assert!(c.reply.is_none());

        let other = svc.submit("QQ:654321", "second one", "10.0.0.2").await.unwrap();
        assert_ne!(c.id, other.id);

        for (name, content) in [
            ("QQ:123456", "abc"),
            ("QQ:12345x", "hello world"),
            ("WeChat:abc", "hello world"),
        ] {
            let err = svc.submit(name, content, "1.1.1.1").await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{name} {content}");
        }
        assert_eq!(svc.stats().await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn approve_then_public_listing_shows_content() {
        let svc = service();
        let c = svc.submit("QQ:123456", "hello world", "10.0.0.1").await.unwrap();

        let page = public(svc.list(None, None, false).await.unwrap());
        assert_eq!(page.comments[0].content, CommentSettings::default().placeholder);
        assert_eq!(page.comments[0].name, "QQ: 12**56");

        let approved = svc.approve(&c.id).await.unwrap();
        assert!(approved.approved);
        assert!(approved.reply.is_none());

        let page = public(svc.list(None, None, false).await.unwrap());
        assert_eq!(page.comments[0].content, "hello world");
        assert_eq!(page.comments[0].name, "QQ: 12**56");

        let page = admin(svc.list(None, None, true).await.unwrap());
        assert_eq!(page.comments[0].name, "QQ:123456");
        assert_eq!(page.comments[0].ip, "10.0.0.1");
    }

    #[tokio::test]
    async fn public_listing_omits_ip() {
        let svc = service();
        svc.submit("Email:alice@example.com", "hello world", "10.0.0.1")
            .await
            .unwrap();

        let json = serde_json::to_value(svc.list(None, None, false).await.unwrap()).unwrap();
        let first = &json["comments"][0];
        assert!(first.get("ip").is_none());
        assert_eq!(first["name"], "Email: al**ce@example.com");
        assert_eq!(json["totalComments"], 1);
        assert_eq!(json["currentPage"], 1);
    }

    #[tokio::test]
    async fn reply_publishes_and_keeps_ip() {
        let svc = service();
        let c = svc.submit("QQ:123456", "hello world", "10.0.0.1").await.unwrap();

        let replied = svc.reply(&c.id, "hello", None).await.unwrap();
        assert!(replied.approved);
        assert!(replied.reply_date.is_some());
        assert_eq!(replied.reply.as_deref(), Some("hello"));
        assert_eq!(replied.ip, "10.0.0.1");
        assert_eq!(replied.content, "hello world");

        let edited = svc
            .reply(&c.id, "hello again", Some("hello edited world"))
            .await
            .unwrap();
        assert_eq!(edited.content, "hello edited world");
        assert_eq!(edited.ip, "10.0.0.1");

        assert!(matches!(
            svc.reply(&c.id, "   ", None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            svc.reply("missing", "hi", None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn both_reply_paths_converge() {
        let svc = service();
        let direct = svc.submit("QQ:111111", "direct path", "1.1.1.1").await.unwrap();
        let staged = svc.submit("QQ:222222", "staged path", "2.2.2.2").await.unwrap();

        let direct = svc.reply(&direct.id, "ok", None).await.unwrap();
        svc.approve(&staged.id).await.unwrap();
        let staged = svc.reply(&staged.id, "ok", None).await.unwrap();

        for c in [&direct, &staged] {
            assert!(c.approved);
            assert_eq!(c.reply.as_deref(), Some("ok"));
            assert!(c.reply_date.is_some());
        }
        assert_eq!(direct.ip, "1.1.1.1");
        assert_eq!(staged.ip, "2.2.2.2");
    }

    #[tokio::test]
    async fn update_dispatches_workflows() {
        let svc = service();
        let c = svc.submit("QQ:123456", "hello world", "10.0.0.1").await.unwrap();

        assert!(matches!(
            svc.update(&c.id, CommentUpdate::default()).await,
            Err(AppError::Validation(_))
        ));

        let approved = svc
            .update(
                &c.id,
                CommentUpdate {
                    approved: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(approved.approved);

        let unpublish = svc
            .update(
                &c.id,
                CommentUpdate {
                    approved: Some(false),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(unpublish, Err(AppError::Validation(_))));

        let replied = svc
            .update(
                &c.id,
                CommentUpdate {
                    reply: Some("thanks".into()),
                    content: Some("hello there".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(replied.reply.as_deref(), Some("thanks"));
        assert_eq!(replied.content, "hello there");

        let cleared = svc
            .update(
                &c.id,
                CommentUpdate {
                    reply: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.reply.is_none());
        assert!(cleared.reply_date.is_none());
        assert!(cleared.approved);
        assert_eq!(svc.count_replied().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejected_update_leaves_comment_untouched() {
        let svc = service();
        let c = svc.submit("QQ:123456", "hello world", "10.0.0.1").await.unwrap();
        svc.reply(&c.id, "thanks", None).await.unwrap();

        let result = svc
            .update(
                &c.id,
                CommentUpdate {
                    reply: Some(String::new()),
                    content: Some("ab".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let stored = svc.get(&c.id).await.unwrap();
        assert_eq!(stored.reply.as_deref(), Some("thanks"));
        assert!(stored.reply_date.is_some());
        assert_eq!(stored.content, "hello world");
    }

    #[tokio::test]
    async fn pagination_over_25_comments() {
        let svc = service();
        for i in 0..25 {
            svc.submit("QQ:123456", &format!("comment number {i}"), "1.1.1.1")
                .await
                .unwrap();
        }

        let page = admin(svc.list(Some(3), Some(10), true).await.unwrap());
        assert_eq!(page.comments.len(), 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_comments, 25);
        assert_eq!(page.current_page, 3);

        let first = admin(svc.list(Some(1), Some(10), true).await.unwrap());
        let dates: Vec<_> = first.comments.iter().map(|c| c.date).collect();
        assert!(dates.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn counts_and_delete() {
        let svc = service();
        let a = svc.submit("QQ:111111", "first comment", "1.1.1.1").await.unwrap();
        let b = svc.submit("QQ:222222", "second comment", "1.1.1.1").await.unwrap();
        svc.submit("QQ:333333", "third comment", "1.1.1.1").await.unwrap();

        svc.approve(&a.id).await.unwrap();
        svc.reply(&b.id, "noted", None).await.unwrap();

        let stats = svc.stats().await.unwrap();
        assert_eq!(stats, CommentStats { total: 3, pending: 1, replied: 1 });

        svc.delete(&a.id).await.unwrap();
        assert!(matches!(svc.delete(&a.id).await, Err(AppError::NotFound(_))));
        assert_eq!(svc.stats().await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_lose_updates() {
        let svc = service();
        let mut ids = Vec::new();
        for i in 0..20 {
            let c = svc
                .submit("QQ:123456", &format!("concurrent {i}"), "1.1.1.1")
                .await
                .unwrap();
            ids.push(c.id);
        }

        let tasks: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let svc = svc.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        svc.approve(&id).await.map(|_| ())
                    } else {
                        svc.reply(&id, "reply", None).await.map(|_| ())
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(svc.count_pending().await.unwrap(), 0);
        assert_eq!(svc.count_replied().await.unwrap(), 10);
    }
}
