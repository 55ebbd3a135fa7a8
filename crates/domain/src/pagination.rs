use serde::Serialize;

/// A 1-indexed page window, already clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        let page = page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
        let limit = limit
            .unwrap_or(default_limit as i64)
            .clamp(1, max_limit as i64) as u32;
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit as u64)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage<T> {
    pub comments: Vec<T>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total_comments: u64,
}

impl<T> CommentPage<T> {
    pub fn new(comments: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            comments,
            current_page: request.page,
            total_pages: request.total_pages(total),
            total_comments: total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CommentPage<U> {
        CommentPage {
            comments: self.comments.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_comments: self.total_comments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_inputs() {
        let r = PageRequest::new(Some(0), Some(1000), 10, 100);
        assert_eq!(r, PageRequest { page: 1, limit: 100 });

        let r = PageRequest::new(None, None, 10, 100);
        assert_eq!(r, PageRequest { page: 1, limit: 10 });

        let r = PageRequest::new(Some(-3), Some(0), 10, 100);
        assert_eq!(r, PageRequest { page: 1, limit: 1 });
    }

    #[test]
    fn page_math() {
        let r = PageRequest::new(Some(3), Some(10), 10, 100);
        assert_eq!(r.offset(), 20);
        assert_eq!(r.total_pages(25), 3);
        assert_eq!(r.total_pages(30), 3);
        assert_eq!(r.total_pages(0), 0);
    }
}
