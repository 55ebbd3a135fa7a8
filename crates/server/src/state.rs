use axum::extract::FromRef;
use services::{AuthService, CommentService, FileService};

#[derive(Clone)]
pub struct AppState {
    pub comments: CommentService,
    pub files: FileService,
    pub auth: AuthService,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
