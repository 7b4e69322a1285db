use crate::{db::DbPool, token::TokenKeys};

/// Shared application state, constructed once in the entry point and cloned
/// into each handler. Components receive it by reference instead of reaching
/// for globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub tokens: TokenKeys,
}
