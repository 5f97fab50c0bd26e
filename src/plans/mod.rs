pub mod dto;
pub mod handlers;
pub mod profile;
pub mod prompts;
pub mod repo;
pub mod services;
pub mod validate;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
