pub mod formatters;
pub mod handlers;
pub mod requests;
pub mod responses;

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feedback", post(handlers::create_feedback))
        .route("/feedback", get(handlers::list_feedback))
        .route("/feedback/{id}", get(handlers::get_feedback))
        .route("/feedback/{id}", patch(handlers::update_feedback))
        .route("/feedback/{id}", delete(handlers::delete_feedback))
        .route("/feedback/{id}/ticket", get(handlers::get_ticket_details))
}
