/*
 * Responsibility
 * - URL layout of the extension
 * - Which permission guards which route
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::handlers::{
    health::health,
    users::{create_user, list_users},
};
use crate::constants::{ADD_USER, GET_USERS};
use crate::middleware::auth::access;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/addUser",
            access::require(post(create_user), state.gate.clone(), ADD_USER),
        )
        .route(
            "/getUsers",
            access::require(get(list_users), state.gate.clone(), GET_USERS),
        )
}
