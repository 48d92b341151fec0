/*
 * Responsibility
 * - POST /addUser and GET /getUsers
 * - Authorization already happened in the route guard; handlers only see
 *   permitted requests
 * - Json / Query rejections are turned into `{"error": ...}` 400s here
 */
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    api::dto::users::{CreateUserRequest, ListUsersQuery, UserRepresentation},
    constants::{USER_NOT_FOUND, USERNAME_PASSWORD_REQUIRED},
    error::{AppError, ErrorResponse},
    repos::NewUser,
    state::AppState,
};

async fn user_exists(
    state: &AppState,
    username: &str,
    email: Option<&str>,
) -> Result<bool, AppError> {
    if state
        .users
        .find_by_username(&state.realm, username)
        .await?
        .is_some()
    {
        return Ok(true);
    }

    match email {
        Some(email) => Ok(state
            .users
            .find_by_email(&state.realm, email)
            .await?
            .is_some()),
        None => Ok(false),
    }
}

async fn hash_password(state: &AppState, password: String) -> Result<String, AppError> {
    // Argon2 is CPU bound; keep it off the async workers
    let hasher = state.credentials.clone();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing task failed");
            AppError::Internal
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "cannot hash password");
            AppError::Internal
        })
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRepresentation>), AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    req.validate().map_err(AppError::bad_request)?;

    let username = req
        .normalized_username()
        .ok_or_else(|| AppError::bad_request(USERNAME_PASSWORD_REQUIRED))?;
    let email = req.normalized_email();

    if user_exists(&state, &username, email.as_deref()).await? {
        tracing::info!(realm = %state.realm, username = %username, "user already exists");
        return Err(AppError::Conflict);
    }

    let new_user = NewUser {
        first_name: req.first_name(),
        last_name: req.last_name(),
        enabled: req.enabled.unwrap_or(false),
        username,
        email,
        password_hash: hash_password(&state, req.password.unwrap_or_default()).await?,
    };

    // The store re-checks uniqueness; a racing duplicate lands here as Conflict.
    let user = state.users.create(&state.realm, new_user).await?;

    tracing::info!(
        realm = %state.realm,
        user_id = %user.id,
        username = %user.username,
        created_at = %user.created_at,
        backend = state.users.backend_name(),
        "user created"
    );

    Ok((StatusCode::CREATED, Json(UserRepresentation::from(user))))
}

pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let search = query.to_user_query().map_err(AppError::bad_request)?;

    let users: Vec<UserRepresentation> = state
        .users
        .search(&state.realm, &search)
        .await?
        .into_iter()
        .map(UserRepresentation::from)
        .collect();

    if users.is_empty() {
        tracing::info!(realm = %state.realm, filter = ?search.username, "users list is empty");
        return Ok((StatusCode::NO_CONTENT, Json(ErrorResponse::new(USER_NOT_FOUND))).into_response());
    }

    Ok((StatusCode::OK, Json(users)).into_response())
}
