//! `/user` handlers: registration, login, profiles.

use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, AuthPrincipal};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;
use petstore_core::validation::{validate_new_user, validate_user_patch};
use petstore_core::{
    authorize, Action, BatchOutcome, CoreError, NewUser, Order, User, UserPatch, ValidationError, MAX_BATCH_USERS,
};

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

async fn find_user(state: &AppState, username: &str) -> ApiResult<User> {
    state
        .db
        .users()
        .get_by_username(username)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(username.to_string()).into())
}

/// `POST /user`
///
/// Public registration. The role is always `customer`.
pub async fn register(State(state): State<AppState>, ApiJson(mut body): ApiJson<NewUser>) -> ApiResult<Json<User>> {
    body.role = None;
    validate_new_user(&body)?;

    let hash = hash_password(&body.password)?;
    let user = state.db.users().insert(&body, &hash).await?;

    Ok(Json(user))
}

/// `POST /user/createWithList`
pub async fn create_with_list(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiJson(items): ApiJson<Vec<NewUser>>,
) -> ApiResult<Json<Vec<BatchOutcome>>> {
    authorize(&principal, Action::CreateUsers, None).into_result()?;

    if items.len() > MAX_BATCH_USERS {
        return Err(ValidationError::TooMany {
            field: "users".to_string(),
            max: MAX_BATCH_USERS,
        }
        .into());
    }

    let outcomes = state
        .db
        .users()
        .create_with_list(&items, |password| hash_password(password).map_err(|e| e.to_string()))
        .await?;

    Ok(Json(outcomes))
}

/// `GET /user/login?username=..&password=..`
///
/// Unknown user and wrong password give the same answer.
pub async fn login(State(state): State<AppState>, ApiQuery(query): ApiQuery<LoginQuery>) -> ApiResult<Response> {
    let rejected = || ApiError::Unauthenticated("Invalid username or password".to_string());

    let Some((user, hash)) = state.db.users().credentials(&query.username).await? else {
        warn!(username = %query.username, "Login for unknown user");
        return Err(rejected());
    };

    if !verify_password(&query.password, &hash) {
        warn!(user_id = user.id, "Login with wrong password");
        return Err(rejected());
    }

    let (token, expires_at) = state.jwt.issue(&user)?;
    info!(user_id = user.id, "User logged in");

    let expires_after = HeaderValue::from_str(&expires_at.to_rfc3339())
        .map_err(|e| ApiError::Internal(format!("Bad expiry header: {e}")))?;

    let body = Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_at,
        user,
    });

    Ok(([(HeaderName::from_static("x-expires-after"), expires_after)], body).into_response())
}

/// `GET /user/logout`
///
/// Tokens are stateless; clients drop theirs.
pub async fn logout() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Logged out" }))
}

/// `GET /user/{username}`
pub async fn get_user(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<Json<User>> {
    let user = find_user(&state, &username).await?;
    authorize(&principal, Action::ViewUser, Some(user.id)).into_result()?;
    Ok(Json(user))
}

/// `GET /user/{username}/orders`
pub async fn list_orders(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<Json<Vec<Order>>> {
    let user = find_user(&state, &username).await?;
    authorize(&principal, Action::ListUserOrders, Some(user.id)).into_result()?;

    let orders = state.db.orders().list_for_user(user.id).await?;
    Ok(Json(orders))
}

/// `PUT /user/{username}`
///
/// Changing `role` additionally requires admin.
pub async fn update_user(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(username): ApiPath<String>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> ApiResult<Json<User>> {
    let user = find_user(&state, &username).await?;
    authorize(&principal, Action::UpdateUser, Some(user.id)).into_result()?;

    if patch.role.is_some_and(|role| role != user.role) {
        authorize(&principal, Action::ChangeUserRole, Some(user.id)).into_result()?;
    }

    validate_user_patch(&patch)?;

    let password_hash = patch.password.as_deref().map(hash_password).transpose()?;

    let updated = state
        .db
        .users()
        .update(&user.username, &patch, password_hash.as_deref())
        .await?;

    Ok(Json(updated))
}

/// `DELETE /user/{username}`
pub async fn delete_user(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.engine.delete_user(&principal, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
