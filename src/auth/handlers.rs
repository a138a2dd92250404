use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AccessTokenResponse, LoginRequest, MessageResponse, ProtectedResponse,
            RefreshRequest, RegisterRequest, TokenPairResponse,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::is_unique_violation,
    },
    error::{ApiError, FieldErrors},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/test", get(test_auth))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/register", post(register))
        .route("/protected", get(protected))
}

pub async fn test_auth() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Auth API is working".into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    payload.username = payload.username.trim().to_string();

    let mut errors = payload.validate();

    // Only hit the store with a syntactically valid name
    if !errors.has("username") {
        match state.users.find_by_username(&payload.username).await {
            Ok(Some(_)) => {
                warn!(username = %payload.username, "username already registered");
                errors.push("username", "A user with that username already exists.");
            }
            Ok(None) => {}
            Err(e) => return Err(ApiError::Internal(e)),
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let hash = hash_password(&payload.password)?;

    let user = match state.users.create(&payload.username, &hash).await {
        Ok(u) => u,
        // A concurrent register can win the race after our lookup
        Err(e) if is_unique_violation(&e) => {
            warn!(username = %payload.username, "username already registered");
            let mut errors = FieldErrors::new();
            errors.push("username", "A user with that username already exists.");
            return Err(ApiError::Validation(errors));
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    payload.username = payload.username.trim().to_string();

    // Unknown user and bad password produce the same response
    let user = match state.users.find_by_username(&payload.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(username = %payload.username, "login unknown username");
            return Err(ApiError::auth("Invalid credentials"));
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::auth("Invalid credentials"));
    }

    let keys = JwtKeys::from_ref(&state);
    let access = keys.sign_access(user.id)?;
    let refresh = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(TokenPairResponse { access, refresh }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);

    let claims = keys.verify_refresh(&payload.refresh).map_err(|_| {
        warn!("refresh with invalid token");
        ApiError::auth("Invalid or expired token")
    })?;

    let access = keys.sign_access(claims.sub)?;

    info!(user_id = %claims.sub, "access token refreshed");
    Ok(Json(AccessTokenResponse { access }))
}

#[instrument(skip(state))]
pub async fn protected(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProtectedResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %user_id, "token subject no longer exists");
            ApiError::auth("Invalid or expired token")
        })?;

    Ok(Json(ProtectedResponse {
        message: "You are authenticated".into(),
        user: user.username,
    }))
}
