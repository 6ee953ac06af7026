//! Bearer token authentication and the `/auth` endpoints.
//!
//! Tokens are HS256 JWTs whose subject is the user's email.

use api_types::auth::{Login, SignUp, Token, UserView};
use axum::{
    Extension, Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{Duration, Utc};
use engine::{EngineError, User};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{ServerError, server::ServerState};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Signs and checks access tokens.
#[derive(Clone)]
pub(crate) struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub(crate) fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn issue(&self, email: &str) -> Result<Token, ServerError> {
        let claims = Claims {
            sub: email.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        let access_token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
                .map_err(|err| {
                    tracing::error!("failed to sign token: {err}");
                    ServerError::Generic("could not issue token".to_string())
                })?;
        Ok(Token {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Returns the token subject, or `None` if the token is invalid or expired.
    fn subject(&self, token: &str) -> Option<String> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims.sub)
            .ok()
    }
}

pub(crate) fn user_view(user: User) -> UserView {
    UserView {
        id: user.id,
        email: user.email,
        name: user.name,
        created_at: user.created_at,
    }
}

/// Resolves the bearer token into a [`User`] request extension.
pub(crate) async fn require_user(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    let Some(email) = state.tokens.subject(bearer.token()) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let user = match state.engine.user_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(StatusCode::UNAUTHORIZED),
        Err(err) => {
            tracing::error!("failed to load token user: {err}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub async fn signup(
    State(state): State<ServerState>,
    Json(payload): Json<SignUp>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let user = state
        .engine
        .sign_up(&payload.email, &payload.name, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user_view(user))))
}

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<Token>, ServerError> {
    let user = state
        .engine
        .authenticate(&payload.email, &payload.password)
        .await?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(state.tokens.issue(&user.email)?))
}

/// Issues a token for the seeded demo user without a password.
pub async fn demo_login(State(state): State<ServerState>) -> Result<Json<Token>, ServerError> {
    let user = state
        .engine
        .user_by_email(engine::DEMO_EMAIL)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("demo user not exists".to_string()))?;
    Ok(Json(state.tokens.issue(&user.email)?))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserView> {
    Json(user_view(user))
}
