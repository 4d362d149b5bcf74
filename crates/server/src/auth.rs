use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use finapp_core::{normalize_email, verify_password, SignUp, User};
use finapp_storage::ScopeFilter;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::AppState;

pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}

/// The authenticated user, inserted by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn scope_filter(&self, enforced: bool) -> ScopeFilter {
        ScopeFilter::new(enforced, self.0.scope())
    }
}

impl AuthManager {
    pub fn new(secret: &[u8], token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            token_ttl,
        }
    }

    pub fn issue_token(&self, user_id: i64) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AppError::Internal("system clock is before UNIX_EPOCH".into()))?;
        let exp = now + self.token_ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.as_secs() as usize,
            exp: exp.as_secs() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn validate_token(&self, token: &str) -> Result<i64> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            tracing::debug!(error = %err, "rejected token");
            AppError::Unauthorized
        })?;
        data.claims.sub.parse().map_err(|_| AppError::Unauthorized)
    }

    pub fn expires_in(&self) -> Duration {
        self.token_ttl
    }

    fn token_response(&self, user: User) -> Result<TokenResponse> {
        Ok(TokenResponse {
            access_token: self.issue_token(user.id)?,
            token_type: "Bearer".to_string(),
            expires_in: self.expires_in().as_secs(),
            user,
        })
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = header.splitn(2, ' ');
    let (scheme, token) = (parts.next()?, parts.next()?);
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(&request).ok_or(AppError::Unauthorized)?;
    let user_id = state.auth.validate_token(token)?;
    let user = finapp_storage::get_user(&state.pool, user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Creates the account and logs it in.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignUp>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let new_user = payload.validate()?;
    let id = finapp_storage::create_user(&state.pool, &new_user)
        .await?
        .ok_or(AppError::EmailTaken)?;
    let user = finapp_storage::get_user(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    tracing::info!(user_id = id, "user signed up");
    Ok((StatusCode::CREATED, Json(state.auth.token_response(user)?)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let email = normalize_email(&payload.email);
    let user = finapp_storage::find_user_by_email(&state.pool, &email)
        .await?
        .filter(|u| verify_password(&payload.password, &u.password_hash))
        .ok_or(AppError::InvalidCredentials)?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(state.auth.token_response(user)?))
}

pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}
