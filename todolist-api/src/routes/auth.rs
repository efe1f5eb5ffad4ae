/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Register a pending account and email its code
/// - `POST /v1/auth/login` - Exchange credentials for a bearer token
/// - `POST /v1/auth/verify` - Redeem a verification code
/// - `POST /v1/auth/resend` - Email a fresh code

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use todolist_shared::{error::DomainError, models::UserProjection};
use validator::{Validate, ValidationError};

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 255, message = "Username must be 1-255 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,

    /// Seconds until the token expires
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(
        length(equal = 6, message = "Verification code must be 6 digits"),
        custom(function = "validate_code_digits")
    )]
    pub verification_code: String,
}

fn validate_code_digits(code: &str) -> Result<(), ValidationError> {
    if code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("digits");
        error.message = Some("Verification code must be 6 digits".into());
        Err(error)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResendRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new, not yet verified account
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/signup
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "password123"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the user projection.
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
/// - `503 Service Unavailable`: Verification email could not be sent
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<UserProjection>)> {
    req.validate()?;

    let user = state
        .authenticator
        .signup(&req.username, &req.email, &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user.projection())))
}

/// Login with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
/// - `403 Forbidden`: Account not verified yet
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = state
        .authenticator
        .authenticate(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            // Don't reveal which emails exist
            DomainError::UserNotFound(_) => DomainError::InvalidCredentials.into(),
            other => ApiError::from(other),
        })?;

    let issued = state.tokens.issue(&user)?;

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_in: issued.expires_in,
    }))
}

/// Redeem a verification code and enable the account
///
/// # Errors
///
/// - `400 Bad Request`: Unknown, expired or already used code
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state.verification.verify(&req.verification_code).await?;

    Ok(Json(MessageResponse {
        message: "Account verified successfully".to_string(),
    }))
}

/// Email a fresh verification code, replacing the previous one
///
/// # Errors
///
/// - `400 Bad Request`: Account already verified
/// - `404 Not Found`: Unknown email
/// - `503 Service Unavailable`: Email could not be sent; the old code stays valid
pub async fn resend(
    State(state): State<AppState>,
    Json(req): Json<ResendRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state.verification.resend(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "Verification code sent".to_string(),
    }))
}
