use time::{Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        password::{generate_reset_token, hash_password, is_strong_password, is_valid_email, verify_password},
        repo_types::{NewUser, User},
    },
    error::{ApiError, ApiResult},
    mailer::MailMessage,
    state::AppState,
};

/// How long a password reset token stays valid.
pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub username: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub invite_code: Option<String>,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[instrument(skip(state, input), fields(email = %input.email, username = %input.username))]
pub async fn register(state: &AppState, input: Registration) -> ApiResult<User> {
    let email = normalize_email(&input.email);
    let username = input.username.trim().to_string();

    let invitation = if state.config.enable_invite_code {
        let code = non_blank(input.invite_code)
            .ok_or_else(|| ApiError::forbidden("invite code required"))?;
        let invitation = state
            .store
            .find_invitation(&email, &code)
            .await?
            .ok_or_else(|| {
                warn!("invalid invite code");
                ApiError::forbidden("invalid invite code")
            })?;
        if invitation.used_at.is_some() {
            warn!(invitation_id = %invitation.id, "invitation already used");
            return Err(ApiError::forbidden("invitation already used"));
        }
        Some(invitation)
    } else {
        None
    };

    if !is_valid_email(&email) {
        warn!("invalid email");
        return Err(ApiError::user_input("INVALID_EMAIL"));
    }
    if username.is_empty() {
        return Err(ApiError::user_input("USERNAME_REQUIRED"));
    }

    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!("email already registered");
        return Err(ApiError::user_input("EMAIL_TAKEN"));
    }
    if state.store.find_user_by_username(&username).await?.is_some() {
        warn!("username already registered");
        return Err(ApiError::user_input("USERNAME_TAKEN"));
    }

    if !is_strong_password(&input.password) {
        warn!("weak password");
        return Err(ApiError::user_input("PASSWORD_WEAK"));
    }

    let password_hash = hash_password(&input.password)?;
    let user = state
        .store
        .create_user(NewUser {
            email,
            username,
            firstname: non_blank(input.firstname),
            lastname: non_blank(input.lastname),
            password_hash,
        })
        .await?;

    if let Some(invitation) = invitation {
        state
            .store
            .mark_invitation_used(invitation.id, OffsetDateTime::now_utc())
            .await?;
    }

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

#[instrument(skip(state, password))]
pub async fn login(state: &AppState, email: &str, password: &str) -> ApiResult<User> {
    let email = normalize_email(email);
    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(ApiError::user_input("INVALID_CREDENTIALS"));
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::user_input("INVALID_CREDENTIALS"));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

/// Stores a reset token for `email` and mails it. `false` when the address is
/// unknown or the mail could not be sent.
#[instrument(skip(state))]
pub async fn request_password_reset(state: &AppState, email: &str) -> ApiResult<bool> {
    let email = normalize_email(email);
    let Some(user) = state.store.find_user_by_email(&email).await? else {
        info!("password reset requested for unknown email");
        return Ok(false);
    };

    let token = generate_reset_token();
    let expiry = OffsetDateTime::now_utc() + RESET_TOKEN_TTL;
    state.store.set_reset_token(user.id, &token, expiry).await?;

    let message = MailMessage {
        to: user.email.clone(),
        reply_to: None,
        subject: "Réinitialisation de votre mot de passe".into(),
        body: format!("Votre code de réinitialisation : {token}\nIl expire dans une heure."),
    };
    if let Err(e) = state.mailer.send(message).await {
        error!(error = %e, user_id = %user.id, "send password reset mail failed");
        return Ok(false);
    }

    info!(user_id = %user.id, "password reset requested");
    Ok(true)
}

#[instrument(skip_all)]
pub async fn reset_password(
    state: &AppState,
    token: &str,
    password: &str,
    password_confirmation: &str,
) -> ApiResult<User> {
    if password != password_confirmation {
        return Err(ApiError::user_input("Password do not match"));
    }
    if !is_strong_password(password) {
        return Err(ApiError::user_input("PASSWORD_WEAK"));
    }

    let user = state
        .store
        .find_user_by_reset_token(token, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| {
            warn!("invalid or expired reset token");
            ApiError::user_input("Invalid or expired token")
        })?;

    let password_hash = hash_password(password)?;
    let user = state.store.update_password(user.id, &password_hash).await?;
    info!(user_id = %user.id, "password reset");
    Ok(user)
}

/// The session user, if it still exists.
pub async fn current_user(state: &AppState, user_id: Option<Uuid>) -> ApiResult<Option<User>> {
    match user_id {
        Some(id) => Ok(state.store.find_user_by_id(id).await?),
        None => Ok(None),
    }
}

/// Like [`current_user`] but fails with `LOGIN_REQUIRED`.
pub async fn require_user(state: &AppState, user_id: Option<Uuid>) -> ApiResult<User> {
    current_user(state, user_id)
        .await?
        .ok_or_else(ApiError::login_required)
}
