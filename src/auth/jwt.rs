use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{config::SessionConfig, state::AppState};

pub const SESSION_COOKIE: &str = "session";

/// JWT payload stored in the session cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub exp: usize,  // expires at (unix timestamp)
    pub iat: usize,  // issued at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl From<&SessionConfig> for JwtKeys {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::days(cfg.ttl_days),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from(&state.config.session)
    }
}

impl JwtKeys {
    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }

    /// `Set-Cookie` value carrying a fresh session for `user_id`.
    pub fn session_cookie(&self, user_id: Uuid) -> anyhow::Result<String> {
        let token = self.sign(user_id)?;
        let cookie = Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .path("/")
            .max_age(self.ttl)
            .build();
        Ok(cookie.to_string())
    }
}

/// `Set-Cookie` value that makes the browser drop the session.
pub fn clear_session_cookie() -> String {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(Duration::seconds(-1))
        .build()
        .to_string()
}

/// The user behind the request's session cookie, if any.
///
/// A missing, tampered or expired cookie yields an anonymous session rather
/// than a rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Session {
    pub user_id: Option<Uuid>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn from_jar(jar: &CookieJar, keys: &JwtKeys) -> Self {
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Self::anonymous();
        };
        if cookie.value().is_empty() {
            return Self::anonymous();
        }
        match keys.verify(cookie.value()) {
            Ok(claims) => Self::for_user(claims.sub),
            Err(e) => {
                warn!(error = %e, "invalid or expired session cookie");
                Self::anonymous()
            }
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(Session::from_jar(&jar, &keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from(&SessionConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_days: 365,
        })
    }

    #[test]
    fn sign_and_verify_session_token() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert!(claims.exp - claims.iat >= 364 * 24 * 3600);
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("same-secret", "good-iss", "good-aud");
        let bad_keys = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good_keys.sign(Uuid::new_v4()).expect("sign");
        assert!(bad_keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let ours = make_keys("ours", "iss", "aud");
        let theirs = make_keys("theirs", "iss", "aud");
        let token = theirs.sign(Uuid::new_v4()).expect("sign");
        assert!(ours.verify(&token).is_err());
    }

    #[test]
    fn session_cookie_is_http_only_for_a_year() {
        let keys = make_keys("s", "iss", "aud");
        let cookie = keys.session_cookie(Uuid::new_v4()).expect("cookie");
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=31536000"));
    }

    #[test]
    fn clear_cookie_uses_negative_max_age() {
        let cookie = clear_session_cookie();
        assert!(cookie.starts_with("session=;"));
        assert!(cookie.contains("Max-Age=-1"));
    }

    #[test]
    fn session_from_cookie_header() {
        let keys = make_keys("s", "iss", "aud");
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign");

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; session={token}")).unwrap(),
        );
        let session = Session::from_jar(&CookieJar::from_headers(&headers), &keys);
        assert_eq!(session.user_id, Some(user_id));

        let mut tampered = HeaderMap::new();
        tampered.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("session={token}x")).unwrap(),
        );
        let session = Session::from_jar(&CookieJar::from_headers(&tampered), &keys);
        assert_eq!(session.user_id, None);

        let session = Session::from_jar(&CookieJar::from_headers(&HeaderMap::new()), &keys);
        assert_eq!(session.user_id, None);
    }
}
