use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use actix_web::{http, HttpMessage};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::core::config::JwtAuthConfig;
use crate::core::AppError;
use crate::models::users::Role;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: String, // user ID
    pub email: String,
    pub role: Role,
    pub exp: usize, // expiration time
}

/// Signs and checks session tokens. Shared through `web::Data`.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

#[derive(Debug, Serialize, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(config: &JwtAuthConfig) -> Self {
        Self::new(
            config.secret_bytes(),
            Duration::hours(config.token_expiration_hours),
        )
    }

    pub fn issue(&self, user_id: i64, email: &str, role: Role) -> Result<IssuedSession, AppError> {
        let expires_at = Utc::now() + self.ttl;
        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            tracing::error!("Failed to generate token string: {:?}", e);
            AppError::internal_error("Failed to generate JWT token")
        })?;

        Ok(IssuedSession { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<SessionUser, AppError> {
        let claims = decode::<JwtClaims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::unauthorized("Invalid token"))?
            .claims;

        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))?;

        Ok(SessionUser {
            user_id,
            role: claims.role,
            email: claims.email,
        })
    }
}

/// Explicit session context handed to every authenticated operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub user_id: i64,
    pub role: Role,
    pub email: String,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::forbidden_error(format!(
                "Access denied. {} role required.",
                role.as_str()
            )))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_role(Role::Admin)
    }

    /// The caller acts on `user_id`'s own data, or is an admin.
    pub fn require_self_or_admin(&self, user_id: i64) -> Result<(), AppError> {
        if self.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden_error("Access denied"))
        }
    }
}

impl FromRequest for SessionUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(session) = req.extensions().get::<SessionUser>() {
            return ready(Ok(session.clone()));
        }

        let Some(keys) = req.app_data::<web::Data<SessionKeys>>() else {
            tracing::error!("SessionKeys missing from app data");
            return ready(Err(AppError::internal_error("Authentication is not configured")));
        };

        let token = req
            .headers()
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        let Some(token) = token else {
            return ready(Err(AppError::unauthorized("Invalid login credentials")));
        };

        let session = match keys.verify(&token) {
            Ok(session) => session,
            Err(e) => return ready(Err(e)),
        };

        req.extensions_mut().insert(session.clone());

        ready(Ok(session))
    }
}
