use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{Actor, Role};
use crate::state::AppState;

/// Claims carried by tokens from the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: usize,
}

/// Verifies HS256 bearer tokens. Tokens are issued elsewhere; this service
/// only checks them.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Actor, AppError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|err| AppError::Unauthorized(format!("invalid token: {err}")))?;

        Ok(Actor {
            id: data.claims.sub,
            role: data.claims.role,
            name: data.claims.name,
        })
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_string()))?;

        state.verifier.verify(token.trim())
    }
}

pub fn require_role(actor: &Actor, role: Role, action: &str) -> Result<(), AppError> {
    if actor.role != role {
        return Err(AppError::Forbidden(format!(
            "only {} accounts can {action}",
            role.as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    use super::{Claims, TokenVerifier};
    use crate::error::AppError;
    use crate::models::user::Role;

    fn token(secret: &str, exp_offset: Duration) -> String {
        let claims = Claims {
            sub: Uuid::from_u128(42),
            role: Role::Carrier,
            name: Some("Baltistan Haulage".to_string()),
            exp: (Utc::now() + exp_offset).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_actor() {
        let verifier = TokenVerifier::new("s3cret");
        let actor = verifier.verify(&token("s3cret", Duration::hours(1))).unwrap();

        assert_eq!(actor.id, Uuid::from_u128(42));
        assert_eq!(actor.role, Role::Carrier);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let verifier = TokenVerifier::new("s3cret");
        let result = verifier.verify(&token("other", Duration::hours(1)));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let verifier = TokenVerifier::new("s3cret");
        let result = verifier.verify(&token("s3cret", Duration::hours(-2)));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
