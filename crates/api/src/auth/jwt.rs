//! Bearer token verification.
//!
//! Tokens are HS256 JWTs minted by the identity service that owns login.
//! They carry only the user id; roles are per-masjid and are loaded from the
//! database for the masjid being acted on. [`generate_access_token`] exists
//! for operator tooling and tests.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use masjid_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Token subject {0} is not a user id")]
    InvalidSubject(DbId),
}

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Lifetime of tokens minted by [`generate_access_token`].
    pub access_token_expiry_mins: i64,
    /// When set, tokens must carry this `iss` claim.
    pub issuer: Option<String>,
}

impl JwtConfig {
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `JWT_SECRET`             | yes      |         |
    /// | `JWT_ACCESS_EXPIRY_MINS` | no       | `15`    |
    /// | `JWT_ISSUER`             | no       | unset   |
    ///
    /// # Panics
    ///
    /// If `JWT_SECRET` is missing or empty, or the expiry is not an integer.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set and non-empty");

        let access_token_expiry_mins = match std::env::var("JWT_ACCESS_EXPIRY_MINS") {
            Ok(raw) => raw
                .parse()
                .expect("JWT_ACCESS_EXPIRY_MINS must be a whole number of minutes"),
            Err(_) => DEFAULT_ACCESS_EXPIRY_MINS,
        };

        let issuer = std::env::var("JWT_ISSUER")
            .ok()
            .filter(|iss| !iss.trim().is_empty());

        Self {
            secret,
            access_token_expiry_mins,
            issuer,
        }
    }

    fn validation(&self) -> Validation {
        // HS256, `exp` required, 60s leeway. `sub` is numeric, so it is
        // checked after decoding rather than as a registered claim.
        let mut validation = Validation::default();
        if let Some(issuer) = &self.issuer {
            // `set_issuer` alone lets a token without `iss` through.
            validation.set_required_spec_claims(&["exp", "iss"]);
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}

/// Mint a token for `user_id`, stamped with the configured issuer.
pub fn generate_access_token(
    user_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let iat = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        exp: iat + config.access_token_expiry_mins * 60,
        iat,
        jti: Uuid::new_v4().to_string(),
        iss: config.issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, expiry and issuer, then check the subject is usable.
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims, TokenError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &config.validation(),
    )?
    .claims;

    if claims.sub <= 0 {
        return Err(TokenError::InvalidSubject(claims.sub));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config(issuer: Option<&str>) -> JwtConfig {
        JwtConfig {
            secret: "masjid-test-secret-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            issuer: issuer.map(String::from),
        }
    }

    fn sign(claims: &Claims, config: &JwtConfig) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims_for(sub: DbId, exp_offset_secs: i64) -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub,
            exp: now + exp_offset_secs,
            iat: now,
            jti: Uuid::new_v4().to_string(),
            iss: None,
        }
    }

    #[test]
    fn minted_token_round_trips_subject() {
        let config = config(None);
        let token = generate_access_token(42, &config).unwrap();

        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn token_expired_past_leeway_is_rejected() {
        let config = config(None);
        let token = sign(&claims_for(1, -300), &config);

        assert_matches!(validate_token(&token, &config), Err(TokenError::Jwt(_)));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let mut other = config(None);
        other.secret = "a-different-secret".to_string();
        let token = generate_access_token(1, &other).unwrap();

        assert!(validate_token(&token, &config(None)).is_err());
    }

    #[test]
    fn non_positive_subject_is_rejected() {
        let config = config(None);
        let token = sign(&claims_for(0, 600), &config);

        assert_matches!(
            validate_token(&token, &config),
            Err(TokenError::InvalidSubject(0))
        );
    }

    #[test]
    fn issuer_is_enforced_when_configured() {
        let strict = config(Some("masjid-identity"));

        let foreign = generate_access_token(7, &config(Some("someone-else"))).unwrap();
        assert!(validate_token(&foreign, &strict).is_err());

        let unstamped = generate_access_token(7, &config(None)).unwrap();
        assert_matches!(validate_token(&unstamped, &strict), Err(TokenError::Jwt(_)));

        let ours = generate_access_token(7, &strict).unwrap();
        assert_eq!(validate_token(&ours, &strict).unwrap().iss.as_deref(), Some("masjid-identity"));
    }

    #[test]
    fn hand_signed_token_without_issuer_is_rejected_when_issuer_configured() {
        let strict = config(Some("masjid-identity"));
        let token = sign(&claims_for(7, 600), &strict);

        assert_matches!(validate_token(&token, &strict), Err(TokenError::Jwt(_)));
    }

    #[test]
    fn issuer_is_optional_when_not_configured() {
        let lenient = config(None);
        let stamped = generate_access_token(7, &config(Some("masjid-identity"))).unwrap();

        assert_eq!(validate_token(&stamped, &lenient).unwrap().sub, 7);
    }
}
