//! Signed access tokens.
//!
//! Tokens are HS256 JWTs carrying the caller's identity and profile. They are
//! self-contained: there is no refresh and no revocation, expiry is the only
//! lifetime bound.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::User;
use crate::domain::{Caller, Role, UserId};

#[derive(Debug, Error)]
pub enum TokenError {
    /// Malformed, badly signed and expired tokens all end up here.
    #[error("Invalid or expired token")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Claim bundle embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub uid: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub photo_link: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: UserId::new(claims.uid),
            role: Role::from_position(&claims.position),
            username: claims.username,
            first_name: claims.first_name,
            last_name: claims.last_name,
            position: claims.position,
            photo_link: claims.photo_link,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str, ttl_minutes: u64) -> Self {
        // Saturates; `issue_at` reports an expiry that does not fit.
        let ttl = i64::try_from(ttl_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .unwrap_or(Duration::MAX);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, TokenError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry is out of range".to_string()))?;
        let claims = Claims {
            uid: user.id.value(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            position: user.position.clone(),
            photo_link: user.photo_link.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Checks the signature, then rejects the token once `now` reaches `exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against `now` below with zero leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|_| TokenError::Invalid)?;

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: UserId::new(1),
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            position: "buyer".to_string(),
            photo_link: Some("https://img.example/alice.png".to_string()),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_issue_then_verify_returns_identity() {
        let issuer = TokenIssuer::new("test-secret", 60);
        let issued = issuer.issue(&alice()).unwrap();

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.uid, 1);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.first_name, "Alice");
        assert_eq!(claims.last_name, "Liddell");
        assert_eq!(claims.position, "buyer");
        assert_eq!(
            claims.photo_link.as_deref(),
            Some("https://img.example/alice.png")
        );
        assert_eq!(claims.exp, issued.expires_at.timestamp());

        let caller = Caller::from(claims);
        assert_eq!(caller.user_id, UserId::new(1));
        assert_eq!(caller.role, Role::Staff);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", 60);
        let now = Utc::now();
        let issued = issuer.issue_at(&alice(), now).unwrap();

        assert!(issuer.verify_at(&issued.token, now + Duration::minutes(59)).is_ok());
        assert!(matches!(
            issuer.verify_at(&issued.token, issued.expires_at),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(
            issuer.verify_at(&issued.token, now + Duration::hours(2)),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_oversized_ttl_fails_instead_of_panicking() {
        let issuer = TokenIssuer::new("test-secret", 100_000_000_000_000);
        assert!(matches!(issuer.issue(&alice()), Err(TokenError::Signing(_))));

        let issuer = TokenIssuer::new("test-secret", u64::MAX);
        assert!(matches!(issuer.issue(&alice()), Err(TokenError::Signing(_))));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let issued = TokenIssuer::new("secret-a", 60).issue(&alice()).unwrap();
        let other = TokenIssuer::new("secret-b", 60);
        assert!(matches!(other.verify(&issued.token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", 60);
        assert!(matches!(issuer.verify("not.a.jwt"), Err(TokenError::Invalid)));
        assert!(matches!(issuer.verify(""), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_claim_names_on_the_wire() {
        let issuer = TokenIssuer::new("test-secret", 60);
        let issued = issuer.issue(&alice()).unwrap();
        let claims = issuer.verify(&issued.token).unwrap();

        let json = serde_json::to_value(&claims).unwrap();
        for key in ["uid", "username", "firstName", "lastName", "position", "photoLink", "exp"] {
            assert!(json.get(key).is_some(), "missing claim {key}");
        }
    }

    #[test]
    fn test_admin_position_yields_admin_role() {
        let mut user = alice();
        user.position = "admin".to_string();
        let issuer = TokenIssuer::new("test-secret", 60);
        let claims = issuer.verify(&issuer.issue(&user).unwrap().token).unwrap();
        assert!(Caller::from(claims).is_admin());
    }
}
