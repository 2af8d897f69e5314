use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Claims carried by a session token. Whatever else the client submitted at
/// login rides along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// HS256 signer/verifier over a single shared secret with a fixed token lifetime.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        // Login bodies may carry any registered claim name; only signature and expiry gate a token
        validation.validate_aud = false;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn issue(&self, email: &str, extra: Map<String, Value>) -> Result<String, TokenError> {
        self.issue_at(email, extra, Utc::now())
    }

    /// Issue as if the current time were `now`.
    pub fn issue_at(&self, email: &str, mut extra: Map<String, Value>, now: DateTime<Utc>) -> Result<String, TokenError> {
        for reserved in ["email", "iat", "exp"] {
            extra.remove(reserved);
        }
        let claims = Claims {
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            extra,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Check signature and expiry. Malformed input is an `Invalid` error, never a panic.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signer(secret: &str) -> TokenSigner {
        TokenSigner::new(secret.as_bytes(), Duration::days(365)).unwrap()
    }

    #[test]
    fn issue_then_verify_keeps_claims() {
        let s = signer("s3cret");
        let extra = json!({"name": "Ada", "email": "ignored@x.com"}).as_object().cloned().unwrap();
        let token = s.issue("ada@x.com", extra).unwrap();
        let claims = s.verify(&token).unwrap();
        assert_eq!(claims.email, "ada@x.com");
        assert_eq!(claims.extra.get("name"), Some(&json!("Ada")));
        assert_eq!(claims.exp - claims.iat, Duration::days(365).num_seconds());
    }

    #[test]
    fn submitted_registered_claims_do_not_block_verification() {
        let s = signer("s3cret");
        let extra = json!({"aud": "web", "iss": "frontend", "sub": "42"}).as_object().cloned().unwrap();
        let token = s.issue("aud@x.com", extra).unwrap();
        let claims = s.verify(&token).unwrap();
        assert_eq!(claims.email, "aud@x.com");
        assert_eq!(claims.extra.get("aud"), Some(&json!("web")));
        assert_eq!(claims.extra.get("sub"), Some(&json!("42")));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(TokenSigner::new(b"", Duration::days(7)), Err(TokenError::EmptySecret)));
    }

    #[test]
    fn expired_token_is_invalid() {
        let s = TokenSigner::new(b"s3cret", Duration::days(7)).unwrap();
        let token = s.issue_at("old@x.com", Map::new(), Utc::now() - Duration::days(8)).unwrap();
        assert!(matches!(s.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let token = signer("one").issue("a@x.com", Map::new()).unwrap();
        assert!(matches!(signer("two").verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn garbage_is_invalid() {
        let s = signer("s3cret");
        for t in ["", "abc", "a.b.c", "....."] {
            assert!(matches!(s.verify(t), Err(TokenError::Invalid(_))), "token {t:?}");
        }
    }
}
