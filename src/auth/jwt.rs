//! JWT Token Service
//! Mission: Issue, validate, and revoke signed tokens against the audit ledger

use crate::auth::models::Claims;
use crate::auth::token_ledger::TokenLedger;
use crate::auth::user_store::UserStore;
use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::debug;

/// Token operation failures surfaced to the API boundary
#[derive(Debug)]
pub enum TokenError {
    /// The token subject does not resolve to a stored user.
    SubjectNotFound(String),
    /// No audit record exists for the token being revoked.
    TokenNotFound,
    /// Revocation called with an empty token string.
    EmptyToken,
    /// Signature, format, or expiry check failed during claim extraction.
    Malformed,
    /// Underlying store failure.
    Storage(anyhow::Error),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::SubjectNotFound(subject) => write!(f, "User not found: {subject}"),
            TokenError::TokenNotFound => write!(f, "Token not found"),
            TokenError::EmptyToken => write!(f, "Token cannot be empty"),
            TokenError::Malformed => write!(f, "Invalid or expired token"),
            TokenError::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<anyhow::Error> for TokenError {
    fn from(e: anyhow::Error) -> Self {
        TokenError::Storage(e)
    }
}

/// Token service holding the injected signing secret and the single
/// configured time-to-live used for both the claim expiry and the ledger
/// expiry.
pub struct TokenService {
    secret: String,
    ttl_minutes: i64,
    users: Arc<UserStore>,
    ledger: Arc<TokenLedger>,
}

impl TokenService {
    pub fn new(
        secret: String,
        ttl_minutes: i64,
        users: Arc<UserStore>,
        ledger: Arc<TokenLedger>,
    ) -> Self {
        Self {
            secret,
            ttl_minutes,
            users,
            ledger,
        }
    }

    /// Issue a signed token for the given subject and record it in the
    /// ledger keyed to the resolved user.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        let user = self
            .users
            .get_user_by_username(subject)?
            .ok_or_else(|| TokenError::SubjectNotFound(subject.to_string()))?;

        let now = Utc::now();
        let expiry = now + Duration::minutes(self.ttl_minutes);

        let claims = Claims {
            sub: user.username.clone(),
            iat: now.timestamp() as usize,
            exp: expiry.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Storage(anyhow!(e).context("Failed to sign token")))?;

        self.ledger.record(user.id, &token, now, expiry)?;

        debug!(
            "Issued token for {} expiring in {}m",
            user.username, self.ttl_minutes
        );

        Ok(token)
    }

    /// Structural validation: parse, signature, and expiry only.
    ///
    /// Revocation state is not consulted; see `validate_for_subject`.
    pub fn validate(&self, token: &str) -> bool {
        self.decode_claims(token).is_ok()
    }

    /// Contextual validation: ledger lookup, subject match, expiry check.
    ///
    /// False when the token has no audit record, has been revoked, fails the
    /// structural checks, names a different subject, or is past its expiry.
    /// Never raises; callers treat every failure mode identically.
    pub fn validate_for_subject(&self, token: &str, expected_subject: &str) -> bool {
        let audit = match self.ledger.find(token) {
            Ok(Some(audit)) => audit,
            _ => return false,
        };
        if !audit.is_valid {
            return false;
        }

        let Ok(claims) = self.decode_claims(token) else {
            return false;
        };

        claims.sub == expected_subject && claims.exp as i64 > Utc::now().timestamp()
    }

    /// Flip the ledger validity flag for the token to false.
    pub fn revoke(&self, token: &str) -> Result<(), TokenError> {
        if token.is_empty() {
            return Err(TokenError::EmptyToken);
        }
        if !self.ledger.revoke(token)? {
            return Err(TokenError::TokenNotFound);
        }
        Ok(())
    }

    /// Extract the subject from a structurally valid token.
    pub fn subject_of(&self, token: &str) -> Result<String, TokenError> {
        let claims = self.decode_claims(token).map_err(|_| TokenError::Malformed)?;
        Ok(claims.sub)
    }

    /// Extract the expiry from a structurally valid token.
    pub fn expiry_of(&self, token: &str) -> Result<DateTime<Utc>, TokenError> {
        let claims = self.decode_claims(token).map_err(|_| TokenError::Malformed)?;
        DateTime::from_timestamp(claims.exp as i64, 0).ok_or(TokenError::Malformed)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        // No clock leeway: the expiry window is exactly the configured TTL.
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::NewUser;
    use tempfile::NamedTempFile;

    fn create_test_service(ttl_minutes: i64) -> (TokenService, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();

        let users = Arc::new(UserStore::new(db_path).unwrap());
        users
            .create_user(&NewUser {
                user_name: Some("alice".to_string()),
                first_name: Some("Alice".to_string()),
                last_name: Some("Smith".to_string()),
                email: Some("alice@example.com".to_string()),
                pass_word: Some("Passw0rd@".to_string()),
                roles: Some("ROLE_USER".to_string()),
            })
            .unwrap();

        let ledger = Arc::new(TokenLedger::new(db_path).unwrap());
        let service = TokenService::new("test-secret-key-12345".to_string(), ttl_minutes, users, ledger);
        (service, temp_file)
    }

    #[test]
    fn test_issue_then_validate() {
        let (service, _temp) = create_test_service(30);

        let token = service.issue("alice").unwrap();
        assert!(!token.is_empty());
        assert!(service.validate(&token));
        assert!(service.validate_for_subject(&token, "alice"));
    }

    #[test]
    fn test_subject_round_trip() {
        let (service, _temp) = create_test_service(30);

        let token = service.issue("alice").unwrap();
        assert_eq!(service.subject_of(&token).unwrap(), "alice");
    }

    #[test]
    fn test_expiry_matches_configured_ttl() {
        let (service, _temp) = create_test_service(30);

        let token = service.issue("alice").unwrap();
        let expiry = service.expiry_of(&token).unwrap();
        let window = expiry - Utc::now();
        assert!(window <= Duration::minutes(30));
        assert!(window > Duration::minutes(29));
    }

    #[test]
    fn test_issue_unknown_subject() {
        let (service, _temp) = create_test_service(30);

        match service.issue("mallory") {
            Err(TokenError::SubjectNotFound(subject)) => assert_eq!(subject, "mallory"),
            other => panic!("expected SubjectNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_token_rejected() {
        let (service, _temp) = create_test_service(30);

        assert!(!service.validate("invalid.token.here"));
        assert!(service.subject_of("invalid.token.here").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let (service, _temp) = create_test_service(-5);

        let token = service.issue("alice").unwrap();
        assert!(!service.validate(&token));
        assert!(!service.validate_for_subject(&token, "alice"));
    }

    #[test]
    fn test_subject_mismatch_rejected() {
        let (service, _temp) = create_test_service(30);

        let token = service.issue("alice").unwrap();
        assert!(!service.validate_for_subject(&token, "bob"));
    }

    #[test]
    fn test_unledgered_token_fails_contextual_check() {
        let (service, _temp) = create_test_service(30);
        let (other, _other_temp) = create_test_service(30);

        // Same secret, but issued against a different ledger.
        let token = other.issue("alice").unwrap();
        assert!(service.validate(&token)); // structurally fine
        assert!(!service.validate_for_subject(&token, "alice")); // no audit record
    }

    #[test]
    fn test_revoke_then_contextual_check_fails() {
        let (service, _temp) = create_test_service(30);

        let token = service.issue("alice").unwrap();
        service.revoke(&token).unwrap();

        assert!(!service.validate_for_subject(&token, "alice"));
        // Revoking again still succeeds; the flag is already false.
        service.revoke(&token).unwrap();
    }

    #[test]
    fn test_revoke_unknown_and_empty_tokens() {
        let (service, _temp) = create_test_service(30);

        assert!(matches!(
            service.revoke("no-such-token"),
            Err(TokenError::TokenNotFound)
        ));
        assert!(matches!(service.revoke(""), Err(TokenError::EmptyToken)));
    }

    #[test]
    fn test_different_secrets_reject() {
        let (service, _temp) = create_test_service(30);
        let token = service.issue("alice").unwrap();

        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let other = TokenService::new(
            "a-completely-different-secret".to_string(),
            30,
            Arc::new(UserStore::new(db_path).unwrap()),
            Arc::new(TokenLedger::new(db_path).unwrap()),
        );
        assert!(!other.validate(&token));
    }
}
