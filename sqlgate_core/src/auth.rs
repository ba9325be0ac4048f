use crate::error::{Error, Result};
use jwt_simple::prelude::{HS256Key, MACLike, NoCustomClaims};
use std::fmt;
use tracing::debug;

const BEARER: &str = "Bearer ";

/// Authenticated identity attached to a request
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Principal {
    subject: String,
}

impl Principal {
    pub fn new<S: Into<String>>(subject: S) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subject)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// No bearer token was presented
    #[error("No token provided")]
    MissingToken,
    /// The token failed verification or names no subject
    #[error("Invalid token")]
    InvalidToken,
}

impl AuthError {
    /// Suggested HTTP status for every authentication failure
    #[must_use]
    pub fn status_code(&self) -> u16 {
        401
    }
}

/// Verifies HS256 signed bearer tokens and resolves the request principal.
pub struct AuthGate {
    key: HS256Key,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

impl AuthGate {
    /// Create a gate for tokens signed with the given secret.
    ///
    /// # Errors
    /// * If the secret is empty
    pub fn new<S: AsRef<[u8]>>(secret: S) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(Error::InvalidConfiguration {
                key: "auth.secret".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(Self {
            key: HS256Key::from_bytes(secret),
        })
    }

    /// Resolve the principal from an `Authorization` header value.
    ///
    /// # Errors
    /// * [`AuthError::MissingToken`] if there is no `Bearer` token
    /// * [`AuthError::InvalidToken`] if the token is not valid or has no subject
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, AuthError> {
        let token = authorization
            .and_then(|value| value.strip_prefix(BEARER))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self
            .key
            .verify_token::<NoCustomClaims>(token, None)
            .map_err(|error| {
                debug!("Token verification failed: {error}");
                AuthError::InvalidToken
            })?;
        let subject = claims.subject.ok_or(AuthError::InvalidToken)?;
        Ok(Principal::new(subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jwt_simple::prelude::{Claims, Duration};

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn token(secret: &[u8], subject: Option<&str>) -> anyhow::Result<String> {
        let key = HS256Key::from_bytes(secret);
        let mut claims = Claims::create(Duration::from_hours(1));
        if let Some(subject) = subject {
            claims = claims.with_subject(subject);
        }
        Ok(key.authenticate(claims)?)
    }

    #[test]
    fn test_authenticate() -> anyhow::Result<()> {
        let gate = AuthGate::new(SECRET)?;
        let header = format!("Bearer {}", token(SECRET, Some("alice"))?);

        let principal = gate.authenticate(Some(header.as_str()))?;

        assert_eq!(principal.subject(), "alice");
        assert_eq!(principal.to_string(), "alice");
        Ok(())
    }

    #[test]
    fn test_missing_token() -> anyhow::Result<()> {
        let gate = AuthGate::new(SECRET)?;

        for header in [None, Some(""), Some("Bearer "), Some("Basic dXNlcjpwYXNz")] {
            let error = gate.authenticate(header).expect_err("missing token");
            assert_eq!(error, AuthError::MissingToken);
            assert_eq!(error.to_string(), "No token provided");
            assert_eq!(error.status_code(), 401);
        }
        Ok(())
    }

    #[test]
    fn test_invalid_token() -> anyhow::Result<()> {
        let gate = AuthGate::new(SECRET)?;
        let forged = format!(
            "Bearer {}",
            token(b"another secret of sufficient size", Some("alice"))?
        );

        for header in ["Bearer not.a.jwt", forged.as_str()] {
            let error = gate.authenticate(Some(header)).expect_err("invalid token");
            assert_eq!(error, AuthError::InvalidToken);
            assert_eq!(error.to_string(), "Invalid token");
            assert_eq!(error.status_code(), 401);
        }
        Ok(())
    }

    #[test]
    fn test_token_without_subject() -> anyhow::Result<()> {
        let gate = AuthGate::new(SECRET)?;
        let header = format!("Bearer {}", token(SECRET, None)?);

        let error = gate
            .authenticate(Some(header.as_str()))
            .expect_err("no subject");

        assert_eq!(error, AuthError::InvalidToken);
        Ok(())
    }

    #[test]
    fn test_empty_secret() {
        let error = AuthGate::new("").expect_err("empty secret");
        assert!(matches!(error, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_debug_hides_key() -> anyhow::Result<()> {
        let gate = AuthGate::new(SECRET)?;
        assert_eq!(format!("{gate:?}"), "AuthGate { .. }");
        Ok(())
    }
}
