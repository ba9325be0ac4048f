use crate::Connection;
use crate::error::Result;
use async_trait::async_trait;
use mockall::automock;
use std::fmt::{self, Debug};

/// Credentials presented to a database when connecting.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new<U, P>(username: U, password: P) -> Self
    where
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

#[automock]
#[async_trait]
pub trait Driver: Debug + Send + Sync {
    /// Scheme of the connection targets handled by this driver, e.g. `as400`
    fn identifier(&self) -> &'static str;
    async fn connect(
        &self,
        target: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn Connection>>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_credentials() {
        let credentials = Credentials::new("QSECOFR", "secret");
        assert_eq!(credentials.username(), "QSECOFR");
        assert_eq!(credentials.password(), "secret");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("QSECOFR", "secret");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("QSECOFR"));
        assert!(!debug.contains("secret"));
    }
}
