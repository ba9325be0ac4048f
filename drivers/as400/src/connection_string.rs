use sqlgate_driver::Error::InvalidUrl;
use sqlgate_driver::{Credentials, Result};
use std::borrow::Cow;
use std::fmt;
use tracing::debug;

const SCHEME: &str = "as400://";

/// ODBC connection string for the IBM i Access ODBC driver.
///
/// Built from an `as400://host[:port][/library];name=value;...` target. The database
/// segment and the `default schema` property select the default library, `libraries`
/// extends the library list and `secure` enables TLS. The string carries the password, so
/// `Debug` does not print it.
#[derive(Clone, Eq, PartialEq)]
pub(crate) struct ConnectionString(String);

impl ConnectionString {
    pub(crate) fn new(odbc_driver: &str, target: &str, credentials: &Credentials) -> Result<Self> {
        let Some(rest) = target.strip_prefix(SCHEME) else {
            return Err(InvalidUrl(format!("expected an {SCHEME} target: {target}")));
        };
        let (address, properties) = rest.split_once(';').unwrap_or((rest, ""));
        let (authority, database) = match address.split_once('/') {
            Some((authority, database)) => (authority, Some(database)),
            None => (address, None),
        };
        let host = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|error| InvalidUrl(format!("invalid port [{port}]: {error}")))?;
                debug!("Port {port} ignored; the host servers are located by the system name");
                host
            }
            None => authority,
        };
        if host.is_empty() {
            return Err(InvalidUrl(format!("missing host: {target}")));
        }

        let mut secure = false;
        let mut default_library = database.filter(|database| !database.is_empty());
        let mut libraries = Vec::new();
        for property in properties.split(';').filter(|property| !property.is_empty()) {
            let (name, value) = property.split_once('=').unwrap_or((property, ""));
            match name.trim() {
                "secure" => secure = value.trim().eq_ignore_ascii_case("true"),
                "default schema" if !value.is_empty() => default_library = Some(value),
                "libraries" => libraries.extend(
                    value
                        .split([',', ' '])
                        .filter(|library| !library.is_empty()),
                ),
                name => debug!("Property [{name}] has no ODBC equivalent"),
            }
        }

        let mut connection_string = format!("Driver={{{odbc_driver}}};");
        append(&mut connection_string, "System", host);
        append(&mut connection_string, "UID", credentials.username());
        append(&mut connection_string, "PWD", credentials.password());
        append(&mut connection_string, "SSL", if secure { "1" } else { "0" });
        if default_library.is_some() || !libraries.is_empty() {
            // A leading comma leaves the default library unset
            let library_list = std::iter::once(default_library.unwrap_or_default())
                .chain(libraries)
                .collect::<Vec<_>>()
                .join(",");
            append(&mut connection_string, "DBQ", &library_list);
        }
        Ok(Self(connection_string))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConnectionString(****)")
    }
}

fn append(connection_string: &mut String, keyword: &str, value: &str) {
    connection_string.push_str(keyword);
    connection_string.push('=');
    connection_string.push_str(&escape(value));
    connection_string.push(';');
}

/// Braces a value that would otherwise end the attribute; a closing brace is doubled.
fn escape(value: &str) -> Cow<'_, str> {
    let needs_braces = value.contains([';', '{', '}'])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);
    if needs_braces {
        Cow::Owned(format!("{{{}}}", value.replace('}', "}}")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ODBC_DRIVER;

    fn connection_string(target: &str) -> Result<String> {
        let credentials = Credentials::new("QUSER", "hunter2");
        let connection_string = ConnectionString::new(ODBC_DRIVER, target, &credentials)?;
        Ok(connection_string.as_str().to_string())
    }

    #[test]
    fn test_minimal_target() -> Result<()> {
        assert_eq!(
            connection_string("as400://10.0.0.5;secure=false;thread used=true")?,
            "Driver={IBM i Access ODBC Driver};System=10.0.0.5;UID=QUSER;PWD=hunter2;SSL=0;"
        );
        Ok(())
    }

    #[test]
    fn test_full_target() -> Result<()> {
        let target = "as400://10.0.0.5:446/mylib;secure=true;libraries=LIB1,LIB2;\
            default schema=QGPL;thread used=true";

        assert_eq!(
            connection_string(target)?,
            "Driver={IBM i Access ODBC Driver};System=10.0.0.5;UID=QUSER;PWD=hunter2;SSL=1;\
             DBQ=QGPL,LIB1,LIB2;"
        );
        Ok(())
    }

    #[test]
    fn test_database_is_default_library() -> Result<()> {
        assert_eq!(
            connection_string("as400://ibmi/MYLIB;secure=false;thread used=true")?,
            "Driver={IBM i Access ODBC Driver};System=ibmi;UID=QUSER;PWD=hunter2;SSL=0;\
             DBQ=MYLIB;"
        );
        Ok(())
    }

    #[test]
    fn test_libraries_without_default() -> Result<()> {
        assert_eq!(
            connection_string("as400://ibmi;secure=false;libraries=LIB1 LIB2")?,
            "Driver={IBM i Access ODBC Driver};System=ibmi;UID=QUSER;PWD=hunter2;SSL=0;\
             DBQ=,LIB1,LIB2;"
        );
        Ok(())
    }

    #[test]
    fn test_password_is_escaped() -> Result<()> {
        let credentials = Credentials::new("QUSER", "pa;ss}word");
        let connection_string =
            ConnectionString::new(ODBC_DRIVER, "as400://ibmi;secure=false", &credentials)?;

        assert!(connection_string.as_str().contains("PWD={pa;ss}}word};"));
        Ok(())
    }

    #[test]
    fn test_debug_hides_password() -> Result<()> {
        let credentials = Credentials::new("QUSER", "hunter2");
        let connection_string =
            ConnectionString::new(ODBC_DRIVER, "as400://ibmi;secure=false", &credentials)?;

        assert!(!format!("{connection_string:?}").contains("hunter2"));
        Ok(())
    }

    #[test]
    fn test_invalid_targets() {
        for target in [
            "db2://ibmi;secure=false",
            "as400://;secure=false",
            "as400://ibmi:port;secure=false",
        ] {
            let error = connection_string(target).expect_err("invalid target");
            assert!(matches!(error, InvalidUrl(_)), "{target}: {error:?}");
        }
    }
}
