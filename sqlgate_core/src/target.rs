use crate::ConnectionSpec;
use std::fmt;

/// Protocol scheme of the connection targets built for an endpoint
pub const PROTOCOL: &str = "as400";

/// Driver connection target built from a [`ConnectionSpec`], e.g.
/// `as400://10.0.0.5:446/mylib;secure=true;default schema=QGPL;thread used=true`
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ConnectionTarget {
    address: String,
    properties: Vec<(&'static str, String)>,
}

impl ConnectionTarget {
    #[must_use]
    pub fn protocol(&self) -> &'static str {
        PROTOCOL
    }

    /// Host with the optional port and database
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Properties in the order they appear in the target
    #[must_use]
    pub fn properties(&self) -> &[(&'static str, String)] {
        &self.properties
    }
}

impl From<&ConnectionSpec> for ConnectionTarget {
    fn from(spec: &ConnectionSpec) -> Self {
        let mut address = spec.host.clone();
        if let Some(port) = spec.port.filter(|port| *port > 0) {
            address.push_str(&format!(":{port}"));
        }
        if let Some(database) = non_empty(spec.database.as_deref()) {
            address.push('/');
            address.push_str(database);
        }

        let mut properties = vec![("secure", spec.secure.to_string())];
        if let Some(libraries) = non_empty(spec.library_list.as_deref()) {
            properties.push(("libraries", libraries.to_string()));
        }
        if let Some(schema) = non_empty(spec.default_schema.as_deref()) {
            properties.push(("default schema", schema.to_string()));
        }
        properties.push(("thread used", "true".to_string()));

        Self {
            address,
            properties,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PROTOCOL}://{}", self.address)?;
        for (name, value) in &self.properties {
            write!(f, ";{name}={value}")?;
        }
        Ok(())
    }
}
