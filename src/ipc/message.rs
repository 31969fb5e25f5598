//! Method call envelope and the exposed interface description.

use serde::{Deserialize, Serialize};

pub const INTROSPECTABLE_INTERFACE: &str = "org.freedesktop.DBus.Introspectable";
pub const SERVICE_INTERFACE: &str = "com.redhat.SystemService";

/// Introspection document for the served object.
pub const INTROSPECTION_XML: &str = r#"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
<node>
  <interface name="org.freedesktop.DBus.Introspectable">
    <method name="Introspect">
      <arg name="data" direction="out" type="s"/>
    </method>
  </interface>
  <interface name="com.redhat.SystemService">
    <method name="ReloadConfig">
    </method>
    <method name="LogConfig">
    </method>
  </interface>
</node>
"#;

/// An inbound method call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Well-known bus name of the target service.
    pub destination: String,
    pub path: String,
    pub interface: String,
    pub member: String,
}

impl MethodCall {
    pub fn new(
        destination: impl Into<String>,
        path: impl Into<String>,
        interface: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        Self {
            destination: destination.into(),
            path: path.into(),
            interface: interface.into(),
            member: member.into(),
        }
    }
}

/// Methods this service implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Introspect,
    ReloadConfig,
    LogConfig,
}

impl Method {
    /// Match an `(interface, member)` pair.
    pub fn resolve(interface: &str, member: &str) -> Option<Self> {
        match (interface, member) {
            (INTROSPECTABLE_INTERFACE, "Introspect") => Some(Method::Introspect),
            (SERVICE_INTERFACE, "ReloadConfig") => Some(Method::ReloadConfig),
            (SERVICE_INTERFACE, "LogConfig") => Some(Method::LogConfig),
            _ => None,
        }
    }

    pub fn member(self) -> &'static str {
        match self {
            Method::Introspect => "Introspect",
            Method::ReloadConfig => "ReloadConfig",
            Method::LogConfig => "LogConfig",
        }
    }
}

/// Method return payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Empty,
    Text(String),
}

impl Reply {
    pub fn into_body(self) -> Option<String> {
        match self {
            Reply::Empty => None,
            Reply::Text(text) => Some(text),
        }
    }
}

/// Handler verdict for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handling {
    Handled(Reply),
    /// Left for another handler; the bus reports it as an unknown method.
    NotHandled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_methods_only() {
        assert_eq!(Method::resolve(SERVICE_INTERFACE, "ReloadConfig"), Some(Method::ReloadConfig));
        assert_eq!(Method::resolve(SERVICE_INTERFACE, "LogConfig"), Some(Method::LogConfig));
        assert_eq!(Method::resolve(INTROSPECTABLE_INTERFACE, "Introspect"), Some(Method::Introspect));
        assert_eq!(Method::resolve(SERVICE_INTERFACE, "Introspect"), None);
        assert_eq!(Method::resolve(INTROSPECTABLE_INTERFACE, "LogConfig"), None);
    }

    #[test]
    fn introspection_names_both_interfaces() {
        assert!(INTROSPECTION_XML.contains(r#"<interface name="org.freedesktop.DBus.Introspectable">"#));
        assert!(INTROSPECTION_XML.contains(r#"<interface name="com.redhat.SystemService">"#));
        for member in ["Introspect", "ReloadConfig", "LogConfig"] {
            assert!(INTROSPECTION_XML.contains(&format!(r#"<method name="{member}">"#)));
        }
    }
}
