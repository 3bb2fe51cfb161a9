//! The closed verb vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

/// A command an adapter can be asked to perform.
///
/// The set is closed: anything else is rejected before an adapter process is
/// spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verb {
    /// Describe the adapter's identity and feature surface.
    #[serde(rename = "capabilities")]
    Capabilities,
    /// Begin authentication (OAuth URL or token prompt).
    #[serde(rename = "auth:start")]
    AuthStart,
    /// Exchange a refresh token for a new access token.
    #[serde(rename = "auth:refresh")]
    AuthRefresh,
    /// Read project, build and environment configuration.
    #[serde(rename = "fetch:config")]
    FetchConfig,
    /// Push environment variables to a project.
    #[serde(rename = "sync:env")]
    SyncEnv,
    /// Create a preview deployment.
    #[serde(rename = "deploy:preview")]
    DeployPreview,
    /// Create or change a DNS record.
    #[serde(rename = "dns:update")]
    DnsUpdate,
    /// Restore a DNS record to a previous value.
    #[serde(rename = "dns:rollback")]
    DnsRollback,
}

impl Verb {
    /// Every verb, in vocabulary order.
    pub const ALL: [Self; 8] = [
        Self::Capabilities,
        Self::AuthStart,
        Self::AuthRefresh,
        Self::FetchConfig,
        Self::SyncEnv,
        Self::DeployPreview,
        Self::DnsUpdate,
        Self::DnsRollback,
    ];

    /// Wire name of the verb, passed to adapters as their first argument.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Capabilities => "capabilities",
            Self::AuthStart => "auth:start",
            Self::AuthRefresh => "auth:refresh",
            Self::FetchConfig => "fetch:config",
            Self::SyncEnv => "sync:env",
            Self::DeployPreview => "deploy:preview",
            Self::DnsUpdate => "dns:update",
            Self::DnsRollback => "dns:rollback",
        }
    }
}

impl FromStr for Verb {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| ProtoError::UnknownVerb(s.to_string()))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deserializes a verb list, dropping names this build does not know.
///
/// Used for `supported_verbs` so a newer adapter advertising an extra verb
/// does not make its whole capabilities payload undecodable.
pub(crate) fn deserialize_known_verbs<'de, D>(deserializer: D) -> Result<Vec<Verb>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(names
        .into_iter()
        .filter_map(|name| match name.parse() {
            Ok(verb) => Some(verb),
            Err(_) => {
                tracing::debug!(verb = %name, "ignoring unknown verb in supported_verbs");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for verb in Verb::ALL {
            assert_eq!(verb.as_str().parse::<Verb>().unwrap(), verb);
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Verb::DeployPreview).unwrap();
        assert_eq!(json, r#""deploy:preview""#);
        let verb: Verb = serde_json::from_str(r#""dns:rollback""#).unwrap();
        assert_eq!(verb, Verb::DnsRollback);
    }

    #[test]
    fn unknown_verb_is_rejected() {
        let err = "tunnel:create".parse::<Verb>().unwrap_err();
        assert!(matches!(err, ProtoError::UnknownVerb(name) if name == "tunnel:create"));
    }

    #[test]
    fn verb_names_are_case_sensitive() {
        assert!("Capabilities".parse::<Verb>().is_err());
        assert!("FETCH:CONFIG".parse::<Verb>().is_err());
    }
}
