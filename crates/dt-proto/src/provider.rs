//! Hosting provider identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

/// Maximum length of a provider name.
pub const MAX_PROVIDER_NAME_LEN: usize = 64;

/// Names the adapter to invoke.
///
/// The well-known providers get their own variants; any other valid name is
/// carried as [`Provider::Custom`] so new adapters can be dropped into the
/// adapters directory without a controller release. A provider name is used
/// verbatim as a directory name, so construction rejects anything that is
/// not a single safe path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Provider {
    /// Vercel.
    Vercel,
    /// Cloudflare Pages / Workers.
    Cloudflare,
    /// Render.
    Render,
    /// Netlify.
    Netlify,
    /// Any other adapter found under the adapters root.
    Custom(ProviderName),
}

/// A validated custom provider name.
///
/// Only obtainable by parsing a [`Provider`], so it is always a single safe
/// path segment and never one of the built-in names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderName(String);

impl ProviderName {
    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Provider {
    /// Returns the wire and directory name of this provider.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Vercel => "vercel",
            Self::Cloudflare => "cloudflare",
            Self::Render => "render",
            Self::Netlify => "netlify",
            Self::Custom(name) => name.as_str(),
        }
    }
}

fn validate_name(name: &str) -> Result<(), ProtoError> {
    let invalid = |reason| ProtoError::InvalidProvider {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name.len() > MAX_PROVIDER_NAME_LEN {
        return Err(invalid("name cannot exceed 64 characters"));
    }
    if name.contains(['/', '\\']) || name.contains("..") {
        return Err(invalid("path separators are not allowed"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(invalid(
            "name must contain only lowercase letters, digits, hyphens and underscores",
        ));
    }
    Ok(())
}

impl FromStr for Provider {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vercel" => Ok(Self::Vercel),
            "cloudflare" => Ok(Self::Cloudflare),
            "render" => Ok(Self::Render),
            "netlify" => Ok(Self::Netlify),
            other => {
                validate_name(other)?;
                Ok(Self::Custom(ProviderName(other.to_string())))
            }
        }
    }
}

impl TryFrom<String> for Provider {
    type Error = ProtoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Custom(name) => name.0,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("vercel", Provider::Vercel ; "vercel")]
    #[test_case("cloudflare", Provider::Cloudflare ; "cloudflare")]
    #[test_case("render", Provider::Render ; "render")]
    #[test_case("netlify", Provider::Netlify ; "netlify")]
    fn parses_names(input: &str, expected: Provider) {
        let provider: Provider = input.parse().unwrap();
        assert_eq!(provider, expected);
        assert_eq!(provider.to_string(), input);
    }

    #[test]
    fn custom_names_round_trip() {
        let provider: Provider = "fly-io".parse().unwrap();
        match &provider {
            Provider::Custom(name) => assert_eq!(name.as_str(), "fly-io"),
            other => panic!("expected custom provider, got {other:?}"),
        }
        assert_eq!(String::from(provider), "fly-io");
    }

    #[test]
    fn built_in_names_never_parse_as_custom() {
        for name in ["vercel", "cloudflare", "render", "netlify"] {
            let provider: Provider = name.parse().unwrap();
            assert!(!matches!(provider, Provider::Custom(_)), "{name}");
        }
    }

    #[test_case("" ; "empty")]
    #[test_case("../vercel" ; "traversal")]
    #[test_case("a/b" ; "slash")]
    #[test_case("Vercel" ; "uppercase")]
    #[test_case("my provider" ; "space")]
    fn rejects_unsafe_names(input: &str) {
        let err = input.parse::<Provider>().unwrap_err();
        assert!(matches!(err, ProtoError::InvalidProvider { .. }));
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "a".repeat(MAX_PROVIDER_NAME_LEN + 1);
        assert!(name.parse::<Provider>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Provider::Netlify).unwrap();
        assert_eq!(json, r#""netlify""#);

        let custom: Provider = serde_json::from_str(r#""railway""#).unwrap();
        assert!(matches!(&custom, Provider::Custom(name) if name.as_str() == "railway"));
    }

    #[test]
    fn deserialize_rejects_invalid_name() {
        let result: Result<Provider, _> = serde_json::from_str(r#""../../bin""#);
        assert!(result.is_err());
    }
}
