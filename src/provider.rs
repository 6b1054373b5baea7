//! Identifiers for the parse producers being compared.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One source of structured parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Claude,
}

impl Provider {
    /// All known providers, in report order.
    pub const ALL: [Provider; 2] = [Provider::OpenAi, Provider::Claude];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Claude => "claude",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which providers a parse request should call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderSelection {
    #[default]
    OpenAi,
    Claude,
    Both,
}

impl ProviderSelection {
    /// Providers covered by this selection.
    pub fn providers(&self) -> &'static [Provider] {
        match self {
            ProviderSelection::OpenAi => &[Provider::OpenAi],
            ProviderSelection::Claude => &[Provider::Claude],
            ProviderSelection::Both => &Provider::ALL,
        }
    }
}

impl FromStr for ProviderSelection {
    type Err = String;

    /// Case-insensitive; an empty string selects the default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "openai" => Ok(ProviderSelection::OpenAi),
            "claude" => Ok(ProviderSelection::Claude),
            "both" => Ok(ProviderSelection::Both),
            other => Err(format!(
                "unknown provider '{}', expected openai, claude or both",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Provider::OpenAi).unwrap(), "\"openai\"");
        assert_eq!(serde_json::to_string(&Provider::Claude).unwrap(), "\"claude\"");
        let parsed: Provider = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(parsed, Provider::OpenAi);
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!("".parse::<ProviderSelection>().unwrap(), ProviderSelection::OpenAi);
        assert_eq!(" Claude ".parse::<ProviderSelection>().unwrap(), ProviderSelection::Claude);
        assert_eq!("BOTH".parse::<ProviderSelection>().unwrap(), ProviderSelection::Both);
        assert!("gemini".parse::<ProviderSelection>().is_err());
    }

    #[test]
    fn test_both_covers_all_providers() {
        assert_eq!(ProviderSelection::Both.providers().len(), 2);
        assert_eq!(ProviderSelection::Claude.providers(), &[Provider::Claude]);
    }
}
