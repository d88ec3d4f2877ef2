//! Upstream LLM vendors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// LLM provider. Variant order is the order in which catalogs are searched
/// when a model has to be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
    Xai,
    DeepSeek,
    Alibaba,
    Cohere,
}

impl Provider {
    /// All providers in search order.
    pub const ALL: [Provider; 7] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Google,
        Provider::Xai,
        Provider::DeepSeek,
        Provider::Alibaba,
        Provider::Cohere,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
            Provider::Xai => "xai",
            Provider::DeepSeek => "deepseek",
            Provider::Alibaba => "alibaba",
            Provider::Cohere => "cohere",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown provider: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for provider in Provider::ALL {
            assert_eq!(provider.as_str().parse::<Provider>(), Ok(provider));
        }
    }

    #[test]
    fn test_parse_is_exact() {
        assert!("OpenAI".parse::<Provider>().is_err());
        assert!("mistral".parse::<Provider>().is_err());
    }

    #[test]
    fn test_ordering_follows_search_order() {
        let mut sorted = Provider::ALL;
        sorted.sort();
        assert_eq!(sorted, Provider::ALL);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&Provider::DeepSeek).unwrap(),
            "\"deepseek\""
        );
        assert_eq!(
            serde_json::from_str::<Provider>("\"openai\"").unwrap(),
            Provider::OpenAi
        );
    }
}
