//! Per-provider model rate catalogs.

use super::{PricingError, Provider};
use serde::Serialize;
use std::collections::BTreeMap;

/// Input and output rates in currency units per 1000 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelRate {
    pub input: f64,
    pub output: f64,
}

impl ModelRate {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }
}

/// Immutable mapping `provider -> (model -> rate)`.
///
/// Built once at startup and shared by reference. Providers iterate in
/// [`Provider::ALL`] order because `Provider`'s ordering follows it.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    catalogs: BTreeMap<Provider, BTreeMap<String, ModelRate>>,
}

/// Incremental constructor for [`RateTable`].
#[derive(Debug, Default)]
pub struct RateTableBuilder {
    catalogs: BTreeMap<Provider, BTreeMap<String, ModelRate>>,
}

impl RateTableBuilder {
    /// Add (or replace) a model's rates under a provider.
    pub fn rate(mut self, provider: Provider, model: impl Into<String>, input: f64, output: f64) -> Self {
        self.catalogs
            .entry(provider)
            .or_default()
            .insert(model.into(), ModelRate::new(input, output));
        self
    }

    pub fn build(self) -> RateTable {
        RateTable {
            catalogs: self.catalogs,
        }
    }
}

const BUILTIN_RATES: &[(Provider, &str, f64, f64)] = &[
    (Provider::OpenAi, "gpt-4o", 0.0025, 0.01),
    (Provider::OpenAi, "gpt-3.5-turbo", 0.0005, 0.0015),
    (Provider::OpenAi, "gpt-4.5", 0.075, 0.15),
    (Provider::OpenAi, "o3", 0.01, 0.04),
    (Provider::OpenAi, "o1-2024-12-17", 0.015, 0.06),
    (Provider::OpenAi, "o1-preview", 0.015, 0.06),
    (Provider::OpenAi, "o3-mini-high", 0.0011, 0.0044),
    (Provider::OpenAi, "o3-mini", 0.0011, 0.0044),
    (Provider::OpenAi, "o1-mini", 0.0011, 0.0044),
    (Provider::OpenAi, "gpt-4o-mini", 0.0011, 0.0044),
    (Provider::Anthropic, "claude-3-sonnet", 0.003, 0.015),
    (Provider::Anthropic, "claude-3.7-sonnet", 0.003, 0.015),
    (Provider::Google, "gemini-2.5-pro", 0.0025, 0.015),
    (Provider::Google, "gemini-2.0-flash-001", 0.0001, 0.0004),
    (Provider::Xai, "grok-3-preview", 0.003, 0.015),
    (Provider::DeepSeek, "deepseek-v3", 0.00027, 0.0011),
    (Provider::DeepSeek, "deepseek-r1", 0.00055, 0.00219),
    (Provider::Alibaba, "qwen2.5-max", 0.0016, 0.0064),
    (Provider::Alibaba, "qwen-plus-0125", 0.0004, 0.0012),
    (Provider::Cohere, "command-a", 0.0025, 0.01),
];

impl RateTable {
    pub fn builder() -> RateTableBuilder {
        RateTableBuilder::default()
    }

    /// The production rate catalog.
    pub fn builtin() -> Self {
        BUILTIN_RATES
            .iter()
            .fold(Self::builder(), |builder, &(provider, model, input, output)| {
                builder.rate(provider, model, input, output)
            })
            .build()
    }

    /// Number of (provider, model) entries.
    pub fn len(&self) -> usize {
        self.catalogs.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entry, providers in search order.
    pub fn entries(&self) -> impl Iterator<Item = (Provider, &str, ModelRate)> + '_ {
        self.catalogs.iter().flat_map(|(provider, models)| {
            models
                .iter()
                .map(move |(model, rate)| (*provider, model.as_str(), *rate))
        })
    }

    /// Exact-key lookup in a single provider's catalog.
    pub fn get(&self, provider: Provider, model: &str) -> Option<ModelRate> {
        self.catalogs
            .get(&provider)
            .and_then(|models| models.get(model))
            .copied()
    }

    /// Classify a model by searching provider catalogs in order.
    ///
    /// The input is lower-cased before comparison while catalog keys are
    /// compared as stored, so a key containing uppercase letters can never
    /// be matched here.
    pub fn resolve_provider(&self, model: &str) -> Result<Provider, PricingError> {
        let model_lower = model.to_lowercase();

        self.catalogs
            .iter()
            .find(|(_, models)| models.contains_key(&model_lower))
            .map(|(provider, _)| *provider)
            .ok_or_else(|| PricingError::UnknownModel(model.to_string()))
    }

    /// Rates for `model` under `provider`, deriving the provider when absent.
    ///
    /// The final lookup is exact and case-sensitive.
    pub fn resolve_rates(
        &self,
        model: &str,
        provider: Option<Provider>,
    ) -> Result<ModelRate, PricingError> {
        let provider = match provider {
            Some(provider) => provider,
            None => self.resolve_provider(model)?,
        };

        self.get(provider, model)
            .ok_or_else(|| PricingError::InvalidModelForProvider {
                model: model.to_string(),
                provider: provider.to_string(),
            })
    }
}
