//! Turns a reported LLM call into a priced usage record.

use crate::models::UsageRecord;
use crate::pricing::{compute_cost, PricingError, Provider, RateTable};

/// Validated tracking input.
#[derive(Debug, Clone)]
pub struct TrackUsage {
    pub model: String,
    /// Provider hint as sent by the client; empty means "derive it".
    pub provider: Option<String>,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub currency: Option<String>,
}

/// Resolve provider and rates for the call and compute its cost.
///
/// A provider hint that names no known provider fails the same way as a
/// provider that does not offer the model.
pub fn price_usage(table: &RateTable, input: &TrackUsage) -> Result<UsageRecord, PricingError> {
    let provider = match input.provider.as_deref().filter(|p| !p.is_empty()) {
        Some(hint) => {
            hint.parse::<Provider>()
                .map_err(|_| PricingError::InvalidModelForProvider {
                    model: input.model.clone(),
                    provider: hint.to_string(),
                })?
        }
        None => table.resolve_provider(&input.model)?,
    };

    let rates = table.resolve_rates(&input.model, Some(provider))?;
    let cost = compute_cost(input.prompt_tokens, input.completion_tokens, rates);

    Ok(UsageRecord::new(
        input.model.clone(),
        provider,
        input.prompt_tokens,
        input.completion_tokens,
        cost,
        input.currency.clone().filter(|c| !c.is_empty()),
    ))
}
