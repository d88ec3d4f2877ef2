use super::ModelRate;
use serde::Serialize;

/// Cost of one request, split by direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

/// Price token counts against per-1000-token rates. No rounding is applied.
pub fn compute_cost(prompt_tokens: u64, completion_tokens: u64, rate: ModelRate) -> CostBreakdown {
    let input_cost = (prompt_tokens as f64 / 1000.0) * rate.input;
    let output_cost = (completion_tokens as f64 / 1000.0) * rate.output;

    CostBreakdown {
        input_cost,
        output_cost,
        total_cost: input_cost + output_cost,
    }
}
