//! Model pricing and cost estimation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-token USD prices for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPricing {
    pub model: String,
    pub input_price_per_token: f64,
    pub output_price_per_token: f64,
    pub currency: String,
}

impl ModelPricing {
    pub fn new(model: &str, input_price_per_token: f64, output_price_per_token: f64) -> Self {
        Self {
            model: model.into(),
            input_price_per_token,
            output_price_per_token,
            currency: "USD".into(),
        }
    }

    pub fn calculate_cost(&self, input_tokens: u32, output_tokens: u32) -> CostEstimate {
        let input_cost = input_tokens as f64 * self.input_price_per_token;
        let output_cost = output_tokens as f64 * self.output_price_per_token;
        CostEstimate {
            model: self.model.clone(),
            input_tokens,
            output_tokens,
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
            currency: self.currency.clone(),
        }
    }

    pub fn gpt_4o() -> Self {
        Self::new("gpt-4o", 0.000_005, 0.000_015)
    }
    pub fn gpt_4o_mini() -> Self {
        Self::new("gpt-4o-mini", 0.000_000_15, 0.000_000_6)
    }
    pub fn claude_35_sonnet() -> Self {
        Self::new("claude-3-5-sonnet", 0.000_003, 0.000_015)
    }
    pub fn claude_3_haiku() -> Self {
        Self::new("claude-3-haiku", 0.000_000_25, 0.000_001_25)
    }
}

/// Caller-supplied `{model -> prices}` mapping. Lookup is exact first,
/// then substring, so versioned model ids match their family entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingTable {
    models: HashMap<String, ModelPricing>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        Self::new()
            .with_model(ModelPricing::gpt_4o())
            .with_model(ModelPricing::gpt_4o_mini())
            .with_model(ModelPricing::claude_35_sonnet())
            .with_model(ModelPricing::claude_3_haiku())
    }

    pub fn with_model(mut self, pricing: ModelPricing) -> Self {
        self.insert(pricing);
        self
    }

    pub fn insert(&mut self, pricing: ModelPricing) {
        self.models.insert(pricing.model.clone(), pricing);
    }

    pub fn for_model(&self, model: &str) -> Option<&ModelPricing> {
        if let Some(pricing) = self.models.get(model) {
            return Some(pricing);
        }
        let lowered = model.to_lowercase();
        self.models
            .values()
            .filter(|p| lowered.contains(&p.model.to_lowercase()))
            .max_by_key(|p| p.model.len())
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub currency: String,
}

impl CostEstimate {
    pub fn format_detailed(&self) -> String {
        if self.total_cost < 0.01 {
            format!("{:.4}¢", self.total_cost * 100.0)
        } else {
            format!("${:.4}", self.total_cost)
        }
    }
}
