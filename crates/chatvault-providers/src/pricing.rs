//! Static price table and cost estimation.
//!
//! Vendors do not always report the input/output split, so cost is estimated
//! from total tokens with a fixed 70% input / 30% output share.

use chatvault_core::Platform;

/// Share of tokens billed at the input price.
pub const INPUT_SHARE: f64 = 0.7;

/// Share of tokens billed at the output price.
pub const OUTPUT_SHARE: f64 = 0.3;

/// Per-token prices in USD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price {
    pub input: f64,
    pub output: f64,
}

impl Price {
    const fn per_token(input: f64, output: f64) -> Self {
        Self { input, output }
    }
}

const OPENAI_PRICES: &[(&str, Price)] = &[
    ("gpt-4-turbo-preview", Price::per_token(0.000_01, 0.000_03)),
    ("gpt-4", Price::per_token(0.000_03, 0.000_06)),
    ("gpt-3.5-turbo", Price::per_token(0.000_001_5, 0.000_002)),
];

/// Row used for unknown OpenAI models.
const OPENAI_FALLBACK: &str = "gpt-3.5-turbo";

const ANTHROPIC_PRICES: &[(&str, Price)] = &[
    ("claude-3-opus-20240229", Price::per_token(0.000_015, 0.000_075)),
    ("claude-3-sonnet-20240229", Price::per_token(0.000_003, 0.000_015)),
    ("claude-3-haiku-20240307", Price::per_token(0.000_000_25, 0.000_001_25)),
];

/// Row used for unknown Anthropic models.
const ANTHROPIC_FALLBACK: &str = "claude-3-sonnet-20240229";

/// Flat Gemini estimate, same price in both directions.
const GOOGLE_PRICE: Price = Price::per_token(0.000_001, 0.000_001);

fn lookup(table: &[(&str, Price)], model: &str, fallback: &str) -> Price {
    table
        .iter()
        .find(|(name, _)| *name == model)
        .or_else(|| table.iter().find(|(name, _)| *name == fallback))
        .map(|(_, price)| *price)
        .unwrap_or(Price::per_token(0.0, 0.0))
}

/// Price row for a model, falling back to the platform's default row.
pub fn price_for(platform: Platform, model: &str) -> Price {
    match platform {
        Platform::OpenAI => lookup(OPENAI_PRICES, model, OPENAI_FALLBACK),
        Platform::Anthropic => lookup(ANTHROPIC_PRICES, model, ANTHROPIC_FALLBACK),
        Platform::Google => GOOGLE_PRICE,
    }
}

/// Estimated cost of a call that used `tokens` in total.
pub fn estimate_cost(platform: Platform, model: &str, tokens: u64) -> f64 {
    let price = price_for(platform, model);
    let tokens = tokens as f64;
    tokens * INPUT_SHARE * price.input + tokens * OUTPUT_SHARE * price.output
}
