//! Model price table (USD per 1M tokens).

/// (model id, input rate per 1M, output rate per 1M).
const TOKEN_PRICES: &[(&str, f64, f64)] = &[
    ("claude-haiku-4-5-20251001", 0.80, 4.00),
    ("claude-sonnet-4-5-20250514", 3.00, 15.00),
];

/// Look up per-million rates for a model. Unknown models are free: cost
/// tracking must never fail a run over a missing table entry.
pub fn price_for_model(model: &str) -> Option<(f64, f64)> {
    TOKEN_PRICES
        .iter()
        .find(|(id, _, _)| *id == model)
        .map(|(_, input, output)| (*input, *output))
}

/// Compute the USD cost of one call. Unknown model ids contribute 0.
pub fn calculate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    match price_for_model(model) {
        Some((input_rate, output_rate)) => {
            (input_tokens as f64 * input_rate + output_tokens as f64 * output_rate) / 1_000_000.0
        }
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_cost() {
        // 1M input + 1M output on the fast model
        let cost = calculate_cost("claude-haiku-4-5-20251001", 1_000_000, 1_000_000);
        assert!((cost - 4.80).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_is_free() {
        assert_eq!(calculate_cost("mystery-model", 1_000_000, 1_000_000), 0.0);
        assert!(price_for_model("mystery-model").is_none());
    }

    #[test]
    fn rates_are_per_million() {
        let cost = calculate_cost("claude-sonnet-4-5-20250514", 1000, 500);
        assert!((cost - (1000.0 * 3.00 + 500.0 * 15.00) / 1_000_000.0).abs() < 1e-12);
    }
}
