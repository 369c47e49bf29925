//! Pricing provider response normalization
//!
//! Providers nest rates under `data`, under `rates`, both, or not at all,
//! and vary key case. Everything funnels into [`MetalPrices`].

use serde_json::{Map, Value};

use crate::error::UpstreamError;
use crate::types::{Instrument, MetalPrices};

const MAX_SHAPE_CHARS: usize = 200;
const MAX_SHAPE_KEYS: usize = 12;
const MAX_SHAPE_DEPTH: usize = 2;

/// Prices plus the base currency reported by the provider, if any
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuote {
    pub prices: MetalPrices,
    pub base: Option<String>,
}

/// Extract instrument prices from any supported response shape.
///
/// Fails with [`UpstreamError::NoPriceData`] when no instrument resolves.
pub fn normalize_quote(body: &Value) -> Result<NormalizedQuote, UpstreamError> {
    let root = match body.as_object() {
        Some(obj) => obj,
        None => {
            return Err(UpstreamError::NoPriceData {
                shape: shape_summary(body),
            })
        }
    };

    let mut candidates: Vec<&Map<String, Value>> = Vec::with_capacity(4);
    let data = get_ci(root, "data").and_then(Value::as_object);
    if let Some(rates) = data.and_then(|d| get_ci(d, "rates")).and_then(Value::as_object) {
        candidates.push(rates);
    }
    if let Some(rates) = get_ci(root, "rates").and_then(Value::as_object) {
        candidates.push(rates);
    }
    if let Some(data) = data {
        candidates.push(data);
    }
    candidates.push(root);

    let mut prices = MetalPrices::default();
    for map in candidates {
        for instrument in Instrument::ALL {
            if prices.get(instrument).is_none() {
                prices.set(instrument, lookup_price(map, instrument));
            }
        }
        if prices.xau.is_some() && prices.xag.is_some() {
            break;
        }
    }

    if !prices.any() {
        return Err(UpstreamError::NoPriceData {
            shape: shape_summary(body),
        });
    }

    let base = get_ci(root, "base")
        .or_else(|| data.and_then(|d| get_ci(d, "base")))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|b| b.len() == 3 && b.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_uppercase);

    Ok(NormalizedQuote { prices, base })
}

fn get_ci<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn lookup_price(map: &Map<String, Value>, instrument: Instrument) -> Option<f64> {
    instrument
        .aliases()
        .iter()
        .find_map(|alias| get_ci(map, alias).and_then(price_value))
}

fn price_value(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (price.is_finite() && price > 0.0).then_some(price)
}

/// Key/type outline of a response for diagnostics. Never includes values,
/// bounded in depth, width and total length.
pub fn shape_summary(value: &Value) -> String {
    let mut out = String::new();
    describe(value, 0, &mut out);
    if out.chars().count() > MAX_SHAPE_CHARS {
        let truncated: String = out.chars().take(MAX_SHAPE_CHARS - 3).collect();
        return format!("{}...", truncated);
    }
    out
}

fn describe(value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(_) => out.push_str("bool"),
        Value::Number(_) => out.push_str("number"),
        Value::String(_) => out.push_str("string"),
        Value::Array(items) => {
            out.push_str(&format!("array[{}]", items.len()));
        }
        Value::Object(map) if depth >= MAX_SHAPE_DEPTH => {
            out.push_str(&format!("object{{{} keys}}", map.len()));
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, child)) in map.iter().take(MAX_SHAPE_KEYS).enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                describe(child, depth + 1, out);
            }
            if map.len() > MAX_SHAPE_KEYS {
                out.push_str(&format!(", +{} more", map.len() - MAX_SHAPE_KEYS));
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_wrapped_rates_are_normalized() {
        let quote = normalize_quote(&json!({ "data": { "rates": { "XAU": 4000, "XAG": 50 } } }))
            .unwrap();
        assert_eq!(quote.prices.xau, Some(4000.0));
        assert_eq!(quote.prices.xag, Some(50.0));
        assert_eq!(quote.base, None);
    }

    #[test]
    fn top_level_rates_with_base() {
        let quote = normalize_quote(&json!({
            "success": true,
            "base": "usd",
            "rates": { "XAU": 2350.25, "XAG": "29.80" }
        }))
        .unwrap();
        assert_eq!(quote.prices.xau, Some(2350.25));
        assert_eq!(quote.prices.xag, Some(29.8));
        assert_eq!(quote.base.as_deref(), Some("USD"));
    }

    #[test]
    fn flat_and_case_varied_keys() {
        let flat = normalize_quote(&json!({ "xau": 2000.0, "Xag": 25.0 })).unwrap();
        assert_eq!(flat.prices.xau, Some(2000.0));
        assert_eq!(flat.prices.xag, Some(25.0));

        let data_flat = normalize_quote(&json!({ "Data": { "Gold": 1990, "SILVER": 24 } }))
            .unwrap();
        assert_eq!(data_flat.prices.xau, Some(1990.0));
        assert_eq!(data_flat.prices.xag, Some(24.0));
    }

    #[test]
    fn partial_data_keeps_missing_instrument_null() {
        let quote = normalize_quote(&json!({ "rates": { "USDXAU": 2100 } })).unwrap();
        assert_eq!(quote.prices.xau, Some(2100.0));
        assert_eq!(quote.prices.xag, None);
    }

    #[test]
    fn unrecognizable_response_reports_shape_not_values() {
        let err = normalize_quote(&json!({
            "success": false,
            "error": { "code": 101, "info": "secret-ish detail" }
        }))
        .unwrap_err();
        match err {
            UpstreamError::NoPriceData { shape } => {
                assert!(shape.contains("success: bool"));
                assert!(shape.contains("error: {code: number, info: string}"));
                assert!(!shape.contains("secret-ish"));
            }
            other => panic!("expected NoPriceData, got {:?}", other),
        }
    }

    #[test]
    fn zero_and_negative_prices_count_as_missing() {
        assert!(normalize_quote(&json!({ "rates": { "XAU": 0, "XAG": -1 } })).is_err());
    }

    #[test]
    fn shape_summary_is_bounded() {
        let mut wide = serde_json::Map::new();
        for i in 0..50 {
            wide.insert(format!("a_rather_long_key_name_{i}"), json!({ "x": { "y": 1 } }));
        }
        let summary = shape_summary(&Value::Object(wide));
        assert!(summary.chars().count() <= MAX_SHAPE_CHARS);
        assert!(summary.ends_with("..."));
    }
}
