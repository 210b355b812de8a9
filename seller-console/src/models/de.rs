//! Lenient field decoders. The backend is not consistent about sending
//! numbers as numbers, so amounts and counts accept strings too.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

pub fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?.trunc() as i64)
}

/// Strings and numbers become text; anything else reads as absent.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Format an amount the way the dashboard shows money.
pub fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

/// `YYYY-MM-DD` from an ISO timestamp, or the raw value if it does not parse.
pub fn date_only(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub fn date_time(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "number")]
        price: f64,
        #[serde(default, deserialize_with = "integer")]
        stock: i64,
        #[serde(default, deserialize_with = "opt_string")]
        customer: Option<String>,
    }

    #[test]
    fn numbers_accept_strings_and_nulls() {
        let row: Row =
            serde_json::from_str(r#"{"price": "12.5", "stock": 3, "customer": null}"#).unwrap();
        assert_eq!(row.price, 12.5);
        assert_eq!(row.stock, 3);
        assert!(row.customer.is_none());

        let row: Row = serde_json::from_str(r#"{"price": null, "customer": 42}"#).unwrap();
        assert_eq!(row.price, 0.0);
        assert_eq!(row.customer.as_deref(), Some("42"));
    }

    #[test]
    fn dates_fall_back_to_raw_text() {
        assert_eq!(date_only("2026-03-01T10:15:00.000Z"), "2026-03-01");
        assert_eq!(date_only("yesterday"), "yesterday");
    }
}
