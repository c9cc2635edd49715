use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A parsed source row: column name to inferred scalar (or nested JSON for
/// REST sources).
pub type Row = Map<String, Value>;

/// How a resource lands in its destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDisposition {
    /// Upsert by primary key.
    Merge,
    /// Rebuild the table from the extract.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkKind {
    Int,
    Text,
}

/// A high-water mark value read from a destination table. Int and Text
/// watermarks never compare across kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Watermark {
    Int(i64),
    Text(String),
}

impl Watermark {
    /// Coerce a row value into a watermark of the expected kind. Ergast
    /// returns numbers as decimal strings, CSV inference may produce
    /// integral floats; both are accepted for Int.
    pub fn from_value(value: &Value, kind: WatermarkKind) -> Option<Watermark> {
        match kind {
            WatermarkKind::Int => match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| {
                        n.as_f64()
                            .filter(|f| {
                                f.is_finite()
                                    && f.fract() == 0.0
                                    // Reject values the cast would saturate
                                    && *f >= i64::MIN as f64
                                    && *f < i64::MAX as f64
                            })
                            .map(|f| f as i64)
                    })
                    .map(Watermark::Int),
                Value::String(s) => s.trim().parse().ok().map(Watermark::Int),
                _ => None,
            },
            WatermarkKind::Text => match value {
                Value::String(s) => Some(Watermark::Text(s.clone())),
                Value::Number(n) => Some(Watermark::Text(n.to_string())),
                _ => None,
            },
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Watermark::Int(v) => Some(*v),
            Watermark::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Watermark::Text(v) => Some(v),
            Watermark::Int(_) => None,
        }
    }
}

impl PartialOrd for Watermark {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Watermark::Int(a), Watermark::Int(b)) => a.partial_cmp(b),
            (Watermark::Text(a), Watermark::Text(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Watermark::Int(v) => write!(f, "{}", v),
            Watermark::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Canonical load unit written to the warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub record_id: String,
    pub watermark: Option<Watermark>,
    pub payload: Value,
}

impl Record {
    /// Generate deterministic record_id from the table name and primary key
    /// values.
    pub fn generate_record_id(table: &str, key_parts: &[String]) -> String {
        let input = format!("{}:{}", table, key_parts.join(":"));
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn new(record_id: String, watermark: Option<Watermark>, payload: Value) -> Self {
        Self {
            record_id,
            watermark,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_id_is_deterministic() {
        let a = Record::generate_record_id("players", &["104925".to_string()]);
        let b = Record::generate_record_id("players", &["104925".to_string()]);
        let c = Record::generate_record_id("players", &["104926".to_string()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn record_id_separates_tables() {
        let a = Record::generate_record_id("players", &["1".to_string()]);
        let b = Record::generate_record_id("rankings", &["1".to_string()]);
        assert_ne!(a, b);
    }

    #[test]
    fn int_watermark_coercion() {
        assert_eq!(
            Watermark::from_value(&json!(20240101), WatermarkKind::Int),
            Some(Watermark::Int(20240101))
        );
        assert_eq!(
            Watermark::from_value(&json!("1987"), WatermarkKind::Int),
            Some(Watermark::Int(1987))
        );
        assert_eq!(
            Watermark::from_value(&json!(19870706.0), WatermarkKind::Int),
            Some(Watermark::Int(19870706))
        );
        assert_eq!(Watermark::from_value(&json!("n/a"), WatermarkKind::Int), None);
        assert_eq!(Watermark::from_value(&Value::Null, WatermarkKind::Int), None);
    }

    #[test]
    fn out_of_range_floats_are_rejected() {
        assert_eq!(Watermark::from_value(&json!(1e19), WatermarkKind::Int), None);
        assert_eq!(Watermark::from_value(&json!(-1e19), WatermarkKind::Int), None);
        assert_eq!(Watermark::from_value(&json!(123.5), WatermarkKind::Int), None);
        assert_eq!(
            Watermark::from_value(&json!(9.0e18), WatermarkKind::Int),
            Some(Watermark::Int(9_000_000_000_000_000_000))
        );
    }

    #[test]
    fn watermarks_compare_within_kind_only() {
        assert!(Watermark::Int(2) > Watermark::Int(1));
        assert!(Watermark::Text("2024-02".into()) > Watermark::Text("2024-01".into()));
        assert_eq!(
            Watermark::Int(1).partial_cmp(&Watermark::Text("1".into())),
            None
        );
    }
}
