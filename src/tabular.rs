use crate::error::Result;
use crate::records::Row;
use serde_json::{Number, Value};

/// Parse a CSV body into rows keyed by header, inferring scalar types per
/// field: empty string becomes null, then i64, then f64, else string.
pub fn parse_csv(text: &str) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        let mut row = Row::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), infer_scalar(field));
        }
        rows.push(row);
    }

    Ok(rows)
}

fn infer_scalar(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = field.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(field.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = "\
player_id,name_first,name_last,hand,dob,ioc,height
104925,Novak,Djokovic,R,19870522,SRB,188
210097,Holger,Rune,R,20030429,DEN,
100001,Bill,Smith,U,,USA,180.5
";

    #[test]
    fn parses_headers_and_rows() {
        let rows = parse_csv(SAMPLE).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["player_id"], json!(104925));
        assert_eq!(rows[0]["name_last"], json!("Djokovic"));
    }

    #[test]
    fn empty_fields_become_null() {
        let rows = parse_csv(SAMPLE).unwrap();
        assert_eq!(rows[1]["height"], Value::Null);
        assert_eq!(rows[2]["dob"], Value::Null);
    }

    #[test]
    fn numeric_inference() {
        let rows = parse_csv(SAMPLE).unwrap();
        assert_eq!(rows[0]["dob"], json!(19870522));
        assert_eq!(rows[2]["height"], json!(180.5));
        // Country codes stay strings even when they look odd
        assert_eq!(rows[0]["ioc"], json!("SRB"));
    }

    #[test]
    fn short_records_are_tolerated() {
        let rows = parse_csv("a,b,c\n1,2\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("c"), None);
        assert_eq!(rows[0]["b"], json!(2));
    }
}
