use crate::config::SourcesConfig;
use crate::error::{EtlError, Result};
use crate::http::HttpClient;
use crate::records::Row;
use serde_json::Value;
use tracing::{debug, warn};

/// Download the restcountries JSON dataset: a top-level array of country
/// objects.
pub async fn fetch(client: &HttpClient, config: &SourcesConfig) -> Result<Vec<Row>> {
    debug!("Downloading countries JSON data from: {}", config.countries_url);
    let body = client.fetch_json(&config.countries_url, &[]).await?;
    rows_from_body(&body)
}

fn rows_from_body(body: &Value) -> Result<Vec<Row>> {
    let entries = body
        .as_array()
        .ok_or_else(|| EtlError::Source("countries payload is not an array".to_string()))?;

    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::Object(map) => rows.push(map.clone()),
            other => warn!("countries: skipping non-object entry: {}", other),
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_entries_become_rows() {
        let body = json!([
            {"name": {"common": "Serbia"}, "cca3": "SRB"},
            {"name": {"common": "Denmark"}, "cca3": "DNK"},
            "not-a-country"
        ]);
        let rows = rows_from_body(&body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["cca3"], json!("SRB"));
    }

    #[test]
    fn non_array_payload_is_an_error() {
        assert!(rows_from_body(&json!({"status": 429})).is_err());
    }
}
