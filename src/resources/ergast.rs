use crate::config::Config;
use crate::error::{EtlError, Result};
use crate::http::HttpClient;
use crate::records::Row;
use serde_json::Value;
use tracing::{debug, warn};

/// Fetch every row of one Ergast endpoint, walking `limit`/`offset` pages
/// until `MRData.total` is exhausted or a page comes back empty.
pub async fn fetch_endpoint(
    client: &HttpClient,
    config: &Config,
    path: &str,
) -> Result<Vec<Row>> {
    let url = endpoint_url(&config.sources.ergast_base_url, path);
    let limit = config.etl.page_limit;

    let mut rows = Vec::new();
    let mut offset: u64 = 0;

    loop {
        debug!("Fetching {} (limit={}, offset={})", url, limit, offset);
        let query = [
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        let body = client.fetch_json(&url, &query).await?;
        let page = Page::parse(&body)?;

        let page_len = page.rows.len();
        let total = page.total;
        rows.extend(page.rows);

        match next_offset(offset, page_len, total) {
            Some(next) => offset = next,
            None => break,
        }
    }

    Ok(rows)
}

/// Where to fetch the next page, or None when pagination is done: the
/// advertised total is exhausted, or the page came back empty (defense
/// against a total that overstates the row count).
fn next_offset(offset: u64, page_len: usize, total: u64) -> Option<u64> {
    if page_len == 0 {
        return None;
    }
    let next = offset + page_len as u64;
    if next >= total {
        None
    } else {
        Some(next)
    }
}

/// Fetch the per-season detail endpoint for every season in the seasons
/// extract (path parameter resolved from the `season` field).
pub async fn fetch_season_details(client: &HttpClient, config: &Config) -> Result<Vec<Row>> {
    let seasons = fetch_endpoint(client, config, "seasons.json").await?;

    let mut rows = Vec::new();
    for season in &seasons {
        let Some(year) = season_field(season) else {
            warn!("f1_season_details: season row without a season field");
            continue;
        };
        let path = format!("{}.json", year);
        match fetch_endpoint(client, config, &path).await {
            Ok(mut detail_rows) => rows.append(&mut detail_rows),
            Err(e) => warn!("Failed to fetch season {}: {}", year, e),
        }
    }

    Ok(rows)
}

fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn season_field(row: &Row) -> Option<String> {
    match row.get("season") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// One page of an Ergast response. `MRData.total` is a decimal string; rows
/// live under the first array inside the first `*Table` object.
struct Page {
    total: u64,
    rows: Vec<Row>,
}

impl Page {
    fn parse(body: &Value) -> Result<Page> {
        let mrdata = body
            .get("MRData")
            .and_then(|v| v.as_object())
            .ok_or_else(|| EtlError::Source("missing MRData envelope".to_string()))?;

        let total = mrdata
            .get("total")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let table = mrdata
            .iter()
            .find(|(key, value)| key.ends_with("Table") && value.is_object())
            .map(|(_, value)| value)
            .ok_or_else(|| EtlError::Source("MRData has no table object".to_string()))?;

        let items = table
            .as_object()
            .and_then(|t| t.values().find_map(|v| v.as_array()))
            .ok_or_else(|| EtlError::Source("table object has no row array".to_string()))?;

        let rows = items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect();

        Ok(Page { total, rows })
    }
}
