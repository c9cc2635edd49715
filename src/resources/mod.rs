use crate::config::Config;
use crate::error::{EtlError, Result};
use crate::http::HttpClient;
use crate::records::{Record, Row, Watermark, WatermarkKind, WriteDisposition};
use chrono::{Datelike, Utc};
use serde_json::Value;
use std::collections::HashMap;

pub mod atp;
pub mod countries;
pub mod ergast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Players,
    Matches,
    Rankings,
    Countries,
    F1Drivers,
    F1Seasons,
    F1SeasonDetails,
}

#[derive(Debug, Clone, Copy)]
pub struct WatermarkColumn {
    pub column: &'static str,
    pub kind: WatermarkKind,
}

/// A single named, incrementally loadable data stream.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    /// Destination table name.
    pub name: &'static str,
    pub primary_key: &'static [&'static str],
    pub disposition: WriteDisposition,
    pub watermark: Option<WatermarkColumn>,
}

pub const PLAYERS: ResourceSpec = ResourceSpec {
    kind: ResourceKind::Players,
    name: "players",
    primary_key: &["player_id"],
    disposition: WriteDisposition::Merge,
    watermark: Some(WatermarkColumn {
        column: "player_id",
        kind: WatermarkKind::Int,
    }),
};

pub const MATCHES: ResourceSpec = ResourceSpec {
    kind: ResourceKind::Matches,
    name: "matches",
    primary_key: &["tourney_id", "match_num"],
    disposition: WriteDisposition::Merge,
    watermark: Some(WatermarkColumn {
        column: "tourney_date",
        kind: WatermarkKind::Int,
    }),
};

pub const RANKINGS: ResourceSpec = ResourceSpec {
    kind: ResourceKind::Rankings,
    name: "rankings",
    primary_key: &["ranking_date", "rank"],
    disposition: WriteDisposition::Merge,
    watermark: Some(WatermarkColumn {
        column: "ranking_date",
        kind: WatermarkKind::Int,
    }),
};

pub const COUNTRIES: ResourceSpec = ResourceSpec {
    kind: ResourceKind::Countries,
    name: "countries",
    primary_key: &[],
    disposition: WriteDisposition::Replace,
    watermark: None,
};

pub const F1_DRIVERS: ResourceSpec = ResourceSpec {
    kind: ResourceKind::F1Drivers,
    name: "f1_drivers",
    primary_key: &["driverId"],
    disposition: WriteDisposition::Replace,
    watermark: None,
};

pub const F1_SEASONS: ResourceSpec = ResourceSpec {
    kind: ResourceKind::F1Seasons,
    name: "f1_seasons",
    primary_key: &["season"],
    disposition: WriteDisposition::Replace,
    watermark: None,
};

pub const F1_SEASON_DETAILS: ResourceSpec = ResourceSpec {
    kind: ResourceKind::F1SeasonDetails,
    name: "f1_season_details",
    primary_key: &["season", "round"],
    disposition: WriteDisposition::Replace,
    watermark: None,
};

/// All resources, in load order. season_details resolves its paths from the
/// seasons extract, so it comes last.
pub const REGISTRY: &[ResourceSpec] = &[
    PLAYERS,
    MATCHES,
    RANKINGS,
    COUNTRIES,
    F1_DRIVERS,
    F1_SEASONS,
    F1_SEASON_DETAILS,
];

pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Download the full extract for a resource.
pub async fn fetch_rows(
    spec: &ResourceSpec,
    client: &HttpClient,
    config: &Config,
) -> Result<Vec<Row>> {
    match spec.kind {
        ResourceKind::Players => atp::fetch_players(client, &config.sources).await,
        ResourceKind::Matches => {
            atp::fetch_matches(
                client,
                &config.sources,
                config.etl.matches_year_from,
                current_year(),
            )
            .await
        }
        ResourceKind::Rankings => atp::fetch_rankings(client, &config.sources).await,
        ResourceKind::Countries => countries::fetch(client, &config.sources).await,
        ResourceKind::F1Drivers => {
            ergast::fetch_endpoint(client, config, "drivers.json").await
        }
        ResourceKind::F1Seasons => {
            ergast::fetch_endpoint(client, config, "seasons.json").await
        }
        ResourceKind::F1SeasonDetails => ergast::fetch_season_details(client, config).await,
    }
}

/// Turn rows into load records. Rows missing a primary-key column are
/// skipped with a warning; duplicate keys within one extract keep the last
/// occurrence so the bulk upsert never sees the same key twice.
pub fn build_records(spec: &ResourceSpec, rows: Vec<Row>) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::with_capacity(rows.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let record = match record_for_row(spec, row) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("{}: skipping row: {}", spec.name, e);
                continue;
            }
        };
        match seen.get(&record.record_id) {
            Some(&idx) => records[idx] = record,
            None => {
                seen.insert(record.record_id.clone(), records.len());
                records.push(record);
            }
        }
    }

    records
}

fn record_for_row(spec: &ResourceSpec, row: Row) -> Result<Record> {
    let key_parts = if spec.primary_key.is_empty() {
        // Keyless resource: hash the whole payload.
        vec![serde_json::to_string(&Value::Object(row.clone()))?]
    } else {
        spec.primary_key
            .iter()
            .map(|column| {
                row.get(*column)
                    .filter(|v| !v.is_null())
                    .map(key_part)
                    .ok_or_else(|| {
                        EtlError::Source(format!("missing primary key column '{}'", column))
                    })
            })
            .collect::<Result<Vec<_>>>()?
    };

    let record_id = Record::generate_record_id(spec.name, &key_parts);
    let watermark = spec
        .watermark
        .and_then(|w| row.get(w.column).and_then(|v| Watermark::from_value(v, w.kind)));

    Ok(Record::new(record_id, watermark, Value::Object(row)))
}

fn key_part(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
