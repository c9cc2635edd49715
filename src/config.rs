use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub sources: SourcesConfig,
    pub warehouse: WarehouseConfig,
    pub etl: EtlConfig,
}

#[derive(Debug, Clone)]
pub struct SourcesConfig {
    /// Base URL for the GitHub-hosted ATP Tour CSV files.
    pub atp_base_url: String,
    /// Base URL for the Ergast Formula 1 REST API.
    pub ergast_base_url: String,
    /// URL of the restcountries JSON dataset.
    pub countries_url: String,
    pub max_retries: u32,
    pub timeout_seconds: u64,
    pub rate_limit_per_second: u32,
}

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub warehouse_type: String, // "duckdb", "postgres"
    pub connection_string: Option<String>, // For Postgres
    pub database_path: Option<String>,     // For DuckDB
    /// Schema the resource tables land in.
    pub dataset: String,
    /// Local stage directory for bulk-load temp files.
    pub stage_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub batch_size: usize,
    /// Page size for paginated Ergast requests.
    pub page_limit: u64,
    /// First season of ATP match files to download.
    pub matches_year_from: i32,
    pub incremental_interval_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sources: SourcesConfig {
                atp_base_url: env::var("ATP_BASE_URL").unwrap_or_else(|_| {
                    "https://raw.githubusercontent.com/JeffSackmann/tennis_atp/master".to_string()
                }),
                ergast_base_url: env::var("ERGAST_BASE_URL")
                    .unwrap_or_else(|_| "https://ergast.com/api/f1".to_string()),
                countries_url: env::var("COUNTRIES_URL")
                    .unwrap_or_else(|_| "https://restcountries.com/v3.1/all".to_string()),
                max_retries: env::var("HTTP_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
                timeout_seconds: env::var("HTTP_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
                rate_limit_per_second: env::var("HTTP_RATE_LIMIT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(4),
            },
            warehouse: WarehouseConfig {
                warehouse_type: env::var("WAREHOUSE_TYPE")
                    .unwrap_or_else(|_| "duckdb".to_string())
                    .to_lowercase(),
                connection_string: env::var("WAREHOUSE_CONNECTION").ok(),
                database_path: env::var("DUCKDB_PATH")
                    .ok()
                    .or(Some("atp_tour.duckdb".to_string())),
                dataset: env::var("DATASET_NAME").unwrap_or_else(|_| "raw".to_string()),
                stage_dir: env::var("STAGE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| env::temp_dir().join("atp_etl_stage")),
            },
            etl: EtlConfig {
                batch_size: env::var("ETL_BATCH_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
                page_limit: env::var("ERGAST_PAGE_LIMIT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
                matches_year_from: env::var("MATCHES_YEAR_FROM")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1968),
                incremental_interval_seconds: env::var("ETL_INTERVAL_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            },
        }
    }
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        let config = Config::default();
        if config.etl.page_limit == 0 {
            return Err(crate::EtlError::Config(
                "ERGAST_PAGE_LIMIT must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}
