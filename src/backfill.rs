use crate::config::Config;
use crate::error::{EtlError, Result};
use crate::http::HttpClient;
use crate::resources::{self, atp, MATCHES};
use crate::warehouse::{create_warehouse, Warehouse};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Reload ATP match files for a year range under a bounded worker pool.
/// Merge keys make the reload idempotent, so the watermark is ignored.
pub async fn run_backfill(
    config: Config,
    year_from: i32,
    year_to: i32,
    workers: usize,
) -> Result<()> {
    if year_from > year_to {
        return Err(EtlError::Config(format!(
            "Invalid year range: {} > {}",
            year_from, year_to
        )));
    }

    info!(
        "Starting backfill of matches {}..={} with {} workers",
        year_from, year_to, workers
    );

    let client = Arc::new(HttpClient::new(config.sources.clone()));
    let warehouse: Arc<dyn Warehouse> = create_warehouse(config.warehouse.clone())?.into();
    warehouse.connect().await?;

    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut handles = Vec::new();

    for year in year_from..=year_to {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| EtlError::Generic(anyhow::anyhow!("Semaphore acquire error: {}", e)))?;
        let client = client.clone();
        let warehouse = warehouse.clone();
        let config = config.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permit;
            match load_year(&client, &*warehouse, &config, year).await {
                Ok(loaded) => info!("Year {}: {} match records loaded", year, loaded),
                Err(e) => warn!("Year {} failed: {}", year, e),
            }
        }));
    }

    for result in futures::future::join_all(handles).await {
        result.map_err(|e| EtlError::Generic(anyhow::anyhow!("Join error: {}", e)))?;
    }

    info!("Backfill completed");
    Ok(())
}

async fn load_year(
    client: &HttpClient,
    warehouse: &dyn Warehouse,
    config: &Config,
    year: i32,
) -> Result<usize> {
    let rows = atp::fetch_matches_year(client, &config.sources, year).await?;
    let records = resources::build_records(&MATCHES, rows);
    let loaded = records.len();

    for chunk in records.chunks(config.etl.batch_size.max(1)) {
        warehouse.merge(&MATCHES, chunk.to_vec()).await?;
    }

    Ok(loaded)
}
