use crate::config::Config;
use crate::error::{EtlError, Result};
use crate::http::HttpClient;
use crate::resources::atp;
use crate::warehouse::create_warehouse;
use tracing::{info, warn};

/// Check pipeline health: each source endpoint plus the warehouse.
pub async fn check_health(config: Config) -> Result<()> {
    info!("Running health check");

    let client = HttpClient::new(config.sources.clone());

    // ATP CSV host
    let players_url = atp::players_url(&config.sources.atp_base_url);
    match client.probe(&players_url).await {
        Ok(_) => info!("ATP source health: OK"),
        Err(e) => {
            warn!("ATP source health: FAILED - {}", e);
            return Err(e);
        }
    }

    // Ergast API: one-row page, envelope must parse
    let seasons_url = format!(
        "{}/seasons.json",
        config.sources.ergast_base_url.trim_end_matches('/')
    );
    match client
        .fetch_json(&seasons_url, &[("limit", "1".to_string())])
        .await
    {
        Ok(body) if body.get("MRData").is_some() => info!("Ergast API health: OK"),
        Ok(_) => {
            warn!("Ergast API health: FAILED - missing MRData envelope");
            return Err(EtlError::Source("Ergast response missing MRData".to_string()));
        }
        Err(e) => {
            warn!("Ergast API health: FAILED - {}", e);
            return Err(e);
        }
    }

    // Countries dataset
    match client.probe(&config.sources.countries_url).await {
        Ok(_) => info!("Countries source health: OK"),
        Err(e) => {
            warn!("Countries source health: FAILED - {}", e);
            return Err(e);
        }
    }

    // Warehouse connection and probe query
    let warehouse = create_warehouse(config.warehouse.clone())?;
    match warehouse.connect().await {
        Ok(_) => info!("Warehouse connection: OK"),
        Err(e) => {
            warn!("Warehouse connection: FAILED - {}", e);
            return Err(e);
        }
    }
    match warehouse.health_check().await {
        Ok(_) => info!("Warehouse query health: OK"),
        Err(e) => {
            warn!("Warehouse query health: FAILED - {}", e);
            return Err(e);
        }
    }

    info!("Health check passed");
    Ok(())
}
