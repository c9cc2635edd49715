use crate::config::Config;
use crate::error::Result;
use crate::resources::REGISTRY;
use crate::warehouse::create_warehouse;
use tracing::info;

/// Print a per-resource load summary: row count and current watermark.
pub async fn run_report(config: Config) -> Result<()> {
    let warehouse = create_warehouse(config.warehouse.clone())?;
    warehouse.connect().await?;

    info!("Load summary for dataset '{}'", config.warehouse.dataset);

    for spec in REGISTRY {
        let rows = warehouse.row_count(spec).await?;
        let watermark = warehouse.max_watermark(spec).await?;

        match (spec.watermark, watermark) {
            (Some(w), Some(value)) => {
                info!("{:<20} {:>10} rows  {} = {}", spec.name, rows, w.column, value)
            }
            (Some(w), None) => {
                info!("{:<20} {:>10} rows  {} = (empty)", spec.name, rows, w.column)
            }
            _ => info!("{:<20} {:>10} rows", spec.name, rows),
        }
    }

    Ok(())
}
