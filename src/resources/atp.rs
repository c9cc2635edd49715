use crate::config::SourcesConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::records::Row;
use crate::tabular;
use tracing::{debug, warn};

/// Ranking files are split by decade, plus a rolling "current" file.
const RANKING_DECADES: &[&str] = &["70", "80", "90", "00", "10", "20"];

pub fn players_url(base: &str) -> String {
    format!("{}/atp_players.csv", base.trim_end_matches('/'))
}

pub fn matches_url(base: &str, year: i32) -> String {
    format!("{}/atp_matches_{}.csv", base.trim_end_matches('/'), year)
}

pub fn rankings_urls(base: &str) -> Vec<String> {
    let base = base.trim_end_matches('/');
    let mut urls: Vec<String> = RANKING_DECADES
        .iter()
        .map(|decade| format!("{}/atp_rankings_{}s.csv", base, decade))
        .collect();
    urls.push(format!("{}/atp_rankings_current.csv", base));
    urls
}

pub async fn fetch_players(client: &HttpClient, config: &SourcesConfig) -> Result<Vec<Row>> {
    let url = players_url(&config.atp_base_url);
    debug!("Downloading ATP players data from: {}", url);
    let text = client.fetch_text(&url).await?;
    tabular::parse_csv(&text)
}

/// Download one season's match file.
pub async fn fetch_matches_year(
    client: &HttpClient,
    config: &SourcesConfig,
    year: i32,
) -> Result<Vec<Row>> {
    let url = matches_url(&config.atp_base_url, year);
    debug!("Downloading ATP matches data from: {}", url);
    let text = client.fetch_text(&url).await?;
    tabular::parse_csv(&text)
}

/// Download match files for a year range. A failed year is logged and
/// skipped; merge keys make the next run pick it up again.
pub async fn fetch_matches(
    client: &HttpClient,
    config: &SourcesConfig,
    year_from: i32,
    year_to: i32,
) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for year in year_from..=year_to {
        match fetch_matches_year(client, config, year).await {
            Ok(mut year_rows) => rows.append(&mut year_rows),
            Err(e) => warn!("Failed to fetch matches for {}: {}", year, e),
        }
    }
    Ok(rows)
}

pub async fn fetch_rankings(client: &HttpClient, config: &SourcesConfig) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for url in rankings_urls(&config.atp_base_url) {
        debug!("Downloading ATP rankings data from: {}", url);
        match client.fetch_text(&url).await {
            Ok(text) => rows.append(&mut tabular::parse_csv(&text)?),
            Err(e) => warn!("Failed to fetch rankings file {}: {}", url, e),
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://raw.githubusercontent.com/JeffSackmann/tennis_atp/master";

    #[test]
    fn players_url_shape() {
        assert_eq!(
            players_url(BASE),
            format!("{}/atp_players.csv", BASE)
        );
        // Trailing slash is tolerated
        assert_eq!(players_url(&format!("{}/", BASE)), players_url(BASE));
    }

    #[test]
    fn matches_urls_cover_the_year_range() {
        assert_eq!(
            matches_url(BASE, 1968),
            format!("{}/atp_matches_1968.csv", BASE)
        );
        let urls: Vec<String> = (1968..=1970).map(|y| matches_url(BASE, y)).collect();
        assert_eq!(urls.len(), 3);
        assert!(urls[2].ends_with("atp_matches_1970.csv"));
    }

    #[test]
    fn rankings_urls_cover_decades_and_current() {
        let urls = rankings_urls(BASE);
        assert_eq!(urls.len(), 7);
        assert!(urls[0].ends_with("atp_rankings_70s.csv"));
        assert!(urls[5].ends_with("atp_rankings_20s.csv"));
        assert!(urls[6].ends_with("atp_rankings_current.csv"));
    }
}
