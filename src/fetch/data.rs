use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::fetch::query::DataQuery;
use crate::sdmx::SdmxResponse;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

async fn get_text_core(client: &Client, url: &Url) -> Result<String> {
    debug!("fetching {}", url);
    Ok(client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("sending GET {url}"))?
        .error_for_status()
        .with_context(|| format!("GET {url} returned an error status"))?
        .text()
        .await
        .with_context(|| format!("reading body of {url}"))?)
}

async fn get_text_with_retry(client: &Client, url: &Url) -> Result<String> {
    let mut attempts = 0;
    loop {
        match get_text_core(client, url).await {
            Ok(t) => return Ok(t),
            Err(e) if attempts < MAX_RETRIES => {
                attempts += 1;
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempts - 1);
                warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "retrying");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                error!(%url, error = %e, "exhausted retries");
                return Err(e);
            }
        }
    }
}

/// Download one dataset and parse the SDMX-JSON payload.
#[instrument(level = "info", skip(client, query), fields(dataset = %query.dataset_code()))]
pub async fn fetch_dataset(client: &Client, query: &DataQuery) -> Result<SdmxResponse> {
    let url = query.url()?;
    info!(%url, "fetching dataset");

    let body = get_text_with_retry(client, &url).await?;
    debug!(bytes = body.len(), "downloaded payload");

    serde_json::from_str(&body)
        .with_context(|| format!("parsing SDMX-JSON for dataset {}", query.dataset_code()))
}
