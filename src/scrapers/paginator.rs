//! Exhaustive pagination over `{ data, pagination: { links } }` collections.

use reqwest::Url;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use tracing::{debug, info};

use super::fetcher::Fetcher;
use crate::error::ApiError;
use crate::models::Page;

/// Build `base` + `path` with URL-encoded query parameters.
pub fn collection_url(base: &str, path: &str, params: &[(&str, &str)]) -> Result<String, ApiError> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    let url = Url::parse_with_params(&raw, params).map_err(|e| ApiError::Decode {
        url: raw.clone(),
        message: format!("invalid request URL: {}", e),
    })?;
    Ok(url.to_string())
}

/// Fetch `first_url` and every page reachable through `next` links, in order.
///
/// Pages are requested one after another; `next` URIs are used verbatim. Any
/// failed page aborts the whole walk.
pub async fn fetch_all<T: DeserializeOwned>(
    fetcher: &Fetcher,
    first_url: &str,
) -> Result<Vec<T>, ApiError> {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(first_url.to_string());

    let mut page: Page<T> = fetcher.get_json(first_url).await?;
    let mut items = std::mem::take(&mut page.data);
    let mut pages = 1usize;

    while let Some(next) = page.next_uri().map(str::to_owned) {
        if !visited.insert(next.clone()) {
            return Err(ApiError::Decode {
                url: next,
                message: "pagination cycle: next link points at an already fetched page"
                    .to_string(),
            });
        }

        page = fetcher.get_json(&next).await?;
        pages += 1;
        debug!(page = pages, items = page.data.len(), "Fetched page");
        items.append(&mut page.data);
    }

    info!(pages, items = items.len(), url = %first_url, "Pagination complete");
    Ok(items)
}
