//! Live source: scraped client table plus the carts/users/products API.

use reqwest::StatusCode;
use serde_json::Value;
use shop_ledger_core::{JoinKey, RecordSet};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::html::{self, ScrapedTable};
use super::{RecordSource, SourceError, distinct};
use crate::config::PipelineConfig;

const TABLE_ID: &str = "userTable";
const PAGINATION_ID: &str = "pagination";
const CART_HEADERS: [&str; 4] = ["id", "userId", "date", "products"];

/// Body and status of a completed request.
struct Fetched {
    status: StatusCode,
    body: String,
}

/// Fetches inputs over HTTP, pausing between requests.
#[derive(Debug, Clone)]
pub struct LiveSource {
    client: reqwest::Client,
    config: PipelineConfig,
}

impl LiveSource {
    /// Create a source using the URLs, delays and retry budget in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &PipelineConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// GET `url`, retrying rate limits, server errors and transport
    /// failures up to `max_retries` times.
    async fn fetch(&self, url: &Url) -> Result<Fetched, SourceError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Err(err) if attempt < self.config.max_retries && err.is_retryable() => {
                    attempt += 1;
                    let wait = err.retry_after().unwrap_or(self.config.request_delay);
                    warn!(%url, attempt, ?wait, error = %err, "Retrying request");
                    tokio::time::sleep(wait).await;
                }
                result => return result,
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<Fetched, SourceError> {
        debug!(%url, "GET");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(1);
            return Err(SourceError::RateLimited(retry_after));
        }

        if status.is_server_error() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(Fetched { status, body })
    }

    /// GET `url` and fail on any non-success status.
    async fn fetch_ok(&self, url: &Url) -> Result<String, SourceError> {
        let fetched = self.fetch(url).await?;
        if !fetched.status.is_success() {
            tracing::error!(
                %url,
                status = %fetched.status,
                body = %fetched.body.chars().take(200).collect::<String>(),
                "Request returned non-success status"
            );
            return Err(SourceError::Status {
                url: url.to_string(),
                status: fetched.status.as_u16(),
            });
        }
        Ok(fetched.body)
    }

    async fn fetch_page(
        &self,
        url: &Url,
    ) -> Result<(ScrapedTable, Vec<html::PageLink>), SourceError> {
        let body = self.fetch_ok(url).await?;
        let table =
            html::parse_table(&body, TABLE_ID).ok_or_else(|| SourceError::TableNotFound {
                url: url.to_string(),
                id: TABLE_ID,
            })?;
        let links = html::pagination_links(&body, PAGINATION_ID);
        Ok((table, links))
    }

    /// GET `{collection}/{id}` for each distinct id. Any non-success answer,
    /// including server errors and rate limits that outlast the retries,
    /// skips that record. Transport failures still abort.
    async fn fetch_each(
        &self,
        kind: &'static str,
        collection: &str,
        ids: &[JoinKey],
    ) -> Result<RecordSet, SourceError> {
        let ids = distinct(ids);
        let mut values = Vec::with_capacity(ids.len());

        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.request_delay).await;
            }
            let url = self.config.api_endpoint(&format!("{collection}/{id}"))?;
            let fetched = match self.fetch(&url).await {
                Ok(fetched) if fetched.status.is_success() => fetched,
                Ok(fetched) => {
                    warn!(%url, status = %fetched.status, kind, "Skipping record");
                    continue;
                }
                Err(err @ (SourceError::Status { .. } | SourceError::RateLimited(_))) => {
                    warn!(%url, error = %err, kind, "Skipping record");
                    continue;
                }
                Err(err) => return Err(err),
            };
            match parse_json(&url, &fetched.body)? {
                Value::Null => warn!(%url, kind, "Skipping empty record"),
                value => values.push(value),
            }
        }

        info!(kind, requested = ids.len(), fetched = values.len(), "Fetched records");
        Ok(RecordSet::from_values(kind, values)?)
    }
}

impl RecordSource for LiveSource {
    #[instrument(skip(self), fields(url = %self.config.clients_url))]
    async fn clients(&self) -> Result<RecordSet, SourceError> {
        let base = &self.config.clients_url;
        let (mut table, links) = self.fetch_page(base).await?;

        // The first link is the page already fetched.
        for link in links.iter().skip(1) {
            let url = link.resolve(base)?;
            tokio::time::sleep(self.config.page_delay).await;
            let (page, _) = self.fetch_page(&url).await?;
            debug!(page = %link.text, rows = page.rows.len(), "Scraped client page");
            table.rows.extend(page.rows);
        }

        info!(
            pages = links.len().max(1),
            rows = table.rows.len(),
            "Scraped client table"
        );
        Ok(RecordSet::from_rows(table.headers, table.rows)?)
    }

    #[instrument(skip(self))]
    async fn carts(&self) -> Result<RecordSet, SourceError> {
        let url = self.config.api_endpoint("carts")?;
        let body = self.fetch_ok(&url).await?;
        let Value::Array(carts) = parse_json(&url, &body)? else {
            return Err(SourceError::Malformed {
                url: url.to_string(),
                message: "expected a JSON array of carts".to_string(),
            });
        };

        info!(count = carts.len(), "Fetched carts");
        let headers = CART_HEADERS.iter().map(ToString::to_string).collect();
        Ok(RecordSet::with_headers("cart", headers, carts)?)
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn user_profiles(&self, ids: &[JoinKey]) -> Result<RecordSet, SourceError> {
        self.fetch_each("user", "users", ids).await
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn products(&self, ids: &[JoinKey]) -> Result<RecordSet, SourceError> {
        self.fetch_each("product", "products", ids).await
    }
}

/// Parse a JSON body. A blank body reads as `null`.
fn parse_json(url: &Url, body: &str) -> Result<Value, SourceError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            %url,
            error = %e,
            body = %body.chars().take(200).collect::<String>(),
            "Failed to parse JSON response"
        );
        SourceError::Malformed {
            url: url.to_string(),
            message: e.to_string(),
        }
    })
}
