use std::{fs, path::PathBuf};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::services::errors::ScrapeError;

/// Turns a URL into page HTML once the element the caller waits for is present.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, label: &str, url: &str, ready_selector: &str)
        -> Result<String, ScrapeError>;
}

/// Fetches pages directly. Issuer pages that build their distribution tables server side
/// work as-is; anything that needs script execution shows up as a missing ready selector.
pub struct HttpPageRenderer {
    client: Client,
    error_artifact_dir: PathBuf,
}

impl HttpPageRenderer {
    pub fn new(client: Client, error_artifact_dir: PathBuf) -> Self {
        HttpPageRenderer {
            client,
            error_artifact_dir,
        }
    }

    fn save_diagnostic(&self, label: &str, contents: &str) {
        let path = self
            .error_artifact_dir
            .join(format!("{}_error.html", label.to_lowercase()));
        match fs::write(&path, contents) {
            Ok(_) => debug!("Saved diagnostic page to {}", path.display()),
            Err(e) => warn!("Couldn't save diagnostic page {}: {}", path.display(), e),
        }
    }

    /// Keeps the page only when it loaded and shows `ready_selector`; otherwise the body is
    /// saved as the diagnostic artifact.
    fn accept_page(
        &self,
        label: &str,
        url: &str,
        status: StatusCode,
        body: String,
        ready_selector: &str,
    ) -> Result<String, ScrapeError> {
        if !status.is_success() {
            self.save_diagnostic(label, &body);
            return Err(ScrapeError::Fetch(format!("{} returned {}", url, status)));
        }
        if !contains_selector(&body, ready_selector)? {
            self.save_diagnostic(label, &body);
            return Err(ScrapeError::Parse(format!(
                "'{}' never appeared on {}",
                ready_selector, url
            )));
        }
        Ok(body)
    }
}

pub fn contains_selector(html: &str, selector: &str) -> Result<bool, ScrapeError> {
    let selector = Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid selector '{}': {}", selector, e)))?;
    Ok(Html::parse_document(html).select(&selector).next().is_some())
}

#[async_trait]
impl PageRenderer for HttpPageRenderer {
    async fn render(
        &self,
        label: &str,
        url: &str,
        ready_selector: &str,
    ) -> Result<String, ScrapeError> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                self.save_diagnostic(label, &format!("<!-- GET {} failed: {} -->", url, e));
                return Err(e.into());
            }
        };
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                self.save_diagnostic(label, &format!("<!-- reading {} failed: {} -->", url, e));
                return Err(e.into());
            }
        };
        self.accept_page(label, url, status, body, ready_selector)
    }
}
