use std::path::{Path, PathBuf};

use reqwest::{header::CONTENT_TYPE, Client};
use scraper::{Html, Selector};
use tracing::info;

use crate::{
    archive::{self, ArchiveKind},
    config::Config,
    error::{FigcapError, Result},
};

const ABS_MARKER: &str = "arxiv.org/abs/";

pub struct ArxivClient {
    client: Client,
    base: String,
}

impl ArxivClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client = Client::builder().timeout(cfg.request_timeout()).build()?;
        Ok(Self {
            client,
            base: cfg.arxiv_base_url(),
        })
    }

    /// Fetch a search-results page and collect the ids of every linked
    /// abstract page, in page order.
    pub async fn list_ids(&self, url: &str) -> Result<Vec<String>> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FigcapError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }
        let html = resp.text().await?;
        Ok(parse_listing(&html))
    }

    /// Download the e-print bundle for `id` and unpack it into `dest`.
    pub async fn download_source(&self, id: &str, dest: &Path) -> Result<Vec<PathBuf>> {
        let url = format!("{}/e-print/{}", self.base.trim_end_matches('/'), id);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FigcapError::Status { url, status, body });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = resp.bytes().await?;

        let kind = ArchiveKind::detect(content_type.as_deref(), &data).ok_or_else(|| {
            FigcapError::Archive(format!(
                "unsupported payload for {} (content-type {})",
                id,
                content_type.as_deref().unwrap_or("unknown")
            ))
        })?;
        info!("unpacking {} ({:?}, {} bytes)", id, kind, data.len());

        archive::unpack(kind, &data, dest, &format!("{}.tex", id.replace('/', "_")))
    }
}

/// Extract arXiv ids from anchors pointing at abstract pages.
pub fn parse_listing(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchor_sel = Selector::parse("a[href]").unwrap();

    document
        .select(&anchor_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains(ABS_MARKER))
        .filter_map(|href| href.trim_end_matches('/').rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_keeps_only_abstract_links() {
        let html = r#"
            <ol>
              <li><a href="https://arxiv.org/abs/2310.01234">arXiv:2310.01234</a>
                  <a href="https://arxiv.org/pdf/2310.01234">pdf</a></li>
              <li><a href="https://arxiv.org/abs/2309.11111/">arXiv:2309.11111</a></li>
              <li><a href="/search/?query=NeurIPS">next</a><a>no href</a></li>
            </ol>"#;
        assert_eq!(parse_listing(html), vec!["2310.01234", "2309.11111"]);
    }

    #[test]
    fn listing_without_links_is_empty() {
        assert!(parse_listing("<html><body>nothing</body></html>").is_empty());
    }
}
