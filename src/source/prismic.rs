//! Prismic REST API client

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

use super::{ContentSource, PageToken, RawPage, SourceError};
use crate::content::raw::{RawDocument, SearchResponse};

const USER_AGENT: &str = concat!("spacetraveling/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// API descriptor returned by the endpoint root
#[derive(Debug, Deserialize)]
struct ApiDescriptor {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Client for a Prismic repository (`https://<repo>.cdn.prismic.io/api/v2`)
pub struct PrismicSource {
    client: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl PrismicSource {
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self, SourceError> {
        let endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|e| SourceError::Config(format!("api_endpoint {:?}: {}", endpoint, e)))?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            access_token: access_token.filter(|t| !t.is_empty()),
            master_ref: OnceCell::new(),
        })
    }

    /// The ref that identifies the currently published content
    async fn master_ref(&self) -> Result<&str, SourceError> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let mut url = self.endpoint.clone();
                self.authorize(&mut url);
                let api: ApiDescriptor = self.get_json(url).await?;
                api.refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .map(|r| r.reference)
                    .ok_or_else(|| SourceError::Decode {
                        url: self.endpoint.to_string(),
                        message: "no master ref in API descriptor".to_string(),
                    })
            })
            .await?;
        Ok(reference.as_str())
    }

    fn authorize(&self, url: &mut Url) {
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
    }

    async fn search(&self, predicate: &str, page_size: usize) -> Result<SearchResponse, SourceError> {
        let master_ref = self.master_ref().await?.to_string();
        let mut url = Url::parse(&format!(
            "{}/documents/search",
            self.endpoint.as_str().trim_end_matches('/')
        ))
        .map_err(|e| SourceError::Config(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("ref", &master_ref)
            .append_pair("q", predicate)
            .append_pair("pageSize", &page_size.max(1).to_string());
        self.authorize(&mut url);
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        let shown = redact(&url);
        tracing::debug!("GET {}", shown);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(SourceError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), url = %shown, "content source error");
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: shown,
            });
        }

        let body = response.text().await.map_err(SourceError::Unreachable)?;
        serde_json::from_str(&body).map_err(|e| SourceError::Decode {
            url: shown,
            message: e.to_string(),
        })
    }

    /// Only pages on the configured API origin are followed
    fn page_url(&self, token: &PageToken) -> Result<Url, SourceError> {
        let url = Url::parse(token.as_str())
            .map_err(|_| SourceError::InvalidToken(token.to_string()))?;
        if url.origin() != self.endpoint.origin() {
            return Err(SourceError::InvalidToken(token.to_string()));
        }
        Ok(url)
    }
}

/// Hide the access token when logging a URL
fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "access_token") {
        return url.to_string();
    }
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "access_token" {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

/// The URL without its `access_token`; cursors handed out must not carry it
fn without_access_token(url: &Url) -> Url {
    let mut clean = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| *k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(pairs);
    }
    clean
}

/// Quote a value for use inside a predicate
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn into_page(response: SearchResponse) -> RawPage {
    RawPage {
        results: response.results,
        next_page: response
            .next_page
            .filter(|n| !n.is_empty())
            .and_then(|next| match Url::parse(&next) {
                Ok(url) => Some(PageToken::new(without_access_token(&url).to_string())),
                Err(e) => {
                    tracing::warn!("Ignoring unparseable next_page: {}", e);
                    None
                }
            }),
    }
}

#[async_trait]
impl ContentSource for PrismicSource {
    async fn list_by_type(
        &self,
        type_tag: &str,
        page_size: usize,
    ) -> Result<RawPage, SourceError> {
        let predicate = format!("[[at(document.type,{})]]", quote(type_tag));
        Ok(into_page(self.search(&predicate, page_size).await?))
    }

    async fn fetch_page(&self, token: &PageToken) -> Result<RawPage, SourceError> {
        let mut url = without_access_token(&self.page_url(token)?);
        self.authorize(&mut url);
        let response: SearchResponse = self.get_json(url).await?;
        Ok(into_page(response))
    }

    async fn get_by_uid(&self, type_tag: &str, uid: &str) -> Result<RawDocument, SourceError> {
        let predicate = format!("[[at(my.{}.uid,{})]]", type_tag, quote(uid));
        let response = self.search(&predicate, 1).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::not_found(type_tag, uid))
    }

    fn name(&self) -> &'static str {
        "prismic"
    }
}
