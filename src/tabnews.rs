use std::fmt;
use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

pub const TABNEWS_API_BASE: &str = "https://www.tabnews.com.br/api/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("http error {status}")]
    Http { status: u16 },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SourceError::Http {
                status: status.as_u16(),
            },
            None => SourceError::Network(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Relevant,
    New,
    Old,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Relevant => "relevant",
            Strategy::New => "new",
            Strategy::Old => "old",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "relevant" => Some(Strategy::Relevant),
            "new" => Some(Strategy::New),
            "old" => Some(Strategy::Old),
            _ => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    #[serde(default)]
    pub title: String,
    pub slug: String,
    pub owner_username: String,
    #[serde(default)]
    pub tabcoins: i64,
    #[serde(default)]
    pub children_deep_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDetail {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub owner_username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub body: String,
    pub owner_username: String,
    #[serde(default)]
    pub children: Vec<Comment>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Token(pub String);

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    token: String,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
    token: Option<String>,
}

impl Client {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        if config.user_agent.trim().is_empty() {
            anyhow::bail!("tabnews client user agent required");
        }
        let base = config
            .base_url
            .filter(|base| !base.trim().is_empty())
            .unwrap_or_else(|| TABNEWS_API_BASE.to_string());
        let base_url = Url::parse(base.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("tabnews base url cannot hold paths: {}", base_url);
        }

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
            token: config.token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_token(&mut self, token: Token) {
        self.token = Some(token.0);
    }

    pub fn list_contents(
        &self,
        page: u32,
        per_page: u32,
        strategy: Strategy,
    ) -> Result<Vec<FeedItem>, SourceError> {
        let url = self.listing_url(&["contents"], page, per_page, strategy)?;
        self.get_json(url)
    }

    pub fn list_user_contents(
        &self,
        owner: &str,
        page: u32,
        per_page: u32,
        strategy: Strategy,
    ) -> Result<Vec<FeedItem>, SourceError> {
        let url = self.listing_url(&["contents", owner], page, per_page, strategy)?;
        self.get_json(url)
    }

    pub fn get_content(&self, owner: &str, slug: &str) -> Result<ContentDetail, SourceError> {
        let url = self.endpoint(&["contents", owner, slug]);
        self.get_json(url)
    }

    pub fn get_comments(&self, owner: &str, slug: &str) -> Result<Vec<Comment>, SourceError> {
        let url = self.endpoint(&["contents", owner, slug, "children"]);
        self.get_json(url)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Token, SourceError> {
        let url = self.endpoint(&["sessions"]);
        debug!("tabnews: POST {}", url.path());
        let req = self
            .http
            .post(url)
            .header(USER_AGENT, &self.user_agent)
            .json(&Credentials { email, password });
        let session: SessionResponse = self.send(req)?;
        Ok(Token(session.token))
    }

    fn listing_url(
        &self,
        segments: &[&str],
        page: u32,
        per_page: u32,
        strategy: Strategy,
    ) -> Result<Url, SourceError> {
        if page == 0 {
            return Err(SourceError::InvalidArgument("page must be at least 1"));
        }
        if per_page == 0 {
            return Err(SourceError::InvalidArgument("per_page must be at least 1"));
        }
        let mut url = self.endpoint(segments);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string())
            .append_pair("strategy", strategy.as_str());
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        debug!("tabnews: GET {}", url);
        let mut req = self.http.get(url).header(USER_AGENT, &self.user_agent);
        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(req)
    }

    fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, SourceError> {
        let resp = req.send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
            });
        }
        let body = resp.text()?;
        decode(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|err| SourceError::Decode(err.to_string()))
}
