use std::time::Duration;

use reqwest::Url;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::{Result, ScienceError};

const ERROR_BODY_PREVIEW: usize = 200;

// ─── HttpClient ───────────────────────────────────────────────────────────────

/// Plain request/response client shared by every source. One request at a
/// time, no retries; a non-success status is turned into an error.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    pub async fn get_with_headers(&self, url: &str, headers: HeaderMap) -> Result<String> {
        let resp = self.client.get(url).headers(headers).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(ScienceError::ApiError(
                url.to_string(),
                format!("HTTP {}: {preview}", status.as_u16()),
            ));
        }
        Ok(resp.text().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get(url).await?;
        serde_json::from_str(&text).map_err(|e| ScienceError::Parse(e.to_string()))
    }
}

/// User-Agent sent to every service; adds a `mailto:` when an email is
/// configured, which CrossRef uses to route to its polite pool.
pub fn user_agent(polite_email: Option<&str>) -> String {
    match polite_email {
        Some(email) => format!("pubharvest/0.1 (mailto:{email})"),
        None => "pubharvest/0.1".to_string(),
    }
}

/// Join `path` onto `base_url` and append the query pairs, URL-encoded.
pub fn build_url(base_url: &str, path: &str, query: &[(&str, &str)]) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined)
        .map_err(|e| ScienceError::Parse(format!("invalid URL {joined}: {e}")))?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use reqwest::header::{ACCEPT, HeaderValue};

    fn client() -> HttpClient {
        HttpClient::new(Duration::from_secs(5), "pubharvest-test").unwrap()
    }

    #[test]
    fn build_url_joins_and_encodes() {
        let url = build_url(
            "https://eutils.example.org/eutils/",
            "esearch.fcgi",
            &[("term", "ibet[affiliation] AND 2012[pdat]")],
        )
        .unwrap();
        assert_eq!(url.path(), "/eutils/esearch.fcgi");
        let pairs: Vec<_> = url.query_pairs().collect();
        assert_eq!(pairs[0].1, "ibet[affiliation] AND 2012[pdat]");
    }

    #[test]
    fn build_url_rejects_garbage_base() {
        assert!(matches!(
            build_url("not a url", "x", &[]),
            Err(ScienceError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("DOI Not Found")
            .create_async()
            .await;

        let err = client()
            .get(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        match err {
            ScienceError::ApiError(_, msg) => assert!(msg.starts_with("HTTP 404")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn headers_are_forwarded() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/neg")
            .match_header("accept", "text/plain")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        let body = client()
            .get_with_headers(&format!("{}/neg", server.url()), headers)
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }
}
