//! HTTP side of the mirror: the entry page service and the asset byte fetcher.

use async_trait::async_trait;
use log::{debug, warn};
use mime::Mime;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client, ClientBuilder};
use url::Url;

use crate::config::MirrorConfig;
use crate::dom::Document;
use crate::error::{FetchError, MirrorError};

const MAX_REDIRECTS: usize = 10;

/// Retrieves the raw bytes behind an asset URL.
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Retrieves the entry page of a mirror.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative references resolve against it.
    pub url: Url,
    pub status: u16,
    pub content_type: Option<Mime>,
    pub html: String,
}

impl FetchedPage {
    pub fn parse(&self) -> Result<Document, MirrorError> {
        Document::parse(&self.html)
    }

    /// Missing content types are assumed to be HTML.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(mime) => {
                mime.essence_str() == mime::TEXT_HTML.essence_str()
                    || mime.essence_str() == "application/xhtml+xml"
            }
            None => true,
        }
    }
}

/// False for inline data, fragment-only, `javascript:` and `mailto:` values.
pub fn is_downloadable(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || url.starts_with('#') {
        return false;
    }
    let lower = url.to_ascii_lowercase();
    !lower.starts_with("data:") && !lower.starts_with("javascript:") && !lower.starts_with("mailto:")
}

/// Both services on one reqwest client. Non-2xx responses are returned
/// like any other; the body size is not capped.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &MirrorConfig) -> Result<Self, MirrorError> {
        let client = ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.timeout())
            .timeout(config.timeout())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(MirrorError::Client)?;

        Ok(Self { client })
    }

    fn parse_url(url: &str) -> Result<Url, FetchError> {
        Url::parse(url).map_err(|e| FetchError::MalformedUrl(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(Self::parse_url(url)?).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("HTTP {} for asset {}", status, url);
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(Self::parse_url(url)?).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP {} for {}, parsing the body anyway", status, url);
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Mime>().ok());
        let html = response.text().await?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            content_type,
            html,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP/1.1 responder. Each route maps a path to a raw response
    /// head plus body; unknown paths get a 404.
    async fn serve(routes: Vec<(&'static str, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let head = String::from_utf8_lossy(&buf);
                    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                    let response = routes
                        .iter()
                        .find(|(route, _)| *route == path)
                        .map(|(_, response)| response.clone())
                        .unwrap_or_else(|| "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string());
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}", addr)
    }

    fn ok(content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            content_type,
            body.len(),
            body
        )
    }

    #[test]
    fn test_downloadable() {
        assert!(is_downloadable("https://x.test/a.png"));
        assert!(is_downloadable("/relative/a.png"));
        assert!(!is_downloadable("data:image/png;base64,AAAA"));
        assert!(!is_downloadable("#section"));
        assert!(!is_downloadable("javascript:void(0)"));
        assert!(!is_downloadable("JavaScript:alert(1)"));
        assert!(!is_downloadable("mailto:me@x.test"));
        assert!(!is_downloadable(""));
        assert!(!is_downloadable("   "));
    }

    #[test]
    fn test_is_html() {
        let mut page = FetchedPage {
            url: Url::parse("https://x.test/").unwrap(),
            status: 200,
            content_type: None,
            html: String::new(),
        };
        assert!(page.is_html());
        page.content_type = Some("text/html; charset=utf-8".parse().unwrap());
        assert!(page.is_html());
        page.content_type = Some(mime::APPLICATION_JSON);
        assert!(!page.is_html());
    }

    #[tokio::test]
    async fn test_malformed_url_fails() {
        let fetcher = HttpFetcher::new(&MirrorConfig::default()).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::MalformedUrl(_)));
    }

    #[tokio::test]
    async fn test_connection_failure_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new(&MirrorConfig::default()).unwrap();
        assert!(fetcher.fetch(&format!("http://{}/a.css", addr)).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let base = serve(vec![("/a.css", ok("text/css", "body{}"))]).await;
        let fetcher = HttpFetcher::new(&MirrorConfig::default()).unwrap();

        let bytes = fetcher.fetch(&format!("{}/a.css", base)).await.unwrap();
        assert_eq!(bytes, b"body{}");
    }

    #[tokio::test]
    async fn test_error_status_body_is_returned() {
        let not_found = "HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found".to_string();
        let base = serve(vec![("/gone", not_found)]).await;
        let fetcher = HttpFetcher::new(&MirrorConfig::default()).unwrap();

        let bytes = fetcher.fetch(&format!("{}/gone", base)).await.unwrap();
        assert_eq!(bytes, b"not found");

        let page = fetcher.fetch_page(&format!("{}/gone", base)).await.unwrap();
        assert_eq!(page.status, 404);
        assert_eq!(page.html, "not found");
    }

    #[tokio::test]
    async fn test_page_follows_redirects() {
        let redirect = "HTTP/1.1 301 Moved Permanently\r\nLocation: /final/\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string();
        let base = serve(vec![
            ("/start", redirect),
            ("/final/", ok("text/html; charset=utf-8", "<p>hi</p>")),
        ])
        .await;
        let fetcher = HttpFetcher::new(&MirrorConfig::default()).unwrap();

        let page = fetcher.fetch_page(&format!("{}/start", base)).await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.url.path(), "/final/");
        assert!(page.is_html());
        assert_eq!(page.html, "<p>hi</p>");
    }
}
