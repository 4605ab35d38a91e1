use std::path::Path;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::error::FetchError;

/// Where page content comes from. One call per URL, no retries.
pub trait PageSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain blocking GET. Redirects and timeouts are whatever reqwest does by default.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(ua) = user_agent {
            builder = builder.user_agent(ua.to_string());
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(HttpFetcher { client })
    }
}

impl PageSource for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.text()?;
        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(body)
    }
}

/// Reads HTML from disk; the "url" is a file path.
pub struct FileSource;

impl PageSource for FileSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let path = Path::new(url);
        let bytes = std::fs::read(path).map_err(|source| FetchError::File {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answers exactly one request on a loopback port with `response`.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn file_source_reads_fixture() {
        let html = FileSource.fetch("tests/fixtures/page.html").unwrap();
        assert!(html.contains("<h1>A great day</h1>"));
    }

    #[test]
    fn file_source_missing_file() {
        let err = FileSource.fetch("tests/fixtures/absent.html").unwrap_err();
        assert_eq!(err.kind(), "file");
    }

    #[test]
    fn file_source_empty_file() {
        let err = FileSource.fetch("tests/fixtures/empty.html").unwrap_err();
        assert!(matches!(err, FetchError::EmptyBody));
    }

    #[test]
    fn http_transport_error_is_fetch_error() {
        let fetcher = HttpFetcher::new(Some("page_sentiment-test")).unwrap();
        // Port 9 on loopback (discard) is closed on any normal machine.
        let err = fetcher.fetch("http://127.0.0.1:9/").unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn http_malformed_url_is_transport_error() {
        let fetcher = HttpFetcher::new(None).unwrap();
        let err = fetcher.fetch("not a url").unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn http_not_found_is_status_error() {
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let err = HttpFetcher::new(None).unwrap().fetch(&url).unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
        assert_eq!(err.kind(), "status");
    }

    #[test]
    fn http_other_success_codes_are_rejected() {
        let url = serve_once(
            "HTTP/1.1 201 Created\r\nContent-Length: 11\r\nConnection: close\r\n\r\n<p>made</p>",
        );
        let err = HttpFetcher::new(None).unwrap().fetch(&url).unwrap_err();
        assert!(matches!(err, FetchError::Status(201)));
    }

    #[test]
    fn http_ok_returns_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 11\r\nConnection: close\r\n\r\n<p>good</p>",
        );
        let body = HttpFetcher::new(None).unwrap().fetch(&url).unwrap();
        assert_eq!(body, "<p>good</p>");
    }

    #[test]
    fn http_ok_with_empty_body_is_skipped() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let err = HttpFetcher::new(None).unwrap().fetch(&url).unwrap_err();
        assert!(matches!(err, FetchError::EmptyBody));
    }
}
