use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER};
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Status and body of one upstream request.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    /// The body if the upstream answered 2xx. 403 means we are being blocked;
    /// any other status is a plain upstream failure.
    pub fn into_body(self) -> Result<String> {
        match self.status {
            200..=299 => Ok(self.body),
            403 => Err(AppError::Blocked),
            status => Err(AppError::UpstreamStatus(status)),
        }
    }
}

/// Where draw history comes from. One call per tick, no retries.
pub trait DrawSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<FetchResponse>> + Send;
}

/// Plain HTTP GET against the upstream history page, sent with browser-like
/// headers to reduce the chance of being blocked.
pub struct HttpDrawSource {
    client: reqwest::Client,
    url: String,
}

impl HttpDrawSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        if let Some(referer) = &cfg.referer {
            headers.insert(REFERER, header_value("UPSTREAM_REFERER", referer)?);
        }
        if let Some(origin) = &cfg.origin {
            headers.insert(ORIGIN, header_value("UPSTREAM_ORIGIN", origin)?);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
            .user_agent(header_value("UPSTREAM_USER_AGENT", &cfg.user_agent)?)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url: cfg.upstream_url.clone(),
        })
    }
}

impl DrawSource for HttpDrawSource {
    fn fetch(&self) -> impl Future<Output = Result<FetchResponse>> + Send {
        async move {
            let resp = self.client.get(&self.url).send().await?;
            let status = resp.status().as_u16();
            let body = resp.text().await?;
            debug!(status, bytes = body.len(), "Upstream responded");
            Ok(FetchResponse { status, body })
        }
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value.trim())
        .map_err(|_| AppError::Config(format!("{name} is not a valid header value")))
}

/// Canned source for pipeline tests. Replies are served in order; the last one
/// repeats once the queue is down to it.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone)]
    pub(crate) enum Reply {
        Response(FetchResponse),
        Unreachable,
        /// Never answers, like a request stuck until its timeout.
        Hang,
    }

    pub(crate) struct StaticSource {
        replies: Mutex<VecDeque<Reply>>,
        pub(crate) calls: AtomicUsize,
    }

    impl StaticSource {
        pub(crate) fn sequence(replies: Vec<Reply>) -> Self {
            assert!(!replies.is_empty(), "at least one reply");
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn ok(body: &str) -> Self {
            Self::sequence(vec![Reply::Response(FetchResponse {
                status: 200,
                body: body.to_string(),
            })])
        }

        pub(crate) fn status(status: u16) -> Self {
            Self::sequence(vec![Reply::Response(FetchResponse {
                status,
                body: "<html>denied</html>".to_string(),
            })])
        }

        fn next_reply(&self) -> Reply {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap()
            }
        }
    }

    impl DrawSource for StaticSource {
        fn fetch(&self) -> impl Future<Output = Result<FetchResponse>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.next_reply();
            async move {
                match reply {
                    Reply::Response(resp) => Ok(resp),
                    Reply::Unreachable => Err(AppError::Io(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "upstream unreachable",
                    ))),
                    Reply::Hang => std::future::pending().await,
                }
            }
        }
    }
}
