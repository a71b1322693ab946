//! HTTP-backed browser using wreq for TLS fingerprint emulation.
//!
//! Review listings are fetched as whole documents with Chrome TLS and
//! header emulation. "Clicking" next follows the href the page itself
//! rendered, carrying a `Referer`, so the request sequence looks like
//! in-page navigation rather than raw URL pagination.

use crate::amazon::extract::{self, NextPage};
use crate::amazon::Marketplace;
use crate::browser::tab::{Browser, BrowserTab, ClickOutcome, TabError, TabId};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Browser implementation that renders pages by fetching them.
pub struct HttpBrowser {
    client: Client,
    marketplace: Marketplace,
    page_load_timeout: Duration,
    next_tab_id: AtomicU64,
}

impl HttpBrowser {
    /// Creates a browser with browser impersonation and anti-bot measures.
    pub fn new(
        marketplace: Marketplace,
        proxy: Option<&str>,
        page_load_timeout: Duration,
    ) -> Result<Self, TabError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(page_load_timeout)
            .connect_timeout(Duration::from_secs(10));

        // Configure proxy if specified
        if let Some(proxy_url) = proxy {
            debug!("Configuring proxy: {}", proxy_url);
            builder = builder.proxy(wreq::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
            marketplace,
            page_load_timeout,
            next_tab_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn open_tab(&self) -> Result<Box<dyn BrowserTab>, TabError> {
        let id = self.next_tab_id.fetch_add(1, Ordering::Relaxed);
        debug!("Opening collector tab {}", id);

        Ok(Box::new(HttpTab {
            client: self.client.clone(),
            marketplace: self.marketplace,
            id,
            current_url: None,
            html: String::new(),
            closed: false,
            page_load_timeout: self.page_load_timeout,
        }))
    }
}

/// One HTTP-backed tab: the most recently fetched document plus the
/// cookie session shared with its parent browser.
pub struct HttpTab {
    client: Client,
    marketplace: Marketplace,
    id: TabId,
    current_url: Option<String>,
    html: String,
    closed: bool,
    page_load_timeout: Duration,
}

impl HttpTab {
    /// Performs a GET with the full emulation header set and stores the
    /// resulting document.
    async fn fetch(&mut self, url: &str, referer: Option<&str>) -> Result<(), TabError> {
        if self.closed {
            return Err(TabError::Closed);
        }

        debug!("GET {}", url);

        // Fresh navigations look typed-in; followed links carry a referer.
        let fetch_site = if referer.is_some() { "same-origin" } else { "none" };

        let mut request = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", self.marketplace.accept_language())
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Ch-Ua", "\"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"")
            .header("Sec-Ch-Ua-Mobile", "?0")
            .header("Sec-Ch-Ua-Platform", "\"macOS\"")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", fetch_site)
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1");

        if let Some(referer) = referer {
            request = request.header("Referer", referer);
        }

        let response = request.send().await.map_err(|source| {
            if source.is_timeout() {
                TabError::Timeout(self.page_load_timeout)
            } else {
                TabError::Navigation {
                    url: url.to_string(),
                    source,
                }
            }
        })?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503). Consider a slower speed mode or a proxy.");
            return Err(TabError::RateLimited);
        }
        if !status.is_success() {
            return Err(TabError::Status(status.as_u16()));
        }

        self.current_url = Some(response.uri().to_string());
        self.html = response.text().await.map_err(|source| TabError::Navigation {
            url: url.to_string(),
            source,
        })?;

        Ok(())
    }
}

#[async_trait]
impl BrowserTab for HttpTab {
    fn id(&self) -> TabId {
        self.id
    }

    async fn navigate(&mut self, url: &str) -> Result<(), TabError> {
        self.fetch(url, None).await
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), TabError> {
        if self.closed {
            return Err(TabError::Closed);
        }
        // Whole documents arrive in one response; nothing lazy to trigger.
        Ok(())
    }

    async fn click_next(&mut self) -> Result<ClickOutcome, TabError> {
        if self.closed {
            return Err(TabError::Closed);
        }

        match extract::next_page(&self.html) {
            NextPage::Available { href } => {
                let referer = self.current_url.clone();
                let target = resolve_href(referer.as_deref().unwrap_or_default(), &href);
                self.fetch(&target, referer.as_deref()).await?;
                Ok(ClickOutcome::Clicked)
            }
            NextPage::Disabled => Ok(ClickOutcome::Disabled),
            NextPage::Missing => Ok(ClickOutcome::Missing),
        }
    }

    async fn document(&self) -> Result<String, TabError> {
        if self.closed {
            return Err(TabError::Closed);
        }
        Ok(self.html.clone())
    }

    async fn close(&mut self) -> Result<(), TabError> {
        debug!("Closing collector tab {}", self.id);
        self.closed = true;
        self.html.clear();
        self.current_url = None;
        Ok(())
    }
}

/// Resolves a possibly-relative href against the URL it was served from.
fn resolve_href(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    let origin = base
        .find("://")
        .map(|scheme_end| {
            let rest = &base[scheme_end + 3..];
            match rest.find('/') {
                Some(path_start) => &base[..scheme_end + 3 + path_start],
                None => base,
            }
        })
        .unwrap_or(base);

    if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", origin, href)
    }
}
