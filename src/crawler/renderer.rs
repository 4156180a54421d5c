//! Page rendering through a headless browser
//!
//! Pages are loaded in a real browser so that script-generated markup is
//! captured. The session only depends on the [`PageRenderer`] trait; the
//! Chrome implementation lives behind it.

use crate::config::MirrorConfig;
use crate::{MirrorError, RenderError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// How often the element wait re-checks for `<body>`
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Produces the fully rendered markup of a page
#[async_trait]
pub trait PageRenderer: Send {
    /// Navigates to `url` and returns the post-render DOM serialized as HTML
    async fn render(&mut self, url: &Url) -> Result<String, RenderError>;

    /// Releases the rendering engine; calling it twice is harmless
    async fn shutdown(&mut self) {}
}

/// Headless Chrome driven over the DevTools protocol
///
/// One browser with a single tab is used for the whole session, so pages
/// are rendered strictly one after another.
pub struct ChromeRenderer {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
    element_timeout: Duration,
    settle_delay: Duration,
    closed: bool,
}

impl ChromeRenderer {
    /// Launches a headless browser configured from `config`
    ///
    /// Certificate errors are ignored, the sandbox is disabled and the
    /// window size and user agent are fixed.
    pub async fn launch(config: &MirrorConfig) -> Result<Self, MirrorError> {
        let renderer = &config.renderer;

        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--ignore-certificate-errors")
            .arg(format!("--user-agent={}", config.http.user_agent))
            .window_size(renderer.window_width, renderer.window_height)
            .request_timeout(renderer.navigation_timeout());

        if let Some(executable) = &renderer.chrome_executable {
            builder = builder.chrome_executable(executable);
        }

        let browser_config = builder
            .build()
            .map_err(|e| MirrorError::SessionFatal(format!("Browser config error: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| MirrorError::SessionFatal(format!("Browser launch failed: {}", e)))?;

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(MirrorError::SessionFatal(format!(
                    "Failed to open browser tab: {}",
                    e
                )));
            }
        };

        tracing::info!(
            "Headless browser ready ({}x{})",
            renderer.window_width,
            renderer.window_height
        );

        Ok(Self {
            browser,
            page,
            handler,
            navigation_timeout: renderer.navigation_timeout(),
            element_timeout: renderer.element_timeout(),
            settle_delay: renderer.settle_delay(),
            closed: false,
        })
    }

    async fn wait_for_body(&self) -> bool {
        let poll = async {
            while self.page.find_element("body").await.is_err() {
                tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(self.element_timeout, poll).await.is_ok()
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&mut self, url: &Url) -> Result<String, RenderError> {
        if self.closed {
            return Err(RenderError::Engine("browser already shut down".to_string()));
        }

        tracing::debug!("Rendering {}", url);

        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url.as_str())).await {
            Err(_) => {
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                    seconds: self.navigation_timeout.as_secs(),
                })
            }
            Ok(Err(e)) => {
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            Ok(Ok(_)) => {}
        }

        if !self.wait_for_body().await {
            return Err(RenderError::Timeout {
                url: url.to_string(),
                seconds: self.element_timeout.as_secs(),
            });
        }

        // Let late scripts finish mutating the DOM
        tokio::time::sleep(self.settle_delay).await;

        self.page
            .content()
            .await
            .map_err(|e| RenderError::Engine(e.to_string()))
    }

    async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.browser.close().await {
            tracing::warn!("Browser close error: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Browser process wait failed: {}", e);
        }
        self.handler.abort();
        tracing::info!("Headless browser stopped");
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
