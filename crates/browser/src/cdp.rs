//! `chromiumoxide` implementation of the driver traits.

use std::time::Duration;

use {
    async_trait::async_trait,
    chromiumoxide::{
        Browser, BrowserConfig as CdpBrowserConfig, Page,
        cdp::browser_protocol::{
            emulation::SetDeviceMetricsOverrideParams,
            input::{
                DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
                DispatchMouseEventType, MouseButton,
            },
            page::CaptureScreenshotFormat,
        },
        handler::viewport::Viewport,
        page::ScreenshotParams,
    },
    futures::StreamExt,
    serde::Deserialize,
    serde_json::Value,
    tokio::{sync::Mutex, task::JoinHandle},
    tracing::{debug, info, warn},
};

use crate::{
    detect,
    driver::{DriverLauncher, PageDriver},
    error::{BrowserError, Result},
    script,
    types::{ElementRef, Key, LaunchOptions, Locator},
};

/// Launches a host Chrome/Chromium with a persistent profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct CdpLauncher;

#[async_trait]
impl DriverLauncher for CdpLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn PageDriver>> {
        Ok(Box::new(CdpDriver::launch(options).await?))
    }
}

/// One browser process with a single page.
pub struct CdpDriver {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
    /// Next ref to hand out. Locked for the whole lookup so concurrent
    /// lookups cannot mint the same number.
    next_ref: Mutex<u32>,
}

#[derive(Debug, Deserialize)]
struct FindResult {
    refs: Vec<u32>,
    minted: u32,
}

#[derive(Debug, Deserialize)]
struct AttributeResult {
    found: bool,
    value: Option<String>,
}

impl CdpDriver {
    /// Start the browser and open a blank page sized to the viewport.
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let detection = detect::detect_browser(options.chrome_path.as_deref());
        let Some(executable) = detection.executable else {
            return Err(BrowserError::BrowserNotAvailable(detection.install_hint));
        };

        std::fs::create_dir_all(&options.user_data_dir).map_err(|e| {
            BrowserError::LaunchFailed(format!(
                "cannot create profile directory {}: {e}",
                options.user_data_dir.display()
            ))
        })?;

        let viewport = Viewport {
            width: options.viewport_width,
            height: options.viewport_height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        };

        let mut builder = CdpBrowserConfig::builder();

        // chromiumoxide runs headless unless with_head() is called.
        if !options.headless {
            builder = builder.with_head();
        }

        builder = builder
            .chrome_executable(&executable.path)
            .user_data_dir(&options.user_data_dir)
            .viewport(viewport)
            .window_size(options.viewport_width, options.viewport_height)
            .request_timeout(Duration::from_millis(options.request_timeout_ms))
            .arg(format!("--lang={}", options.locale));

        for arg in &options.chrome_args {
            builder = builder.arg(arg);
        }

        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox");

        let config = builder.build().map_err(|e| {
            BrowserError::LaunchFailed(format!("failed to build browser config: {e}"))
        })?;

        info!(
            path = %executable.path.display(),
            source = %executable.source,
            profile = %options.user_data_dir.display(),
            headless = options.headless,
            locale = %options.locale,
            viewport_width = options.viewport_width,
            viewport_height = options.viewport_height,
            "launching browser"
        );

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
            debug!("browser event handler exited (connection closed)");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(BrowserError::LaunchFailed(format!("failed to open page: {e}")));
            },
        };

        // The browser-level viewport is not always applied to new pages.
        let viewport_cmd = SetDeviceMetricsOverrideParams::builder()
            .width(options.viewport_width)
            .height(options.viewport_height)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(|e| BrowserError::Cdp(e.to_string()))?;
        if let Err(e) = page.execute(viewport_cmd).await {
            warn!(error = %e, "failed to set page viewport");
        }

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
            next_ref: Mutex::new(1),
        })
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, js: &str) -> Result<T> {
        self.page
            .evaluate(js)
            .await
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::JsEvalFailed(format!("failed to get result: {e:?}")))
    }

    async fn find(&self, locator: &Locator, scope: Option<ElementRef>) -> Result<Vec<ElementRef>> {
        let mut next_ref = self.next_ref.lock().await;

        let result: Option<FindResult> = self
            .eval(&script::find(locator, scope, *next_ref))
            .await
            .map_err(|e| match e {
                BrowserError::JsEvalFailed(reason) if reason.contains("XPath") => {
                    BrowserError::InvalidLocator {
                        name: locator.name,
                        reason,
                    }
                },
                other => other,
            })?;

        let Some(result) = result else {
            // scope is only ever Some when the script returns null
            return Err(BrowserError::ElementNotFound(scope.map_or(0, |s| s.0)));
        };

        *next_ref += result.minted;
        debug!(
            locator = %locator,
            matches = result.refs.len(),
            minted = result.minted,
            "located elements"
        );
        Ok(result.refs.into_iter().map(ElementRef).collect())
    }

    async fn focus(&self, element: ElementRef) -> Result<()> {
        let focused: bool = self.eval(&script::focus(element)).await?;
        if focused {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound(element.0))
        }
    }

    async fn dispatch_key(&self, kind: DispatchKeyEventType, key: Key) -> Result<()> {
        let mut params = DispatchKeyEventParams::builder()
            .r#type(kind.clone())
            .key(key.key())
            .code(key.code())
            .windows_virtual_key_code(key.virtual_key_code())
            .native_virtual_key_code(key.virtual_key_code());
        if matches!(kind, DispatchKeyEventType::KeyDown) {
            params = params.text(key.text());
        }
        let cmd = params.build().map_err(|e| BrowserError::Cdp(e.to_string()))?;
        self.page.execute(cmd).await?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        let _ = self.page.wait_for_navigation().await;
        info!(url, "navigated");
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        self.find(locator, None).await
    }

    async fn find_within(&self, scope: ElementRef, locator: &Locator) -> Result<Vec<ElementRef>> {
        self.find(locator, Some(scope)).await
    }

    async fn text(&self, element: ElementRef) -> Result<String> {
        let text: Option<String> = self.eval(&script::inner_text(element)).await?;
        text.ok_or(BrowserError::ElementNotFound(element.0))
    }

    async fn attribute(&self, element: ElementRef, name: &str) -> Result<Option<String>> {
        let result: AttributeResult = self.eval(&script::attribute(element, name)).await?;
        if !result.found {
            return Err(BrowserError::ElementNotFound(element.0));
        }
        Ok(result.value)
    }

    async fn is_stale(&self, element: ElementRef) -> Result<bool> {
        self.eval(&script::is_stale(element)).await
    }

    async fn click(&self, element: ElementRef) -> Result<()> {
        let center: Value = self.eval(&script::center(element)).await?;
        let (Some(x), Some(y)) = (center["centerX"].as_f64(), center["centerY"].as_f64()) else {
            return Err(BrowserError::ElementNotFound(element.0));
        };

        for kind in [
            DispatchMouseEventType::MousePressed,
            DispatchMouseEventType::MouseReleased,
        ] {
            let cmd = DispatchMouseEventParams::builder()
                .r#type(kind)
                .x(x)
                .y(y)
                .button(MouseButton::Left)
                .click_count(1)
                .build()
                .map_err(|e| BrowserError::Cdp(e.to_string()))?;
            self.page.execute(cmd).await?;
        }

        debug!(%element, x, y, "clicked element");
        Ok(())
    }

    async fn clear(&self, element: ElementRef) -> Result<()> {
        let cleared: bool = self.eval(&script::clear(element)).await?;
        if cleared {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound(element.0))
        }
    }

    async fn type_text(&self, element: ElementRef, text: &str) -> Result<()> {
        self.focus(element).await?;

        for c in text.chars() {
            let key_down = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyDown)
                .text(c.to_string())
                .build()
                .map_err(|e| BrowserError::Cdp(e.to_string()))?;
            self.page.execute(key_down).await?;

            let key_up = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyUp)
                .text(c.to_string())
                .build()
                .map_err(|e| BrowserError::Cdp(e.to_string()))?;
            self.page.execute(key_up).await?;
        }

        debug!(%element, chars = text.chars().count(), "typed text");
        Ok(())
    }

    async fn press_key(&self, element: ElementRef, key: Key) -> Result<()> {
        self.focus(element).await?;
        self.dispatch_key(DispatchKeyEventType::KeyDown, key).await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, key).await?;
        debug!(%element, key = key.key(), "pressed key");
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let png = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(false)
                    .build(),
            )
            .await
            .map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))?;
        info!(bytes = png.len(), "took screenshot");
        Ok(png)
    }

    async fn refresh(&self) -> Result<()> {
        self.page.reload().await?;
        let _ = self.page.wait_for_navigation().await;
        debug!("page refreshed");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Err(BrowserError::SessionClosed);
        };
        let closed = browser.close().await;
        let _ = browser.wait().await;
        self.handler.abort();
        closed?;
        info!("browser closed");
        Ok(())
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
