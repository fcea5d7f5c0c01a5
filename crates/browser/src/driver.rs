//! The driver seam between WhatsApp logic and the browser.

use std::time::{Duration, Instant};

use {async_trait::async_trait, tracing::debug};

use crate::{
    error::Result,
    types::{ElementRef, Key, LaunchOptions, Locator},
};

/// Interval between lookups while waiting on the page.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One live browser page.
///
/// Lookups return empty results rather than errors when nothing matches; an
/// `Err` always means the driver itself failed (dead websocket, detached node,
/// JavaScript exception).
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` and wait for the navigation to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Every element matching `locator`, in document order.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>>;

    /// Every element matching `locator` evaluated relative to `scope`.
    async fn find_within(&self, scope: ElementRef, locator: &Locator) -> Result<Vec<ElementRef>>;

    /// First element matching `locator`, if any.
    async fn find_first(&self, locator: &Locator) -> Result<Option<ElementRef>> {
        Ok(self.find_all(locator).await?.into_iter().next())
    }

    /// Rendered text (`innerText`).
    async fn text(&self, element: ElementRef) -> Result<String>;

    async fn attribute(&self, element: ElementRef, name: &str) -> Result<Option<String>>;

    /// Whether the element has left the DOM.
    async fn is_stale(&self, element: ElementRef) -> Result<bool>;

    async fn click(&self, element: ElementRef) -> Result<()>;

    /// Empty an input or contenteditable element.
    async fn clear(&self, element: ElementRef) -> Result<()>;

    /// Focus the element and type `text` character by character.
    async fn type_text(&self, element: ElementRef, text: &str) -> Result<()>;

    /// Focus the element and press `key`.
    async fn press_key(&self, element: ElementRef, key: Key) -> Result<()>;

    /// PNG screenshot of the viewport.
    async fn screenshot_png(&self) -> Result<Vec<u8>>;

    /// Reload the current page.
    async fn refresh(&self) -> Result<()>;

    /// Tear down the browser process. Further calls fail.
    async fn close(&self) -> Result<()>;
}

/// Starts browser instances.
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn PageDriver>>;
}

/// A deadline past the end of the clock never expires.
fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

/// Poll until `locator` matches something or `timeout` elapses.
///
/// Always looks at least once, so a zero timeout is a plain lookup. Returns
/// `Ok(None)` on timeout.
pub async fn wait_for(
    driver: &dyn PageDriver,
    locator: &Locator,
    timeout: Duration,
) -> Result<Option<ElementRef>> {
    let deadline = Instant::now().checked_add(timeout);

    loop {
        if let Some(element) = driver.find_first(locator).await? {
            debug!(locator = %locator, %element, "element found");
            return Ok(Some(element));
        }
        if expired(deadline) {
            debug!(locator = %locator, ?timeout, "wait timed out");
            return Ok(None);
        }
        tokio::time::sleep(POLL_INTERVAL.min(timeout)).await;
    }
}

/// Poll until `element` is detached from the DOM or `timeout` elapses.
///
/// Returns `Ok(true)` once stale.
pub async fn wait_until_stale(
    driver: &dyn PageDriver,
    element: ElementRef,
    timeout: Duration,
) -> Result<bool> {
    let deadline = Instant::now().checked_add(timeout);

    loop {
        if driver.is_stale(element).await? {
            return Ok(true);
        }
        if expired(deadline) {
            return Ok(false);
        }
        tokio::time::sleep(POLL_INTERVAL.min(timeout)).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::error::BrowserError,
        std::sync::atomic::{AtomicU32, Ordering},
    };

    /// Finds the target on the Nth lookup; the element goes stale on the Nth
    /// staleness probe.
    struct Eventually {
        calls: AtomicU32,
        after: u32,
    }

    impl Eventually {
        fn new(after: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                after,
            }
        }

        fn tick(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.after
        }
    }

    #[async_trait]
    impl PageDriver for Eventually {
        async fn navigate(&self, _url: &str) -> Result<()> {
            Ok(())
        }

        async fn find_all(&self, _locator: &Locator) -> Result<Vec<ElementRef>> {
            Ok(if self.tick() {
                vec![ElementRef(1)]
            } else {
                Vec::new()
            })
        }

        async fn find_within(&self, _: ElementRef, _: &Locator) -> Result<Vec<ElementRef>> {
            Ok(Vec::new())
        }

        async fn text(&self, _: ElementRef) -> Result<String> {
            Ok(String::new())
        }

        async fn attribute(&self, _: ElementRef, _: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn is_stale(&self, _: ElementRef) -> Result<bool> {
            Ok(self.tick())
        }

        async fn click(&self, _: ElementRef) -> Result<()> {
            Ok(())
        }

        async fn clear(&self, _: ElementRef) -> Result<()> {
            Ok(())
        }

        async fn type_text(&self, _: ElementRef, _: &str) -> Result<()> {
            Ok(())
        }

        async fn press_key(&self, _: ElementRef, _: Key) -> Result<()> {
            Ok(())
        }

        async fn screenshot_png(&self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }

        async fn refresh(&self) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Err(BrowserError::SessionClosed)
        }
    }

    const MARKER: Locator = Locator::new("marker", "//span");

    #[tokio::test]
    async fn wait_for_returns_element_once_it_appears() {
        let driver = Eventually::new(3);
        let found = wait_for(&driver, &MARKER, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(found, Some(ElementRef(1)));
        assert_eq!(driver.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn wait_for_with_zero_timeout_looks_exactly_once() {
        let driver = Eventually::new(u32::MAX);
        let found = wait_for(&driver, &MARKER, Duration::ZERO).await.unwrap();
        assert_eq!(found, None);
        assert_eq!(driver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unbounded_timeouts_still_poll() {
        let driver = Eventually::new(2);
        let found = wait_for(&driver, &MARKER, Duration::MAX).await.unwrap();
        assert_eq!(found, Some(ElementRef(1)));

        let stale = wait_until_stale(&driver, ElementRef(1), Duration::MAX)
            .await
            .unwrap();
        assert!(stale);
    }

    #[tokio::test]
    async fn wait_until_stale_times_out_while_element_is_attached() {
        let driver = Eventually::new(u32::MAX);
        let stale = wait_until_stale(&driver, ElementRef(1), Duration::from_millis(10))
            .await
            .unwrap();
        assert!(!stale);
    }

    #[tokio::test]
    async fn wait_until_stale_reports_detachment() {
        let driver = Eventually::new(2);
        let stale = wait_until_stale(&driver, ElementRef(1), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(stale);
    }
}
