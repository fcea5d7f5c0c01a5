//! In-memory page and relay doubles for session tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use {
    async_trait::async_trait,
    wa2tg_browser::{
        BrowserError, DriverLauncher, ElementRef, Key, LaunchOptions, Locator, PageDriver, Result,
    },
    wa2tg_common::{OutboundReply, Relay},
    wa2tg_config::WhatsAppConfig,
};

use crate::locators;

/// Mutations performed on the page, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Launch,
    Navigate(String),
    Click(ElementRef),
    Clear(ElementRef),
    Type(ElementRef, String),
    Key(ElementRef, Key),
    Screenshot,
    Refresh,
    Close,
}

struct ChatView {
    header: ElementRef,
    bubbles: Vec<ElementRef>,
}

#[derive(Default)]
struct Dom {
    next_ref: u32,
    matches: HashMap<&'static str, Vec<ElementRef>>,
    children: HashMap<(ElementRef, &'static str), Vec<ElementRef>>,
    texts: HashMap<ElementRef, String>,
    labels: HashMap<ElementRef, String>,
    chats: HashMap<ElementRef, ChatView>,
    stale: HashSet<ElementRef>,
    qr: Option<ElementRef>,
    scan_on_screenshot: bool,
    fail_clicks: bool,
    fail_typing: bool,
    fail_navigation: bool,
    actions: Vec<Action>,
}

impl Dom {
    fn mint(&mut self) -> ElementRef {
        self.next_ref += 1;
        ElementRef(self.next_ref)
    }

    fn add(&mut self, locator: &Locator) -> ElementRef {
        let element = self.mint();
        self.matches.entry(locator.xpath).or_default().push(element);
        element
    }
}

/// Scripted WhatsApp page. Clones share the same DOM and action log.
#[derive(Clone, Default)]
pub(crate) struct FakePage {
    dom: Arc<Mutex<Dom>>,
}

pub(crate) const SCREENSHOT: &[u8] = b"\x89PNG fake";

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    fn dom(&self) -> MutexGuard<'_, Dom> {
        self.dom.lock().unwrap()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.dom().actions.clone()
    }

    pub fn screenshot_bytes(&self) -> Vec<u8> {
        SCREENSHOT.to_vec()
    }

    pub fn authenticated(&self) {
        self.dom().add(&locators::AUTHENTICATED);
    }

    pub fn show_qr(&self) -> ElementRef {
        let mut dom = self.dom();
        let qr = dom.add(&locators::QR_CODE);
        dom.qr = Some(qr);
        qr
    }

    /// Taking the screenshot stands in for the user scanning the code.
    pub fn scan_on_screenshot(&self) {
        self.dom().scan_on_screenshot = true;
    }

    /// Add an unread badge matched by the `language`th unread locator.
    pub fn unread_badge(&self, language: usize, label: &str) -> ElementRef {
        let mut dom = self.dom();
        let badge = dom.add(&locators::UNREAD_INDICATORS[language]);
        dom.labels.insert(badge, label.to_string());
        badge
    }

    /// Clicking `badge` shows chat `name` with one bubble per entry of
    /// `bubbles`, each holding the given text fragments.
    pub fn open_chat_on_click(&self, badge: ElementRef, name: &str, bubbles: &[&[&str]]) {
        let mut dom = self.dom();
        let header = dom.mint();
        dom.texts.insert(header, name.to_string());

        let mut bubble_refs = Vec::new();
        for fragments in bubbles {
            let bubble = dom.mint();
            let mut spans = Vec::new();
            for fragment in *fragments {
                let span = dom.mint();
                dom.texts.insert(span, fragment.to_string());
                spans.push(span);
            }
            dom.children
                .insert((bubble, locators::BUBBLE_TEXT.xpath), spans);
            bubble_refs.push(bubble);
        }

        dom.chats.insert(badge, ChatView {
            header,
            bubbles: bubble_refs,
        });
    }

    pub fn search_box(&self) -> ElementRef {
        self.dom().add(&locators::SEARCH_BOX)
    }

    pub fn compose_box(&self) -> ElementRef {
        self.dom().add(&locators::COMPOSE_BOX)
    }

    pub fn fail_clicks(&self) {
        self.dom().fail_clicks = true;
    }

    pub fn fail_typing(&self) {
        self.dom().fail_typing = true;
    }

    pub fn fail_navigation(&self) {
        self.dom().fail_navigation = true;
    }
}

fn connection_lost() -> BrowserError {
    BrowserError::ConnectionClosed("websocket closed".into())
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut dom = self.dom();
        if dom.fail_navigation {
            return Err(BrowserError::NavigationFailed("net::ERR_NAME_NOT_RESOLVED".into()));
        }
        dom.actions.push(Action::Navigate(url.to_string()));
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        let dom = self.dom();
        Ok(dom
            .matches
            .get(locator.xpath)
            .map(|found| {
                found
                    .iter()
                    .copied()
                    .filter(|e| !dom.stale.contains(e))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_within(&self, scope: ElementRef, locator: &Locator) -> Result<Vec<ElementRef>> {
        Ok(self
            .dom()
            .children
            .get(&(scope, locator.xpath))
            .cloned()
            .unwrap_or_default())
    }

    async fn text(&self, element: ElementRef) -> Result<String> {
        self.dom()
            .texts
            .get(&element)
            .cloned()
            .ok_or(BrowserError::ElementNotFound(element.0))
    }

    async fn attribute(&self, element: ElementRef, name: &str) -> Result<Option<String>> {
        let dom = self.dom();
        Ok((name == "aria-label")
            .then(|| dom.labels.get(&element).cloned())
            .flatten())
    }

    async fn is_stale(&self, element: ElementRef) -> Result<bool> {
        Ok(self.dom().stale.contains(&element))
    }

    async fn click(&self, element: ElementRef) -> Result<()> {
        let mut dom = self.dom();
        if dom.fail_clicks {
            return Err(connection_lost());
        }
        if dom.labels.contains_key(&element) {
            let (header, bubbles) = dom
                .chats
                .get(&element)
                .map(|view| (vec![view.header], view.bubbles.clone()))
                .unwrap_or_default();
            dom.matches.insert(locators::CHAT_HEADER.xpath, header);
            dom.matches.insert(locators::MESSAGE_BUBBLES.xpath, bubbles);
        }
        dom.actions.push(Action::Click(element));
        Ok(())
    }

    async fn clear(&self, element: ElementRef) -> Result<()> {
        self.dom().actions.push(Action::Clear(element));
        Ok(())
    }

    async fn type_text(&self, element: ElementRef, text: &str) -> Result<()> {
        let mut dom = self.dom();
        if dom.fail_typing {
            return Err(connection_lost());
        }
        dom.actions.push(Action::Type(element, text.to_string()));
        Ok(())
    }

    async fn press_key(&self, element: ElementRef, key: Key) -> Result<()> {
        self.dom().actions.push(Action::Key(element, key));
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let mut dom = self.dom();
        dom.actions.push(Action::Screenshot);
        if dom.scan_on_screenshot {
            if let Some(qr) = dom.qr {
                dom.stale.insert(qr);
            }
            dom.add(&locators::AUTHENTICATED);
        }
        Ok(SCREENSHOT.to_vec())
    }

    async fn refresh(&self) -> Result<()> {
        self.dom().actions.push(Action::Refresh);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.dom().actions.push(Action::Close);
        Ok(())
    }
}

/// Hands out the same [`FakePage`] on every launch.
pub(crate) struct FakeLauncher {
    page: FakePage,
    launches: AtomicUsize,
    fail: AtomicBool,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page,
            launches: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let launcher = Self::new(FakePage::new());
        launcher.fail_next_launches();
        launcher
    }

    pub fn fail_next_launches(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Successful launches so far.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverLauncher for FakeLauncher {
    async fn launch(&self, _options: &LaunchOptions) -> Result<Box<dyn PageDriver>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BrowserError::LaunchFailed("chrome exited with status 1".into()));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.page.dom().actions.push(Action::Launch);
        Ok(Box::new(self.page.clone()))
    }
}

/// Relay that remembers what it was asked to send.
#[derive(Default)]
pub(crate) struct RecordingRelay {
    images: Mutex<Vec<(Vec<u8>, String)>>,
}

impl RecordingRelay {
    pub fn images(&self) -> Vec<(Vec<u8>, String)> {
        self.images.lock().unwrap().clone()
    }
}

#[async_trait]
impl Relay for RecordingRelay {
    async fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) {}

    async fn send_text(&self, _chat: &str, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send_image(&self, png: Vec<u8>, caption: &str) -> anyhow::Result<()> {
        self.images
            .lock()
            .unwrap()
            .push((png, caption.to_string()));
        Ok(())
    }

    fn take_all_pending(&self) -> Vec<OutboundReply> {
        Vec::new()
    }
}

/// Config with every wait reduced to a single lookup.
pub(crate) fn fast_config() -> WhatsAppConfig {
    WhatsAppConfig {
        auth_timeout_secs: 0,
        qr_timeout_secs: 0,
        qr_scan_timeout_secs: 0,
        search_timeout_secs: 0,
        settle_delay_ms: 0,
        ..Default::default()
    }
}
