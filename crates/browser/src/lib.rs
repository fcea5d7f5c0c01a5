//! Chrome/Chromium session driver over CDP.
//!
//! The WhatsApp client talks to the page only through [`PageDriver`]:
//! elements are located with XPath [`Locator`]s and referred to by opaque
//! [`ElementRef`] numbers that the driver stamps onto the DOM. The
//! `chromiumoxide` implementation lives in [`cdp`]; tests substitute a
//! scripted driver.
//!
//! # Example
//!
//! ```ignore
//! use wa2tg_browser::{CdpLauncher, DriverLauncher, LaunchOptions, Locator};
//!
//! let driver = CdpLauncher.launch(&LaunchOptions::default()).await?;
//! driver.navigate("https://web.whatsapp.com").await?;
//! let marker = Locator::new("chat list", r#"//span[@data-icon="chats-filled"]"#);
//! let found = wa2tg_browser::wait_for(driver.as_ref(), &marker, timeout).await?;
//! ```

pub mod cdp;
pub mod detect;
pub mod driver;
pub mod error;
mod script;
pub mod types;

pub use {
    cdp::{CdpDriver, CdpLauncher},
    driver::{DriverLauncher, PageDriver, wait_for, wait_until_stale},
    error::{BrowserError, Result},
    types::{ElementRef, Key, LaunchOptions, Locator},
};
