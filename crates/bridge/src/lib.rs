//! The relay loop tying a WhatsApp session to a Telegram relay.

mod bridge;

pub use bridge::{Bridge, BridgeState};
