//! [`Relay`] implementation over the Telegram Bot API.

use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    teloxide::{prelude::*, types::ChatId},
    tokio::{sync::Mutex, task::JoinHandle},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    wa2tg_common::{OutboundReply, Relay, ReplyQueue},
    wa2tg_config::TelegramConfig,
};

use crate::{
    bot,
    error::{Error, Result},
    handlers::HandlerContext,
    outbound::{TelegramOutbound, format_forward},
};

struct Polling {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Forwards to and listens on a single Telegram chat.
pub struct TelegramRelay {
    bot: Bot,
    outbound: TelegramOutbound,
    replies: ReplyQueue,
    poll_timeout_secs: u32,
    polling: Mutex<Option<Polling>>,
}

impl TelegramRelay {
    /// Build a relay from validated config.
    pub fn from_config(config: &TelegramConfig) -> Result<Self> {
        let chat_id = config
            .chat_id()
            .ok_or_else(|| Error::message(format!("invalid telegram chat id: {:?}", config.chat_id)))?;

        // The HTTP timeout must outlast the long-poll timeout or every
        // empty poll ends in a client-side error.
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(u64::from(config.poll_timeout_secs) + 15))
            .build()?;
        let bot = Bot::with_client(config.token.expose_secret(), client);

        Ok(Self::new(bot, ChatId(chat_id), config.poll_timeout_secs))
    }

    pub fn new(bot: Bot, chat_id: ChatId, poll_timeout_secs: u32) -> Self {
        Self {
            outbound: TelegramOutbound::new(bot.clone(), chat_id),
            bot,
            replies: ReplyQueue::new(),
            poll_timeout_secs,
            polling: Mutex::new(None),
        }
    }

    /// Handle to the queue filled by the polling loop.
    pub fn replies(&self) -> ReplyQueue {
        self.replies.clone()
    }

    pub async fn is_polling(&self) -> bool {
        self.polling
            .lock()
            .await
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }
}

#[async_trait]
impl Relay for TelegramRelay {
    async fn start(&self) -> anyhow::Result<()> {
        let mut polling = self.polling.lock().await;
        if polling.is_some() {
            warn!("telegram relay already started");
            return Ok(());
        }

        bot::connect(&self.bot).await?;

        let ctx = HandlerContext {
            chat_id: self.outbound.chat_id(),
            outbound: self.outbound.clone(),
            replies: self.replies.clone(),
        };
        let cancel = CancellationToken::new();
        let handle = bot::spawn_polling(
            self.bot.clone(),
            ctx,
            self.poll_timeout_secs,
            cancel.clone(),
        );
        *polling = Some(Polling { cancel, handle });
        info!(chat_id = self.outbound.chat_id().0, "telegram relay started");
        Ok(())
    }

    async fn stop(&self) {
        let Some(polling) = self.polling.lock().await.take() else {
            return;
        };
        polling.cancel.cancel();
        if let Err(e) = polling.handle.await {
            warn!(error = %e, "telegram polling task ended abnormally");
        }
        info!("telegram relay stopped");
    }

    async fn send_text(&self, chat: &str, text: &str) -> anyhow::Result<()> {
        self.outbound
            .send_text(&format_forward(chat, text))
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn send_image(&self, png: Vec<u8>, caption: &str) -> anyhow::Result<()> {
        self.outbound
            .send_photo(png, caption)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    fn take_all_pending(&self) -> Vec<OutboundReply> {
        self.replies.take_all()
    }
}
