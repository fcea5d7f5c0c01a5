use std::{future::Future, time::Duration};

use {
    teloxide::{
        RequestError,
        payloads::SendPhotoSetters,
        prelude::*,
        types::{ChatId, InputFile},
    },
    tracing::{debug, info, warn},
};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Message text for a forwarded WhatsApp message.
///
/// Replies are routed back by reading the chat name from the first line, so
/// this layout must stay in sync with [`crate::handlers::chat_name_from_forward`].
pub fn format_forward(chat: &str, text: &str) -> String {
    format!("From: {chat}\nMessage:\n{text}")
}

/// Sends into the configured chat.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramOutbound {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub async fn send_text(&self, text: &str) -> Result<(), RequestError> {
        self.send_text_to(self.chat_id, text).await
    }

    pub async fn send_text_to(&self, chat_id: ChatId, text: &str) -> Result<(), RequestError> {
        let message = self
            .run_telegram_request_with_retry(chat_id, "send message", || {
                let req = self.bot.send_message(chat_id, text);
                async move { req.await }
            })
            .await?;
        debug!(chat_id = chat_id.0, message_id = message.id.0, "telegram message sent");
        Ok(())
    }

    pub async fn send_photo(&self, png: Vec<u8>, caption: &str) -> Result<(), RequestError> {
        let chat_id = self.chat_id;
        let bytes = png.len();
        self.run_telegram_request_with_retry(chat_id, "send photo", || {
            let input = InputFile::memory(png.clone()).file_name("qr.png");
            let req = self.bot.send_photo(chat_id, input).caption(caption);
            async move { req.await }
        })
        .await?;
        info!(chat_id = chat_id.0, bytes, "telegram photo sent");
        Ok(())
    }

    async fn run_telegram_request_with_retry<T, F, Fut>(
        &self,
        chat_id: ChatId,
        operation: &'static str,
        mut request: F,
    ) -> Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };

                    if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            chat_id = chat_id.0,
                            operation,
                            retries,
                            max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }

                    retries += 1;
                    warn!(
                        chat_id = chat_id.0,
                        operation,
                        retries,
                        max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}
