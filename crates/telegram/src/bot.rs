use std::time::Duration;

use {
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::handlers::{self, HandlerContext};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Check the token, clear any webhook and register the bot commands.
pub async fn connect(bot: &Bot) -> crate::Result<()> {
    let me = bot.get_me().await?;

    // Long polling does not work while a webhook is set.
    bot.delete_webhook().send().await?;

    let commands = vec![BotCommand::new("start", "Check that the forwarder is running")];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?me.username, "telegram bot connected (webhook cleared)");
    Ok(())
}

/// Spawn the getUpdates loop. It runs until `cancel` fires or another
/// process takes over the token.
pub fn spawn_polling(
    bot: Bot,
    ctx: HandlerContext,
    poll_timeout_secs: u32,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            let request = bot
                .get_updates()
                .offset(offset)
                .timeout(poll_timeout_secs)
                .allowed_updates(vec![AllowedUpdate::Message]);

            let result = tokio::select! {
                () = cancel.cancelled() => break,
                result = request.send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(chat_id = msg.chat.id.0, "received telegram message");
                                if let Err(e) = handlers::handle_message(&msg, &ctx).await {
                                    error!(error = %e, "error handling telegram message");
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                    warn!("telegram polling stopped: another instance is running with this token");
                    cancel.cancel();
                    break;
                },
                Err(e) => {
                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(RETRY_DELAY) => {},
                    }
                },
            }
        }
        info!("telegram polling stopped");
    })
}
