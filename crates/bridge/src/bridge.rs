use std::{fmt, sync::Arc, time::Duration};

use {
    anyhow::{Context, Result},
    tokio::sync::watch,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
    wa2tg_common::{ChatSession, Relay},
    wa2tg_config::BridgeConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::ShuttingDown => "shutting down",
            Self::Stopped => "stopped",
        })
    }
}

/// Moves messages between one chat session and one relay.
///
/// Each cycle reads new messages, forwards them one by one, drains the
/// replies queued by the relay, delivers those in order, then sleeps for the
/// poll interval.
pub struct Bridge {
    session: Box<dyn ChatSession>,
    relay: Arc<dyn Relay>,
    poll_interval: Duration,
    state: watch::Sender<BridgeState>,
}

impl Bridge {
    pub fn new(session: Box<dyn ChatSession>, relay: Arc<dyn Relay>, config: &BridgeConfig) -> Self {
        Self {
            session,
            relay,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            state: watch::Sender::new(BridgeState::Idle),
        }
    }

    pub fn state(&self) -> BridgeState {
        *self.state.borrow()
    }

    /// Watch state transitions from another task.
    pub fn subscribe(&self) -> watch::Receiver<BridgeState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: BridgeState) {
        debug!(%state, "bridge state");
        self.state.send_replace(state);
    }

    /// Start both sides and relay until `cancel` fires.
    ///
    /// Startup is raced against `cancel` as well. On cancellation the
    /// in-flight startup or cycle is dropped, then the session is
    /// stopped before the relay. Errors from startup or from a failed
    /// session recovery end the loop after the same teardown.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        self.set_state(BridgeState::Starting);

        let relay_started = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = self.relay.start() => Some(result),
        };
        match relay_started {
            None => return self.cancelled_during_startup().await,
            Some(Err(e)) => {
                self.set_state(BridgeState::Stopped);
                return Err(e.context("failed to start telegram relay"));
            },
            Some(Ok(())) => {},
        }

        let session_started = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = self.session.start() => Some(result),
        };
        match session_started {
            None => return self.cancelled_during_startup().await,
            Some(Err(e)) => {
                self.shutdown().await;
                return Err(e.context("failed to start WhatsApp session"));
            },
            Some(Ok(())) => {},
        }

        self.set_state(BridgeState::Running);
        info!(poll_interval_secs = self.poll_interval.as_secs(), "bridge running");

        let outcome = loop {
            let step = async {
                self.cycle().await?;
                tokio::time::sleep(self.poll_interval).await;
                Ok::<_, anyhow::Error>(())
            };

            tokio::select! {
                () = cancel.cancelled() => {
                    info!("shutdown requested, cancelling current cycle");
                    break Ok(());
                },
                result = step => {
                    if let Err(e) = result {
                        break Err(e);
                    }
                },
            }
        };

        self.shutdown().await;
        outcome
    }

    async fn cycle(&mut self) -> Result<()> {
        let messages = self
            .session
            .get_new_messages()
            .await
            .context("WhatsApp session could not be recovered")?;

        let mut forwarded = 0usize;
        for message in &messages {
            match self.relay.send_text(&message.chat, &message.text).await {
                Ok(()) => forwarded += 1,
                Err(e) => warn!(chat = %message.chat, error = %e, "failed to forward message"),
            }
        }

        let replies = self.relay.take_all_pending();
        for reply in &replies {
            self.session
                .send_message(&reply.chat, &reply.text)
                .await
                .context("WhatsApp session could not be recovered")?;
        }

        if !messages.is_empty() || !replies.is_empty() {
            info!(
                received = messages.len(),
                forwarded,
                replies = replies.len(),
                "bridge cycle complete"
            );
        }
        Ok(())
    }

    async fn cancelled_during_startup(&mut self) -> Result<()> {
        info!("shutdown requested during startup");
        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.set_state(BridgeState::ShuttingDown);
        self.session.stop().await;
        self.relay.stop().await;
        self.set_state(BridgeState::Stopped);
        info!("bridge stopped");
    }
}
