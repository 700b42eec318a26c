use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use super::actor::EngineCommand;

const LOG_TARGET: &str = "holdem_engine::engine::timer";

/// The per-turn countdown. One arming at a time: the spawned task
/// sends a tick into the engine mailbox each second and an expiry at
/// zero. Disarming cancels the task *and* bumps the generation, so a
/// tick or expiry already queued for a dead arming is dropped at the
/// mailbox by the generation check.
#[derive(Debug, Default)]
pub(crate) struct TurnTimer {
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl TurnTimer {
    pub fn is_current(&self, generation: u64) -> bool {
        self.cancel.is_some() && generation == self.generation
    }

    pub fn arm(&mut self, tx: mpsc::Sender<EngineCommand>, duration: Duration) {
        self.disarm();
        self.generation += 1;
        let generation = self.generation;
        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        let secs = duration.as_secs();

        let span = tracing::debug_span!("turn_timer", generation);
        tokio::spawn(
            async move {
                for remaining in (0..secs).rev() {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                    }
                    if tx
                        .send(EngineCommand::TimerTick {
                            generation,
                            remaining,
                        })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                if token.is_cancelled() {
                    return;
                }
                if tx
                    .send(EngineCommand::TimerExpired { generation })
                    .await
                    .is_err()
                {
                    debug!(target: LOG_TARGET, generation, "engine mailbox closed before expiry");
                }
            }
            .instrument(span),
        );
    }

    /// Idempotent; safe after expiry.
    pub fn disarm(&mut self) {
        self.generation += 1;
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}
