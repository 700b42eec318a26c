use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn, Instrument};

use super::engine::Engine;
use super::events::ClientAction;
use super::snapshot::EngineSnapshot;
use super::types::{GameId, UserId};

const LOG_TARGET: &str = "holdem_engine::engine::actor";
const MAILBOX_CAPACITY: usize = 64;

/// Messages the engine task dequeues in order. Timer commands ride
/// the same mailbox as player actions, so whichever is dequeued first
/// wins any race and the loser no-ops on its generation check.
#[derive(Debug)]
pub enum EngineCommand {
    /// Begin the next hand (room layer, or the scheduled inter-hand
    /// pause).
    Start,
    Action {
        user_id: UserId,
        action: ClientAction,
    },
    Snapshot {
        user_id: Option<UserId>,
        reply: oneshot::Sender<EngineSnapshot>,
    },
    TimerTick {
        generation: u64,
        remaining: u64,
    },
    TimerExpired {
        generation: u64,
    },
    Shutdown,
}

/// Send-handle to a running engine task. Cheap to clone; the room
/// layer holds one per active room and routes socket messages through
/// it.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub async fn start_hand(&self) -> bool {
        self.tx.send(EngineCommand::Start).await.is_ok()
    }

    pub async fn submit_action(&self, user_id: UserId, action: ClientAction) -> bool {
        self.tx
            .send(EngineCommand::Action { user_id, action })
            .await
            .is_ok()
    }

    /// Full current state with hole cards filtered to `user_id`; used
    /// on reconnect. `None` when the engine has shut down.
    pub async fn snapshot(&self, user_id: Option<UserId>) -> Option<EngineSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::Snapshot { user_id, reply })
            .await
            .ok()?;
        rx.await.ok()
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(EngineCommand::Shutdown).await;
    }
}

/// Spawn the single-threaded owner task for an engine and return its
/// handle. All game state lives inside the task from here on.
pub fn spawn_engine(mut engine: Engine) -> EngineHandle {
    let (tx, mut rx) = mpsc::channel(MAILBOX_CAPACITY);
    engine.attach_mailbox(tx.clone());
    let game_id = engine.game_id();
    let span = tracing::info_span!("engine", game_id);
    tokio::spawn(
        async move {
            info!(target: LOG_TARGET, game_id, "engine task started");
            while let Some(command) = rx.recv().await {
                match command {
                    EngineCommand::Start => {
                        if let Err(err) = engine.start_hand().await {
                            warn!(
                                target: LOG_TARGET,
                                game_id,
                                error = %err,
                                "hand start refused"
                            );
                            engine.surface_error(None, err);
                        }
                    }
                    EngineCommand::Action { user_id, action } => {
                        if let Err(err) = engine.submit_action(user_id, action).await {
                            engine.surface_error(Some(user_id), err);
                        }
                    }
                    EngineCommand::Snapshot { user_id, reply } => {
                        let _ = reply.send(engine.snapshot(user_id));
                    }
                    EngineCommand::TimerTick {
                        generation,
                        remaining,
                    } => engine.handle_timer_tick(generation, remaining),
                    EngineCommand::TimerExpired { generation } => {
                        engine.handle_timer_expired(generation).await;
                    }
                    EngineCommand::Shutdown => break,
                }
            }
            debug!(target: LOG_TARGET, game_id, "engine task stopped");
        }
        .instrument(span),
    );
    EngineHandle { tx }
}

/// Live engines keyed by room. Lookups hand out send-handles, never
/// state.
#[derive(Default)]
pub struct EngineRegistry {
    engines: DashMap<GameId, EngineHandle>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, game_id: GameId, handle: EngineHandle) {
        self.engines.insert(game_id, handle);
    }

    pub fn get(&self, game_id: GameId) -> Option<EngineHandle> {
        self.engines.get(&game_id).map(|h| h.clone())
    }

    /// Drop the room's handle and tell its task to stop.
    pub async fn remove(&self, game_id: GameId) {
        if let Some((_, handle)) = self.engines.remove(&game_id) {
            handle.shutdown().await;
        }
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
