//! The room actor: one Tokio task per room.
//!
//! All access to a room's state goes through its command channel, so the
//! simulation, the slots and the scheduler are only ever touched by the
//! actor task itself. The actor multiplexes commands and ticks with
//! `tokio::select!`; while a room is waiting for its second player the
//! tick branch simply never fires.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use volley_protocol::{ConnectionId, RoomCode, ServerMessage};
use volley_sim::{Role, Ruleset, SimulationState, effects, physics};
use volley_tick::{TickInfo, TickScheduler};

use crate::{PlayerSender, RoomConfig, RoomError, RoomPhase};

pub(crate) enum RoomCommand {
    Join {
        conn: ConnectionId,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<Role, RoomError>>,
    },

    PaddleMove {
        role: Role,
        y: f64,
    },

    End {
        reply: oneshot::Sender<()>,
    },

    /// Replies `true` if the room is now empty and has stopped.
    Disconnect {
        conn: ConnectionId,
        reply: oneshot::Sender<bool>,
    },

    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
}

/// A point-in-time view of a room.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub ruleset: Ruleset,
    pub phase: RoomPhase,
    pub player_a: Option<ConnectionId>,
    pub player_b: Option<ConnectionId>,
    /// Ticks since the current match started.
    pub tick_count: u64,
    pub state: SimulationState,
}

impl RoomInfo {
    pub fn player_count(&self) -> usize {
        usize::from(self.player_a.is_some()) + usize::from(self.player_b.is_some())
    }
}

/// A cheap, cloneable handle to a running room actor.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Whether both handles drive the same actor.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.code.clone())
    }

    /// Puts `conn` in the first free slot and returns its role.
    pub async fn join(
        &self,
        conn: ConnectionId,
        sender: PlayerSender,
    ) -> Result<Role, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                conn,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Moves a paddle. Fire-and-forget; the room broadcasts the result.
    pub async fn paddle_move(&self, role: Role, y: f64) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::PaddleMove { role, y })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Broadcasts `gameEnded` and stops the actor once it has.
    pub async fn end(&self) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::End { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Clears every slot held by `conn`. Returns `true` if the room is
    /// now empty and its actor has stopped.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Disconnect {
                conn,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct Member {
    conn: ConnectionId,
    sender: PlayerSender,
}

struct RoomActor {
    code: RoomCode,
    ruleset: Ruleset,
    phase: RoomPhase,
    player_a: Option<Member>,
    player_b: Option<Member>,
    state: SimulationState,
    scheduler: TickScheduler,
    rng: StdRng,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        info!(room = %self.code, ruleset = %self.ruleset, "room actor started");
        self.send_to(
            Role::PlayerA,
            ServerMessage::RoomCreated {
                room_code: self.code.clone(),
            },
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                tick = self.scheduler.wait_for_tick() => self.on_tick(tick),
            }
        }

        self.scheduler.stop();
        info!(
            room = %self.code,
            ticks = self.scheduler.metrics().total_ticks,
            "room actor stopped"
        );
    }

    /// Returns `false` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                conn,
                sender,
                reply,
            } => {
                let _ = reply.send(self.handle_join(conn, sender));
            }
            RoomCommand::PaddleMove { role, y } => {
                if self.state.move_paddle(role, y) {
                    self.broadcast_state();
                }
            }
            RoomCommand::End { reply } => {
                info!(room = %self.code, "room ended");
                self.broadcast(ServerMessage::GameEnded);
                let _ = reply.send(());
                return false;
            }
            RoomCommand::Disconnect { conn, reply } => {
                let empty = self.handle_disconnect(conn);
                let _ = reply.send(empty);
                if empty {
                    return false;
                }
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
        }
        true
    }

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        sender: PlayerSender,
    ) -> Result<Role, RoomError> {
        let role = if self.player_a.is_none() {
            Role::PlayerA
        } else if self.player_b.is_none() {
            Role::PlayerB
        } else {
            return Err(RoomError::RoomFull(self.code.clone()));
        };

        *self.slot_mut(role) = Some(Member { conn, sender });
        info!(room = %self.code, %conn, %role, "player joined");
        self.send_to(
            role,
            ServerMessage::RoomJoined {
                room_code: self.code.clone(),
                role,
            },
        );

        if self.player_a.is_some() && self.player_b.is_some() {
            self.start_match();
        }
        Ok(role)
    }

    fn start_match(&mut self) {
        self.state = SimulationState::new(self.ruleset);
        self.phase = RoomPhase::Playing;
        self.scheduler.start();
        info!(room = %self.code, ruleset = %self.ruleset, "match started");
        self.broadcast(ServerMessage::StartGame {
            ruleset: self.ruleset,
        });
    }

    /// Returns `true` if no slot is left occupied.
    fn handle_disconnect(&mut self, conn: ConnectionId) -> bool {
        let mut cleared = false;
        for slot in [&mut self.player_a, &mut self.player_b] {
            if slot.as_ref().is_some_and(|m| m.conn == conn) {
                *slot = None;
                cleared = true;
            }
        }
        if !cleared {
            return self.player_a.is_none() && self.player_b.is_none();
        }

        if self.player_a.is_none() && self.player_b.is_none() {
            info!(room = %self.code, %conn, "last player left");
            return true;
        }

        info!(room = %self.code, %conn, "player left");
        if self.scheduler.stop() {
            self.phase = RoomPhase::Waiting;
            info!(room = %self.code, "match paused");
        }
        false
    }

    fn on_tick(&mut self, tick: TickInfo) {
        let now_ms = u64::try_from(tick.elapsed.as_millis()).unwrap_or(u64::MAX);

        let report = effects::step(&mut self.state, now_ms, &mut self.rng);
        if !report.is_empty() {
            debug!(
                room = %self.code,
                now_ms,
                rolled = ?report.rolled,
                expired = ?report.expired,
                "effects updated"
            );
        }

        let before = (self.state.score_a, self.state.score_b);
        physics::step(&mut self.state, &mut self.rng);
        if (self.state.score_a, self.state.score_b) != before {
            debug!(
                room = %self.code,
                score_a = self.state.score_a,
                score_b = self.state.score_b,
                "point scored"
            );
        }

        self.broadcast_state();
        self.scheduler.record_tick_end();
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<Member> {
        match role {
            Role::PlayerA => &mut self.player_a,
            Role::PlayerB => &mut self.player_b,
        }
    }

    fn broadcast_state(&self) {
        self.broadcast(ServerMessage::GameState {
            state: self.state.clone(),
        });
    }

    fn broadcast(&self, msg: ServerMessage) {
        for member in [&self.player_a, &self.player_b].into_iter().flatten() {
            member.sender.send(msg.clone());
        }
    }

    fn send_to(&self, role: Role, msg: ServerMessage) {
        let slot = match role {
            Role::PlayerA => &self.player_a,
            Role::PlayerB => &self.player_b,
        };
        if let Some(member) = slot {
            member.sender.send(msg);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            ruleset: self.ruleset,
            phase: self.phase,
            player_a: self.player_a.as_ref().map(|m| m.conn),
            player_b: self.player_b.as_ref().map(|m| m.conn),
            tick_count: self.scheduler.tick_count(),
            state: self.state.clone(),
        }
    }
}

/// Spawns a room actor with `creator` already seated as `playerA`.
///
/// The creator is sent `roomCreated` before the actor handles any
/// command.
pub(crate) fn spawn_room(
    code: RoomCode,
    ruleset: Ruleset,
    creator: ConnectionId,
    sender: PlayerSender,
    config: &RoomConfig,
    mut rng: StdRng,
) -> RoomHandle {
    let scheduler = TickScheduler::with_rng(config.tick_config(), child_rng(&mut rng));
    let (tx, rx) = mpsc::channel(config.command_channel_size.max(1));

    let actor = RoomActor {
        code: code.clone(),
        ruleset,
        phase: RoomPhase::Waiting,
        player_a: Some(Member {
            conn: creator,
            sender,
        }),
        player_b: None,
        state: SimulationState::new(ruleset),
        scheduler,
        rng,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}

/// A fresh per-room RNG seeded from `parent`.
pub(crate) fn child_rng(parent: &mut StdRng) -> StdRng {
    StdRng::from_rng(parent)
}
