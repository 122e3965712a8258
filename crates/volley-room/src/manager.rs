//! Room registry: creates, routes to, and destroys room actors.

use std::collections::{HashMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use volley_protocol::{ConnectionId, RoomCode};
use volley_sim::{Role, Ruleset};

use crate::room::{child_rng, spawn_room};
use crate::{PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo, code};

/// Owns every live room, keyed by its code.
///
/// The registry lock covers map lookups and updates only. It is released
/// before awaiting any room actor, so one busy room never holds up
/// requests for the others.
pub struct RoomManager {
    registry: Mutex<Registry>,
    config: RoomConfig,
}

struct Registry {
    rooms: HashMap<RoomCode, RoomHandle>,

    /// Rooms each connection holds a slot in, for disconnect cleanup.
    memberships: HashMap<ConnectionId, HashSet<RoomCode>>,

    rng: StdRng,
}

impl Registry {
    fn forget(&mut self, code: &RoomCode) {
        self.memberships.retain(|_, codes| {
            codes.remove(code);
            !codes.is_empty()
        });
    }

    /// Drops `code` if it still names the room behind `handle`.
    fn remove_if_same(&mut self, code: &RoomCode, handle: &RoomHandle) -> bool {
        if !self.rooms.get(code).is_some_and(|h| h.same_room(handle)) {
            return false;
        }
        self.rooms.remove(code);
        self.forget(code);
        true
    }
}

impl RoomManager {
    pub fn new() -> Self {
        Self::with_config(RoomConfig::default())
    }

    pub fn with_config(config: RoomConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// A manager whose room codes and per-room randomness all derive
    /// from `rng`.
    pub fn with_rng(config: RoomConfig, rng: StdRng) -> Self {
        Self {
            registry: Mutex::new(Registry {
                rooms: HashMap::new(),
                memberships: HashMap::new(),
                rng,
            }),
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Opens a room under a fresh code with `creator` as `playerA`.
    ///
    /// The room does not tick until a second player joins. The creator's
    /// `sender` receives `roomCreated` first.
    pub async fn create_room(
        &self,
        creator: ConnectionId,
        sender: PlayerSender,
        ruleset: Ruleset,
    ) -> RoomCode {
        let mut registry = self.registry.lock().await;
        let Registry {
            rooms,
            memberships,
            rng,
        } = &mut *registry;

        let code = code::generate_unique(rng, |c| rooms.contains_key(c));
        let handle = spawn_room(
            code.clone(),
            ruleset,
            creator,
            sender,
            &self.config,
            child_rng(rng),
        );
        rooms.insert(code.clone(), handle);
        memberships.entry(creator).or_default().insert(code.clone());
        tracing::info!(room = %code, %creator, %ruleset, "room created");
        code
    }

    /// Seats `joiner` in the room's free slot.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if no room has this code.
    /// - [`RoomError::RoomFull`] if both slots are taken.
    /// - [`RoomError::Unavailable`] if the room stopped meanwhile.
    ///
    /// None of these change any room.
    pub async fn join_room(
        &self,
        joiner: ConnectionId,
        sender: PlayerSender,
        code: &RoomCode,
    ) -> Result<Role, RoomError> {
        let handle = self
            .handle(code)
            .await
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        let role = handle.join(joiner, sender).await?;

        let mut registry = self.registry.lock().await;
        // The room may have been ended while the join was in flight.
        if registry.rooms.get(code).is_some_and(|h| h.same_room(&handle)) {
            registry
                .memberships
                .entry(joiner)
                .or_default()
                .insert(code.clone());
        }
        Ok(role)
    }

    /// Forwards paddle input to a room.
    ///
    /// Unknown codes and non-finite `y` are ignored.
    pub async fn apply_paddle_input(&self, code: &RoomCode, role: Role, y: f64) {
        if !y.is_finite() {
            tracing::debug!(room = %code, y, "ignoring non-finite paddle input");
            return;
        }
        if let Some(handle) = self.handle(code).await {
            let _ = handle.paddle_move(role, y).await;
        }
    }

    /// Ends a room: both players get `gameEnded` and the code is released.
    ///
    /// Returns `false` if no room has this code.
    pub async fn end_room(&self, code: &RoomCode) -> bool {
        let handle = {
            let mut registry = self.registry.lock().await;
            let Some(handle) = registry.rooms.remove(code) else {
                return false;
            };
            registry.forget(code);
            handle
        };
        let _ = handle.end().await;
        tracing::info!(room = %code, "room destroyed");
        true
    }

    /// Removes `conn` from every room it is seated in.
    ///
    /// Rooms left with no players are destroyed. Returns their codes.
    pub async fn on_disconnect(&self, conn: ConnectionId) -> Vec<RoomCode> {
        let seated: Vec<(RoomCode, RoomHandle)> = {
            let mut registry = self.registry.lock().await;
            let Some(codes) = registry.memberships.remove(&conn) else {
                return Vec::new();
            };
            codes
                .into_iter()
                .filter_map(|code| {
                    let handle = registry.rooms.get(&code)?.clone();
                    Some((code, handle))
                })
                .collect()
        };

        let mut destroyed = Vec::new();
        for (code, handle) in seated {
            // An actor that already stopped counts as empty.
            let empty = handle.disconnect(conn).await.unwrap_or(true);
            if empty && self.registry.lock().await.remove_if_same(&code, &handle) {
                tracing::info!(room = %code, "room destroyed");
                destroyed.push(code);
            }
        }
        destroyed
    }

    pub async fn room_info(&self, code: &RoomCode) -> Result<RoomInfo, RoomError> {
        let handle = self
            .handle(code)
            .await
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        handle.info().await
    }

    pub async fn contains(&self, code: &RoomCode) -> bool {
        self.registry.lock().await.rooms.contains_key(code)
    }

    /// Codes of the rooms `conn` is seated in.
    pub async fn rooms_of(&self, conn: ConnectionId) -> Vec<RoomCode> {
        self.registry
            .lock()
            .await
            .memberships
            .get(&conn)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn room_count(&self) -> usize {
        self.registry.lock().await.rooms.len()
    }

    pub async fn room_codes(&self) -> Vec<RoomCode> {
        self.registry.lock().await.rooms.keys().cloned().collect()
    }

    async fn handle(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.registry.lock().await.rooms.get(code).cloned()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
