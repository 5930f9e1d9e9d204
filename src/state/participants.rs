use super::Session;
use crate::error::SessionError;
use crate::types::*;
use std::collections::{BTreeMap, HashMap};

/// Live participants and which connection currently speaks for each of them
#[derive(Debug, Default, Clone)]
pub struct Participants {
    live: BTreeMap<PlayerId, Participant>,
    bindings: HashMap<ConnectionId, PlayerId>,
    last_id: PlayerId,
}

impl Participants {
    pub fn get(&self, player_id: PlayerId) -> Option<&Participant> {
        self.live.get(&player_id)
    }

    /// The participant a connection is bound to, if any
    pub fn bound_to(&self, conn: &ConnectionId) -> Option<PlayerId> {
        self.bindings.get(conn).copied()
    }

    /// Connection currently authoritative for `player_id`
    pub fn connection_of(&self, player_id: PlayerId) -> Option<&ConnectionId> {
        self.bindings
            .iter()
            .find(|(_, id)| **id == player_id)
            .map(|(conn, _)| conn)
    }

    pub fn list(&self) -> Vec<Participant> {
        self.live.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn name_in_use(&self, name: &str) -> bool {
        self.live.values().any(|p| p.name == name)
    }

    fn mint(&mut self, name: &str) -> PlayerId {
        self.last_id += 1;
        let id = self.last_id;
        self.live.insert(
            id,
            Participant {
                id,
                name: name.to_string(),
                online: false,
            },
        );
        id
    }

    fn refresh_online(&mut self, player_id: PlayerId) {
        let online = self.bindings.values().any(|id| *id == player_id);
        if let Some(p) = self.live.get_mut(&player_id) {
            p.online = online;
        }
    }

    /// Release whatever `conn` is bound to
    fn release(&mut self, conn: &ConnectionId) -> Option<PlayerId> {
        let previous = self.bindings.remove(conn)?;
        self.refresh_online(previous);
        Some(previous)
    }

    /// Make `conn` the only connection for `player_id`.
    /// Returns the connection that was displaced, if any.
    fn bind(&mut self, conn: &ConnectionId, player_id: PlayerId) -> Option<ConnectionId> {
        self.release(conn);
        let displaced = self.connection_of(player_id).cloned();
        if let Some(old) = &displaced {
            self.bindings.remove(old);
        }
        self.bindings.insert(conn.clone(), player_id);
        self.refresh_online(player_id);
        displaced
    }

    /// Remove a participant and every binding to it
    fn remove(&mut self, player_id: PlayerId) -> Option<(Participant, Vec<ConnectionId>)> {
        let participant = self.live.remove(&player_id)?;
        let conns: Vec<_> = self
            .bindings
            .iter()
            .filter(|(_, id)| **id == player_id)
            .map(|(conn, _)| conn.clone())
            .collect();
        for conn in &conns {
            self.bindings.remove(conn);
        }
        Some((participant, conns))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub player: Participant,
    /// True when an existing identity was reclaimed with its token
    pub reconnected: bool,
    /// Connection that previously spoke for this identity
    pub displaced: Option<ConnectionId>,
}

impl Session {
    /// Join (or rejoin) the quiz on `conn` under `name`.
    ///
    /// A `token` naming a live participant with the same name rebinds that
    /// identity; anything else mints a new participant.
    pub fn join(
        &mut self,
        conn: &ConnectionId,
        token: Option<PlayerId>,
        name: &str,
    ) -> Result<JoinOutcome, SessionError> {
        let name = name.trim();
        if !self.roster.contains(name) {
            return Err(SessionError::NotOnRoster(name.to_string()));
        }

        let reclaimable = token.filter(|id| {
            self.participants
                .get(*id)
                .is_some_and(|p| p.name == name)
        });

        if let Some(player_id) = reclaimable {
            if self.participants.bound_to(conn) == Some(player_id) {
                // Repeated join on the same connection
                let player = self.participants.get(player_id).cloned();
                if let Some(player) = player {
                    return Ok(JoinOutcome {
                        player,
                        reconnected: true,
                        displaced: None,
                    });
                }
            }

            let displaced = self.participants.bind(conn, player_id);
            if let Some(old) = &displaced {
                tracing::info!(
                    "Participant {} moved from connection {} to {}",
                    player_id,
                    old,
                    conn
                );
            }
            self.touch();
            let player = self
                .participants
                .get(player_id)
                .cloned()
                .ok_or(SessionError::UnknownParticipant(player_id))?;
            tracing::info!("Participant {} ({}) reconnected", player.name, player.id);
            return Ok(JoinOutcome {
                player,
                reconnected: true,
                displaced,
            });
        }

        if let Some(stale) = token {
            tracing::debug!("Token {} for {:?} is not reusable, minting new id", stale, name);
        }
        if self.participants.name_in_use(name) {
            tracing::warn!("Name {:?} joined again while already held by a live participant", name);
        }

        let player_id = self.participants.mint(name);
        self.participants.bind(conn, player_id);
        self.touch();

        let player = self
            .participants
            .get(player_id)
            .cloned()
            .ok_or(SessionError::UnknownParticipant(player_id))?;
        tracing::info!("Participant {} joined as {}", player.name, player.id);
        Ok(JoinOutcome {
            player,
            reconnected: false,
            displaced: None,
        })
    }

    /// Drop the participant from the live roster and return the connections
    /// that must be told to discard their token. Winners and history are kept.
    pub fn force_logout(&mut self, player_id: PlayerId) -> Result<Vec<ConnectionId>, SessionError> {
        let (participant, conns) = self
            .participants
            .remove(player_id)
            .ok_or(SessionError::UnknownParticipant(player_id))?;
        tracing::info!(
            "Forced logout of {} ({}), {} connection(s) severed",
            participant.name,
            participant.id,
            conns.len()
        );
        self.touch();
        Ok(conns)
    }

    /// A connection went away. The participant stays, marked offline.
    pub fn disconnect(&mut self, conn: &ConnectionId) {
        if let Some(player_id) = self.participants.release(conn) {
            tracing::info!("Participant {} went offline", player_id);
            self.touch();
        }
    }

    /// Participant that `conn` speaks for
    pub fn player_for(&self, conn: &ConnectionId) -> Option<&Participant> {
        self.participants
            .bound_to(conn)
            .and_then(|id| self.participants.get(id))
    }
}
