//! Single-writer session coordinator
//!
//! One task owns the [`Session`]. Connections talk to it through a command
//! channel; after every applied command (or timer tick) that changed the
//! session, the full snapshot is published on the broadcast channels.
//! Participants and the admin get separate channels because their views
//! differ while answering is open.

use crate::error::SessionError;
use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::state::Session;
use crate::types::{ConnectionId, Role, SessionSnapshot};
use crate::ws::handlers::{handle_message, Outcome};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;

/// How often the round timer is re-evaluated
pub const TIMER_RESOLUTION: Duration = Duration::from_millis(250);

const COMMAND_QUEUE: usize = 1024;
const BROADCAST_CAPACITY: usize = 64;

/// Private channel for messages aimed at one connection
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug)]
pub enum Command {
    Connect {
        role: Role,
        outbox: Outbox,
        reply: oneshot::Sender<Connected>,
    },
    Disconnect {
        conn: ConnectionId,
    },
    Client {
        conn: ConnectionId,
        role: Role,
        msg: ClientMessage,
        reply: oneshot::Sender<Option<ServerMessage>>,
    },
    Snapshot {
        role: Role,
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

#[derive(Debug)]
pub struct Connected {
    pub connection_id: ConnectionId,
    /// `welcome` message carrying the initial snapshot
    pub welcome: ServerMessage,
}

/// Cloneable handle to the coordinator task
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    broadcast: broadcast::Sender<ServerMessage>,
    admin_broadcast: broadcast::Sender<ServerMessage>,
}

impl SessionHandle {
    /// Receiver for the `stateUpdate` stream matching `role`
    pub fn subscribe(&self, role: &Role) -> broadcast::Receiver<ServerMessage> {
        match role {
            Role::Admin => self.admin_broadcast.subscribe(),
            Role::Participant => self.broadcast.subscribe(),
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| SessionError::Unavailable)?;
        rx.await.map_err(|_| SessionError::Unavailable)
    }

    pub async fn connect(&self, role: Role, outbox: Outbox) -> Result<Connected, SessionError> {
        self.request(|reply| Command::Connect {
            role,
            outbox,
            reply,
        })
        .await
    }

    /// Apply a client message and return the reply for the sender, if any
    pub async fn dispatch(
        &self,
        conn: ConnectionId,
        role: Role,
        msg: ClientMessage,
    ) -> Result<Option<ServerMessage>, SessionError> {
        self.request(|reply| Command::Client {
            conn,
            role,
            msg,
            reply,
        })
        .await
    }

    pub async fn disconnect(&self, conn: ConnectionId) {
        if self
            .commands
            .send(Command::Disconnect { conn })
            .await
            .is_err()
        {
            tracing::warn!("Coordinator gone, dropping disconnect");
        }
    }

    pub async fn snapshot(&self, role: Role) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::Snapshot { role, reply }).await
    }
}

pub struct Coordinator {
    session: Session,
    commands: mpsc::Receiver<Command>,
    outboxes: HashMap<ConnectionId, Outbox>,
    broadcast: broadcast::Sender<ServerMessage>,
    admin_broadcast: broadcast::Sender<ServerMessage>,
    published: u64,
}

impl Coordinator {
    pub fn new(session: Session) -> (Self, SessionHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);
        let (tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);
        let (admin_tx, _admin_rx) = broadcast::channel(BROADCAST_CAPACITY);

        let published = session.version();
        let handle = SessionHandle {
            commands: cmd_tx,
            broadcast: tx.clone(),
            admin_broadcast: admin_tx.clone(),
        };
        let coordinator = Self {
            session,
            commands: cmd_rx,
            outboxes: HashMap::new(),
            broadcast: tx,
            admin_broadcast: admin_tx,
            published,
        };
        (coordinator, handle)
    }

    /// Spawn the coordinator on the current runtime
    pub fn spawn(session: Session) -> SessionHandle {
        let (coordinator, handle) = Self::new(session);
        tokio::spawn(coordinator.run());
        handle
    }

    /// Runs until every [`SessionHandle`] has been dropped
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(TIMER_RESOLUTION);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(cmd) => self.apply(cmd),
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    self.session.tick(Instant::now());
                }
            }
            self.publish();
        }

        tracing::info!("Session coordinator stopped");
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Connect {
                role,
                outbox,
                reply,
            } => {
                let connection_id = ulid::Ulid::new().to_string();
                tracing::info!("Connection {} registered as {:?}", connection_id, role);
                self.outboxes.insert(connection_id.clone(), outbox);

                let welcome = ServerMessage::Welcome {
                    protocol: PROTOCOL_VERSION.to_string(),
                    role: role.clone(),
                    connection_id: connection_id.clone(),
                    roster: self.session.roster().groups().to_vec(),
                    state: self.session.snapshot(&role),
                };
                if reply
                    .send(Connected {
                        connection_id: connection_id.clone(),
                        welcome,
                    })
                    .is_err()
                {
                    // Socket went away before the welcome arrived
                    self.drop_connection(&connection_id);
                }
            }
            Command::Disconnect { conn } => self.drop_connection(&conn),
            Command::Client {
                conn,
                role,
                msg,
                reply,
            } => {
                let Outcome { reply: response, notify } =
                    handle_message(msg, &conn, &role, &mut self.session);
                for (target, message) in notify {
                    self.send_to(&target, message);
                }
                let _ = reply.send(response);
            }
            Command::Snapshot { role, reply } => {
                let _ = reply.send(self.session.snapshot(&role));
            }
        }
    }

    fn drop_connection(&mut self, conn: &ConnectionId) {
        self.outboxes.remove(conn);
        self.session.disconnect(conn);
        tracing::info!("Connection {} closed", conn);
    }

    fn send_to(&mut self, conn: &ConnectionId, msg: ServerMessage) {
        match self.outboxes.get(conn) {
            Some(outbox) => {
                if outbox.send(msg).is_err() {
                    tracing::debug!("Outbox for {} already closed", conn);
                }
            }
            None => tracing::debug!("No outbox for connection {}", conn),
        }
    }

    /// Push the full snapshot to everyone if the session changed
    fn publish(&mut self) {
        let version = self.session.version();
        if version == self.published {
            return;
        }
        self.published = version;

        // Ignore send errors (no receivers connected is fine)
        let _ = self.broadcast.send(ServerMessage::StateUpdate(
            self.session.snapshot(&Role::Participant),
        ));
        let _ = self
            .admin_broadcast
            .send(ServerMessage::StateUpdate(self.session.snapshot(&Role::Admin)));
        tracing::debug!("Published snapshot v{}", version);
    }
}
