//! Connection gateway: the single sequential worker behind every room
//!
//! All connection lifecycle events and inbound client events are funneled
//! through one mailbox and processed in arrival order by a worker that owns
//! the session registry and the outbound-sender table. Running every mutation
//! on this one worker is what serializes concurrent submissions, disconnects,
//! and host advancement: no lock juggling, no torn rosters, no double-scored
//! answers.
//!
//! Delivery is fire-and-forget. Each connection's writer task drains its own
//! unbounded channel; a send to a dead channel just means the connection is
//! already gone and its `Disconnected` command is in flight.

use crate::questions::Question;
use crate::registry::SessionRegistry;
use crate::session::{AdvanceOutcome, JoinOutcome, SessionState};
use log::{debug, info, warn};
use shared::{ClientEvent, ConnId, ServerEvent};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Commands delivered to the gateway worker by the network layer.
#[derive(Debug)]
pub enum GatewayCommand {
    /// A connection was established; `sender` feeds its writer task.
    Connected {
        conn_id: ConnId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    },
    /// A parsed client event arrived on an established connection.
    Inbound { conn_id: ConnId, event: ClientEvent },
    /// The connection went away (clean close or error, no distinction).
    Disconnected { conn_id: ConnId },
}

/// The gateway worker state: session registry, question bank, and one
/// outbound sender per live connection.
pub struct Gateway {
    registry: SessionRegistry,
    questions: Vec<Question>,
    connections: HashMap<ConnId, mpsc::UnboundedSender<ServerEvent>>,
    command_rx: mpsc::UnboundedReceiver<GatewayCommand>,
}

impl Gateway {
    /// Creates the gateway and the sender half of its mailbox. The network
    /// layer clones the sender into every connection task.
    pub fn new(questions: Vec<Question>) -> (Self, mpsc::UnboundedSender<GatewayCommand>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let gateway = Self {
            registry: SessionRegistry::new(),
            questions,
            connections: HashMap::new(),
            command_rx,
        };
        (gateway, command_tx)
    }

    /// Processes commands until every sender half of the mailbox is dropped.
    pub async fn run(mut self) {
        info!("Gateway worker started ({} questions loaded)", self.questions.len());
        while let Some(command) = self.command_rx.recv().await {
            self.handle_command(command);
        }
        info!("Gateway worker stopped");
    }

    /// Applies a single command. Public so tests can drive the gateway
    /// deterministically without spawning the worker.
    pub fn handle_command(&mut self, command: GatewayCommand) {
        match command {
            GatewayCommand::Connected { conn_id, sender } => {
                debug!("Connection {} registered", conn_id);
                self.connections.insert(conn_id, sender);
            }
            GatewayCommand::Inbound { conn_id, event } => self.handle_event(conn_id, event),
            GatewayCommand::Disconnected { conn_id } => self.handle_disconnect(conn_id),
        }
    }

    fn handle_event(&mut self, conn_id: ConnId, event: ClientEvent) {
        match event {
            ClientEvent::CreateRoom => {
                let code = self.registry.create(conn_id);
                self.send_to(conn_id, ServerEvent::RoomCreated { room_code: code });
            }

            ClientEvent::JoinRoom {
                room_code,
                username,
            } => self.handle_join(conn_id, room_code, username),

            ClientEvent::StartGame { room_code } => {
                let started = match self.registry.get_mut(&room_code) {
                    Some(session) => session.start(conn_id),
                    None => None,
                };
                if let Some(index) = started {
                    let question = self.question_event(index);
                    self.broadcast(&room_code, question);
                }
            }

            ClientEvent::SubmitAnswer {
                room_code,
                answer_index,
                time_remaining,
            } => {
                let progress = match self.registry.get_mut(&room_code) {
                    Some(session) => {
                        session.submit_answer(conn_id, answer_index, time_remaining, &self.questions)
                    }
                    None => None,
                };
                if let Some(progress) = progress {
                    self.broadcast(
                        &room_code,
                        ServerEvent::AnswerProgress {
                            answered_count: progress.answered_count,
                            total_players: progress.total_players,
                        },
                    );
                    if progress.all_answered {
                        self.broadcast(&room_code, ServerEvent::AllAnswered);
                    }
                }
            }

            ClientEvent::AdvanceQuestion { room_code } => {
                let outcome = match self.registry.get_mut(&room_code) {
                    Some(session) => session.advance(conn_id, self.questions.len()),
                    None => AdvanceOutcome::Ignored,
                };
                match outcome {
                    AdvanceOutcome::NextQuestion(index) => {
                        let question = self.question_event(index);
                        self.broadcast(&room_code, question);
                    }
                    AdvanceOutcome::GameOver(leaderboard) => {
                        self.broadcast(&room_code, ServerEvent::GameOver {
                            players: leaderboard,
                        });
                    }
                    AdvanceOutcome::Ignored => {}
                }
            }
        }
    }

    fn handle_join(&mut self, conn_id: ConnId, room_code: String, username: String) {
        let session = match self.registry.get_mut(&room_code) {
            Some(session) => session,
            None => {
                self.send_to(
                    conn_id,
                    ServerEvent::JoinError {
                        message: "Room not found".to_string(),
                    },
                );
                return;
            }
        };

        match session.join(conn_id, username) {
            JoinOutcome::Finished => {
                self.send_to(
                    conn_id,
                    ServerEvent::JoinError {
                        message: "Game already finished".to_string(),
                    },
                );
            }
            JoinOutcome::Roster(roster) => {
                // Capture before releasing the session borrow
                let active_question = match session.state() {
                    SessionState::Playing => session.current_question(),
                    _ => None,
                };

                self.broadcast(&room_code, ServerEvent::PlayerJoined {
                    players: roster.clone(),
                });
                self.send_to(
                    conn_id,
                    ServerEvent::JoinSuccess {
                        room_code,
                        players: roster,
                    },
                );

                // A late joiner missed the broadcast of the question in
                // flight, so it is resent to that connection alone
                if let Some(index) = active_question {
                    let question = self.question_event(index);
                    self.send_to(conn_id, question);
                }
            }
        }
    }

    /// Disconnect reconciliation: drop the player from every session holding
    /// it and, when the connection hosted a session, notify the room and tear
    /// the session down. Its code is invalid from this point on.
    fn handle_disconnect(&mut self, conn_id: ConnId) {
        debug!("Connection {} disconnected", conn_id);
        self.connections.remove(&conn_id);

        let mut roster_updates = Vec::new();
        let mut hosted = Vec::new();
        for session in self.registry.iter_mut() {
            if let Some(roster) = session.remove_player(conn_id) {
                roster_updates.push((session.code().to_string(), roster));
            }
            if session.host() == conn_id {
                hosted.push(session.code().to_string());
            }
        }

        for (code, roster) in roster_updates {
            self.broadcast(&code, ServerEvent::PlayerJoined { players: roster });
        }

        for code in hosted {
            info!("Host of room {} disconnected, tearing the room down", code);
            self.broadcast(&code, ServerEvent::HostDisconnected);
            self.registry.remove(&code);
        }
    }

    fn question_event(&self, index: usize) -> ServerEvent {
        ServerEvent::NextQuestion {
            question: self.questions[index].view(index, self.questions.len()),
        }
    }

    /// Targeted reply to a single connection.
    fn send_to(&self, conn_id: ConnId, event: ServerEvent) {
        if let Some(sender) = self.connections.get(&conn_id) {
            if sender.send(event).is_err() {
                debug!("Dropped event for closing connection {}", conn_id);
            }
        } else {
            warn!("No outbound channel for connection {}", conn_id);
        }
    }

    /// Fans an event out to every subscriber of a room.
    fn broadcast(&self, room_code: &str, event: ServerEvent) {
        let subscribers = match self.registry.get(room_code) {
            Some(session) => session.subscribers().to_vec(),
            None => return,
        };

        for conn_id in subscribers {
            self.send_to(conn_id, event.clone());
        }
    }
}
