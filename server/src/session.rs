//! Per-room game state machine
//!
//! This module owns everything mutable about one quiz room: the roster in
//! join order, each player's score and answer-tracking state, the current
//! question pointer, and the lobby/playing/results lifecycle. Every operation
//! is a plain synchronous method returning a typed outcome; the gateway maps
//! outcomes to outbound events and guarantees that operations on one session
//! never interleave.

use crate::questions::Question;
use log::{debug, info};
use shared::{score_answer, ConnId, PlayerInfo};

/// Lifecycle of a session. Moves strictly forward; `Results` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Lobby,
    Playing,
    Results,
}

/// One participant in a session.
///
/// `last_answered` guards exactly-once scoring: a player's score can change
/// at most once per question index. `last_answer_time` is advisory and only
/// kept for display purposes.
#[derive(Debug, Clone)]
pub struct Player {
    pub conn_id: ConnId,
    pub username: String,
    pub score: u32,
    pub last_answered: Option<usize>,
    pub last_answer_time: f32,
}

impl Player {
    fn new(conn_id: ConnId, username: String) -> Self {
        Self {
            conn_id,
            username,
            score: 0,
            last_answered: None,
            last_answer_time: 0.0,
        }
    }

    fn info(&self) -> PlayerInfo {
        PlayerInfo {
            conn_id: self.conn_id,
            username: self.username.clone(),
            score: self.score,
        }
    }
}

/// Outcome of a join attempt.
#[derive(Debug)]
pub enum JoinOutcome {
    /// Joined (or was already a member); carries the roster to broadcast.
    Roster(Vec<PlayerInfo>),
    /// The game already reached its terminal state; nothing changed.
    Finished,
}

/// Progress snapshot produced by a scored submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerProgress {
    pub answered_count: usize,
    pub total_players: usize,
    pub all_answered: bool,
}

/// Outcome of a host-driven advance.
#[derive(Debug)]
pub enum AdvanceOutcome {
    /// Moved to the question at this index.
    NextQuestion(usize),
    /// Ran out of questions; carries the final leaderboard.
    GameOver(Vec<PlayerInfo>),
    /// Caller was not the host or the session was not playing.
    Ignored,
}

/// State of a single quiz room.
pub struct Session {
    code: String,
    host: ConnId,
    players: Vec<Player>,
    subscribers: Vec<ConnId>,
    current_question: Option<usize>,
    state: SessionState,
}

impl Session {
    /// Creates a session in the lobby state. The creating connection becomes
    /// the host and is subscribed to the room's broadcasts; it is not a
    /// player unless it also joins.
    pub fn new(code: String, host: ConnId) -> Self {
        Self {
            code,
            host,
            players: Vec::new(),
            subscribers: vec![host],
            current_question: None,
            state: SessionState::Lobby,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn host(&self) -> ConnId {
        self.host
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Index of the question currently being played, if any.
    pub fn current_question(&self) -> Option<usize> {
        self.current_question
    }

    /// Connections that receive this room's broadcasts: the host plus every
    /// connection that joined, in subscription order.
    pub fn subscribers(&self) -> &[ConnId] {
        &self.subscribers
    }

    pub fn contains_player(&self, conn_id: ConnId) -> bool {
        self.players.iter().any(|p| p.conn_id == conn_id)
    }

    /// Current roster in join order.
    pub fn roster(&self) -> Vec<PlayerInfo> {
        self.players.iter().map(Player::info).collect()
    }

    fn subscribe(&mut self, conn_id: ConnId) {
        if !self.subscribers.contains(&conn_id) {
            self.subscribers.push(conn_id);
        }
    }

    /// Adds a player to the roster.
    ///
    /// Valid in the lobby and mid-game (late joins are permitted); a finished
    /// session rejects the join. Joining twice from the same connection is
    /// idempotent: the roster is returned unchanged.
    pub fn join(&mut self, conn_id: ConnId, username: String) -> JoinOutcome {
        if self.state == SessionState::Results {
            return JoinOutcome::Finished;
        }

        if !self.contains_player(conn_id) {
            info!("Player {} ({}) joined room {}", conn_id, username, self.code);
            self.players.push(Player::new(conn_id, username));
            self.subscribe(conn_id);
        }

        JoinOutcome::Roster(self.roster())
    }

    /// Starts the game. Only the host can start, and only from the lobby;
    /// anything else is silently ignored. Returns the first question index.
    pub fn start(&mut self, caller: ConnId) -> Option<usize> {
        if caller != self.host || self.state != SessionState::Lobby {
            return None;
        }

        info!("Room {} started by host {}", self.code, caller);
        self.state = SessionState::Playing;
        self.current_question = Some(0);
        Some(0)
    }

    /// Records a player's answer for the current question.
    ///
    /// Returns `None` (no event, no state change) when the session is not
    /// playing, the connection is not a player, or the player already
    /// answered this question. Otherwise the answer is scored exactly once
    /// and the room-wide progress count is returned.
    pub fn submit_answer(
        &mut self,
        conn_id: ConnId,
        answer_index: usize,
        time_remaining: f32,
        questions: &[Question],
    ) -> Option<AnswerProgress> {
        if self.state != SessionState::Playing {
            return None;
        }

        let index = self.current_question?;
        let question = questions.get(index)?;
        let correct = answer_index == question.correct_index;

        let player = self.players.iter_mut().find(|p| p.conn_id == conn_id)?;
        if player.last_answered == Some(index) {
            debug!(
                "Player {} resubmitted for question {} in room {}, ignoring",
                conn_id, index, self.code
            );
            return None;
        }

        player.last_answered = Some(index);
        player.last_answer_time = time_remaining;

        let points = score_answer(correct, time_remaining, question.time_limit);
        player.score += points;
        debug!(
            "Player {} answered question {} in room {}: {} points",
            conn_id, index, self.code, points
        );

        let answered_count = self
            .players
            .iter()
            .filter(|p| p.last_answered == Some(index))
            .count();
        let total_players = self.players.len();

        Some(AnswerProgress {
            answered_count,
            total_players,
            all_answered: answered_count == total_players,
        })
    }

    /// Moves to the next question, or ends the game when the bank runs out.
    ///
    /// Only the host can advance, and only while playing, so `GameOver` is
    /// produced exactly once per session. The final leaderboard is sorted by
    /// descending score with a stable sort, so tied players keep their join
    /// order.
    pub fn advance(&mut self, caller: ConnId, question_count: usize) -> AdvanceOutcome {
        if caller != self.host || self.state != SessionState::Playing {
            return AdvanceOutcome::Ignored;
        }

        let next = self.current_question.map_or(0, |i| i + 1);
        self.current_question = Some(next);

        if next < question_count {
            debug!("Room {} advanced to question {}", self.code, next);
            AdvanceOutcome::NextQuestion(next)
        } else {
            info!("Room {} finished after {} questions", self.code, question_count);
            self.state = SessionState::Results;

            let mut leaderboard = self.roster();
            leaderboard.sort_by(|a, b| b.score.cmp(&a.score));
            AdvanceOutcome::GameOver(leaderboard)
        }
    }

    /// Removes a player (disconnect reconciliation). Returns the updated
    /// roster for broadcast if the connection actually was a player.
    pub fn remove_player(&mut self, conn_id: ConnId) -> Option<Vec<PlayerInfo>> {
        let position = self.players.iter().position(|p| p.conn_id == conn_id)?;
        let player = self.players.remove(position);
        self.subscribers.retain(|&id| id != conn_id);
        info!(
            "Player {} ({}) left room {}",
            conn_id, player.username, self.code
        );
        Some(self.roster())
    }
}
