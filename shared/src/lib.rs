use serde::{Deserialize, Serialize};

/// Points awarded for any correct answer before the speed bonus.
pub const BASE_POINTS: u32 = 1000;
/// Maximum speed bonus, earned by answering with the full time limit left.
pub const MAX_TIME_BONUS: u32 = 500;

/// Identity of a connected participant, assigned by the network layer.
pub type ConnId = u64;

/// Events sent from clients to the server, one JSON object per line.
///
/// Serialized as `{"type": "...", "data": {...}}` with snake_case type tags,
/// mirroring the event vocabulary the web clients speak.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    CreateRoom,
    JoinRoom {
        room_code: String,
        username: String,
    },
    StartGame {
        room_code: String,
    },
    SubmitAnswer {
        room_code: String,
        answer_index: usize,
        time_remaining: f32,
    },
    AdvanceQuestion {
        room_code: String,
    },
}

/// Events sent from the server to clients.
///
/// Targeted replies (`RoomCreated`, `JoinSuccess`, `JoinError`) go to a single
/// connection; everything else is broadcast to the whole room.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    RoomCreated {
        room_code: String,
    },
    JoinSuccess {
        room_code: String,
        players: Vec<PlayerInfo>,
    },
    JoinError {
        message: String,
    },
    PlayerJoined {
        players: Vec<PlayerInfo>,
    },
    NextQuestion {
        question: QuestionView,
    },
    AnswerProgress {
        answered_count: usize,
        total_players: usize,
    },
    AllAnswered,
    GameOver {
        players: Vec<PlayerInfo>,
    },
    HostDisconnected,
}

/// One roster entry as clients see it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerInfo {
    pub conn_id: ConnId,
    pub username: String,
    pub score: u32,
}

/// The public face of a question. Deliberately has no correct-answer field:
/// the answer key never leaves the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QuestionView {
    pub prompt: String,
    pub options: Vec<String>,
    pub index: usize,
    pub total: usize,
    pub time_limit: u32,
}

/// Computes the points awarded for a single answer.
///
/// Wrong answers score zero. Correct answers score `BASE_POINTS` plus a bonus
/// proportional to how much of the time limit was left when the client
/// submitted. `time_remaining` is client-reported and untrusted, so it is
/// clamped into `[0, time_limit]` before the bonus is computed.
pub fn score_answer(correct: bool, time_remaining: f32, time_limit: u32) -> u32 {
    if !correct {
        return 0;
    }

    if time_limit == 0 {
        return BASE_POINTS;
    }

    let limit = time_limit as f32;
    let remaining = time_remaining.clamp(0.0, limit);
    let bonus = ((remaining / limit) * MAX_TIME_BONUS as f32).floor() as u32;

    BASE_POINTS + bonus
}
