//! # Quiz Room Server Library
//!
//! This library implements the server side of a real-time, multi-room quiz
//! game: one connection creates a room and becomes its host, others join by
//! a four-digit code, the host drives the game through a fixed question
//! sequence, and players race the clock for points.
//!
//! ## Architecture
//!
//! The server is split into four layers, outermost first:
//!
//! - **Network (`network`)**: a TCP accept loop speaking newline-delimited
//!   JSON. Each connection gets an id and a pair of reader/writer tasks; the
//!   reader forwards parsed events into the gateway mailbox, the writer
//!   drains the connection's outbound channel.
//! - **Gateway (`gateway`)**: a single sequential worker that owns all game
//!   state. Because every session mutation runs on this one worker in
//!   mailbox order, concurrent answer submissions, disconnects, and host
//!   advancement cannot interleave — the exactly-once scoring and roster
//!   consistency guarantees fall out of the architecture rather than out of
//!   locks.
//! - **Registry (`registry`)**: the keyed store of live sessions and the
//!   allocator of collision-free room codes.
//! - **Session (`session`)**: the per-room state machine (lobby, playing,
//!   results) holding the roster, scores, and the current question pointer.
//!
//! The question bank (`questions`) is immutable and shared by every room;
//! the answer key never leaves the server.
//!
//! ## Scope
//!
//! State is in-memory only: a process restart loses all running games by
//! design. Host authority is tied to connection identity, and question
//! timing is client-reported (the reported time remaining is clamped before
//! scoring, but there is no server-side timer).
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::QuizServer;
//! use server::questions::default_bank;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = QuizServer::bind("127.0.0.1:3001", default_bank()).await?;
//!     server.run().await
//! }
//! ```

pub mod gateway;
pub mod network;
pub mod questions;
pub mod registry;
pub mod session;
