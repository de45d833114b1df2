//! facegate-session — Runs a capture session.
//!
//! Architecture:
//! - Engine: a dedicated OS thread that owns the capture gate, the validity
//!   evaluator and both stores. Requests arrive over a bounded mpsc channel;
//!   confirm/retry/status reply over oneshot channels.
//! - Frame pump: a thread pulling frames from the frame source into a
//!   `watch` channel, keeping only the newest.
//! - Detection worker: a Tokio task running the face capability on the
//!   newest frame and forwarding the result to the engine.

pub mod config;
pub mod engine;
pub mod pump;
pub mod session;

pub use config::{Config, ConfigError};
pub use engine::{spawn_engine, EngineError, EngineHandle, SessionEvent};
pub use session::{Session, SessionError};
