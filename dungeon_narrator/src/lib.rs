//! # Dungeon Narrator
//!
//! The boundary between the dungeon simulation and an untrusted narrator.
//! This crate assembles narration requests from `dungeon_rules` state, parses
//! whatever the narrator sends back, and reconciles its proposed changes into
//! the authoritative state.
//!
//! ## Core Components
//!
//! - **narrator**: The narrator trait, its request and reply types, and timed calls
//! - **context_assembler**: Builds the request sent each turn
//! - **delta**: The field tables that decide what a narrator may change
//! - **reconcile**: Merges a reply into the state, repairs locations, applies enemy reactions
//! - **session**: One game session and its turn pipeline
//! - **commands**: Command classification and locally handled meta-commands
//!
//! ## Design Philosophy
//!
//! - **Advisory narration**: The narrator proposes changes; the engine decides
//! - **Atomic turns**: A turn either commits completely or leaves no trace
//! - **Explicit schema**: Writable fields are listed, never discovered by name

pub mod commands;
pub mod config;
pub mod context_assembler;
pub mod delta;
pub mod error;
pub mod events;
pub mod narrator;
pub mod reconcile;
pub mod session;
pub mod testing;

pub use commands::{is_movement_like, Command, MetaCommand};
pub use config::{Credentials, NarratorConfig, SessionConfig};
pub use context_assembler::{AssemblerConfig, ContextAssembler};
pub use error::{ConfigError, NarratorError, SessionError};
pub use events::{RepairKind, TurnEvent};
pub use narrator::{narrate_with_timeout, NarrationRequest, Narrator, NarratorOutput};
pub use reconcile::{Reconciler, Reconciliation};
pub use session::{GameSession, TurnOutcome};
