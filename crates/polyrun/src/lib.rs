//! A library for running code snippets against many inputs.
//!
//! Polyrun takes source code in one of six languages plus a list of stdin
//! payloads and returns the program's output for each payload. Each
//! submission gets its own job directory, is compiled once if its language
//! needs that, then runs once per input with all inputs in parallel.
//!
//! # Features
//!
//! - **Multi-language**: Python, C, C++, Java, JavaScript and Go, each with
//!   a configurable compile and run recipe.
//! - **Bounded processes**: every compiler and program run has a wall-clock
//!   deadline; a slow input never holds up its siblings.
//! - **Ordered fan-out**: output `i` always belongs to input `i`.
//! - **Deterministic cleanup**: job directories are removed on every path.
//! - **TOML configuration**: layered with `POLYRUN_*` environment overrides.
//!
//! # Not a sandbox
//!
//! Programs run as ordinary child processes with the privileges of the
//! host process. The [`gate`] is a textual denylist that stops naive misuse;
//! it is trivially bypassed and is not an isolation mechanism.

pub use config::{Config, ConfigError, EXAMPLE_CONFIG, Language, Toolchain};
pub use gate::GateRejection;
pub use runner::{ExecuteError, ExecutionOutcome, Runner, TIMEOUT_DIAGNOSTIC};
pub use submission::SubmissionError;
pub use types::{SubmissionRequest, SubmissionResponse};
pub use workspace::{JobWorkspace, WorkspaceError};

pub mod config;
pub mod gate;
pub mod runner;
pub mod submission;
pub mod types;
pub mod workspace;
