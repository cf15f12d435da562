//! Command transport
//!
//! This module handles the remote side of the ledger: the signed wire
//! envelope, the dispatcher that turns commands into ledger operations, the
//! one-session-at-a-time server and the client that talks to it.

pub mod client;
pub mod dispatcher;
pub mod protocol;
pub mod server;

pub use client::LedgerClient;
pub use dispatcher::{CommandDispatcher, Outcome};
pub use protocol::{Command, CommandEnvelope, Response};
pub use server::{Server, SessionEnd, DEFAULT_LEDGER_ADDR};
