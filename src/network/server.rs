use crate::auth::Authenticator;
use crate::core::Ledger;
use crate::error::{LedgerError, Result};
use crate::network::dispatcher::{CommandDispatcher, Outcome};
use crate::network::protocol::{Command, CommandEnvelope, Response};
use log::{error, info, warn};
use serde_json::Deserializer;
use std::io::{BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpListener, TcpStream};

pub const DEFAULT_LEDGER_ADDR: &str = "127.0.0.1:7777";

/// Ledger server. Owns the single ledger and serves one session at a time,
/// so a session has exclusive use of the ledger until it ends.
pub struct Server {
    /// The authoritative ledger, passed to the dispatcher per command
    ledger: Ledger,
    dispatcher: CommandDispatcher,
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client sent option 6
    ClientExit,
    /// The connection dropped or was closed by the client
    Disconnected,
    /// Unknown option or unreadable envelope
    ProtocolViolation(LedgerError),
}

// Result of handling one envelope inside a session
enum Step {
    Reply(Response),
    Close(Option<Response>, SessionEnd),
}

impl Server {
    pub fn new(ledger: Ledger, dispatcher: CommandDispatcher) -> Self {
        Self { ledger, dispatcher }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Bind and serve forever
    pub fn run(&mut self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| LedgerError::Transport(format!("Failed to bind to {addr}: {e}")))?;
        info!("Server listening on {addr}");
        self.serve(&listener)
    }

    /// Accept connections one after another; the next client waits in the
    /// listen backlog until the current session ends.
    pub fn serve(&mut self, listener: &TcpListener) -> Result<()> {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => match self.handle_connection(stream) {
                    Ok(end) => info!("Session ended: {end:?}"),
                    Err(e) => error!("Session failed: {e}"),
                },
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }
        Ok(())
    }

    /// Run one session to completion
    pub fn handle_connection(&mut self, stream: TcpStream) -> Result<SessionEnd> {
        let peer_addr = stream
            .peer_addr()
            .map_err(|e| LedgerError::Transport(format!("Failed to get peer address: {e}")))?;
        info!("Session opened by {peer_addr}");

        let reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream.try_clone()?);
        let envelopes = Deserializer::from_reader(reader).into_iter::<CommandEnvelope>();

        let mut end = SessionEnd::Disconnected;
        for envelope in envelopes {
            let envelope = match envelope {
                Ok(envelope) => envelope,
                Err(e) if e.is_io() || e.is_eof() => {
                    info!("Connection from {peer_addr} dropped: {e}");
                    break;
                }
                Err(e) => {
                    let err = LedgerError::Serialization(format!("Unreadable envelope: {e}"));
                    warn!("Closing session with {peer_addr}: {err}");
                    let _ = Self::send_response(&mut writer, &Response::failure(&err));
                    end = SessionEnd::ProtocolViolation(err);
                    break;
                }
            };

            info!(
                "Received option {} from {peer_addr} (identity {})",
                envelope.option, envelope.identity
            );

            match self.process_envelope(&envelope) {
                Step::Reply(response) => {
                    if let Err(e) = Self::send_response(&mut writer, &response) {
                        warn!("Failed to reply to {peer_addr}: {e}");
                        break;
                    }
                }
                Step::Close(response, reason) => {
                    if let Some(response) = response {
                        let _ = Self::send_response(&mut writer, &response);
                    }
                    end = reason;
                    break;
                }
            }
        }

        let _ = stream.shutdown(Shutdown::Both);
        Ok(end)
    }

    /// Authenticate, decode and dispatch one envelope. Authentication
    /// failures never touch the ledger.
    fn process_envelope(&mut self, envelope: &CommandEnvelope) -> Step {
        if let Err(e) = Authenticator::authenticate(envelope) {
            return Step::Reply(Response::failure(&e));
        }

        let command = match Command::try_from(envelope) {
            Ok(command) => command,
            Err(e) if e.is_fatal() => {
                warn!("Protocol violation: {e}");
                return Step::Close(
                    Some(Response::failure(&e)),
                    SessionEnd::ProtocolViolation(e),
                );
            }
            Err(e) => return Step::Reply(Response::failure(&e)),
        };

        match self.dispatcher.dispatch(&mut self.ledger, command) {
            Ok(Outcome::Reply(result)) => Step::Reply(Response::success(result)),
            Ok(Outcome::Terminate) => Step::Close(None, SessionEnd::ClientExit),
            Err(e) if e.is_fatal() => {
                error!("Command failed: {e}");
                Step::Close(Some(Response::failure(&e)), SessionEnd::ProtocolViolation(e))
            }
            Err(e) => {
                warn!("Command rejected: {e}");
                Step::Reply(Response::failure(&e))
            }
        }
    }

    fn send_response(writer: &mut BufWriter<TcpStream>, response: &Response) -> Result<()> {
        serde_json::to_writer(&mut *writer, response)
            .map_err(|e| LedgerError::Transport(format!("Failed to send response: {e}")))?;
        writer
            .flush()
            .map_err(|e| LedgerError::Transport(format!("Failed to flush response: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::KeyPair;
    use std::time::Duration;

    fn create_test_server() -> Server {
        let ledger = Ledger::new(1).unwrap();
        Server::new(ledger, CommandDispatcher::new(None, Duration::from_millis(10)))
    }

    fn result_of(step: Step) -> Response {
        match step {
            Step::Reply(response) => response,
            Step::Close(..) => panic!("session closed unexpectedly"),
        }
    }

    #[test]
    fn test_authenticated_append_reaches_ledger() {
        let mut server = create_test_server();
        let keys = KeyPair::generate(192, 20).unwrap();
        let envelope = CommandEnvelope::signed(
            &keys,
            &Command::Append {
                difficulty: 1,
                payload: "A pays B 10".to_string(),
            },
        )
        .unwrap();

        let response = result_of(server.process_envelope(&envelope));
        assert!(response.error.is_none());
        assert_eq!(server.ledger().get_chain_size(), 2);
    }

    #[test]
    fn test_forged_signature_is_answered_not_applied() {
        let mut server = create_test_server();
        let keys = KeyPair::generate(192, 20).unwrap();
        let mut envelope = CommandEnvelope::signed(
            &keys,
            &Command::Corrupt {
                block_index: 0,
                new_payload: "x".to_string(),
            },
        )
        .unwrap();
        envelope.new_payload = Some("y".to_string());

        let response = result_of(server.process_envelope(&envelope));
        assert_eq!(
            response.error,
            Some(LedgerError::SignatureMismatch.to_string())
        );
        assert_eq!(server.ledger().get_latest_block().get_payload(), "Genesis");
    }

    #[test]
    fn test_exit_closes_without_reply() {
        let mut server = create_test_server();
        let keys = KeyPair::generate(192, 20).unwrap();
        let envelope = CommandEnvelope::signed(&keys, &Command::Exit).unwrap();

        match server.process_envelope(&envelope) {
            Step::Close(None, SessionEnd::ClientExit) => {}
            _ => panic!("expected a silent close"),
        }
    }
}
