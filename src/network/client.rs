use crate::error::{LedgerError, Result};
use crate::network::protocol::{Command, CommandEnvelope, Response, OPTION_EXIT};
use crate::wallet::KeyPair;
use log::info;
use serde_json::de::IoRead;
use serde_json::{Deserializer, StreamDeserializer};
use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

const TCP_CONNECT_TIMEOUT: u64 = 5000;

/// Client side of a session: signs each command with its key pair and
/// waits for the server's reply before sending the next one.
pub struct LedgerClient {
    keys: KeyPair,
    stream: TcpStream,
    responses: StreamDeserializer<'static, IoRead<BufReader<TcpStream>>, Response>,
}

impl LedgerClient {
    pub fn connect(addr: &str, keys: KeyPair) -> Result<LedgerClient> {
        let socket_addr = addr
            .parse::<SocketAddr>()
            .map_err(|e| LedgerError::Transport(format!("Invalid address {addr}: {e}")))?;

        let stream =
            TcpStream::connect_timeout(&socket_addr, Duration::from_millis(TCP_CONNECT_TIMEOUT))
                .map_err(|e| LedgerError::Transport(format!("Failed to connect to {addr}: {e}")))?;
        let reader = BufReader::new(stream.try_clone()?);
        let responses = Deserializer::from_reader(reader).into_iter::<Response>();

        info!("Connected to {addr} as identity {}", keys.identity());
        Ok(LedgerClient {
            keys,
            stream,
            responses,
        })
    }

    /// Sign and send `command`, returning the server's result text
    pub fn send(&mut self, command: &Command) -> Result<String> {
        let envelope = CommandEnvelope::signed(&self.keys, command)?;
        match self.send_envelope(&envelope)? {
            Some(response) => response.into_result(),
            None => Ok(String::new()),
        }
    }

    /// Send a prepared envelope as-is. Option 6 gets no reply.
    pub fn send_envelope(&mut self, envelope: &CommandEnvelope) -> Result<Option<Response>> {
        serde_json::to_writer(&mut self.stream, envelope)
            .map_err(|e| LedgerError::Transport(format!("Failed to send command: {e}")))?;
        self.stream
            .flush()
            .map_err(|e| LedgerError::Transport(format!("Failed to send command: {e}")))?;

        if envelope.option == OPTION_EXIT {
            return Ok(None);
        }

        match self.responses.next() {
            Some(Ok(response)) => Ok(Some(response)),
            Some(Err(e)) => Err(LedgerError::Transport(format!("Failed to read response: {e}"))),
            None => Err(LedgerError::Transport(
                "Connection closed before a response arrived".to_string(),
            )),
        }
    }

    /// End the session politely
    pub fn close(mut self) -> Result<()> {
        self.send(&Command::Exit)?;
        Ok(())
    }
}
