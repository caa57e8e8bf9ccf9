// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::marker::PhantomData;
use std::time::Duration;

use herald_core::validate_channel_name;
use herald_wire::blocking::{read_message, write_message};
use herald_wire::{Format, MessageError};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::stream::StdStream;
use crate::{Address, SocketError, TransportConfig};

/// Blocking counterpart of [`crate::SocketClient`].
pub struct SocketClient<M> {
    stream: StdStream,
    address: Address,
    format: Format,
    max_message_size: usize,
    _message: PhantomData<fn() -> M>,
}

impl<M> SocketClient<M>
where
    M: Serialize + DeserializeOwned,
{
    pub fn connect(address: &Address, config: &TransportConfig) -> Result<Self, SocketError> {
        let stream = StdStream::connect(address, config.connection_timeout).map_err(|e| {
            match e.kind() {
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                    SocketError::Timeout
                }
                _ => SocketError::Connection(format!("{address}: {e}")),
            }
        })?;
        Ok(Self {
            stream,
            address: address.clone(),
            format: config.format,
            max_message_size: config.max_message_size,
            _message: PhantomData,
        })
    }

    pub fn connect_channel(name: &str, config: &TransportConfig) -> Result<Self, SocketError> {
        validate_channel_name(name)?;
        Self::connect(&Address::Unix(config.socket_path(name)), config)
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Bound how long `receive` waits. `None` waits forever.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), SocketError> {
        Ok(self.stream.set_read_timeout(timeout)?)
    }

    pub fn send(&mut self, message: &M) -> Result<(), SocketError> {
        let body = self.format.encode(message)?;
        if body.len() > self.max_message_size {
            return Err(MessageError::TooLarge { size: body.len(), limit: self.max_message_size }
                .into());
        }
        write_message(&mut self.stream, &body).map_err(SocketError::from_client_io)
    }

    pub fn receive(&mut self) -> Result<M, SocketError> {
        let body = self.receive_raw()?;
        Ok(self.format.decode(&body)?)
    }

    pub fn receive_raw(&mut self) -> Result<Vec<u8>, SocketError> {
        read_message(&mut self.stream, self.max_message_size).map_err(SocketError::from_client_io)
    }

    /// Close both directions of the connection.
    pub fn close(self) {
        let _ = self.stream.shutdown();
    }
}
