// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Async socket client.

use std::marker::PhantomData;

use herald_core::validate_channel_name;
use herald_wire::{read_message, write_message, Format, MessageError};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::stream::{AsyncStream, BoxReader, BoxWriter};
use crate::{Address, SocketError, TransportConfig};

/// A client connection to a socket server channel.
///
/// Connecting is the only operation with a timeout; `receive` waits for the
/// next frame indefinitely.
pub struct SocketClient<M> {
    reader: BoxReader,
    writer: BoxWriter,
    address: Address,
    format: Format,
    max_message_size: usize,
    _message: PhantomData<fn() -> M>,
}

impl<M> SocketClient<M>
where
    M: Serialize + DeserializeOwned,
{
    /// Connect to an address, failing with [`SocketError::Timeout`] after
    /// `config.connection_timeout`.
    pub async fn connect(address: &Address, config: &TransportConfig) -> Result<Self, SocketError> {
        let stream = tokio::time::timeout(config.connection_timeout, AsyncStream::connect(address))
            .await
            .map_err(|_| SocketError::Timeout)?
            .map_err(|e| SocketError::Connection(format!("{address}: {e}")))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader,
            writer,
            address: address.clone(),
            format: config.format,
            max_message_size: config.max_message_size,
            _message: PhantomData,
        })
    }

    /// Connect to the Unix channel `{name}.sock` under `config.socket_dir`.
    pub async fn connect_channel(
        name: &str,
        config: &TransportConfig,
    ) -> Result<Self, SocketError> {
        validate_channel_name(name)?;
        Self::connect(&Address::Unix(config.socket_path(name)), config).await
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub async fn send(&mut self, message: &M) -> Result<(), SocketError> {
        let body = self.format.encode(message)?;
        if body.len() > self.max_message_size {
            return Err(MessageError::TooLarge { size: body.len(), limit: self.max_message_size }
                .into());
        }
        write_message(&mut self.writer, &body).await.map_err(SocketError::from_client_io)
    }

    /// Wait for the next message and decode it.
    pub async fn receive(&mut self) -> Result<M, SocketError> {
        let body = self.receive_raw().await?;
        Ok(self.format.decode(&body)?)
    }

    /// Wait for the next frame body without decoding it.
    pub async fn receive_raw(&mut self) -> Result<Vec<u8>, SocketError> {
        read_message(&mut self.reader, self.max_message_size)
            .await
            .map_err(SocketError::from_client_io)
    }
}
