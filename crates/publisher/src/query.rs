// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response client for the daemon's query channel.

use std::time::Duration;

use herald_core::{
    Fields, MessageBuilder, Payload, QueryResponse, QueryType, Validator, QUERY_CHANNEL,
};
use herald_transport::{SocketClient, TransportConfig};
use serde_json::Value;

use crate::ClientError;

/// One connection to the query channel. Requests are answered in order.
pub struct QueryClient {
    client: SocketClient<Value>,
    builder: MessageBuilder,
    answer_timeout: Duration,
}

impl QueryClient {
    /// `event_type` identifies the asking monitor in the request envelope.
    pub async fn connect(
        event_type: &str,
        transport: &TransportConfig,
    ) -> Result<Self, ClientError> {
        let config = crate::daemon_channel(transport);
        let client = SocketClient::connect_channel(QUERY_CHANNEL, &config).await?;
        Ok(Self {
            client,
            builder: MessageBuilder::new(event_type),
            answer_timeout: config.connection_timeout,
        })
    }

    /// How long [`QueryClient::ask`] waits for the daemon's reply.
    pub fn answer_timeout(mut self, timeout: Duration) -> Self {
        self.answer_timeout = timeout;
        self
    }

    /// Send a query and wait for its response. A response carrying `error`
    /// is still returned as `Ok`; the caller decides what a failed lookup means.
    pub async fn ask(
        &mut self,
        query_type: QueryType,
        parameters: Fields,
    ) -> Result<QueryResponse, ClientError> {
        let request = self.builder.query_request(query_type, parameters)?;
        let body = request
            .to_value()
            .map_err(|e| ClientError::UnexpectedReply(format!("unencodable request: {e}")))?;
        self.client.send(&body).await?;

        let reply = tokio::time::timeout(self.answer_timeout, self.client.receive())
            .await
            .map_err(|_| ClientError::NoAnswer(self.answer_timeout.as_millis()))??;
        let envelope = Validator::validate(reply)?;
        let expected = request.message_id().as_str();
        match envelope.into_payload() {
            Payload::QueryResponse(response) if response.query_id == expected => Ok(response),
            Payload::QueryResponse(response) => Err(ClientError::UnexpectedReply(format!(
                "answer to {} while waiting for {}",
                response.query_id, expected
            ))),
            other => Err(ClientError::UnexpectedReply(other.kind().to_string())),
        }
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
