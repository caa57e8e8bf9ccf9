// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herald-core: message envelope model shared by producers, the daemon and monitors

pub mod macros;

pub mod builder;
pub mod clock;
pub mod envelope;
pub mod id;
pub mod name;
pub mod validate;

pub use builder::MessageBuilder;
pub use clock::{Clock, FakeClock, SystemClock};
pub use envelope::{
    Envelope, Fields, MessageKind, OperationCompleted, OperationFailed, OperationProgress,
    OperationStarted, Payload, QueryRequest, QueryResponse, QueryType, StateUpdate,
};
pub use id::{ClientId, MessageId};
pub use name::{
    topic_channel, validate_channel_name, COMMAND_CHANNEL, MAX_NAME_LEN, QUERY_CHANNEL,
    TOPIC_SUFFIX,
};
pub use validate::{ValidationError, Validator};
