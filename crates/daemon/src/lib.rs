// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Herald daemon library
//!
//! Producers push envelopes into the command channel; the daemon validates
//! them and the [`Broker`] fans each one out on a per-topic channel it creates
//! on first use. Monitors ask questions on the query channel.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod broker;
pub mod config;
pub mod env;
pub mod index;
pub mod lifecycle;
pub mod query;

pub use broker::{Broker, BrokerError};
pub use config::Config;
pub use index::{EventIndex, OperationRecord, OperationStatus, StateRecord, TopicStats};
pub use lifecycle::{Daemon, DaemonError, DaemonHandle};
pub use query::QueryError;
