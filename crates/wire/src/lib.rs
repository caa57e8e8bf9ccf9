// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! herald-wire: length-prefixed frames and their body encodings.
//!
//! Every frame is a 4 byte big-endian length followed by the body. Daemon
//! channels carry JSON bodies; plain transport channels default to MessagePack.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;
mod format;
mod wire;

pub use error::MessageError;
pub use format::Format;
pub use wire::{blocking, frame, read_message, write_message, DEFAULT_MAX_MESSAGE_SIZE, PREFIX_LEN};
