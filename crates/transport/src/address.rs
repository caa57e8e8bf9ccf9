// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where a channel lives: requested endpoints and concrete bound addresses.

use std::fmt;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::TransportConfig;
use crate::stream::StdListener;
use crate::SocketError;

/// TCP port selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSpec {
    Fixed(u16),
    /// Inclusive range scanned in order until a bind succeeds.
    Range(u16, u16),
}

/// A requested binding, before any socket exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp { host: String, port: PortSpec },
}

/// A bound (or connectable) address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    Unix(PathBuf),
    Tcp(SocketAddr),
}

impl Endpoint {
    /// Endpoint for a named channel under the given config.
    pub fn for_channel(name: &str, config: &TransportConfig) -> Self {
        match &config.tcp {
            Some(tcp) => Endpoint::Tcp {
                host: tcp.host.clone(),
                port: match tcp.port {
                    Some(p) => PortSpec::Fixed(p),
                    None => PortSpec::Range(tcp.port_range.0, tcp.port_range.1),
                },
            },
            None => Endpoint::Unix(config.socket_path(name)),
        }
    }

    pub(crate) fn bind(
        &self,
        config: &TransportConfig,
    ) -> Result<(StdListener, Address), SocketError> {
        match self {
            Endpoint::Unix(path) => bind_unix(path, config.socket_permissions),
            Endpoint::Tcp { host, port: PortSpec::Fixed(port) } => {
                let listener =
                    std::net::TcpListener::bind((host.as_str(), *port)).map_err(|source| {
                        SocketError::Bind { address: format!("{host}:{port}"), source }
                    })?;
                let addr = listener.local_addr()?;
                info!(%addr, "bound tcp channel");
                Ok((StdListener::Tcp(listener), Address::Tcp(addr)))
            }
            Endpoint::Tcp { host, port: PortSpec::Range(start, end) } => {
                for port in *start..=*end {
                    match std::net::TcpListener::bind((host.as_str(), port)) {
                        Ok(listener) => {
                            let addr = listener.local_addr()?;
                            info!(%addr, "bound tcp channel");
                            return Ok((StdListener::Tcp(listener), Address::Tcp(addr)));
                        }
                        Err(e) => debug!(port, error = %e, "port unavailable"),
                    }
                }
                Err(SocketError::NoPortAvailable { start: *start, end: *end })
            }
        }
    }
}

fn bind_unix(path: &Path, mode: u32) -> Result<(StdListener, Address), SocketError> {
    let bind_err = |source| SocketError::Bind { address: path.display().to_string(), source };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(bind_err)?;
    }
    // Remove stale socket
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale socket"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(bind_err(e)),
    }

    let listener = std::os::unix::net::UnixListener::bind(path).map_err(bind_err)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(bind_err)?;
    info!(path = %path.display(), "bound unix channel");
    Ok((StdListener::Unix(listener), Address::Unix(path.to_path_buf())))
}

impl Address {
    /// Remove the socket file, if this is a Unix address. Missing files are fine.
    pub(crate) fn remove_socket_file(&self) {
        if let Address::Unix(path) = self {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed socket"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => debug!(path = %path.display(), error = %e, "failed to remove socket"),
            }
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Address::Unix(p) => Some(p),
            Address::Tcp(_) => None,
        }
    }
}

impl From<PathBuf> for Address {
    fn from(path: PathBuf) -> Self {
        Address::Unix(path)
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Address::Tcp(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Unix(p) => write!(f, "{}", p.display()),
            Address::Tcp(a) => write!(f, "{a}"),
        }
    }
}

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;
