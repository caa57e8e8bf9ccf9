// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix/TCP stream and listener wrappers for both backends.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::Address;

pub(crate) enum StdListener {
    Unix(std::os::unix::net::UnixListener),
    Tcp(std::net::TcpListener),
}

impl StdListener {
    /// Accept one connection. The peer address is only known for TCP.
    pub fn accept(&self) -> io::Result<(StdStream, Option<SocketAddr>)> {
        match self {
            StdListener::Unix(l) => l.accept().map(|(s, _)| (StdStream::Unix(s), None)),
            StdListener::Tcp(l) => l.accept().map(|(s, a)| (StdStream::Tcp(s), Some(a))),
        }
    }

    /// Hand the bound socket to tokio. Must be called inside a runtime.
    pub fn into_async(self) -> io::Result<AsyncListener> {
        match self {
            StdListener::Unix(l) => {
                l.set_nonblocking(true)?;
                Ok(AsyncListener::Unix(tokio::net::UnixListener::from_std(l)?))
            }
            StdListener::Tcp(l) => {
                l.set_nonblocking(true)?;
                Ok(AsyncListener::Tcp(tokio::net::TcpListener::from_std(l)?))
            }
        }
    }
}

/// Blocking stream, used by the threaded server and the blocking client.
#[derive(Debug)]
pub(crate) enum StdStream {
    Unix(std::os::unix::net::UnixStream),
    Tcp(std::net::TcpStream),
}

impl StdStream {
    pub fn connect(address: &Address, timeout: Duration) -> io::Result<Self> {
        match address {
            // Unix connects either succeed or fail immediately
            Address::Unix(path) => {
                std::os::unix::net::UnixStream::connect(path).map(StdStream::Unix)
            }
            Address::Tcp(addr) => {
                std::net::TcpStream::connect_timeout(addr, timeout).map(StdStream::Tcp)
            }
        }
    }

    pub fn try_clone(&self) -> io::Result<Self> {
        match self {
            StdStream::Unix(s) => s.try_clone().map(StdStream::Unix),
            StdStream::Tcp(s) => s.try_clone().map(StdStream::Tcp),
        }
    }

    pub fn shutdown(&self) -> io::Result<()> {
        match self {
            StdStream::Unix(s) => s.shutdown(Shutdown::Both),
            StdStream::Tcp(s) => s.shutdown(Shutdown::Both),
        }
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            StdStream::Unix(s) => s.set_read_timeout(timeout),
            StdStream::Tcp(s) => s.set_read_timeout(timeout),
        }
    }

    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            StdStream::Unix(s) => s.set_write_timeout(timeout),
            StdStream::Tcp(s) => s.set_write_timeout(timeout),
        }
    }
}

impl Read for StdStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            StdStream::Unix(s) => s.read(buf),
            StdStream::Tcp(s) => s.read(buf),
        }
    }
}

impl Write for StdStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            StdStream::Unix(s) => s.write(buf),
            StdStream::Tcp(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            StdStream::Unix(s) => s.flush(),
            StdStream::Tcp(s) => s.flush(),
        }
    }
}

pub(crate) type BoxReader = Box<dyn AsyncRead + Unpin + Send>;
pub(crate) type BoxWriter = Box<dyn AsyncWrite + Unpin + Send>;

pub(crate) enum AsyncListener {
    Unix(tokio::net::UnixListener),
    Tcp(tokio::net::TcpListener),
}

impl AsyncListener {
    pub async fn accept(&self) -> io::Result<(AsyncStream, Option<SocketAddr>)> {
        match self {
            AsyncListener::Unix(l) => l.accept().await.map(|(s, _)| (AsyncStream::Unix(s), None)),
            AsyncListener::Tcp(l) => l.accept().await.map(|(s, a)| (AsyncStream::Tcp(s), Some(a))),
        }
    }
}

pub(crate) enum AsyncStream {
    Unix(tokio::net::UnixStream),
    Tcp(tokio::net::TcpStream),
}

impl AsyncStream {
    pub async fn connect(address: &Address) -> io::Result<Self> {
        match address {
            Address::Unix(path) => {
                tokio::net::UnixStream::connect(path).await.map(AsyncStream::Unix)
            }
            Address::Tcp(addr) => tokio::net::TcpStream::connect(addr).await.map(AsyncStream::Tcp),
        }
    }

    pub fn into_split(self) -> (BoxReader, BoxWriter) {
        match self {
            AsyncStream::Unix(s) => {
                let (r, w) = s.into_split();
                (Box::new(r), Box::new(w))
            }
            AsyncStream::Tcp(s) => {
                let (r, w) = s.into_split();
                (Box::new(r), Box::new(w))
            }
        }
    }
}
