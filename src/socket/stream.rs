//! Socket wrapper that reports I/O milestones to a [`Trace`].

use crate::base::timing::{TimingEvent, Trace};
use crate::socket::client::SocketType;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Stamps `wrote_headers` after the first successful write (the request
/// head always leads the first write) and `first_byte` when the first
/// response bytes arrive.
#[derive(Debug)]
pub struct TracedSocket {
    inner: SocketType,
    trace: Trace,
    wrote: bool,
    read: bool,
}

impl TracedSocket {
    pub fn new(inner: SocketType, trace: Trace) -> Self {
        Self {
            inner,
            trace,
            wrote: false,
            read: false,
        }
    }

    fn on_write(&mut self, n: usize) {
        if !self.wrote && n > 0 {
            self.wrote = true;
            self.trace.stamp(TimingEvent::WroteHeaders);
        }
    }
}

impl AsyncRead for TracedSocket {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if !this.read && matches!(poll, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            this.read = true;
            this.trace.stamp(TimingEvent::FirstByte);
        }
        poll
    }
}

impl AsyncWrite for TracedSocket {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = poll {
            this.on_write(n);
        }
        poll
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write_vectored(cx, bufs);
        if let Poll::Ready(Ok(n)) = poll {
            this.on_write(n);
        }
        poll
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
