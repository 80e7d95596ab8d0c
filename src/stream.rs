//! Consumer-facing handle for streaming chat responses.
//!
//! Every streaming call forks exactly one background producer task that owns
//! the transport body and the per-stream decoder state. Events cross to the
//! consumer through a bounded single-producer/single-consumer channel of
//! capacity one, so backpressure is intrinsic: the producer sits in its send
//! until the consumer pulls. [`StreamReader`] is the only component allowed to
//! signal cancellation upstream, which it does by closing the channel (every
//! later send fails) and aborting the producer (releasing a producer parked on
//! a transport read).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Error;
use crate::types::StreamEvent;

/// Sending half handed to stream producers.
///
/// A failed send means the consumer closed the reader; producers treat it as
/// cancellation and return without emitting anything further.
pub(crate) type EventSender = mpsc::Sender<Result<StreamEvent, Error>>;

/// Pull-based handle over one streaming response.
///
/// `recv` yields [`StreamEvent`]s until the stream ends, then keeps returning
/// the sticky [`Error::StreamClosed`]. A mid-stream failure arrives once as an
/// `Err`; the stream is closed afterwards. Dropping the reader cancels the
/// stream.
///
/// # Examples
///
/// ```no_run
/// # async fn demo(mut reader: hashi::stream::StreamReader) -> Result<(), hashi::error::Error> {
/// use hashi::types::StreamEvent;
///
/// loop {
///     match reader.recv().await {
///         Ok(StreamEvent::Delta(delta)) => {
///             if let Some(text) = delta.content {
///                 print!("{text}");
///             }
///         }
///         Ok(StreamEvent::Finish(reason)) => {
///             println!("\n[{reason}]");
///         }
///         Err(hashi::error::Error::StreamClosed) => break,
///         Err(err) => return Err(err),
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StreamReader {
    events: mpsc::Receiver<Result<StreamEvent, Error>>,
    producer: Option<JoinHandle<()>>,
    closed: bool,
}

impl StreamReader {
    /// Spawns a producer task and returns the reader wired to it.
    ///
    /// The producer future receives the sending half and runs until it has
    /// nothing more to emit or a send fails (consumer gone).
    pub(crate) fn spawn<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(EventSender) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(producer(tx));
        Self {
            events: rx,
            producer: Some(handle),
            closed: false,
        }
    }

    /// Pulls the next event.
    ///
    /// # Errors
    ///
    /// Returns the terminal stream error once if the producer reported one,
    /// and the sticky [`Error::StreamClosed`] on every pull after the stream
    /// ended or the reader was closed.
    pub async fn recv(&mut self) -> Result<StreamEvent, Error> {
        if self.closed {
            return Err(Error::StreamClosed);
        }

        match self.events.recv().await {
            Some(Ok(event)) => Ok(event),
            Some(Err(err)) => Err(err),
            None => {
                self.closed = true;
                Err(Error::StreamClosed)
            }
        }
    }

    /// Releases the stream.
    ///
    /// Idempotent and non-blocking: it never waits for the producer. Events
    /// still in flight are dropped; every subsequent [`recv`](Self::recv)
    /// returns [`Error::StreamClosed`].
    pub fn close(&mut self) {
        self.closed = true;
        self.events.close();
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

impl Drop for StreamReader {
    fn drop(&mut self) {
        self.close();
    }
}

impl Stream for StreamReader {
    type Item = Result<StreamEvent, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(None);
        }
        match this.events.poll_recv(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Some(item)),
            Poll::Ready(None) => {
                this.closed = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
