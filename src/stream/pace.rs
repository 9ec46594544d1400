//! Display-rate pacing for frame streams.

use futures::{ready, Stream};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{interval, Interval};

/// Extension trait to pace any stream down to a display rate.
pub trait PaceExt: Stream {
    /// Emit at most one item per `duration`, with latest-wins semantics:
    /// items arriving faster than the pace are superseded, never queued.
    ///
    /// A UI redrawing at 30 fps from a 20 fps ingest feed gets exactly the
    /// freshest frame at each tick and no backlog after a stall.
    fn pace(self, duration: Duration) -> Pace<Self>
    where
        Self: Sized,
    {
        Pace::new(self, duration)
    }
}

impl<T: Stream> PaceExt for T {}

pin_project! {
    /// Stream combinator produced by [`PaceExt::pace`].
    pub struct Pace<S: Stream> {
        #[pin]
        stream: S,
        interval: Interval,
        pending: Option<S::Item>,
        done: bool,
    }
}

impl<S: Stream> Pace<S> {
    pub fn new(stream: S, duration: Duration) -> Self {
        let mut interval = interval(duration);
        // Delay, don't burst, after a stall.
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        Self { stream, interval, pending: None, done: false }
    }
}

impl<S: Stream> Stream for Pace<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        // Drain the source first so the item held is always the newest one.
        while !*this.done {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => *this.pending = Some(item),
                Poll::Ready(None) => *this.done = true,
                Poll::Pending => break,
            }
        }

        if this.pending.is_some() {
            ready!(this.interval.poll_tick(cx));
            return Poll::Ready(this.pending.take());
        }

        if *this.done {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}
