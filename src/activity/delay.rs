//! Poll-driven delays and the delayed-activation wrapper.

use super::{Activity, ActivityError, ActivityFuture};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Future that resolves once a deadline has passed.
///
/// There is no timer behind it: the deadline is compared against the clock on
/// every poll, which matches the machine polling once per tick. It resolves
/// with [`ActivityError::Cancelled`] as soon as its token is cancelled.
#[derive(Debug)]
pub struct Delay {
    deadline: Instant,
    token: CancellationToken,
}

impl Delay {
    pub fn new(duration: Duration, token: CancellationToken) -> Self {
        Self {
            deadline: Instant::now() + duration,
            token,
        }
    }
}

impl Future for Delay {
    type Output = Result<(), ActivityError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.token.is_cancelled() {
            return Poll::Ready(Err(ActivityError::Cancelled));
        }
        if Instant::now() >= self.deadline {
            return Poll::Ready(Ok(()));
        }
        // Nothing will wake us; ask to be polled again.
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Wraps an activity so each operation waits before delegating.
///
/// The wrapped activity receives the same token, so cancelling during the
/// delay or during the inner operation both stop the work.
pub struct Delayed<A> {
    inner: Arc<A>,
    name: String,
    activation_delay: Duration,
    deactivation_delay: Duration,
}

impl<A: Activity + 'static> Delayed<A> {
    pub fn new(inner: A) -> Self {
        let name = format!("delayed({})", inner.name());
        Self {
            inner: Arc::new(inner),
            name,
            activation_delay: Duration::ZERO,
            deactivation_delay: Duration::ZERO,
        }
    }

    /// Delay applied before every activation.
    pub fn activation_delay(mut self, delay: Duration) -> Self {
        self.activation_delay = delay;
        self
    }

    /// Delay applied before every deactivation.
    pub fn deactivation_delay(mut self, delay: Duration) -> Self {
        self.deactivation_delay = delay;
        self
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: Activity + 'static> Activity for Delayed<A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn activate(&self, token: CancellationToken) -> ActivityFuture {
        let inner = Arc::clone(&self.inner);
        let delay = self.activation_delay;
        Box::pin(async move {
            Delay::new(delay, token.clone()).await?;
            inner.activate(token).await
        })
    }

    fn deactivate(&self, token: CancellationToken) -> ActivityFuture {
        let inner = Arc::clone(&self.inner);
        let delay = self.deactivation_delay;
        Box::pin(async move {
            Delay::new(delay, token.clone()).await?;
            inner.deactivate(token).await
        })
    }
}
