use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tokio::sync::watch;

use crate::error::{AppError, Result};

/// Cooperative cancellation handle shared between a search and its fetches.
///
/// Clones observe the same flag. A [`child`](CancelSignal::child) signal fires when
/// either it or any of its ancestors is cancelled, while cancelling the child leaves the
/// parent untouched.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    // links[0] belongs to this signal, the rest are ancestors nearest first.
    links: Vec<Arc<watch::Sender<bool>>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            links: vec![Arc::new(tx)],
        }
    }

    pub fn child(&self) -> Self {
        let (tx, _) = watch::channel(false);
        let mut links = Vec::with_capacity(self.links.len() + 1);
        links.push(Arc::new(tx));
        links.extend(self.links.iter().cloned());
        Self { links }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.links[0].send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.links.iter().any(|link| *link.borrow())
    }

    /// Safe-point check for fetch loops.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AppError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves once this signal or one of its ancestors has been cancelled.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }

        let waits: Vec<BoxFuture<'static, ()>> = self
            .links
            .iter()
            .map(|link| {
                let mut rx = link.subscribe();
                async move {
                    let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
                    if closed {
                        future::pending::<()>().await;
                    }
                }
                .boxed()
            })
            .collect();

        future::select_all(waits).await;
    }

    /// Whether both handles control the same underlying flag.
    pub fn same_as(&self, other: &CancelSignal) -> bool {
        Arc::ptr_eq(&self.links[0], &other.links[0])
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn clones_share_the_flag() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_cancelled());

        signal.cancel();

        assert!(clone.is_cancelled());
        assert!(clone.ensure_active().unwrap_err().is_cancelled());
        assert!(signal.same_as(&clone));
    }

    #[test]
    fn child_follows_parent_but_not_the_reverse() {
        let parent = CancelSignal::new();
        let child = parent.child();
        let grandchild = child.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
        assert!(!parent.is_cancelled());

        let other_child = parent.child();
        parent.cancel();
        assert!(other_child.is_cancelled());
        assert!(!other_child.same_as(&parent));
    }

    #[tokio::test]
    async fn cancelled_wakes_waiters() {
        let parent = CancelSignal::new();
        let child = parent.child();

        let waiter = tokio::spawn(async move { child.cancelled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        parent.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should observe cancellation")
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_when_already_fired() {
        let signal = CancelSignal::new();
        signal.cancel();
        tokio::time::timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .expect("already cancelled");
    }
}
