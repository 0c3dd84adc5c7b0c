//! Per-call limits applied to backend requests
//!
//! Every backend call made by the clients goes through [`RequestOptions::run`],
//! which bounds it by an optional deadline and an optional shutdown signal.

use crate::domain::{Result, StorageError};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Deadline and cancellation settings for backend calls
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Maximum duration of a single backend call
    pub timeout: Option<Duration>,

    /// Shutdown signal; a `true` value cancels in-flight calls
    pub shutdown: Option<watch::Receiver<bool>>,
}

impl RequestOptions {
    /// Options with neither a deadline nor a shutdown signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the shutdown signal
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Returns `true` if the shutdown signal has been raised
    pub fn is_cancelled(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Runs a backend call under these options
    ///
    /// # Errors
    ///
    /// Returns `Timeout` when the deadline expires first and `Cancelled` when
    /// the shutdown signal is raised first, or was raised before the call.
    pub async fn run<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(StorageError::Cancelled.into());
        }

        let bounded = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result,
                    Err(_) => Err(StorageError::Timeout(limit).into()),
                },
                None => call.await,
            }
        };

        match self.shutdown.clone() {
            Some(mut shutdown) => {
                tokio::select! {
                    result = bounded => result,
                    _ = wait_for_shutdown(&mut shutdown) => {
                        tracing::warn!("Backend call cancelled by shutdown signal");
                        Err(StorageError::Cancelled.into())
                    }
                }
            }
            None => bounded.await,
        }
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender can never raise the signal
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StowageError;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let options = RequestOptions::new().with_timeout(Duration::from_secs(5));
        let value = options.run(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let options = RequestOptions::new().with_timeout(Duration::from_millis(10));
        let result: Result<()> = options
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(StowageError::Storage(StorageError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn test_raised_signal_cancels_before_call() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let options = RequestOptions::new().with_shutdown(rx);

        let result: Result<()> = options.run(async { Ok(()) }).await;
        assert!(matches!(
            result,
            Err(StowageError::Storage(StorageError::Cancelled))
        ));
    }

    #[tokio::test]
    async fn test_signal_cancels_in_flight_call() {
        let (tx, rx) = watch::channel(false);
        let options = RequestOptions::new().with_shutdown(rx);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(true);
        });

        let result: Result<()> = options
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(
            result,
            Err(StowageError::Storage(StorageError::Cancelled))
        ));
    }

    #[tokio::test]
    async fn test_dropped_sender_never_cancels() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let options = RequestOptions::new().with_shutdown(rx);

        let value = options.run(async { Ok("done") }).await.unwrap();
        assert_eq!(value, "done");
    }
}
