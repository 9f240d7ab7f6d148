//! Database connection cleanup utilities.
//!
//! Helpers for properly closing database connections during graceful
//! shutdown.

use tracing::{error, info};

/// Cleanup handler for MongoDB connections.
///
/// Shuts the client down explicitly so in-flight operations complete
/// before the process exits.
///
/// # Example
/// ```ignore
/// use axum_helpers::server::close_mongo;
///
/// close_mongo(client, "main").await;
/// ```
pub async fn close_mongo(client: mongodb::Client, name: &str) {
    client.shutdown().await;
    info!("MongoDB client '{}' shut down successfully", name);
}

/// Generic cleanup coordinator for multiple database connections.
///
/// Runs all cleanup tasks concurrently and waits for all to complete.
///
/// # Example
/// ```ignore
/// use axum_helpers::server::CleanupCoordinator;
///
/// let mut cleanup = CleanupCoordinator::new();
/// cleanup.add_task("mongodb", async { close_mongo(client, "main").await });
/// cleanup.run().await;
/// ```
pub struct CleanupCoordinator {
    tasks: Vec<(&'static str, tokio::task::JoinHandle<()>)>,
}

impl CleanupCoordinator {
    /// Create a new cleanup coordinator.
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Add a cleanup task with a name.
    ///
    /// The task will be spawned immediately and tracked for completion.
    pub fn add_task<F>(&mut self, name: &'static str, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        self.tasks.push((name, handle));
    }

    /// Run all cleanup tasks and wait for completion.
    ///
    /// Tasks run concurrently. If any task panics or fails, it's logged
    /// but doesn't stop other tasks.
    pub async fn run(self) {
        info!("Running {} cleanup tasks", self.tasks.len());

        for (name, handle) in self.tasks {
            match handle.await {
                Ok(_) => {
                    info!("Cleanup task '{}' completed successfully", name);
                }
                Err(e) => {
                    error!("Cleanup task '{}' failed: {}", name, e);
                }
            }
        }

        info!("All cleanup tasks completed");
    }
}

impl Default for CleanupCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn runs_all_tasks_to_completion() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut cleanup = CleanupCoordinator::new();

        for name in ["first", "second", "third"] {
            let counter = counter.clone();
            cleanup.add_task(name, async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        cleanup.run().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
