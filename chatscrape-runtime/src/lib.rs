//! Process runtime for the scrape service: a multi-threaded Tokio runtime
//! paired with one cancellation token that every long-lived task watches.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Clone)]
pub struct ServiceHandle {
    inner: Handle,
    cancel: CancellationToken,
}

pub struct ServiceRuntime {
    runtime: Runtime,
    cancel: CancellationToken,
}

impl ServiceRuntime {
    /// Build the runtime. `worker_threads` of `None` uses one per core.
    ///
    /// ```
    /// use chatscrape_runtime::ServiceRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = ServiceRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);

        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }

        let runtime = builder.build()?;
        Ok(Self {
            runtime,
            cancel: CancellationToken::new(),
        })
    }

    /// Cloneable handle for spawning tasks and observing shutdown.
    ///
    /// ```
    /// use chatscrape_runtime::ServiceRuntime;
    ///
    /// let runtime = ServiceRuntime::build("handle-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// assert!(!handle.cancellation().is_cancelled());
    /// ```
    pub fn handle(&self) -> ServiceHandle {
        ServiceHandle {
            inner: self.runtime.handle().clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Run `main` to completion with Ctrl-C wired to the cancellation token,
    /// then shut down, allowing `grace` for in-flight blocking work.
    pub fn run<F, Fut, T>(self, grace: Duration, main: F) -> T
    where
        F: FnOnce(ServiceHandle) -> Fut,
        Fut: Future<Output = T>,
    {
        let handle = self.handle();
        handle.cancel_on_ctrl_c();
        let output = self.runtime.block_on(main(handle));
        self.shutdown(grace);
        output
    }

    /// Cancel outstanding work and shut the runtime down.
    ///
    /// ```
    /// use chatscrape_runtime::ServiceRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = ServiceRuntime::build("shutdown-example", Some(1)).unwrap();
    /// runtime.shutdown(Duration::from_millis(5));
    /// ```
    pub fn shutdown(self, grace: Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(grace);
    }
}

impl ServiceHandle {
    /// Spawn a future onto the shared runtime.
    ///
    /// ```
    /// use chatscrape_runtime::ServiceRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = ServiceRuntime::build("handle-doctest", Some(1)).unwrap();
    /// let task = runtime.handle().spawn(async { 21 * 2 });
    /// let result = runtime.block_on(async move { task.await.unwrap() });
    /// assert_eq!(result, 42);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(fut)
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolves once shutdown has been requested.
    pub async fn shutdown_requested(&self) {
        self.cancel.cancelled().await;
    }

    /// Cancel the shared token on the first Ctrl-C.
    pub fn cancel_on_ctrl_c(&self) {
        let cancel = self.cancel.clone();
        self.inner.spawn(async move {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => info!(target: "runtime", "ctrl-c received, shutting down"),
                        Err(err) => warn!(target: "runtime", error = %err, "ctrl-c listener failed, shutting down"),
                    }
                    cancel.cancel();
                }
                _ = cancel.cancelled() => {}
            }
        });
    }
}
