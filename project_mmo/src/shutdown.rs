use persistence::{LogoutQueue, Shutdown, WorkerHandle};
use session::SessionBound;
use tokio::task::JoinHandle;

/// Resolve on SIGINT or SIGTERM (Ctrl+C off Unix).
pub async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        tracing::info!(signal = name, "Received {}", name);
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!(signal = "ctrl-c", "Received Ctrl+C");
    }
    Ok(())
}

/// Everything that has to wind down when the server stops, in order:
/// trip the shared flag, let background tasks return, then join the
/// logout worker once its current save is done.
pub struct ShutdownSequence<T> {
    shutdown: Shutdown,
    worker: WorkerHandle,
    tasks: Vec<JoinHandle<()>>,
    queue: LogoutQueue<T>,
}

impl<T: SessionBound + Send + 'static> ShutdownSequence<T> {
    pub fn new(shutdown: Shutdown, worker: WorkerHandle, queue: LogoutQueue<T>) -> Self {
        Self {
            shutdown,
            worker,
            tasks: Vec::new(),
            queue,
        }
    }

    /// Wait for `task` before the worker is joined.
    pub fn track(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    /// Run the sequence. Returns how many logouts were still unsaved.
    pub async fn run(self) -> usize {
        let Self {
            shutdown,
            worker,
            tasks,
            queue,
        } = self;

        shutdown.trigger();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }

        if let Err(e) = tokio::task::spawn_blocking(move || worker.join()).await {
            tracing::error!(error = %e, "joining the logout worker failed");
        }

        let pending = queue.size();
        if pending > 0 {
            tracing::warn!(pending, "{} logouts left unsaved at shutdown", pending);
        } else {
            tracing::info!("logout queue empty at shutdown");
        }
        pending
    }
}
