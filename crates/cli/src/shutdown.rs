use std::{
    fmt,
    sync::{Arc, OnceLock},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Operating system signal that interrupts a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopSignal::Interrupt => f.write_str("SIGINT"),
            StopSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Turns the first SIGINT/SIGTERM into a cancelled run token.
///
/// Cancelling only stops input reading: batches already queued still finish
/// and the written prefix stays in input order.
#[derive(Clone)]
pub struct InterruptHandle {
    cancel_token: CancellationToken,
    received: Arc<OnceLock<StopSignal>>,
}

impl InterruptHandle {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            received: Arc::new(OnceLock::new()),
        }
    }

    /// Spawns the signal listener.
    pub fn listen(&self) {
        let handle = self.clone();
        tokio::spawn(async move {
            let signal = next_stop_signal().await;
            handle.request(signal);
        });
    }

    /// Records `signal` and cancels the run. Later calls keep the first signal.
    pub fn request(&self, signal: StopSignal) {
        if self.received.set(signal).is_err() {
            return;
        }
        warn!(%signal, "Stopping input, finishing rows already read");
        self.cancel_token.cancel();
        info!("Waiting for in-flight batches");
    }

    pub fn received(&self) -> Option<StopSignal> {
        self.received.get().copied()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

async fn next_stop_signal() -> StopSignal {
    let interrupt = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => StopSignal::Interrupt,
        _ = terminate => StopSignal::Terminate,
    }
}

/// Process exit status of `wa-validator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// Usage, configuration or run failure.
    GeneralError = 1,
    InputNotFound = 2,
    /// 128 + SIGINT; the output holds an ordered prefix of the input.
    Interrupted = 130,
}

impl ExitCode {
    /// Exit status for a run that returned a summary.
    pub fn for_completed_run(interrupted: bool) -> Self {
        if interrupted {
            ExitCode::Interrupted
        } else {
            ExitCode::Success
        }
    }

    /// `--help` and `--version` succeed; any other parse failure is a usage error.
    pub fn for_usage(err: &clap::Error) -> Self {
        if err.use_stderr() {
            ExitCode::GeneralError
        } else {
            ExitCode::Success
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
