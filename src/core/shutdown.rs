//! # OS signal handling for the shutdown listener.
//!
//! [`Signal`] names the signals an embedder may register with
//! [`Supervisor::register_signal`](crate::Supervisor::register_signal).
//! Listeners are installed synchronously inside `start()`, so a signal raised
//! right after `start()` returns is already observed.
//!
//! ## Signals
//! **Unix platforms:** all variants, via [`tokio::signal::unix`].
//!
//! **Other platforms:** only [`Signal::Interrupt`] (Ctrl-C via [`tokio::signal::ctrl_c`]);
//! other variants are ignored with a warning.

use std::fmt;

/// OS signal that stops the group when received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT` (Ctrl-C).
    Interrupt,
    /// `SIGTERM` (default kill signal, used by systemd/Kubernetes).
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`.
    Hangup,
    /// `SIGUSR1`.
    User1,
    /// `SIGUSR2`.
    User2,
}

impl Signal {
    /// Conventional signal name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
            Signal::Hangup => "SIGHUP",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
        }
    }

    #[cfg(unix)]
    fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Quit => SignalKind::quit(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installed signal listeners for one supervisor.
pub(crate) struct SignalListener {
    #[cfg(unix)]
    streams: Vec<(Signal, tokio::signal::unix::Signal)>,
    #[cfg(not(unix))]
    ctrl_c: bool,
}

impl SignalListener {
    /// Installs a listener for every signal. Failures are logged and skipped.
    ///
    /// Must be called inside a tokio runtime.
    #[cfg(unix)]
    pub(crate) fn install(signals: &[Signal]) -> Self {
        let mut streams = Vec::with_capacity(signals.len());
        for sig in signals {
            match tokio::signal::unix::signal(sig.kind()) {
                Ok(stream) => streams.push((*sig, stream)),
                Err(err) => {
                    tracing::error!(signal = %sig, error = %err, "failed to install signal listener");
                }
            }
        }
        Self { streams }
    }

    #[cfg(not(unix))]
    pub(crate) fn install(signals: &[Signal]) -> Self {
        let mut ctrl_c = false;
        for sig in signals {
            match sig {
                Signal::Interrupt => ctrl_c = true,
                other => tracing::warn!(signal = %other, "signal not supported on this platform"),
            }
        }
        Self { ctrl_c }
    }

    /// Completes when any installed signal arrives; never completes if none are installed.
    #[cfg(unix)]
    pub(crate) async fn recv(&mut self) -> Signal {
        if self.streams.is_empty() {
            return std::future::pending().await;
        }
        let waits = self.streams.iter_mut().map(|(sig, stream)| {
            let sig = *sig;
            Box::pin(async move {
                match stream.recv().await {
                    Some(()) => sig,
                    // Signal driver gone: this source can no longer fire.
                    None => std::future::pending().await,
                }
            })
        });
        let (sig, _, _) = futures::future::select_all(waits).await;
        sig
    }

    #[cfg(not(unix))]
    pub(crate) async fn recv(&mut self) -> Signal {
        if !self.ctrl_c {
            return std::future::pending().await;
        }
        match tokio::signal::ctrl_c().await {
            Ok(()) => Signal::Interrupt,
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for ctrl-c");
                std::future::pending().await
            }
        }
    }
}
