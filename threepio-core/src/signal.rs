// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling for the orchestrator (spec.md §4.6 "Signal handling",
//! §5 task T7).

use crate::errors::SignalHandlerSetupError;

/// The kind of signal handling to set up for a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignalHandlerKind {
    /// Forward SIGINT/SIGTERM/SIGHUP (Unix) or Ctrl-C (Windows) to the
    /// orchestrator's shutdown path.
    Standard,
    /// Never fires. Useful for tests that don't want to touch process-wide
    /// signal state.
    Noop,
}

impl SignalHandlerKind {
    pub(crate) fn build(self) -> Result<SignalHandler, SignalHandlerSetupError> {
        match self {
            Self::Standard => SignalHandler::new(),
            Self::Noop => Ok(SignalHandler::noop()),
        }
    }
}

/// A shutdown-triggering signal, received once.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShutdownEvent {
    Interrupt,
    #[cfg(unix)]
    Term,
    #[cfg(unix)]
    Hangup,
}

pub(crate) struct SignalHandler {
    signals: Option<imp::Signals>,
}

impl SignalHandler {
    pub(crate) fn new() -> Result<Self, SignalHandlerSetupError> {
        Ok(Self {
            signals: Some(imp::Signals::new()?),
        })
    }

    pub(crate) fn noop() -> Self {
        Self { signals: None }
    }

    /// Waits for the next shutdown-triggering signal. Returns `None` if
    /// this handler is a no-op or the signal stream has been exhausted,
    /// in which case the caller should treat this future as never
    /// resolving (or stop polling it).
    pub(crate) async fn recv(&mut self) -> Option<ShutdownEvent> {
        match &mut self.signals {
            Some(signals) => signals.recv().await,
            None => std::future::pending().await,
        }
    }
}

#[cfg(unix)]
mod imp {
    use super::ShutdownEvent;
    use crate::errors::SignalHandlerSetupError;
    use tokio::signal::unix::{signal, SignalKind};
    use tokio_stream::{wrappers::SignalStream, StreamExt, StreamMap};

    #[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
    enum SignalId {
        Int,
        Term,
        Hup,
    }

    pub(super) struct Signals {
        map: StreamMap<SignalId, SignalStream>,
    }

    impl Signals {
        pub(super) fn new() -> Result<Self, SignalHandlerSetupError> {
            let mut map = StreamMap::new();
            map.extend([
                (SignalId::Int, SignalStream::new(signal(SignalKind::interrupt())?)),
                (SignalId::Term, SignalStream::new(signal(SignalKind::terminate())?)),
                (SignalId::Hup, SignalStream::new(signal(SignalKind::hangup())?)),
            ]);
            Ok(Self { map })
        }

        pub(super) async fn recv(&mut self) -> Option<ShutdownEvent> {
            self.map.next().await.map(|(id, _)| match id {
                SignalId::Int => ShutdownEvent::Interrupt,
                SignalId::Term => ShutdownEvent::Term,
                SignalId::Hup => ShutdownEvent::Hangup,
            })
        }
    }
}

#[cfg(windows)]
mod imp {
    use super::ShutdownEvent;
    use crate::errors::SignalHandlerSetupError;
    use tokio::signal::windows::{ctrl_c, CtrlC};

    pub(super) struct Signals {
        ctrl_c: CtrlC,
    }

    impl Signals {
        pub(super) fn new() -> Result<Self, SignalHandlerSetupError> {
            Ok(Self { ctrl_c: ctrl_c()? })
        }

        pub(super) async fn recv(&mut self) -> Option<ShutdownEvent> {
            self.ctrl_c.recv().await.map(|()| ShutdownEvent::Interrupt)
        }
    }
}
