//! Command executor for the dashboard controller.
//!
//! The runtime owns the [`DashboardModel`], feeds it messages through
//! [`update`], and carries out the returned commands: load cycles run on
//! worker threads and report back over a channel, lifecycle events go to the
//! session log, and finished-loading notifications reach the observer.

#![allow(missing_docs)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::core::errors::{AttractorError, LoadError, LoadSource, Result};
use crate::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};
use crate::view::derive::{DerivedView, derive};
use crate::view::loader::DatasetLoader;
use crate::view::model::{DashboardCmd, DashboardModel, DashboardMsg, LoadTicket};
use crate::view::update::update;

/// Receives the "loading finished" signal the chrome uses to stop its spinner.
pub trait LoadObserver {
    fn finished_loading(&mut self);
}

impl<F: FnMut()> LoadObserver for F {
    fn finished_loading(&mut self) {
        self();
    }
}

/// Drives one dashboard: model, loader, message queue and side-effects.
pub struct DashboardRuntime {
    model: DashboardModel,
    loader: Arc<DatasetLoader>,
    tx: Sender<DashboardMsg>,
    rx: Receiver<DashboardMsg>,
    observer: Option<Box<dyn LoadObserver>>,
    session_log: Option<JsonlWriter>,
    in_flight: usize,
}

impl DashboardRuntime {
    #[must_use]
    pub fn new(model: DashboardModel, loader: DatasetLoader) -> Self {
        let (tx, rx) = unbounded();
        Self {
            model,
            loader: Arc::new(loader),
            tx,
            rx,
            observer: None,
            session_log: None,
            in_flight: 0,
        }
    }

    /// Attach the finished-loading observer.
    #[must_use]
    pub fn with_observer(mut self, observer: impl LoadObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Attach a session log and record the session start with the config hash.
    #[must_use]
    pub fn with_session_log(mut self, mut writer: JsonlWriter, config_hash: &str) -> Self {
        let mut entry = LogEntry::new(EventType::SessionStart, Severity::Info);
        entry.dataset = Some(self.model.dataset.to_string());
        entry.details = Some(format!(
            "config_hash={config_hash} serve_static={}",
            self.model.serve_static
        ));
        writer.write_entry(&entry);
        self.session_log = Some(writer);
        self
    }

    #[must_use]
    pub fn model(&self) -> &DashboardModel {
        &self.model
    }

    /// Derived view for the current state.
    #[must_use]
    pub fn view(&self) -> DerivedView<'_> {
        derive(&self.model.view)
    }

    /// Handle for posting messages from other threads.
    #[must_use]
    pub fn sender(&self) -> Sender<DashboardMsg> {
        self.tx.clone()
    }

    /// Load workers whose result has not been dispatched yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Run one message through the controller and execute its commands.
    pub fn dispatch(&mut self, msg: DashboardMsg) {
        let cmd = update(&mut self.model, msg);
        for cmd in cmd.flatten() {
            self.execute(cmd);
        }
    }

    /// Dispatch every queued message without blocking. Returns how many ran.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.receive(msg);
            handled += 1;
        }
        handled
    }

    /// Block until every spawned load has reported back.
    ///
    /// # Errors
    /// Returns [`AttractorError::Runtime`] if loads are still running when
    /// `timeout` elapses.
    pub fn wait_for_settle(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        self.pump();
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(msg) => self.receive(msg),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(AttractorError::Runtime {
                        details: format!(
                            "{} load(s) still in flight after {}ms",
                            self.in_flight,
                            timeout.as_millis()
                        ),
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(AttractorError::ChannelClosed {
                        component: "dashboard runtime",
                    });
                }
            }
        }
        self.pump();
        Ok(())
    }

    fn receive(&mut self, msg: DashboardMsg) {
        if matches!(msg, DashboardMsg::LoadFinished { .. }) {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        self.dispatch(msg);
    }

    // ──────────────────── commands ────────────────────

    fn execute(&mut self, cmd: DashboardCmd) {
        match cmd {
            DashboardCmd::None | DashboardCmd::Batch(_) => {}
            DashboardCmd::Load(ticket) => self.spawn_load(ticket),
            DashboardCmd::NotifyFinishedLoading => {
                if let Some(observer) = self.observer.as_mut() {
                    observer.finished_loading();
                }
            }
            DashboardCmd::Emit(event) => {
                if let Some(log) = self.session_log.as_mut() {
                    log.write_entry(&LogEntry::from_lifecycle(&event));
                }
            }
        }
    }

    fn spawn_load(&mut self, ticket: LoadTicket) {
        let loader = Arc::clone(&self.loader);
        let tx = self.tx.clone();
        let worker_ticket = ticket.clone();

        let spawned = thread::Builder::new()
            .name("attractor-load".to_string())
            .spawn(move || {
                let result = loader.load(&worker_ticket.dataset);
                // Receiver gone means the runtime was dropped; nothing to report to.
                let _ = tx.send(DashboardMsg::LoadFinished {
                    ticket: worker_ticket,
                    result,
                });
            });

        self.in_flight += 1;
        if let Err(source) = spawned {
            let error = LoadError::new(
                LoadSource::Worker,
                format!("could not spawn thread: {source}"),
            );
            let _ = self.tx.send(DashboardMsg::LoadFinished {
                ticket,
                result: Err(error),
            });
        }
    }
}
