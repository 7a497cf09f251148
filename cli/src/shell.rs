//! Drives the crux [`Core`]: performs each effect on its own task and feeds
//! outputs back one at a time.

use std::future::Future;
use std::sync::Arc;

use crux_core::{Core, Request};
use crux_http::protocol::{HttpRequest, HttpResult};
use crux_kv::{KeyValueOperation, KeyValueResult};
use shared::capabilities::{PickerOperation, PickerResult};
use shared::model::Screen;
use shared::{App, Config, Effect, Event, ViewModel};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::http::HttpExecutor;
use crate::picker::MediaPicker;
use crate::store::KeyValueStore;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("effect task panicked: {0}")]
    TaskPanicked(String),

    #[error("{pending} request(s) pending with no task left to answer them")]
    Stalled { pending: usize },
}

/// A finished effect: the request it answers and the shell's output.
enum Resolution {
    Http(Request<HttpRequest>, HttpResult),
    KeyValue(Request<KeyValueOperation>, KeyValueResult),
    Picker(Request<PickerOperation>, PickerResult),
}

pub struct Shell {
    core: Core<Effect, App>,
    http: Arc<dyn HttpExecutor>,
    store: Arc<dyn KeyValueStore>,
    picker: Arc<dyn MediaPicker>,
    tasks: JoinSet<()>,
    resolutions_tx: mpsc::UnboundedSender<Resolution>,
    resolutions_rx: mpsc::UnboundedReceiver<Resolution>,
    shutdown: CancellationToken,
    in_flight: usize,
    renders: u64,
}

impl Shell {
    /// Builds the core and hands it `config`. Must be called from within a
    /// tokio runtime.
    pub fn new(
        config: Config,
        http: Arc<dyn HttpExecutor>,
        store: Arc<dyn KeyValueStore>,
        picker: Arc<dyn MediaPicker>,
    ) -> Self {
        let (resolutions_tx, resolutions_rx) = mpsc::unbounded_channel();
        let mut shell = Self {
            core: Core::new(),
            http,
            store,
            picker,
            tasks: JoinSet::new(),
            resolutions_tx,
            resolutions_rx,
            shutdown: CancellationToken::new(),
            in_flight: 0,
            renders: 0,
        };
        shell.dispatch(Event::Configure(Box::new(config)));
        shell
    }

    /// Hands a user event to the core and starts the effects it asks for.
    pub fn dispatch(&mut self, event: Event) {
        tracing::debug!(event = event.name(), "dispatch");
        let effects = self.core.process_event(event);
        self.run(effects);
    }

    /// Resolves outputs until the core has nothing left in flight.
    pub async fn settle(&mut self) -> Result<(), ShellError> {
        while self.in_flight > 0 {
            if self.tasks.is_empty() {
                match self.resolutions_rx.try_recv() {
                    Ok(resolution) => self.resolve(resolution),
                    Err(_) => {
                        return Err(ShellError::Stalled {
                            pending: self.in_flight,
                        })
                    }
                }
                continue;
            }

            tokio::select! {
                biased;
                Some(resolution) = self.resolutions_rx.recv() => self.resolve(resolution),
                Some(joined) = self.tasks.join_next() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            return Err(ShellError::TaskPanicked(e.to_string()));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn view(&self) -> ViewModel {
        self.core.view()
    }

    pub fn screen(&self) -> Screen {
        self.view().screen.screen()
    }

    /// Number of `Render` effects seen so far.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Cancels in-flight effects and waits for their tasks to end. Outputs
    /// that arrive afterwards are never resolved.
    pub async fn shutdown(&mut self) {
        self.shutdown.cancel();
        while self.tasks.join_next().await.is_some() {}
        tracing::debug!(dropped = self.in_flight, "shell shut down");
    }

    fn resolve(&mut self, resolution: Resolution) {
        self.in_flight -= 1;
        let effects = match resolution {
            Resolution::Http(mut request, result) => self.core.resolve(&mut request, result),
            Resolution::KeyValue(mut request, result) => self.core.resolve(&mut request, result),
            Resolution::Picker(mut request, result) => self.core.resolve(&mut request, result),
        };
        self.run(effects);
    }

    fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Render(_) => self.renders += 1,
                Effect::Http(request) => {
                    let http = Arc::clone(&self.http);
                    self.spawn("http", async move {
                        let result = http.execute(request.operation.clone()).await;
                        Resolution::Http(request, result)
                    });
                }
                Effect::KeyValue(request) => {
                    let store = Arc::clone(&self.store);
                    self.spawn("key_value", async move {
                        let result = store.execute(request.operation.clone()).await;
                        Resolution::KeyValue(request, result)
                    });
                }
                Effect::ImagePicker(request) => {
                    let picker = Arc::clone(&self.picker);
                    let PickerOperation::PickImage { config } = request.operation.clone();
                    self.spawn("picker", async move {
                        let result = picker.pick(config).await;
                        Resolution::Picker(request, result)
                    });
                }
            }
        }
    }

    fn spawn<F>(&mut self, effect: &'static str, work: F)
    where
        F: Future<Output = Resolution> + Send + 'static,
    {
        self.in_flight += 1;
        let resolutions = self.resolutions_tx.clone();
        let shutdown = self.shutdown.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                () = shutdown.cancelled() => tracing::debug!(effect, "effect cancelled"),
                resolution = work => {
                    if resolutions.send(resolution).is_err() {
                        tracing::debug!(effect, "shell gone, output dropped");
                    }
                }
            }
        });
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
