use crossterm::event::{KeyEvent, KeyEventKind};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::triggers::{RefreshTriggers, Trigger};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Tick,
    /// A refresh trigger fired; `live` reports whether the change feed is still attached
    Refresh { trigger: Trigger, live: bool },
}

/// Merges terminal input, the render tick and the view's refresh triggers
/// into one stream. The triggers live inside the spawned task and are
/// released when the handler shuts down or is dropped.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration, mut triggers: RefreshTriggers) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut reader = crossterm::event::EventStream::new();
            let mut tick_interval = tokio::time::interval(tick_rate);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    maybe_event = reader.next() => {
                        if let Some(Ok(crossterm::event::Event::Key(key))) = maybe_event {
                            // Filter for Press only (Windows compatibility)
                            if key.kind == KeyEventKind::Press && tx.send(Event::Key(key)).is_err() {
                                break;
                            }
                        }
                    }
                    _ = tick_interval.tick() => {
                        if tx.send(Event::Tick).is_err() {
                            break;
                        }
                    }
                    trigger = triggers.next() => {
                        let live = triggers.is_live();
                        if tx.send(Event::Refresh { trigger, live }).is_err() {
                            break;
                        }
                    }
                }
            }

            triggers.stop().await;
        });

        EventHandler {
            rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub async fn next(&mut self) -> Event {
        self.rx.recv().await.unwrap_or(Event::Tick)
    }

    /// Stop the input task and leave the realtime channel
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
                tracing::debug!("event task did not stop in time");
            }
        }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
