//! Background driver that applies document events to a style document.
//!
//! The document lives on a worker thread; callers talk to it over a channel
//! and read results back through oneshot replies.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use log::debug;
use tokio::sync::oneshot;

use crate::document::{StyleDocument, StyleNode};
use crate::scheduler::{DocumentEvent, Injection, PassReport, ReadyState, Scheduler};
use crate::{Error, Result};

pub type OnPassHandler = Arc<dyn Fn(&PassReport) + Send + Sync>;

enum Command<D> {
    Event(DocumentEvent),
    InsertStyle(StyleNode),
    Snapshot(oneshot::Sender<Vec<StyleNode>>),
    Close(oneshot::Sender<(D, ObserverStats)>),
}

/// Totals over the lifetime of an observer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverStats {
    pub passes: usize,
    pub modified: usize,
    pub replacements: usize,
}

/// Event-driven driver for a style document, backed by a dedicated worker thread.
///
/// The worker owns the document and the [`Scheduler`]; events sent from any
/// thread are applied in order, each trigger waiting its delay before its
/// pass. When a pass inserts the override block, the worker observes that
/// insertion like any other style node.
pub struct StyleObserver<D> {
    cmd_tx: Sender<Command<D>>,
}

impl<D> Clone for StyleObserver<D> {
    fn clone(&self) -> Self {
        Self { cmd_tx: self.cmd_tx.clone() }
    }
}

impl<D: StyleDocument + Send + 'static> StyleObserver<D> {
    /// Attach to `doc`; a pass runs right away unless the document is still loading
    pub fn spawn(doc: D, scheduler: Scheduler, ready: ReadyState) -> Self {
        Self::spawn_with(doc, scheduler, ready, None)
    }

    pub fn spawn_with(
        mut doc: D,
        scheduler: Scheduler,
        ready: ReadyState,
        on_pass: Option<OnPassHandler>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command<D>>();

        thread::spawn(move || {
            let mut pending: VecDeque<DocumentEvent> = VecDeque::new();
            let mut stats = ObserverStats::default();
            if scheduler.run_on_attach(ready) {
                pending.push_back(DocumentEvent::ContentLoaded);
            }

            loop {
                let cmd = match pending.pop_front() {
                    Some(ev) => Command::Event(ev),
                    None => match cmd_rx.recv() {
                        Ok(cmd) => cmd,
                        Err(_) => break,
                    },
                };

                match cmd {
                    Command::Event(ev) => {
                        let Some(delay) = scheduler.delay_for(&ev) else {
                            continue;
                        };
                        if !delay.is_zero() {
                            thread::sleep(delay);
                        }
                        let report = scheduler.run_pass(&mut doc);
                        stats.passes += 1;
                        stats.modified += report.modified;
                        stats.replacements += report.replacements;
                        if report.injection == Injection::Created {
                            pending.push_back(DocumentEvent::style_inserted());
                        }
                        if let Some(cb) = &on_pass {
                            cb(&report);
                        }
                    }
                    Command::InsertStyle(node) => {
                        doc.append_style(node);
                        pending.push_back(DocumentEvent::style_inserted());
                    }
                    Command::Snapshot(resp) => {
                        let _ = resp.send(doc.styles().to_vec());
                    }
                    Command::Close(resp) => {
                        debug!("style observer closing after {} passes", stats.passes);
                        let _ = resp.send((doc, stats));
                        return;
                    }
                }
            }
        });

        Self { cmd_tx }
    }

    fn send(&self, cmd: Command<D>) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::Other("style observer worker has stopped".into()))
    }

    /// Deliver a document event
    pub fn notify(&self, event: DocumentEvent) -> Result<()> {
        self.send(Command::Event(event))
    }

    /// Insert a style element, as lazily loaded content would
    pub fn insert_style(&self, node: StyleNode) -> Result<()> {
        self.send(Command::InsertStyle(node))
    }

    /// Style elements after every previously sent command has been applied
    pub async fn snapshot(&self) -> Result<Vec<StyleNode>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await
            .map_err(|_| Error::Other("style observer worker dropped the snapshot".into()))
    }

    /// Stop the worker and take back the document
    pub async fn close(self) -> Result<(D, ObserverStats)> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Close(tx))?;
        rx.await
            .map_err(|_| Error::Other("style observer worker dropped the document".into()))
    }
}
