//! `--events` output.

use ideaforge_execution::tracing_layer::JobEvent;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Background task printing job events to stderr.
pub struct EventPrinter {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl EventPrinter {
    /// Stops the printer after flushing events already queued.
    pub async fn finish(self) {
        self.stop.cancel();
        let _ = self.handle.await;
    }
}

pub fn spawn_printer(mut receiver: UnboundedReceiver<JobEvent>) -> EventPrinter {
    let stop = CancellationToken::new();
    let stopped = stop.clone();

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                Some(event) = receiver.recv() => print_event(&event),
                _ = stopped.cancelled() => break,
            }
        }
        while let Ok(event) = receiver.try_recv() {
            print_event(&event);
        }
    });

    EventPrinter { stop, handle }
}

fn print_event(event: &JobEvent) {
    match serde_json::to_string(event) {
        Ok(line) => eprintln!("{line}"),
        Err(e) => eprintln!("[event] {} (unserializable: {e})", event.message),
    }
}
