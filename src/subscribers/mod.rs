//! # Subscriber plumbing: hook handlers onto the event bus.

mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::events::Bus;

/// Attaches a subscriber to the bus on its own worker task.
///
/// The worker reads events in publish order and awaits
/// [`Subscribe::on_event`] for each. It exits when the bus closes; dropping
/// the returned handle detaches it without stopping it.
pub fn attach(bus: &Bus, subscriber: Arc<dyn Subscribe>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => subscriber.on_event(&ev).await,
                Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        subscriber = subscriber.name(),
                        skipped, "subscriber lagged behind the bus"
                    );
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::events::{Event, EventKind};

    struct Counter(AtomicUsize);

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, _event: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &'static str {
            "counter"
        }
    }

    #[tokio::test]
    async fn test_attached_subscriber_sees_events() {
        let bus = Bus::new(16);
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let _worker = attach(&bus, Arc::clone(&counter) as Arc<dyn Subscribe>);

        bus.publish(Event::now(EventKind::TaskQueued).with_task("t"));
        bus.publish(Event::now(EventKind::TaskStopped).with_task("t"));

        for _ in 0..100 {
            if counter.0.load(Ordering::SeqCst) == 2 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("subscriber did not observe both events");
    }
}
