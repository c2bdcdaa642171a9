use std::future::Future;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::errors::PublishError;
use crate::domain::events::OrderEvent;
use crate::domain::order::Order;
use crate::domain::ports::EventPublisher;

/// A serialized event ready for the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    pub routing_key: &'static str,
    /// Partitioning key; the order id.
    pub key: String,
    pub payload: Vec<u8>,
}

impl EventMessage {
    pub fn encode(event: &OrderEvent) -> Result<Self, PublishError> {
        Ok(EventMessage {
            routing_key: event.routing_key(),
            key: event.order_id().to_string(),
            payload: serde_json::to_vec(event)?,
        })
    }
}

/// Where the dispatch task delivers messages.
pub trait EventSink: Send + Sync + 'static {
    fn send(&self, message: &EventMessage)
        -> impl Future<Output = Result<(), PublishError>> + Send;

    /// Called once when the dispatch task stops.
    fn flush(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Hands events to a bounded queue drained by a background task, so callers
/// never wait on the broker.
///
/// [`BrokerPublisher::unavailable`] gives a publisher with no broker behind it;
/// every call returns [`PublishError::Unavailable`].
#[derive(Clone)]
pub struct BrokerPublisher {
    tx: Option<mpsc::Sender<EventMessage>>,
}

impl BrokerPublisher {
    /// Spawns the dispatch task on the current tokio runtime.
    pub fn spawn<K: EventSink>(sink: K, capacity: usize) -> (Self, PublisherHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(dispatch(sink, rx, stop_rx));
        (
            Self { tx: Some(tx) },
            PublisherHandle {
                stop: Some(stop_tx),
                task: Some(task),
            },
        )
    }

    pub fn unavailable() -> Self {
        Self { tx: None }
    }

    pub fn is_available(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn enqueue(&self, event: OrderEvent) -> Result<(), PublishError> {
        let tx = self.tx.as_ref().ok_or(PublishError::Unavailable)?;
        let message = EventMessage::encode(&event)?;
        tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PublishError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => PublishError::Unavailable,
        })
    }
}

impl EventPublisher for BrokerPublisher {
    fn publish_order_created(&self, order: &Order) -> Result<(), PublishError> {
        self.enqueue(OrderEvent::created(order, Utc::now()))
    }

    fn publish_order_status_updated(&self, order: &Order) -> Result<(), PublishError> {
        self.enqueue(OrderEvent::status_updated(order, Utc::now()))
    }
}

/// Owns the dispatch task. Shutting down delivers whatever is already queued,
/// flushes the sink, and waits for the task to finish.
pub struct PublisherHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PublisherHandle {
    /// Handle for a degraded publisher; shutdown is a no-op.
    pub fn detached() -> Self {
        Self {
            stop: None,
            task: None,
        }
    }

    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("Event dispatch task ended abnormally: {}", e);
            }
        }
    }
}

async fn deliver<K: EventSink>(sink: &K, message: EventMessage) {
    match sink.send(&message).await {
        Ok(()) => log::debug!(
            "Published {} for order {}",
            message.routing_key,
            message.key
        ),
        Err(e) => log::error!(
            "Dropped {} event for order {}: {}",
            message.routing_key,
            message.key,
            e
        ),
    }
}

async fn dispatch<K: EventSink>(
    sink: K,
    mut rx: mpsc::Receiver<EventMessage>,
    mut stop: oneshot::Receiver<()>,
) {
    // A dropped handle disarms the stop signal; the task then ends when the
    // last publisher clone goes away.
    let mut stop_armed = true;
    loop {
        tokio::select! {
            biased;
            signal = &mut stop, if stop_armed => match signal {
                Ok(()) => break,
                Err(_) => stop_armed = false,
            },
            next = rx.recv() => match next {
                Some(message) => deliver(&sink, message).await,
                None => break,
            },
        }
    }

    rx.close();
    while let Some(message) = rx.recv().await {
        deliver(&sink, message).await;
    }
    sink.flush().await;
    log::info!("Event dispatch stopped");
}
