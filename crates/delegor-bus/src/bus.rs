use async_trait::async_trait;
use delegor_core::{DelegorError, DelegorResult, MessageEnvelope};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Publish-only view of the bus.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publishes an envelope to the named queue.
    async fn publish(&self, envelope: MessageEnvelope, queue: &str) -> DelegorResult<()>;
}

/// Per-consumer inbound callback.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handles one delivered envelope. Errors are the handler's to log;
    /// the bus does not retry or requeue.
    async fn handle(&self, envelope: MessageEnvelope);
}

/// Full bus contract: publishing plus consumer lifecycle.
#[async_trait]
pub trait MessageBus: MessagePublisher {
    /// Binds a handler to a queue and returns the handle that stops it.
    /// Several consumers may bind to the same queue; each message then goes
    /// to exactly one of them.
    async fn start_consuming(
        &self,
        queue: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> DelegorResult<ConsumerHandle>;

    /// Stops every consumer on the bus. Buffered messages are kept.
    async fn stop_all_consuming(&self);

    /// Stops everything and releases all queue state.
    async fn shutdown(&self);
}

struct ConsumerSeat {
    id: Uuid,
    tx: mpsc::UnboundedSender<MessageEnvelope>,
}

#[derive(Default)]
struct QueueState {
    buffer: VecDeque<MessageEnvelope>,
    seats: Vec<ConsumerSeat>,
    next_seat: usize,
}

type QueueTable = Arc<Mutex<HashMap<String, QueueState>>>;

/// In-process named-queue transport.
///
/// FIFO per queue for a single consumer; no ordering across queues.
pub struct InMemoryMessageBus {
    queues: QueueTable,
    root: CancellationToken,
}

impl InMemoryMessageBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            root: CancellationToken::new(),
        }
    }

    /// Number of messages buffered on a queue with no active consumer.
    pub fn buffered_len(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .get(queue)
            .map_or(0, |state| state.buffer.len())
    }

    /// Number of consumers currently bound to a queue.
    pub fn consumer_count(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .get(queue)
            .map_or(0, |state| state.seats.len())
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryMessageBus {
    async fn publish(&self, envelope: MessageEnvelope, queue: &str) -> DelegorResult<()> {
        if self.root.is_cancelled() {
            return Err(DelegorError::Bus("bus is shut down".to_string()));
        }
        let mut queues = self.queues.lock();
        let state = queues.entry(queue.to_string()).or_default();

        // Round-robin across live seats, pruning dead ones as we go.
        loop {
            if state.seats.is_empty() {
                debug!(queue, reference_code = %envelope.reference_code, "No consumer, buffering");
                state.buffer.push_back(envelope);
                return Ok(());
            }
            let idx = state.next_seat % state.seats.len();
            match state.seats[idx].tx.send(envelope.clone()) {
                Ok(()) => {
                    state.next_seat = idx + 1;
                    return Ok(());
                }
                Err(_) => {
                    state.seats.remove(idx);
                }
            }
        }
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn start_consuming(
        &self,
        queue: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> DelegorResult<ConsumerHandle> {
        if self.root.is_cancelled() {
            return Err(DelegorError::Bus("bus is shut down".to_string()));
        }
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        {
            let mut queues = self.queues.lock();
            let state = queues.entry(queue.to_string()).or_default();
            // Deliver anything that arrived before a consumer existed.
            for envelope in state.buffer.drain(..) {
                let _ = tx.send(envelope);
            }
            state.seats.push(ConsumerSeat { id, tx });
        }

        let token = self.root.child_token();
        let loop_token = token.clone();
        let root = self.root.clone();
        let queues = self.queues.clone();
        let queue_name = queue.to_string();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = loop_token.cancelled() => break,
                    delivery = rx.recv() => match delivery {
                        Some(envelope) => handler.handle(envelope).await,
                        None => break,
                    },
                }
            }
            // Requeue anything delivered to this seat but not yet handled.
            // On bus-wide shutdown the queue state is gone; the stranded
            // messages go with it.
            if root.is_cancelled() {
                return;
            }
            let mut stranded = VecDeque::new();
            while let Ok(envelope) = rx.try_recv() {
                stranded.push_back(envelope);
            }
            if !stranded.is_empty() {
                let mut queues = queues.lock();
                let state = queues.entry(queue_name.clone()).or_default();
                if state.seats.is_empty() {
                    state.buffer.append(&mut stranded);
                } else {
                    for envelope in stranded {
                        let idx = state.next_seat % state.seats.len();
                        let _ = state.seats[idx].tx.send(envelope);
                        state.next_seat = idx + 1;
                    }
                }
            }
        });

        debug!(queue, consumer = %id, "Consumer attached");
        Ok(ConsumerHandle {
            queue: queue.to_string(),
            id,
            token,
            task: Mutex::new(Some(task)),
            queues: self.queues.clone(),
        })
    }

    async fn stop_all_consuming(&self) {
        let mut queues = self.queues.lock();
        for (queue, state) in queues.iter_mut() {
            if !state.seats.is_empty() {
                debug!(queue, consumers = state.seats.len(), "Stopping consumers");
            }
            // Dropping the senders ends each consumer loop after it drains.
            state.seats.clear();
        }
    }

    async fn shutdown(&self) {
        self.root.cancel();
        self.queues.lock().clear();
    }
}

/// Stops exactly one consumer. Siblings on the same queue or bus are
/// unaffected. Dropping the handle without calling [`ConsumerHandle::stop`]
/// leaves the consumer running.
pub struct ConsumerHandle {
    queue: String,
    id: Uuid,
    token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    queues: QueueTable,
}

impl ConsumerHandle {
    /// The queue this consumer is bound to.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Detaches the seat and waits for the consumer loop to finish.
    pub async fn stop(&self) {
        {
            let mut queues = self.queues.lock();
            if let Some(state) = queues.get_mut(&self.queue) {
                state.seats.retain(|seat| seat.id != self.id);
            }
        }
        self.token.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(queue = %self.queue, error = %e, "Consumer task ended abnormally");
            }
        }
    }
}
