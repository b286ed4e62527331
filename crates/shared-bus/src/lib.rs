//! # Shared Bus - Ledger Events and Job Transport
//!
//! Two channels leave the ledger:
//!
//! ```text
//! ┌──────────────┐  publish() after commit   ┌──────────────┐
//! │ Points       │ ────────────────────────→ │  Event Bus   │ ──→ subscribers
//! │ Ledger       │                           └──────────────┘
//! └──────────────┘
//!        ↑ record_stake_event()
//! ┌──────────────┐   recv()   ┌──────────────┐   enqueue()   request handler
//! │ Stake-Sync   │ ←───────── │  Job Queue   │ ←──────────── (job id = tx hash)
//! │ Worker       │            └──────────────┘
//! └──────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Events are notifications.** They are published after a commit; a
//!   dropped event never affects the ledger.
//! - **The queue is a transport, not a source of truth.** Duplicate job ids
//!   are folded while in flight, and redelivery is safe because the ledger
//!   deduplicates on the transaction hash anyway.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod dedup;
pub mod events;
pub mod publisher;
pub mod queue;
pub mod subscriber;

// Re-export main types
pub use dedup::InFlightSet;
pub use events::{EventFilter, EventTopic, LedgerEvent};
pub use publisher::{EventPublisher, InMemoryEventBus, NullPublisher};
pub use queue::{job_queue, EnqueueOutcome, Job, JobQueue, JobReceiver, QueueError};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Maximum pending jobs before `enqueue` applies backpressure.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Topic name attached to dead-lettered jobs in logs.
pub const DLQ_TOPIC: &str = "dlq.stake_sync";
