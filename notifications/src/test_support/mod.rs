//! Test utilities shared by unit tests (in `src/`) and integration tests
//! (in `tests/`). Compiled for tests and behind the `test-support` feature.

mod doubles;
mod in_memory_queue;

pub use doubles::{
    ImmediateSleeper, MutableClock, RecordingSink, RecordingSleeper, order_body, sample_order,
};
pub use in_memory_queue::{
    InMemoryQueue, QueueCall, QueueOperation, RedrivePolicy, StoredMessageSnapshot,
};
