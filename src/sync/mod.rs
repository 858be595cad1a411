//! Synchronization primitives.

mod rwlock;

pub use rwlock::{ReadGuard, WritePriorityRwLock, WriteGuard};
