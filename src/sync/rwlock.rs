//! Write-priority reader-writer lock.
//!
//! A reader-writer lock that admits new readers only while no writer is
//! active *and* no writer is waiting, so a steady stream of readers cannot
//! starve writers. `std::sync::RwLock` leaves that policy to the OS; this
//! lock makes it a guarantee.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Default)]
struct LockState {
    readers: usize,
    writers_waiting: usize,
    writer: bool,
}

/// Reader-writer lock with strict write priority.
///
/// Acquire calls take an optional timeout and report the outcome as a
/// boolean; expiry is an ordinary result, never a panic. Acquire/release
/// calls must pair up, and the lock is not reentrant: acquiring twice from
/// one thread deadlocks. The [`read`](Self::read) / [`write`](Self::write)
/// guards release on drop and are the preferred way to hold the lock
/// across a traversal.
#[derive(Default)]
pub struct WritePriorityRwLock {
    state: Mutex<LockState>,
    cond: Condvar,
}

impl WritePriorityRwLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a read lock.
    ///
    /// Blocks while a writer is active or any writer is waiting. With
    /// `timeout: None` this always succeeds eventually; a timeout too large
    /// for the monotonic clock to represent is treated the same way.
    ///
    /// # Returns
    ///
    /// `true` once the read lock is held, `false` if the timeout expired.
    pub fn acquire_read(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match deadline {
            None => {
                while state.writer || state.writers_waiting > 0 {
                    state = self.cond.wait(state).unwrap_or_else(PoisonError::into_inner);
                }
            }
            Some(deadline) => {
                while state.writer || state.writers_waiting > 0 {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    let remaining = deadline.saturating_duration_since(now);
                    state = self
                        .cond
                        .wait_timeout(state, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }

        state.readers += 1;
        true
    }

    /// Release a read lock. Wakes waiters when the last reader leaves.
    pub fn release_read(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(state.readers > 0, "release_read without matching acquire");
        state.readers = state.readers.saturating_sub(1);
        if state.readers == 0 {
            drop(state);
            self.cond.notify_all();
        }
    }

    /// Acquire the write lock.
    ///
    /// Registers write intent before blocking, so readers arriving later
    /// queue behind this writer. Blocks while readers are active or another
    /// writer holds the lock. A timeout too large for the monotonic clock to
    /// represent is treated as no timeout.
    ///
    /// # Returns
    ///
    /// `true` once the write lock is held, `false` if the timeout expired
    /// (the registered intent is rolled back so queued readers proceed).
    pub fn acquire_write(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.writers_waiting += 1;

        match deadline {
            None => {
                while state.readers > 0 || state.writer {
                    state = self.cond.wait(state).unwrap_or_else(PoisonError::into_inner);
                }
            }
            Some(deadline) => {
                while state.readers > 0 || state.writer {
                    let now = Instant::now();
                    if now >= deadline {
                        state.writers_waiting -= 1;
                        drop(state);
                        self.cond.notify_all();
                        return false;
                    }
                    let remaining = deadline.saturating_duration_since(now);
                    state = self
                        .cond
                        .wait_timeout(state, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }

        state.writers_waiting -= 1;
        state.writer = true;
        true
    }

    /// Release the write lock and wake all waiters.
    pub fn release_write(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(state.writer, "release_write without matching acquire");
        state.writer = false;
        drop(state);
        self.cond.notify_all();
    }

    /// Acquire a read lock and return a guard that releases on drop.
    pub fn read(&self) -> ReadGuard<'_> {
        let acquired = self.acquire_read(None);
        debug_assert!(acquired);
        ReadGuard { lock: self }
    }

    /// Try to acquire a read lock within `timeout`.
    pub fn try_read(&self, timeout: Duration) -> Option<ReadGuard<'_>> {
        self.acquire_read(Some(timeout))
            .then_some(ReadGuard { lock: self })
    }

    /// Acquire the write lock and return a guard that releases on drop.
    pub fn write(&self) -> WriteGuard<'_> {
        let acquired = self.acquire_write(None);
        debug_assert!(acquired);
        WriteGuard { lock: self }
    }

    /// Try to acquire the write lock within `timeout`.
    pub fn try_write(&self, timeout: Duration) -> Option<WriteGuard<'_>> {
        self.acquire_write(Some(timeout))
            .then_some(WriteGuard { lock: self })
    }
}

/// Read lock held until drop.
#[must_use]
pub struct ReadGuard<'a> {
    lock: &'a WritePriorityRwLock,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

/// Write lock held until drop.
#[must_use]
pub struct WriteGuard<'a> {
    lock: &'a WritePriorityRwLock,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Barrier};
    use std::thread;

    #[test]
    fn test_concurrent_readers() {
        let lock = Arc::new(WritePriorityRwLock::new());
        let barrier = Arc::new(Barrier::new(4));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let lock = Arc::clone(&lock);
            let barrier = Arc::clone(&barrier);
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            handles.push(thread::spawn(move || {
                assert!(lock.acquire_read(None));
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                // All four must be inside the read section together.
                barrier.wait();
                active.fetch_sub(1, Ordering::SeqCst);
                lock.release_read();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_writer_excludes_readers() {
        let lock = WritePriorityRwLock::new();
        assert!(lock.acquire_write(None));
        assert!(!lock.acquire_read(Some(Duration::from_millis(50))));
        lock.release_write();
        assert!(lock.acquire_read(Some(Duration::from_millis(50))));
        lock.release_read();
    }

    #[test]
    fn test_writers_exclude_each_other() {
        let lock = WritePriorityRwLock::new();
        assert!(lock.acquire_write(None));
        assert!(!lock.acquire_write(Some(Duration::from_millis(50))));
        lock.release_write();
    }

    #[test]
    fn test_waiting_writer_blocks_new_readers() {
        let lock = Arc::new(WritePriorityRwLock::new());
        assert!(lock.acquire_read(None));

        let writer_lock = Arc::clone(&lock);
        let writer = thread::spawn(move || {
            assert!(writer_lock.acquire_write(None));
            writer_lock.release_write();
        });

        // Wait until the writer has registered its intent.
        while lock.state.lock().unwrap().writers_waiting == 0 {
            thread::yield_now();
        }

        // A new reader must queue behind the waiting writer.
        assert!(!lock.acquire_read(Some(Duration::from_millis(50))));

        lock.release_read();
        writer.join().unwrap();

        assert!(lock.acquire_read(Some(Duration::from_millis(50))));
        lock.release_read();
    }

    #[test]
    fn test_writer_admitted_before_queued_reader() {
        let lock = Arc::new(WritePriorityRwLock::new());
        let (tx, rx) = mpsc::channel::<&'static str>();

        assert!(lock.acquire_read(None));

        let writer_lock = Arc::clone(&lock);
        let writer_tx = tx.clone();
        let writer = thread::spawn(move || {
            assert!(writer_lock.acquire_write(None));
            writer_tx.send("writer").unwrap();
            writer_lock.release_write();
        });

        while lock.state.lock().unwrap().writers_waiting == 0 {
            thread::yield_now();
        }

        let reader_lock = Arc::clone(&lock);
        let reader = thread::spawn(move || {
            assert!(reader_lock.acquire_read(None));
            tx.send("reader").unwrap();
            reader_lock.release_read();
        });

        // Release the initial reader; the queued writer must win the race.
        thread::sleep(Duration::from_millis(50));
        lock.release_read();

        assert_eq!(rx.recv().unwrap(), "writer");
        assert_eq!(rx.recv().unwrap(), "reader");

        writer.join().unwrap();
        reader.join().unwrap();
    }

    #[test]
    fn test_write_timeout_rolls_back_intent() {
        let lock = WritePriorityRwLock::new();
        assert!(lock.acquire_read(None));

        assert!(!lock.acquire_write(Some(Duration::from_millis(50))));
        assert_eq!(lock.state.lock().unwrap().writers_waiting, 0);

        // With the intent rolled back, further readers are admitted again.
        assert!(lock.acquire_read(Some(Duration::from_millis(50))));
        lock.release_read();
        lock.release_read();
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = WritePriorityRwLock::new();
        {
            let _guard = lock.read();
            assert!(lock.try_write(Duration::from_millis(20)).is_none());
        }
        {
            let _guard = lock.write();
            assert!(lock.try_read(Duration::from_millis(20)).is_none());
        }
        assert!(lock.try_read(Duration::from_millis(50)).is_some());
        assert!(lock.acquire_write(Some(Duration::from_millis(50))));
        lock.release_write();
    }

    #[test]
    fn test_oversized_timeout_waits_untimed() {
        // Duration::MAX overflows Instant arithmetic; it must behave like
        // an indefinite wait rather than panic.
        let lock = Arc::new(WritePriorityRwLock::new());
        assert!(lock.acquire_read(Some(Duration::MAX)));
        lock.release_read();
        assert!(lock.acquire_write(Some(Duration::MAX)));
        lock.release_write();

        assert!(lock.acquire_write(None));
        let reader_lock = Arc::clone(&lock);
        let reader = thread::spawn(move || {
            assert!(reader_lock.acquire_read(Some(Duration::MAX)));
            reader_lock.release_read();
        });
        thread::sleep(Duration::from_millis(50));
        lock.release_write();
        reader.join().unwrap();
    }
}
