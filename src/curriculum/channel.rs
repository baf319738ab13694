//! Shared difficulty cell
//!
//! A single `f32` cell created before any environment worker starts,
//! written once per epoch by the orchestrator, and read an unbounded number
//! of times by concurrently running workers during rollout collection.
//!
//! The value is stored as its bit pattern in an `AtomicU32`, so reads and
//! writes are single machine-word operations: no locks, no torn values.
//! Workers may observe the previous epoch's value for a few steps after a
//! write; difficulty changes between consecutive epochs are small, so the
//! staleness is harmless. There is exactly one writer, which makes
//! last-writer-wins sufficient.
//!
//! The single-writer/many-reader contract is enforced by the API shape:
//! [`difficulty_cell`] returns one non-cloneable [`DifficultyWriter`] and a
//! cloneable [`DifficultyReader`]. Workers receive reader clones at
//! construction time and cannot write.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Create the shared difficulty cell at its initial value.
///
/// Returns the unique writer handle and a reader handle that can be cloned
/// into every environment worker.
///
/// # Example
///
/// ```rust
/// use ml_flappy::curriculum::difficulty_cell;
///
/// let (writer, reader) = difficulty_cell(0.0);
/// let worker_handle = reader.clone();
///
/// writer.store(0.25);
/// assert_eq!(worker_handle.load(), 0.25);
/// ```
pub fn difficulty_cell(initial: f32) -> (DifficultyWriter, DifficultyReader) {
    let cell = Arc::new(AtomicU32::new(initial.to_bits()));
    (
        DifficultyWriter { cell: cell.clone() },
        DifficultyReader { cell },
    )
}

/// Write half of the shared difficulty cell.
///
/// Owned by the orchestrator. Deliberately not `Clone`: the channel has
/// exactly one writer.
#[derive(Debug)]
pub struct DifficultyWriter {
    cell: Arc<AtomicU32>,
}

impl DifficultyWriter {
    /// Publish a new difficulty value to all workers.
    ///
    /// Fire-and-forget: never blocks on readers, and every write is
    /// observable by all workers on their next read.
    pub fn store(&self, difficulty: f32) {
        self.cell.store(difficulty.to_bits(), Ordering::Relaxed);
    }

    /// Current value of the cell, for reporting.
    pub fn load(&self) -> f32 {
        f32::from_bits(self.cell.load(Ordering::Relaxed))
    }
}

/// Read half of the shared difficulty cell.
///
/// Cloned into every environment worker at construction time. Readers never
/// block the writer or each other.
#[derive(Debug, Clone)]
pub struct DifficultyReader {
    cell: Arc<AtomicU32>,
}

impl DifficultyReader {
    /// Read the current difficulty value.
    pub fn load(&self) -> f32 {
        f32::from_bits(self.cell.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_initial_value() {
        let (writer, reader) = difficulty_cell(0.75);
        assert_eq!(writer.load(), 0.75);
        assert_eq!(reader.load(), 0.75);
    }

    #[test]
    fn test_write_visible_to_reader() {
        let (writer, reader) = difficulty_cell(0.0);
        writer.store(0.5);
        assert_eq!(reader.load(), 0.5);
    }

    #[test]
    fn test_write_visible_across_threads() {
        let (writer, reader) = difficulty_cell(0.0);
        writer.store(0.9);

        let handle = thread::spawn(move || reader.load());
        assert_eq!(handle.join().unwrap(), 0.9);
    }

    #[test]
    fn test_many_readers_one_writer() {
        let (writer, reader) = difficulty_cell(0.0);
        let written: Vec<f32> = (0..=100).map(|i| i as f32 / 100.0).collect();

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let reader = reader.clone();
                thread::spawn(move || {
                    let mut observed = Vec::new();
                    for _ in 0..1_000 {
                        observed.push(reader.load());
                    }
                    observed
                })
            })
            .collect();

        for &value in &written {
            writer.store(value);
        }

        for handle in readers {
            let observed = handle.join().unwrap();
            // Readers only ever see values that were actually written: no
            // torn reads.
            for value in observed {
                assert!(
                    written.contains(&value),
                    "observed a value that was never written: {}",
                    value
                );
            }
        }

        // The last write is never lost.
        assert_eq!(reader.load(), 1.0);
    }

    #[test]
    fn test_reader_clones_share_the_cell() {
        let (writer, reader) = difficulty_cell(0.0);
        let clones: Vec<_> = (0..4).map(|_| reader.clone()).collect();

        writer.store(0.33);
        for clone in &clones {
            assert_eq!(clone.load(), 0.33);
        }
    }
}
