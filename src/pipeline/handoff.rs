//! Chunk handoff between the audio callback and the censor worker.
//!
//! The handoff slot is a bounded(1) channel: it is either Empty or holds
//! exactly one staged chunk, and the callback publishes with a lock-free
//! `try_send`. A companion recycle channel carries drained buffers back so
//! the callback never allocates: one buffer lives in the scheduler's staging,
//! one may sit in the slot or in the worker's hands, and one spare always
//! remains in the pool.

use crate::audio::ring::AbsPos;
use crossbeam_channel::{Receiver, Sender, bounded};

/// A mono chunk staged for transcription, tagged with the absolute position
/// of its first sample.
#[derive(Debug)]
pub struct StagedChunk {
    pub samples: Vec<f32>,
    pub start_abs: AbsPos,
}

/// Spare buffers primed into the recycle pool.
const SPARE_BUFFERS: usize = 2;

/// Channel ends for the chunk handoff.
pub struct Handoff {
    pub chunk_tx: Sender<StagedChunk>,
    pub chunk_rx: Receiver<StagedChunk>,
    pub recycle_tx: Sender<Vec<f32>>,
    pub recycle_rx: Receiver<Vec<f32>>,
}

/// Build the handoff slot and a recycle pool of preallocated buffers.
pub fn handoff(chunk_samples: usize) -> Handoff {
    let (chunk_tx, chunk_rx) = bounded(1);
    let (recycle_tx, recycle_rx) = bounded(SPARE_BUFFERS + 1);
    for _ in 0..SPARE_BUFFERS {
        recycle_tx
            .send(Vec::with_capacity(chunk_samples))
            .expect("recycle pool sized for its spares");
    }
    Handoff {
        chunk_tx,
        chunk_rx,
        recycle_tx,
        recycle_rx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_holds_at_most_one_chunk() {
        let h = handoff(16);
        let chunk = |abs| StagedChunk {
            samples: vec![0.0; 16],
            start_abs: abs,
        };
        assert!(h.chunk_tx.try_send(chunk(0)).is_ok());
        // Second publish fails until the worker drains the slot.
        assert!(h.chunk_tx.try_send(chunk(16)).is_err());

        let taken = h.chunk_rx.try_recv().unwrap();
        assert_eq!(taken.start_abs, 0);
        assert!(h.chunk_tx.try_send(chunk(16)).is_ok());
    }

    #[test]
    fn test_recycle_pool_is_primed() {
        let h = handoff(64);
        let first = h.recycle_rx.try_recv().unwrap();
        let second = h.recycle_rx.try_recv().unwrap();
        assert!(h.recycle_rx.try_recv().is_err());
        assert!(first.capacity() >= 64);
        assert!(second.capacity() >= 64);
    }

    #[test]
    fn test_recycle_roundtrip() {
        let h = handoff(8);
        let mut buf = h.recycle_rx.try_recv().unwrap();
        buf.extend_from_slice(&[1.0; 8]);
        buf.clear();
        h.recycle_tx.try_send(buf).unwrap();
        assert_eq!(h.recycle_rx.try_recv().unwrap().capacity(), 8);
    }
}
