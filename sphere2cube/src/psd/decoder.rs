//! Scanline decompression, sequential or on a bounded worker pool.
//!
//! # Architecture
//!
//! ```text
//!   coordinator (reads file)          worker pool (N threads)
//!  ┌────────────────────────┐  spawn  ┌───────────────────────┐
//!  │ ScanlineTask {index,   │ ──────▶ │ decode_scanline()     │
//!  │   compressed, target}  │         │ into owned target     │
//!  └────────────────────────┘         └──────────┬────────────┘
//!              ▲                                 │
//!              │   (index, Result<Vec<u8>>)      │
//!              └──────────── result channel ◀────┘
//! ```
//!
//! Each task owns its target buffer, so no buffer is ever touched by more
//! than one worker, and the coordinator only sees a buffer after receiving
//! it back over the channel. Results are slotted by index, so the assembled
//! scanline list is ordered regardless of completion order. The first
//! failure aborts the decode.

use std::sync::mpsc;

use tracing::debug;

use super::packbits::decode_scanline;
use super::{FormatError, PsdError};
use crate::progress::{Progress, Stage};

/// Number of tasks allowed in flight per worker before the coordinator
/// waits for results.
const IN_FLIGHT_PER_WORKER: usize = 8;

/// One scanline to decompress.
#[derive(Debug)]
pub struct ScanlineTask {
    /// Position of the scanline in the document (channel-major).
    pub index: usize,
    /// PackBits-compressed bytes.
    pub compressed: Vec<u8>,
    /// Output buffer, pre-sized to the document width.
    pub target: Vec<u8>,
}

impl ScanlineTask {
    /// Decompress into the owned target buffer.
    pub fn run(self) -> (usize, Result<Vec<u8>, FormatError>) {
        let ScanlineTask {
            index,
            compressed,
            mut target,
        } = self;
        let result = decode_scanline(index, &compressed, &mut target).map(|_| target);
        (index, result)
    }
}

/// Decompresses a stream of scanline tasks into an index-ordered list.
#[derive(Debug, Clone)]
pub struct ScanlineDecoder {
    threads: usize,
    progress: Progress,
}

impl ScanlineDecoder {
    /// Create a decoder using `threads` workers (1 decodes inline).
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            progress: Progress::none(),
        }
    }

    /// Decoder that runs every task on the calling thread.
    pub fn sequential() -> Self {
        Self::new(1)
    }

    /// Attach a progress handle.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Decode `count` tasks.
    ///
    /// `tasks` yields tasks lazily so the coordinator can read compressed
    /// bytes from disk while workers decompress earlier lines. Every index
    /// in `0..count` must be produced exactly once.
    pub fn decode<I>(&self, count: usize, tasks: I) -> Result<Vec<Vec<u8>>, PsdError>
    where
        I: IntoIterator<Item = Result<ScanlineTask, PsdError>>,
    {
        debug!(count, threads = self.threads, "Decoding scanlines");
        self.progress.begin(Stage::Decode, count as u64);

        let lines = if self.threads == 1 {
            self.decode_sequential(count, tasks)?
        } else {
            self.decode_parallel(count, tasks)?
        };

        self.progress.finish(Stage::Decode, count as u64);
        Ok(lines)
    }

    fn decode_sequential<I>(&self, count: usize, tasks: I) -> Result<Vec<Vec<u8>>, PsdError>
    where
        I: IntoIterator<Item = Result<ScanlineTask, PsdError>>,
    {
        let mut results = ResultSlots::new(count)?;
        for task in tasks {
            let (index, result) = task?.run();
            results.accept(index, result)?;
            self.report(&results);
        }
        results.into_lines()
    }

    fn decode_parallel<I>(&self, count: usize, tasks: I) -> Result<Vec<Vec<u8>>, PsdError>
    where
        I: IntoIterator<Item = Result<ScanlineTask, PsdError>>,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("packbits-worker-{}", i))
            .build()
            .map_err(|e| PsdError::WorkerPool(e.to_string()))?;

        let (result_tx, result_rx) = mpsc::channel::<(usize, Result<Vec<u8>, FormatError>)>();
        let max_in_flight = self.threads * IN_FLIGHT_PER_WORKER;
        let mut results = ResultSlots::new(count)?;
        let mut dispatched = 0usize;

        for task in tasks {
            let task = task?;
            let tx = result_tx.clone();
            pool.spawn(move || {
                // The coordinator may already have bailed out; nobody to tell.
                let _ = tx.send(task.run());
            });
            dispatched += 1;

            // Drain whatever is ready, and block once the queue is full.
            while let Ok((index, result)) = result_rx.try_recv() {
                results.accept(index, result)?;
                self.report(&results);
            }
            while dispatched - results.received() >= max_in_flight {
                let (index, result) = recv(&result_rx)?;
                results.accept(index, result)?;
                self.report(&results);
            }
        }
        drop(result_tx);

        while results.received() < dispatched {
            let (index, result) = recv(&result_rx)?;
            results.accept(index, result)?;
            self.report(&results);
        }

        results.into_lines()
    }

    fn report(&self, results: &ResultSlots) {
        self.progress.update(
            Stage::Decode,
            results.slots.len() as u64,
            results.received() as u64,
        );
    }
}

fn recv(
    rx: &mpsc::Receiver<(usize, Result<Vec<u8>, FormatError>)>,
) -> Result<(usize, Result<Vec<u8>, FormatError>), PsdError> {
    rx.recv()
        .map_err(|_| PsdError::WorkerPool("decode worker exited without a result".to_string()))
}

/// Results pre-sized by scanline index.
struct ResultSlots {
    slots: Vec<Option<Vec<u8>>>,
    received: usize,
}

impl ResultSlots {
    fn new(count: usize) -> Result<Self, PsdError> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(count)
            .map_err(|_| FormatError::TooManyScanlines(count))?;
        slots.resize_with(count, || None);
        Ok(Self { slots, received: 0 })
    }

    fn received(&self) -> usize {
        self.received
    }

    fn accept(&mut self, index: usize, result: Result<Vec<u8>, FormatError>) -> Result<(), PsdError> {
        let line = result?;
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            PsdError::WorkerPool(format!("scanline index {} out of range", index))
        })?;
        if slot.replace(line).is_some() {
            return Err(PsdError::WorkerPool(format!(
                "scanline {} decoded twice",
                index
            )));
        }
        self.received += 1;
        Ok(())
    }

    fn into_lines(self) -> Result<Vec<Vec<u8>>, PsdError> {
        let expected = self.slots.len();
        let lines: Vec<Vec<u8>> = self.slots.into_iter().flatten().collect();
        if lines.len() != expected {
            return Err(PsdError::WorkerPool(format!(
                "{} of {} scanlines missing",
                expected - lines.len(),
                expected
            )));
        }
        Ok(lines)
    }
}
