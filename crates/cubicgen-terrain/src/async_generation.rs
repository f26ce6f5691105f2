//! Background cube generation on a pool of worker threads.
//!
//! Each worker owns a [`TerrainGenerator`](crate::TerrainGenerator) with its
//! own field caches, so caches are never shared between threads. Workers pick
//! up reloaded settings between cubes. Completed cubes and failures come back
//! through a bounded channel.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use cubicgen_math::CubePos;
use cubicgen_voxel::CubePrimer;
use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;
use tracing::{trace, warn};

use crate::error::GeneratorError;
use crate::handle::GeneratorHandle;

/// A generated cube ready for the host.
#[derive(Debug)]
pub struct GeneratedCube {
    pub pos: CubePos,
    pub primer: CubePrimer,
    /// Wall time spent generating, in microseconds.
    pub generation_time_us: u64,
}

/// A cube whose generation failed.
#[derive(Debug)]
pub struct FailedCube {
    pub pos: CubePos,
    pub error: GeneratorError,
}

pub type CubeResult = Result<GeneratedCube, FailedCube>;

struct QueuedCube {
    pos: CubePos,
    cancelled: Arc<AtomicBool>,
}

/// Generates cubes across a thread pool.
pub struct AsyncCubeGenerator {
    task_sender: Sender<QueuedCube>,
    result_receiver: Receiver<CubeResult>,
    /// Cancellation flag per pending cube.
    active_tasks: Arc<DashMap<CubePos, Arc<AtomicBool>>>,
    in_flight: Arc<AtomicU64>,
}

impl AsyncCubeGenerator {
    /// Spawns `thread_count` workers over `handle`.
    ///
    /// At most `max_concurrent * 2` cubes may be queued; further submissions
    /// are rejected. `result_capacity` bounds the completed-cube channel.
    pub fn new(
        handle: GeneratorHandle,
        thread_count: usize,
        max_concurrent: usize,
        result_capacity: usize,
    ) -> io::Result<Self> {
        let (task_sender, task_receiver) = bounded::<QueuedCube>(max_concurrent.max(1) * 2);
        let (result_sender, result_receiver) = bounded::<CubeResult>(result_capacity.max(1));
        let in_flight = Arc::new(AtomicU64::new(0));

        for i in 0..thread_count.max(1) {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let in_flight = Arc::clone(&in_flight);
            let mut generator = handle.worker();

            std::thread::Builder::new()
                .name(format!("cube-gen-worker-{i}"))
                .spawn(move || {
                    while let Ok(task) = receiver.recv() {
                        if task.cancelled.load(Ordering::Relaxed) {
                            in_flight.fetch_sub(1, Ordering::Relaxed);
                            continue;
                        }

                        let start = Instant::now();
                        let outcome = generator.generate_cube(task.pos);
                        let elapsed = start.elapsed().as_micros() as u64;
                        trace!(cube = %task.pos, elapsed_us = elapsed, "worker finished cube");

                        if !task.cancelled.load(Ordering::Relaxed) {
                            let result = match outcome {
                                Ok(primer) => Ok(GeneratedCube {
                                    pos: task.pos,
                                    primer,
                                    generation_time_us: elapsed,
                                }),
                                Err(error) => {
                                    warn!(cube = %task.pos, %error, "cube generation failed");
                                    Err(FailedCube { pos: task.pos, error })
                                }
                            };
                            let _ = sender.send(result);
                        }

                        in_flight.fetch_sub(1, Ordering::Relaxed);
                    }
                })?;
        }

        Ok(Self {
            task_sender,
            result_receiver,
            active_tasks: Arc::new(DashMap::new()),
            in_flight,
        })
    }

    /// Pool sized to the machine, leaving two cores for the host.
    pub fn with_defaults(handle: GeneratorHandle) -> io::Result<Self> {
        let cpus = num_cpus::get().max(2);
        let threads = (cpus - 2).max(1);
        Self::new(handle, threads, 64, 128)
    }

    /// Queues a cube. Returns `Err(pos)` if the queue is full.
    pub fn submit(&self, pos: CubePos) -> Result<(), CubePos> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.active_tasks.insert(pos, Arc::clone(&cancelled));
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        self.task_sender
            .try_send(QueuedCube { pos, cancelled })
            .map_err(|e| {
                self.in_flight.fetch_sub(1, Ordering::Relaxed);
                let pos = e.into_inner().pos;
                self.active_tasks.remove(&pos);
                pos
            })
    }

    /// Cancels a pending cube. No-op once its result has been drained.
    pub fn cancel(&self, pos: &CubePos) {
        if let Some((_, cancelled)) = self.active_tasks.remove(pos) {
            cancelled.store(true, Ordering::Relaxed);
        }
    }

    /// Takes every result that is ready without blocking.
    pub fn drain_results(&self) -> Vec<CubeResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            let pos = match &result {
                Ok(cube) => cube.pos,
                Err(failed) => failed.pos,
            };
            self.active_tasks.remove(&pos);
            results.push(result);
        }
        results
    }

    /// Queued or executing cubes.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn is_pending(&self, pos: &CubePos) -> bool {
        self.active_tasks.contains_key(pos)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use cubicgen_config::GeneratorSettings;

    fn handle() -> GeneratorHandle {
        GeneratorHandle::new(42, GeneratorSettings::default()).unwrap()
    }

    fn collect(generator: &AsyncCubeGenerator, expected: usize) -> Vec<CubeResult> {
        let mut results = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(60);
        while results.len() < expected && Instant::now() < deadline {
            results.extend(generator.drain_results());
            if results.len() < expected {
                std::thread::sleep(Duration::from_millis(10));
            }
        }
        results
    }

    #[test]
    fn test_concurrent_generation_is_safe() {
        let generator = AsyncCubeGenerator::new(handle(), 4, 32, 64).unwrap();
        let mut submitted = 0;
        for x in 0..4 {
            for z in 0..4 {
                if generator.submit(CubePos::new(x, 3, z)).is_ok() {
                    submitted += 1;
                }
            }
        }
        let results = collect(&generator, submitted);
        assert_eq!(results.len(), submitted, "got {}/{submitted}", results.len());
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_pool_matches_single_worker() {
        let h = handle();
        let mut single = h.worker();
        let generator = AsyncCubeGenerator::new(h, 3, 16, 16).unwrap();
        let cubes = [CubePos::new(0, 4, 0), CubePos::new(-3, 2, 7), CubePos::new(9, 0, -1)];
        for pos in cubes {
            generator.submit(pos).unwrap();
        }
        for result in collect(&generator, cubes.len()) {
            let cube = result.unwrap();
            assert_eq!(cube.primer, single.generate_cube(cube.pos).unwrap(), "at {}", cube.pos);
        }
    }

    #[test]
    fn test_cancelled_cube_no_longer_pending() {
        let generator = AsyncCubeGenerator::new(handle(), 1, 64, 64).unwrap();
        let pos = CubePos::new(50, 1, 50);
        generator.submit(pos).unwrap();
        generator.cancel(&pos);
        assert!(!generator.is_pending(&pos));
        // The worker may already have finished; either way nothing is left queued.
        let deadline = Instant::now() + Duration::from_secs(10);
        while generator.in_flight_count() > 0 && Instant::now() < deadline {
            let _ = generator.drain_results();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(generator.in_flight_count(), 0);
    }

    #[test]
    fn test_in_flight_count() {
        let generator = AsyncCubeGenerator::new(handle(), 1, 64, 64).unwrap();
        assert_eq!(generator.in_flight_count(), 0);
        for i in 0..5 {
            let _ = generator.submit(CubePos::new(i, 0, 0));
        }
        assert!(generator.in_flight_count() > 0);
        let results = collect(&generator, 5);
        assert_eq!(results.len(), 5);
    }
}
