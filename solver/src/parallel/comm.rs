use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use crate::parallel::TopologyError;

/// Rank that owns the authoritative forces, integrates and writes output.
pub const ROOT: usize = 0;

/// Collective operations between the ranks of one run.
///
/// Ranks never talk point to point. Everything goes through a barrier, a
/// broadcast from the root or a reduction to the root. Every participant must
/// call the same collectives in the same order with equally sized buffers.
pub trait Communicator: Send + Sync {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }

    fn barrier(&self) -> Result<(), TopologyError>;

    /// Copies the root's `data` into `data` of every other rank.
    fn broadcast(&self, data: &mut [f64]) -> Result<(), TopologyError>;

    /// Element-wise sum of `data` over all ranks. Only the root's buffer holds
    /// the result afterwards, other buffers are left untouched.
    fn reduce_sum(&self, data: &mut [f64]) -> Result<(), TopologyError>;

    /// Maximum of `value` over all ranks.
    fn reduce_max(&self, value: f64) -> Result<f64, TopologyError>;

    /// Fails on every rank as soon as one rank reports `failed`, naming the
    /// highest failing rank.
    fn agree_on_status(&self, failed: bool) -> Result<(), TopologyError> {
        let flag = if failed { (self.rank() + 1) as f64 } else { 0.0 };
        let worst = self.reduce_max(flag)?;
        if worst > 0.0 {
            Err(TopologyError::PeerFailed { rank: worst as usize - 1 })
        } else {
            Ok(())
        }
    }
}

/// World with a single rank. Every collective is a no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        ROOT
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) -> Result<(), TopologyError> {
        Ok(())
    }

    fn broadcast(&self, _data: &mut [f64]) -> Result<(), TopologyError> {
        Ok(())
    }

    fn reduce_sum(&self, _data: &mut [f64]) -> Result<(), TopologyError> {
        Ok(())
    }

    fn reduce_max(&self, value: f64) -> Result<f64, TopologyError> {
        Ok(value)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Generation {
    arrived: usize,
    count: u64,
    aborted: bool,
}

/// Barrier that can be torn down. After `abort` every pending and future
/// `wait` returns [TopologyError::Aborted] instead of blocking.
struct Rendezvous {
    size: usize,
    generation: Mutex<Generation>,
    released: Condvar,
}

impl Rendezvous {
    fn new(size: usize) -> Self {
        Rendezvous {
            size,
            generation: Mutex::new(Generation {
                arrived: 0,
                count: 0,
                aborted: false,
            }),
            released: Condvar::new(),
        }
    }

    fn wait(&self) -> Result<(), TopologyError> {
        let mut generation = lock(&self.generation);
        if generation.aborted {
            return Err(TopologyError::Aborted);
        }
        let count = generation.count;
        generation.arrived += 1;
        if generation.arrived == self.size {
            generation.arrived = 0;
            generation.count = count.wrapping_add(1);
            self.released.notify_all();
            return Ok(());
        }
        while generation.count == count && !generation.aborted {
            generation = self.released.wait(generation).unwrap_or_else(PoisonError::into_inner);
        }
        if generation.count == count {
            Err(TopologyError::Aborted)
        } else {
            Ok(())
        }
    }

    fn abort(&self) {
        lock(&self.generation).aborted = true;
        self.released.notify_all();
    }
}

struct Shared {
    size: usize,
    barrier: Rendezvous,
    lengths: Mutex<Vec<usize>>,
    broadcast: Mutex<Vec<f64>>,
    sum: Mutex<Vec<f64>>,
    max: Mutex<f64>,
}

/// Handle of one rank of a [LocalCluster].
pub struct LocalComm {
    rank: usize,
    shared: Arc<Shared>,
}

impl LocalComm {
    /// Every rank publishes its buffer length, all of them check the full
    /// list, so a mismatch is reported by every rank at the same collective.
    fn agree_on_length(&self, len: usize) -> Result<(), TopologyError> {
        lock(&self.shared.lengths)[self.rank] = len;
        self.shared.barrier.wait()?;
        let lengths = lock(&self.shared.lengths).clone();
        self.shared.barrier.wait()?;
        if lengths.iter().all(|&l| l == len) {
            Ok(())
        } else {
            Err(TopologyError::LengthMismatch { lengths })
        }
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn barrier(&self) -> Result<(), TopologyError> {
        self.shared.barrier.wait()
    }

    fn broadcast(&self, data: &mut [f64]) -> Result<(), TopologyError> {
        self.agree_on_length(data.len())?;
        if self.is_root() {
            let mut buffer = lock(&self.shared.broadcast);
            buffer.clear();
            buffer.extend_from_slice(data);
        }
        self.shared.barrier.wait()?;
        if !self.is_root() {
            data.copy_from_slice(&lock(&self.shared.broadcast));
        }
        self.shared.barrier.wait()?;
        Ok(())
    }

    fn reduce_sum(&self, data: &mut [f64]) -> Result<(), TopologyError> {
        self.agree_on_length(data.len())?;
        {
            let mut sum = lock(&self.shared.sum);
            if sum.len() != data.len() {
                sum.clear();
                sum.resize(data.len(), 0.0);
            }
            sum.iter_mut().zip(data.iter()).for_each(|(acc, x)| *acc += x);
        }
        self.shared.barrier.wait()?;
        if self.is_root() {
            let mut sum = lock(&self.shared.sum);
            data.copy_from_slice(&sum);
            sum.iter_mut().for_each(|x| *x = 0.0);
        }
        self.shared.barrier.wait()?;
        Ok(())
    }

    fn reduce_max(&self, value: f64) -> Result<f64, TopologyError> {
        self.agree_on_length(1)?;
        {
            let mut max = lock(&self.shared.max);
            *max = max.max(value);
        }
        self.shared.barrier.wait()?;
        let result = *lock(&self.shared.max);
        self.shared.barrier.wait()?;
        if self.is_root() {
            *lock(&self.shared.max) = f64::NEG_INFINITY;
        }
        self.shared.barrier.wait()?;
        Ok(result)
    }
}

/// Tears the barrier down when its rank leaves `f`. Ranks that are still
/// running can only be waiting for the one that left.
struct LeaveWorld(Arc<Shared>);

impl Drop for LeaveWorld {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("Rank panicked, releasing the others");
        }
        self.0.barrier.abort();
    }
}

/// Runs the ranks of a world as threads of this process. They share nothing
/// but the collective buffers.
pub struct LocalCluster;

impl LocalCluster {
    pub fn communicators(size: usize) -> Result<Vec<LocalComm>, TopologyError> {
        if size == 0 {
            return Err(TopologyError::EmptyWorld);
        }
        let shared = Arc::new(Shared {
            size,
            barrier: Rendezvous::new(size),
            lengths: Mutex::new(vec![0; size]),
            broadcast: Mutex::new(vec![]),
            sum: Mutex::new(vec![]),
            max: Mutex::new(f64::NEG_INFINITY),
        });
        Ok((0..size)
            .map(|rank| LocalComm {
                rank,
                shared: shared.clone(),
            })
            .collect())
    }

    /// Calls `f` once per rank, each on its own thread, and returns the
    /// results ordered by rank. A rank that returns early or panics releases
    /// the others from their collectives with [TopologyError::Aborted]; a
    /// panic is passed on after all ranks are joined.
    pub fn run<F, R>(size: usize, f: F) -> Result<Vec<R>, TopologyError>
    where
        F: Fn(LocalComm) -> R + Sync,
        R: Send,
    {
        let communicators = Self::communicators(size)?;
        let f = &f;
        Ok(thread::scope(|s| {
            let handles: Vec<_> = communicators
                .into_iter()
                .map(|comm| {
                    let guard = LeaveWorld(comm.shared.clone());
                    s.spawn(move || {
                        let _guard = guard;
                        f(comm)
                    })
                })
                .collect();
            let joined: Vec<_> = handles.into_iter().map(|handle| handle.join()).collect();
            joined
                .into_iter()
                .map(|result| result.unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        }))
    }
}
