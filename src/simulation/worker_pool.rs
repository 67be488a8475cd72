//! Fixed-size worker pool over a block-seeded output buffer.
//!
//! The output is cut into fixed-size blocks. Block `i` always draws from a
//! random source seeded by `block_seed(base, i)`, and workers take whole
//! blocks, so the filled buffer does not depend on how many workers ran.

use crate::core::error::VarError;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Paths simulated from one block seed.
pub const DEFAULT_PATHS_PER_BLOCK: usize = 256;

const BLOCK_SEED_STRIDE: u64 = 6_364_136_223_846_793_005;

/// Number of workers to use for `tasks` units of work.
///
/// Uses `configured` when given, otherwise the size of the global rayon
/// pool. Never returns more workers than tasks, nor zero.
pub fn resolve_worker_count(configured: Option<usize>, tasks: usize) -> Result<usize, VarError> {
    let workers = match configured {
        Some(0) => return Err(VarError::invalid("worker_count", "must be at least 1")),
        Some(n) => n,
        None => rayon::current_num_threads(),
    };
    Ok(workers.min(tasks).max(1))
}

/// Split `total` units across `workers`.
///
/// The first `total % workers` workers take one extra unit, so the sizes
/// always sum to `total`.
pub fn partition(total: usize, workers: usize) -> Vec<usize> {
    if workers == 0 {
        return Vec::new();
    }
    let base = total / workers;
    let remainder = total % workers;
    (0..workers)
        .map(|w| base + usize::from(w < remainder))
        .collect()
}

/// Number of `block_size` blocks needed to cover `len` slots.
pub fn block_count(len: usize, block_size: usize) -> usize {
    if block_size == 0 {
        return 0;
    }
    (len + block_size - 1) / block_size
}

/// Seed of block `block` under `base`.
pub fn block_seed(base: u64, block: usize) -> u64 {
    base.wrapping_add((block as u64).wrapping_mul(BLOCK_SEED_STRIDE))
}

/// Fill `output` block by block on a pool of `workers` threads.
///
/// Blocks are dealt to workers with [`partition`], so the first
/// `blocks % workers` workers take one extra block. `work` receives each
/// block together with a `StdRng` seeded from [`block_seed`].
///
/// Blocks until every worker has finished. A worker error or panic fails
/// the whole run. `deadline` is checked before each block is started and
/// once more after the join; a block already running is not interrupted.
/// On failure `output` must be discarded by the caller.
pub fn run_blocks<F>(
    output: &mut [f64],
    block_size: usize,
    workers: usize,
    base_seed: u64,
    deadline: Option<Duration>,
    work: F,
) -> Result<(), VarError>
where
    F: Fn(&mut [f64], &mut StdRng) -> Result<(), VarError> + Sync,
{
    if block_size == 0 {
        return Err(VarError::invalid("paths_per_block", "must be at least 1"));
    }
    if workers == 0 {
        return Err(VarError::invalid("worker_count", "must be at least 1"));
    }

    let blocks = block_count(output.len(), block_size);
    let shares = partition(blocks, workers);

    // Each region pairs a worker's slice with the index of its first block.
    let mut regions: Vec<(usize, &mut [f64])> = Vec::with_capacity(shares.len());
    let mut rest = output;
    let mut first_block = 0;
    for &share in &shares {
        let len = (share * block_size).min(rest.len());
        let (region, tail) = std::mem::take(&mut rest).split_at_mut(len);
        rest = tail;
        regions.push((first_block, region));
        first_block += share;
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("var-worker-{}", i))
        .build()
        .map_err(|e| VarError::SimulationFailure(format!("cannot start worker pool: {}", e)))?;

    let started = Instant::now();
    let work = &work;
    let joined = panic::catch_unwind(AssertUnwindSafe(|| {
        pool.install(|| {
            regions
                .into_par_iter()
                .try_for_each(|(first_block, region)| {
                    for (offset, block) in region.chunks_mut(block_size).enumerate() {
                        check_deadline(started, deadline)?;
                        let mut rng = StdRng::seed_from_u64(block_seed(base_seed, first_block + offset));
                        work(block, &mut rng)?;
                    }
                    Ok::<(), VarError>(())
                })
        })
    }));

    match joined {
        Ok(outcome) => outcome?,
        Err(payload) => {
            return Err(VarError::SimulationFailure(format!(
                "worker panicked: {}",
                panic_message(payload.as_ref())
            )))
        }
    }

    debug!(
        "{} blocks on {} workers joined after {:?}",
        blocks,
        workers,
        started.elapsed()
    );
    check_deadline(started, deadline)
}

fn check_deadline(started: Instant, deadline: Option<Duration>) -> Result<(), VarError> {
    match deadline {
        Some(limit) if started.elapsed() > limit => Err(VarError::SimulationFailure(format!(
            "simulation exceeded the {:?} deadline after {:?}",
            limit,
            started.elapsed()
        ))),
        _ => Ok(()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
