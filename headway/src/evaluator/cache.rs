use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::evaluator::cache_policy::CachePolicy;
use crate::evaluator::calendar::CalendarResolver;
use crate::evaluator::engine::TraversalEngine;
use crate::evaluator::run_index::RunIndex;
use crate::schedule::{read_calendar_store, read_run_rows, ScheduleError, ScheduleSource};

/// owns the one-time load of the calendar resolver and run index from
/// the persisted store, and hands out the immutable engine for querying.
///
/// the first load is the only expensive operation; afterwards every
/// query reuses the in-memory structures. callers share the engine
/// across worker threads via the returned `Arc`; nothing mutates after
/// load, so no locking is required.
pub struct ScheduleCache {
    source: ScheduleSource,
    policy: CachePolicy,
    engine: Option<Arc<TraversalEngine>>,
}

impl ScheduleCache {
    pub fn new(source: ScheduleSource, policy: CachePolicy) -> Self {
        Self {
            source,
            policy,
            engine: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    /// discards the loaded structures; the next query pays the full load
    /// cost again.
    pub fn invalidate(&mut self) {
        self.engine = None;
    }

    /// returns the loaded engine, loading first when required. under
    /// `CachePolicy::OncePerProcess` an already-loaded engine is reused;
    /// under `CachePolicy::EverySolve` every call rebuilds from the
    /// store.
    pub fn ensure_loaded(&mut self) -> Result<Arc<TraversalEngine>, ScheduleError> {
        match (&self.engine, self.policy) {
            (Some(engine), CachePolicy::OncePerProcess) => Ok(engine.clone()),
            _ => self.load(),
        }
    }

    /// unconditionally rebuilds the engine from the persisted store.
    pub fn load(&mut self) -> Result<Arc<TraversalEngine>, ScheduleError> {
        self.load_with_cancel(&AtomicBool::new(false))
    }

    /// rebuilds the engine, polling `cancel` between load phases. on
    /// cancellation (or any load failure) the cache is left unloaded,
    /// never partially loaded.
    pub fn load_with_cancel(
        &mut self,
        cancel: &AtomicBool,
    ) -> Result<Arc<TraversalEngine>, ScheduleError> {
        self.engine = None;
        let started = Instant::now();
        let engine = Arc::new(build_engine(&self.source, cancel)?);
        log::info!(
            "schedule cache loaded in {:.1}s: {} runs across {} segments",
            started.elapsed().as_secs_f64(),
            engine.index().run_count(),
            engine.index().segment_count()
        );
        self.engine = Some(engine.clone());
        Ok(engine)
    }
}

fn build_engine(
    source: &ScheduleSource,
    cancel: &AtomicBool,
) -> Result<TraversalEngine, ScheduleError> {
    check_cancelled(cancel)?;
    let rows = read_run_rows(&source.runs_file)?;
    check_cancelled(cancel)?;
    let store = read_calendar_store(&source.calendars_file)?;
    check_cancelled(cancel)?;
    let index = RunIndex::from_rows(rows)?;
    check_cancelled(cancel)?;
    let calendar = CalendarResolver::new(store);
    Ok(TraversalEngine::new(calendar, index))
}

fn check_cancelled(cancel: &AtomicBool) -> Result<(), ScheduleError> {
    if cancel.load(Ordering::Relaxed) {
        Err(ScheduleError::LoadCancelled)
    } else {
        Ok(())
    }
}
