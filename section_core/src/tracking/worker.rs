//! Background recompute thread.
//!
//! The worker owns no session state. It receives [`RecomputeJob`] snapshots,
//! runs them and sends the outcome back; the tracker applies outcomes on its
//! own thread. Dropping the worker closes the job channel and joins the thread.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;

use crate::analysis::AnalysisReport;
use crate::errors::{CalcResult, SectionError};
use crate::session::RecomputeJob;

/// Outcome of one job, tagged with the sequence number it was submitted under
pub type WorkerOutcome = (u64, CalcResult<AnalysisReport>);

pub struct RecomputeWorker {
    jobs: Option<Sender<(u64, RecomputeJob)>>,
    outcomes: Receiver<WorkerOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl RecomputeWorker {
    pub fn spawn() -> CalcResult<Self> {
        let (job_tx, job_rx) = mpsc::channel::<(u64, RecomputeJob)>();
        let (out_tx, out_rx) = mpsc::channel::<WorkerOutcome>();

        let handle = thread::Builder::new()
            .name("section-recompute".to_string())
            .spawn(move || {
                for (sequence, job) in job_rx {
                    let outcome = catch_unwind(AssertUnwindSafe(|| job.run())).unwrap_or_else(|panic| {
                        Err(SectionError::TrackingFailed {
                            reason: format!("recompute panicked: {}", panic_message(panic.as_ref())),
                        })
                    });
                    if out_tx.send((sequence, outcome)).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| SectionError::Internal {
                message: format!("failed to spawn recompute worker: {}", e),
            })?;

        debug!("Recompute worker started");
        Ok(RecomputeWorker {
            jobs: Some(job_tx),
            outcomes: out_rx,
            handle: Some(handle),
        })
    }

    pub fn submit(&self, sequence: u64, job: RecomputeJob) -> CalcResult<()> {
        self.jobs
            .as_ref()
            .ok_or_else(disconnected)?
            .send((sequence, job))
            .map_err(|_| disconnected())
    }

    /// Non-blocking check for a finished job
    pub fn try_outcome(&self) -> CalcResult<Option<WorkerOutcome>> {
        match self.outcomes.try_recv() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(disconnected()),
        }
    }

    /// Wait up to `timeout` for a finished job
    pub fn wait_outcome(&self, timeout: Duration) -> CalcResult<Option<WorkerOutcome>> {
        match self.outcomes.recv_timeout(timeout) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(disconnected()),
        }
    }
}

impl Drop for RecomputeWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        debug!("Recompute worker joined");
    }
}

fn disconnected() -> SectionError {
    SectionError::TrackingFailed {
        reason: "recompute worker disconnected".to_string(),
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Curve;
    use crate::materials::MaterialCatalog;
    use crate::section::BoundaryId;
    use crate::session::SectionSession;

    #[test]
    fn test_worker_runs_jobs_in_order() {
        let mut session = SectionSession::new(MaterialCatalog::standard().clone());
        session.set_outline(BoundaryId::new(), Curve::rectangle(0.0, 0.0, 10.0, 10.0)).unwrap();
        let worker = RecomputeWorker::spawn().unwrap();
        worker.submit(1, session.job().unwrap()).unwrap();
        worker.submit(2, session.job().unwrap()).unwrap();

        let (first, r1) = worker.wait_outcome(Duration::from_secs(10)).unwrap().unwrap();
        let (second, r2) = worker.wait_outcome(Duration::from_secs(10)).unwrap().unwrap();
        assert_eq!((first, second), (1, 2));
        assert_eq!(r1.unwrap().properties, r2.unwrap().properties);
        assert!(worker.try_outcome().unwrap().is_none());
    }

    #[test]
    fn test_drop_joins_idle_worker() {
        let worker = RecomputeWorker::spawn().unwrap();
        drop(worker);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
    }
}
