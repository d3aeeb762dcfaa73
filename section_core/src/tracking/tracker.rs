//! Poll-based change tracker.
//!
//! ```text
//!           enable (outline present)
//!   Idle ───────────────────────────▶ Watching ◀──────────────┐
//!    ▲                                   │ poll: fingerprint   │ publish /
//!    │ disable, outline removed,         │ changed             │ report
//!    │ tick panicked                     ▼                     │
//!    └──────────────────────────────── Recomputing ────────────┘
//! ```
//!
//! The host drives the tracker by calling [`ChangeTracker::tick`] often (every
//! few tens of milliseconds is fine). A tick only polls the source once the
//! poll interval has elapsed; [`ChangeTracker::hint`] pulls the next poll
//! forward to the hint interval.
//!
//! In [`RecomputeMode::Offload`] the pipeline runs on a [`RecomputeWorker`].
//! Outcomes are applied only by [`ChangeTracker::collect`] or
//! [`ChangeTracker::wait`] on the owning thread. While a job is in flight every
//! tick is dropped and counted.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisReport;
use crate::errors::{CalcResult, SectionError};
use crate::report::ResultTable;
use crate::section::BoundaryId;
use crate::session::SectionSession;
use crate::visualize::{build_artifacts, VisualArtifacts};

use super::fingerprint::GeometryFingerprint;
use super::source::GeometrySource;
use super::worker::{panic_message, RecomputeWorker, WorkerOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerState {
    Idle,
    Watching,
    Recomputing,
}

/// Where the pipeline runs after a detected change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecomputeMode {
    /// On the caller's thread, inside `tick`
    #[default]
    Inline,
    /// On an owned worker thread
    Offload,
}

/// Results handed to the sink after a successful recompute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub sequence: u64,
    pub published_at: DateTime<Utc>,
    pub report: AnalysisReport,
    pub table: ResultTable,
    /// Missing if the stress mesh could not be built in time
    pub artifacts: Option<VisualArtifacts>,
}

/// Receiver of tracker output.
pub trait ResultSink {
    fn publish(&mut self, publication: &Publication);

    /// Called for pipeline errors (tracking continues) and for
    /// [`SectionError::TrackingFailed`] (tracking has stopped).
    fn report(&mut self, error: &SectionError);
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tracker is idle
    Inactive,
    /// Poll interval has not elapsed
    NotDue,
    /// Polled; nothing changed
    Unchanged,
    /// Recomputed inline and published
    Published { sequence: u64 },
    /// Handed to the worker
    Submitted { sequence: u64 },
    /// Change applied but the pipeline reported an error
    Errored,
    /// The outline disappeared; tracker is idle
    OutlineRemoved,
    /// A recompute was in flight; tick ignored
    Dropped,
    /// The tick panicked or the worker died; tracker is idle
    Failed,
}

pub struct ChangeTracker<S: GeometrySource, K: ResultSink> {
    session: SectionSession,
    source: S,
    sink: K,
    mode: RecomputeMode,
    state: TrackerState,
    outline: Option<(BoundaryId, GeometryFingerprint)>,
    hollows: Vec<(BoundaryId, GeometryFingerprint)>,
    /// Recompute on the next poll even if nothing changed
    dirty: bool,
    next_poll: Option<Instant>,
    worker: Option<RecomputeWorker>,
    in_flight: Option<u64>,
    sequence: u64,
    dropped_ticks: u64,
}

impl<S: GeometrySource, K: ResultSink> ChangeTracker<S, K> {
    pub fn new(session: SectionSession, source: S, sink: K, mode: RecomputeMode) -> Self {
        ChangeTracker {
            session,
            source,
            sink,
            mode,
            state: TrackerState::Idle,
            outline: None,
            hollows: Vec::new(),
            dirty: false,
            next_poll: None,
            worker: None,
            in_flight: None,
            sequence: 0,
            dropped_ticks: 0,
        }
    }

    /// Start watching the session's boundaries.
    ///
    /// The first due tick recomputes and publishes unconditionally.
    pub fn enable(&mut self, now: Instant) -> CalcResult<()> {
        if self.state != TrackerState::Idle {
            return Ok(());
        }
        let (outline_id, outline_curve) = self
            .session
            .outline()
            .cloned()
            .ok_or_else(|| SectionError::missing_field("outline"))?;

        if self.mode == RecomputeMode::Offload {
            self.worker = Some(RecomputeWorker::spawn()?);
        }
        self.outline = Some((outline_id, GeometryFingerprint::of(&outline_curve)));
        self.hollows = self
            .session
            .hollows()
            .iter()
            .map(|(id, curve)| (*id, GeometryFingerprint::of(curve)))
            .collect();
        self.dirty = true;
        self.next_poll = Some(now);
        self.state = TrackerState::Watching;
        info!("Change tracking enabled ({} hollows)", self.hollows.len());
        Ok(())
    }

    /// Stop watching and release the worker.
    pub fn disable(&mut self) {
        if self.state == TrackerState::Idle {
            return;
        }
        self.state = TrackerState::Idle;
        self.outline = None;
        self.hollows.clear();
        self.next_poll = None;
        self.in_flight = None;
        self.worker = None;
        info!("Change tracking disabled");
    }

    /// A host add/delete notification: poll soon.
    pub fn hint(&mut self, now: Instant) {
        if self.state == TrackerState::Idle {
            return;
        }
        let soon = now + self.session.settings().hint_interval();
        self.next_poll = Some(self.next_poll.map_or(soon, |t| t.min(soon)));
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        match self.state {
            TrackerState::Idle => TickOutcome::Inactive,
            TrackerState::Recomputing => {
                self.dropped_ticks += 1;
                warn!(
                    "Tick dropped: recompute {:?} in flight ({} dropped so far)",
                    self.in_flight, self.dropped_ticks
                );
                TickOutcome::Dropped
            }
            TrackerState::Watching => {
                if self.next_poll.is_some_and(|t| now < t) {
                    return TickOutcome::NotDue;
                }
                self.next_poll = Some(now + self.session.settings().poll_interval());
                match catch_unwind(AssertUnwindSafe(|| self.poll())) {
                    Ok(outcome) => outcome,
                    Err(panic) => self.fail(format!("tick panicked: {}", panic_message(panic.as_ref()))),
                }
            }
        }
    }

    /// Apply a finished worker job, if any. Never blocks.
    pub fn collect(&mut self) -> Option<TickOutcome> {
        let outcome = self.worker.as_ref()?.try_outcome();
        self.receive(outcome)
    }

    /// Wait up to `timeout` for the in-flight job and apply it.
    pub fn wait(&mut self, timeout: Duration) -> Option<TickOutcome> {
        self.in_flight?;
        let outcome = self.worker.as_ref()?.wait_outcome(timeout);
        self.receive(outcome)
    }

    fn receive(&mut self, outcome: CalcResult<Option<WorkerOutcome>>) -> Option<TickOutcome> {
        match outcome {
            Ok(Some((sequence, result))) if Some(sequence) == self.in_flight => Some(self.finish(sequence, result)),
            Ok(Some((sequence, _))) => {
                debug!("Discarding stale recompute {}", sequence);
                None
            }
            Ok(None) => None,
            Err(e) => Some(self.fail_with(e)),
        }
    }

    fn poll(&mut self) -> TickOutcome {
        if let Err(e) = self.source.refresh() {
            warn!("Geometry source refresh failed: {}", e);
            self.sink.report(&e);
            return TickOutcome::Errored;
        }

        let Some((outline_id, outline_fp)) = self.outline else {
            return self.fail("watching without an outline".to_string());
        };
        let Some(outline_curve) = self.source.fetch(outline_id) else {
            warn!("Outline {} removed; tracking stops", outline_id);
            self.session.clear();
            self.disable();
            return TickOutcome::OutlineRemoved;
        };

        let mut changed = std::mem::take(&mut self.dirty);
        let new_outline_fp = GeometryFingerprint::of(&outline_curve);
        changed |= new_outline_fp != outline_fp;

        // Curves always come from the source; fingerprints advance even when
        // the poll is rejected.
        let mut hollows = Vec::with_capacity(self.hollows.len());
        let mut fingerprints = Vec::with_capacity(self.hollows.len());
        for &(id, fp) in &self.hollows {
            match self.source.fetch(id) {
                None => {
                    debug!("Hollow {} removed", id);
                    changed = true;
                }
                Some(curve) => {
                    let new_fp = GeometryFingerprint::of(&curve);
                    changed |= new_fp != fp;
                    hollows.push((id, curve));
                    fingerprints.push((id, new_fp));
                }
            }
        }

        self.outline = Some((outline_id, new_outline_fp));
        self.hollows = fingerprints;
        if !changed {
            return TickOutcome::Unchanged;
        }

        debug!("Geometry changed; revalidating {} hollows", hollows.len());
        if let Err(e) = self.session.set_geometry((outline_id, outline_curve), hollows) {
            warn!("Changed geometry rejected: {}", e);
            self.sink.report(&e);
            return TickOutcome::Errored;
        }
        self.recompute()
    }

    fn recompute(&mut self) -> TickOutcome {
        self.sequence += 1;
        let sequence = self.sequence;
        let job = match self.session.job() {
            Ok(job) => job,
            Err(e) => {
                self.sink.report(&e);
                return TickOutcome::Errored;
            }
        };

        self.state = TrackerState::Recomputing;
        match (&self.worker, self.mode) {
            (Some(worker), RecomputeMode::Offload) => {
                if let Err(e) = worker.submit(sequence, job) {
                    return self.fail_with(e);
                }
                self.in_flight = Some(sequence);
                TickOutcome::Submitted { sequence }
            }
            _ => {
                self.in_flight = Some(sequence);
                let outcome = job.run();
                self.finish(sequence, outcome)
            }
        }
    }

    fn finish(&mut self, sequence: u64, outcome: CalcResult<AnalysisReport>) -> TickOutcome {
        self.state = TrackerState::Watching;
        self.in_flight = None;

        let outcome = match outcome {
            Err(e @ SectionError::TrackingFailed { .. }) => return self.fail_with(e),
            other => other,
        };
        let report = match self.session.apply(outcome) {
            Ok(report) => report.clone(),
            Err(e) => {
                warn!("Recompute {} failed: {}", sequence, e);
                self.sink.report(&e);
                return TickOutcome::Errored;
            }
        };

        let artifacts = self.session.section().and_then(|section| {
            build_artifacts(&report, section.plane(), self.session.load(), self.session.settings())
                .map_err(|e| debug!("Skipping visualization artifacts: {}", e))
                .ok()
        });
        let publication = Publication {
            sequence,
            published_at: Utc::now(),
            table: ResultTable::build(
                &report.properties,
                report.utilization.as_ref(),
                self.session.settings().display_unit,
            ),
            report,
            artifacts,
        };
        self.sink.publish(&publication);
        TickOutcome::Published { sequence }
    }

    fn fail(&mut self, reason: String) -> TickOutcome {
        self.fail_with(SectionError::TrackingFailed { reason })
    }

    fn fail_with(&mut self, error: SectionError) -> TickOutcome {
        warn!("Change tracking failed: {}", error);
        self.disable();
        self.sink.report(&error);
        TickOutcome::Failed
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn mode(&self) -> RecomputeMode {
        self.mode
    }

    /// Ticks ignored because a recompute was in flight
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }

    pub fn session(&self) -> &SectionSession {
        &self.session
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_parts(self) -> (SectionSession, S, K) {
        (self.session, self.source, self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Curve, Point3};
    use crate::materials::MaterialCatalog;
    use crate::tracking::MemorySource;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct RecordingSink {
        publications: Vec<Publication>,
        errors: Vec<SectionError>,
    }

    impl ResultSink for RecordingSink {
        fn publish(&mut self, publication: &Publication) {
            self.publications.push(publication.clone());
        }

        fn report(&mut self, error: &SectionError) {
            self.errors.push(error.clone());
        }
    }

    struct PanickingSource;

    impl GeometrySource for PanickingSource {
        fn fetch(&self, _id: BoundaryId) -> Option<Curve> {
            panic!("host went away")
        }
    }

    const SECOND: Duration = Duration::from_secs(1);

    struct Fixture {
        outline: BoundaryId,
        hollow: BoundaryId,
        session: SectionSession,
        source: MemorySource,
    }

    fn fixture() -> Fixture {
        let outline = BoundaryId::new();
        let hollow = BoundaryId::new();
        let outline_curve = Curve::rectangle(0.0, 0.0, 100.0, 100.0);
        let hollow_curve = Curve::centered_rectangle(50.0, 50.0, 40.0, 40.0);

        let mut session = SectionSession::new(MaterialCatalog::standard().clone());
        session
            .set_geometry((outline, outline_curve.clone()), vec![(hollow, hollow_curve.clone())])
            .unwrap();
        let mut source = MemorySource::new();
        source.set(outline, outline_curve);
        source.set(hollow, hollow_curve);
        Fixture {
            outline,
            hollow,
            session,
            source,
        }
    }

    fn last_area(tracker: &ChangeTracker<MemorySource, RecordingSink>) -> f64 {
        tracker.sink().publications.last().unwrap().report.properties.area_mm2
    }

    #[test]
    fn test_enable_requires_outline() {
        let session = SectionSession::new(MaterialCatalog::standard().clone());
        let mut tracker = ChangeTracker::new(session, MemorySource::new(), RecordingSink::default(), RecomputeMode::Inline);
        let err = tracker.enable(Instant::now()).unwrap_err();
        assert_eq!(err, SectionError::missing_field("outline"));
        assert_eq!(tracker.state(), TrackerState::Idle);
        assert_eq!(tracker.tick(Instant::now()), TickOutcome::Inactive);
    }

    #[test]
    fn test_poll_cadence_and_change_detection() {
        let f = fixture();
        let mut tracker = ChangeTracker::new(f.session, f.source, RecordingSink::default(), RecomputeMode::Inline);
        let t0 = Instant::now();
        tracker.enable(t0).unwrap();

        assert_eq!(tracker.tick(t0), TickOutcome::Published { sequence: 1 });
        assert_relative_eq!(last_area(&tracker), 8400.0, max_relative = 1e-9);
        assert_eq!(tracker.tick(t0 + SECOND / 2), TickOutcome::NotDue);
        assert_eq!(tracker.tick(t0 + SECOND), TickOutcome::Unchanged);

        tracker.source_mut().set(f.outline, Curve::rectangle(0.0, 0.0, 100.0, 120.0));
        assert_eq!(tracker.tick(t0 + SECOND * 2), TickOutcome::Published { sequence: 2 });
        assert_relative_eq!(last_area(&tracker), 10_400.0, max_relative = 1e-9);
        assert_eq!(tracker.state(), TrackerState::Watching);

        let publication = tracker.sink().publications.last().unwrap();
        assert_eq!(publication.table.len(), 20);
        assert!(publication.artifacts.is_some());
    }

    #[test]
    fn test_high_accuracy_doubles_cadence() {
        let mut f = fixture();
        f.session.set_settings(crate::settings::AnalysisSettings::high_accuracy()).unwrap();
        let mut tracker = ChangeTracker::new(f.session, f.source, RecordingSink::default(), RecomputeMode::Inline);
        let t0 = Instant::now();
        tracker.enable(t0).unwrap();
        tracker.tick(t0);
        assert_eq!(tracker.tick(t0 + SECOND), TickOutcome::NotDue);
        assert_eq!(tracker.tick(t0 + SECOND * 2), TickOutcome::Unchanged);
    }

    #[test]
    fn test_hint_pulls_poll_forward() {
        let f = fixture();
        let mut tracker = ChangeTracker::new(f.session, f.source, RecordingSink::default(), RecomputeMode::Inline);
        let t0 = Instant::now();
        tracker.enable(t0).unwrap();
        tracker.tick(t0);

        tracker.source_mut().remove(f.hollow);
        tracker.hint(t0 + Duration::from_millis(10));
        assert_eq!(tracker.tick(t0 + Duration::from_millis(50)), TickOutcome::NotDue);
        assert_eq!(
            tracker.tick(t0 + Duration::from_millis(110)),
            TickOutcome::Published { sequence: 2 }
        );
        assert_relative_eq!(last_area(&tracker), 10_000.0, max_relative = 1e-9);
        assert!(tracker.session().hollows().is_empty());
    }

    #[test]
    fn test_outline_removal_forces_idle() {
        let f = fixture();
        let mut tracker = ChangeTracker::new(f.session, f.source, RecordingSink::default(), RecomputeMode::Inline);
        let t0 = Instant::now();
        tracker.enable(t0).unwrap();
        tracker.tick(t0);

        tracker.source_mut().remove(f.outline);
        assert_eq!(tracker.tick(t0 + SECOND), TickOutcome::OutlineRemoved);
        assert_eq!(tracker.state(), TrackerState::Idle);
        assert!(tracker.session().section().is_none());
        assert!(tracker.session().report().is_none());
    }

    #[test]
    fn test_invalid_change_reported_and_prior_results_kept() {
        let f = fixture();
        let mut tracker = ChangeTracker::new(f.session, f.source, RecordingSink::default(), RecomputeMode::Inline);
        let t0 = Instant::now();
        tracker.enable(t0).unwrap();
        tracker.tick(t0);

        let open = Curve::Polyline {
            points: vec![
                Point3::xy(0.0, 0.0),
                Point3::xy(100.0, 0.0),
                Point3::xy(100.0, 100.0),
            ],
        };
        tracker.source_mut().set(f.outline, open);
        assert_eq!(tracker.tick(t0 + SECOND), TickOutcome::Errored);
        assert_eq!(tracker.state(), TrackerState::Watching);
        assert_eq!(tracker.sink().errors[0].error_code(), "NOT_CLOSED");
        assert_relative_eq!(
            tracker.session().report().unwrap().properties.area_mm2,
            8400.0,
            max_relative = 1e-9
        );

        // Reported once, not on every poll
        assert_eq!(tracker.tick(t0 + SECOND * 2), TickOutcome::Unchanged);
        assert_eq!(tracker.sink().errors.len(), 1);
    }

    #[test]
    fn test_panicking_tick_disables_and_reports() {
        let f = fixture();
        let mut tracker = ChangeTracker::new(f.session, PanickingSource, RecordingSink::default(), RecomputeMode::Inline);
        let t0 = Instant::now();
        tracker.enable(t0).unwrap();
        assert_eq!(tracker.tick(t0), TickOutcome::Failed);
        assert_eq!(tracker.state(), TrackerState::Idle);
        assert!(matches!(
            &tracker.sink().errors[0],
            SectionError::TrackingFailed { reason } if reason.contains("host went away")
        ));
    }

    #[test]
    fn test_offload_drops_overlapping_ticks() {
        let f = fixture();
        let mut tracker = ChangeTracker::new(f.session, f.source, RecordingSink::default(), RecomputeMode::Offload);
        let t0 = Instant::now();
        tracker.enable(t0).unwrap();

        assert_eq!(tracker.tick(t0), TickOutcome::Submitted { sequence: 1 });
        assert_eq!(tracker.state(), TrackerState::Recomputing);
        assert_eq!(tracker.tick(t0 + SECOND), TickOutcome::Dropped);
        assert_eq!(tracker.tick(t0 + SECOND * 2), TickOutcome::Dropped);
        assert_eq!(tracker.dropped_ticks(), 2);

        assert_eq!(tracker.wait(SECOND * 30), Some(TickOutcome::Published { sequence: 1 }));
        assert_eq!(tracker.state(), TrackerState::Watching);
        assert_relative_eq!(last_area(&tracker), 8400.0, max_relative = 1e-9);

        tracker.disable();
        assert_eq!(tracker.state(), TrackerState::Idle);
        assert!(tracker.collect().is_none());
    }

    #[test]
    fn test_rejected_poll_then_partial_repair_uses_source_curves() {
        let f = fixture();
        let mut tracker = ChangeTracker::new(f.session, f.source, RecordingSink::default(), RecomputeMode::Inline);
        let t0 = Instant::now();
        tracker.enable(t0).unwrap();
        tracker.tick(t0);

        let open = Curve::Polyline {
            points: vec![Point3::xy(0.0, 0.0), Point3::xy(100.0, 0.0), Point3::xy(100.0, 100.0)],
        };
        tracker.source_mut().set(f.outline, open);
        tracker
            .source_mut()
            .set(f.hollow, Curve::centered_rectangle(50.0, 50.0, 20.0, 20.0));
        assert_eq!(tracker.tick(t0 + SECOND), TickOutcome::Errored);

        tracker.source_mut().set(f.outline, Curve::rectangle(0.0, 0.0, 100.0, 100.0));
        assert_eq!(tracker.tick(t0 + SECOND * 2), TickOutcome::Published { sequence: 2 });
        assert_relative_eq!(last_area(&tracker), 9600.0, max_relative = 1e-9);
        assert_eq!(
            tracker.session().hollows()[0].1,
            Curve::centered_rectangle(50.0, 50.0, 20.0, 20.0)
        );
    }

    #[test]
    fn test_hollow_removed_while_another_changes() {
        let mut f = fixture();
        let small = BoundaryId::new();
        f.session
            .upsert_hollow(small, Curve::centered_rectangle(15.0, 15.0, 10.0, 10.0))
            .unwrap();
        f.source.set(small, Curve::centered_rectangle(15.0, 15.0, 10.0, 10.0));
        let mut tracker = ChangeTracker::new(f.session, f.source, RecordingSink::default(), RecomputeMode::Inline);
        let t0 = Instant::now();
        tracker.enable(t0).unwrap();
        tracker.tick(t0);
        assert_relative_eq!(last_area(&tracker), 8300.0, max_relative = 1e-9);

        tracker.source_mut().remove(f.hollow);
        tracker
            .source_mut()
            .set(small, Curve::centered_rectangle(15.0, 15.0, 20.0, 20.0));
        assert_eq!(tracker.tick(t0 + SECOND), TickOutcome::Published { sequence: 2 });
        assert_relative_eq!(last_area(&tracker), 9600.0, max_relative = 1e-9);
        assert_eq!(tracker.session().hollows().len(), 1);
        assert_eq!(tracker.session().hollows()[0].0, small);
    }
}
