//! # Change Tracking
//!
//! Watches the outline and hollows of a [`SectionSession`](crate::session::SectionSession)
//! for external edits and republishes results when they change.
//!
//! - [`fingerprint`] - quantized per-curve change proxies
//! - [`source`] - the [`GeometrySource`] trait and an in-memory source
//! - [`tracker`] - the Idle/Watching/Recomputing state machine
//! - [`worker`] - optional background recompute thread
//!
//! ## Example
//!
//! ```rust
//! use std::time::Instant;
//! use section_core::errors::SectionError;
//! use section_core::geometry::Curve;
//! use section_core::materials::MaterialCatalog;
//! use section_core::section::BoundaryId;
//! use section_core::session::SectionSession;
//! use section_core::tracking::{ChangeTracker, MemorySource, Publication, RecomputeMode, ResultSink, TickOutcome};
//!
//! struct Print;
//! impl ResultSink for Print {
//!     fn publish(&mut self, p: &Publication) { println!("A = {}", p.report.properties.area_mm2); }
//!     fn report(&mut self, e: &SectionError) { eprintln!("{}", e); }
//! }
//!
//! let id = BoundaryId::new();
//! let curve = Curve::circle(0.0, 0.0, 25.0);
//! let mut session = SectionSession::new(MaterialCatalog::standard().clone());
//! session.set_outline(id, curve.clone()).unwrap();
//! let mut source = MemorySource::new();
//! source.set(id, curve);
//!
//! let mut tracker = ChangeTracker::new(session, source, Print, RecomputeMode::Inline);
//! let now = Instant::now();
//! tracker.enable(now).unwrap();
//! assert_eq!(tracker.tick(now), TickOutcome::Published { sequence: 1 });
//! ```

pub mod fingerprint;
pub mod source;
pub mod tracker;
pub mod worker;

pub use fingerprint::GeometryFingerprint;
pub use source::{GeometrySource, MemorySource};
pub use tracker::{ChangeTracker, Publication, RecomputeMode, ResultSink, TickOutcome, TrackerState};
pub use worker::RecomputeWorker;
