//! Result lifecycle state machine for a single conversion attempt.
//!
//! The pipeline is asynchronous end-to-end, so a reset (new file selection or
//! explicit clear) can race with an in-flight attempt's completion. Every
//! attempt is therefore tagged with a monotonically increasing id at start;
//! a completion is applied only while its id is still the current one, and
//! discarded silently otherwise. A stale task can never overwrite a newer
//! Idle/Loading state.

use crate::pipeline::input::is_archive_name;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Lifecycle states of a conversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    /// No attempt in flight, no result. The only state that accepts `start`.
    Idle,
    /// An attempt is in flight.
    Loading,
    /// Terminal for this attempt; the validated document is available.
    Success,
    /// Terminal for this attempt; a user-facing message is available.
    Error,
}

/// Snapshot of the unit of work for one user-initiated conversion.
///
/// Invariant: outside Idle/Loading exactly one of
/// {`result_document`, `error_message`} is `Some`; both are `None` in
/// Idle/Loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionAttempt {
    pub attempt_id: u64,
    pub source_name: Option<String>,
    pub source_is_archive: bool,
    pub status: ConversionStatus,
    pub result_document: Option<String>,
    pub output_name: Option<String>,
    pub error_message: Option<String>,
}

impl ConversionAttempt {
    fn idle() -> Self {
        Self {
            attempt_id: 0,
            source_name: None,
            source_is_archive: false,
            status: ConversionStatus::Idle,
            result_document: None,
            output_name: None,
            error_message: None,
        }
    }
}

/// A successful attempt's payload, applied through [`AttemptTracker::complete`].
#[derive(Debug, Clone)]
pub struct CompletedDocument {
    pub geojson: String,
    pub output_name: String,
}

/// Tracks the lifecycle of the current conversion attempt.
///
/// One tracker per session; attempts are never reused across files — a reset
/// installs a fresh Idle instance and abandons any in-flight attempt.
pub struct AttemptTracker {
    next_id: AtomicU64,
    current: Mutex<ConversionAttempt>,
}

impl Default for AttemptTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AttemptTracker {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            current: Mutex::new(ConversionAttempt::idle()),
        }
    }

    /// Begin a new attempt: `Idle --start--> Loading`.
    ///
    /// Returns the fresh attempt id, or `None` if the machine is not Idle —
    /// starting is refused from every other state (callers reset first when
    /// a terminal result should be replaced, and must not offer the action
    /// at all while Loading).
    pub fn start(&self, source_name: &str) -> Option<u64> {
        let mut current = self.current.lock().unwrap();
        if current.status != ConversionStatus::Idle {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        *current = ConversionAttempt {
            attempt_id: id,
            source_name: Some(source_name.to_string()),
            source_is_archive: is_archive_name(source_name),
            status: ConversionStatus::Loading,
            result_document: None,
            output_name: None,
            error_message: None,
        };
        Some(id)
    }

    /// Apply an attempt's outcome: `Loading --ok--> Success` or
    /// `Loading --fail--> Error`.
    ///
    /// The transition is applied only if `attempt_id` still identifies the
    /// current Loading attempt. Returns whether it was applied; a stale or
    /// post-reset completion is discarded and must not be re-tried.
    pub fn complete(&self, attempt_id: u64, outcome: Result<CompletedDocument, String>) -> bool {
        let mut current = self.current.lock().unwrap();
        if current.attempt_id != attempt_id || current.status != ConversionStatus::Loading {
            tracing::debug!(
                "Discarding completion for stale attempt {} (current: {})",
                attempt_id,
                current.attempt_id
            );
            return false;
        }
        match outcome {
            Ok(doc) => {
                current.status = ConversionStatus::Success;
                current.result_document = Some(doc.geojson);
                current.output_name = Some(doc.output_name);
                current.error_message = None;
            }
            Err(message) => {
                current.status = ConversionStatus::Error;
                current.result_document = None;
                current.output_name = None;
                current.error_message = Some(message);
            }
        }
        true
    }

    /// `any state --newFileSelected or clear--> Idle`.
    ///
    /// Installs a fresh Idle instance. An abandoned in-flight attempt keeps
    /// running, but its completion will fail the id check and be discarded.
    pub fn reset(&self) {
        *self.current.lock().unwrap() = ConversionAttempt::idle();
    }

    /// Clone the current attempt for rendering or serialisation.
    pub fn snapshot(&self) -> ConversionAttempt {
        self.current.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_doc() -> CompletedDocument {
        CompletedDocument {
            geojson: r#"{"type":"FeatureCollection","features":[]}"#.into(),
            output_name: "trails.json".into(),
        }
    }

    #[test]
    fn start_moves_idle_to_loading() {
        let tracker = AttemptTracker::new();
        let id = tracker.start("trails.kml").unwrap();
        let snap = tracker.snapshot();
        assert_eq!(snap.status, ConversionStatus::Loading);
        assert_eq!(snap.attempt_id, id);
        assert_eq!(snap.source_name.as_deref(), Some("trails.kml"));
        assert!(!snap.source_is_archive);
        assert!(snap.result_document.is_none());
        assert!(snap.error_message.is_none());
    }

    #[test]
    fn archive_sources_are_classified_by_suffix() {
        let tracker = AttemptTracker::new();
        tracker.start("parks.KMZ").unwrap();
        assert!(tracker.snapshot().source_is_archive);
    }

    #[test]
    fn loading_reaches_exactly_one_terminal_state() {
        let tracker = AttemptTracker::new();
        let id = tracker.start("a.kml").unwrap();
        assert!(tracker.complete(id, Ok(ok_doc())));
        let snap = tracker.snapshot();
        assert_eq!(snap.status, ConversionStatus::Success);
        assert!(snap.result_document.is_some());
        assert!(snap.error_message.is_none());

        // a second completion for the same attempt is discarded
        assert!(!tracker.complete(id, Err("late failure".into())));
        assert_eq!(tracker.snapshot().status, ConversionStatus::Success);
    }

    #[test]
    fn failure_carries_message_and_no_document() {
        let tracker = AttemptTracker::new();
        let id = tracker.start("a.kml").unwrap();
        assert!(tracker.complete(id, Err("No KML file found".into())));
        let snap = tracker.snapshot();
        assert_eq!(snap.status, ConversionStatus::Error);
        assert!(snap.result_document.is_none());
        assert_eq!(snap.error_message.as_deref(), Some("No KML file found"));
    }

    #[test]
    fn only_idle_accepts_start() {
        let tracker = AttemptTracker::new();
        let id = tracker.start("a.kml").unwrap();
        assert!(tracker.start("b.kml").is_none(), "no Loading -> Loading");

        tracker.complete(id, Ok(ok_doc()));
        assert!(tracker.start("b.kml").is_none(), "terminal states refuse start");

        tracker.reset();
        assert!(tracker.start("b.kml").is_some());
    }

    #[test]
    fn reset_reaches_idle_from_every_state() {
        let tracker = AttemptTracker::new();
        tracker.reset();
        assert_eq!(tracker.snapshot().status, ConversionStatus::Idle);

        let id = tracker.start("a.kml").unwrap();
        tracker.reset(); // from Loading
        assert_eq!(tracker.snapshot().status, ConversionStatus::Idle);

        let id2 = tracker.start("b.kml").unwrap();
        assert_ne!(id, id2, "attempt ids are never reused");
        tracker.complete(id2, Ok(ok_doc()));
        tracker.reset(); // from Success
        assert_eq!(tracker.snapshot().status, ConversionStatus::Idle);

        let id3 = tracker.start("c.kml").unwrap();
        tracker.complete(id3, Err("boom".into()));
        tracker.reset(); // from Error
        let snap = tracker.snapshot();
        assert_eq!(snap.status, ConversionStatus::Idle);
        assert!(snap.source_name.is_none());
    }

    #[test]
    fn stale_completion_after_reset_is_discarded() {
        let tracker = AttemptTracker::new();
        let stale_id = tracker.start("old.kml").unwrap();
        tracker.reset();

        assert!(!tracker.complete(stale_id, Ok(ok_doc())));
        assert_eq!(tracker.snapshot().status, ConversionStatus::Idle);
    }

    #[test]
    fn stale_completion_never_overwrites_a_newer_attempt() {
        let tracker = AttemptTracker::new();
        let stale_id = tracker.start("old.kml").unwrap();
        tracker.reset();
        let fresh_id = tracker.start("new.kml").unwrap();

        assert!(!tracker.complete(stale_id, Err("slow failure from old attempt".into())));
        let snap = tracker.snapshot();
        assert_eq!(snap.status, ConversionStatus::Loading);
        assert_eq!(snap.attempt_id, fresh_id);
        assert_eq!(snap.source_name.as_deref(), Some("new.kml"));
    }

    #[test]
    fn status_serialises_lowercase() {
        let json = serde_json::to_string(&ConversionStatus::Loading).unwrap();
        assert_eq!(json, r#""loading""#);
    }
}
