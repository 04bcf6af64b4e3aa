//! The observer contract between the scheduler and its consumers.

use crate::phase::{PassReport, Phase, UnitOutcome, UnitRef};
use std::sync::{Arc, Mutex};

/// Passive receiver of ordered build-pass events.
///
/// Implementations override only the events they care about. Observers must
/// be cheap and non-blocking; they are called from worker threads while
/// compilation is in flight. Diagnostics arriving through
/// [`unit_finished`](Self::unit_finished) are never filtered or
/// deduplicated by the scheduler.
pub trait BuildObserver: Send + Sync {
    /// A compile job for `unit` has started; it is number `index` of `total`.
    fn unit_started(&self, unit: &UnitRef, index: usize, total: usize) {
        let _ = (unit, index, total);
    }

    /// A compile job for `unit` finished with `outcome`.
    fn unit_finished(&self, unit: &UnitRef, outcome: &UnitOutcome) {
        let _ = (unit, outcome);
    }

    /// The pass entered a new phase.
    fn phase_changed(&self, phase: Phase) {
        let _ = phase;
    }

    /// The pass ended; `report` carries the aggregate result.
    fn pass_finished(&self, report: &PassReport) {
        let _ = report;
    }
}

/// An ordered set of observers attached to one session.
///
/// Emission is serialized under a lock so every observer sees events in the
/// same order they were produced, even when workers finish concurrently.
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn BuildObserver>>,
    emit_lock: Mutex<()>,
}

impl ObserverSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an observer. Multiple observers may attach to one pass.
    pub fn add(&mut self, observer: Arc<dyn BuildObserver>) {
        self.observers.push(observer);
    }

    /// Number of attached observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns `true` if no observers are attached.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn unit_started(&self, unit: &UnitRef, index: usize, total: usize) {
        let _order = self.emit_lock.lock().unwrap();
        for obs in &self.observers {
            obs.unit_started(unit, index, total);
        }
    }

    pub(crate) fn unit_finished(&self, unit: &UnitRef, outcome: &UnitOutcome) {
        let _order = self.emit_lock.lock().unwrap();
        for obs in &self.observers {
            obs.unit_finished(unit, outcome);
        }
    }

    pub(crate) fn phase_changed(&self, phase: Phase) {
        let _order = self.emit_lock.lock().unwrap();
        for obs in &self.observers {
            obs.phase_changed(phase);
        }
    }

    pub(crate) fn pass_finished(&self, report: &PassReport) {
        let _order = self.emit_lock.lock().unwrap();
        for obs in &self.observers {
            obs.pass_finished(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PassOutcome;
    use citadel_project::UnitId;
    use std::path::PathBuf;
    use std::sync::Mutex as StdMutex;

    /// Records every event it sees, for assertions.
    #[derive(Default)]
    struct Recorder {
        events: StdMutex<Vec<String>>,
    }

    impl BuildObserver for Recorder {
        fn unit_started(&self, unit: &UnitRef, index: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {unit} {index}/{total}"));
        }

        fn unit_finished(&self, unit: &UnitRef, _outcome: &UnitOutcome) {
            self.events.lock().unwrap().push(format!("finish {unit}"));
        }

        fn phase_changed(&self, phase: Phase) {
            self.events.lock().unwrap().push(format!("phase {phase}"));
        }

        fn pass_finished(&self, report: &PassReport) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {:?}", report.outcome));
        }
    }

    fn unit_ref() -> UnitRef {
        UnitRef {
            id: UnitId::from_raw(0),
            path: PathBuf::from("a.c"),
        }
    }

    #[test]
    fn events_delivered_in_order() {
        let recorder = Arc::new(Recorder::default());
        let mut set = ObserverSet::new();
        set.add(recorder.clone());

        set.phase_changed(Phase::Compiling);
        set.unit_started(&unit_ref(), 1, 3);
        set.unit_finished(&unit_ref(), &UnitOutcome::Compiled);
        set.pass_finished(&PassReport {
            outcome: PassOutcome::Succeeded,
            units: Vec::new(),
            diagnostics: Vec::new(),
            dispatched: 1,
        });

        let events = recorder.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "phase compiling".to_string(),
                "start a.c 1/3".to_string(),
                "finish a.c".to_string(),
                "done Succeeded".to_string(),
            ]
        );
    }

    #[test]
    fn multiple_observers_all_receive() {
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let mut set = ObserverSet::new();
        set.add(a.clone());
        set.add(b.clone());
        assert_eq!(set.len(), 2);

        set.phase_changed(Phase::Linking);
        assert_eq!(a.events.lock().unwrap().len(), 1);
        assert_eq!(b.events.lock().unwrap().len(), 1);
    }

    #[test]
    fn default_impls_ignore_events() {
        struct Silent;
        impl BuildObserver for Silent {}
        let mut set = ObserverSet::new();
        set.add(Arc::new(Silent));
        set.phase_changed(Phase::Preflight);
        set.unit_started(&unit_ref(), 1, 1);
    }
}
