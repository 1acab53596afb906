use std::sync::atomic::{AtomicBool, Ordering};

use crate::capture::domain::capture_state::CaptureState;
use crate::shared::error::ApplicationError;
use crate::shared::tag::Tag;

/// Port to whatever renders the tag screen (GUI, terminal).
///
/// Calls arrive from the capture task, so implementations handle their own
/// thread hand-off.
pub trait Presenter: Send + Sync {
    /// The tag list was replaced; re-render one cell per tag.
    fn tags_changed(&self, tags: &[Tag]);

    /// Show or hide the "analyzing" indicator.
    fn busy_changed(&self, busy: bool);

    /// Present a modal with a dismiss action.
    fn show_alert(&self, title: &str, message: &str);

    /// Capture lifecycle notification. Default: ignored.
    fn state_changed(&self, _state: CaptureState) {}
}

/// Allows at most one alert on screen.
///
/// Errors raised while an alert is visible are logged and dropped, not
/// queued. `dismiss` re-opens the gate.
#[derive(Default)]
pub struct AlertGate {
    visible: AtomicBool,
}

impl AlertGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `error` and shows it unless another alert is up. Returns whether
    /// it was shown.
    pub fn raise(&self, error: &ApplicationError, presenter: &dyn Presenter) -> bool {
        log::error!("{error}");
        if self
            .visible
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            presenter.show_alert(error.title(), error.message());
            true
        } else {
            log::warn!("Alert already visible, suppressing: {}", error.title());
            false
        }
    }

    pub fn dismiss(&self) {
        self.visible.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct AlertRecorder {
        alerts: Mutex<Vec<(String, String)>>,
    }

    impl Presenter for AlertRecorder {
        fn tags_changed(&self, _tags: &[Tag]) {}
        fn busy_changed(&self, _busy: bool) {}
        fn show_alert(&self, title: &str, message: &str) {
            self.alerts
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }
    }

    #[test]
    fn test_first_alert_is_shown() {
        let gate = AlertGate::new();
        let presenter = AlertRecorder::default();
        assert!(gate.raise(&ApplicationError::CameraUnavailable, &presenter));
        let alerts = presenter.alerts.lock().unwrap();
        assert_eq!(alerts[0].0, "Camera Unavailable");
    }

    #[test]
    fn test_second_alert_is_suppressed_until_dismissed() {
        let gate = AlertGate::new();
        let presenter = AlertRecorder::default();
        gate.raise(&ApplicationError::EmptyResult, &presenter);
        assert!(!gate.raise(&ApplicationError::MissingCredentials, &presenter));
        assert_eq!(presenter.alerts.lock().unwrap().len(), 1);

        gate.dismiss();
        assert!(gate.raise(&ApplicationError::MissingCredentials, &presenter));
        assert_eq!(presenter.alerts.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_state_changes_are_ignored_by_default() {
        let presenter = AlertRecorder::default();
        presenter.state_changed(CaptureState::Submitting);
        presenter.tags_changed(&[Tag::new("A", 0.5)]);
        presenter.busy_changed(true);
        assert!(presenter.alerts.lock().unwrap().is_empty());
    }
}
