use crate::capture::domain::capture_state::{CaptureState, CaptureStateError};
use crate::shared::tag::Tag;

/// Presented state of the tagging screen.
///
/// Owned by the capture use case and shared by reference with the
/// presentation layer. The tag list is always replaced wholesale, never
/// merged, and each tag carries its own label/percentage toggle.
#[derive(Debug, Clone, Default)]
pub struct TagSession {
    tags: Vec<Tag>,
    showing_score: Vec<bool>,
    state: CaptureState,
    busy: bool,
}

impl TagSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session pre-filled with the tags for the bundled sample photo.
    pub fn with_sample_tags() -> Self {
        let mut session = Self::new();
        session.replace(vec![Tag::new("Blue Sky", 0.85), Tag::new("Landscape", 0.60)]);
        session
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub(crate) fn advance(&mut self, next: CaptureState) -> Result<(), CaptureStateError> {
        self.state = self.state.advance(next)?;
        Ok(())
    }

    /// Forces the session back to `Idle` after an aborted capture.
    pub(crate) fn reset_state(&mut self) {
        self.state = CaptureState::Idle;
        self.busy = false;
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.showing_score.clear();
    }

    pub fn replace(&mut self, tags: Vec<Tag>) {
        self.showing_score = vec![false; tags.len()];
        self.tags = tags;
    }

    /// Text currently shown for the tag at `index`: its label, or its
    /// percentage once toggled.
    pub fn displayed_text(&self, index: usize) -> Option<&str> {
        let tag = self.tags.get(index)?;
        if self.showing_score[index] {
            Some(tag.score_percentage())
        } else {
            Some(tag.label())
        }
    }

    /// Flips the tag at `index` between label and percentage and returns the
    /// new text. Out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) -> Option<&str> {
        let flag = self.showing_score.get_mut(index)?;
        *flag = !*flag;
        self.displayed_text(index)
    }

    /// Sets every tag to show its label (`false`) or its percentage (`true`).
    pub fn show_all_scores(&mut self, show: bool) {
        self.showing_score.iter_mut().for_each(|flag| *flag = show);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(labels: &[(&str, f64)]) -> TagSession {
        let mut session = TagSession::new();
        session.replace(labels.iter().map(|(l, s)| Tag::new(*l, *s)).collect());
        session
    }

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let session = TagSession::new();
        assert!(session.tags().is_empty());
        assert_eq!(session.state(), CaptureState::Idle);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_sample_tags() {
        let session = TagSession::with_sample_tags();
        assert_eq!(session.tags().len(), 2);
        assert_eq!(session.tags()[0].label(), "Blue Sky");
        assert_eq!(session.tags()[0].score_percentage(), "85%");
        assert_eq!(session.tags()[1].score_percentage(), "60%");
    }

    #[test]
    fn test_toggle_flips_between_label_and_percentage() {
        let mut session = session_with(&[("SKY", 0.9)]);
        assert_eq!(session.displayed_text(0), Some("SKY"));
        assert_eq!(session.toggle(0), Some("90%"));
        assert_eq!(session.toggle(0), Some("SKY"));
    }

    #[test]
    fn test_toggle_is_per_tag() {
        let mut session = session_with(&[("A", 0.1), ("B", 0.2)]);
        session.toggle(1);
        assert_eq!(session.displayed_text(0), Some("A"));
        assert_eq!(session.displayed_text(1), Some("20%"));
    }

    #[test]
    fn test_toggle_out_of_range_is_none() {
        let mut session = session_with(&[("A", 0.1)]);
        assert_eq!(session.toggle(5), None);
        assert_eq!(session.displayed_text(5), None);
    }

    #[test]
    fn test_replace_resets_toggles_and_drops_old_tags() {
        let mut session = session_with(&[("OLD", 0.5)]);
        session.toggle(0);
        session.replace(vec![Tag::new("NEW", 0.4)]);
        assert_eq!(session.tags().len(), 1);
        assert_eq!(session.displayed_text(0), Some("NEW"));
    }

    #[test]
    fn test_show_all_scores() {
        let mut session = session_with(&[("A", 0.1), ("B", 0.2)]);
        session.show_all_scores(true);
        assert_eq!(session.displayed_text(0), Some("10%"));
        assert_eq!(session.displayed_text(1), Some("20%"));
    }

    #[test]
    fn test_clear_empties_tags() {
        let mut session = session_with(&[("A", 0.1)]);
        session.clear();
        assert!(session.tags().is_empty());
        assert_eq!(session.displayed_text(0), None);
    }

    #[test]
    fn test_advance_rejects_illegal_transition() {
        let mut session = TagSession::new();
        assert!(session.advance(CaptureState::TagsReady).is_err());
        assert_eq!(session.state(), CaptureState::Idle);
        session.advance(CaptureState::ImageAcquired).unwrap();
        assert_eq!(session.state(), CaptureState::ImageAcquired);
    }
}
