use thiserror::Error;

/// Lifecycle of one capture:
/// `Idle → ImageAcquired → Submitting → {TagsReady | Failed} → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    ImageAcquired,
    Submitting,
    TagsReady,
    Failed,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal capture transition {from:?} -> {to:?}")]
pub struct CaptureStateError {
    pub from: CaptureState,
    pub to: CaptureState,
}

impl CaptureState {
    pub fn can_advance_to(self, next: CaptureState) -> bool {
        use CaptureState::*;
        matches!(
            (self, next),
            (Idle, ImageAcquired)
                | (ImageAcquired, Submitting)
                | (ImageAcquired, Failed)
                | (Submitting, TagsReady)
                | (Submitting, Failed)
                // cancelled while waiting on the service
                | (Submitting, Idle)
                | (TagsReady, Idle)
                | (Failed, Idle)
        )
    }

    pub fn advance(self, next: CaptureState) -> Result<CaptureState, CaptureStateError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(CaptureStateError {
                from: self,
                to: next,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CaptureState::*;
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Idle, ImageAcquired)]
    #[case(ImageAcquired, Submitting)]
    #[case(ImageAcquired, Failed)]
    #[case(Submitting, TagsReady)]
    #[case(Submitting, Failed)]
    #[case(Submitting, Idle)]
    #[case(TagsReady, Idle)]
    #[case(Failed, Idle)]
    fn test_legal_transitions(#[case] from: CaptureState, #[case] to: CaptureState) {
        assert_eq!(from.advance(to), Ok(to));
    }

    #[rstest]
    #[case(Idle, Submitting)]
    #[case(Idle, TagsReady)]
    #[case(ImageAcquired, TagsReady)]
    #[case(Submitting, ImageAcquired)]
    #[case(TagsReady, Submitting)]
    #[case(Failed, TagsReady)]
    fn test_illegal_transitions(#[case] from: CaptureState, #[case] to: CaptureState) {
        assert_eq!(from.advance(to), Err(CaptureStateError { from, to }));
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(CaptureState::default(), Idle);
    }
}
