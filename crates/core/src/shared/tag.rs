/// One displayable recognition result.
///
/// The percentage string is derived from the score when the tag is built and
/// there is no way to set it independently, so the two never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    label: String,
    score: f64,
    score_percentage: String,
}

impl Tag {
    /// Builds a tag whose percentage is `round(score * 100)` followed by `%`.
    ///
    /// Non-finite scores are stored as `0.0`; scores outside `[0, 1]` are clamped.
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        let score = sanitize_score(score);
        Self {
            label: label.into(),
            score,
            score_percentage: format_percentage(score),
        }
    }

    /// Builds a combined face-attribute tag rendered as `"<primary%> (<secondary%>)"`.
    ///
    /// `score` is the primary score; the secondary one only appears in the text.
    pub fn with_secondary(label: impl Into<String>, primary: f64, secondary: f64) -> Self {
        let primary = sanitize_score(primary);
        let secondary = sanitize_score(secondary);
        Self {
            label: label.into(),
            score: primary,
            score_percentage: format!(
                "{} ({})",
                format_percentage(primary),
                format_percentage(secondary)
            ),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn score_percentage(&self) -> &str {
        &self.score_percentage
    }

    /// Display weight in `[0.3, 1.0]`, so low-confidence tags stay visible.
    pub fn opacity(&self) -> f64 {
        self.score * 0.7 + 0.3
    }
}

/// Formats a score as a whole percent, rounding half away from zero.
pub fn format_percentage(score: f64) -> String {
    let percent = (sanitize_score(score) * 100.0).round() as u32;
    format!("{percent}%")
}

fn sanitize_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::typical(0.85, "85%")]
    #[case::half_up_from_float(0.595, "60%")]
    #[case::half_away_not_even(0.125, "13%")]
    #[case::smallest_half(0.005, "1%")]
    #[case::zero(0.0, "0%")]
    #[case::one(1.0, "100%")]
    fn test_percentage_rounds_half_away_from_zero(#[case] score: f64, #[case] expected: &str) {
        assert_eq!(Tag::new("x", score).score_percentage(), expected);
    }

    #[test]
    fn test_new_keeps_label_and_score() {
        let tag = Tag::new("Blue Sky", 0.85);
        assert_eq!(tag.label(), "Blue Sky");
        assert_relative_eq!(tag.score(), 0.85);
    }

    #[test]
    fn test_nan_score_becomes_zero() {
        let tag = Tag::new("x", f64::NAN);
        assert_relative_eq!(tag.score(), 0.0);
        assert_eq!(tag.score_percentage(), "0%");
    }

    #[test]
    fn test_out_of_range_score_is_clamped() {
        assert_eq!(Tag::new("x", 1.7).score_percentage(), "100%");
        assert_eq!(Tag::new("x", -0.2).score_percentage(), "0%");
    }

    #[test]
    fn test_with_secondary_formats_both_scores() {
        let tag = Tag::with_secondary("MALE (20-30)", 0.9, 0.7);
        assert_eq!(tag.score_percentage(), "90% (70%)");
        assert_relative_eq!(tag.score(), 0.9);
    }

    #[test]
    fn test_opacity_scales_score() {
        assert_relative_eq!(Tag::new("x", 0.0).opacity(), 0.3);
        assert_relative_eq!(Tag::new("x", 1.0).opacity(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(Tag::new("x", 0.5).opacity(), 0.65, epsilon = 1e-12);
    }
}
