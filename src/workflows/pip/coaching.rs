pub const TONE_FEEDBACK: &str = "Focus on improving tone and rubric adherence.";
pub const TASK_FEEDBACK: &str = "Increase task completion rate for better results.";

const TONE_BAND_CEILING: f64 = 60.0;

/// Rule-based coaching text for a score. Two bands only: below 60 gets tone and
/// rubric feedback, everything else gets task-completion feedback.
pub fn advise(score: f64) -> &'static str {
    if score < TONE_BAND_CEILING {
        TONE_FEEDBACK
    } else {
        TASK_FEEDBACK
    }
}
