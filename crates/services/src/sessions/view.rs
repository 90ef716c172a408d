use alum_core::model::{OverallClock, QuestionNumber, SessionPhase, SessionProgress, TestSession};

/// Snapshot of the current question screen.
///
/// Carries raw numbers only; formatting is left to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub question: QuestionNumber,
    pub is_first: bool,
    pub is_last: bool,
    pub options: Vec<String>,
    pub answer: Option<String>,
    pub doubted: bool,
    pub question_secs: u32,
    pub overall: OverallClock,
    pub show_total_time: bool,
    pub show_question_time: bool,
    pub show_doubt_buttons: bool,
    pub progress: SessionProgress,
    /// Every question with its answer and doubt mark, for the question grid.
    pub grid: Vec<(QuestionNumber, bool, bool)>,
}

impl SessionView {
    #[must_use]
    pub fn from_session(session: &TestSession) -> Self {
        let settings = session.settings();
        let current = session.current_question();
        let state = session.question(current);
        let display = settings.display();

        let grid = settings
            .range()
            .iter()
            .map(|q| {
                let state = session.question(q);
                let answered = state.is_some_and(|s| s.answer().is_some());
                let doubted = state.is_some_and(|s| s.is_doubted());
                (q, answered, doubted)
            })
            .collect();

        Self {
            phase: session.phase(),
            question: current,
            is_first: current == settings.range().first(),
            is_last: session.is_last(current),
            options: settings.options().labels().to_vec(),
            answer: state.and_then(|s| s.answer()).map(str::to_owned),
            doubted: state.is_some_and(|s| s.is_doubted()),
            question_secs: state.map_or(0, |s| s.elapsed_secs()),
            overall: session.overall_clock(),
            show_total_time: display.show_total_time,
            show_question_time: display.show_question_time,
            show_doubt_buttons: display.show_doubt_buttons,
            progress: session.progress(),
            grid,
        }
    }

    /// True when the overall timer counts down to a limit.
    #[must_use]
    pub fn is_countdown(&self) -> bool {
        matches!(self.overall, OverallClock::CountDown { .. })
    }
}
