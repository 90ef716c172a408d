use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::ids::QuestionNumber;
use crate::model::question_map::QuestionMap;
use crate::model::settings::{TestSettings, TimeLimit};

/// Length of the question slide transition. Navigation requests arriving sooner
/// than this after an accepted one are dropped.
pub const NAVIGATION_DEBOUNCE_MS: i64 = 500;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("session has already been started")]
    AlreadyStarted,
    #[error("session is not running")]
    NotRunning,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a test attempt. There is no way back from `Finished` or `Abandoned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Running,
    Finished,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionTimer {
    Active,
    Inactive,
}

/// Everything the session owns for a single question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionState {
    answer: Option<String>,
    elapsed_secs: u32,
    doubt: bool,
    timer: QuestionTimer,
}

impl QuestionState {
    fn new() -> Self {
        Self {
            answer: None,
            elapsed_secs: 0,
            doubt: false,
            timer: QuestionTimer::Inactive,
        }
    }

    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn is_doubted(&self) -> bool {
        self.doubt
    }

    #[must_use]
    pub fn timer(&self) -> QuestionTimer {
        self.timer
    }
}

/// Whole-test counter: counts up for untimed tests, down from the limit otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallClock {
    CountUp { elapsed: u32 },
    CountDown { remaining: u32, limit: u32 },
}

impl OverallClock {
    fn for_limit(limit: TimeLimit) -> Self {
        match limit {
            TimeLimit::Untimed => Self::CountUp { elapsed: 0 },
            TimeLimit::Minutes(_) => Self::CountDown {
                remaining: limit.as_secs(),
                limit: limit.as_secs(),
            },
        }
    }

    /// Seconds shown on the overall timer.
    #[must_use]
    pub fn display_secs(&self) -> u32 {
        match self {
            Self::CountUp { elapsed } => *elapsed,
            Self::CountDown { remaining, .. } => *remaining,
        }
    }

    /// Seconds consumed so far.
    #[must_use]
    pub fn used_secs(&self) -> u32 {
        match self {
            Self::CountUp { elapsed } => *elapsed,
            Self::CountDown { remaining, limit } => limit.saturating_sub(*remaining),
        }
    }
}

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

/// Changes a presentation layer reacts to. Operations that change nothing emit
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    AnswerChanged {
        question: QuestionNumber,
        previous: Option<String>,
        answer: String,
    },
    QuestionNavigated {
        from: QuestionNumber,
        to: QuestionNumber,
    },
    DoubtToggled {
        question: QuestionNumber,
        doubted: bool,
    },
    Ticked {
        display_secs: u32,
    },
    QuestionTicked {
        question: QuestionNumber,
        elapsed_secs: u32,
    },
    Finished(SessionOutcome),
}

/// Payload of a finished attempt, before an answer key and name are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub settings: TestSettings,
    pub answers: QuestionMap<Option<String>>,
    pub per_question_secs: QuestionMap<u32>,
    pub doubts: BTreeSet<QuestionNumber>,
    pub total_used_secs: u32,
    pub time_up: bool,
}

impl SessionOutcome {
    #[must_use]
    pub fn unanswered(&self) -> Vec<QuestionNumber> {
        self.answers
            .iter()
            .filter(|(_, a)| a.is_none())
            .map(|(q, _)| q)
            .collect()
    }
}

/// Counts for a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub doubted: usize,
    pub current: QuestionNumber,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Timing and answer state of one attempt.
///
/// Time never comes from inside: ticks are delivered by the caller once per second
/// and navigation receives the caller's `now` for the debounce window.
#[derive(Debug, Clone)]
pub struct TestSession {
    settings: TestSettings,
    phase: SessionPhase,
    questions: BTreeMap<QuestionNumber, QuestionState>,
    current: QuestionNumber,
    clock: OverallClock,
    last_navigation: Option<DateTime<Utc>>,
}

impl TestSession {
    /// Build a session that has not started yet.
    #[must_use]
    pub fn new(settings: TestSettings) -> Self {
        let questions = settings
            .range()
            .iter()
            .map(|q| (q, QuestionState::new()))
            .collect();
        Self {
            current: settings.first_question(),
            clock: OverallClock::for_limit(settings.time_limit()),
            settings,
            phase: SessionPhase::NotStarted,
            questions,
            last_navigation: None,
        }
    }

    /// Start the overall timer and the first question's timer.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::AlreadyStarted` if the session left `NotStarted`.
    pub fn start(&mut self) -> Result<(), SessionStateError> {
        if self.phase != SessionPhase::NotStarted {
            return Err(SessionStateError::AlreadyStarted);
        }
        self.phase = SessionPhase::Running;
        self.set_timer(self.current, QuestionTimer::Active);
        Ok(())
    }

    // Accessors
    #[must_use]
    pub fn settings(&self) -> &TestSettings {
        &self.settings
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    #[must_use]
    pub fn current_question(&self) -> QuestionNumber {
        self.current
    }

    #[must_use]
    pub fn question(&self, question: QuestionNumber) -> Option<&QuestionState> {
        self.questions.get(&question)
    }

    #[must_use]
    pub fn answer(&self, question: QuestionNumber) -> Option<&str> {
        self.questions.get(&question).and_then(QuestionState::answer)
    }

    #[must_use]
    pub fn overall_clock(&self) -> OverallClock {
        self.clock
    }

    #[must_use]
    pub fn display_secs(&self) -> u32 {
        self.clock.display_secs()
    }

    #[must_use]
    pub fn doubts(&self) -> BTreeSet<QuestionNumber> {
        self.questions
            .iter()
            .filter(|(_, s)| s.doubt)
            .map(|(q, _)| *q)
            .collect()
    }

    #[must_use]
    pub fn active_timer_count(&self) -> usize {
        self.questions
            .values()
            .filter(|s| s.timer == QuestionTimer::Active)
            .count()
    }

    #[must_use]
    pub fn is_last(&self, question: QuestionNumber) -> bool {
        question == self.settings.range().last()
    }

    #[must_use]
    pub fn unanswered(&self) -> Vec<QuestionNumber> {
        self.questions
            .iter()
            .filter(|(_, s)| s.answer.is_none())
            .map(|(q, _)| *q)
            .collect()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.questions.values().filter(|s| s.answer.is_some()).count(),
            doubted: self.questions.values().filter(|s| s.doubt).count(),
            current: self.current,
        }
    }

    /// Record `label` for `question`.
    ///
    /// Unknown questions or labels are ignored. With auto-advance on, answering the
    /// current question moves to the next one (still subject to the debounce).
    pub fn select_answer(
        &mut self,
        question: QuestionNumber,
        label: &str,
        now: DateTime<Utc>,
    ) -> Vec<SessionEvent> {
        if !self.is_running() || !self.settings.options().contains(label) {
            return Vec::new();
        }
        let Some(state) = self.questions.get_mut(&question) else {
            return Vec::new();
        };

        let previous = state.answer.replace(label.to_owned());
        let mut events = vec![SessionEvent::AnswerChanged {
            question,
            previous,
            answer: label.to_owned(),
        }];

        if self.settings.display().auto_advance
            && question == self.current
            && !self.is_last(question)
        {
            events.extend(self.next(now));
        }
        events
    }

    /// Show `question`, moving the per-question timer with it.
    pub fn navigate_to(&mut self, question: QuestionNumber, now: DateTime<Utc>) -> Vec<SessionEvent> {
        if !self.is_running() || !self.settings.range().contains(question) {
            return Vec::new();
        }
        if let Some(last) = self.last_navigation {
            if now - last < Duration::milliseconds(NAVIGATION_DEBOUNCE_MS) {
                return Vec::new();
            }
        }

        let from = self.current;
        self.set_timer(from, QuestionTimer::Inactive);
        self.set_timer(question, QuestionTimer::Active);
        self.current = question;
        self.last_navigation = Some(now);

        vec![SessionEvent::QuestionNavigated { from, to: question }]
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> Vec<SessionEvent> {
        match self.current.checked_offset(1) {
            Some(q) => self.navigate_to(q, now),
            None => Vec::new(),
        }
    }

    pub fn previous(&mut self, now: DateTime<Utc>) -> Vec<SessionEvent> {
        match self.current.checked_offset(-1) {
            Some(q) => self.navigate_to(q, now),
            None => Vec::new(),
        }
    }

    /// Flip the doubt mark. Unanswered questions cannot be doubted.
    pub fn toggle_doubt(&mut self, question: QuestionNumber) -> Vec<SessionEvent> {
        if !self.is_running() {
            return Vec::new();
        }
        let Some(state) = self.questions.get_mut(&question) else {
            return Vec::new();
        };
        if state.answer.is_none() {
            return Vec::new();
        }
        state.doubt = !state.doubt;
        vec![SessionEvent::DoubtToggled {
            question,
            doubted: state.doubt,
        }]
    }

    /// One second of the overall timer. A countdown reaching zero finishes the
    /// session on the spot.
    pub fn on_tick(&mut self) -> Vec<SessionEvent> {
        if !self.is_running() {
            return Vec::new();
        }

        let time_up = match &mut self.clock {
            OverallClock::CountUp { elapsed } => {
                *elapsed = elapsed.saturating_add(1);
                false
            }
            OverallClock::CountDown { remaining, .. } => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
        };

        let mut events = vec![SessionEvent::Ticked {
            display_secs: self.clock.display_secs(),
        }];
        if time_up {
            events.push(SessionEvent::Finished(self.complete(true)));
        }
        events
    }

    /// One second of the current question's timer.
    pub fn on_question_tick(&mut self) -> Vec<SessionEvent> {
        if !self.is_running() {
            return Vec::new();
        }
        let question = self.current;
        let Some(state) = self.questions.get_mut(&question) else {
            return Vec::new();
        };
        if state.timer != QuestionTimer::Active {
            return Vec::new();
        }
        state.elapsed_secs = state.elapsed_secs.saturating_add(1);
        vec![SessionEvent::QuestionTicked {
            question,
            elapsed_secs: state.elapsed_secs,
        }]
    }

    /// Stop every timer and hand back the result payload.
    ///
    /// Asking about unanswered questions is the caller's job before `time_up = false`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NotRunning` outside the `Running` phase.
    pub fn finish(&mut self, time_up: bool) -> Result<SessionOutcome, SessionStateError> {
        if !self.is_running() {
            return Err(SessionStateError::NotRunning);
        }
        Ok(self.complete(time_up))
    }

    /// Abandon the attempt. Nothing is kept.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NotRunning` outside the `Running` phase.
    pub fn cancel(&mut self) -> Result<(), SessionStateError> {
        if !self.is_running() {
            return Err(SessionStateError::NotRunning);
        }
        self.stop_all_timers();
        self.phase = SessionPhase::Abandoned;
        Ok(())
    }

    fn complete(&mut self, time_up: bool) -> SessionOutcome {
        self.stop_all_timers();
        self.phase = SessionPhase::Finished;

        SessionOutcome {
            settings: self.settings.clone(),
            answers: self
                .questions
                .iter()
                .map(|(q, s)| (*q, s.answer.clone()))
                .collect(),
            per_question_secs: self
                .questions
                .iter()
                .map(|(q, s)| (*q, s.elapsed_secs))
                .collect(),
            doubts: self.doubts(),
            total_used_secs: self.clock.used_secs(),
            time_up,
        }
    }

    fn set_timer(&mut self, question: QuestionNumber, timer: QuestionTimer) {
        if let Some(state) = self.questions.get_mut(&question) {
            state.timer = timer;
        }
    }

    fn stop_all_timers(&mut self) {
        for state in self.questions.values_mut() {
            state.timer = QuestionTimer::Inactive;
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
