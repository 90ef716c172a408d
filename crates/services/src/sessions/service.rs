use chrono::{Duration, NaiveDateTime};
use log::{debug, info};

use alum_core::model::{
    AnswerKeySheet, QuestionNumber, SessionEvent, SessionOutcome, TestSession, TestSettings,
};

use super::view::SessionView;
use crate::Clock;
use crate::error::SessionError;

//
// ─── FINISHED TEST ─────────────────────────────────────────────────────────────
//

/// A finished attempt waiting for its answer key and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedTest {
    pub outcome: SessionOutcome,
    /// Local wall-clock time the attempt ended; becomes the record timestamp.
    pub finished_at: NaiveDateTime,
}

impl FinishedTest {
    /// Empty answer-key sheet for this attempt's questions and options.
    #[must_use]
    pub fn answer_key_sheet(&self) -> AnswerKeySheet {
        AnswerKeySheet::for_outcome(&self.outcome)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Running attempt driven by a front end.
///
/// Owns the time source, so callers only forward user input and timer ticks.
pub struct SessionService {
    clock: Clock,
    session: TestSession,
    finished: Option<FinishedTest>,
}

impl SessionService {
    /// Create and start a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` if the session cannot be started.
    pub fn start(clock: Clock, settings: TestSettings) -> Result<Self, SessionError> {
        Self::start_with(clock, TestSession::new(settings))
    }

    pub(crate) fn start_with(clock: Clock, mut session: TestSession) -> Result<Self, SessionError> {
        session.start()?;
        info!(
            "test started: questions {}, {} options, limit {} min",
            session.settings().range(),
            session.settings().options().len(),
            session.settings().time_limit().minutes()
        );
        Ok(Self {
            clock,
            session,
            finished: None,
        })
    }

    #[must_use]
    pub fn session(&self) -> &TestSession {
        &self.session
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView::from_session(&self.session)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    /// The finished attempt, once the session ended by `finish` or by running out
    /// of time.
    #[must_use]
    pub fn finished(&self) -> Option<&FinishedTest> {
        self.finished.as_ref()
    }

    /// Move a fixed clock forward. Real clocks are unaffected.
    pub fn advance_clock(&mut self, delta: Duration) {
        self.clock.advance(delta);
    }

    pub fn select_answer(&mut self, question: QuestionNumber, label: &str) -> Vec<SessionEvent> {
        let events = self.session.select_answer(question, label, self.clock.now());
        if events.is_empty() {
            debug!("answer {label:?} for question {question} ignored");
        }
        self.observe(events)
    }

    pub fn go_to(&mut self, question: QuestionNumber) -> Vec<SessionEvent> {
        let events = self.session.navigate_to(question, self.clock.now());
        if events.is_empty() {
            debug!("navigation to question {question} dropped");
        }
        self.observe(events)
    }

    pub fn next(&mut self) -> Vec<SessionEvent> {
        let events = self.session.next(self.clock.now());
        self.observe(events)
    }

    pub fn previous(&mut self) -> Vec<SessionEvent> {
        let events = self.session.previous(self.clock.now());
        self.observe(events)
    }

    pub fn toggle_doubt(&mut self, question: QuestionNumber) -> Vec<SessionEvent> {
        let events = self.session.toggle_doubt(question);
        self.observe(events)
    }

    /// Overall one-second tick.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let events = self.session.on_tick();
        self.observe(events)
    }

    /// Per-question one-second tick.
    pub fn question_tick(&mut self) -> Vec<SessionEvent> {
        let events = self.session.on_question_tick();
        self.observe(events)
    }

    /// End the attempt. The unanswered-question prompt belongs to the caller.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` if the session is not running.
    pub fn finish(&mut self, time_up: bool) -> Result<FinishedTest, SessionError> {
        let outcome = self.session.finish(time_up)?;
        Ok(self.record_finish(outcome))
    }

    /// Abandon the attempt without keeping anything.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` if the session is not running.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.session.cancel()?;
        info!("test abandoned");
        Ok(())
    }

    fn observe(&mut self, events: Vec<SessionEvent>) -> Vec<SessionEvent> {
        for event in &events {
            match event {
                SessionEvent::QuestionNavigated { from, to } => {
                    debug!("question {from} -> {to}");
                }
                SessionEvent::Finished(outcome) => {
                    self.record_finish(outcome.clone());
                }
                _ => {}
            }
        }
        events
    }

    fn record_finish(&mut self, outcome: SessionOutcome) -> FinishedTest {
        info!(
            "test finished after {}s (time up: {}), {} unanswered",
            outcome.total_used_secs,
            outcome.time_up,
            outcome.unanswered().len()
        );
        let finished = FinishedTest {
            outcome,
            finished_at: self.clock.local_now(),
        };
        self.finished = Some(finished.clone());
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alum_core::model::{SessionPhase, TestSettingsDraft};
    use alum_core::time::fixed_clock;

    fn q(n: u32) -> QuestionNumber {
        QuestionNumber::new(n)
    }

    fn settings(minutes: u32) -> TestSettings {
        TestSettingsDraft {
            time_limit_minutes: minutes,
            question_count: 3,
            option_count: 3,
            ..TestSettingsDraft::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn navigation_uses_service_clock_for_debounce() {
        let mut svc = SessionService::start(fixed_clock(), settings(0)).unwrap();
        assert_eq!(svc.next().len(), 1);
        assert!(svc.next().is_empty());

        svc.advance_clock(Duration::milliseconds(500));
        assert_eq!(svc.next().len(), 1);
        assert_eq!(svc.session().current_question(), q(3));
    }

    #[test]
    fn timeout_is_captured_as_finished_test() {
        let mut svc = SessionService::start(fixed_clock(), settings(1)).unwrap();
        svc.select_answer(q(1), "B");
        for _ in 0..60 {
            svc.question_tick();
            svc.tick();
        }

        let finished = svc.finished().expect("finished on time up");
        assert!(finished.outcome.time_up);
        assert_eq!(finished.outcome.total_used_secs, 60);
        assert_eq!(finished.outcome.per_question_secs.get(q(1)), Some(&60));
        assert_eq!(finished.finished_at, fixed_clock().local_now());
        assert_eq!(svc.session().phase(), SessionPhase::Finished);
        assert!(svc.finish(false).is_err());
    }

    #[test]
    fn cancel_keeps_nothing() {
        let mut svc = SessionService::start(fixed_clock(), settings(0)).unwrap();
        svc.cancel().unwrap();
        assert!(svc.finished().is_none());
        assert!(!svc.is_running());
        assert!(svc.tick().is_empty());
    }
}
