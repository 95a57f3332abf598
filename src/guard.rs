// src/guard.rs
//
// Client Session Guard: the state machine a student-side client drives to
// detect suspicious signals and gate quiz progress until the server
// authorizes continuation. Detection state lives in an explicit session
// object; every detector is a function of (state, signal) -> effects, with
// no hidden globals. The server never sees grace periods; suppressing
// reports during them is entirely this module's job.

use std::time::{Duration, Instant};

use crate::models::{
    quiz::QuizQuestion,
    result::AnswerRecord,
    violation::ResolveAction,
};

/// Settling window after quiz start, while fullscreen/focus APIs fire
/// spurious events.
pub const INITIAL_GRACE: Duration = Duration::from_secs(5);

/// Shorter window after an admin approval, so re-requesting fullscreen
/// does not immediately re-trigger the detectors.
pub const RESUME_GRACE: Duration = Duration::from_secs(3);

/// Phase of the guard. GracePeriod -> Monitoring -> (Locked <-> Monitoring)
/// -> Terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    /// No detector fires until `until` has passed.
    GracePeriod { until: Instant },
    Monitoring,
    /// Timer and UI frozen; only a targeted resolution event exits this.
    Locked,
    Terminated,
}

/// Browser/OS-level signals correlated with cheating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspectSignal {
    VisibilityHidden,
    FocusLost,
    FullscreenExit,
    WindowBlur,
    CopyPaste,
}

impl SuspectSignal {
    /// Category label reported to the server and shown to admins.
    pub fn label(self) -> &'static str {
        match self {
            SuspectSignal::VisibilityHidden | SuspectSignal::FocusLost => {
                "Tab Switch / Window Blur"
            }
            SuspectSignal::FullscreenExit => "Exited Full Screen",
            SuspectSignal::WindowBlur => "Window Focus Lost",
            SuspectSignal::CopyPaste => "Copy/Paste Attempt",
        }
    }
}

/// What the surrounding client must do after feeding the guard an input.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardEffect {
    /// Emit a violation report over the real-time channel.
    Report { kind: &'static str },
    /// Moved on to the question at `index`; countdown was reset.
    Advance { index: usize },
    /// Session is over; send the answer set to the submission gate.
    /// `forced` marks a rejection-driven submission.
    Submit {
        answers: Vec<AnswerRecord>,
        forced: bool,
    },
    /// Server-side tally was reset to zero by an approval.
    ResetViolations,
}

/// Per-student, client-side guard session.
pub struct GuardSession {
    phase: GuardPhase,
    questions: Vec<QuizQuestion>,
    per_question: u32,
    remaining: u32,
    index: usize,
    selected: Option<String>,
    answers: Vec<AnswerRecord>,
    started: Instant,
}

impl GuardSession {
    pub fn new(questions: Vec<QuizQuestion>, per_question_secs: u32, now: Instant) -> Self {
        Self {
            phase: GuardPhase::GracePeriod {
                until: now + INITIAL_GRACE,
            },
            questions,
            per_question: per_question_secs,
            remaining: per_question_secs,
            index: 0,
            selected: None,
            answers: Vec::new(),
            started: now,
        }
    }

    pub fn phase(&self) -> GuardPhase {
        self.phase
    }

    pub fn is_locked(&self) -> bool {
        self.phase == GuardPhase::Locked
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == GuardPhase::Terminated
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.index)
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    /// Local score: count of correct answers so far.
    pub fn score(&self) -> i64 {
        self.answers.iter().filter(|a| a.is_correct).count() as i64
    }

    /// Whole-session elapsed time in seconds.
    pub fn elapsed_secs(&self, now: Instant) -> i64 {
        now.duration_since(self.started).as_secs() as i64
    }

    fn in_grace(&mut self, now: Instant) -> bool {
        if let GuardPhase::GracePeriod { until } = self.phase {
            if now < until {
                return true;
            }
            self.phase = GuardPhase::Monitoring;
        }
        false
    }

    /// Feeds one suspicious signal into the guard.
    ///
    /// Emits at most one report per lock: signals while already locked,
    /// terminated, or within a grace period produce nothing, so
    /// overlapping detectors within one tick cannot double-report.
    pub fn observe(&mut self, signal: SuspectSignal, now: Instant) -> Option<GuardEffect> {
        match self.phase {
            GuardPhase::Locked | GuardPhase::Terminated => return None,
            _ => {}
        }
        if self.in_grace(now) {
            return None;
        }

        self.phase = GuardPhase::Locked;
        Some(GuardEffect::Report {
            kind: signal.label(),
        })
    }

    /// Records the student's current option choice. Ignored while the UI
    /// is frozen.
    pub fn select(&mut self, option: &str) {
        match self.phase {
            GuardPhase::Locked | GuardPhase::Terminated => {}
            _ => self.selected = Some(option.to_string()),
        }
    }

    /// One second of countdown. Frozen while locked; reaching zero behaves
    /// exactly like an explicit `next()`.
    pub fn tick(&mut self, now: Instant) -> Option<GuardEffect> {
        match self.phase {
            GuardPhase::Locked | GuardPhase::Terminated => return None,
            _ => {}
        }
        self.in_grace(now);

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            return self.advance(false);
        }
        None
    }

    /// Explicit "next question" action.
    pub fn next(&mut self, _now: Instant) -> Option<GuardEffect> {
        match self.phase {
            GuardPhase::Locked | GuardPhase::Terminated => None,
            _ => self.advance(false),
        }
    }

    /// Applies a targeted resolution event received from the server.
    pub fn resolve(&mut self, action: ResolveAction, now: Instant) -> Vec<GuardEffect> {
        if self.phase != GuardPhase::Locked {
            return Vec::new();
        }
        match action {
            ResolveAction::Approve => {
                self.phase = GuardPhase::GracePeriod {
                    until: now + RESUME_GRACE,
                };
                vec![GuardEffect::ResetViolations]
            }
            ResolveAction::Reject => {
                self.phase = GuardPhase::Terminated;
                vec![GuardEffect::Submit {
                    answers: self.answers.clone(),
                    forced: true,
                }]
            }
        }
    }

    /// Records the current selection (possibly empty) and moves on, or
    /// finishes the session on the final question.
    fn advance(&mut self, forced: bool) -> Option<GuardEffect> {
        let question = self.questions.get(self.index)?;
        let selected = self.selected.take().unwrap_or_default();
        let is_correct = !selected.is_empty() && selected == question.correct_answer;

        self.answers.push(AnswerRecord {
            question_id: question.id,
            selected_option: selected,
            is_correct,
        });

        if self.index + 1 < self.questions.len() {
            self.index += 1;
            self.remaining = self.per_question;
            Some(GuardEffect::Advance { index: self.index })
        } else {
            self.phase = GuardPhase::Terminated;
            Some(GuardEffect::Submit {
                answers: self.answers.clone(),
                forced,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, correct: &str) -> QuizQuestion {
        QuizQuestion {
            id,
            question: format!("Question {}", id),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: correct.to_string(),
            explanation: None,
        }
    }

    fn session(n: usize) -> (GuardSession, Instant) {
        let now = Instant::now();
        let questions = (1..=n as i64).map(|i| question(i, "A")).collect();
        (GuardSession::new(questions, 45, now), now)
    }

    /// Time after the initial grace window has settled.
    fn armed(now: Instant) -> Instant {
        now + INITIAL_GRACE + Duration::from_millis(1)
    }

    #[test]
    fn signals_during_initial_grace_are_suppressed() {
        let (mut guard, now) = session(3);
        let effect = guard.observe(SuspectSignal::FullscreenExit, now + Duration::from_secs(2));
        assert_eq!(effect, None);
        assert_eq!(guard.phase(), GuardPhase::GracePeriod { until: now + INITIAL_GRACE });
    }

    #[test]
    fn signal_after_grace_locks_and_reports_once() {
        let (mut guard, now) = session(3);
        let t = armed(now);

        let effect = guard.observe(SuspectSignal::VisibilityHidden, t);
        assert_eq!(
            effect,
            Some(GuardEffect::Report {
                kind: "Tab Switch / Window Blur"
            })
        );
        assert!(guard.is_locked());
    }

    #[test]
    fn no_duplicate_reports_while_locked() {
        let (mut guard, now) = session(3);
        let t = armed(now);

        assert!(guard.observe(SuspectSignal::WindowBlur, t).is_some());

        // Two more signals one second apart, still locked: nothing emitted.
        assert_eq!(guard.observe(SuspectSignal::CopyPaste, t + Duration::from_secs(1)), None);
        assert_eq!(
            guard.observe(SuspectSignal::FullscreenExit, t + Duration::from_secs(2)),
            None
        );
    }

    #[test]
    fn timer_is_frozen_while_locked() {
        let (mut guard, now) = session(3);
        let t = armed(now);
        guard.observe(SuspectSignal::FocusLost, t);

        let before = guard.remaining_secs();
        assert_eq!(guard.tick(t + Duration::from_secs(1)), None);
        assert_eq!(guard.remaining_secs(), before);
    }

    #[test]
    fn approve_enters_resume_grace_then_rearms() {
        let (mut guard, now) = session(3);
        let t = armed(now);
        guard.observe(SuspectSignal::FullscreenExit, t);

        let effects = guard.resolve(ResolveAction::Approve, t);
        assert_eq!(effects, vec![GuardEffect::ResetViolations]);
        assert_eq!(guard.phase(), GuardPhase::GracePeriod { until: t + RESUME_GRACE });

        // Re-requesting fullscreen during resume grace must not re-lock.
        assert_eq!(
            guard.observe(SuspectSignal::FullscreenExit, t + Duration::from_secs(1)),
            None
        );

        // After the grace expires the detectors are armed again.
        let later = t + RESUME_GRACE + Duration::from_millis(1);
        assert!(guard.observe(SuspectSignal::WindowBlur, later).is_some());
        assert!(guard.is_locked());
    }

    #[test]
    fn reject_terminates_and_force_submits() {
        let (mut guard, now) = session(3);
        let t = armed(now);

        guard.select("A");
        guard.next(t);
        guard.observe(SuspectSignal::CopyPaste, t + Duration::from_secs(1));

        let effects = guard.resolve(ResolveAction::Reject, t + Duration::from_secs(2));
        match effects.as_slice() {
            [GuardEffect::Submit { answers, forced }] => {
                assert!(*forced);
                assert_eq!(answers.len(), 1);
                assert_eq!(answers[0].question_id, 1);
            }
            other => panic!("expected forced submit, got {:?}", other),
        }
        assert!(guard.is_terminated());

        // Nothing more comes out of a terminated session.
        assert_eq!(guard.observe(SuspectSignal::WindowBlur, t + Duration::from_secs(3)), None);
        assert_eq!(guard.tick(t + Duration::from_secs(4)), None);
    }

    #[test]
    fn resolution_without_a_lock_is_a_no_op() {
        let (mut guard, now) = session(3);
        assert!(guard.resolve(ResolveAction::Approve, armed(now)).is_empty());
        assert_eq!(guard.phase(), GuardPhase::GracePeriod { until: now + INITIAL_GRACE });
    }

    #[test]
    fn timer_expiry_advances_with_empty_selection() {
        let (mut guard, now) = session(2);
        let t = armed(now);

        let mut effect = None;
        for i in 1..=45 {
            effect = guard.tick(t + Duration::from_secs(i));
        }
        assert_eq!(effect, Some(GuardEffect::Advance { index: 1 }));
        assert_eq!(guard.answers().len(), 1);
        assert_eq!(guard.answers()[0].selected_option, "");
        assert!(!guard.answers()[0].is_correct);
        assert_eq!(guard.remaining_secs(), 45);
    }

    #[test]
    fn selection_is_graded_against_the_answer_key() {
        let (mut guard, now) = session(2);
        let t = armed(now);

        guard.select("A");
        guard.next(t);
        guard.select("B");
        guard.next(t);

        assert_eq!(guard.score(), 1);
        assert!(guard.answers()[0].is_correct);
        assert!(!guard.answers()[1].is_correct);
    }

    #[test]
    fn final_question_completes_the_session() {
        let (mut guard, now) = session(2);
        let t = armed(now);

        guard.select("A");
        guard.next(t);
        guard.select("A");
        let effect = guard.next(t);

        match effect {
            Some(GuardEffect::Submit { answers, forced }) => {
                assert!(!forced);
                assert_eq!(answers.len(), 2);
            }
            other => panic!("expected submit, got {:?}", other),
        }
        assert!(guard.is_terminated());
    }

    #[test]
    fn selection_is_ignored_while_locked() {
        let (mut guard, now) = session(2);
        let t = armed(now);
        guard.observe(SuspectSignal::WindowBlur, t);

        guard.select("A");
        let effects = guard.resolve(ResolveAction::Reject, t);
        match effects.as_slice() {
            [GuardEffect::Submit { answers, .. }] => assert!(answers.is_empty()),
            other => panic!("expected forced submit, got {:?}", other),
        }
    }
}
