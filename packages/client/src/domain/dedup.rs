//! Quiz delivery deduplication.
//!
//! Push delivery is not assumed reliable, so quizzes also arrive through
//! periodic polling and catch-up fetches. Every producer goes through
//! [`QuizDeduplicator::offer`], which surfaces a question at most once and
//! never after it has been answered.

use std::collections::HashSet;

use super::quiz::QuizEvent;

/// Result of offering a quiz event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// First sighting; the event should be shown to the participant.
    Surfaced,
    /// The participant already answered this question.
    AlreadyAnswered,
    /// This question is the one currently surfaced.
    AlreadySurfaced,
    /// No session is open, so there is nothing to show the quiz in.
    NotConnected,
    /// The event belongs to a different session than the open one.
    SessionMismatch,
}

impl OfferOutcome {
    pub fn is_surfaced(&self) -> bool {
        matches!(self, OfferOutcome::Surfaced)
    }
}

/// Dedup state: answered ids plus the id of the currently surfaced prompt.
#[derive(Debug, Clone, Default)]
pub struct QuizDeduplicator {
    answered_question_ids: HashSet<String>,
    last_surfaced_question_id: Option<String>,
}

impl QuizDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, event: &QuizEvent) -> OfferOutcome {
        if self.answered_question_ids.contains(&event.question_id) {
            return OfferOutcome::AlreadyAnswered;
        }
        if self.last_surfaced_question_id.as_deref() == Some(event.question_id.as_str()) {
            return OfferOutcome::AlreadySurfaced;
        }

        self.last_surfaced_question_id = Some(event.question_id.clone());
        OfferOutcome::Surfaced
    }

    /// Record an answer. Returns `false` if it was already recorded.
    pub fn mark_answered(&mut self, question_id: impl Into<String>) -> bool {
        self.answered_question_ids.insert(question_id.into())
    }

    /// Merge the server's record of answered questions into local state.
    pub fn rehydrate<I>(&mut self, question_ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.answered_question_ids.len();
        self.answered_question_ids.extend(question_ids);
        self.answered_question_ids.len() - before
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answered_question_ids.contains(question_id)
    }

    pub fn last_surfaced(&self) -> Option<&str> {
        self.last_surfaced_question_id.as_deref()
    }

    pub fn answered_count(&self) -> usize {
        self.answered_question_ids.len()
    }

    /// Drop the surfaced marker but keep answers, so an unanswered question
    /// can be shown again once no prompt is open for it.
    pub fn forget_surfaced(&mut self) {
        self.last_surfaced_question_id = None;
    }

    pub fn reset(&mut self) {
        self.answered_question_ids.clear();
        self.last_surfaced_question_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionKey;

    fn quiz(id: &str) -> QuizEvent {
        QuizEvent {
            question_id: id.to_string(),
            text: format!("question {id}"),
            options: vec!["A".to_string(), "B".to_string()],
            time_limit_seconds: 30,
            source_session_key: SessionKey::new("S1".to_string()).unwrap(),
        }
    }

    #[test]
    fn test_offer_same_question_three_times_surfaces_once() {
        // テスト項目: socket / poll / catch-up が同じ問題を競合して渡しても表示は 1 回だけ
        // given (前提条件):
        let mut dedup = QuizDeduplicator::new();
        let event = quiz("q1");

        // when (操作):
        let outcomes: Vec<OfferOutcome> = (0..3).map(|_| dedup.offer(&event)).collect();

        // then (期待する結果):
        assert_eq!(
            outcomes,
            vec![
                OfferOutcome::Surfaced,
                OfferOutcome::AlreadySurfaced,
                OfferOutcome::AlreadySurfaced,
            ]
        );
        assert_eq!(dedup.last_surfaced(), Some("q1"));
    }

    #[test]
    fn test_offer_after_answer_is_rejected() {
        // テスト項目: 回答済みの問題は再表示されない
        // given (前提条件):
        let mut dedup = QuizDeduplicator::new();
        dedup.offer(&quiz("q1"));

        // when (操作):
        dedup.mark_answered("q1");
        let outcome = dedup.offer(&quiz("q1"));

        // then (期待する結果):
        assert_eq!(outcome, OfferOutcome::AlreadyAnswered);
    }

    #[test]
    fn test_answer_before_first_offer_wins() {
        // テスト項目: 先に回答が記録されていれば遅れて届いた offer は無視される
        // given (前提条件):
        let mut dedup = QuizDeduplicator::new();
        dedup.mark_answered("q7");

        // when (操作):
        let outcome = dedup.offer(&quiz("q7"));

        // then (期待する結果):
        assert_eq!(outcome, OfferOutcome::AlreadyAnswered);
        assert_eq!(dedup.last_surfaced(), None);
    }

    #[test]
    fn test_new_question_replaces_last_surfaced() {
        // テスト項目: 別の問題が届くと現在の問題が置き換わり、元の問題は再び表示可能になる
        // given (前提条件):
        let mut dedup = QuizDeduplicator::new();
        dedup.offer(&quiz("q1"));

        // when (操作):
        let second = dedup.offer(&quiz("q2"));
        let back_to_first = dedup.offer(&quiz("q1"));

        // then (期待する結果):
        assert_eq!(second, OfferOutcome::Surfaced);
        assert_eq!(back_to_first, OfferOutcome::Surfaced);
    }

    #[test]
    fn test_mark_answered_reports_duplicates() {
        // テスト項目: 同じ問題の回答を 2 回記録すると 2 回目は false
        // given (前提条件):
        let mut dedup = QuizDeduplicator::new();

        // when (操作):
        let first = dedup.mark_answered("q1");
        let second = dedup.mark_answered("q1".to_string());

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(dedup.answered_count(), 1);
    }

    #[test]
    fn test_rehydrate_merges_server_answers() {
        // テスト項目: サーバーの回答記録がローカルの記録に統合される
        // given (前提条件):
        let mut dedup = QuizDeduplicator::new();
        dedup.mark_answered("q1");

        // when (操作):
        let added = dedup.rehydrate(vec!["q1".to_string(), "q2".to_string()]);

        // then (期待する結果):
        assert_eq!(added, 1);
        assert!(dedup.is_answered("q1"));
        assert!(dedup.is_answered("q2"));
        assert_eq!(dedup.offer(&quiz("q2")), OfferOutcome::AlreadyAnswered);
    }

    #[test]
    fn test_forget_surfaced_keeps_answers() {
        // テスト項目: forget_surfaced 後は未回答の問題が再表示され、回答済みは拒否されたまま
        // given (前提条件):
        let mut dedup = QuizDeduplicator::new();
        dedup.offer(&quiz("q1"));
        dedup.mark_answered("q2");

        // when (操作):
        dedup.forget_surfaced();

        // then (期待する結果):
        assert_eq!(dedup.last_surfaced(), None);
        assert_eq!(dedup.offer(&quiz("q1")), OfferOutcome::Surfaced);
        assert_eq!(dedup.offer(&quiz("q2")), OfferOutcome::AlreadyAnswered);
        assert_eq!(dedup.answered_count(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        // テスト項目: reset で回答記録と表示中の問題がクリアされる
        // given (前提条件):
        let mut dedup = QuizDeduplicator::new();
        dedup.offer(&quiz("q1"));
        dedup.mark_answered("q2");

        // when (操作):
        dedup.reset();

        // then (期待する結果):
        assert_eq!(dedup.answered_count(), 0);
        assert_eq!(dedup.last_surfaced(), None);
        assert!(dedup.offer(&quiz("q1")).is_surfaced());
    }
}
