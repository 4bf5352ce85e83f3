//! Client-side optimistic reaction state.
//!
//! A reaction widget shows like/dislike counters and the viewer's own
//! reaction. When the viewer clicks, the widget applies the toggle locally
//! before the server answers, and restores the pre-click values if the server
//! rejects the change. One `OptimisticReactions` value belongs to one widget
//! instance (one city, one session); nothing here is global.

use crate::core::toggle::{transition, ToggleError, ToggleErrorKind};
use crate::models::{CityCounts, PreferenceKind, PreferenceState};
use thiserror::Error;

/// What the widget currently displays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionView {
    pub likes_count: u32,
    pub dislikes_count: u32,
    pub mine: PreferenceState,
}

impl ReactionView {
    /// Apply a requested reaction the same way the server-side toggle does
    pub fn apply(self, requested: PreferenceKind) -> Self {
        let (next, _) = transition(self.mine, requested);
        let mut view = self;

        match self.mine.kind() {
            Some(PreferenceKind::Like) => view.likes_count = view.likes_count.saturating_sub(1),
            Some(PreferenceKind::Dislike) => view.dislikes_count = view.dislikes_count.saturating_sub(1),
            None => {}
        }

        match next.kind() {
            Some(PreferenceKind::Like) => view.likes_count = view.likes_count.saturating_add(1),
            Some(PreferenceKind::Dislike) => view.dislikes_count = view.dislikes_count.saturating_add(1),
            None => {}
        }

        view.mine = next;
        view
    }
}

/// An attempt that has been applied locally and awaits the server
///
/// Carries the snapshot taken right before its own optimistic update.
#[derive(Debug)]
pub struct PendingReaction {
    attempt: u64,
    snapshot: ReactionView,
}

impl PendingReaction {
    pub fn snapshot(&self) -> ReactionView {
        self.snapshot
    }
}

/// How the server round-trip ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Confirmed,
    Rejected(ToggleErrorKind),
    /// The request never produced a typed answer (connection lost, timeout)
    TransportFailed,
}

impl From<&Result<PreferenceState, ToggleError>> for AttemptOutcome {
    fn from(result: &Result<PreferenceState, ToggleError>) -> Self {
        match result {
            Ok(_) => AttemptOutcome::Confirmed,
            Err(err) => AttemptOutcome::Rejected(err.kind()),
        }
    }
}

/// What the widget should do after settling an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Committed,
    RolledBack,
    /// Rolled back; the viewer must be sent to the login page
    RedirectToLogin,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimisticError {
    #[error("a reaction is already in flight")]
    Busy,

    #[error("attempt {0} is not the one in flight")]
    StaleAttempt(u64),
}

/// Optimistic like/dislike state for one widget
#[derive(Debug, Clone)]
pub struct OptimisticReactions {
    view: ReactionView,
    in_flight: Option<u64>,
    next_attempt: u64,
}

impl OptimisticReactions {
    pub fn new(counts: CityCounts, mine: PreferenceState) -> Self {
        Self {
            view: ReactionView {
                likes_count: counts.likes_count,
                dislikes_count: counts.dislikes_count,
                mine,
            },
            in_flight: None,
            next_attempt: 1,
        }
    }

    pub fn view(&self) -> ReactionView {
        self.view
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Apply `requested` locally and start an attempt
    ///
    /// Refused while another attempt is in flight.
    pub fn begin(&mut self, requested: PreferenceKind) -> Result<PendingReaction, OptimisticError> {
        if self.in_flight.is_some() {
            return Err(OptimisticError::Busy);
        }

        let attempt = self.next_attempt;
        self.next_attempt += 1;

        let pending = PendingReaction {
            attempt,
            snapshot: self.view,
        };

        self.view = self.view.apply(requested);
        self.in_flight = Some(attempt);

        Ok(pending)
    }

    /// Finish an attempt: keep the optimistic view on success, otherwise
    /// restore the attempt's snapshot
    pub fn settle(
        &mut self,
        pending: PendingReaction,
        outcome: AttemptOutcome,
    ) -> Result<Settlement, OptimisticError> {
        if self.in_flight != Some(pending.attempt) {
            return Err(OptimisticError::StaleAttempt(pending.attempt));
        }
        self.in_flight = None;

        match outcome {
            AttemptOutcome::Confirmed => Ok(Settlement::Committed),
            AttemptOutcome::Rejected(ToggleErrorKind::Unauthenticated) => {
                self.view = pending.snapshot;
                Ok(Settlement::RedirectToLogin)
            }
            AttemptOutcome::Rejected(_) | AttemptOutcome::TransportFailed => {
                self.view = pending.snapshot;
                Ok(Settlement::RolledBack)
            }
        }
    }

    /// Replace the counters with fresh values from the source of truth
    ///
    /// Ignored while an attempt is in flight; returns whether it applied.
    pub fn refresh(&mut self, counts: CityCounts) -> bool {
        if self.is_busy() {
            return false;
        }
        self.view.likes_count = counts.likes_count;
        self.view.dislikes_count = counts.dislikes_count;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(likes: u32, dislikes: u32) -> CityCounts {
        CityCounts {
            likes_count: likes,
            dislikes_count: dislikes,
        }
    }

    #[test]
    fn test_apply_mirrors_transition_table() {
        let base = ReactionView { likes_count: 10, dislikes_count: 3, mine: PreferenceState::None };

        let liked = base.apply(PreferenceKind::Like);
        assert_eq!((liked.likes_count, liked.dislikes_count, liked.mine), (11, 3, PreferenceState::Liked));

        let cleared = liked.apply(PreferenceKind::Like);
        assert_eq!(cleared, base);

        let switched = liked.apply(PreferenceKind::Dislike);
        assert_eq!(
            (switched.likes_count, switched.dislikes_count, switched.mine),
            (10, 4, PreferenceState::Disliked)
        );
    }

    #[test]
    fn test_apply_never_underflows() {
        let view = ReactionView { likes_count: 0, dislikes_count: 0, mine: PreferenceState::Liked };
        let cleared = view.apply(PreferenceKind::Like);
        assert_eq!(cleared.likes_count, 0);
        assert_eq!(cleared.mine, PreferenceState::None);
    }

    #[test]
    fn test_confirmed_attempt_keeps_optimistic_view() {
        let mut reactions = OptimisticReactions::new(counts(5, 1), PreferenceState::None);

        let pending = reactions.begin(PreferenceKind::Like).unwrap();
        assert!(reactions.is_busy());
        assert_eq!(reactions.view().likes_count, 6);

        let settlement = reactions.settle(pending, AttemptOutcome::Confirmed).unwrap();
        assert_eq!(settlement, Settlement::Committed);
        assert_eq!(reactions.view().likes_count, 6);
        assert_eq!(reactions.view().mine, PreferenceState::Liked);
        assert!(!reactions.is_busy());
    }

    #[test]
    fn test_failed_attempt_restores_snapshot() {
        let mut reactions = OptimisticReactions::new(counts(5, 1), PreferenceState::Disliked);
        let before = reactions.view();

        let pending = reactions.begin(PreferenceKind::Like).unwrap();
        assert_eq!(pending.snapshot(), before);
        assert_eq!(reactions.view().dislikes_count, 0);

        let settlement = reactions
            .settle(pending, AttemptOutcome::Rejected(ToggleErrorKind::UpdateFailed))
            .unwrap();
        assert_eq!(settlement, Settlement::RolledBack);
        assert_eq!(reactions.view(), before);
    }

    #[test]
    fn test_transport_failure_restores_own_reaction() {
        let mut reactions = OptimisticReactions::new(counts(2, 2), PreferenceState::Liked);
        let before = reactions.view();

        let pending = reactions.begin(PreferenceKind::Dislike).unwrap();
        reactions.settle(pending, AttemptOutcome::TransportFailed).unwrap();

        // The viewer's reaction comes back too, not just the counters
        assert_eq!(reactions.view().mine, PreferenceState::Liked);
        assert_eq!(reactions.view(), before);
    }

    #[test]
    fn test_unauthenticated_rolls_back_and_redirects() {
        let mut reactions = OptimisticReactions::new(counts(0, 0), PreferenceState::None);

        let pending = reactions.begin(PreferenceKind::Dislike).unwrap();
        let result: Result<PreferenceState, ToggleError> = Err(ToggleError::Unauthenticated);
        let outcome = AttemptOutcome::from(&result);
        let settlement = reactions.settle(pending, outcome).unwrap();

        assert_eq!(settlement, Settlement::RedirectToLogin);
        assert_eq!(reactions.view().dislikes_count, 0);
        assert_eq!(reactions.view().mine, PreferenceState::None);
    }

    #[test]
    fn test_in_flight_attempt_blocks_new_one() {
        let mut reactions = OptimisticReactions::new(counts(1, 1), PreferenceState::None);

        let pending = reactions.begin(PreferenceKind::Like).unwrap();
        assert_eq!(reactions.begin(PreferenceKind::Dislike).unwrap_err(), OptimisticError::Busy);
        assert!(!reactions.refresh(counts(100, 100)));

        reactions.settle(pending, AttemptOutcome::Confirmed).unwrap();
        assert!(reactions.begin(PreferenceKind::Dislike).is_ok());
    }

    #[test]
    fn test_each_attempt_captures_its_own_snapshot() {
        let mut reactions = OptimisticReactions::new(counts(3, 0), PreferenceState::None);

        let first = reactions.begin(PreferenceKind::Like).unwrap();
        reactions.settle(first, AttemptOutcome::Confirmed).unwrap();
        let after_first = reactions.view();

        let second = reactions.begin(PreferenceKind::Dislike).unwrap();
        assert_eq!(second.snapshot(), after_first);
        reactions.settle(second, AttemptOutcome::TransportFailed).unwrap();

        assert_eq!(reactions.view(), after_first);
        assert_eq!(reactions.view().likes_count, 4);
    }

    #[test]
    fn test_refresh_when_idle() {
        let mut reactions = OptimisticReactions::new(counts(1, 1), PreferenceState::Liked);
        assert!(reactions.refresh(counts(7, 2)));
        assert_eq!(reactions.view().likes_count, 7);
        assert_eq!(reactions.view().mine, PreferenceState::Liked);
    }
}
