// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling state machine.

use std::fmt;

/// Where a poller is in its refresh cycle.
///
/// | state      | next tick does                       |
/// |------------|--------------------------------------|
/// | `Fresh`    | info refresh, then state refresh     |
/// | `Steady`   | state refresh                        |
/// | `Degraded` | info refresh, then state refresh     |
///
/// `Fresh` and `Degraded` behave the same; they are kept apart so logs and
/// callers can tell a first start from a recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PollState {
    /// Nothing refreshed yet.
    #[default]
    Fresh,
    /// Last state refresh succeeded.
    Steady,
    /// Last state refresh failed; info must be refreshed again first.
    Degraded,
}

/// Result of one refresh handler, fed into [`PollState::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Info refresh succeeded; a state refresh follows in the same tick.
    InfoSucceeded,
    /// Info refresh failed.
    InfoFailed,
    /// State refresh succeeded.
    StateSucceeded,
    /// State refresh failed.
    StateFailed,
}

impl PollState {
    /// Returns true if the next tick starts with an info refresh.
    #[must_use]
    pub fn info_pending(self) -> bool {
        matches!(self, Self::Fresh | Self::Degraded)
    }

    /// Returns true if the next tick goes straight to a state refresh.
    #[must_use]
    pub fn state_pending(self) -> bool {
        matches!(self, Self::Steady)
    }

    /// Applies a transition.
    ///
    /// Info results never change the state on their own: success hands over
    /// to the state refresh that follows, failure leaves info pending.
    #[must_use]
    pub fn next(self, transition: Transition) -> Self {
        match transition {
            Transition::InfoSucceeded | Transition::InfoFailed => self,
            Transition::StateSucceeded => Self::Steady,
            Transition::StateFailed => Self::Degraded,
        }
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => f.write_str("fresh"),
            Self::Steady => f.write_str("steady"),
            Self::Degraded => f.write_str("degraded"),
        }
    }
}

/// What one refresh handler did during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Refresh {
    /// The handler did not run.
    #[default]
    Skipped,
    /// The handler ran and succeeded.
    Succeeded,
    /// The handler ran and failed.
    Failed,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Info refresh outcome.
    pub info: Refresh,
    /// State refresh outcome.
    pub state: Refresh,
}

impl TickReport {
    /// Returns true if any handler failed.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.info == Refresh::Failed || self.state == Refresh::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_flags() {
        let state = PollState::default();
        assert_eq!(state, PollState::Fresh);
        assert!(state.info_pending());
        assert!(!state.state_pending());
    }

    #[test]
    fn flags_are_exclusive() {
        for state in [PollState::Fresh, PollState::Steady, PollState::Degraded] {
            assert_ne!(state.info_pending(), state.state_pending(), "{state}");
        }
    }

    #[test]
    fn transition_table() {
        use PollState::{Degraded, Fresh, Steady};
        use Transition::{InfoFailed, InfoSucceeded, StateFailed, StateSucceeded};

        let cases = [
            (Fresh, InfoSucceeded, Fresh),
            (Fresh, InfoFailed, Fresh),
            (Fresh, StateSucceeded, Steady),
            (Fresh, StateFailed, Degraded),
            (Steady, StateSucceeded, Steady),
            (Steady, StateFailed, Degraded),
            (Degraded, InfoSucceeded, Degraded),
            (Degraded, InfoFailed, Degraded),
            (Degraded, StateSucceeded, Steady),
            (Degraded, StateFailed, Degraded),
        ];
        for (from, transition, to) in cases {
            assert_eq!(from.next(transition), to, "{from} + {transition:?}");
        }
    }

    #[test]
    fn degraded_requires_info_refresh() {
        let state = PollState::Steady.next(Transition::StateFailed);
        assert!(state.info_pending());
        assert!(!state.state_pending());
    }

    #[test]
    fn report_failed() {
        assert!(!TickReport::default().failed());
        assert!(
            TickReport {
                info: Refresh::Succeeded,
                state: Refresh::Failed,
            }
            .failed()
        );
    }
}
