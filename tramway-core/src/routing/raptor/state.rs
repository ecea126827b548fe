//! Per-query scratch state: labels, predecessors and marked stops.

use fixedbitset::FixedBitSet;

use super::Direction;
use crate::{ConnectionIdx, StopIdx, Time, TripIdx};

/// How a label was produced, enough to rebuild the journey backward.
///
/// In `ArriveBefore` searches the chain runs from the origin toward the
/// destination seeds, so `board_stop`/`board_time` hold the alighting side
/// there; the extractor interprets them per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Predecessor {
    Unreached,
    /// An access/egress candidate, with its street walk duration if any.
    Seed { walk: Option<Time> },
    /// Rode `trip`, having boarded at `board_stop` at `board_time`.
    Ride {
        trip: TripIdx,
        board_stop: StopIdx,
        board_time: Time,
    },
    /// Took the in-station connection from `prev_stop`, left at `prev_time`.
    Transfer {
        connection: ConnectionIdx,
        prev_stop: StopIdx,
        prev_time: Time,
    },
}

/// Dense `rounds x stops x datetimes` label arrays plus the running
/// per-(stop, datetime) best used for pruning. Batched datetimes share the
/// sweeps but never interfere: every slot and bound is per datetime index.
#[derive(Debug)]
pub(crate) struct RaptorState {
    direction: Direction,
    n_stops: usize,
    n_datetimes: usize,
    rounds: usize,
    labels: Vec<Time>,
    preds: Vec<Predecessor>,
    best: Vec<Time>,
    /// Stops improved per round, driving the next round's route collection.
    pub(crate) marked: Vec<FixedBitSet>,
}

impl RaptorState {
    pub(crate) fn new(
        direction: Direction,
        n_stops: usize,
        n_datetimes: usize,
        rounds: usize,
    ) -> Self {
        let slots = rounds * n_stops * n_datetimes;
        Self {
            direction,
            n_stops,
            n_datetimes,
            rounds,
            labels: vec![direction.unreached(); slots],
            preds: vec![Predecessor::Unreached; slots],
            best: vec![direction.unreached(); n_stops * n_datetimes],
            marked: (0..rounds)
                .map(|_| FixedBitSet::with_capacity(n_stops))
                .collect(),
        }
    }

    pub(crate) fn rounds(&self) -> usize {
        self.rounds
    }

    pub(crate) fn n_datetimes(&self) -> usize {
        self.n_datetimes
    }

    #[inline]
    fn slot(&self, round: usize, stop: StopIdx, dt: usize) -> usize {
        (round * self.n_stops + stop) * self.n_datetimes + dt
    }

    pub(crate) fn label(&self, round: usize, stop: StopIdx, dt: usize) -> Time {
        self.labels[self.slot(round, stop, dt)]
    }

    pub(crate) fn pred(&self, round: usize, stop: StopIdx, dt: usize) -> Predecessor {
        self.preds[self.slot(round, stop, dt)]
    }

    pub(crate) fn best(&self, stop: StopIdx, dt: usize) -> Time {
        self.best[stop * self.n_datetimes + dt]
    }

    /// Records `time` at the slot when it strictly improves the round label.
    /// Answers `true` only when it also beats the running best, which is
    /// what marks the stop for the next round; a label that merely improves
    /// its own round is kept for extraction but propagates nothing.
    pub(crate) fn update(
        &mut self,
        round: usize,
        stop: StopIdx,
        dt: usize,
        time: Time,
        pred: Predecessor,
    ) -> bool {
        let slot = self.slot(round, stop, dt);
        if self.direction.is_better(time, self.labels[slot]) {
            self.labels[slot] = time;
            self.preds[slot] = pred;
            let best = stop * self.n_datetimes + dt;
            if self.direction.is_better(time, self.best[best]) {
                self.best[best] = time;
                return true;
            }
        }
        false
    }
}
