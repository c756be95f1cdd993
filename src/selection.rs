//! # Selection State Machine
//!
//! Owns the currently selected trip and its loaded track, and decides which
//! fetch results are allowed to land.
//!
//! ## Correlation
//!
//! Every transition that needs a fetch hands out a [`FetchTicket`] carrying
//! the trip id and a generation number. Only the ticket from the most recent
//! dispatch can resolve the state; anything older is reported as
//! [`Resolution::Stale`] and dropped. Selecting trip A, then B, then A again
//! therefore ignores the first A response even though the trip id matches.

use log::{debug, info, warn};

use crate::error::TrackViewError;
use crate::track::TrackFeatureCollection;
use crate::types::TripId;

/// Exactly one of the four pipeline states.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Loading {
        trip_id: TripId,
    },
    Ready {
        trip_id: TripId,
        track: TrackFeatureCollection,
    },
    Failed {
        trip_id: TripId,
        message: String,
    },
}

impl SelectionState {
    pub fn trip_id(&self) -> Option<TripId> {
        match self {
            SelectionState::Idle => None,
            SelectionState::Loading { trip_id }
            | SelectionState::Ready { trip_id, .. }
            | SelectionState::Failed { trip_id, .. } => Some(*trip_id),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            SelectionState::Idle => Status::Idle,
            SelectionState::Loading { .. } => Status::Loading,
            SelectionState::Ready { .. } => Status::Ready,
            SelectionState::Failed { .. } => Status::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Correlation tag for one dispatched fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub trip_id: TripId,
    pub generation: u64,
}

/// Outcome of feeding a fetch result back into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The result was for the active request and is now the state
    Applied(Status),
    /// The request was superseded; the result was discarded
    Stale,
}

#[derive(Debug, Default)]
pub struct Selection {
    state: SelectionState,
    /// Generation of the last dispatched ticket
    generation: u64,
    /// Bumped whenever `current_track` changes, including to `None`
    track_revision: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a trip, or deselect with `None`.
    ///
    /// Returns a ticket when a fetch must be dispatched. Re-selecting the
    /// current trip is a no-op.
    pub fn select(&mut self, trip_id: Option<TripId>) -> Option<FetchTicket> {
        match trip_id {
            None => {
                if self.state != SelectionState::Idle {
                    debug!("[Selection] Deselect from {:?}", self.state.status());
                }
                self.transition(SelectionState::Idle);
                None
            }
            Some(id) if self.state.trip_id() == Some(id) => {
                debug!("[Selection] Trip {} already selected, ignoring", id);
                None
            }
            Some(id) => {
                info!("[Selection] Selecting trip {}", id);
                Some(self.dispatch(id))
            }
        }
    }

    /// Fetch the selected trip again. `None` when nothing is selected.
    pub fn reload(&mut self) -> Option<FetchTicket> {
        let id = self.state.trip_id()?;
        info!("[Selection] Reloading trip {}", id);
        Some(self.dispatch(id))
    }

    /// Apply a fetch result if its ticket is still the active one.
    pub fn resolve(
        &mut self,
        ticket: FetchTicket,
        result: Result<TrackFeatureCollection, TrackViewError>,
    ) -> Resolution {
        let active = ticket.generation == self.generation
            && self.state == SelectionState::Loading {
                trip_id: ticket.trip_id,
            };
        if !active {
            debug!(
                "[Selection] Dropping stale response for trip {} (generation {}, current {})",
                ticket.trip_id, ticket.generation, self.generation
            );
            return Resolution::Stale;
        }

        let next = match result {
            Ok(track) => {
                info!(
                    "[Selection] Trip {} ready with {} features",
                    ticket.trip_id,
                    track.len()
                );
                SelectionState::Ready {
                    trip_id: ticket.trip_id,
                    track,
                }
            }
            Err(e) => {
                warn!("[Selection] Trip {} failed: {}", ticket.trip_id, e);
                SelectionState::Failed {
                    trip_id: ticket.trip_id,
                    message: e.to_string(),
                }
            }
        };
        self.transition(next);
        Resolution::Applied(self.state.status())
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn selected_trip_id(&self) -> Option<TripId> {
        self.state.trip_id()
    }

    pub fn current_track(&self) -> Option<&TrackFeatureCollection> {
        match &self.state {
            SelectionState::Ready { track, .. } => Some(track),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SelectionState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn track_revision(&self) -> u64 {
        self.track_revision
    }

    fn dispatch(&mut self, trip_id: TripId) -> FetchTicket {
        self.generation += 1;
        self.transition(SelectionState::Loading { trip_id });
        FetchTicket {
            trip_id,
            generation: self.generation,
        }
    }

    fn transition(&mut self, next: SelectionState) {
        let had_track = matches!(self.state, SelectionState::Ready { .. });
        let has_track = matches!(next, SelectionState::Ready { .. });
        self.state = next;
        if had_track || has_track {
            self.track_revision += 1;
        }
    }
}
