// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Pick-up and drop of job cards between the pool and calendar slots.
//!
//! The coordinator never touches the job store. A drop produces at most one
//! [`MutationIntent`]; the store only changes after the backend accepted the
//! intent and a full refetch came back.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::EmployeeFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::job_store::JobStore;

/// A (date, hour) cell of the day/week table.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub date: NaiveDate,
    pub hour: u32,
}

impl Slot {
    pub fn new(date: NaiveDate, hour: u32) -> Self {
        Self { date, hour }
    }

    /// Start and end of a fixed one-hour booking in this slot.
    ///
    /// The end hour wraps within the same day (`23` ends at `00:00` of the
    /// same date); it is never clamped to the display axis.
    pub fn booking(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = NaiveTime::from_hms_opt(self.hour, 0, 0)?;
        let end = NaiveTime::from_hms_opt((self.hour + 1) % 24, 0, 0)?;
        Some((self.date.and_time(start), self.date.and_time(end)))
    }
}

/// Where a card was picked up from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Region {
    Pool,
    Slot { date: NaiveDate, hour: u32 },
}

/// A place a card can be released over.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropTarget {
    Pool,
    Slot { date: NaiveDate, hour: u32 },
}

impl DropTarget {
    pub fn slot(slot: Slot) -> Self {
        DropTarget::Slot {
            date: slot.date,
            hour: slot.hour,
        }
    }
}

/// A desired backend change, not yet applied locally.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationIntent {
    /// Clear start/end, set `open`, delete every assignment of the job.
    Unassign { job_id: String },
    /// Set `planned` with a one-hour booking; bind `assignee` when the
    /// employee filter was active at drop time.
    Schedule {
        job_id: String,
        #[serde(with = "common::wire_datetime")]
        start: NaiveDateTime,
        #[serde(with = "common::wire_datetime")]
        end: NaiveDateTime,
        assignee: Option<String>,
    },
}

impl MutationIntent {
    pub fn job_id(&self) -> &str {
        match self {
            MutationIntent::Unassign { job_id } | MutationIntent::Schedule { job_id, .. } => job_id,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DragSession {
    pub job_id: String,
    pub source: Region,
    pub candidate: Option<DropTarget>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
    /// Waiting for the backend to resolve the emitted intent.
    Dropped { job_id: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DragError {
    #[error("A drag of job {0} is already in progress")]
    AlreadyDragging(String),
    #[error("A drop of job {0} is still being saved")]
    AwaitingResolution(String),
}

/// One drag session per document; a second pick-up is refused.
#[derive(Debug, Clone, Default)]
pub struct DragDropCoordinator {
    state: DragState,
}

impl DragDropCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    /// `Idle -> Dragging`. Unknown jobs are ignored and leave the state idle.
    pub fn pick_up(
        &mut self,
        job_id: &str,
        source: Region,
        store: &JobStore,
    ) -> Result<bool, DragError> {
        match &self.state {
            DragState::Dragging(session) => {
                return Err(DragError::AlreadyDragging(session.job_id.clone()));
            }
            DragState::Dropped { job_id } => {
                return Err(DragError::AwaitingResolution(job_id.clone()));
            }
            DragState::Idle => {}
        }
        if store.find_by_id(job_id).is_none() {
            debug!("Ignoring pick-up of unknown job {}", job_id);
            return Ok(false);
        }
        debug!("Picked up job {} from {:?}", job_id, source);
        self.state = DragState::Dragging(DragSession {
            job_id: job_id.to_string(),
            source,
            candidate: None,
        });
        Ok(true)
    }

    /// Records the target currently under the pointer, for drag-over highlighting.
    pub fn hover(&mut self, target: Option<DropTarget>) {
        if let DragState::Dragging(session) = &mut self.state {
            session.candidate = target;
        }
    }

    /// Aborts the gesture without emitting anything.
    pub fn cancel(&mut self) {
        if let DragState::Dragging(session) = &self.state {
            debug!("Drag of job {} cancelled", session.job_id);
            self.state = DragState::Idle;
        }
    }

    /// `Dragging -> Dropped` with exactly one intent, or back to `Idle` with
    /// none when the target is missing, invalid, or the job vanished.
    pub fn drop_on(
        &mut self,
        target: Option<DropTarget>,
        filter: &EmployeeFilter,
        store: &JobStore,
    ) -> Option<MutationIntent> {
        let session = match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => session,
            other => {
                self.state = other;
                warn!("Drop received without an active drag");
                return None;
            }
        };

        let Some(target) = target else {
            debug!("Job {} released outside any target", session.job_id);
            return None;
        };

        if store.find_by_id(&session.job_id).is_none() {
            debug!("Dropped job {} is no longer in the store", session.job_id);
            return None;
        }

        let intent = match target {
            DropTarget::Pool => MutationIntent::Unassign {
                job_id: session.job_id.clone(),
            },
            DropTarget::Slot { date, hour } => {
                let Some((start, end)) = Slot::new(date, hour).booking() else {
                    warn!("Ignoring drop on invalid hour {} of {}", hour, date);
                    return None;
                };
                MutationIntent::Schedule {
                    job_id: session.job_id.clone(),
                    start,
                    end,
                    assignee: filter.employee_id().map(str::to_string),
                }
            }
        };

        info!("Job {} dropped on {:?}", session.job_id, target);
        self.state = DragState::Dropped {
            job_id: session.job_id,
        };
        Some(intent)
    }

    /// `Dropped -> Idle` once the backend answered, whatever the answer.
    pub fn resolve(&mut self) {
        if let DragState::Dropped { job_id } = &self.state {
            debug!("Drop of job {} resolved", job_id);
            self.state = DragState::Idle;
        }
    }
}
