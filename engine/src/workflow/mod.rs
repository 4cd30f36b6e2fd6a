//! Multi-step dialog state machines. Each workflow owns its draft and is
//! driven by the transport through `handle(Input)`; every reply is either a
//! prompt for the next step, a commit, or an abort.

use kernel::model::{booking::Booking, id::OwnerId, room::Room};

pub mod block;
pub mod booking;

/// The actor driving a workflow, as identified by the transport.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: OwnerId,
    pub username: Option<String>,
}

/// One piece of actor input forwarded by the transport.
#[derive(Debug, Clone)]
pub enum Input {
    Room(Room),
    Text(String),
    Confirm,
    Abort,
}

/// Read-only context attached to a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptContext {
    Empty,
    /// Existing occupancy for the chosen room and day, shown after the date
    /// step.
    DayOccupancy(Vec<Booking>),
    /// The records overlapping the candidate interval.
    Conflicts(Vec<Booking>),
    Invalid(InvalidInput),
}

/// Validation failures that re-prompt the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidInput {
    BadDate,
    PastDate,
    BeyondHorizon,
    BadTime,
    OutsideWorkingWindow,
    EndNotAfterStart,
    TooShort,
    AfterClosing,
    EmptyName,
    UnexpectedInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    ActorCanceled,
    UnknownRoom,
    /// Another actor committed an overlapping record during the dialog.
    SlotTaken,
}
