use crate::policy;
use crate::workflow::{AbortReason, Input, InvalidInput, PromptContext};
use chrono::{DateTime, NaiveDate, Utc};
use kernel::model::{
    booking::{event::CreateBooking, BookingKind},
    id::BookingId,
    room::Room,
};
use kernel::repository::booking::BookingRepository;
use shared::error::{AppError, AppResult};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ChooseRoom,
    ChooseDate,
    ChooseStart,
    ChooseEnd,
    ChooseReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Prompt { step: Step, context: PromptContext },
    Committed(BookingId),
    Aborted(AbortReason),
}

#[derive(Debug, Default)]
struct Draft {
    room: Option<Room>,
    date: Option<NaiveDate>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl Draft {
    fn room(&self) -> AppResult<Room> {
        self.room
            .ok_or_else(|| AppError::UnprocessableEntity("draft has no room yet".into()))
    }

    fn start(&self) -> AppResult<DateTime<Utc>> {
        self.start
            .ok_or_else(|| AppError::UnprocessableEntity("draft has no start time yet".into()))
    }

    fn end(&self) -> AppResult<DateTime<Utc>> {
        self.end
            .ok_or_else(|| AppError::UnprocessableEntity("draft has no end time yet".into()))
    }
}

/// The administrative block dialog. Shorter than the booking dialog: no
/// topic/identity steps and no separate confirm step; the reason text
/// commits the block. Blocks occupy the same conflict space as bookings
/// but never get reminders.
pub struct BlockWorkflow {
    repo: Arc<dyn BookingRepository>,
    step: Step,
    draft: Draft,
}

impl BlockWorkflow {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self {
            repo,
            step: Step::ChooseRoom,
            draft: Draft::default(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub async fn handle(&mut self, input: Input) -> AppResult<Reply> {
        if matches!(input, Input::Abort) {
            return Ok(Reply::Aborted(AbortReason::ActorCanceled));
        }
        match self.step {
            Step::ChooseRoom => Ok(self.on_room(input)),
            Step::ChooseDate => Ok(self.on_date(input)),
            Step::ChooseStart => Ok(self.on_start(input)),
            Step::ChooseEnd => self.on_end(input).await,
            Step::ChooseReason => self.on_reason(input).await,
        }
    }

    fn prompt(&mut self, step: Step, context: PromptContext) -> Reply {
        self.step = step;
        Reply::Prompt { step, context }
    }

    fn reprompt(&mut self, invalid: InvalidInput) -> Reply {
        Reply::Prompt {
            step: self.step,
            context: PromptContext::Invalid(invalid),
        }
    }

    fn on_room(&mut self, input: Input) -> Reply {
        let room = match input {
            Input::Room(room) => room,
            Input::Text(text) => match text.trim().parse::<Room>() {
                Ok(room) => room,
                Err(_) => return Reply::Aborted(AbortReason::UnknownRoom),
            },
            _ => return self.reprompt(InvalidInput::UnexpectedInput),
        };
        self.draft.room = Some(room);
        self.prompt(Step::ChooseDate, PromptContext::Empty)
    }

    fn on_date(&mut self, input: Input) -> Reply {
        let Input::Text(text) = input else {
            return self.reprompt(InvalidInput::UnexpectedInput);
        };
        let Some(date) = policy::parse_date(&text, Utc::now().date_naive()) else {
            return self.reprompt(InvalidInput::BadDate);
        };
        self.draft.date = Some(date);
        self.prompt(Step::ChooseStart, PromptContext::Empty)
    }

    fn on_start(&mut self, input: Input) -> Reply {
        let Input::Text(text) = input else {
            return self.reprompt(InvalidInput::UnexpectedInput);
        };
        let Some(time) = policy::parse_time(&text) else {
            return self.reprompt(InvalidInput::BadTime);
        };
        let Some(date) = self.draft.date else {
            return self.reprompt(InvalidInput::UnexpectedInput);
        };
        self.draft.start = Some(policy::combine(date, time));
        self.prompt(Step::ChooseEnd, PromptContext::Empty)
    }

    async fn on_end(&mut self, input: Input) -> AppResult<Reply> {
        let Input::Text(text) = input else {
            return Ok(self.reprompt(InvalidInput::UnexpectedInput));
        };
        let Some(time) = policy::parse_time(&text) else {
            return Ok(self.reprompt(InvalidInput::BadTime));
        };
        let Some(date) = self.draft.date else {
            return Ok(self.reprompt(InvalidInput::UnexpectedInput));
        };
        let start = self.draft.start()?;
        let end = policy::combine_end(date, time);
        if end <= start {
            return Ok(self.reprompt(InvalidInput::EndNotAfterStart));
        }

        let room = self.draft.room()?;
        let conflicts = self.repo.find_conflicts(room, start, end, None).await?;
        if !conflicts.is_empty() {
            // Existing bookings and blocks win; the admin picks another
            // interval or cancels them first.
            return Ok(Reply::Prompt {
                step: self.step,
                context: PromptContext::Conflicts(conflicts),
            });
        }

        self.draft.end = Some(end);
        Ok(self.prompt(Step::ChooseReason, PromptContext::Empty))
    }

    async fn on_reason(&mut self, input: Input) -> AppResult<Reply> {
        let Input::Text(text) = input else {
            return Ok(self.reprompt(InvalidInput::UnexpectedInput));
        };
        let reason = if policy::is_empty_marker(&text) {
            "block".to_string()
        } else {
            text.trim().to_string()
        };
        let room = self.draft.room()?;
        let start = self.draft.start()?;
        let end = self.draft.end()?;

        // Final re-check so blocks get the same race guard as bookings.
        let conflicts = self.repo.find_conflicts(room, start, end, None).await?;
        if !conflicts.is_empty() {
            return Ok(Reply::Aborted(AbortReason::SlotTaken));
        }

        let event = CreateBooking::new(room, start, end, BookingKind::Block { reason }, Utc::now());
        let id = match self.repo.create(event).await {
            Ok(id) => id,
            Err(AppError::SlotTaken(_)) => return Ok(Reply::Aborted(AbortReason::SlotTaken)),
            Err(e) => return Err(e),
        };
        Ok(Reply::Committed(id))
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_repo;
    use chrono::Duration;
    use kernel::model::id::OwnerId;

    fn text(s: &str) -> Input {
        Input::Text(s.into())
    }

    fn date_text(days_ahead: i64) -> String {
        (Utc::now() + Duration::days(days_ahead))
            .date_naive()
            .format("%d.%m.%Y")
            .to_string()
    }

    async fn seed_booking(repo: &Arc<dyn BookingRepository>, days_ahead: i64, h0: u32, h1: u32) {
        let day = (Utc::now() + Duration::days(days_ahead)).date_naive();
        let start = day.and_hms_opt(h0, 0, 0).unwrap().and_utc();
        let end = day.and_hms_opt(h1, 0, 0).unwrap().and_utc();
        repo.create(CreateBooking::new(
            Room::Floor3,
            start,
            end,
            BookingKind::Booking {
                owner_id: Some(OwnerId::new(1)),
                owner_name: "Jane Doe".into(),
                contact: None,
                topic: None,
            },
            Utc::now(),
        ))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn block_commits_and_occupies_the_conflict_space() {
        let repo = memory_repo().await;
        let mut wf = BlockWorkflow::new(repo.clone());

        wf.handle(Input::Room(Room::Floor3)).await.unwrap();
        wf.handle(text(&date_text(1))).await.unwrap();
        wf.handle(text("12:00")).await.unwrap();
        wf.handle(text("14:00")).await.unwrap();
        let reply = wf.handle(text("company all-hands")).await.unwrap();
        let Reply::Committed(id) = reply else {
            panic!("expected commit, got {reply:?}");
        };

        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert!(stored.is_block());

        let day = (Utc::now() + Duration::days(1)).date_naive();
        let start = day.and_hms_opt(13, 0, 0).unwrap().and_utc();
        let end = day.and_hms_opt(13, 30, 0).unwrap().and_utc();
        let conflicts = repo
            .find_conflicts(Room::Floor3, start, end, None)
            .await
            .unwrap();
        assert_eq!(conflicts.len(), 1);
    }

    #[tokio::test]
    async fn conflicting_interval_reprompts_the_end_step() {
        let repo = memory_repo().await;
        seed_booking(&repo, 1, 9, 10).await;

        let mut wf = BlockWorkflow::new(repo.clone());
        wf.handle(Input::Room(Room::Floor3)).await.unwrap();
        wf.handle(text(&date_text(1))).await.unwrap();
        wf.handle(text("09:30")).await.unwrap();

        let reply = wf.handle(text("10:30")).await.unwrap();
        let Reply::Prompt {
            step: Step::ChooseEnd,
            context: PromptContext::Conflicts(conflicts),
        } = reply
        else {
            panic!("expected an end-step re-prompt with conflicts");
        };
        assert_eq!(conflicts.len(), 1);
    }

    #[tokio::test]
    async fn racing_commit_aborts_at_the_reason_step() {
        let repo = memory_repo().await;
        let mut wf = BlockWorkflow::new(repo.clone());

        wf.handle(Input::Room(Room::Floor3)).await.unwrap();
        wf.handle(text(&date_text(1))).await.unwrap();
        wf.handle(text("15:00")).await.unwrap();
        wf.handle(text("16:00")).await.unwrap();

        // Another actor takes the slot while the admin types the reason.
        seed_booking(&repo, 1, 15, 16).await;

        let reply = wf.handle(text("maintenance")).await.unwrap();
        assert_eq!(reply, Reply::Aborted(AbortReason::SlotTaken));
    }

    #[tokio::test]
    async fn default_reason_is_used_for_the_empty_marker() {
        let repo = memory_repo().await;
        let mut wf = BlockWorkflow::new(repo.clone());
        wf.handle(Input::Room(Room::Floor4)).await.unwrap();
        wf.handle(text("tomorrow")).await.unwrap();
        wf.handle(text("08:00")).await.unwrap();
        wf.handle(text("09:00")).await.unwrap();
        let Reply::Committed(id) = wf.handle(text("-")).await.unwrap() else {
            panic!("expected commit");
        };
        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(
            stored.kind,
            BookingKind::Block {
                reason: "block".into()
            }
        );
    }
}
