use crate::policy;
use crate::reminder::ReminderScheduler;
use crate::workflow::{AbortReason, Actor, Input, InvalidInput, PromptContext};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use kernel::model::{
    booking::{event::CreateBooking, BookingKind},
    id::BookingId,
    room::Room,
};
use kernel::notifier::{Notification, Notifier};
use kernel::repository::booking::BookingRepository;
use shared::error::{AppError, AppResult};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ChooseRoom,
    ChooseDate,
    ChooseStart,
    ChooseEnd,
    ChooseTopic,
    ChooseName,
    ChooseContact,
    Confirm,
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
    topic: Option<String>,
    owner_name: Option<String>,
    contact: Option<String>,
}

impl Draft {
    fn room(&self) -> AppResult<Room> {
        self.room
            .ok_or_else(|| AppError::UnprocessableEntity("draft has no room yet".into()))
    }

    fn date(&self) -> AppResult<NaiveDate> {
        self.date
            .ok_or_else(|| AppError::UnprocessableEntity("draft has no date yet".into()))
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

/// The ordinary booking dialog: room → date → start → end → topic → name →
/// contact → confirm. The draft lives inside the workflow value and is
/// dropped with it on a terminal reply.
pub struct BookingWorkflow {
    repo: Arc<dyn BookingRepository>,
    reminders: Arc<ReminderScheduler>,
    notifier: Arc<dyn Notifier>,
    actor: Actor,
    step: Step,
    draft: Draft,
}

impl BookingWorkflow {
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        reminders: Arc<ReminderScheduler>,
        notifier: Arc<dyn Notifier>,
        actor: Actor,
    ) -> Self {
        Self {
            repo,
            reminders,
            notifier,
            actor,
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
            Step::ChooseRoom => self.on_room(input),
            Step::ChooseDate => self.on_date(input).await,
            Step::ChooseStart => Ok(self.on_start(input)),
            Step::ChooseEnd => self.on_end(input).await,
            Step::ChooseTopic => Ok(self.on_topic(input)),
            Step::ChooseName => Ok(self.on_name(input)),
            Step::ChooseContact => Ok(self.on_contact(input)),
            Step::Confirm => self.on_confirm(input).await,
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

    fn on_room(&mut self, input: Input) -> AppResult<Reply> {
        let room = match input {
            Input::Room(room) => room,
            Input::Text(text) => match text.trim().parse::<Room>() {
                Ok(room) => room,
                Err(_) => return Ok(Reply::Aborted(AbortReason::UnknownRoom)),
            },
            _ => return Ok(self.reprompt(InvalidInput::UnexpectedInput)),
        };
        self.draft.room = Some(room);
        Ok(self.prompt(Step::ChooseDate, PromptContext::Empty))
    }

    async fn on_date(&mut self, input: Input) -> AppResult<Reply> {
        let Input::Text(text) = input else {
            return Ok(self.reprompt(InvalidInput::UnexpectedInput));
        };
        let today = Utc::now().date_naive();
        let Some(date) = policy::parse_date(&text, today) else {
            return Ok(self.reprompt(InvalidInput::BadDate));
        };
        if date < today {
            return Ok(self.reprompt(InvalidInput::PastDate));
        }
        if date > today + Duration::days(policy::PLANNING_DAYS) {
            return Ok(self.reprompt(InvalidInput::BeyondHorizon));
        }

        self.draft.date = Some(date);
        let occupancy = self.repo.find_for_day(Some(self.draft.room()?), date).await?;
        Ok(self.prompt(Step::ChooseStart, PromptContext::DayOccupancy(occupancy)))
    }

    fn on_start(&mut self, input: Input) -> Reply {
        let Input::Text(text) = input else {
            return self.reprompt(InvalidInput::UnexpectedInput);
        };
        let Some(time) = policy::parse_time(&text) else {
            return self.reprompt(InvalidInput::BadTime);
        };
        if !policy::within_working_window(time) {
            return self.reprompt(InvalidInput::OutsideWorkingWindow);
        }
        let date = match self.draft.date() {
            Ok(date) => date,
            Err(_) => return self.reprompt(InvalidInput::UnexpectedInput),
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
        let date = self.draft.date()?;
        let start = self.draft.start()?;
        let end = policy::combine_end(date, time);

        if end <= start {
            return Ok(self.reprompt(InvalidInput::EndNotAfterStart));
        }
        if end - start < Duration::minutes(policy::MIN_DURATION_MINUTES) {
            return Ok(self.reprompt(InvalidInput::TooShort));
        }
        if end > policy::closing_bound(date) {
            return Ok(self.reprompt(InvalidInput::AfterClosing));
        }

        let room = self.draft.room()?;
        let conflicts = self.repo.find_conflicts(room, start, end, None).await?;
        if !conflicts.is_empty() {
            // Rewind to the start time so the actor can pick a new slot.
            self.draft.start = None;
            return Ok(self.prompt(Step::ChooseStart, PromptContext::Conflicts(conflicts)));
        }

        self.draft.end = Some(end);
        Ok(self.prompt(Step::ChooseTopic, PromptContext::Empty))
    }

    fn on_topic(&mut self, input: Input) -> Reply {
        let Input::Text(text) = input else {
            return self.reprompt(InvalidInput::UnexpectedInput);
        };
        self.draft.topic = if policy::is_empty_marker(&text) {
            None
        } else {
            Some(text.trim().to_string())
        };
        self.prompt(Step::ChooseName, PromptContext::Empty)
    }

    fn on_name(&mut self, input: Input) -> Reply {
        let Input::Text(text) = input else {
            return self.reprompt(InvalidInput::UnexpectedInput);
        };
        let name = text.trim();
        if name.is_empty() {
            return self.reprompt(InvalidInput::EmptyName);
        }
        self.draft.owner_name = Some(name.to_string());
        self.prompt(Step::ChooseContact, PromptContext::Empty)
    }

    fn on_contact(&mut self, input: Input) -> Reply {
        let Input::Text(text) = input else {
            return self.reprompt(InvalidInput::UnexpectedInput);
        };
        self.draft.contact = if policy::is_empty_marker(&text) {
            self.actor.username.as_ref().map(|u| format!("@{u}"))
        } else {
            Some(text.trim().to_string())
        };
        self.prompt(Step::Confirm, PromptContext::Empty)
    }

    async fn on_confirm(&mut self, input: Input) -> AppResult<Reply> {
        if !matches!(input, Input::Confirm) {
            return Ok(self.reprompt(InvalidInput::UnexpectedInput));
        }

        let room = self.draft.room()?;
        let start = self.draft.start()?;
        let end = self.draft.end()?;

        // Re-check against commits that happened while the actor was in the
        // dialog.
        let conflicts = self.repo.find_conflicts(room, start, end, None).await?;
        if !conflicts.is_empty() {
            return Ok(Reply::Aborted(AbortReason::SlotTaken));
        }

        let event = CreateBooking::new(
            room,
            start,
            end,
            BookingKind::Booking {
                owner_id: Some(self.actor.id),
                owner_name: self
                    .draft
                    .owner_name
                    .clone()
                    .ok_or_else(|| AppError::UnprocessableEntity("draft has no name yet".into()))?,
                contact: self.draft.contact.clone(),
                topic: self.draft.topic.clone(),
            },
            Utc::now(),
        );

        let id = match self.repo.create(event).await {
            Ok(id) => id,
            Err(AppError::SlotTaken(_)) => return Ok(Reply::Aborted(AbortReason::SlotTaken)),
            Err(e) => return Err(e),
        };

        if let Err(e) = self.reminders.arm(id).await {
            tracing::warn!(error = %e, %id, "failed to arm reminder for new booking");
        }
        if let Some(booking) = self.repo.find_by_id(id).await? {
            if let Err(e) = self.notifier.notify(Notification::BookingCreated { booking }).await {
                tracing::warn!(error = %e, %id, "failed to announce new booking");
            }
        }

        Ok(Reply::Committed(id))
    }
}
