use std::sync::Arc;

use adapter::database::ConnectionPool;
use adapter::notifier::LogNotifier;
use adapter::repository::booking::BookingRepositoryImpl;
use engine::reminder::ReminderScheduler;
use engine::service::BookingService;
use kernel::notifier::Notifier;
use kernel::repository::booking::BookingRepository;

#[derive(Clone)]
pub struct AppRegistry {
    booking_repository: Arc<dyn BookingRepository>,
    notifier: Arc<dyn Notifier>,
    reminder_scheduler: Arc<ReminderScheduler>,
    booking_service: Arc<BookingService>,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool) -> Self {
        let booking_repository: Arc<dyn BookingRepository> =
            Arc::new(BookingRepositoryImpl::new(pool));
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::default());
        let reminder_scheduler =
            ReminderScheduler::new(booking_repository.clone(), notifier.clone());
        let booking_service = Arc::new(BookingService::new(
            booking_repository.clone(),
            notifier.clone(),
        ));
        Self {
            booking_repository,
            notifier,
            reminder_scheduler,
            booking_service,
        }
    }

    pub fn booking_repository(&self) -> Arc<dyn BookingRepository> {
        self.booking_repository.clone()
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.notifier.clone()
    }

    pub fn reminder_scheduler(&self) -> Arc<ReminderScheduler> {
        self.reminder_scheduler.clone()
    }

    pub fn booking_service(&self) -> Arc<BookingService> {
        self.booking_service.clone()
    }
}
