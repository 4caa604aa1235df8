use std::sync::Arc;
use crate::config::Config;
use crate::domain::ports::{
    BlackoutRepository, BookingRepository, NotificationDispatcher, NotificationOutboxRepository,
    PaymentGateway, ProviderDirectory, SlotConfigRepository,
};
use crate::domain::services::availability::AvailabilityResolver;
use crate::domain::services::batch::BatchBookingCoordinator;
use crate::domain::services::booking_service::BookingService;
use crate::realtime::RealtimeHub;

/// Storage adapters for one backend.
pub struct Repositories {
    pub slot_config_repo: Arc<dyn SlotConfigRepository>,
    pub blackout_repo: Arc<dyn BlackoutRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub outbox_repo: Arc<dyn NotificationOutboxRepository>,
    pub provider_directory: Arc<dyn ProviderDirectory>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub slot_config_repo: Arc<dyn SlotConfigRepository>,
    pub blackout_repo: Arc<dyn BlackoutRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub outbox_repo: Arc<dyn NotificationOutboxRepository>,
    pub notification_dispatcher: Arc<dyn NotificationDispatcher>,
    pub availability: Arc<AvailabilityResolver>,
    pub booking_service: Arc<BookingService>,
    pub batch_coordinator: Arc<BatchBookingCoordinator>,
    pub realtime: Arc<RealtimeHub>,
}

impl AppState {
    pub fn assemble(
        config: Config,
        repos: Repositories,
        payment_gateway: Arc<dyn PaymentGateway>,
        notification_dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        let realtime = Arc::new(RealtimeHub::new());
        let availability = Arc::new(AvailabilityResolver::new(
            repos.slot_config_repo.clone(),
            repos.blackout_repo.clone(),
            repos.booking_repo.clone(),
            config.business_timezone,
        ));
        let booking_service = Arc::new(BookingService::new(
            repos.booking_repo.clone(),
            repos.provider_directory.clone(),
            payment_gateway,
            availability.clone(),
            realtime.clone(),
        ));
        let batch_coordinator = Arc::new(BatchBookingCoordinator::new(booking_service.clone()));

        Self {
            config,
            slot_config_repo: repos.slot_config_repo,
            blackout_repo: repos.blackout_repo,
            booking_repo: repos.booking_repo,
            outbox_repo: repos.outbox_repo,
            notification_dispatcher,
            availability,
            booking_service,
            batch_coordinator,
            realtime,
        }
    }
}
