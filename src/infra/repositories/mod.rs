pub mod sqlite_blackout_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_outbox_repo;
pub mod sqlite_provider_repo;
pub mod sqlite_slot_config_repo;

pub mod postgres_blackout_repo;
pub mod postgres_booking_repo;
pub mod postgres_outbox_repo;
pub mod postgres_provider_repo;
pub mod postgres_slot_config_repo;
