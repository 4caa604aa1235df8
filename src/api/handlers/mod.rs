pub mod admin_booking;
pub mod availability;
pub mod blackout;
pub mod booking;
pub mod health;
pub mod notifications;
pub mod provider_booking;
pub mod realtime;
pub mod slot_config;
