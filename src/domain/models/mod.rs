pub mod blackout;
pub mod booking;
pub mod notification;
pub mod provider;
pub mod slot;
pub mod slot_config;
