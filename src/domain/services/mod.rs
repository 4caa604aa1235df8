pub mod availability;
pub mod batch;
pub mod booking_service;
pub mod notification_templates;
pub mod slot_config;
pub mod slot_generator;
