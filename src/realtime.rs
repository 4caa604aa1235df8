use serde::Serialize;
use tokio::sync::broadcast;
use crate::domain::models::booking::{Booking, BookingStatus, PaymentStatus};

const CHANNEL_CAPACITY: usize = 256;

/// A committed change to a booking, as pushed to live clients.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingUpdate {
    pub event: String,
    pub booking_id: String,
    pub batch_id: Option<String>,
    pub user_id: String,
    pub provider_id: Option<String>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub booking_date: String,
    pub time_slot: String,
}

impl BookingUpdate {
    pub fn from_booking(event: &str, booking: &Booking) -> Self {
        Self {
            event: event.to_string(),
            booking_id: booking.id.clone(),
            batch_id: booking.batch_id.clone(),
            user_id: booking.user_id.clone(),
            provider_id: booking.provider_id.clone(),
            status: booking.status,
            payment_status: booking.payment_status,
            booking_date: booking.booking_date.to_string(),
            time_slot: booking.time_slot.clone(),
        }
    }
}

/// In-process broadcast of booking changes. Only call `publish` after the
/// change is committed.
pub struct RealtimeHub {
    sender: broadcast::Sender<BookingUpdate>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self { sender: broadcast::channel(CHANNEL_CAPACITY).0 }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingUpdate> {
        self.sender.subscribe()
    }

    /// No-op if nobody is listening.
    pub fn publish(&self, update: BookingUpdate) {
        let _ = self.sender.send(update);
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}
