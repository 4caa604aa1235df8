use std::sync::Arc;
use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{error, info, warn};
use crate::domain::models::booking::{
    Booking, BookingStatus, DeliveryAddress, NewBookingParams, PaymentMethod, PaymentStatus, ServiceSnapshot,
};
use crate::domain::models::provider::Provider;
use crate::domain::models::notification::{Audience, NotificationEvent, NotificationKind, NotificationPayload};
use crate::domain::models::slot::UnavailableReason;
use crate::domain::ports::{BookingRepository, GuardedBooking, PaymentGateway, PaymentOrder, ProviderDirectory};
use crate::domain::services::availability::AvailabilityResolver;
use crate::error::AppError;
use crate::realtime::{BookingUpdate, RealtimeHub};

pub const DEFAULT_CURRENCY: &str = "INR";
const REFUND_COMMIT_ATTEMPTS: usize = 3;

/// Who is asking. Identity is established upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Actor {
    Customer(String),
    Provider(String),
    Admin,
}

/// Everything needed to book one service into one slot.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub service: ServiceSnapshot,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub provider_id: Option<String>,
    pub discount_amount: i64,
    pub tip_amount: i64,
    pub customer_notes: Option<String>,
}

pub struct BookingService {
    booking_repo: Arc<dyn BookingRepository>,
    provider_directory: Arc<dyn ProviderDirectory>,
    payment_gateway: Arc<dyn PaymentGateway>,
    availability: Arc<AvailabilityResolver>,
    realtime: Arc<RealtimeHub>,
}

impl BookingService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        provider_directory: Arc<dyn ProviderDirectory>,
        payment_gateway: Arc<dyn PaymentGateway>,
        availability: Arc<AvailabilityResolver>,
        realtime: Arc<RealtimeHub>,
    ) -> Self {
        Self { booking_repo, provider_directory, payment_gateway, availability, realtime }
    }

    pub async fn create(&self, user_id: &str, request: BookingRequest) -> Result<Booking, AppError> {
        let prepared = self.prepare(user_id, request, None).await?;
        let mut created = self.insert(vec![prepared]).await?;
        created.pop().ok_or(AppError::Internal)
    }

    /// Validates a request against current availability and builds the row
    /// to insert. Capacity is checked again inside the insert transaction.
    pub async fn prepare(
        &self,
        user_id: &str,
        request: BookingRequest,
        batch_id: Option<String>,
    ) -> Result<GuardedBooking, AppError> {
        request.service.validate()?;
        request.address.validate()?;
        if request.discount_amount < 0 || request.tip_amount < 0 {
            return Err(AppError::Validation("Discount and tip cannot be negative".into()));
        }
        if let Some(provider_id) = &request.provider_id {
            self.eligible_provider(provider_id).await?;
        }

        let service_id = request.service.service_id.clone();
        let check = self
            .availability
            .check_slot_at(request.date, request.time, Some(&service_id), None, Utc::now())
            .await?
            .ok_or_else(|| AppError::Validation(format!(
                "{} is not an offered slot on {}", request.time.format("%H:%M"), request.date
            )))?;

        match check.slot.unavailable_reason {
            None => {}
            Some(UnavailableReason::Blackout) => {
                return Err(AppError::Conflict(format!("Bookings are closed on {}", request.date)));
            }
            Some(UnavailableReason::Past) => {
                return Err(AppError::Validation("That slot has already started".into()));
            }
            Some(UnavailableReason::Full) => return Err(AppError::slot_unavailable()),
        }

        let booking = Booking::new(NewBookingParams {
            batch_id,
            user_id: user_id.to_string(),
            service: request.service,
            address: request.address,
            booking_date: request.date,
            window: check.window,
            provider_id: request.provider_id,
            payment_method: request.payment_method,
            currency: DEFAULT_CURRENCY.to_string(),
            discount_amount: request.discount_amount,
            tip_amount: request.tip_amount,
            customer_notes: request.customer_notes,
        })?;

        Ok(GuardedBooking { booking, capacity: check.capacity })
    }

    /// Inserts prepared bookings atomically, then publishes them.
    pub async fn insert(&self, items: Vec<GuardedBooking>) -> Result<Vec<Booking>, AppError> {
        let mut events = Vec::new();
        for item in &items {
            let booking = &item.booking;
            events.push(event(Audience::User, Some(&booking.user_id), NotificationKind::BookingCreated, booking, None));
            events.push(event(Audience::Admins, None, NotificationKind::BookingCreated, booking, None));
            if let Some(provider_id) = &booking.provider_id {
                events.push(event(Audience::Provider, Some(provider_id), NotificationKind::BookingCreated, booking, None));
            }
        }

        let created = self.booking_repo.insert_guarded(&items, events).await?;
        for booking in &created {
            info!(booking_id = %booking.id, slot = %booking.time_slot, date = %booking.booking_date, "Booking created");
            self.realtime.publish(BookingUpdate::from_booking(NotificationKind::BookingCreated.as_str(), booking));
        }
        Ok(created)
    }

    pub async fn get(&self, id: &str, actor: &Actor) -> Result<Booking, AppError> {
        let booking = self.load(id).await?;
        match actor {
            Actor::Admin => Ok(booking),
            Actor::Customer(user_id) if &booking.user_id == user_id => Ok(booking),
            Actor::Provider(provider_id) if booking.provider_id.as_ref() == Some(provider_id) => Ok(booking),
            Actor::Provider(_) => Err(AppError::Forbidden("Booking is not assigned to you".into())),
            Actor::Customer(_) => Err(not_found(id)),
        }
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        self.booking_repo.list_by_user(user_id).await
    }

    pub async fn list_for_provider(&self, provider_id: &str) -> Result<Vec<Booking>, AppError> {
        self.booking_repo.list_by_provider(provider_id).await
    }

    pub async fn list_filtered(&self, date: Option<NaiveDate>, status: Option<BookingStatus>) -> Result<Vec<Booking>, AppError> {
        self.booking_repo.list_filtered(date, status).await
    }

    pub async fn confirm(&self, id: &str) -> Result<Booking, AppError> {
        let current = self.load(id).await?;
        ensure_transition(&current, BookingStatus::Confirmed)?;

        let mut updated = current.clone();
        updated.status = BookingStatus::Confirmed;

        let events = vec![event(Audience::User, Some(&current.user_id), NotificationKind::BookingConfirmed, &updated, None)];
        self.commit(&current, updated, events, NotificationKind::BookingConfirmed).await
    }

    /// Assigns a provider, or reassigns after a provider cancellation.
    pub async fn assign(&self, id: &str, provider_id: &str) -> Result<Booking, AppError> {
        let current = self.load(id).await?;
        ensure_transition(&current, BookingStatus::Assigned)?;

        let provider = self.eligible_provider(provider_id).await?;

        let mut updated = current.clone();
        updated.status = BookingStatus::Assigned;
        updated.provider_id = Some(provider.id.clone());
        updated.assigned_at = Some(Utc::now());

        let events = vec![
            event(Audience::Provider, Some(&provider.id), NotificationKind::BookingAssigned, &updated, None),
            event(Audience::User, Some(&current.user_id), NotificationKind::BookingAssigned, &updated, None),
        ];
        self.commit(&current, updated, events, NotificationKind::BookingAssigned).await
    }

    /// `acting_provider` is `None` when an admin drives the change.
    pub async fn start(&self, id: &str, acting_provider: Option<&str>) -> Result<Booking, AppError> {
        let current = self.load(id).await?;
        ensure_provider(&current, acting_provider)?;
        ensure_transition(&current, BookingStatus::InProgress)?;

        let mut updated = current.clone();
        updated.status = BookingStatus::InProgress;
        updated.started_at = Some(Utc::now());

        let events = vec![event(Audience::User, Some(&current.user_id), NotificationKind::BookingStarted, &updated, None)];
        self.commit(&current, updated, events, NotificationKind::BookingStarted).await
    }

    pub async fn complete(&self, id: &str, acting_provider: Option<&str>) -> Result<Booking, AppError> {
        let current = self.load(id).await?;
        ensure_provider(&current, acting_provider)?;
        ensure_transition(&current, BookingStatus::Completed)?;

        let mut updated = current.clone();
        updated.status = BookingStatus::Completed;
        updated.completed_at = Some(Utc::now());
        if current.payment_method == PaymentMethod::Cod && current.payment_status == PaymentStatus::Pending {
            updated.payment_status = PaymentStatus::Paid;
        }

        let events = vec![
            event(Audience::User, Some(&current.user_id), NotificationKind::BookingCompleted, &updated, None),
            event(Audience::Admins, None, NotificationKind::BookingCompleted, &updated, None),
        ];
        self.commit(&current, updated, events, NotificationKind::BookingCompleted).await
    }

    pub async fn cancel(&self, id: &str, actor: &Actor, reason: Option<String>) -> Result<Booking, AppError> {
        let current = self.load(id).await?;
        match actor {
            Actor::Admin => {}
            Actor::Customer(user_id) if &current.user_id == user_id => {}
            Actor::Customer(_) => return Err(not_found(id)),
            Actor::Provider(_) => {
                return Err(AppError::Forbidden("Providers decline bookings instead of cancelling them".into()));
            }
        }
        ensure_transition(&current, BookingStatus::Cancelled)?;

        let mut updated = current.clone();
        updated.status = BookingStatus::Cancelled;
        updated.cancelled_at = Some(Utc::now());
        updated.cancellation_reason = reason.clone();

        let mut events = vec![
            event(Audience::User, Some(&current.user_id), NotificationKind::BookingCancelled, &updated, reason.clone()),
            event(Audience::Admins, None, NotificationKind::BookingCancelled, &updated, reason.clone()),
        ];
        if let Some(provider_id) = &current.provider_id {
            events.push(event(Audience::Provider, Some(provider_id), NotificationKind::BookingCancelled, &updated, reason));
        }
        self.commit(&current, updated, events, NotificationKind::BookingCancelled).await
    }

    /// Provider backs out. The booking keeps its slot and waits for reassignment.
    pub async fn provider_cancel(&self, id: &str, acting_provider: Option<&str>, reason: Option<String>) -> Result<Booking, AppError> {
        let current = self.load(id).await?;
        ensure_provider(&current, acting_provider)?;
        ensure_transition(&current, BookingStatus::ProviderCancelled)?;

        let mut updated = current.clone();
        updated.status = BookingStatus::ProviderCancelled;
        updated.provider_id = None;
        updated.assigned_at = None;
        updated.cancellation_reason = reason.clone();

        let events = vec![
            event(Audience::Admins, None, NotificationKind::ProviderCancelled, &updated, reason.clone()),
            event(Audience::User, Some(&current.user_id), NotificationKind::ProviderCancelled, &updated, reason),
        ];
        let saved = self.commit(&current, updated, events, NotificationKind::ProviderCancelled).await?;
        warn!(booking_id = %saved.id, "Provider cancelled booking, awaiting reassignment");
        Ok(saved)
    }

    /// Admin-driven move to `target`. Provider steps act on behalf of the
    /// assigned provider.
    pub async fn admin_set_status(
        &self,
        id: &str,
        target: BookingStatus,
        provider_id: Option<&str>,
        reason: Option<String>,
    ) -> Result<Booking, AppError> {
        match target {
            BookingStatus::Confirmed => self.confirm(id).await,
            BookingStatus::Assigned => {
                let provider_id = provider_id
                    .ok_or_else(|| AppError::Validation("provider_id is required to assign a booking".into()))?;
                self.assign(id, provider_id).await
            }
            BookingStatus::InProgress => self.start(id, None).await,
            BookingStatus::Completed => self.complete(id, None).await,
            BookingStatus::Cancelled => self.cancel(id, &Actor::Admin, reason).await,
            BookingStatus::ProviderCancelled => self.provider_cancel(id, None, reason).await,
            BookingStatus::Pending => {
                let current = self.load(id).await?;
                Err(AppError::invalid_transition(current.status.as_str(), target.as_str()))
            }
        }
    }

    /// Cash collection recorded by the provider on site.
    pub async fn update_cod_payment(&self, id: &str, acting_provider: &str, target: PaymentStatus) -> Result<Booking, AppError> {
        let current = self.load(id).await?;
        ensure_provider(&current, Some(acting_provider))?;
        if current.payment_method != PaymentMethod::Cod {
            return Err(AppError::Validation("Only cash-on-delivery payments can be updated by the provider".into()));
        }
        if !matches!(current.status, BookingStatus::InProgress | BookingStatus::Completed) {
            return Err(AppError::Conflict(format!(
                "Cash payment cannot be recorded while the booking is '{}'", current.status
            )));
        }
        ensure_payment_transition(&current, target)?;

        let mut updated = current.clone();
        updated.payment_status = target;

        let events = vec![
            event(Audience::User, Some(&current.user_id), NotificationKind::PaymentUpdated, &updated, None),
            event(Audience::Admins, None, NotificationKind::PaymentUpdated, &updated, None),
        ];
        self.commit(&current, updated, events, NotificationKind::PaymentUpdated).await
    }

    pub async fn create_payment_order(&self, id: &str, user_id: &str) -> Result<(Booking, PaymentOrder), AppError> {
        let current = self.load_owned(id, user_id).await?;
        if current.payment_method != PaymentMethod::Online {
            return Err(AppError::Validation("Booking is not set up for online payment".into()));
        }
        if current.payment_status != PaymentStatus::Pending || current.status.is_terminal() {
            return Err(AppError::Conflict("Booking is not awaiting payment".into()));
        }

        let order = self.payment_gateway
            .create_order(current.total_amount, &current.currency, &current.id)
            .await?;
        info!(booking_id = %current.id, order_id = %order.id, "Payment order created");

        let mut updated = current.clone();
        updated.payment_order_id = Some(order.id.clone());

        let saved = self.commit(&current, updated, Vec::new(), NotificationKind::PaymentUpdated).await?;
        Ok((saved, order))
    }

    /// Captures a gateway payment. A verified payment confirms a pending booking.
    pub async fn verify_payment(
        &self,
        id: &str,
        user_id: &str,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<Booking, AppError> {
        let current = self.load_owned(id, user_id).await?;
        if current.payment_method != PaymentMethod::Online {
            return Err(AppError::Validation("Booking is not set up for online payment".into()));
        }
        ensure_payment_transition(&current, PaymentStatus::Paid)?;
        match current.payment_order_id.as_deref() {
            None => return Err(AppError::Conflict("No payment order exists for this booking, create a payment order first".into())),
            Some(expected) if expected != order_id => {
                return Err(AppError::Validation("Payment order does not belong to this booking".into()));
            }
            Some(_) => {}
        }

        if !self.payment_gateway.verify_signature(order_id, payment_id, signature).await? {
            warn!(booking_id = %current.id, "Payment signature rejected");
            return Err(AppError::Validation("Payment signature verification failed".into()));
        }

        let mut updated = current.clone();
        updated.payment_status = PaymentStatus::Paid;
        updated.payment_order_id = Some(order_id.to_string());
        updated.payment_id = Some(payment_id.to_string());

        let mut events = vec![event(Audience::User, Some(&current.user_id), NotificationKind::PaymentUpdated, &updated, None)];
        let kind = if current.status == BookingStatus::Pending {
            updated.status = BookingStatus::Confirmed;
            events.push(event(Audience::User, Some(&current.user_id), NotificationKind::BookingConfirmed, &updated, None));
            NotificationKind::BookingConfirmed
        } else {
            NotificationKind::PaymentUpdated
        };
        events.push(event(Audience::Admins, None, NotificationKind::PaymentUpdated, &updated, None));

        self.commit(&current, updated, events, kind).await
    }

    /// Refunds a paid booking. Online payments are refunded at the gateway first.
    pub async fn refund(&self, id: &str, amount: Option<i64>) -> Result<Booking, AppError> {
        let mut current = self.load(id).await?;
        ensure_payment_transition(&current, PaymentStatus::Refunded)?;
        if amount.is_some_and(|a| a <= 0 || a > current.total_amount) {
            return Err(AppError::Validation("Refund amount must be positive and within the booking total".into()));
        }

        let mut refund_ref = None;
        if current.payment_method == PaymentMethod::Online {
            let payment_id = current.payment_id.as_deref()
                .ok_or_else(|| AppError::Conflict("Booking has no captured payment to refund".into()))?;
            let issued = self.payment_gateway.refund(payment_id, amount).await?;
            info!(booking_id = %current.id, refund = %issued, "Gateway refund issued");
            refund_ref = Some(issued);
        }

        // The gateway refund cannot be taken back, so a lost race re-reads
        // the booking and records the refund on whatever state won.
        for _ in 0..REFUND_COMMIT_ATTEMPTS {
            let mut updated = current.clone();
            updated.payment_status = PaymentStatus::Refunded;

            let events = vec![event(Audience::User, Some(&current.user_id), NotificationKind::PaymentUpdated, &updated, None)];
            if let Some(saved) = self.try_commit(&current, updated, events, NotificationKind::PaymentUpdated).await? {
                return Ok(saved);
            }

            current = self.load(id).await?;
            if !current.payment_status.can_transition_to(PaymentStatus::Refunded) {
                break;
            }
        }

        if let Some(refund_ref) = refund_ref {
            error!(
                booking_id = %id,
                refund = %refund_ref,
                payment = %current.payment_status,
                "Gateway refund issued but the booking could not be marked refunded"
            );
        }
        Err(concurrent_update())
    }

    /// Moves a booking that has not started to another slot of the same service.
    pub async fn reschedule(&self, id: &str, user_id: &str, date: NaiveDate, time: NaiveTime) -> Result<Booking, AppError> {
        let current = self.load_owned(id, user_id).await?;
        if !matches!(current.status, BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::Assigned) {
            return Err(AppError::Conflict(format!("A booking that is '{}' cannot be rescheduled", current.status)));
        }

        let check = self
            .availability
            .check_slot_at(date, time, Some(&current.service.service_id), None, Utc::now())
            .await?
            .ok_or_else(|| AppError::Validation(format!("{} is not an offered slot on {}", time.format("%H:%M"), date)))?;

        if current.booking_date == date && current.slot_start_minute == check.window.start_minute {
            return Err(AppError::Validation("Booking is already in that slot".into()));
        }
        if !check.slot.is_available {
            return Err(AppError::slot_unavailable());
        }

        let mut updated = current.clone();
        updated.booking_date = date;
        updated.slot_start_minute = check.window.start_minute;
        updated.slot_duration_minutes = check.window.duration_minutes;
        updated.time_slot = check.window.label();
        updated.updated_at = Utc::now();

        let mut events = vec![event(Audience::User, Some(&current.user_id), NotificationKind::BookingRescheduled, &updated, None)];
        if let Some(provider_id) = &current.provider_id {
            events.push(event(Audience::Provider, Some(provider_id), NotificationKind::BookingRescheduled, &updated, None));
        }

        let saved = self.booking_repo
            .reschedule_guarded(&updated, current.status, check.capacity, events)
            .await?
            .ok_or_else(concurrent_update)?;
        info!(booking_id = %saved.id, date = %saved.booking_date, slot = %saved.time_slot, "Booking rescheduled");
        self.realtime.publish(BookingUpdate::from_booking(NotificationKind::BookingRescheduled.as_str(), &saved));
        Ok(saved)
    }

    async fn eligible_provider(&self, provider_id: &str) -> Result<Provider, AppError> {
        let provider = self.provider_directory.get_provider(provider_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Provider {} not found", provider_id)))?;
        if !provider.can_take_assignments() {
            return Err(AppError::Validation(format!(
                "Provider {} cannot take bookings while '{}'", provider.id, provider.status
            )));
        }
        Ok(provider)
    }

    async fn load(&self, id: &str) -> Result<Booking, AppError> {
        self.booking_repo.find_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    async fn load_owned(&self, id: &str, user_id: &str) -> Result<Booking, AppError> {
        let booking = self.load(id).await?;
        if booking.user_id != user_id {
            return Err(not_found(id));
        }
        Ok(booking)
    }

    async fn commit(
        &self,
        current: &Booking,
        updated: Booking,
        events: Vec<NotificationEvent>,
        kind: NotificationKind,
    ) -> Result<Booking, AppError> {
        self.try_commit(current, updated, events, kind)
            .await?
            .ok_or_else(concurrent_update)
    }

    /// Compare-and-set write. `None` means another request moved the booking first.
    async fn try_commit(
        &self,
        current: &Booking,
        mut updated: Booking,
        events: Vec<NotificationEvent>,
        kind: NotificationKind,
    ) -> Result<Option<Booking>, AppError> {
        updated.updated_at = Utc::now();
        let Some(saved) = self.booking_repo
            .apply_transition(&updated, current.status, current.payment_status, events)
            .await?
        else {
            return Ok(None);
        };

        info!(
            booking_id = %saved.id,
            from = %current.status,
            to = %saved.status,
            payment = %saved.payment_status,
            "Booking updated"
        );
        self.realtime.publish(BookingUpdate::from_booking(kind.as_str(), &saved));
        Ok(Some(saved))
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Booking {} not found", id))
}

fn concurrent_update() -> AppError {
    AppError::Conflict("Booking was changed by another request, please retry".into())
}

fn ensure_transition(current: &Booking, to: BookingStatus) -> Result<(), AppError> {
    if current.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::invalid_transition(current.status.as_str(), to.as_str()))
    }
}

fn ensure_payment_transition(current: &Booking, to: PaymentStatus) -> Result<(), AppError> {
    if current.payment_status.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "Cannot move payment from '{}' to '{}'", current.payment_status, to
        )))
    }
}

/// `None` skips the check for admin-driven changes.
fn ensure_provider(current: &Booking, acting_provider: Option<&str>) -> Result<(), AppError> {
    match acting_provider {
        Some(provider_id) if current.provider_id.as_deref() != Some(provider_id) => {
            Err(AppError::Forbidden("Booking is not assigned to you".into()))
        }
        _ => Ok(()),
    }
}

fn event(
    audience: Audience,
    recipient: Option<&String>,
    kind: NotificationKind,
    booking: &Booking,
    reason: Option<String>,
) -> NotificationEvent {
    let payload = NotificationPayload {
        booking_id: booking.id.clone(),
        status: booking.status.as_str().to_string(),
        payment_status: booking.payment_status.as_str().to_string(),
        service_name: booking.service.name.clone(),
        booking_date: booking.booking_date.to_string(),
        time_slot: booking.time_slot.clone(),
        reason,
    };
    NotificationEvent::new(audience, recipient.cloned(), kind, payload)
}
