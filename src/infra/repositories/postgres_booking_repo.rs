use crate::domain::{
    models::{booking::{Booking, BookingStatus, PaymentStatus}, notification::NotificationEvent},
    ports::{BookingRepository, GuardedBooking},
};
use crate::error::AppError;
use crate::infra::repositories::postgres_outbox_repo::insert_events;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

const INSERT_BOOKING: &str = r#"
    INSERT INTO bookings (
        id, batch_id, user_id, service_id, service_name, service_quantity, service_price, service_category,
        service_image_url, total_amount, currency, address_line1, address_line2, address_city, address_state,
        address_pincode, booking_date, slot_start_minute, slot_duration_minutes, time_slot, status, provider_id,
        assigned_at, payment_status, payment_method, payment_order_id, payment_id, discount_amount, tip_amount,
        customer_notes, cancellation_reason, created_at, updated_at, started_at, completed_at, cancelled_at
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34, $35, $36)
    RETURNING *
"#;

const COUNT_OCCUPIED: &str = r#"
    SELECT COUNT(*) FROM bookings
    WHERE booking_date = $1 AND slot_start_minute = $2
      AND status NOT IN ($3, $4)
      AND ($5::text IS NULL OR service_id = $5)
      AND ($6::text IS NULL OR provider_id = $6)
"#;

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_booking(conn: &mut PgConnection, booking: &Booking) -> Result<Booking, AppError> {
    sqlx::query_as::<_, Booking>(INSERT_BOOKING)
        .bind(&booking.id).bind(&booking.batch_id).bind(&booking.user_id)
        .bind(&booking.service.service_id).bind(&booking.service.name).bind(booking.service.quantity)
        .bind(booking.service.price).bind(&booking.service.category).bind(&booking.service.image_url)
        .bind(booking.total_amount).bind(&booking.currency)
        .bind(&booking.address.line1).bind(&booking.address.line2).bind(&booking.address.city)
        .bind(&booking.address.state).bind(&booking.address.pincode)
        .bind(booking.booking_date).bind(booking.slot_start_minute).bind(booking.slot_duration_minutes)
        .bind(&booking.time_slot).bind(booking.status.as_str()).bind(&booking.provider_id).bind(booking.assigned_at)
        .bind(booking.payment_status.as_str()).bind(booking.payment_method.as_str())
        .bind(&booking.payment_order_id).bind(&booking.payment_id)
        .bind(booking.discount_amount).bind(booking.tip_amount)
        .bind(&booking.customer_notes).bind(&booking.cancellation_reason)
        .bind(booking.created_at).bind(booking.updated_at)
        .bind(booking.started_at).bind(booking.completed_at).bind(booking.cancelled_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::Database)
}

async fn count_occupied_on(
    conn: &mut PgConnection,
    date: NaiveDate,
    slot_start_minute: i32,
    service_id: Option<&str>,
    provider_id: Option<&str>,
) -> Result<i64, AppError> {
    let [cancelled, completed] = BookingStatus::released();
    sqlx::query_scalar::<_, i64>(COUNT_OCCUPIED)
        .bind(date).bind(slot_start_minute)
        .bind(cancelled).bind(completed)
        .bind(service_id)
        .bind(provider_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::Database)
}

/// Serialises writers per (service, date, slot) until the transaction ends.
/// Keys are taken in sorted order so overlapping batches cannot deadlock.
async fn lock_slots(conn: &mut PgConnection, mut keys: Vec<String>) -> Result<(), AppError> {
    keys.sort();
    keys.dedup();
    for key in keys {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(key)
            .execute(&mut *conn)
            .await
            .map_err(AppError::Database)?;
    }
    Ok(())
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn insert_guarded(&self, items: &[GuardedBooking], events: Vec<NotificationEvent>) -> Result<Vec<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        lock_slots(&mut *tx, items.iter().map(|item| item.booking.capacity_key()).collect()).await?;

        let mut created = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let booking = insert_booking(&mut *tx, &item.booking).await?;
            let used = count_occupied_on(
                &mut *tx, booking.booking_date, booking.slot_start_minute, Some(&booking.service.service_id), None
            ).await?;

            if used > item.capacity as i64 {
                tx.rollback().await.map_err(AppError::Database)?;
                return Err(if items.len() > 1 {
                    AppError::slot_unavailable_in_batch(index)
                } else {
                    AppError::slot_unavailable()
                });
            }
            created.push(booking);
        }

        insert_events(&mut *tx, &events).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE user_id = $1 ORDER BY booking_date DESC, slot_start_minute DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE provider_id = $1 ORDER BY booking_date ASC, slot_start_minute ASC")
            .bind(provider_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_batch(&self, batch_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE batch_id = $1 ORDER BY created_at ASC")
            .bind(batch_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_filtered(&self, date: Option<NaiveDate>, status: Option<BookingStatus>) -> Result<Vec<Booking>, AppError> {
        let status = status.map(|s| s.as_str());
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE ($1::date IS NULL OR booking_date = $1) AND ($2::text IS NULL OR status = $2) ORDER BY booking_date ASC, slot_start_minute ASC LIMIT 500"
        )
            .bind(date)
            .bind(status)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_occupied(
        &self,
        date: NaiveDate,
        slot_start_minute: i32,
        service_id: Option<&str>,
        provider_id: Option<&str>,
    ) -> Result<i64, AppError> {
        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;
        count_occupied_on(&mut *conn, date, slot_start_minute, service_id, provider_id).await
    }

    async fn apply_transition(
        &self,
        updated: &Booking,
        expected_status: BookingStatus,
        expected_payment: PaymentStatus,
        events: Vec<NotificationEvent>,
    ) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let saved = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $1, provider_id = $2, assigned_at = $3, payment_status = $4, payment_order_id = $5, payment_id = $6,
                cancellation_reason = $7, updated_at = $8, started_at = $9, completed_at = $10, cancelled_at = $11
             WHERE id = $12 AND status = $13 AND payment_status = $14
             RETURNING *"
        )
            .bind(updated.status.as_str()).bind(&updated.provider_id).bind(updated.assigned_at)
            .bind(updated.payment_status.as_str()).bind(&updated.payment_order_id).bind(&updated.payment_id)
            .bind(&updated.cancellation_reason).bind(updated.updated_at)
            .bind(updated.started_at).bind(updated.completed_at).bind(updated.cancelled_at)
            .bind(&updated.id).bind(expected_status.as_str()).bind(expected_payment.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(saved) = saved else {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(None);
        };

        insert_events(&mut *tx, &events).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(saved))
    }

    async fn reschedule_guarded(
        &self,
        updated: &Booking,
        expected_status: BookingStatus,
        capacity: i32,
        events: Vec<NotificationEvent>,
    ) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        lock_slots(&mut *tx, vec![updated.capacity_key()]).await?;

        let saved = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET booking_date = $1, slot_start_minute = $2, slot_duration_minutes = $3, time_slot = $4, updated_at = $5
             WHERE id = $6 AND status = $7
             RETURNING *"
        )
            .bind(updated.booking_date).bind(updated.slot_start_minute).bind(updated.slot_duration_minutes)
            .bind(&updated.time_slot).bind(updated.updated_at)
            .bind(&updated.id).bind(expected_status.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(saved) = saved else {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(None);
        };

        let used = count_occupied_on(
            &mut *tx, saved.booking_date, saved.slot_start_minute, Some(&saved.service.service_id), None
        ).await?;
        if used > capacity as i64 {
            tx.rollback().await.map_err(AppError::Database)?;
            return Err(AppError::slot_unavailable());
        }

        insert_events(&mut *tx, &events).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(saved))
    }
}
