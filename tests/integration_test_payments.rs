mod common;

use axum::http::StatusCode;
use common::{days_ahead, TestApp, VALID_SIGNATURE};
use serde_json::json;
use std::sync::atomic::Ordering;

async fn online_booking(app: &TestApp, user_id: &str) -> String {
    let (status, booking) = app.book(user_id, "svc-clean", &days_ahead(2).to_string(), "10:00", "online").await;
    assert_eq!(status, StatusCode::CREATED);
    booking["id"].as_str().unwrap().to_string()
}

async fn create_order(app: &TestApp, user_id: &str, id: &str) -> String {
    let (status, order) = app.customer(user_id, "POST", &format!("/api/v1/bookings/{}/payment/order", id), None).await;
    assert_eq!(status, StatusCode::CREATED);
    order["order_id"].as_str().unwrap().to_string()
}

async fn paid_online_booking(app: &TestApp, user_id: &str, payment_id: &str) -> String {
    let id = online_booking(app, user_id).await;
    let order_id = create_order(app, user_id, &id).await;
    let (status, _) = app.customer(user_id, "POST", &format!("/api/v1/bookings/{}/payment/verify", id), Some(json!({
        "order_id": order_id,
        "payment_id": payment_id,
        "signature": VALID_SIGNATURE
    }))).await;
    assert_eq!(status, StatusCode::OK);
    id
}

#[tokio::test]
async fn test_verified_payment_confirms_pending_booking() {
    let app = TestApp::new().await;
    let id = online_booking(&app, "user-1").await;

    let (status, order) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/order", id), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["order_id"], format!("order_{}", id));
    assert_eq!(order["amount"], 49900);
    assert_eq!(order["currency"], "INR");
    assert_eq!(order["key_id"], "rzp_test_key");

    let (status, paid) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/verify", id), Some(json!({
        "order_id": format!("order_{}", id),
        "payment_id": "pay_123",
        "signature": VALID_SIGNATURE
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["payment_status"], "paid");
    assert_eq!(paid["status"], "confirmed");
    assert_eq!(paid["payment_id"], "pay_123");

    // Paying twice is not a legal payment transition.
    let (status, _) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/verify", id), Some(json!({
        "order_id": format!("order_{}", id),
        "payment_id": "pay_124",
        "signature": VALID_SIGNATURE
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_bad_signature_leaves_payment_pending() {
    let app = TestApp::new().await;
    let id = online_booking(&app, "user-1").await;
    let order_id = create_order(&app, "user-1", &id).await;

    let (status, body) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/verify", id), Some(json!({
        "order_id": order_id,
        "payment_id": "pay_123",
        "signature": "forged"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Payment signature verification failed");

    let booking = app.booking_status(&id).await;
    assert_eq!(booking["payment_status"], "pending");
    assert_eq!(booking["status"], "pending");
    assert!(booking["payment_id"].is_null());
}

#[tokio::test]
async fn test_payment_must_match_this_bookings_order() {
    let app = TestApp::new().await;
    let first = online_booking(&app, "user-1").await;
    let second = online_booking(&app, "user-1").await;
    let first_order = create_order(&app, "user-1", &first).await;

    let proof = json!({
        "order_id": first_order,
        "payment_id": "pay_1",
        "signature": VALID_SIGNATURE
    });
    let (status, _) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/verify", first), Some(proof.clone())).await;
    assert_eq!(status, StatusCode::OK);

    // The second booking never asked for an order, so the first one's proof is refused.
    let (status, body) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/verify", second), Some(proof.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("create a payment order first"));
    let booking = app.booking_status(&second).await;
    assert_eq!(booking["payment_status"], "pending");
    assert_eq!(booking["status"], "pending");

    let second_order = create_order(&app, "user-1", &second).await;
    let (status, _) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/verify", second), Some(proof)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.booking_status(&second).await["payment_status"], "pending");

    let (status, paid) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/verify", second), Some(json!({
        "order_id": second_order,
        "payment_id": "pay_2",
        "signature": VALID_SIGNATURE
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["payment_status"], "paid");
}

#[tokio::test]
async fn test_gateway_outage_is_a_dependency_error() {
    let app = TestApp::new().await;
    let id = online_booking(&app, "user-1").await;
    let order_id = create_order(&app, "user-1", &id).await;
    app.gateway.unavailable.store(true, Ordering::SeqCst);

    let (status, _) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/order", id), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, _) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/verify", id), Some(json!({
        "order_id": order_id,
        "payment_id": "pay_123",
        "signature": VALID_SIGNATURE
    }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(app.booking_status(&id).await["payment_status"], "pending");
}

#[tokio::test]
async fn test_payment_endpoints_reject_cod_and_strangers() {
    let app = TestApp::new().await;
    let (_, booking) = app.book("user-1", "svc-clean", &days_ahead(2).to_string(), "10:00", "cod").await;
    let cod_id = booking["id"].as_str().unwrap();

    let (status, _) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/order", cod_id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let online_id = online_booking(&app, "user-1").await;
    let (status, _) = app.customer("user-2", "POST", &format!("/api/v1/bookings/{}/payment/order", online_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_refund_goes_through_gateway_for_online_payments() {
    let app = TestApp::new().await;
    let id = online_booking(&app, "user-1").await;

    let (status, _) = app.admin("POST", &format!("/api/v1/admin/bookings/{}/refund", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let order_id = create_order(&app, "user-1", &id).await;
    let (status, _) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/payment/verify", id), Some(json!({
        "order_id": order_id,
        "payment_id": "pay_777",
        "signature": VALID_SIGNATURE
    }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.admin("POST", &format!("/api/v1/admin/bookings/{}/refund", id), Some(json!({ "amount": 999999 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, refunded) = app.admin("POST", &format!("/api/v1/admin/bookings/{}/refund", id), Some(json!({ "amount": 20000 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refunded["payment_status"], "refunded");
    assert_eq!(
        app.gateway.refunds.lock().unwrap().clone(),
        vec![("pay_777".to_string(), Some(20000))]
    );
}

#[tokio::test]
async fn test_refund_is_recorded_after_a_concurrent_status_change() {
    let app = TestApp::new().await;
    let id = paid_online_booking(&app, "user-1", "pay_888").await;

    // The booking is cancelled while the gateway is processing the refund.
    *app.gateway.cancel_during_refund.lock().unwrap() = Some(app.pool.clone());

    let (status, refunded) = app.admin("POST", &format!("/api/v1/admin/bookings/{}/refund", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refunded["payment_status"], "refunded");
    assert_eq!(refunded["status"], "cancelled");
    assert_eq!(app.gateway.refunds.lock().unwrap().len(), 1);

    let (status, _) = app.admin("POST", &format!("/api/v1/admin/bookings/{}/refund", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.gateway.refunds.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_provider_records_cash_collection() {
    let app = TestApp::new().await;
    app.seed_provider("prov-1", "active").await;
    let (_, booking) = app.book("user-1", "svc-clean", &days_ahead(2).to_string(), "15:00", "cod").await;
    let id = booking["id"].as_str().unwrap();
    let uri = format!("/api/v1/provider/bookings/{}/payment", id);

    app.admin("POST", &format!("/api/v1/admin/bookings/{}/assign", id), Some(json!({ "provider_id": "prov-1" }))).await;

    // Not on site yet.
    let (status, _) = app.provider("prov-1", "POST", &uri, Some(json!({ "payment_status": "paid" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.provider("prov-1", "POST", &format!("/api/v1/provider/bookings/{}/start", id), None).await;
    let (status, updated) = app.provider("prov-1", "POST", &uri, Some(json!({ "payment_status": "paid" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["payment_status"], "paid");
    assert_eq!(updated["status"], "in_progress");

    // Completion leaves an already paid booking alone.
    let (_, completed) = app.provider("prov-1", "POST", &format!("/api/v1/provider/bookings/{}/complete", id), None).await;
    assert_eq!(completed["payment_status"], "paid");

    let (status, refunded) = app.admin("POST", &format!("/api/v1/admin/bookings/{}/refund", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refunded["payment_status"], "refunded");
    assert!(app.gateway.refunds.lock().unwrap().is_empty());
}
