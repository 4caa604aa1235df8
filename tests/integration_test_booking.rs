mod common;

use axum::http::StatusCode;
use chrono::Weekday;
use common::{booking_payload, days_ahead, next_weekday, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_capacity_two_admits_two_bookings_then_conflicts() {
    let app = TestApp::new().await;
    app.admin("POST", "/api/v1/admin/slot-configs", Some(json!({
        "service_id": "svc-clean",
        "day_of_week": 1,
        "start_time": "09:00",
        "end_time": "12:00",
        "slot_duration_minutes": 60,
        "max_bookings_per_slot": 2
    }))).await;
    let monday = next_weekday(Weekday::Mon).to_string();

    let (status, first) = app.book("user-1", "svc-clean", &monday, "09:00 AM", "cod").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["status"], "pending");
    assert_eq!(first["payment_status"], "pending");
    assert_eq!(first["time_slot"], "09:00 AM");
    let (status, _) = app.book("user-2", "svc-clean", &monday, "09:00", "cod").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.book("user-3", "svc-clean", &monday, "09:00 AM", "cod").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "This time slot is no longer available, please choose another");

    let (_, day) = app.send("GET", &format!("/api/v1/availability?date={}&service_id=svc-clean", monday), &[], None).await;
    assert_eq!(day["slots"][0]["capacity_used"], 2);
    assert_eq!(day["slots"][0]["is_available"], false);
    assert_eq!(day["slots"][1]["capacity_used"], 0);
}

#[tokio::test]
async fn test_cod_booking_is_paid_on_completion() {
    let app = TestApp::new().await;
    app.seed_provider("prov-1", "approved").await;
    let date = days_ahead(2).to_string();

    let (_, booking) = app.book("user-1", "svc-clean", &date, "11:00 AM", "cod").await;
    let id = booking["id"].as_str().unwrap();

    let (status, assigned) = app.admin("POST", &format!("/api/v1/admin/bookings/{}/assign", id), Some(json!({ "provider_id": "prov-1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["status"], "assigned");
    assert_eq!(assigned["provider_id"], "prov-1");
    assert!(!assigned["assigned_at"].is_null());

    let (status, started) = app.provider("prov-1", "POST", &format!("/api/v1/provider/bookings/{}/start", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "in_progress");
    assert!(!started["started_at"].is_null());

    let (status, completed) = app.provider("prov-1", "POST", &format!("/api/v1/provider/bookings/{}/complete", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["payment_status"], "paid");
    assert!(!completed["completed_at"].is_null());

    // Completed bookings release their capacity unit.
    let (_, check) = app.send("GET", &format!("/api/v1/availability/check?date={}&time_slot=11:00&service_id=svc-clean", date), &[], None).await;
    assert_eq!(check["slot"]["capacity_used"], 0);

    let (status, _) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_assignment_requires_an_eligible_provider() {
    let app = TestApp::new().await;
    app.seed_provider("prov-suspended", "suspended").await;
    let (_, booking) = app.book("user-1", "svc-clean", &days_ahead(2).to_string(), "09:00", "cod").await;
    let id = booking["id"].as_str().unwrap();

    let (status, _) = app.admin("POST", &format!("/api/v1/admin/bookings/{}/assign", id), Some(json!({ "provider_id": "prov-suspended" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.admin("POST", &format!("/api/v1/admin/bookings/{}/assign", id), Some(json!({ "provider_id": "prov-missing" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.booking_status(id).await["status"], "pending");
}

#[tokio::test]
async fn test_customer_chosen_provider_must_be_eligible() {
    let app = TestApp::new().await;
    app.seed_provider("prov-bad", "suspended").await;
    app.seed_provider("prov-1", "active").await;
    let date = days_ahead(2).to_string();

    let mut payload = booking_payload("svc-clean", &date, "09:00", "cod");
    payload["provider_id"] = json!("prov-bad");
    let (status, body) = app.customer("user-1", "POST", "/api/v1/bookings", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("prov-bad"));

    let mut payload = booking_payload("svc-clean", &date, "09:00", "cod");
    payload["provider_id"] = json!("prov-missing");
    let (status, _) = app.customer("user-1", "POST", "/api/v1/bookings", Some(payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, mine) = app.customer("user-1", "GET", "/api/v1/bookings", None).await;
    assert!(mine.as_array().unwrap().is_empty());

    let mut payload = booking_payload("svc-clean", &date, "09:00", "cod");
    payload["provider_id"] = json!("prov-1");
    let (status, booking) = app.customer("user-1", "POST", "/api/v1/bookings", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["provider_id"], "prov-1");
    let (status, _) = app.provider("prov-1", "POST", &format!("/api/v1/provider/bookings/{}/start", booking["id"].as_str().unwrap()), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_provider_cancel_keeps_slot_but_customer_cancel_frees_it() {
    let app = TestApp::new().await;
    app.seed_provider("prov-1", "active").await;
    app.seed_provider("prov-2", "approved").await;
    app.seed_config("svc-clean", "09:00", "11:00", 60, 1).await;
    let date = days_ahead(3).to_string();

    let (_, booking) = app.book("user-1", "svc-clean", &date, "09:00", "cod").await;
    let id = booking["id"].as_str().unwrap();
    app.admin("POST", &format!("/api/v1/admin/bookings/{}/assign", id), Some(json!({ "provider_id": "prov-1" }))).await;

    let (status, declined) = app.provider("prov-1", "POST", &format!("/api/v1/provider/bookings/{}/decline", id), Some(json!({ "reason": "Van broke down" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(declined["status"], "provider_cancelled");
    assert!(declined["provider_id"].is_null());
    assert!(declined["assigned_at"].is_null());
    assert_eq!(declined["cancellation_reason"], "Van broke down");

    // Still holding the only unit of capacity.
    let (status, _) = app.book("user-2", "svc-clean", &date, "09:00", "cod").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, reassigned) = app.admin("POST", &format!("/api/v1/admin/bookings/{}/assign", id), Some(json!({ "provider_id": "prov-2" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reassigned["status"], "assigned");
    assert_eq!(reassigned["provider_id"], "prov-2");

    let (status, cancelled) = app.customer("user-1", "POST", &format!("/api/v1/bookings/{}/cancel", id), Some(json!({ "reason": "Plans changed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert!(!cancelled["cancelled_at"].is_null());

    let (status, _) = app.book("user-2", "svc-clean", &date, "09:00", "cod").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_providers_cannot_touch_other_providers_jobs() {
    let app = TestApp::new().await;
    app.seed_provider("prov-1", "active").await;
    let (_, booking) = app.book("user-1", "svc-clean", &days_ahead(2).to_string(), "10:00", "cod").await;
    let id = booking["id"].as_str().unwrap();
    app.admin("POST", &format!("/api/v1/admin/bookings/{}/assign", id), Some(json!({ "provider_id": "prov-1" }))).await;

    let (status, _) = app.provider("prov-2", "POST", &format!("/api/v1/provider/bookings/{}/start", id), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.provider("prov-2", "POST", &format!("/api/v1/provider/bookings/{}/decline", id), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.provider("prov-2", "GET", &format!("/api/v1/bookings/{}", id), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.provider("prov-1", "GET", &format!("/api/v1/bookings/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, jobs) = app.provider("prov-1", "GET", "/api/v1/provider/bookings", None).await;
    assert_eq!(jobs.as_array().unwrap().len(), 1);

    // Completing before starting is not a legal move.
    let (status, _) = app.provider("prov-1", "POST", &format!("/api/v1/provider/bookings/{}/complete", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_customers_only_see_their_own_bookings() {
    let app = TestApp::new().await;
    let (_, booking) = app.book("user-1", "svc-clean", &days_ahead(2).to_string(), "10:00", "cod").await;
    let id = booking["id"].as_str().unwrap();

    let (status, _) = app.customer("user-2", "GET", &format!("/api/v1/bookings/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.customer("user-2", "POST", &format!("/api/v1/bookings/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, mine) = app.customer("user-1", "GET", "/api/v1/bookings", None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (_, theirs) = app.customer("user-2", "GET", "/api/v1/bookings", None).await;
    assert!(theirs.as_array().unwrap().is_empty());

    let (status, _) = app.send("GET", "/api/v1/bookings", &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_input_is_validated() {
    let app = TestApp::new().await;
    let date = days_ahead(2).to_string();

    let mut payload = booking_payload("svc-clean", &date, "09:00", "cod");
    payload["address"]["city"] = json!("");
    payload["address"]["pincode"] = json!(" ");
    let (status, body) = app.customer("user-1", "POST", "/api/v1/bookings", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("city, pincode"));

    // Not one of the generated hourly windows.
    let (status, _) = app.book("user-1", "svc-clean", &date, "09:15", "cod").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.book("user-1", "svc-clean", &days_ahead(-1).to_string(), "09:00", "cod").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.book("user-1", "svc-clean", &date, "25:00", "cod").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut payload = booking_payload("svc-clean", &date, "09:00", "cod");
    payload["service"]["price"] = json!(i64::MAX / 2);
    payload["service"]["quantity"] = json!(3);
    let (status, body) = app.customer("user-1", "POST", "/api/v1/bookings", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Booking amount is too large");

    let mut payload = booking_payload("svc-clean", &date, "09:00", "cod");
    payload["service"]["price"] = json!(i64::MAX);
    payload["tip_amount"] = json!(1);
    let (status, _) = app.customer("user-1", "POST", "/api/v1/bookings", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_totals_apply_discount_and_tip() {
    let app = TestApp::new().await;
    let mut payload = booking_payload("svc-clean", &days_ahead(2).to_string(), "09:00", "cod");
    payload["service"]["quantity"] = json!(2);
    payload["discount_amount"] = json!(10000);
    payload["tip_amount"] = json!(5000);

    let (status, booking) = app.customer("user-1", "POST", "/api/v1/bookings", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["total_amount"], 2 * 49900 - 10000 + 5000);
    assert_eq!(booking["currency"], "INR");
}

#[tokio::test]
async fn test_admin_status_endpoint_drives_lifecycle() {
    let app = TestApp::new().await;
    app.seed_provider("prov-1", "approved").await;
    let (_, booking) = app.book("user-1", "svc-clean", &days_ahead(2).to_string(), "12:00", "cod").await;
    let id = booking["id"].as_str().unwrap();
    let uri = format!("/api/v1/admin/bookings/{}/status", id);

    let (status, confirmed) = app.admin("PUT", &uri, Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");

    let (status, _) = app.admin("PUT", &uri, Some(json!({ "status": "assigned" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.admin("PUT", &uri, Some(json!({ "status": "assigned", "provider_id": "prov-1" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, started) = app.admin("PUT", &uri, Some(json!({ "status": "in_progress" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "in_progress");

    let (status, _) = app.admin("PUT", &uri, Some(json!({ "status": "pending" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.admin("PUT", &uri, Some(json!({ "status": "teleported" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, cancelled) = app.admin("PUT", &uri, Some(json!({ "status": "cancelled", "reason": "Customer unreachable" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["cancellation_reason"], "Customer unreachable");

    let (status, listed) = app.admin("GET", "/api/v1/admin/bookings?status=cancelled", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (_, listed) = app.admin("GET", "/api/v1/admin/bookings?status=pending", None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reschedule_respects_capacity() {
    let app = TestApp::new().await;
    app.seed_config("svc-clean", "09:00", "12:00", 60, 1).await;
    let date = days_ahead(2).to_string();

    let (_, mine) = app.book("user-1", "svc-clean", &date, "09:00", "cod").await;
    app.book("user-2", "svc-clean", &date, "10:00", "cod").await;
    let id = mine["id"].as_str().unwrap();
    let uri = format!("/api/v1/bookings/{}/reschedule", id);

    let (status, body) = app.customer("user-1", "POST", &uri, Some(json!({ "date": date, "time_slot": "10:00" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "This time slot is no longer available, please choose another");

    let (status, _) = app.customer("user-1", "POST", &uri, Some(json!({ "date": date, "time_slot": "09:00" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, moved) = app.customer("user-1", "POST", &uri, Some(json!({ "date": date, "time_slot": "11:00 AM" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["time_slot"], "11:00 AM");

    // The old slot is free again.
    let (status, _) = app.book("user-3", "svc-clean", &date, "09:00", "cod").await;
    assert_eq!(status, StatusCode::CREATED);
}
