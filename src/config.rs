use std::env;
use chrono_tz::Tz;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub business_timezone: Tz,
    pub admin_api_key: String,
    pub notification_service_url: String,
    pub notification_service_token: String,
    pub razorpay_api_url: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub outbox_poll_seconds: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            business_timezone: env::var("BUSINESS_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Kolkata".to_string())
                .parse()
                .expect("BUSINESS_TIMEZONE must be an IANA timezone name"),
            admin_api_key: env::var("ADMIN_API_KEY").expect("ADMIN_API_KEY must be set"),
            notification_service_url: env::var("NOTIFICATION_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/notify".to_string()),
            notification_service_token: env::var("NOTIFICATION_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            razorpay_api_url: env::var("RAZORPAY_API_URL").unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
            razorpay_key_id: env::var("RAZORPAY_KEY_ID").expect("RAZORPAY_KEY_ID must be set"),
            razorpay_key_secret: env::var("RAZORPAY_KEY_SECRET").expect("RAZORPAY_KEY_SECRET must be set"),
            outbox_poll_seconds: env::var("OUTBOX_POLL_SECONDS").ok().and_then(|s| s.parse().ok()).unwrap_or(5),
        }
    }
}
