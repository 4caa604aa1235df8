use crate::domain::ports::{PaymentGateway, PaymentOrder};
use crate::error::AppError;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

/// Razorpay-compatible REST client.
pub struct RazorpayGateway {
    client: Client,
    api_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(api_url: String, key_id: String, key_secret: String) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            key_id,
            key_secret,
        }
    }

    async fn post<B: Serialize + Sync, R: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> Result<R, AppError> {
        let res = self.client.post(format!("{}{}", self.api_url, path))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Payment gateway connection error: {}", e);
                error!("{}", msg);
                AppError::Dependency(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Payment gateway call {} failed. Status: {}, Body: {}", path, status, text);
            error!("{}", msg);
            return Err(AppError::Dependency(msg));
        }

        res.json::<R>().await.map_err(|e| AppError::Dependency(format!("Unreadable gateway response: {}", e)))
    }
}

/// HMAC-SHA256 of `order_id|payment_id`, hex encoded, compared in constant time.
pub fn signature_matches(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[derive(Serialize)]
struct OrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Serialize)]
struct RefundRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<i64>,
}

#[derive(Deserialize)]
struct RefundResponse {
    id: String,
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, amount: i64, currency: &str, receipt: &str) -> Result<PaymentOrder, AppError> {
        let order: OrderResponse = self.post("/orders", &OrderRequest { amount, currency, receipt }).await?;
        Ok(PaymentOrder { id: order.id, amount: order.amount, currency: order.currency })
    }

    async fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<bool, AppError> {
        Ok(signature_matches(&self.key_secret, order_id, payment_id, signature))
    }

    async fn refund(&self, payment_id: &str, amount: Option<i64>) -> Result<String, AppError> {
        let refund: RefundResponse = self.post(&format!("/payments/{}/refund", payment_id), &RefundRequest { amount }).await?;
        Ok(refund.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_the_gateway_signature() {
        let signature = sign("secret", "order_1", "pay_1");
        assert!(signature_matches("secret", "order_1", "pay_1", &signature));
    }

    #[test]
    fn rejects_tampered_input() {
        let signature = sign("secret", "order_1", "pay_1");
        assert!(!signature_matches("secret", "order_1", "pay_2", &signature));
        assert!(!signature_matches("other", "order_1", "pay_1", &signature));
        assert!(!signature_matches("secret", "order_1", "pay_1", "not-hex"));
    }
}
