use crate::Result;
use serde::{Deserialize, Serialize};

/// Monetary amount as the vendor wires it: a decimal string plus an
/// uppercase currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: String,
    pub value: String,
}

impl Amount {
    pub fn new(value: f64, currency: &str) -> Self {
        Self {
            currency: currency.to_ascii_uppercase(),
            value: format!("{:.2}", value),
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.value.parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Open,
    Pending,
    Authorized,
    Paid,
    Failed,
    Canceled,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SequenceType {
    #[default]
    Oneoff,
    First,
    Recurring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Authoritative payment state as fetched from the vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub status: PaymentStatus,
    pub amount: Amount,
    #[serde(default)]
    pub amount_refunded: Option<Amount>,
    #[serde(default)]
    pub amount_remaining: Option<Amount>,
    #[serde(default)]
    pub sequence_type: SequenceType,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub mandate_id: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl Payment {
    pub fn has_refunds(&self) -> bool {
        self.amount_refunded
            .as_ref()
            .map(|a| a.as_f64() > 0.0)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePayment {
    pub amount: Amount,
    pub description: String,
    pub redirect_url: String,
    pub webhook_url: String,
    pub customer_id: Option<String>,
    pub sequence_type: SequenceType,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub status: String,
    pub amount: Amount,
    pub interval: String,
    #[serde(default)]
    pub times: Option<u32>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSubscription {
    pub customer_id: String,
    pub amount: Amount,
    /// charge interval, e.g. "1 month"
    pub interval: String,
    /// total number of charges, None = until cancelled
    pub times: Option<u32>,
    pub description: String,
    pub webhook_url: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub amount: Amount,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub id: String,
    pub description: String,
}

/// the payment vendor trait for multiple providers
#[async_trait::async_trait]
pub trait PaymentVendor {
    async fn create_customer(&self, name: &str, email: &str) -> Result<Customer>;

    async fn get_customer(&self, id: &str) -> Result<Customer>;

    async fn create_payment(&self, req: CreatePayment) -> Result<Payment>;

    async fn get_payment(&self, id: &str) -> Result<Payment>;

    async fn create_subscription(&self, req: CreateSubscription) -> Result<Subscription>;

    async fn cancel_subscription(
        &self,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<Subscription>;

    async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Amount,
        description: String,
    ) -> Result<Refund>;

    async fn list_methods(&self) -> Result<Vec<Method>>;

    /// whether the customer holds a mandate usable for recurring charges
    async fn has_valid_mandate(&self, customer_id: &str) -> Result<bool>;
}
