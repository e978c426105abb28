//! Mollie v2 REST client.

use crate::vendor::{
    Amount, CreatePayment, CreateSubscription, Customer, Method, Payment, PaymentStatus,
    PaymentVendor, Refund, SequenceType, Subscription,
};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.mollie.com/v2";

#[derive(Debug, Clone)]
pub struct Mollie {
    http: reqwest::Client,
    base: String,
    api_key: String,
}

impl Mollie {
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            api_key,
        })
    }

    /// Keys are prefixed `test_` or `live_`.
    pub fn is_test(&self) -> bool {
        self.api_key.starts_with("test_")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::PaymentNotFound);
        }
        let detail: ApiError = resp.json().await.unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            title: detail.title,
            detail: detail.detail,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "mollie get");
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        debug!(path, "mollie post");
        let resp = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "mollie delete");
        let resp = self
            .http
            .delete(self.url(path))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::decode(resp).await
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MolliePayment {
    id: String,
    status: PaymentStatus,
    amount: Amount,
    #[serde(default)]
    amount_refunded: Option<Amount>,
    #[serde(default)]
    amount_remaining: Option<Amount>,
    #[serde(default)]
    sequence_type: SequenceType,
    #[serde(default)]
    customer_id: Option<String>,
    #[serde(default)]
    subscription_id: Option<String>,
    #[serde(default)]
    mandate_id: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default, rename = "_links")]
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    checkout: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

impl From<MolliePayment> for Payment {
    fn from(p: MolliePayment) -> Self {
        Payment {
            id: p.id,
            status: p.status,
            amount: p.amount,
            amount_refunded: p.amount_refunded,
            amount_remaining: p.amount_remaining,
            sequence_type: p.sequence_type,
            customer_id: p.customer_id,
            subscription_id: p.subscription_id,
            mandate_id: p.mandate_id,
            method: p.method,
            mode: p.mode,
            checkout_url: p.links.checkout.map(|l| l.href),
            metadata: p.metadata,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCustomerBody<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentBody<'a> {
    amount: &'a Amount,
    description: &'a str,
    redirect_url: &'a str,
    webhook_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_id: Option<&'a str>,
    sequence_type: SequenceType,
    metadata: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSubscriptionBody<'a> {
    amount: &'a Amount,
    interval: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    times: Option<u32>,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook_url: Option<&'a str>,
    metadata: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRefundBody<'a> {
    amount: &'a Amount,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct Embedded<T> {
    #[serde(rename = "_embedded")]
    embedded: T,
}

#[derive(Debug, Deserialize)]
struct MandateList {
    mandates: Vec<Mandate>,
}

#[derive(Debug, Deserialize)]
struct Mandate {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct MethodList {
    methods: Vec<MollieMethod>,
}

#[derive(Debug, Deserialize)]
struct MollieMethod {
    id: String,
    #[serde(default)]
    description: String,
}

#[async_trait::async_trait]
impl PaymentVendor for Mollie {
    async fn create_customer(&self, name: &str, email: &str) -> Result<Customer> {
        self.post("/customers", &CreateCustomerBody { name, email })
            .await
    }

    async fn get_customer(&self, id: &str) -> Result<Customer> {
        self.get(&format!("/customers/{}", id)).await
    }

    async fn create_payment(&self, req: CreatePayment) -> Result<Payment> {
        let body = CreatePaymentBody {
            amount: &req.amount,
            description: &req.description,
            redirect_url: &req.redirect_url,
            webhook_url: &req.webhook_url,
            customer_id: req.customer_id.as_deref(),
            sequence_type: req.sequence_type,
            metadata: &req.metadata,
        };
        let payment: MolliePayment = self.post("/payments", &body).await?;
        Ok(payment.into())
    }

    async fn get_payment(&self, id: &str) -> Result<Payment> {
        let payment: MolliePayment = self.get(&format!("/payments/{}", id)).await?;
        Ok(payment.into())
    }

    async fn create_subscription(&self, req: CreateSubscription) -> Result<Subscription> {
        let body = CreateSubscriptionBody {
            amount: &req.amount,
            interval: &req.interval,
            times: req.times,
            description: &req.description,
            webhook_url: req.webhook_url.as_deref(),
            metadata: &req.metadata,
        };
        self.post(
            &format!("/customers/{}/subscriptions", req.customer_id),
            &body,
        )
        .await
    }

    async fn cancel_subscription(
        &self,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<Subscription> {
        self.delete(&format!(
            "/customers/{}/subscriptions/{}",
            customer_id, subscription_id
        ))
        .await
    }

    async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Amount,
        description: String,
    ) -> Result<Refund> {
        self.post(
            &format!("/payments/{}/refunds", payment_id),
            &CreateRefundBody {
                amount: &amount,
                description: &description,
            },
        )
        .await
    }

    async fn list_methods(&self) -> Result<Vec<Method>> {
        let list: Embedded<MethodList> = self.get("/methods").await?;
        Ok(list
            .embedded
            .methods
            .into_iter()
            .map(|m| Method {
                id: m.id,
                description: m.description,
            })
            .collect())
    }

    async fn has_valid_mandate(&self, customer_id: &str) -> Result<bool> {
        let list: Embedded<MandateList> =
            self.get(&format!("/customers/{}/mandates", customer_id)).await?;
        Ok(list
            .embedded
            .mandates
            .iter()
            .any(|m| m.status == "valid" || m.status == "pending"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_wire_format() {
        let json = r#"{
            "id": "tr_WDqYK6vllg",
            "mode": "test",
            "status": "paid",
            "amount": {"value": "10.00", "currency": "EUR"},
            "amountRefunded": {"value": "2.50", "currency": "EUR"},
            "amountRemaining": {"value": "7.50", "currency": "EUR"},
            "sequenceType": "first",
            "customerId": "cst_8wmqcHMN4U",
            "mandateId": "mdt_h3gAaD5zP",
            "method": "ideal",
            "metadata": {"transaction_id": 12},
            "_links": {
                "checkout": {"href": "https://www.mollie.com/checkout/select-method/WDqYK6vllg", "type": "text/html"}
            }
        }"#;
        let wire: MolliePayment = serde_json::from_str(json).unwrap();
        let payment: Payment = wire.into();
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.sequence_type, SequenceType::First);
        assert_eq!(payment.amount.as_f64(), 10.0);
        assert!(payment.has_refunds());
        assert_eq!(payment.mandate_id.as_deref(), Some("mdt_h3gAaD5zP"));
        assert!(payment
            .checkout_url
            .as_deref()
            .unwrap()
            .starts_with("https://www.mollie.com/checkout/"));
        assert_eq!(payment.metadata.unwrap()["transaction_id"], 12);
    }

    #[test]
    fn mandate_list_wire_format() {
        let json = r#"{"_embedded": {"mandates": [{"id": "mdt_1", "status": "valid"}]}}"#;
        let list: Embedded<MandateList> = serde_json::from_str(json).unwrap();
        assert!(list.embedded.mandates[0].status == "valid");
    }
}
