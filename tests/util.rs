#![allow(unused)]

use actix_http::{body::MessageBody, Method};
use actix_web::{
    dev::ServiceResponse,
    test::{read_body_json, TestRequest},
};
use anyhow::Result;
use entity::{campaign, Mode};
use givebox::{now, Service, SubmissionRequest};
use migration::{Migrator, MigratorTrait};
use payment_client::vendor::{
    Amount, CreatePayment, CreateSubscription, Customer, Method as PayMethod, Payment,
    PaymentStatus, Refund, SequenceType, Subscription,
};
use payment_client::{Error, PaymentVendor};
use sea_orm::{Database, DbConn};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub fn get(path: &str) -> TestRequest {
    TestRequest::with_uri(path)
}

pub fn post(path: &str, data: Value) -> TestRequest {
    TestRequest::with_uri(path)
        .method(Method::POST)
        .set_json(data)
}

pub fn post_form(path: &str, data: impl serde::Serialize) -> TestRequest {
    TestRequest::with_uri(path)
        .method(Method::POST)
        .set_form(data)
}

pub async fn json<B>(res: ServiceResponse<B>) -> Value
where
    B: MessageBody,
{
    assert_eq!(
        res.headers().get(actix_http::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    read_body_json::<Value, _>(res).await
}

#[derive(Default)]
pub struct VendorState {
    pub customers: HashMap<String, Customer>,
    pub payments: HashMap<String, Payment>,
    pub subscriptions: HashMap<String, Subscription>,
    pub refunds: Vec<(String, Amount)>,
    pub mandates: HashSet<String>,
    counter: u32,
}

/// In-memory payment vendor double.
#[derive(Default, Clone)]
pub struct FakeVendor {
    state: Arc<Mutex<VendorState>>,
}

impl FakeVendor {
    fn next(&self, prefix: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.counter += 1;
        format!("{}_{}", prefix, state.counter)
    }

    pub fn set_status(&self, payment_id: &str, status: PaymentStatus) {
        let mut state = self.state.lock().unwrap();
        let payment = state.payments.get_mut(payment_id).unwrap();
        payment.status = status;
    }

    pub fn set_amount(&self, payment_id: &str, value: f64, currency: &str) {
        let mut state = self.state.lock().unwrap();
        let payment = state.payments.get_mut(payment_id).unwrap();
        payment.amount = Amount::new(value, currency);
    }

    pub fn set_refunded(&self, payment_id: &str, refunded: f64) {
        let mut state = self.state.lock().unwrap();
        let payment = state.payments.get_mut(payment_id).unwrap();
        let total = payment.amount.as_f64();
        let currency = payment.amount.currency.clone();
        payment.amount_refunded = Some(Amount::new(refunded, &currency));
        payment.amount_remaining = Some(Amount::new(total - refunded, &currency));
    }

    pub fn grant_mandate(&self, customer_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.mandates.insert(customer_id.to_owned());
    }

    pub fn payment(&self, payment_id: &str) -> Option<Payment> {
        self.state.lock().unwrap().payments.get(payment_id).cloned()
    }

    pub fn last_payment_id(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        (1..=state.counter)
            .rev()
            .map(|n| format!("tr_{}", n))
            .find(|id| state.payments.contains_key(id))
    }

    pub fn subscription_count(&self) -> usize {
        self.state.lock().unwrap().subscriptions.len()
    }

    pub fn refund_count(&self) -> usize {
        self.state.lock().unwrap().refunds.len()
    }

    /// Register a recurring charge the way the vendor would create one
    /// from a live subscription.
    pub fn push_recurring_payment(
        &self,
        subscription_id: &str,
        customer_id: &str,
        value: f64,
        status: PaymentStatus,
    ) -> String {
        let id = self.next("tr");
        let mut state = self.state.lock().unwrap();
        state.payments.insert(
            id.clone(),
            Payment {
                id: id.clone(),
                status,
                amount: Amount::new(value, "EUR"),
                amount_refunded: None,
                amount_remaining: None,
                sequence_type: SequenceType::Recurring,
                customer_id: Some(customer_id.to_owned()),
                subscription_id: Some(subscription_id.to_owned()),
                mandate_id: None,
                method: Some("directdebit".to_owned()),
                mode: Some("test".to_owned()),
                checkout_url: None,
                metadata: None,
            },
        );
        id
    }
}

#[async_trait::async_trait]
impl PaymentVendor for FakeVendor {
    async fn create_customer(&self, name: &str, email: &str) -> Result<Customer, Error> {
        let id = self.next("cst");
        let customer = Customer {
            id: id.clone(),
            name: Some(name.to_owned()),
            email: Some(email.to_owned()),
        };
        self.state
            .lock()
            .unwrap()
            .customers
            .insert(id, customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: &str) -> Result<Customer, Error> {
        self.state
            .lock()
            .unwrap()
            .customers
            .get(id)
            .cloned()
            .ok_or(Error::PaymentNotFound)
    }

    async fn create_payment(&self, req: CreatePayment) -> Result<Payment, Error> {
        let id = self.next("tr");
        let payment = Payment {
            id: id.clone(),
            status: PaymentStatus::Open,
            amount: req.amount,
            amount_refunded: None,
            amount_remaining: None,
            sequence_type: req.sequence_type,
            customer_id: req.customer_id,
            subscription_id: None,
            mandate_id: None,
            method: Some("ideal".to_owned()),
            mode: Some("test".to_owned()),
            checkout_url: Some(format!("https://checkout.test/{}", id)),
            metadata: Some(req.metadata),
        };
        self.state
            .lock()
            .unwrap()
            .payments
            .insert(id, payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, id: &str) -> Result<Payment, Error> {
        self.state
            .lock()
            .unwrap()
            .payments
            .get(id)
            .cloned()
            .ok_or(Error::PaymentNotFound)
    }

    async fn create_subscription(&self, req: CreateSubscription) -> Result<Subscription, Error> {
        let id = self.next("sub");
        let subscription = Subscription {
            id: id.clone(),
            status: "active".to_owned(),
            amount: req.amount,
            interval: req.interval,
            times: req.times,
            customer_id: Some(req.customer_id),
        };
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .insert(id, subscription.clone());
        Ok(subscription)
    }

    async fn cancel_subscription(
        &self,
        _customer_id: &str,
        subscription_id: &str,
    ) -> Result<Subscription, Error> {
        let mut state = self.state.lock().unwrap();
        let subscription = state
            .subscriptions
            .get_mut(subscription_id)
            .ok_or(Error::PaymentNotFound)?;
        subscription.status = "canceled".to_owned();
        Ok(subscription.clone())
    }

    async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Amount,
        _description: String,
    ) -> Result<Refund, Error> {
        let mut state = self.state.lock().unwrap();
        if !state.payments.contains_key(payment_id) {
            return Err(Error::PaymentNotFound);
        }
        state.refunds.push((payment_id.to_owned(), amount.clone()));
        Ok(Refund {
            id: format!("re_{}", state.refunds.len()),
            amount,
            status: "pending".to_owned(),
        })
    }

    async fn list_methods(&self) -> Result<Vec<PayMethod>, Error> {
        Ok(vec![
            PayMethod {
                id: "ideal".to_owned(),
                description: "iDEAL".to_owned(),
            },
            PayMethod {
                id: "creditcard".to_owned(),
                description: "Credit card".to_owned(),
            },
        ])
    }

    async fn has_valid_mandate(&self, customer_id: &str) -> Result<bool, Error> {
        Ok(self.state.lock().unwrap().mandates.contains(customer_id))
    }
}

pub async fn create_db() -> Result<DbConn> {
    let conn = Database::connect("sqlite::memory:").await?;
    Migrator::fresh(&conn).await?;
    Ok(conn)
}

pub async fn create_service(vendor: FakeVendor) -> Result<Service> {
    create_service_with(vendor, 0).await
}

pub async fn create_service_with(vendor: FakeVendor, min_elapsed_secs: u64) -> Result<Service> {
    let conn = create_db().await?;
    Ok(Service::new(
        Box::new(vendor),
        conn,
        Mode::Test,
        "http://127.0.0.1:8080".to_owned(),
        min_elapsed_secs,
    ))
}

pub async fn seed_campaign(service: &Service) -> Result<i32> {
    let model = campaign::Model {
        title: Some("Save the bees".to_owned()),
        currency: Some("EUR".to_owned()),
        ..Default::default()
    };
    Ok(service.campaigns().insert(&model).await?)
}

pub fn submission(campaign_id: i32, value: f64) -> SubmissionRequest {
    SubmissionRequest {
        value,
        currency: "EUR".to_owned(),
        email: "donor@example.org".to_owned(),
        name: "Jan Jansen".to_owned(),
        campaign_id,
        return_url: "https://donate.example.org/thanks".to_owned(),
        form_rendered_at: now() - 100,
        ..Default::default()
    }
}
