use crate::{now, repository::Repository, Error, Result};
use entity::schema::Row;
use entity::transaction::RefundSummary;
use entity::{campaign, country, donor, subscription, transaction, Mode};
use payment_client::vendor::SequenceType as VendorSequence;
use payment_client::vendor::{Amount, CreatePayment, CreateSubscription, Payment, PaymentStatus};
use payment_client::PaymentVendor;
use sea_orm::{ActiveEnum, ColumnTrait, DbConn, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

/// Donation service over a payment vendor and the storage layer.
pub struct Service {
    vendor: Box<dyn PaymentVendor + Sync + Send>,
    conn: DbConn,
    mode: Mode,
    site: String,
    min_elapsed_secs: u64,
}

/// A donation form submission.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SubmissionRequest {
    pub value: f64,
    pub currency: String,
    pub recurring: bool,
    /// charge interval for recurring donations, e.g. "1 month"
    pub frequency: String,
    /// recurring duration in years, 0 = until cancelled
    pub years: u32,
    pub email: String,
    pub name: String,
    pub business_name: Option<String>,
    pub street: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub message: Option<String>,
    pub campaign_id: i32,
    pub return_url: String,
    /// unix seconds the form was rendered, for the elapsed-time check
    pub form_rendered_at: u64,
    /// honeypot, humans leave it empty
    pub website: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResponse {
    /// vendor checkout url to redirect the donor to
    pub url: String,
    pub transaction_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// payment state applied
    Processed,
    /// already reconciled, acknowledged without mutating
    Duplicate,
    /// unknown to us, acknowledged so the vendor stops retrying
    Ignored,
}

impl Service {
    pub fn new(
        vendor: Box<dyn PaymentVendor + Sync + Send>,
        conn: DbConn,
        mode: Mode,
        site: String,
        min_elapsed_secs: u64,
    ) -> Self {
        Self {
            vendor,
            conn,
            mode,
            site,
            min_elapsed_secs,
        }
    }

    pub fn db(&self) -> &DbConn {
        &self.conn
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn campaigns(&self) -> Repository<campaign::Entity> {
        Repository::new(self.conn.clone())
    }

    pub fn donors(&self) -> Repository<donor::Entity> {
        Repository::new(self.conn.clone())
    }

    pub fn transactions(&self) -> Repository<transaction::Entity> {
        Repository::new(self.conn.clone())
    }

    pub fn subscriptions(&self) -> Repository<subscription::Entity> {
        Repository::new(self.conn.clone())
    }

    fn webhook_url(&self) -> String {
        format!("{}/v1/webhook", self.site)
    }

    pub async fn get_campaign(&self, id: i32) -> Result<Option<campaign::Model>> {
        self.campaigns().get(id).await
    }

    pub async fn get_donor_by_email(&self, email: &str) -> Result<Option<donor::Model>> {
        let mut criteria = Row::new();
        criteria.insert("email".to_owned(), json!(email));
        criteria.insert("mode".to_owned(), json!(mode_value(self.mode)));
        self.donors().find_one_by(&criteria).await
    }

    pub async fn donor_transactions(&self, donor_id: i32) -> Result<Vec<transaction::Model>> {
        let mut criteria = Row::new();
        criteria.insert("donor_id".to_owned(), json!(donor_id));
        self.transactions().find_by(&criteria).await
    }

    pub async fn active_methods(&self) -> Result<Vec<payment_client::vendor::Method>> {
        Ok(self.vendor.list_methods().await?)
    }

    /// Validate a submission, resolve the donor, record an open
    /// transaction and hand off to the vendor checkout.
    pub async fn submit_donation(&self, req: &SubmissionRequest) -> Result<SubmissionResponse> {
        self.check_submission(req)?;

        let campaign = self
            .get_campaign(req.campaign_id)
            .await?
            .ok_or(Error::NotFound("campaign"))?;
        check_amount(&campaign, req.value)?;

        let donor = self.resolve_donor(req).await?;
        let customer_id = donor.customer_id.clone();

        let sequence_type = if req.recurring {
            transaction::SequenceType::First
        } else {
            transaction::SequenceType::Oneoff
        };
        let currency = req.currency.to_ascii_uppercase();
        let tx = transaction::Model {
            value: Some(req.value),
            currency: Some(currency.clone()),
            status: Some(transaction::Status::Open),
            sequence_type: Some(sequence_type),
            vendor_customer_id: customer_id.clone(),
            mode: Some(self.mode),
            message: req.message.clone(),
            donor_id: Some(donor.id),
            campaign_id: Some(campaign.id),
            ..Default::default()
        };
        let tx_id = self.transactions().insert(&tx).await?;

        let mut metadata = json!({
            "transaction_id": tx_id,
            "campaign_id": campaign.id,
        });
        if req.recurring {
            metadata["frequency"] = json!(default_frequency(&req.frequency));
            metadata["years"] = json!(req.years);
        }
        let description = campaign
            .title
            .clone()
            .unwrap_or_else(|| format!("Donation {}", tx_id));
        let payment = self
            .vendor
            .create_payment(CreatePayment {
                amount: Amount::new(req.value, &currency),
                description,
                redirect_url: req.return_url.clone(),
                webhook_url: self.webhook_url(),
                customer_id,
                sequence_type: if req.recurring {
                    VendorSequence::First
                } else {
                    VendorSequence::Oneoff
                },
                metadata,
            })
            .await;
        let payment = match payment {
            Ok(p) => p,
            Err(e) => {
                // the open transaction stays behind as an observable orphan
                warn!(
                    error = e.to_string(),
                    transaction_id = tx_id,
                    "vendor refused payment creation"
                );
                return Err(e.into());
            }
        };

        if let Some(method) = payment.method.clone() {
            let mut changes = Row::new();
            changes.insert("method".to_owned(), json!(method));
            self.transactions().patch(tx_id, &changes).await?;
        }

        let url = payment
            .checkout_url
            .clone()
            .ok_or(Error::Str("vendor returned no checkout url"))?;
        info!(transaction_id = tx_id, "donation submitted");
        Ok(SubmissionResponse {
            url,
            transaction_id: tx_id,
        })
    }

    fn check_submission(&self, req: &SubmissionRequest) -> Result<()> {
        // bot heuristics first, a generic refusal leaks nothing
        let elapsed = now().saturating_sub(req.form_rendered_at);
        if !req.website.is_empty() || elapsed < self.min_elapsed_secs {
            return Err(Error::InvalidRequest("invalid submission".to_owned()));
        }
        if req.value <= 0.0 || req.email.is_empty() || req.currency.is_empty() {
            return Err(Error::InvalidRequest("invalid submission".to_owned()));
        }
        Ok(())
    }

    async fn resolve_donor(&self, req: &SubmissionRequest) -> Result<donor::Model> {
        if let Some(existing) = self.get_donor_by_email(&req.email).await? {
            if existing.customer_id.is_none() {
                let customer = self.vendor.create_customer(&req.name, &req.email).await?;
                let mut changes = Row::new();
                changes.insert("customer_id".to_owned(), json!(customer.id));
                self.donors().patch(existing.id, &changes).await?;
                return Ok(donor::Model {
                    customer_id: Some(customer.id),
                    ..existing
                });
            }
            return Ok(existing);
        }
        let customer = self.vendor.create_customer(&req.name, &req.email).await?;
        let model = donor::Model {
            email: Some(req.email.clone()),
            name: Some(req.name.clone()),
            business_name: req.business_name.clone(),
            street: req.street.clone(),
            postcode: req.postcode.clone(),
            city: req.city.clone(),
            country: Some(country::normalize_or_empty(
                req.country.as_deref().unwrap_or_default(),
            )),
            customer_id: Some(customer.id),
            mode: Some(self.mode),
            ..Default::default()
        };
        let id = self.donors().insert(&model).await?;
        Ok(donor::Model { id, ..model })
    }

    /// Reconcile a vendor webhook ping. The payment is always re-fetched
    /// from the vendor, the ping body is never trusted.
    pub async fn handle_webhook(&self, vendor_payment_id: &str) -> Result<WebhookOutcome> {
        let payment = match self.vendor.get_payment(vendor_payment_id).await {
            Ok(p) => p,
            Err(payment_client::Error::PaymentNotFound) => {
                info!(vendor_payment_id, "webhook for unknown vendor payment");
                return Ok(WebhookOutcome::Ignored);
            }
            Err(e) => return Err(e.into()),
        };

        if payment.sequence_type == VendorSequence::Recurring {
            return self.reconcile_recurring(&payment).await;
        }

        let Some(tx) = self.resolve_transaction(&payment).await? else {
            info!(vendor_payment_id, "webhook for unknown transaction");
            return Ok(WebhookOutcome::Ignored);
        };

        if tx.vendor_payment_id.as_deref() == Some(payment.id.as_str()) {
            // already reconciled; a refund on a paid row is the only
            // mutation allowed through
            if payment.has_refunds() && tx.status == Some(transaction::Status::Paid) {
                self.annotate_refund(tx.id, &payment).await?;
                return Ok(WebhookOutcome::Processed);
            }
            return Ok(WebhookOutcome::Duplicate);
        }

        let Some(status) = map_status(payment.status) else {
            // vendor-side pending, nothing to apply yet
            return Ok(WebhookOutcome::Processed);
        };

        // decisive write: only an open row that has not been claimed by
        // another delivery may transition; the fetched payment is
        // authoritative for the amount and mode as well
        let mode = payment
            .mode
            .as_deref()
            .and_then(|m| Mode::try_from_value(&m.to_owned()).ok())
            .unwrap_or(self.mode);
        let res = transaction::Entity::update_many()
            .set(transaction::ActiveModel {
                status: Set(Some(status)),
                value: Set(Some(payment.amount.as_f64())),
                currency: Set(Some(payment.amount.currency.clone())),
                mode: Set(Some(mode)),
                vendor_payment_id: Set(Some(payment.id.clone())),
                vendor_customer_id: Set(payment.customer_id.clone()),
                method: Set(payment.method.clone()),
                ..Default::default()
            })
            .filter(transaction::Column::Id.eq(tx.id))
            .filter(transaction::Column::Status.eq(transaction::Status::Open))
            .filter(transaction::Column::VendorPaymentId.is_null())
            .exec(self.db())
            .await?;
        if res.rows_affected != 1 {
            return Ok(WebhookOutcome::Duplicate);
        }
        info!(
            transaction_id = tx.id,
            vendor_payment_id, status = ?status, "transaction reconciled"
        );

        if status == transaction::Status::Paid {
            if payment.has_refunds() {
                self.annotate_refund(tx.id, &payment).await?;
            }
            if payment.sequence_type == VendorSequence::First {
                self.start_subscription(&tx, &payment).await?;
            }
        }
        Ok(WebhookOutcome::Processed)
    }

    async fn resolve_transaction(&self, payment: &Payment) -> Result<Option<transaction::Model>> {
        if let Some(id) = payment
            .metadata
            .as_ref()
            .and_then(|m| m.get("transaction_id"))
            .and_then(|v| v.as_i64())
        {
            if let Some(tx) = self.transactions().get(id as i32).await? {
                return Ok(Some(tx));
            }
        }
        let mut criteria = Row::new();
        criteria.insert("vendor_payment_id".to_owned(), json!(payment.id));
        self.transactions().find_one_by(&criteria).await
    }

    async fn annotate_refund(&self, tx_id: i32, payment: &Payment) -> Result<()> {
        let refunded = payment
            .amount_refunded
            .as_ref()
            .map(|a| a.as_f64())
            .unwrap_or_default();
        let remaining = payment
            .amount_remaining
            .as_ref()
            .map(|a| a.as_f64())
            .unwrap_or_else(|| payment.amount.as_f64() - refunded);
        let summary = RefundSummary {
            refunded,
            remaining,
        };
        let mut changes = Row::new();
        changes.insert(
            "refund".to_owned(),
            json!(serde_json::to_string(&summary)?),
        );
        self.transactions().patch(tx_id, &changes).await?;
        info!(transaction_id = tx_id, refunded, "refund recorded");
        Ok(())
    }

    /// First paid charge of a recurring series: create the vendor
    /// subscription and mirror it locally.
    async fn start_subscription(&self, tx: &transaction::Model, payment: &Payment) -> Result<()> {
        let Some(customer_id) = payment
            .customer_id
            .clone()
            .or_else(|| tx.vendor_customer_id.clone())
        else {
            warn!(transaction_id = tx.id, "first payment without a customer");
            return Ok(());
        };
        let has_mandate =
            payment.mandate_id.is_some() || self.vendor.has_valid_mandate(&customer_id).await?;
        if !has_mandate {
            warn!(transaction_id = tx.id, "first payment without a mandate");
            return Ok(());
        }

        let metadata = payment.metadata.clone().unwrap_or_default();
        let frequency = metadata
            .get("frequency")
            .and_then(|v| v.as_str())
            .unwrap_or("1 month")
            .to_owned();
        let years = metadata
            .get("years")
            .and_then(|v| v.as_u64())
            .unwrap_or_default() as u32;
        let times = recurring_times(&frequency, years);

        let value = tx.value.unwrap_or_else(|| payment.amount.as_f64());
        let currency = tx
            .currency
            .clone()
            .unwrap_or_else(|| payment.amount.currency.clone());
        let remote = self
            .vendor
            .create_subscription(CreateSubscription {
                customer_id,
                amount: Amount::new(value, &currency),
                interval: frequency.clone(),
                times,
                description: tx
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Subscription for donation {}", tx.id)),
                webhook_url: Some(self.webhook_url()),
                metadata: json!({ "campaign_id": tx.campaign_id }),
            })
            .await?;

        let sub = subscription::Model {
            value: Some(value),
            currency: Some(currency),
            frequency: Some(frequency),
            times: Some(times.unwrap_or(0) as i32),
            status: Some(subscription::Status::Active),
            vendor_subscription_id: Some(remote.id.clone()),
            transaction_id: Some(tx.id),
            donor_id: tx.donor_id,
            campaign_id: tx.campaign_id,
            ..Default::default()
        };
        let sub_id = self.subscriptions().insert(&sub).await?;

        let mut changes = Row::new();
        changes.insert("subscription_id".to_owned(), json!(sub_id));
        self.transactions().patch(tx.id, &changes).await?;
        info!(
            transaction_id = tx.id,
            subscription_id = sub_id,
            vendor_subscription_id = remote.id,
            "subscription started"
        );
        Ok(())
    }

    /// A recurring charge arrives with no local transaction; record a new
    /// one under the subscription it belongs to.
    async fn reconcile_recurring(&self, payment: &Payment) -> Result<WebhookOutcome> {
        let Some(vendor_sub_id) = payment.subscription_id.clone() else {
            return Ok(WebhookOutcome::Ignored);
        };
        let mut criteria = Row::new();
        criteria.insert("vendor_subscription_id".to_owned(), json!(vendor_sub_id));
        let Some(sub) = self.subscriptions().find_one_by(&criteria).await? else {
            info!(
                vendor_subscription_id = vendor_sub_id,
                "recurring charge for unknown subscription"
            );
            return Ok(WebhookOutcome::Ignored);
        };

        // the vendor may ping repeatedly for the same charge
        let mut dup = Row::new();
        dup.insert("vendor_payment_id".to_owned(), json!(payment.id));
        if self.transactions().find_one_by(&dup).await?.is_some() {
            return Ok(WebhookOutcome::Duplicate);
        }

        // campaign resolved through the originating transaction when the
        // subscription row does not carry it
        let campaign_id = match sub.campaign_id {
            Some(id) => Some(id),
            None => match sub.transaction_id {
                Some(tx_id) => self
                    .transactions()
                    .get(tx_id)
                    .await?
                    .and_then(|t| t.campaign_id),
                None => None,
            },
        };

        let status = map_status(payment.status).unwrap_or(transaction::Status::Open);
        let tx = transaction::Model {
            value: Some(payment.amount.as_f64()),
            currency: Some(payment.amount.currency.clone()),
            status: Some(status),
            sequence_type: Some(transaction::SequenceType::Recurring),
            vendor_payment_id: Some(payment.id.clone()),
            vendor_customer_id: payment.customer_id.clone(),
            method: payment.method.clone(),
            mode: Some(self.mode),
            donor_id: sub.donor_id,
            campaign_id,
            subscription_id: Some(sub.id),
            ..Default::default()
        };
        let tx_id = self.transactions().insert(&tx).await?;
        info!(
            transaction_id = tx_id,
            subscription_id = sub.id,
            "recurring charge recorded"
        );
        Ok(WebhookOutcome::Processed)
    }

    /// Cancel an active subscription, remote first.
    pub async fn cancel_subscription(&self, id: i32) -> Result<()> {
        let sub = self
            .subscriptions()
            .get(id)
            .await?
            .ok_or(Error::NotFound("subscription"))?;
        if sub.status != Some(subscription::Status::Active) {
            return Err(Error::InvalidState(
                "only active subscriptions can be cancelled".to_owned(),
            ));
        }
        let vendor_sub_id = sub
            .vendor_subscription_id
            .clone()
            .ok_or(Error::InvalidState(
                "subscription has no vendor id".to_owned(),
            ))?;
        let donor = match sub.donor_id {
            Some(donor_id) => self.donors().get(donor_id).await?,
            None => None,
        };
        let customer_id = donor
            .and_then(|d| d.customer_id)
            .ok_or(Error::InvalidState("subscription has no customer".to_owned()))?;

        self.vendor
            .cancel_subscription(&customer_id, &vendor_sub_id)
            .await?;

        let mut changes = Row::new();
        changes.insert(
            "status".to_owned(),
            json!(subscription::Status::Cancelled.to_value()),
        );
        self.subscriptions().patch(id, &changes).await?;
        info!(subscription_id = id, "subscription cancelled");
        Ok(())
    }

    /// Ask the vendor to refund a paid transaction in full. The refund is
    /// recorded when the vendor confirms it through the webhook.
    pub async fn refund_transaction(&self, id: i32) -> Result<()> {
        let tx = self
            .transactions()
            .get(id)
            .await?
            .ok_or(Error::NotFound("transaction"))?;
        if tx.status != Some(transaction::Status::Paid) {
            return Err(Error::InvalidState(
                "only paid transactions can be refunded".to_owned(),
            ));
        }
        let vendor_payment_id = tx.vendor_payment_id.clone().ok_or(Error::InvalidState(
            "transaction has no vendor payment".to_owned(),
        ))?;
        let value = tx
            .value
            .ok_or(Error::InvalidState("transaction has no value".to_owned()))?;
        let currency = tx.currency.clone().unwrap_or_else(|| "EUR".to_owned());
        self.vendor
            .refund_payment(
                &vendor_payment_id,
                Amount::new(value, &currency),
                tx.title.clone().unwrap_or_else(|| format!("Refund {}", id)),
            )
            .await?;

        // pending summary, overwritten with vendor amounts once the
        // confirming webhook arrives
        let summary = RefundSummary {
            refunded: value,
            remaining: 0.0,
        };
        let mut changes = Row::new();
        changes.insert(
            "refund".to_owned(),
            json!(serde_json::to_string(&summary)?),
        );
        self.transactions().patch(id, &changes).await?;
        info!(transaction_id = id, "refund requested");
        Ok(())
    }

    /// Sum of paid donations for a campaign, reduced by recorded refunds.
    pub async fn campaign_total(&self, campaign_id: i32) -> Result<f64> {
        let mut criteria = Row::new();
        criteria.insert("campaign_id".to_owned(), json!(campaign_id));
        criteria.insert(
            "status".to_owned(),
            json!(transaction::Status::Paid.to_value()),
        );
        let paid = self.transactions().find_by(&criteria).await?;
        Ok(paid.iter().map(|t| t.net_value()).sum())
    }
}

fn mode_value(mode: Mode) -> String {
    mode.to_value()
}

fn default_frequency(frequency: &str) -> &str {
    if frequency.is_empty() {
        "1 month"
    } else {
        frequency
    }
}

/// Charges per year for an interval string like "1 month" or "3 months".
fn per_year(frequency: &str) -> u32 {
    let mut parts = frequency.split_whitespace();
    let n: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let unit = parts.next().unwrap_or("month");
    let n = n.max(1);
    if unit.starts_with("year") {
        1
    } else if unit.starts_with("week") {
        52 / n
    } else {
        12 / n.min(12)
    }
}

/// Total charge count for a bounded series. The first payment already
/// happened, so one charge is subtracted. None = until cancelled.
fn recurring_times(frequency: &str, years: u32) -> Option<u32> {
    if years == 0 {
        return None;
    }
    Some((years * per_year(frequency)).saturating_sub(1).max(1))
}

fn map_status(status: PaymentStatus) -> Option<transaction::Status> {
    match status {
        PaymentStatus::Paid => Some(transaction::Status::Paid),
        PaymentStatus::Failed => Some(transaction::Status::Failed),
        PaymentStatus::Canceled => Some(transaction::Status::Canceled),
        PaymentStatus::Expired => Some(transaction::Status::Expired),
        PaymentStatus::Open | PaymentStatus::Pending | PaymentStatus::Authorized => None,
    }
}

fn check_amount(campaign: &campaign::Model, value: f64) -> Result<()> {
    if let Some(min) = campaign.minimum_donation {
        if value < min {
            return Err(Error::InvalidRequest("invalid submission".to_owned()));
        }
    }
    if let Some(max) = campaign.maximum_donation {
        if max > 0.0 && value > max {
            return Err(Error::InvalidRequest("invalid submission".to_owned()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn times_from_frequency() {
        assert_eq!(recurring_times("1 month", 1), Some(11));
        assert_eq!(recurring_times("3 months", 2), Some(7));
        assert_eq!(recurring_times("1 year", 3), Some(2));
        assert_eq!(recurring_times("1 month", 0), None);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            map_status(PaymentStatus::Paid),
            Some(transaction::Status::Paid)
        );
        assert_eq!(
            map_status(PaymentStatus::Expired),
            Some(transaction::Status::Expired)
        );
        assert_eq!(map_status(PaymentStatus::Pending), None);
    }
}
