// RUST_TEST_THREADS=1 cargo test --test api -- --nocapture

use actix_web::{test, web};
use anyhow::Result;
use entity::transaction;
use givebox::{create_web_app, setting::Setting, AppState, Repository};
use payment_client::vendor::PaymentStatus;
use serde_json::json;

mod util;
use util::*;

async fn create_state(vendor: FakeVendor) -> Result<AppState> {
    let service = create_service(vendor).await?;
    Ok(AppState {
        service,
        setting: Setting::default(),
    })
}

#[actix_rt::test]
async fn info() -> Result<()> {
    let state = create_state(FakeVendor::default()).await?;
    let app = test::init_service(create_web_app(web::Data::new(state))).await;

    let res = test::call_service(&app, get("/v1/info").to_request()).await;
    assert!(res.status().is_success());
    let val = json(res).await;
    assert_eq!(val["mode"], "test");
    Ok(())
}

#[actix_rt::test]
async fn submission_and_webhook_flow() -> Result<()> {
    let vendor = FakeVendor::default();
    let state = create_state(vendor.clone()).await?;
    let campaign_id = seed_campaign(&state.service).await?;
    let conn = state.service.db().clone();
    let app = test::init_service(create_web_app(web::Data::new(state))).await;

    let res = test::call_service(
        &app,
        post(
            "/v1/payments",
            json!({
                "value": 10.0,
                "currency": "EUR",
                "email": "donor@example.org",
                "name": "Jan Jansen",
                "campaign_id": campaign_id,
                "return_url": "https://donate.example.org/thanks",
                "form_rendered_at": givebox::now() - 100,
            }),
        )
        .to_request(),
    )
    .await;
    assert!(res.status().is_success());
    let val = json(res).await;
    assert_eq!(val["success"], true);
    assert!(val["url"]
        .as_str()
        .unwrap()
        .starts_with("https://checkout.test/"));
    let tx_id = val["transaction_id"].as_i64().unwrap() as i32;

    let payment_id = vendor.last_payment_id().unwrap();
    vendor.set_status(&payment_id, PaymentStatus::Paid);
    let res = test::call_service(
        &app,
        post_form("/v1/webhook", [("id", payment_id.clone())]).to_request(),
    )
    .await;
    assert!(res.status().is_success());

    let repo: Repository<transaction::Entity> = Repository::new(conn);
    let tx = repo.get(tx_id).await?.unwrap();
    assert_eq!(tx.status, Some(transaction::Status::Paid));
    assert_eq!(tx.vendor_payment_id, Some(payment_id));
    Ok(())
}

#[actix_rt::test]
async fn submission_failure_is_generic() -> Result<()> {
    let state = create_state(FakeVendor::default()).await?;
    let campaign_id = seed_campaign(&state.service).await?;
    let app = test::init_service(create_web_app(web::Data::new(state))).await;

    let res = test::call_service(
        &app,
        post(
            "/v1/payments",
            json!({
                "value": 0.0,
                "currency": "EUR",
                "email": "donor@example.org",
                "campaign_id": campaign_id,
                "form_rendered_at": givebox::now() - 100,
            }),
        )
        .to_request(),
    )
    .await;
    assert!(res.status().is_success());
    let val = json(res).await;
    assert_eq!(val["success"], false);
    assert_eq!(val["message"], "The donation could not be processed");
    Ok(())
}

#[actix_rt::test]
async fn webhook_unknown_payment_returns_ok() -> Result<()> {
    let state = create_state(FakeVendor::default()).await?;
    let conn = state.service.db().clone();
    let app = test::init_service(create_web_app(web::Data::new(state))).await;

    let res = test::call_service(
        &app,
        post_form("/v1/webhook", [("id", "tr_none")]).to_request(),
    )
    .await;
    assert!(res.status().is_success());

    let repo: Repository<transaction::Entity> = Repository::new(conn);
    assert_eq!(repo.count(&entity::schema::Row::new()).await?, 0);
    Ok(())
}

#[actix_rt::test]
async fn cancel_unknown_subscription_is_404() -> Result<()> {
    let state = create_state(FakeVendor::default()).await?;
    let app = test::init_service(create_web_app(web::Data::new(state))).await;

    let res = test::call_service(
        &app,
        post("/v1/subscriptions/42/cancel", json!({})).to_request(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 404);
    let val = json(res).await;
    assert_eq!(val["error"], true);
    Ok(())
}

#[actix_rt::test]
async fn campaign_total_endpoint() -> Result<()> {
    let state = create_state(FakeVendor::default()).await?;
    let campaign_id = seed_campaign(&state.service).await?;
    let transactions = state.service.transactions();
    for (value, status) in [
        (20.0, transaction::Status::Paid),
        (5.0, transaction::Status::Open),
        (15.0, transaction::Status::Paid),
    ] {
        transactions
            .insert(&transaction::Model {
                value: Some(value),
                status: Some(status),
                campaign_id: Some(campaign_id),
                ..Default::default()
            })
            .await?;
    }
    let app = test::init_service(create_web_app(web::Data::new(state))).await;

    let res = test::call_service(
        &app,
        get(&format!("/v1/campaigns/{}/total", campaign_id)).to_request(),
    )
    .await;
    assert!(res.status().is_success());
    let val = json(res).await;
    assert_eq!(val["total"], 35.0);
    Ok(())
}

#[actix_rt::test]
async fn methods_endpoint() -> Result<()> {
    let state = create_state(FakeVendor::default()).await?;
    let app = test::init_service(create_web_app(web::Data::new(state))).await;

    let res = test::call_service(&app, get("/v1/methods").to_request()).await;
    assert!(res.status().is_success());
    let val = json(res).await;
    assert_eq!(val["methods"][0]["id"], "ideal");
    Ok(())
}
