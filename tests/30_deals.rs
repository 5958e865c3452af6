mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{error_code, expect_status, parse_id, spawn_server, stage_id, Account, TestServer};
use crm_api::database::models::{NewPipeline, Stage, StageList};

async fn deal_fixture(server: &TestServer, account: &Account) -> Result<(Value, Value)> {
    let customer = server.create_customer(account, "Buyer").await?;
    let pipeline = server.default_pipeline(account).await?;
    Ok((customer, pipeline))
}

#[tokio::test]
async fn create_takes_probability_from_stage() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.register("owner@acme.test", "Acme").await?;
    let (customer, pipeline) = deal_fixture(&server, &admin).await?;

    let deal = server
        .create(
            &admin,
            "/api/deals",
            json!({
                "customerId": customer["id"],
                "pipelineId": pipeline["id"],
                "stageId": stage_id(&pipeline, "Proposal")?,
                "title": "Enterprise plan",
                "value": "12500.50",
                "products": [{ "name": "Seats", "quantity": 50, "unitPrice": "250.01" }],
            }),
        )
        .await?;

    assert_eq!(deal["probability"], json!(50));
    assert_eq!(deal["currency"], json!("USD"));
    assert_eq!(deal["value"], json!("12500.50"));
    assert_eq!(deal["products"][0]["quantity"], json!(50));
    assert_eq!(deal["createdBy"], json!(admin.user_id.to_string()));

    let explicit = server
        .create(
            &admin,
            "/api/deals",
            json!({
                "customerId": customer["id"],
                "pipelineId": pipeline["id"],
                "stageId": stage_id(&pipeline, "Lead")?,
                "title": "Hopeful",
                "probability": 140,
            }),
        )
        .await?;
    assert_eq!(explicit["probability"], json!(100));
    Ok(())
}

#[tokio::test]
async fn unknown_stage_is_rejected() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.register("owner@acme.test", "Acme").await?;
    let (customer, pipeline) = deal_fixture(&server, &admin).await?;

    let res = server
        .post(
            &admin,
            "/api/deals",
            json!({
                "customerId": customer["id"],
                "pipelineId": pipeline["id"],
                "stageId": "won-ish",
                "title": "Nope",
            }),
        )
        .await?;
    let body = expect_status(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
    assert!(body["error"]["details"]["stageId"].is_string(), "{}", body);
    Ok(())
}

#[tokio::test]
async fn negative_value_fails_validation() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.register("owner@acme.test", "Acme").await?;
    let (customer, pipeline) = deal_fixture(&server, &admin).await?;

    let res = server
        .post(
            &admin,
            "/api/deals",
            json!({
                "customerId": customer["id"],
                "pipelineId": pipeline["id"],
                "stageId": stage_id(&pipeline, "Lead")?,
                "title": "Refund",
                "value": "-1",
                "products": [{ "name": "Credit", "quantity": 1, "unitPrice": "-20" }],
            }),
        )
        .await?;
    let body = expect_status(res, StatusCode::BAD_REQUEST).await?;
    let details = &body["error"]["details"];
    assert!(details["value"].is_string(), "{}", body);
    assert!(details["products[0].unitPrice"].is_string(), "{}", body);
    Ok(())
}

#[tokio::test]
async fn moving_stages_is_checked_against_the_target_pipeline() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.register("owner@acme.test", "Acme").await?;
    let (customer, pipeline) = deal_fixture(&server, &admin).await?;

    let renewals = server
        .store()
        .add_pipeline(
            admin.organization_id,
            NewPipeline {
                name: "Renewals".to_string(),
                stages: StageList::new(vec![
                    Stage::new("due", "Due", 1, 30),
                    Stage::new("renewed", "Renewed", 2, 100),
                ])?,
                is_default: false,
            },
        )
        .await;

    let deal = server
        .create(
            &admin,
            "/api/deals",
            json!({
                "customerId": customer["id"],
                "pipelineId": pipeline["id"],
                "stageId": stage_id(&pipeline, "Negotiation")?,
                "title": "Annual contract",
            }),
        )
        .await?;
    let path = format!("/api/deals/{}", parse_id(&deal["id"])?);

    // The deal's current stage does not exist in the renewals pipeline.
    let res = server.put(&admin, &path, json!({ "pipelineId": renewals.id })).await?;
    expect_status(res, StatusCode::BAD_REQUEST).await?;

    let res = server
        .put(&admin, &path, json!({ "pipelineId": renewals.id, "stageId": "renewed" }))
        .await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["data"]["pipelineId"], json!(renewals.id.to_string()));
    assert_eq!(body["data"]["stageId"], json!("renewed"));

    let res = server
        .put(&admin, &path, json!({ "stageId": stage_id(&pipeline, "Closed Won")? }))
        .await?;
    expect_status(res, StatusCode::BAD_REQUEST).await?;
    Ok(())
}

#[tokio::test]
async fn update_clamps_probability_and_keeps_other_fields() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.register("owner@acme.test", "Acme").await?;
    let (customer, pipeline) = deal_fixture(&server, &admin).await?;

    let deal = server
        .create(
            &admin,
            "/api/deals",
            json!({
                "customerId": customer["id"],
                "pipelineId": pipeline["id"],
                "stageId": stage_id(&pipeline, "Qualified")?,
                "title": "Pilot",
                "notes": "call back in May",
            }),
        )
        .await?;
    let path = format!("/api/deals/{}", parse_id(&deal["id"])?);

    let res = server.put(&admin, &path, json!({ "probability": -5, "currency": "eur" })).await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["data"]["probability"], json!(0));
    assert_eq!(body["data"]["currency"], json!("EUR"));
    assert_eq!(body["data"]["notes"], json!("call back in May"));
    assert_eq!(body["data"]["stageId"], deal["stageId"]);
    Ok(())
}

#[tokio::test]
async fn list_filters_and_hard_delete() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.register("owner@acme.test", "Acme").await?;
    let (customer, pipeline) = deal_fixture(&server, &admin).await?;
    let other_customer = server.create_customer(&admin, "Second").await?;
    let lead = stage_id(&pipeline, "Lead")?;

    for (customer_id, stage) in [(&customer["id"], "Lead"), (&customer["id"], "Proposal"), (&other_customer["id"], "Lead")] {
        server
            .create(
                &admin,
                "/api/deals",
                json!({
                    "customerId": customer_id,
                    "pipelineId": pipeline["id"],
                    "stageId": stage_id(&pipeline, stage)?,
                    "title": format!("Deal at {}", stage),
                }),
            )
            .await?;
    }

    let res = server.get(&admin, &format!("/api/deals?stageId={}", lead)).await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let res = server
        .get(&admin, &format!("/api/deals?customerId={}", parse_id(&customer["id"])?))
        .await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let first = parse_id(&body["data"][0]["id"])?;
    let res = server.delete(&admin, &format!("/api/deals/{}", first)).await?;
    expect_status(res, StatusCode::OK).await?;

    let res = server.get(&admin, &format!("/api/deals/{}", first)).await?;
    expect_status(res, StatusCode::NOT_FOUND).await?;

    let res = server.get(&admin, "/api/deals").await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn pipelines_list_default_first_and_default_lookup_prefers_newest() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.register("owner@acme.test", "Acme").await?;
    let original = server.default_pipeline(&admin).await?;

    server
        .store()
        .add_pipeline(
            admin.organization_id,
            NewPipeline {
                name: "Partners".to_string(),
                stages: StageList::default_stages(),
                is_default: false,
            },
        )
        .await;

    let res = server.get(&admin, "/api/pipelines").await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["data"][0]["id"], original["id"]);
    assert_eq!(body["data"][1]["name"], json!("Partners"));

    let newer = server
        .store()
        .add_pipeline(
            admin.organization_id,
            NewPipeline {
                name: "New Default".to_string(),
                stages: StageList::default_stages(),
                is_default: true,
            },
        )
        .await;
    let current = server.default_pipeline(&admin).await?;
    assert_eq!(current["id"], json!(newer.id.to_string()));

    let res = server
        .get(&admin, &format!("/api/pipelines/{}", parse_id(&original["id"])?))
        .await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["data"]["name"], json!("Sales Pipeline"));
    Ok(())
}

#[tokio::test]
async fn scenario_stage_from_another_organization_is_rejected() -> Result<()> {
    let server = spawn_server().await?;
    let acme = server.register("owner@acme.test", "Acme").await?;
    let globex = server.register("owner@globex.test", "Globex").await?;

    let (access, _) = server.login("owner@acme.test", common::PASSWORD).await?;
    assert!(!access.is_empty());

    let customer = server
        .create(
            &acme,
            "/api/customers",
            json!({ "firstName": "John", "lastName": "Doe", "email": "john@x.com" }),
        )
        .await?;
    let pipeline = server.default_pipeline(&acme).await?;
    let deal = server
        .create(
            &acme,
            "/api/deals",
            json!({
                "customerId": customer["id"],
                "pipelineId": pipeline["id"],
                "stageId": stage_id(&pipeline, "Qualified")?,
                "title": "Widgets",
                "value": 5000,
            }),
        )
        .await?;
    assert_eq!(deal["value"], json!("5000"));
    let path = format!("/api/deals/{}", parse_id(&deal["id"])?);

    // Same stage name in Globex's default pipeline, but its own id.
    let globex_pipeline = server.default_pipeline(&globex).await?;
    let foreign = stage_id(&globex_pipeline, "Proposal")?;
    assert_ne!(foreign, stage_id(&pipeline, "Proposal")?);

    let res = server.put(&acme, &path, json!({ "stageId": foreign })).await?;
    let body = expect_status(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
    assert!(body["error"]["details"]["stageId"].is_string(), "{}", body);

    // No write happened.
    let res = server.get(&acme, &path).await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["data"]["stageId"], deal["stageId"]);
    assert_eq!(body["data"]["updatedAt"], deal["updatedAt"]);
    Ok(())
}
