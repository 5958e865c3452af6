mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{expect_status, parse_id, spawn_server, stage_id};

#[tokio::test]
async fn records_of_other_organizations_are_not_found() -> Result<()> {
    let server = spawn_server().await?;
    let acme = server.register("owner@acme.test", "Acme").await?;
    let globex = server.register("owner@globex.test", "Globex").await?;

    let customer = server.create_customer(&acme, "Private").await?;
    let pipeline = server.default_pipeline(&acme).await?;
    let deal = server
        .create(
            &acme,
            "/api/deals",
            json!({
                "customerId": customer["id"],
                "pipelineId": pipeline["id"],
                "stageId": stage_id(&pipeline, "Lead")?,
                "title": "Secret deal",
            }),
        )
        .await?;
    let task = server
        .create(&acme, "/api/tasks", json!({ "title": "Secret task", "customerId": customer["id"] }))
        .await?;
    let entry = server
        .create(
            &acme,
            "/api/contact-history",
            json!({ "customerId": customer["id"], "type": "NOTE", "content": "secret" }),
        )
        .await?;

    let paths = [
        format!("/api/customers/{}", parse_id(&customer["id"])?),
        format!("/api/deals/{}", parse_id(&deal["id"])?),
        format!("/api/pipelines/{}", parse_id(&pipeline["id"])?),
        format!("/api/tasks/{}", parse_id(&task["id"])?),
        format!("/api/contact-history/{}", parse_id(&entry["id"])?),
    ];

    for path in &paths {
        let res = server.get(&globex, path).await?;
        expect_status(res, StatusCode::NOT_FOUND).await?;
    }
    for path in paths.iter().filter(|p| !p.starts_with("/api/pipelines")) {
        let res = server.put(&globex, path, json!({ "title": "hijacked" })).await?;
        expect_status(res, StatusCode::NOT_FOUND).await?;
        let res = server.delete(&globex, path).await?;
        expect_status(res, StatusCode::NOT_FOUND).await?;
    }

    // Everything is still intact for the owner.
    for path in &paths {
        let res = server.get(&acme, path).await?;
        expect_status(res, StatusCode::OK).await?;
    }
    Ok(())
}

#[tokio::test]
async fn lists_only_show_the_callers_organization() -> Result<()> {
    let server = spawn_server().await?;
    let acme = server.register("owner@acme.test", "Acme").await?;
    let globex = server.register("owner@globex.test", "Globex").await?;

    let customer = server.create_customer(&acme, "Private").await?;
    server
        .create(&acme, "/api/tasks", json!({ "title": "Acme task" }))
        .await?;
    server
        .create(
            &acme,
            "/api/contact-history",
            json!({ "customerId": customer["id"], "type": "CALL", "content": "hello" }),
        )
        .await?;

    for path in ["/api/customers", "/api/deals", "/api/tasks", "/api/contact-history"] {
        let res = server.get(&globex, path).await?;
        let body = expect_status(res, StatusCode::OK).await?;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(0), "{} leaked: {}", path, body);
    }

    let res = server.get(&globex, "/api/pipelines").await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_ne!(body["data"][0]["organizationId"], json!(acme.organization_id.to_string()));
    Ok(())
}

#[tokio::test]
async fn cross_organization_references_are_rejected() -> Result<()> {
    let server = spawn_server().await?;
    let acme = server.register("owner@acme.test", "Acme").await?;
    let globex = server.register("owner@globex.test", "Globex").await?;

    let acme_customer = server.create_customer(&acme, "Mine").await?;
    let globex_pipeline = server.default_pipeline(&globex).await?;

    let res = server
        .post(
            &acme,
            "/api/deals",
            json!({
                "customerId": acme_customer["id"],
                "pipelineId": globex_pipeline["id"],
                "stageId": stage_id(&globex_pipeline, "Lead")?,
                "title": "Wrong pipeline",
            }),
        )
        .await?;
    expect_status(res, StatusCode::NOT_FOUND).await?;

    let res = server
        .post(
            &globex,
            "/api/contact-history",
            json!({ "customerId": acme_customer["id"], "type": "CALL", "content": "sneaky" }),
        )
        .await?;
    expect_status(res, StatusCode::NOT_FOUND).await?;

    let res = server
        .get(&globex, &format!("/api/contact-history?customerId={}", parse_id(&acme_customer["id"])?))
        .await?;
    expect_status(res, StatusCode::NOT_FOUND).await?;
    Ok(())
}
