use std::env;

use lead_intake_api::db::Database;
use lead_intake_api::db_storage::{LeadMetricsStorage, LeadStorage};
use lead_intake_api::models::{
    CreateLeadMetricsRequest, CreateLeadRequest, UpdateLeadMetricsRequest, UpdateLeadRequest,
};
use lead_intake_api::scoring::{score_lead, LeadRecord, Temperature};

async fn connect() -> anyhow::Result<Database> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;
    Database::new(&db_url).await
}

/// Round trip through the leads table and back into the scoring engine.
/// Marked ignored because it needs a disposable Postgres; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn lead_lifecycle_smoke_test() -> anyhow::Result<()> {
    let db = connect().await?;
    let leads = LeadStorage::new(db.pool.clone());

    let created = leads
        .create(&CreateLeadRequest {
            name: "Smoke".to_string(),
            surname: "Test".to_string(),
            deadline: Some("tomorrow".to_string()),
            budget: Some("2 million".to_string()),
            role: Some("CEO".to_string()),
            ..Default::default()
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert!(created.id > 0);

    let fetched = leads
        .get(created.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .expect("lead was just created");
    assert_eq!(fetched.role.as_deref(), Some("CEO"));

    // 25 + 25 + 15 + round(3 * 1.2)
    let scoring = score_lead(&LeadRecord::from(&fetched));
    assert_eq!(scoring.score, 69);
    assert_eq!(scoring.temperature, Temperature::Warm);

    let patch: UpdateLeadRequest =
        serde_json::from_str(r#"{"budget": null, "company_size": "холдинг"}"#)?;
    let updated = leads
        .update(created.id, patch)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .expect("lead exists");
    assert_eq!(updated.budget, None);
    assert_eq!(updated.company_size.as_deref(), Some("холдинг"));
    assert_eq!(updated.name, "Smoke");

    assert!(leads
        .delete(created.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?);
    assert!(leads
        .get(created.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .is_none());
    Ok(())
}

/// Metrics are keyed by lead id and go away with their lead.
#[tokio::test]
#[ignore]
async fn lead_metrics_cascade_smoke_test() -> anyhow::Result<()> {
    let db = connect().await?;
    let leads = LeadStorage::new(db.pool.clone());
    let metrics = LeadMetricsStorage::new(db.pool.clone());

    let lead = leads
        .create(&CreateLeadRequest {
            name: "Metrics".to_string(),
            surname: "Test".to_string(),
            ..Default::default()
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let created = metrics
        .create(
            lead.id,
            &CreateLeadMetricsRequest {
                time_on_page_seconds: Some("37".to_string()),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(created.id, lead.id);
    assert_eq!(created.return_count, 0);

    let duplicate = metrics
        .create(lead.id, &CreateLeadMetricsRequest::default())
        .await
        .expect_err("metrics are 1:1 with a lead");
    assert!(duplicate.is_unique_violation());

    let updated = metrics
        .update(
            lead.id,
            UpdateLeadMetricsRequest {
                return_count: Some(3),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .expect("metrics exist");
    assert_eq!(updated.return_count, 3);
    assert_eq!(updated.time_on_page_seconds.as_deref(), Some("37"));
    assert!(updated.updated_at >= created.updated_at);

    leads
        .delete(lead.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert!(metrics
        .get(lead.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .is_none());
    Ok(())
}
