use crate::errors::{AppError, ResultExt};
use crate::models::{
    CreateLeadMetricsRequest, CreateLeadRequest, Lead, LeadMetrics, UpdateLeadMetricsRequest,
    UpdateLeadRequest,
};
use sqlx::PgPool;

const LEAD_COLUMNS: &str = "id, name, surname, patronymic, business_info, budget, \
    contact_method, comments, niche, company_size, task_volume, role, business_size, \
    need_volume, deadline, task_type, product_interest, preferred_contact_method, \
    convenient_time, service, created_at";

const METRICS_COLUMNS: &str = "id, time_on_page_seconds, buttons_clicked, cursor_hover_data, \
    return_count, raw_metrics, created_at, updated_at";

/// CRUD over the `leads` table.
#[derive(Clone)]
pub struct LeadStorage {
    pool: PgPool,
}

impl LeadStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, lead: &CreateLeadRequest) -> Result<Lead, AppError> {
        let sql = format!(
            r#"
            INSERT INTO leads (
                name, surname, patronymic, business_info, budget, contact_method, comments,
                niche, company_size, task_volume, role, business_size, need_volume, deadline,
                task_type, product_interest, preferred_contact_method, convenient_time, service
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING {LEAD_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, Lead>(&sql)
            .bind(&lead.name)
            .bind(&lead.surname)
            .bind(&lead.patronymic)
            .bind(&lead.business_info)
            .bind(&lead.budget)
            .bind(&lead.contact_method)
            .bind(&lead.comments)
            .bind(&lead.niche)
            .bind(&lead.company_size)
            .bind(&lead.task_volume)
            .bind(&lead.role)
            .bind(&lead.business_size)
            .bind(&lead.need_volume)
            .bind(&lead.deadline)
            .bind(&lead.task_type)
            .bind(&lead.product_interest)
            .bind(&lead.preferred_contact_method)
            .bind(&lead.convenient_time)
            .bind(&lead.service)
            .fetch_one(&self.pool)
            .await
            .context("inserting lead")?;

        tracing::info!("Stored lead {}", created.id);
        Ok(created)
    }

    pub async fn get(&self, id: i32) -> Result<Option<Lead>, AppError> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1");
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lead)
    }

    /// Page through leads in insertion order.
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Lead>, AppError> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads ORDER BY id OFFSET $1 LIMIT $2");
        let leads = sqlx::query_as::<_, Lead>(&sql)
            .bind(skip)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("listing leads")?;
        Ok(leads)
    }

    /// Apply a partial update. Returns `None` when the lead does not exist.
    pub async fn update(
        &self,
        id: i32,
        patch: UpdateLeadRequest,
    ) -> Result<Option<Lead>, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1 FOR UPDATE");
        let Some(mut lead) = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        patch.apply_to(&mut lead);

        let sql = format!(
            r#"
            UPDATE leads SET
                name = $2, surname = $3, patronymic = $4, business_info = $5, budget = $6,
                contact_method = $7, comments = $8, niche = $9, company_size = $10,
                task_volume = $11, role = $12, business_size = $13, need_volume = $14,
                deadline = $15, task_type = $16, product_interest = $17,
                preferred_contact_method = $18, convenient_time = $19, service = $20
            WHERE id = $1
            RETURNING {LEAD_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, Lead>(&sql)
            .bind(lead.id)
            .bind(&lead.name)
            .bind(&lead.surname)
            .bind(&lead.patronymic)
            .bind(&lead.business_info)
            .bind(&lead.budget)
            .bind(&lead.contact_method)
            .bind(&lead.comments)
            .bind(&lead.niche)
            .bind(&lead.company_size)
            .bind(&lead.task_volume)
            .bind(&lead.role)
            .bind(&lead.business_size)
            .bind(&lead.need_volume)
            .bind(&lead.deadline)
            .bind(&lead.task_type)
            .bind(&lead.product_interest)
            .bind(&lead.preferred_contact_method)
            .bind(&lead.convenient_time)
            .bind(&lead.service)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("updating lead {}", id))?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Returns `false` when nothing was deleted.
    pub async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(&self, id: i32) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM leads WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

/// CRUD over the `lead_metrics` table, keyed by lead id.
#[derive(Clone)]
pub struct LeadMetricsStorage {
    pool: PgPool,
}

impl LeadMetricsStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        lead_id: i32,
        metrics: &CreateLeadMetricsRequest,
    ) -> Result<LeadMetrics, AppError> {
        let sql = format!(
            r#"
            INSERT INTO lead_metrics (
                id, time_on_page_seconds, buttons_clicked, cursor_hover_data, return_count, raw_metrics
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {METRICS_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, LeadMetrics>(&sql)
            .bind(lead_id)
            .bind(&metrics.time_on_page_seconds)
            .bind(&metrics.buttons_clicked)
            .bind(&metrics.cursor_hover_data)
            .bind(metrics.return_count)
            .bind(&metrics.raw_metrics)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("inserting metrics for lead {}", lead_id))?;
        Ok(created)
    }

    pub async fn get(&self, lead_id: i32) -> Result<Option<LeadMetrics>, AppError> {
        let sql = format!("SELECT {METRICS_COLUMNS} FROM lead_metrics WHERE id = $1");
        let metrics = sqlx::query_as::<_, LeadMetrics>(&sql)
            .bind(lead_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(metrics)
    }

    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<LeadMetrics>, AppError> {
        let sql =
            format!("SELECT {METRICS_COLUMNS} FROM lead_metrics ORDER BY id OFFSET $1 LIMIT $2");
        let metrics = sqlx::query_as::<_, LeadMetrics>(&sql)
            .bind(skip)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("listing lead metrics")?;
        Ok(metrics)
    }

    pub async fn update(
        &self,
        lead_id: i32,
        patch: UpdateLeadMetricsRequest,
    ) -> Result<Option<LeadMetrics>, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {METRICS_COLUMNS} FROM lead_metrics WHERE id = $1 FOR UPDATE");
        let Some(mut metrics) = sqlx::query_as::<_, LeadMetrics>(&sql)
            .bind(lead_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        patch.apply_to(&mut metrics);

        let sql = format!(
            r#"
            UPDATE lead_metrics SET
                time_on_page_seconds = $2, buttons_clicked = $3, cursor_hover_data = $4,
                return_count = $5, raw_metrics = $6, updated_at = now()
            WHERE id = $1
            RETURNING {METRICS_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, LeadMetrics>(&sql)
            .bind(lead_id)
            .bind(&metrics.time_on_page_seconds)
            .bind(&metrics.buttons_clicked)
            .bind(&metrics.cursor_hover_data)
            .bind(metrics.return_count)
            .bind(&metrics.raw_metrics)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("updating metrics for lead {}", lead_id))?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, lead_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM lead_metrics WHERE id = $1")
            .bind(lead_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
