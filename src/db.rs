use sqlx::{postgres::PgPoolOptions, PgPool};

/// Idempotent bootstrap DDL, applied on every start.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS leads (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        surname VARCHAR(255) NOT NULL,
        patronymic VARCHAR(255),
        business_info TEXT,
        budget VARCHAR(255),
        contact_method VARCHAR(255),
        comments TEXT,
        niche VARCHAR(255),
        company_size VARCHAR(255),
        task_volume VARCHAR(255),
        role VARCHAR(100),
        business_size VARCHAR(255),
        need_volume VARCHAR(255),
        deadline VARCHAR(255),
        task_type VARCHAR(255),
        product_interest VARCHAR(255),
        preferred_contact_method VARCHAR(255),
        convenient_time VARCHAR(255),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    // Tables created before the services catalog existed lack this column
    "ALTER TABLE leads ADD COLUMN IF NOT EXISTS service VARCHAR(255)",
    r#"
    CREATE TABLE IF NOT EXISTS lead_metrics (
        id INTEGER PRIMARY KEY REFERENCES leads(id) ON DELETE CASCADE,
        time_on_page_seconds VARCHAR(50),
        buttons_clicked TEXT,
        cursor_hover_data TEXT,
        return_count INTEGER NOT NULL DEFAULT 0,
        raw_metrics TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    async fn ensure_schema(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema is up to date");
        Ok(())
    }
}
