//! `plans` table in PostgreSQL (or Greenplum). Every call opens its own
//! connection and drops it when the statement completes.

use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, warn};

use super::PlanRecord;
use crate::error::{PlanError, PlanResult};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS plans (
    id SERIAL PRIMARY KEY,
    ref VARCHAR(8) NOT NULL,
    plantext TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT now()
)";
const INSERT_PLAN: &str = "INSERT INTO plans(ref, plantext) VALUES ($1, $2) RETURNING id, ref, plantext, created_at";
const SELECT_BY_REF: &str = "SELECT id, ref, plantext, created_at FROM plans WHERE ref = $1";

pub struct PostgresBackend {
    dsn: String,
}

impl PostgresBackend {
    pub fn new(dsn: &str) -> Self {
        Self { dsn: dsn.to_string() }
    }

    async fn connect(&self) -> PlanResult<Client> {
        let (client, connection) = tokio_postgres::connect(&self.dsn, NoTls)
            .await
            .map_err(|e| PlanError::storage(format!("Database connection failed: {}", e)))?;
        // drive the connection until the client is dropped
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("postgres connection error: {}", e);
            }
        });
        Ok(client)
    }

    pub async fn ensure_schema(&self) -> PlanResult<()> {
        let client = self.connect().await?;
        client.batch_execute(CREATE_TABLE).await?;
        debug!("plans table ready");
        Ok(())
    }

    pub async fn insert(&self, plan_ref: &str, text: &str) -> PlanResult<PlanRecord> {
        let client = self.connect().await?;
        let row = client.query_one(INSERT_PLAN, &[&plan_ref, &text]).await?;
        record_from_row(&row)
    }

    pub async fn fetch_by_ref(&self, plan_ref: &str) -> PlanResult<Vec<PlanRecord>> {
        let client = self.connect().await?;
        let rows = client
            .query(SELECT_BY_REF, &[&plan_ref])
            .await
            .map_err(|e| PlanError::storage(format!("Database query failed: {}", e)))?;
        rows.iter().map(record_from_row).collect()
    }
}

fn record_from_row(row: &Row) -> PlanResult<PlanRecord> {
    Ok(PlanRecord {
        id: row.try_get("id")?,
        plan_ref: row.try_get("ref")?,
        text: row.try_get("plantext")?,
        created_at: row.try_get("created_at")?,
    })
}
