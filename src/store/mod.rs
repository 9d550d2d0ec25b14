//!
//! planchecker plan store
//! ----------------------
//! Saved plans are kept as raw text under a short random reference code. The
//! store only writes and reads whole records: the text is parsed again every
//! time a plan is viewed.
//!
//! Two backends sit behind [`PlanStore`]:
//! - `postgres`: a `plans` table reached through tokio-postgres, one connection
//!   per call;
//! - `memory`: a process-local list, selected with the `memory://` connection
//!   string and used by the tests.
//!
//! Without a connection string the store is unconfigured and every operation
//! fails with [`PlanError::Configuration`]; parsing still works.

use chrono::NaiveDateTime;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::{PlanError, PlanResult};

mod memory;
mod postgres;

pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;

/// Symbols a reference code is drawn from.
pub const REF_ALPHABET: &[u8] = b"1234567890abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const REF_LEN: usize = 8;
/// Connection string selecting the in-memory backend.
pub const MEMORY_URL: &str = "memory://";

/// One saved plan. `id` and `created_at` are assigned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRecord {
    pub id: i32,
    #[serde(rename = "ref")]
    pub plan_ref: String,
    pub text: String,
    pub created_at: NaiveDateTime,
}

/// Random reference code. Collisions are not checked.
pub fn generate_reference() -> String {
    let mut rng = rand::thread_rng();
    (0..REF_LEN)
        .map(|_| REF_ALPHABET[rng.gen_range(0..REF_ALPHABET.len())] as char)
        .collect()
}

enum Backend {
    Postgres(PostgresBackend),
    Memory(MemoryBackend),
}

pub struct PlanStore {
    backend: Option<Backend>,
}

impl PlanStore {
    /// Pick a backend from the configured connection string.
    pub fn from_config(connection_string: Option<&str>) -> Self {
        let backend = match connection_string.map(str::trim) {
            None | Some("") => None,
            Some(MEMORY_URL) => Some(Backend::Memory(MemoryBackend::default())),
            Some(dsn) => Some(Backend::Postgres(PostgresBackend::new(dsn))),
        };
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self { backend: Some(Backend::Memory(MemoryBackend::default())) }
    }

    pub fn unconfigured() -> Self {
        Self { backend: None }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Short backend name for startup logs.
    pub fn kind(&self) -> &'static str {
        match &self.backend {
            Some(Backend::Postgres(_)) => "postgres",
            Some(Backend::Memory(_)) => "memory",
            None => "none",
        }
    }

    fn backend(&self) -> PlanResult<&Backend> {
        self.backend.as_ref().ok_or(PlanError::Configuration)
    }

    /// Create the `plans` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> PlanResult<()> {
        match self.backend()? {
            Backend::Postgres(pg) => pg.ensure_schema().await,
            Backend::Memory(_) => Ok(()),
        }
    }

    /// Save plan text under a fresh reference.
    pub async fn insert(&self, text: &str) -> PlanResult<PlanRecord> {
        let backend = self.backend()?;
        let plan_ref = generate_reference();
        let record = match backend {
            Backend::Postgres(pg) => pg.insert(&plan_ref, text).await?,
            Backend::Memory(mem) => mem.insert(&plan_ref, text),
        };
        debug!(plan_ref = %record.plan_ref, id = record.id, bytes = text.len(), "stored plan");
        Ok(record)
    }

    /// Load the single record saved under `plan_ref`.
    pub async fn fetch_by_ref(&self, plan_ref: &str) -> PlanResult<PlanRecord> {
        let mut found = match self.backend()? {
            Backend::Postgres(pg) => pg.fetch_by_ref(plan_ref).await?,
            Backend::Memory(mem) => mem.fetch_by_ref(plan_ref),
        };
        debug!(plan_ref, rows = found.len(), "fetched plan");
        match found.len() {
            0 => Err(PlanError::NotFound(plan_ref.to_string())),
            1 => Ok(found.remove(0)),
            n => Err(PlanError::Cardinality(n)),
        }
    }
}

#[cfg(test)]
mod store_tests;
