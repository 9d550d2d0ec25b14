use chrono::Utc;
use parking_lot::Mutex;

use super::PlanRecord;

/// Process-local plan list. Ids are assigned sequentially from 1.
#[derive(Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<PlanRecord>>,
}

impl MemoryBackend {
    pub fn insert(&self, plan_ref: &str, text: &str) -> PlanRecord {
        let mut records = self.records.lock();
        let record = PlanRecord {
            id: records.len() as i32 + 1,
            plan_ref: plan_ref.to_string(),
            text: text.to_string(),
            created_at: Utc::now().naive_utc(),
        };
        records.push(record.clone());
        record
    }

    pub fn fetch_by_ref(&self, plan_ref: &str) -> Vec<PlanRecord> {
        self.records.lock().iter().filter(|r| r.plan_ref == plan_ref).cloned().collect()
    }
}
