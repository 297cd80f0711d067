//! Record stores
//!
//! One independent JSON collection per record kind. There is no
//! cross-collection transaction: totals read from two stores may come from
//! different moments.

use chrono::Utc;
use std::path::Path;
use tracing::info;

use crate::core::error::{Error, Result};
use crate::core::store::JsonCollection;
use crate::finance::records::{FinancialRecord, RecordDraft, RecordKind};

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Only records created by this user
    pub owner: Option<String>,
}

impl RecordFilter {
    pub fn owned_by(user_id: impl Into<String>) -> Self {
        Self {
            owner: Some(user_id.into()),
        }
    }

    fn matches(&self, record: &FinancialRecord) -> bool {
        match &self.owner {
            Some(owner) => record.owner.as_deref() == Some(owner.as_str()),
            None => true,
        }
    }
}

pub struct RecordStore {
    kind: RecordKind,
    docs: JsonCollection<FinancialRecord>,
}

impl RecordStore {
    pub async fn open(data_dir: &Path, kind: RecordKind) -> Result<Self> {
        let path = data_dir.join(format!("{}.json", kind.collection()));
        let docs = JsonCollection::open(path).await?;
        Ok(Self { kind, docs })
    }

    pub async fn create(&self, draft: RecordDraft, owner: Option<String>) -> Result<FinancialRecord> {
        let record = draft.into_record(self.kind, owner, Utc::now())?;

        let saved = record.clone();
        self.docs
            .mutate(move |docs| {
                docs.push(record);
                Ok(())
            })
            .await?;

        info!(
            "[Records] Added {} {} ({})",
            self.kind.label(),
            saved.id,
            saved.amount
        );

        Ok(saved)
    }

    /// Records in insertion order
    pub async fn list(&self, filter: &RecordFilter) -> Vec<FinancialRecord> {
        self.docs
            .read(|docs| docs.iter().filter(|r| filter.matches(r)).cloned().collect())
            .await
    }

    pub async fn get(&self, id: &str) -> Result<FinancialRecord> {
        self.docs
            .read(|docs| docs.iter().find(|r| r.id == id).cloned())
            .await
            .ok_or_else(|| self.not_found())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let not_found = self.not_found();
        self.docs
            .mutate(|docs| {
                let pos = docs.iter().position(|r| r.id == id).ok_or(not_found)?;
                docs.remove(pos);
                Ok(())
            })
            .await?;

        info!("[Records] Deleted {} {}", self.kind.label(), id);
        Ok(())
    }

    /// Partial update; only transactions are editable
    pub async fn update(&self, id: &str, draft: RecordDraft) -> Result<FinancialRecord> {
        if self.kind != RecordKind::Transaction {
            return Err(Error::Validation(format!(
                "{} records cannot be updated",
                self.kind.label()
            )));
        }

        let not_found = self.not_found();
        let updated = self
            .docs
            .mutate(|docs| {
                let slot = docs.iter_mut().find(|r| r.id == id).ok_or(not_found)?;
                let merged = draft.apply_to(slot, Utc::now())?;
                *slot = merged.clone();
                Ok(merged)
            })
            .await?;

        info!("[Records] Updated {} {}", self.kind.label(), id);
        Ok(updated)
    }

    fn not_found(&self) -> Error {
        Error::NotFound(format!("{} not found", self.kind.label()))
    }
}

/// The three record collections
pub struct RecordStores {
    pub incomes: RecordStore,
    pub expenses: RecordStore,
    pub transactions: RecordStore,
}

impl RecordStores {
    pub async fn open(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        Ok(Self {
            incomes: RecordStore::open(data_dir, RecordKind::Income).await?,
            expenses: RecordStore::open(data_dir, RecordKind::Expense).await?,
            transactions: RecordStore::open(data_dir, RecordKind::Transaction).await?,
        })
    }

    pub fn get(&self, kind: RecordKind) -> &RecordStore {
        match kind {
            RecordKind::Income => &self.incomes,
            RecordKind::Expense => &self.expenses,
            RecordKind::Transaction => &self.transactions,
        }
    }
}
