//! Financial record model
//!
//! Income, expense and transaction entries share one shape, tagged by
//! [`RecordKind`]. Each kind lives in its own collection and has its own
//! validation rules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::core::error::{Error, Result};

pub const MAX_TITLE_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Income,
    Expense,
    Transaction,
}

impl RecordKind {
    /// File stem of the collection on disk
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::Income => "incomes",
            RecordKind::Expense => "expenses",
            RecordKind::Transaction => "transactions",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Income => "Income",
            RecordKind::Expense => "Expense",
            RecordKind::Transaction => "Transaction",
        }
    }
}

/// Direction of money flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    pub id: String,
    pub kind: RecordKind,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub date: DateTime<Utc>,
    /// Id of the user who created the record, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client supplied fields, used both for creation and partial updates
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub amount: Option<f64>,
    #[serde(rename = "type")]
    pub entry_type: Option<EntryType>,
    #[serde(default, deserialize_with = "flexible_date")]
    pub date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl RecordDraft {
    /// Build a new validated record of `kind`
    pub fn into_record(
        self,
        kind: RecordKind,
        owner: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<FinancialRecord> {
        let amount = self
            .amount
            .ok_or_else(|| Error::Validation("Amount is required".to_string()))?;

        let entry_type = match kind {
            RecordKind::Income => EntryType::Income,
            RecordKind::Expense => EntryType::Expense,
            RecordKind::Transaction => self.entry_type.ok_or_else(|| {
                Error::Validation("Type is required (income or expense)".to_string())
            })?,
        };

        let record = FinancialRecord {
            id: Uuid::new_v4().to_string(),
            kind,
            entry_type,
            amount,
            title: clean(self.title),
            description: clean(self.description),
            category: clean(self.category),
            date: self.date.unwrap_or(now),
            owner,
            created_at: now,
            updated_at: now,
        };

        validate(&record)?;
        Ok(record)
    }

    /// Merge the fields present in the draft over `record` and re-validate
    pub fn apply_to(self, record: &FinancialRecord, now: DateTime<Utc>) -> Result<FinancialRecord> {
        let mut merged = record.clone();

        if let Some(amount) = self.amount {
            merged.amount = amount;
        }
        if record.kind == RecordKind::Transaction {
            if let Some(entry_type) = self.entry_type {
                merged.entry_type = entry_type;
            }
        }
        if self.title.is_some() {
            merged.title = clean(self.title);
        }
        if self.description.is_some() {
            merged.description = clean(self.description);
        }
        if self.category.is_some() {
            merged.category = clean(self.category);
        }
        if let Some(date) = self.date {
            merged.date = date;
        }
        merged.updated_at = now;

        validate(&merged)?;
        Ok(merged)
    }
}

/// Check the per-kind rules
pub fn validate(record: &FinancialRecord) -> Result<()> {
    if !record.amount.is_finite() {
        return Err(Error::Validation("Amount must be a number".to_string()));
    }

    match record.kind {
        RecordKind::Income | RecordKind::Expense => {
            let title = required(&record.title, "Title")?;
            if title.chars().count() > MAX_TITLE_LEN {
                return Err(Error::Validation(format!(
                    "Title must be at most {} characters",
                    MAX_TITLE_LEN
                )));
            }
            required(&record.category, "Category")?;
            required(&record.description, "Description")?;
            if record.amount <= 0.0 {
                return Err(Error::Validation(
                    "Amount must be a positive number".to_string(),
                ));
            }
        }
        RecordKind::Transaction => {}
    }

    Ok(())
}

fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
    field
        .as_deref()
        .ok_or_else(|| Error::Validation(format!("{} is required", name)))
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc())
        })
}

/// Form clients post amounts as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

fn flexible_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawAmount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawAmount::Number(n)) => Ok(Some(n)),
        Some(RawAmount::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid amount `{}`", s))),
    }
}

fn flexible_date<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date `{}`", s))),
    }
}
