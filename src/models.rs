use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, Month};

/// Income/expense discriminator shared by transactions and categories.
/// Persisted under the column name `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<EntryKind> {
        match s {
            "income" => Some(EntryKind::Income),
            "expense" => Some(EntryKind::Expense),
            _ => None,
        }
    }
}

/// Engine-assigned key of a money transaction, immutable once assigned.
pub type MoneyTransactionId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyTransaction {
    pub concept: String,
    pub date: Date,
    pub amount: Decimal,
    /// References a [`Category`] by name.
    pub category: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Caller-supplied field changes for a money transaction; `None` leaves the
/// stored field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoneyTransactionPatch {
    pub concept: Option<String>,
    pub date: Option<Date>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub kind: Option<EntryKind>,
}

impl MoneyTransactionPatch {
    pub(crate) fn apply(self, record: &mut MoneyTransaction) {
        if let Some(concept) = self.concept {
            record.concept = concept;
        }
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(amount) = self.amount {
            record.amount = amount;
        }
        if let Some(category) = self.category {
            record.category = category;
        }
        if let Some(kind) = self.kind {
            record.kind = kind;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub icon: String,
    pub color: String,
}

/// Composite natural key of a category: a name may repeat across kinds but
/// not within one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryKey {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Caller-supplied field changes for a category. Key-path fields (`name`,
/// `kind`) are not patchable; the record is put back under the same key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl CategoryPatch {
    pub(crate) fn apply(self, record: &mut Category) {
        if let Some(icon) = self.icon {
            record.icon = icon;
        }
        if let Some(color) = self.color {
            record.color = color;
        }
    }
}

pub(crate) fn date_to_str(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), d.month() as u8, d.day())
}

pub(crate) fn str_to_date(s: &str) -> Result<Date, String> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 {
        return Err(format!("invalid date '{s}'"));
    }
    let year: i32 = parts[0].parse().map_err(|_| format!("invalid year in '{s}'"))?;
    let month: u8 = parts[1].parse().map_err(|_| format!("invalid month in '{s}'"))?;
    let day: u8 = parts[2].parse().map_err(|_| format!("invalid day in '{s}'"))?;
    let month = Month::try_from(month).map_err(|e| e.to_string())?;
    Date::from_calendar_date(year, month, day).map_err(|e| e.to_string())
}

/// Row-decoding failure for a stored column, reported through the engine's
/// native conversion error.
pub(crate) fn column_error(index: usize, message: impl Into<String>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        message.into().into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::macros::date;

    #[test]
    fn date_round_trips_through_text() {
        let d = date!(2024 - 01 - 31);
        assert_eq!(date_to_str(d), "2024-01-31");
        assert_eq!(str_to_date("2024-01-31").unwrap(), d);
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert!(str_to_date("2024-01").is_err());
        assert!(str_to_date("2024-13-01").is_err());
        assert!(str_to_date("yesterday").is_err());
    }

    #[test]
    fn entry_kind_round_trips() {
        assert_eq!(EntryKind::parse("income"), Some(EntryKind::Income));
        assert_eq!(EntryKind::parse("expense"), Some(EntryKind::Expense));
        assert_eq!(EntryKind::parse("transfer"), None);
        assert_eq!(EntryKind::Income.as_str(), "income");
    }

    #[test]
    fn patch_applies_only_supplied_fields() {
        let mut record = MoneyTransaction {
            concept: "Coffee".to_string(),
            date: date!(2024 - 01 - 01),
            amount: dec!(3.50),
            category: "Food".to_string(),
            kind: EntryKind::Expense,
        };
        let patch = MoneyTransactionPatch {
            amount: Some(dec!(4.25)),
            ..Default::default()
        };
        patch.apply(&mut record);
        assert_eq!(record.amount, dec!(4.25));
        assert_eq!(record.concept, "Coffee");
        assert_eq!(record.kind, EntryKind::Expense);
    }
}
