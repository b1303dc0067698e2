/// Partial updates
///
/// A request body for `PUT /projects/:id` or `PUT /tasks/:id` may carry any
/// subset of the resource's fields. Three states have to be told apart for
/// every field:
///
/// | JSON                 | Rust                 | Effect            |
/// |----------------------|----------------------|-------------------|
/// | field absent         | `None`               | column untouched  |
/// | `"field": null`      | `Some(None)`         | column set NULL   |
/// | `"field": value`     | `Some(Some(value))`  | column set        |
///
/// Patch structs collect their present fields into a [`PatchSet`], which
/// renders a single `UPDATE` with bound parameters. Column and table names
/// come from `&'static str` constants in the model modules, never from input.
///
/// # Example
///
/// ```
/// use projecthub_shared::models::patch::PatchSet;
///
/// let mut set = PatchSet::new();
/// set.text("description", &Some(None));
///
/// let query = set.update_query("projects", 7, 1);
/// assert_eq!(
///     query.sql(),
///     "UPDATE projects SET description = ?, \
///      updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
///      WHERE id = ? AND user_id = ?"
/// );
/// ```

use chrono::{DateTime, NaiveDate};
use serde::{de, Deserialize, Deserializer};
use sqlx::{QueryBuilder, Sqlite};

use super::status::{ItemStatus, TaskPriority};

/// SQL expression for "now" in the stored timestamp format
pub const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// A patch tried to clear or blank a required field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PatchError {
    /// Offending field
    pub field: &'static str,

    /// User-facing message
    pub message: &'static str,
}

/// New value for one column
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Text(Option<String>),
    Date(Option<NaiveDate>),
    Status(ItemStatus),
    Priority(TaskPriority),
    Reference(Option<i64>),
}

/// Ordered list of `column = value` assignments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchSet {
    assignments: Vec<(&'static str, PatchValue)>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of columns that will be written (besides `updated_at`)
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Columns touched, in order
    pub fn columns(&self) -> Vec<&'static str> {
        self.assignments.iter().map(|(column, _)| *column).collect()
    }

    /// Value assigned to `column`, if present
    pub fn get(&self, column: &str) -> Option<&PatchValue> {
        self.assignments
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, value)| value)
    }

    /// Nullable text column
    pub fn text(&mut self, column: &'static str, value: &Option<Option<String>>) {
        if let Some(value) = value {
            self.assignments.push((column, PatchValue::Text(value.clone())));
        }
    }

    /// Non-nullable text column; null and blank strings are rejected
    pub fn required_text(
        &mut self,
        column: &'static str,
        value: &Option<Option<String>>,
        message: &'static str,
    ) -> Result<(), PatchError> {
        match value {
            None => Ok(()),
            Some(Some(text)) if !text.trim().is_empty() => {
                self.assignments
                    .push((column, PatchValue::Text(Some(text.clone()))));
                Ok(())
            }
            Some(_) => Err(PatchError {
                field: column,
                message,
            }),
        }
    }

    /// Nullable date column
    pub fn date(&mut self, column: &'static str, value: &Option<Option<NaiveDate>>) {
        if let Some(value) = value {
            self.assignments.push((column, PatchValue::Date(*value)));
        }
    }

    /// Status column; null is rejected
    pub fn status(
        &mut self,
        column: &'static str,
        value: &Option<Option<ItemStatus>>,
        message: &'static str,
    ) -> Result<(), PatchError> {
        match value {
            None => Ok(()),
            Some(Some(status)) => {
                self.assignments.push((column, PatchValue::Status(*status)));
                Ok(())
            }
            Some(None) => Err(PatchError {
                field: column,
                message,
            }),
        }
    }

    /// Priority column; null is rejected
    pub fn priority(
        &mut self,
        column: &'static str,
        value: &Option<Option<TaskPriority>>,
        message: &'static str,
    ) -> Result<(), PatchError> {
        match value {
            None => Ok(()),
            Some(Some(priority)) => {
                self.assignments
                    .push((column, PatchValue::Priority(*priority)));
                Ok(())
            }
            Some(None) => Err(PatchError {
                field: column,
                message,
            }),
        }
    }

    /// Nullable foreign key column
    pub fn reference(&mut self, column: &'static str, value: &Option<Option<i64>>) {
        if let Some(value) = value {
            self.assignments.push((column, PatchValue::Reference(*value)));
        }
    }

    /// Renders `UPDATE <table> SET ... WHERE id = ? AND user_id = ?`
    ///
    /// `updated_at` is always refreshed, so an empty set still produces a
    /// valid statement.
    pub fn update_query(
        &self,
        table: &'static str,
        id: i64,
        user_id: i64,
    ) -> QueryBuilder<'static, Sqlite> {
        let mut query = QueryBuilder::new("UPDATE ");
        query.push(table).push(" SET ");

        for (column, value) in &self.assignments {
            query.push(*column).push(" = ");
            match value {
                PatchValue::Text(v) => query.push_bind(v.clone()),
                PatchValue::Date(v) => query.push_bind(*v),
                PatchValue::Status(v) => query.push_bind(*v),
                PatchValue::Priority(v) => query.push_bind(*v),
                PatchValue::Reference(v) => query.push_bind(*v),
            };
            query.push(", ");
        }

        query
            .push("updated_at = ")
            .push(NOW)
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(user_id);

        query
    }
}

/// Deserializes a field so that `null` becomes `Some(None)`
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` so that
/// an absent field stays `None`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserializes an optional calendar date
///
/// Accepts `null`, `""` (both become `None`), `YYYY-MM-DD`, or a full RFC 3339
/// timestamp whose date part is kept.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;

    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_date(text).map(Some).map_err(de::Error::custom),
    }
}

/// [`optional_date`] for patch fields
pub fn patch_date<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_date(deserializer).map(Some)
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.date_naive()))
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", text))
}
