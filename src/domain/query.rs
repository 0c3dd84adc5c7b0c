//! Key filters for segmented table queries
//!
//! A [`TableQuery`] is a conjunction of key conditions plus a page size. It
//! renders to an OData-style filter string for remote backends and logs, and
//! evaluates directly against an [`Entity`] for in-process backends.

use crate::domain::entity::{Entity, PARTITION_KEY, ROW_KEY};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Largest page a backend will return for one segment
pub const MAX_PAGE_SIZE: usize = 1000;

/// Page size used when the caller does not choose one
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Comparison operator of a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Comparison {
    #[default]
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "ne")]
    NotEqual,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "ge")]
    GreaterThanOrEqual,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "le")]
    LessThanOrEqual,
}

impl Comparison {
    /// Operator keyword (`eq`, `ne`, `gt`, `ge`, `lt`, `le`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Equal => "eq",
            Comparison::NotEqual => "ne",
            Comparison::GreaterThan => "gt",
            Comparison::GreaterThanOrEqual => "ge",
            Comparison::LessThan => "lt",
            Comparison::LessThanOrEqual => "le",
        }
    }

    /// Returns `true` if `ordering` (left compared to right) satisfies the
    /// operator
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::Equal => ordering == Ordering::Equal,
            Comparison::NotEqual => ordering != Ordering::Equal,
            Comparison::GreaterThan => ordering == Ordering::Greater,
            Comparison::GreaterThanOrEqual => ordering != Ordering::Less,
            Comparison::LessThan => ordering == Ordering::Less,
            Comparison::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eq" => Ok(Comparison::Equal),
            "ne" => Ok(Comparison::NotEqual),
            "gt" => Ok(Comparison::GreaterThan),
            "ge" => Ok(Comparison::GreaterThanOrEqual),
            "lt" => Ok(Comparison::LessThan),
            "le" => Ok(Comparison::LessThanOrEqual),
            _ => Err(format!(
                "Invalid comparison '{s}'. Must be one of: eq, ne, gt, ge, lt, le"
            )),
        }
    }
}

/// Key column a condition applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyColumn {
    PartitionKey,
    RowKey,
}

impl KeyColumn {
    /// Column name as it appears in filter strings
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyColumn::PartitionKey => PARTITION_KEY,
            KeyColumn::RowKey => ROW_KEY,
        }
    }

    fn value_of<'a>(&self, entity: &'a Entity) -> &'a str {
        match self {
            KeyColumn::PartitionKey => entity.partition_key(),
            KeyColumn::RowKey => entity.row_key(),
        }
    }
}

/// A single `column op 'value'` condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub column: KeyColumn,
    pub comparison: Comparison,
    pub value: String,
}

impl Condition {
    /// Creates a condition
    pub fn new(column: KeyColumn, comparison: Comparison, value: impl Into<String>) -> Self {
        Self {
            column,
            comparison,
            value: value.into(),
        }
    }

    /// Evaluates the condition against an entity
    pub fn matches(&self, entity: &Entity) -> bool {
        let ordering = self.column.value_of(entity).cmp(self.value.as_str());
        self.comparison.accepts(ordering)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} '{}'",
            self.column.as_str(),
            self.comparison,
            // Escape single quotes
            self.value.replace('\'', "''")
        )
    }
}

/// Conjunctive key filter with a page size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableQuery {
    conditions: Vec<Condition>,
    take: usize,
}

impl TableQuery {
    /// Query matching every entity of one partition
    pub fn partition(partition_key: impl Into<String>) -> Self {
        Self {
            conditions: vec![Condition::new(
                KeyColumn::PartitionKey,
                Comparison::Equal,
                partition_key,
            )],
            take: DEFAULT_PAGE_SIZE,
        }
    }

    /// Adds a row key condition
    pub fn and_row_key(mut self, comparison: Comparison, value: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::new(KeyColumn::RowKey, comparison, value));
        self
    }

    /// Restricts row keys to the inclusive range `[from, to]`
    pub fn and_row_key_between(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.and_row_key(Comparison::GreaterThanOrEqual, from)
            .and_row_key(Comparison::LessThanOrEqual, to)
    }

    /// Sets the page size
    pub fn take(mut self, take: usize) -> Self {
        self.take = take;
        self
    }

    /// Page size
    pub fn page_size(&self) -> usize {
        self.take
    }

    /// Conditions in the order they were added
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluates every condition against an entity
    pub fn matches(&self, entity: &Entity) -> bool {
        self.conditions.iter().all(|c| c.matches(entity))
    }

    /// Renders the filter expression
    pub fn filter_string(&self) -> String {
        self.conditions
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

impl fmt::Display for TableQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filter_string())
    }
}

/// Inclusive row key bounds covering every key that starts with `prefix`
///
/// The upper bound appends the highest code point so that any suffix sorts
/// below it.
pub fn prefix_range(prefix: &str) -> (String, String) {
    let mut upper = String::with_capacity(prefix.len() + 4);
    upper.push_str(prefix);
    upper.push(char::MAX);
    (prefix.to_string(), upper)
}
