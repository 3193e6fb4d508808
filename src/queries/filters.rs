//! Filter primitives shared by every search query.
//!
//! The wire shape is:
//!
//! ```json
//! {"filterClause": "OR", "filters": [{"term": "State", "operator": "IS", "value": "OPEN"}]}
//! ```
//!
//! or, for nested boolean expressions:
//!
//! ```json
//! {"subgroupClause": "AND", "subgroups": [ ...groups... ]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::dates::DateInput;
use crate::error::{IncydrError, Result};

/// Comparison operators understood by the search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Is,
    IsNot,
    Exists,
    DoesNotExist,
    GreaterThan,
    LessThan,
    On,
    OnOrAfter,
    OnOrBefore,
    WithinTheLast,
    IsAny,
    IsNone,
    Contains,
    DoesNotContain,
}

impl Operator {
    pub const ALL: [Operator; 14] = [
        Operator::Is,
        Operator::IsNot,
        Operator::Exists,
        Operator::DoesNotExist,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::On,
        Operator::OnOrAfter,
        Operator::OnOrBefore,
        Operator::WithinTheLast,
        Operator::IsAny,
        Operator::IsNone,
        Operator::Contains,
        Operator::DoesNotContain,
    ];

    /// Wire name, e.g. `"ON_OR_AFTER"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Is => "IS",
            Operator::IsNot => "IS_NOT",
            Operator::Exists => "EXISTS",
            Operator::DoesNotExist => "DOES_NOT_EXIST",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::LessThan => "LESS_THAN",
            Operator::On => "ON",
            Operator::OnOrAfter => "ON_OR_AFTER",
            Operator::OnOrBefore => "ON_OR_BEFORE",
            Operator::WithinTheLast => "WITHIN_THE_LAST",
            Operator::IsAny => "IS_ANY",
            Operator::IsNone => "IS_NONE",
            Operator::Contains => "CONTAINS",
            Operator::DoesNotContain => "DOES_NOT_CONTAIN",
        }
    }

    /// Looks up an operator by wire name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Operator> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(name))
    }

    pub fn is_valid(name: &str) -> bool {
        Operator::from_name(name).is_some()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How filters in a group (or groups in a query) are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Clause {
    #[default]
    And,
    Or,
}

/// A single `(term, operator, value)` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub term: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

impl Filter {
    pub fn new(term: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Filter {
            term: term.into(),
            operator,
            value: value.into(),
        }
    }

    /// A filter without a value (`EXISTS`, `DOES_NOT_EXIST`).
    pub fn unary(term: impl Into<String>, operator: Operator) -> Self {
        Filter {
            term: term.into(),
            operator,
            value: Value::Null,
        }
    }
}

/// Filters combined by one clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterGroup {
    pub filter_clause: Clause,
    pub filters: Vec<Filter>,
    /// Opaque display hint stored by the web console on saved searches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl FilterGroup {
    pub fn new(filter_clause: Clause, filters: Vec<Filter>) -> Self {
        FilterGroup {
            filter_clause,
            filters,
            display: None,
        }
    }

    /// A group holding exactly one filter, clause `AND`.
    pub fn single(filter: Filter) -> Self {
        FilterGroup::new(Clause::And, vec![filter])
    }

    /// One filter per value, in input order. A single value yields an `AND`
    /// group, several values an `OR` group.
    pub fn for_values(term: &str, operator: Operator, values: Vec<String>) -> Result<Self> {
        if values.is_empty() {
            return Err(IncydrError::Validation(format!(
                "{operator} filter on '{term}' requires at least one value"
            )));
        }
        let clause = if values.len() == 1 {
            Clause::And
        } else {
            Clause::Or
        };
        let filters = values
            .into_iter()
            .map(|value| Filter::new(term, operator, value))
            .collect();
        Ok(FilterGroup::new(clause, filters))
    }

    /// Date-range group on `term`. A relative start becomes one
    /// `WITHIN_THE_LAST` filter; absolute bounds become `ON_OR_AFTER` and
    /// `ON_OR_BEFORE` filters. Returns `None` when neither bound is given.
    pub fn for_date_range(
        term: &str,
        start: Option<&DateInput>,
        end: Option<&DateInput>,
    ) -> Result<Option<Self>> {
        if end.is_some_and(DateInput::is_relative) {
            return Err(IncydrError::Validation(
                "an end date must be an absolute timestamp".to_string(),
            ));
        }
        let mut filters = Vec::new();
        match start {
            Some(relative @ DateInput::Relative(_)) => {
                if end.is_some() {
                    return Err(IncydrError::Validation(
                        "a relative start date cannot be combined with an end date".to_string(),
                    ));
                }
                filters.push(Filter::new(
                    term,
                    Operator::WithinTheLast,
                    relative.to_filter_value(),
                ));
            }
            Some(absolute) => {
                filters.push(Filter::new(
                    term,
                    Operator::OnOrAfter,
                    absolute.to_filter_value(),
                ));
            }
            None => {}
        }
        if let Some(end) = end {
            filters.push(Filter::new(term, Operator::OnOrBefore, end.to_filter_value()));
        }
        if filters.is_empty() {
            return Ok(None);
        }
        Ok(Some(FilterGroup::new(Clause::And, filters)))
    }
}

/// A nested boolean expression over groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSubgroup {
    pub subgroup_clause: Clause,
    pub subgroups: Vec<QueryGroup>,
}

/// An entry in a query's `groups` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryGroup {
    Filters(FilterGroup),
    Subgroup(FilterSubgroup),
}

impl From<FilterGroup> for QueryGroup {
    fn from(group: FilterGroup) -> Self {
        QueryGroup::Filters(group)
    }
}

impl From<FilterSubgroup> for QueryGroup {
    fn from(group: FilterSubgroup) -> Self {
        QueryGroup::Subgroup(group)
    }
}

/// Values accepted by `equals`-style builder methods: a single string or any
/// list of strings.
pub trait IntoValues {
    fn into_values(self) -> Vec<String>;
}

impl IntoValues for &str {
    fn into_values(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoValues for String {
    fn into_values(self) -> Vec<String> {
        vec![self]
    }
}

impl<T: Into<String>> IntoValues for Vec<T> {
    fn into_values(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<String>, const N: usize> IntoValues for [T; N] {
    fn into_values(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<String> + Clone> IntoValues for &[T] {
    fn into_values(self) -> Vec<String> {
        self.iter().cloned().map(Into::into).collect()
    }
}

/// A comparison value for `greater_than`/`less_than`. Strings are parsed as
/// floats when the filter is built.
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    pub fn to_value(&self) -> Result<Value> {
        let number = match self {
            Numeric::Int(i) => return Ok(Value::from(*i)),
            Numeric::Float(f) => *f,
            Numeric::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                IncydrError::Validation(format!("'{s}' is not a number"))
            })?,
        };
        serde_json::Number::from_f64(number)
            .map(Value::Number)
            .ok_or_else(|| IncydrError::Validation(format!("{number} is not a finite number")))
    }
}

impl From<i64> for Numeric {
    fn from(v: i64) -> Self {
        Numeric::Int(v)
    }
}

impl From<i32> for Numeric {
    fn from(v: i32) -> Self {
        Numeric::Int(v.into())
    }
}

impl From<u64> for Numeric {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Numeric::Int(i),
            Err(_) => Numeric::Float(v as f64),
        }
    }
}

impl From<f64> for Numeric {
    fn from(v: f64) -> Self {
        Numeric::Float(v)
    }
}

impl From<&str> for Numeric {
    fn from(v: &str) -> Self {
        Numeric::Text(v.to_string())
    }
}

impl From<String> for Numeric {
    fn from(v: String) -> Self {
        Numeric::Text(v)
    }
}
