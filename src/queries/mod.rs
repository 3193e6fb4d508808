//! Query builders for the file-event and alert search endpoints.
//!
//! Queries are plain values built by chaining. No method here performs I/O;
//! the resulting struct serializes to the exact JSON body the endpoint
//! expects, with groups and filters in the order they were added.
//!
//! ```ignore
//! use incydr::queries::{EventQuery, FilterBuilder};
//!
//! let query = EventQuery::with_dates(Some("P7D".try_into()?), None)?
//!     .equals("file.category", ["Document", "SourceCode"])?
//!     .exists("file.hash.md5");
//! ```

pub mod alert_query;
pub mod event_query;
pub mod filters;

pub use alert_query::AlertQuery;
pub use event_query::EventQuery;
pub use filters::{Clause, Filter, FilterGroup, FilterSubgroup, IntoValues, Numeric, Operator, QueryGroup};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sort direction. Accepts either case when deserializing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc", alias = "ASC")]
    Asc,
    #[serde(rename = "desc", alias = "DESC")]
    Desc,
}

impl SortDirection {
    pub fn as_lower(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn as_upper(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = crate::error::IncydrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(crate::error::IncydrError::Validation(format!(
                "sort direction must be asc or desc, got '{s}'"
            ))),
        }
    }
}

/// Builder operations shared by every search query.
///
/// Implementors expose their group list and top-level clause; the provided
/// methods append groups in call order.
pub trait FilterBuilder: Sized {
    fn groups_mut(&mut self) -> &mut Vec<QueryGroup>;

    fn group_clause(&self) -> Clause;

    fn set_group_clause(&mut self, clause: Clause);

    /// Appends a group as-is.
    fn with_group(mut self, group: impl Into<QueryGroup>) -> Self {
        self.groups_mut().push(group.into());
        self
    }

    /// `term IS value`; several values are OR-ed in one group.
    fn equals(self, term: &str, values: impl IntoValues) -> Result<Self> {
        let group = FilterGroup::for_values(term, Operator::Is, values.into_values())?;
        Ok(self.with_group(group))
    }

    /// `term IS_NOT value`; several values are OR-ed in one group.
    fn not_equals(self, term: &str, values: impl IntoValues) -> Result<Self> {
        let group = FilterGroup::for_values(term, Operator::IsNot, values.into_values())?;
        Ok(self.with_group(group))
    }

    fn exists(self, term: &str) -> Self {
        self.with_group(FilterGroup::single(Filter::unary(term, Operator::Exists)))
    }

    fn does_not_exist(self, term: &str) -> Self {
        self.with_group(FilterGroup::single(Filter::unary(
            term,
            Operator::DoesNotExist,
        )))
    }

    fn greater_than(self, term: &str, value: impl Into<Numeric>) -> Result<Self> {
        let value = value.into().to_value()?;
        Ok(self.with_group(FilterGroup::single(Filter::new(
            term,
            Operator::GreaterThan,
            value,
        ))))
    }

    fn less_than(self, term: &str, value: impl Into<Numeric>) -> Result<Self> {
        let value = value.into().to_value()?;
        Ok(self.with_group(FilterGroup::single(Filter::new(
            term,
            Operator::LessThan,
            value,
        ))))
    }

    /// Combines the top-level groups with `OR` instead of `AND`.
    fn matches_any(mut self) -> Self {
        self.set_group_clause(Clause::Or);
        self
    }

    /// Requires `group` to hold for every result. Under `OR` the existing
    /// groups move into one subgroup, giving `AND(group, OR(existing...))`.
    fn restricted_to(mut self, group: impl Into<QueryGroup>) -> Self {
        if self.group_clause() == Clause::Or {
            let existing = std::mem::take(self.groups_mut());
            if !existing.is_empty() {
                self.groups_mut().push(QueryGroup::Subgroup(FilterSubgroup {
                    subgroup_clause: Clause::Or,
                    subgroups: existing,
                }));
            }
            self.set_group_clause(Clause::And);
            self.groups_mut().insert(0, group.into());
            return self;
        }
        self.with_group(group)
    }
}
