//! Query body for `POST /v1/alerts/query-alerts`.
//!
//! Alert search pages are 0-based and the sort direction is upper-case on
//! the wire (`"DESC"`). The tenant id is filled in by `alerts::search` when
//! the caller leaves it unset.

use serde::{Deserialize, Serialize};

use super::{
    Clause, Filter, FilterBuilder, FilterGroup, FilterSubgroup, Operator, QueryGroup,
    SortDirection,
};
use crate::dates::DateInput;
use crate::error::{IncydrError, Result};

/// Field holding the alert creation time.
pub const ALERT_CREATED_TERM: &str = "CreatedAt";

/// Server-side maximum for `pgSize`.
pub const MAX_ALERT_PAGE_SIZE: usize = 500;

mod upper_sort {
    use super::SortDirection;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dir: &SortDirection, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(dir.as_upper())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SortDirection, D::Error> {
        SortDirection::deserialize(d)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub group_clause: Clause,
    pub groups: Vec<QueryGroup>,
    #[serde(rename = "pgNum")]
    pub page_num: u32,
    #[serde(rename = "pgSize")]
    pub page_size: usize,
    #[serde(rename = "srtDirection", with = "upper_sort")]
    pub sort_dir: SortDirection,
    #[serde(rename = "srtKey")]
    pub sort_key: String,
}

impl Default for AlertQuery {
    fn default() -> Self {
        AlertQuery {
            tenant_id: None,
            group_clause: Clause::And,
            groups: Vec::new(),
            page_num: 0,
            page_size: 100,
            sort_dir: SortDirection::Desc,
            sort_key: ALERT_CREATED_TERM.to_string(),
        }
    }
}

impl AlertQuery {
    pub fn new() -> Self {
        AlertQuery::default()
    }

    /// Starts a query restricted to a window on `CreatedAt`.
    pub fn with_dates(start: Option<DateInput>, end: Option<DateInput>) -> Result<Self> {
        let mut query = AlertQuery::new();
        if let Some(group) =
            FilterGroup::for_date_range(ALERT_CREATED_TERM, start.as_ref(), end.as_ref())?
        {
            query.groups.push(group.into());
        }
        Ok(query)
    }

    /// `term CONTAINS value`.
    pub fn contains(self, term: &str, value: &str) -> Self {
        self.with_group(FilterGroup::single(Filter::new(
            term,
            Operator::Contains,
            value,
        )))
    }

    /// `term DOES_NOT_CONTAIN value`.
    pub fn does_not_contain(self, term: &str, value: &str) -> Self {
        self.with_group(FilterGroup::single(Filter::new(
            term,
            Operator::DoesNotContain,
            value,
        )))
    }

    /// Nests `other` as one subgroup, keeping its own group clause.
    pub fn subquery(mut self, other: AlertQuery) -> Self {
        self.groups.push(QueryGroup::Subgroup(FilterSubgroup {
            subgroup_clause: other.group_clause,
            subgroups: other.groups,
        }));
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Result<Self> {
        if page_size == 0 || page_size > MAX_ALERT_PAGE_SIZE {
            return Err(IncydrError::Validation(format!(
                "alert page size must be between 1 and {MAX_ALERT_PAGE_SIZE}, got {page_size}"
            )));
        }
        self.page_size = page_size;
        Ok(self)
    }

    pub fn with_sort(mut self, key: &str, dir: SortDirection) -> Self {
        self.sort_key = key.to_string();
        self.sort_dir = dir;
        self
    }
}

impl FilterBuilder for AlertQuery {
    fn groups_mut(&mut self) -> &mut Vec<QueryGroup> {
        &mut self.groups
    }

    fn group_clause(&self) -> Clause {
        self.group_clause
    }

    fn set_group_clause(&mut self, clause: Clause) {
        self.group_clause = clause;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_equals_two_values_matches_wire_example() {
        let query = AlertQuery::new().equals("State", ["OPEN", "PENDING"]).unwrap();
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json["groups"][0],
            json!({
                "filterClause": "OR",
                "filters": [
                    {"term": "State", "operator": "IS", "value": "OPEN"},
                    {"term": "State", "operator": "IS", "value": "PENDING"}
                ]
            })
        );
    }

    #[test]
    fn default_envelope_is_zero_based_and_descending() {
        let json = serde_json::to_value(AlertQuery::new()).unwrap();
        assert_eq!(
            json,
            json!({
                "groupClause": "AND",
                "groups": [],
                "pgNum": 0,
                "pgSize": 100,
                "srtDirection": "DESC",
                "srtKey": "CreatedAt"
            })
        );
    }

    #[test]
    fn tenant_id_is_serialized_when_set() {
        let mut query = AlertQuery::new();
        query.tenant_id = Some("tenant-1".into());
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["tenantId"], "tenant-1");
    }

    #[test]
    fn contains_filters_and_date_range() {
        let query = AlertQuery::with_dates(Some(DateInput::parse("2023-03-01").unwrap()), None)
            .unwrap()
            .contains("Description", "zip")
            .does_not_contain("Actor", "svc-");
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json["groups"][0]["filters"][0],
            json!({"term": "CreatedAt", "operator": "ON_OR_AFTER", "value": "2023-03-01T00:00:00.000Z"})
        );
        assert_eq!(json["groups"][1]["filters"][0]["operator"], "CONTAINS");
        assert_eq!(json["groups"][2]["filters"][0]["operator"], "DOES_NOT_CONTAIN");
    }

    #[test]
    fn page_size_limit_is_enforced() {
        assert!(AlertQuery::new().with_page_size(500).is_ok());
        assert!(AlertQuery::new().with_page_size(501).is_err());
    }

    #[test]
    fn sort_direction_deserializes_upper_case() {
        let query: AlertQuery = serde_json::from_value(json!({
            "groupClause": "OR",
            "groups": [],
            "pgNum": 2,
            "pgSize": 25,
            "srtDirection": "ASC",
            "srtKey": "RiskScore"
        }))
        .unwrap();
        assert_eq!(query.sort_dir, SortDirection::Asc);
        assert_eq!(query.group_clause, Clause::Or);
    }
}
