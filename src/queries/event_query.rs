//! Query body for `POST /v2/file-events`.

use serde::{Deserialize, Serialize};

use super::{Clause, FilterBuilder, FilterGroup, FilterSubgroup, QueryGroup, SortDirection};
use crate::dates::DateInput;
use crate::error::{IncydrError, Result};
use crate::file_events::SavedSearch;

/// Field holding the event time.
pub const EVENT_TIMESTAMP_TERM: &str = "@timestamp";

/// Server-side maximum for `pgSize`.
pub const MAX_EVENT_PAGE_SIZE: usize = 10_000;

/// A file-event search.
///
/// `page_token` is `Some("")` by default, which selects token pagination:
/// the server then ignores `pgNum` and returns `nextPgToken`. Setting it to
/// `None` serializes `null` and switches to page-number pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    pub group_clause: Clause,
    pub groups: Vec<QueryGroup>,
    #[serde(rename = "pgNum")]
    pub page_num: u32,
    #[serde(rename = "pgSize")]
    pub page_size: usize,
    #[serde(rename = "pgToken")]
    pub page_token: Option<String>,
    #[serde(rename = "srtDir")]
    pub sort_dir: SortDirection,
    #[serde(rename = "srtKey")]
    pub sort_key: String,
}

impl Default for EventQuery {
    fn default() -> Self {
        EventQuery {
            group_clause: Clause::And,
            groups: Vec::new(),
            page_num: 1,
            page_size: 100,
            page_token: Some(String::new()),
            sort_dir: SortDirection::Asc,
            sort_key: EVENT_TIMESTAMP_TERM.to_string(),
        }
    }
}

impl EventQuery {
    pub fn new() -> Self {
        EventQuery::default()
    }

    /// Starts a query restricted to a time window on `@timestamp`.
    ///
    /// A relative `start` (`P7D`) becomes a `WITHIN_THE_LAST` filter; absolute
    /// bounds become `ON_OR_AFTER` / `ON_OR_BEFORE` filters in one group.
    pub fn with_dates(start: Option<DateInput>, end: Option<DateInput>) -> Result<Self> {
        let mut query = EventQuery::new();
        if let Some(group) =
            FilterGroup::for_date_range(EVENT_TIMESTAMP_TERM, start.as_ref(), end.as_ref())?
        {
            query.groups.push(group.into());
        }
        Ok(query)
    }

    /// Rebuilds a query from a saved search, keeping its nested groups and
    /// sort order.
    pub fn from_saved_search(saved: &SavedSearch) -> Self {
        let mut query = EventQuery::new();
        query.group_clause = saved.group_clause;
        query.groups = saved.groups.clone();
        if let Some(dir) = saved.sort_dir {
            query.sort_dir = dir;
        }
        if let Some(key) = &saved.sort_key {
            query.sort_key = key.clone();
        }
        query
    }

    /// Nests `other` as one subgroup, keeping its own group clause.
    pub fn subquery(mut self, other: EventQuery) -> Self {
        self.groups.push(QueryGroup::Subgroup(FilterSubgroup {
            subgroup_clause: other.group_clause,
            subgroups: other.groups,
        }));
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Result<Self> {
        if page_size == 0 || page_size > MAX_EVENT_PAGE_SIZE {
            return Err(IncydrError::Validation(format!(
                "file event page size must be between 1 and {MAX_EVENT_PAGE_SIZE}, got {page_size}"
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

impl FilterBuilder for EventQuery {
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
    use crate::queries::Operator;
    use serde_json::json;

    #[test]
    fn default_query_serializes_expected_envelope() {
        let json = serde_json::to_value(EventQuery::new()).unwrap();
        assert_eq!(
            json,
            json!({
                "groupClause": "AND",
                "groups": [],
                "pgNum": 1,
                "pgSize": 100,
                "pgToken": "",
                "srtDir": "asc",
                "srtKey": "@timestamp"
            })
        );
    }

    #[test]
    fn relative_start_becomes_within_the_last() {
        let query =
            EventQuery::with_dates(Some(DateInput::parse("P7D").unwrap()), None).unwrap();
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json["groups"],
            json!([{
                "filterClause": "AND",
                "filters": [{"term": "@timestamp", "operator": "WITHIN_THE_LAST", "value": "P7D"}]
            }])
        );
    }

    #[test]
    fn epoch_bounds_become_on_or_after_and_on_or_before() {
        let query = EventQuery::with_dates(
            Some(DateInput::try_from(1_672_531_200i64).unwrap()),
            Some(DateInput::try_from(1_672_617_600.5f64).unwrap()),
        )
        .unwrap();
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json["groups"],
            json!([{
                "filterClause": "AND",
                "filters": [
                    {"term": "@timestamp", "operator": "ON_OR_AFTER", "value": "2023-01-01T00:00:00.000Z"},
                    {"term": "@timestamp", "operator": "ON_OR_BEFORE", "value": "2023-01-02T00:00:00.500Z"}
                ]
            }])
        );
    }

    #[test]
    fn multi_value_equals_is_or_in_input_order() {
        let query = EventQuery::new()
            .equals("file.category", ["Document", "Image", "SourceCode"])
            .unwrap();
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json["groups"][0],
            json!({
                "filterClause": "OR",
                "filters": [
                    {"term": "file.category", "operator": "IS", "value": "Document"},
                    {"term": "file.category", "operator": "IS", "value": "Image"},
                    {"term": "file.category", "operator": "IS", "value": "SourceCode"}
                ]
            })
        );
    }

    #[test]
    fn single_value_not_equals_is_and() {
        let query = EventQuery::new().not_equals("user.email", "a@example.com").unwrap();
        match &query.groups[0] {
            QueryGroup::Filters(group) => {
                assert_eq!(group.filter_clause, Clause::And);
                assert_eq!(group.filters.len(), 1);
                assert_eq!(group.filters[0].operator, Operator::IsNot);
            }
            other => panic!("unexpected group {other:?}"),
        }
    }

    #[test]
    fn equals_with_empty_list_fails() {
        let err = EventQuery::new()
            .equals("file.category", Vec::<String>::new())
            .unwrap_err();
        assert!(matches!(err, IncydrError::Validation(_)));
    }

    #[test]
    fn comparison_filters_coerce_numbers() {
        let query = EventQuery::new()
            .greater_than("risk.score", "10")
            .unwrap()
            .less_than("file.sizeInBytes", 2048i64)
            .unwrap();
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["groups"][0]["filters"][0]["value"], json!(10.0));
        assert_eq!(json["groups"][0]["filters"][0]["operator"], "GREATER_THAN");
        assert_eq!(json["groups"][1]["filters"][0]["value"], json!(2048));
        assert!(EventQuery::new().greater_than("risk.score", "high").is_err());
    }

    #[test]
    fn exists_and_matches_any() {
        let query = EventQuery::new()
            .exists("file.hash.md5")
            .does_not_exist("destination.category")
            .matches_any();
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["groupClause"], "OR");
        assert_eq!(json["groups"][0]["filters"][0]["operator"], "EXISTS");
        assert_eq!(json["groups"][1]["filters"][0]["operator"], "DOES_NOT_EXIST");
    }

    #[test]
    fn restricting_an_or_query_keeps_the_date_bound_mandatory() {
        let start = DateInput::parse("2023-01-01").unwrap();
        let window = FilterGroup::for_date_range(EVENT_TIMESTAMP_TERM, Some(&start), None)
            .unwrap()
            .unwrap();
        let query = EventQuery::new()
            .equals("file.category", "Document")
            .unwrap()
            .exists("file.hash.md5")
            .matches_any()
            .restricted_to(window);

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["groupClause"], "AND");
        assert_eq!(json["groups"].as_array().unwrap().len(), 2);
        assert_eq!(json["groups"][0]["filters"][0]["operator"], "ON_OR_AFTER");
        assert_eq!(json["groups"][1]["subgroupClause"], "OR");
        let branches = json["groups"][1]["subgroups"].as_array().unwrap();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0]["filters"][0]["term"], "file.category");
        assert_eq!(branches[1]["filters"][0]["operator"], "EXISTS");
    }

    #[test]
    fn restricting_an_and_query_appends_the_group() {
        let start = DateInput::parse("2023-01-01").unwrap();
        let window = FilterGroup::for_date_range(EVENT_TIMESTAMP_TERM, Some(&start), None)
            .unwrap()
            .unwrap();
        let query = EventQuery::new().exists("file.name").restricted_to(window);

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["groupClause"], "AND");
        assert_eq!(json["groups"][0]["filters"][0]["operator"], "EXISTS");
        assert_eq!(json["groups"][1]["filters"][0]["operator"], "ON_OR_AFTER");
    }

    #[test]
    fn subqueries_nest_recursively() {
        let innermost = EventQuery::new()
            .equals("file.category", "Document")
            .unwrap()
            .equals("file.category", "Image")
            .unwrap()
            .matches_any();
        let inner = EventQuery::new()
            .equals("user.email", "a@example.com")
            .unwrap()
            .subquery(innermost);
        let query = EventQuery::new().exists("file.name").subquery(inner);

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["groups"][1]["subgroupClause"], "AND");
        let nested = &json["groups"][1]["subgroups"];
        assert_eq!(nested[0]["filters"][0]["term"], "user.email");
        assert_eq!(nested[1]["subgroupClause"], "OR");
        assert_eq!(nested[1]["subgroups"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn page_size_respects_server_maximum() {
        assert!(EventQuery::new().with_page_size(10_000).is_ok());
        assert!(EventQuery::new().with_page_size(10_001).is_err());
        assert!(EventQuery::new().with_page_size(0).is_err());
    }

    #[test]
    fn saved_search_round_trips_groups() {
        let saved_json = json!({
            "id": "saved-1",
            "name": "Departing exfil",
            "groupClause": "AND",
            "groups": [
                {
                    "filterClause": "AND",
                    "filters": [{"term": "@timestamp", "operator": "WITHIN_THE_LAST", "value": "P30D"}]
                },
                {
                    "subgroupClause": "OR",
                    "subgroups": [
                        {
                            "filterClause": "OR",
                            "filters": [
                                {"term": "destination.category", "operator": "IS", "value": "Cloud Storage"},
                                {"term": "destination.category", "operator": "IS", "value": "Removable Media"}
                            ]
                        },
                        {
                            "subgroupClause": "AND",
                            "subgroups": [{
                                "filterClause": "AND",
                                "filters": [{"term": "risk.score", "operator": "GREATER_THAN", "value": 9}],
                                "display": "{\"version\":\"v2\"}"
                            }]
                        }
                    ]
                }
            ],
            "srtDir": "desc",
            "srtKey": "risk.score",
            "createdByUID": "user-1",
            "createdByUsername": "analyst@example.com"
        });
        let saved: SavedSearch = serde_json::from_value(saved_json.clone()).unwrap();
        let query = EventQuery::from_saved_search(&saved);
        let json = serde_json::to_value(&query).unwrap();

        assert_eq!(json["groups"], saved_json["groups"]);
        assert_eq!(json["groupClause"], "AND");
        assert_eq!(json["srtDir"], "desc");
        assert_eq!(json["srtKey"], "risk.score");
    }
}
