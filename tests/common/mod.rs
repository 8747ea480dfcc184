use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use deal_forecast::hubspot::types::FilterOperator;
use deal_forecast::hubspot::{
    CrmObject, Page, PropertyMap, RecordStore, SearchRequest, SearchResponse, StoreError,
};
use deal_forecast::hubspot::types::{NextPage, Paging};

#[allow(dead_code)]
pub const OBJECT_TYPE: &str = "2-9001";
#[allow(dead_code)]
pub const PIPELINE: &str = "sales-pipeline";

/// One recorded association call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub from_type: String,
    pub from_id: String,
    pub kind: String,
    pub to_type: String,
    pub to_id: String,
}

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<CrmObject>,
    associations: Vec<Association>,
    calls: Vec<String>,
    next_id: u64,
    list_limits: Vec<u32>,
    searches: Vec<SearchRequest>,
}

/// In-memory CRM: deals are served from a fixed list, custom object records
/// live in memory. Failures can be injected per operation.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    deals: Vec<CrmObject>,
    page_size_cap: Option<usize>,
    state: Mutex<StoreState>,
    pub fail_list_at_page: Option<usize>,
    pub fail_search: bool,
    pub fail_create: bool,
    pub fail_update: bool,
    /// Fail the n-th association call (0-based).
    pub fail_associate_at: Option<usize>,
}

#[allow(dead_code)]
impl InMemoryStore {
    pub fn with_deals(deals: Vec<CrmObject>) -> Self {
        Self {
            deals,
            ..Default::default()
        }
    }

    /// Serve at most `n` deals per page regardless of the requested limit.
    pub fn page_size(mut self, n: usize) -> Self {
        self.page_size_cap = Some(n);
        self
    }

    pub fn seed_record(&self, properties: &[(&str, &str)]) -> String {
        let mut state = self.state.lock().unwrap();
        let id = next_id(&mut state);
        state.records.push(CrmObject {
            id: id.clone(),
            properties: properties
                .iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect(),
            created_at: Some(Utc::now()),
            updated_at: None,
            archived: Some(false),
        });
        id
    }

    pub fn records(&self) -> Vec<CrmObject> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn records_for_date(&self, date: &str) -> Vec<CrmObject> {
        self.records()
            .into_iter()
            .filter(|r| r.property("date") == Some(date))
            .collect()
    }

    pub fn associations(&self) -> Vec<Association> {
        self.state.lock().unwrap().associations.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn list_limits(&self) -> Vec<u32> {
        self.state.lock().unwrap().list_limits.clone()
    }

    pub fn searches(&self) -> Vec<SearchRequest> {
        self.state.lock().unwrap().searches.clone()
    }
}

fn next_id(state: &mut StoreState) -> String {
    state.next_id += 1;
    format!("{}", 9000 + state.next_id)
}

fn injected(op: &str) -> StoreError {
    StoreError::Status {
        status: 500,
        body: format!("injected {op} failure"),
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list_page(
        &self,
        object_type: &str,
        limit: u32,
        after: Option<&str>,
        _properties: &[&str],
    ) -> Result<Page, StoreError> {
        let mut state = self.state.lock().unwrap();
        let page_index = state.list_limits.len();
        state.calls.push(format!("list {object_type}"));
        state.list_limits.push(limit);

        if self.fail_list_at_page == Some(page_index) {
            return Err(injected("list"));
        }

        let start: usize = match after {
            Some(cursor) => cursor
                .parse()
                .map_err(|_| StoreError::Unexpected(format!("bad cursor {cursor}")))?,
            None => 0,
        };
        let size = self
            .page_size_cap
            .map_or(limit as usize, |cap| cap.min(limit as usize));
        let end = (start + size).min(self.deals.len());
        let results = self.deals[start.min(end)..end].to_vec();

        let paging = (end < self.deals.len()).then(|| Paging {
            next: Some(NextPage {
                after: end.to_string(),
                link: None,
            }),
        });

        Ok(Page { results, paging })
    }

    async fn search(
        &self,
        object_type: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("search {object_type}"));
        state.searches.push(request.clone());

        if self.fail_search {
            return Err(injected("search"));
        }

        let mut matches: Vec<CrmObject> = state
            .records
            .iter()
            .filter(|r| {
                request.filter_groups.iter().any(|group| {
                    group.filters.iter().all(|f| {
                        f.operator == FilterOperator::Eq
                            && r.property(&f.property_name) == Some(f.value.as_str())
                    })
                })
            })
            .cloned()
            .collect();

        // Newest first; insertion order stands in for createdate.
        matches.reverse();
        let total = matches.len() as u64;
        matches.truncate(request.limit as usize);

        Ok(SearchResponse {
            total,
            results: matches,
            paging: None,
        })
    }

    async fn create(
        &self,
        object_type: &str,
        properties: &PropertyMap,
    ) -> Result<CrmObject, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create {object_type}"));

        if self.fail_create {
            return Err(injected("create"));
        }

        let id = next_id(&mut state);
        let record = CrmObject {
            id,
            properties: to_stored(properties),
            created_at: Some(Utc::now()),
            updated_at: None,
            archived: Some(false),
        };
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        object_type: &str,
        id: &str,
        properties: &PropertyMap,
    ) -> Result<CrmObject, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("update {object_type} {id}"));

        if self.fail_update {
            return Err(injected("update"));
        }

        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::Status {
                status: 404,
                body: format!("object {id} not found"),
            })?;
        record.properties.extend(to_stored(properties));
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn associate(
        &self,
        from_type: &str,
        from_id: &str,
        kind: &str,
        to_type: &str,
        to_id: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let attempt = state
            .calls
            .iter()
            .filter(|c| c.starts_with("associate"))
            .count();
        state.calls.push(format!("associate {from_id} {to_id}"));

        if self.fail_associate_at == Some(attempt) {
            return Err(injected("associate"));
        }

        state.associations.push(Association {
            from_type: from_type.into(),
            from_id: from_id.into(),
            kind: kind.into(),
            to_type: to_type.into(),
            to_id: to_id.into(),
        });
        Ok(())
    }
}

fn to_stored(properties: &PropertyMap) -> BTreeMap<String, Option<String>> {
    properties
        .iter()
        .map(|(k, v)| (k.clone(), Some(v.clone())))
        .collect()
}

/// Build a deal as the list endpoint returns it.
#[allow(dead_code)]
pub fn deal(id: &str, pipeline: &str, amount: Option<&str>, close: DateTime<Utc>) -> CrmObject {
    let mut properties = BTreeMap::new();
    properties.insert("pipeline".to_string(), Some(pipeline.to_string()));
    properties.insert("amount".to_string(), amount.map(str::to_string));
    properties.insert(
        "closedate".to_string(),
        Some(close.timestamp_millis().to_string()),
    );
    CrmObject {
        id: id.into(),
        properties,
        created_at: None,
        updated_at: None,
        archived: Some(false),
    }
}

/// Fixed run time used across the integration tests.
#[allow(dead_code)]
pub fn run_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 5, 14, 30, 0).unwrap()
}
