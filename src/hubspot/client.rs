use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::store::{RecordStore, StoreError};
use super::types::{CrmObject, ObjectInput, Page, PropertyMap, SearchRequest, SearchResponse};

pub const HUBSPOT_API_BASE: &str = "https://api.hubapi.com";

/// HubSpot CRM REST client authenticated with a private app access token.
#[derive(Debug, Clone)]
pub struct HubSpotClient {
    http: Client,
    access_token: String,
    base_url: String,
}

impl HubSpotClient {
    pub fn new(http: Client, access_token: String) -> Self {
        Self {
            http,
            access_token,
            base_url: HUBSPOT_API_BASE.into(),
        }
    }

    /// Build a client with its own connection pool and request timeout.
    pub fn from_parts(
        base_url: &str,
        access_token: String,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(http, access_token).with_base_url(base_url))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn objects_url(&self, object_type: &str) -> String {
        format!("{}/crm/v3/objects/{}", self.base_url, object_type)
    }

    fn association_url(
        &self,
        from_type: &str,
        from_id: &str,
        kind: &str,
        to_type: &str,
        to_id: &str,
    ) -> String {
        format!(
            "{}/crm/v4/objects/{}/{}/associations/{}/{}/{}",
            self.base_url, from_type, from_id, kind, to_type, to_id
        )
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.access_token)
    }
}

/// Turn a non-2xx response into `StoreError::Status`, keeping the body for
/// diagnostics (HubSpot puts the validation message there).
async fn check_status(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Check the status and decode a JSON body. A 2xx whose body does not match
/// the expected shape is `StoreError::Unexpected`.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, StoreError> {
    let body = check_status(resp).await?.text().await?;
    serde_json::from_str(&body).map_err(|e| StoreError::Unexpected(format!("{e}: {body}")))
}

#[async_trait]
impl RecordStore for HubSpotClient {
    async fn list_page(
        &self,
        object_type: &str,
        limit: u32,
        after: Option<&str>,
        properties: &[&str],
    ) -> Result<Page, StoreError> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        if let Some(cursor) = after {
            query.push(("after", cursor.to_string()));
        }
        if !properties.is_empty() {
            query.push(("properties", properties.join(",")));
        }

        let resp = self
            .authorized(self.http.get(self.objects_url(object_type)))
            .query(&query)
            .send()
            .await?;

        let page: Page = decode(resp).await?;
        Ok(page)
    }

    async fn search(
        &self,
        object_type: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        let url = format!("{}/search", self.objects_url(object_type));
        let resp = self
            .authorized(self.http.post(&url))
            .json(request)
            .send()
            .await?;

        let found: SearchResponse = decode(resp).await?;
        Ok(found)
    }

    async fn create(
        &self,
        object_type: &str,
        properties: &PropertyMap,
    ) -> Result<CrmObject, StoreError> {
        let resp = self
            .authorized(self.http.post(self.objects_url(object_type)))
            .json(&ObjectInput { properties })
            .send()
            .await?;

        let created: CrmObject = decode(resp).await?;
        Ok(created)
    }

    async fn update(
        &self,
        object_type: &str,
        id: &str,
        properties: &PropertyMap,
    ) -> Result<CrmObject, StoreError> {
        let url = format!("{}/{}", self.objects_url(object_type), id);
        let resp = self
            .authorized(self.http.patch(&url))
            .json(&ObjectInput { properties })
            .send()
            .await?;

        let updated: CrmObject = decode(resp).await?;
        Ok(updated)
    }

    async fn associate(
        &self,
        from_type: &str,
        from_id: &str,
        kind: &str,
        to_type: &str,
        to_id: &str,
    ) -> Result<(), StoreError> {
        let url = self.association_url(from_type, from_id, kind, to_type, to_id);
        let resp = self.authorized(self.http.put(&url)).send().await?;
        check_status(resp).await?;
        Ok(())
    }
}
