use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::sync::models::{Item, ItemFilter, ItemId, RecordId, RecordRef};

use super::StudyService;

/// Default WaniKani API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.wanikani.com/v2";

/// API revision this client was written against
pub const API_REVISION: &str = "20170710";

/// Subject ids per study material lookup, keeping URLs short
const SUBJECT_IDS_PER_REQUEST: usize = 100;

/// WaniKani client for interacting with the WaniKani API
#[derive(Debug)]
pub struct WaniKani {
    /// HTTP client for API requests
    client: Client,
    /// Personal API token
    api_token: String,
    /// API base URL
    endpoint: String,
}

/// Paginated collection response
#[derive(Debug, Deserialize)]
pub struct Collection<T> {
    /// Resources on this page
    pub data: Vec<Resource<T>>,
    /// Pagination links
    #[serde(default)]
    pub pages: Pages,
}

/// Pagination links of a collection
#[derive(Debug, Default, Deserialize)]
pub struct Pages {
    /// URL of the next page, absent on the last page
    #[serde(default)]
    pub next_url: Option<String>,
}

/// A single resource
#[derive(Debug, Deserialize)]
pub struct Resource<T> {
    /// Resource id
    pub id: u64,
    /// Resource payload
    pub data: T,
}

/// Subject payload, reduced to the fields the sync needs
#[derive(Debug, Deserialize)]
pub struct SubjectData {
    /// Level the subject belongs to
    pub level: u32,
    /// Meanings of the subject
    #[serde(default)]
    pub meanings: Vec<Meaning>,
    /// Set when the subject was removed from the curriculum
    #[serde(default)]
    pub hidden_at: Option<String>,
}

/// A subject meaning
#[derive(Debug, Deserialize)]
pub struct Meaning {
    pub meaning: String,
    pub primary: bool,
}

/// Study material payload
#[derive(Debug, Deserialize)]
pub struct StudyMaterialData {
    /// Subject the study material belongs to
    pub subject_id: u64,
    /// User-defined meaning synonyms
    #[serde(default)]
    pub meaning_synonyms: Vec<String>,
}

/// Body of study material create and update requests
#[derive(Debug, Serialize)]
pub struct StudyMaterialRequest<'a> {
    study_material: StudyMaterialFields<'a>,
}

#[derive(Debug, Serialize)]
struct StudyMaterialFields<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_id: Option<u64>,
    meaning_synonyms: &'a [String],
}

impl<'a> StudyMaterialRequest<'a> {
    /// Body for creating a study material
    pub fn create(item_id: ItemId, synonyms: &'a [String]) -> Self {
        Self {
            study_material: StudyMaterialFields {
                subject_id: Some(item_id.0),
                meaning_synonyms: synonyms,
            },
        }
    }

    /// Body for updating a study material
    pub fn update(synonyms: &'a [String]) -> Self {
        Self {
            study_material: StudyMaterialFields {
                subject_id: None,
                meaning_synonyms: synonyms,
            },
        }
    }
}

impl WaniKani {
    /// Create a new WaniKani client
    pub fn new(api_token: impl Into<String>) -> Self {
        Self::new_with_config(api_token, DEFAULT_ENDPOINT, 30)
    }

    /// Create a new WaniKani client with configuration
    pub fn new_with_config(api_token: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_token: api_token.into(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// URL listing the subjects matching `filter`
    pub fn subjects_url(&self, filter: &ItemFilter) -> Result<Url, ProviderError> {
        let mut params = vec![("types", filter.subject_type.clone())];
        if !filter.levels.is_empty() {
            params.push(("levels", join_ids(filter.levels.iter())));
        }
        Url::parse_with_params(&format!("{}/subjects", self.endpoint), &params)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid subjects URL: {}", e)))
    }

    /// URL listing the study materials of `item_ids`
    pub fn study_materials_url(&self, item_ids: &[ItemId]) -> Result<Url, ProviderError> {
        Url::parse_with_params(
            &format!("{}/study_materials", self.endpoint),
            &[("subject_ids", join_ids(item_ids.iter().map(|id| id.0)))],
        )
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid study materials URL: {}", e)))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_token)
            .header("Wanikani-Revision", API_REVISION)
    }

    /// Send a request and parse its JSON body
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ProviderError> {
        let response = self.authorize(builder).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(error_for_status(status, error_text));
        }

        response.json::<T>().await.map_err(ProviderError::from)
    }

    /// Fetch every page of a collection
    async fn get_collection<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<Resource<T>>, ProviderError> {
        let mut resources = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(url) = next {
            debug!("GET {}", url);
            let page: Collection<T> = self.send(self.client.get(&url)).await?;
            resources.extend(page.data);
            next = page.pages.next_url;
        }

        Ok(resources)
    }
}

/// Map a non-success status to a provider error
pub fn error_for_status(status: StatusCode, message: String) -> ProviderError {
    match status.as_u16() {
        401 => ProviderError::AuthenticationError(message),
        429 => ProviderError::RateLimitExceeded(message),
        status_code => ProviderError::ApiError { status_code, message },
    }
}

fn join_ids<T: ToString>(ids: impl Iterator<Item = T>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

/// Primary meaning of a subject
pub fn primary_meaning(subject: &SubjectData) -> Option<&str> {
    subject
        .meanings
        .iter()
        .find(|m| m.primary)
        .or_else(|| subject.meanings.first())
        .map(|m| m.meaning.as_str())
}

/// Convert a study material resource to a record reference
pub fn to_record(resource: Resource<StudyMaterialData>) -> RecordRef {
    RecordRef {
        id: RecordId(resource.id),
        item_id: ItemId(resource.data.subject_id),
        synonyms: resource.data.meaning_synonyms,
    }
}

/// Join subjects with their study materials
///
/// Hidden subjects and subjects without any meaning are left out.
pub fn build_items(subjects: Vec<Resource<SubjectData>>, records: &HashMap<ItemId, RecordRef>) -> Vec<Item> {
    subjects
        .into_iter()
        .filter(|subject| subject.data.hidden_at.is_none())
        .filter_map(|subject| {
            let id = ItemId(subject.id);
            let Some(label) = primary_meaning(&subject.data) else {
                warn!("Subject {} has no meaning, skipping", id);
                return None;
            };
            Some(Item {
                id,
                label: label.to_string(),
                current_synonyms: records.get(&id).map(|r| r.synonyms.clone()).unwrap_or_default(),
                level: subject.data.level,
            })
        })
        .collect()
}

#[async_trait]
impl StudyService for WaniKani {
    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, ProviderError> {
        let subjects: Vec<Resource<SubjectData>> = self.get_collection(self.subjects_url(filter)?).await?;
        debug!("Fetched {} {} subjects", subjects.len(), filter.subject_type);

        let ids: Vec<ItemId> = subjects.iter().map(|s| ItemId(s.id)).collect();
        let records = self.list_existing_records(&ids).await?;

        Ok(build_items(subjects, &records))
    }

    async fn list_existing_records(
        &self,
        item_ids: &[ItemId],
    ) -> Result<HashMap<ItemId, RecordRef>, ProviderError> {
        let mut records = HashMap::new();

        for chunk in item_ids.chunks(SUBJECT_IDS_PER_REQUEST) {
            let materials: Vec<Resource<StudyMaterialData>> =
                self.get_collection(self.study_materials_url(chunk)?).await?;
            for material in materials {
                let record = to_record(material);
                records.insert(record.item_id, record);
            }
        }

        Ok(records)
    }

    async fn create_record(&self, item_id: ItemId, synonyms: &[String]) -> Result<RecordRef, ProviderError> {
        let url = format!("{}/study_materials", self.endpoint);
        let resource: Resource<StudyMaterialData> = self
            .send(self.client.post(&url).json(&StudyMaterialRequest::create(item_id, synonyms)))
            .await?;
        Ok(to_record(resource))
    }

    async fn update_record(&self, record_id: RecordId, synonyms: &[String]) -> Result<RecordRef, ProviderError> {
        let url = format!("{}/study_materials/{}", self.endpoint, record_id);
        let resource: Resource<StudyMaterialData> = self
            .send(self.client.put(&url).json(&StudyMaterialRequest::update(synonyms)))
            .await?;
        Ok(to_record(resource))
    }

    fn has_credentials(&self) -> bool {
        !self.api_token.trim().is_empty()
    }
}
