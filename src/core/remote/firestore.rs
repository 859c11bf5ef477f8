use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::{
    auth::Identity,
    core::remote::{DocumentCollection, Document, Fields, PROJECTS_COLLECTION},
    error::{Result, StoreError},
};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_DATABASE: &str = "(default)";
const PAGE_SIZE: &str = "300";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl RawDocument {
    fn into_document(self) -> Result<Document> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::Unknown(format!("bad document name {:?}", self.name)))?
            .to_string();
        Ok(Document {
            id,
            fields: decode_fields(&self.fields)?,
        })
    }
}

/// A Firestore collection reached through the REST API.
#[derive(Debug, Clone)]
pub struct FirestoreCollection {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    database: String,
    collection: String,
    api_key: Option<String>,
}

impl FirestoreCollection {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: FIRESTORE_BASE_URL.to_string(),
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            collection: PROJECTS_COLLECTION.to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents/{}",
            self.base_url, self.project_id, self.database, self.collection
        )
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url(), id)
    }

    fn request(&self, method: Method, url: String, actor: Option<&Identity>) -> RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }
        if let Some(token) = actor.and_then(|a| a.id_token.as_deref()) {
            request = request.bearer_auth(token);
        }
        request
    }
}

async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| StoreError::Network(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| format!("HTTP {status}"));
    Err(status_error(status, message))
}

fn status_error(status: StatusCode, message: String) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Permission(message),
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            StoreError::Network(message)
        }
        _ => StoreError::Unknown(format!("{status}: {message}")),
    }
}

impl DocumentCollection for FirestoreCollection {
    async fn list_ordered(&self, order_by: &str) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![("orderBy", order_by.to_string()), ("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }
            let request = self
                .request(Method::GET, self.collection_url(), None)
                .query(&query);
            let page: ListResponse = send(request).await?.json().await?;
            for raw in page.documents {
                documents.push(raw.into_document()?);
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!(count = documents.len(), collection = %self.collection, "listed documents");
        Ok(documents)
    }

    async fn add(&self, fields: Fields, actor: &Identity) -> Result<String> {
        let request = self
            .request(Method::POST, self.collection_url(), Some(actor))
            .json(&json!({ "fields": encode_fields(&fields) }));
        let created: RawDocument = send(request).await?.json().await?;
        Ok(created.into_document()?.id)
    }

    async fn patch(&self, id: &str, fields: Fields, actor: &Identity) -> Result<()> {
        let mut query = vec![("currentDocument.exists", "true".to_string())];
        query.extend(fields.keys().map(|path| ("updateMask.fieldPaths", path.clone())));
        let request = self
            .request(Method::PATCH, self.document_url(id), Some(actor))
            .query(&query)
            .json(&json!({ "fields": encode_fields(&fields) }));
        send(request).await?;
        Ok(())
    }

    async fn remove(&self, id: &str, actor: &Identity) -> Result<()> {
        let request = self
            .request(Method::DELETE, self.document_url(id), Some(actor))
            .query(&[("currentDocument.exists", "true")]);
        send(request).await?;
        Ok(())
    }
}

/// Plain JSON to Firestore's typed value representation.
fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

fn decode_value(value: &Value) -> Result<Value> {
    let malformed = || StoreError::Unknown(format!("unsupported Firestore value {value}"));
    let Value::Object(typed) = value else {
        return Err(malformed());
    };
    let Some((kind, inner)) = typed.iter().next() else {
        return Err(malformed());
    };
    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" => Ok(inner.clone()),
        "integerValue" => match inner {
            Value::String(s) => s.parse::<i64>().map(Value::from).map_err(|_| malformed()),
            Value::Number(_) => Ok(inner.clone()),
            _ => Err(malformed()),
        },
        "arrayValue" => inner
            .get("values")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(decode_value).collect::<Result<Vec<_>>>())
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(Value::Array),
        "mapValue" => match inner.get("fields").and_then(Value::as_object) {
            Some(fields) => decode_fields(fields).map(Value::Object),
            None => Ok(Value::Object(Map::new())),
        },
        _ => Err(malformed()),
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Result<Fields> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}
