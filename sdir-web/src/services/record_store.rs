//! Record store boundary
//!
//! All persistence is delegated to an external managed document database;
//! this module is a thin client over its REST surface. An in-memory
//! variant backs zero-config startup and tests. No caching: every search
//! re-fetches the full record set and failures propagate verbatim.

use sdir_common::model::StudentRecord;
use sdir_common::{Error, Result};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

const COLLECTION: &str = "students";
const USER_AGENT: &str = concat!("sdir/", env!("CARGO_PKG_VERSION"));
const SERVICE: &str = "record store";

/// Enum-dispatched record store backend
pub enum RecordStore {
    Firestore(FirestoreStore),
    Memory(MemoryStore),
}

impl RecordStore {
    /// Store the record and return it with its assigned id
    pub async fn create(&self, record: StudentRecord) -> Result<StudentRecord> {
        match self {
            RecordStore::Firestore(store) => store.create(record).await,
            RecordStore::Memory(store) => store.create(record).await,
        }
    }

    /// Fetch the full record set in the store's natural order
    pub async fn list_all(&self) -> Result<Vec<StudentRecord>> {
        match self {
            RecordStore::Firestore(store) => store.list_all().await,
            RecordStore::Memory(store) => store.list_all().await,
        }
    }

    /// Fetch one record by id, or NotFound
    pub async fn get(&self, id: &str) -> Result<StudentRecord> {
        match self {
            RecordStore::Firestore(store) => store.get(id).await,
            RecordStore::Memory(store) => store.get(id).await,
        }
    }

    /// Replace the stored record; the id is immutable
    pub async fn update(&self, id: &str, record: StudentRecord) -> Result<StudentRecord> {
        match self {
            RecordStore::Firestore(store) => store.update(id, record).await,
            RecordStore::Memory(store) => store.update(id, record).await,
        }
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        match self {
            RecordStore::Firestore(store) => store.delete(id).await,
            RecordStore::Memory(store) => store.delete(id).await,
        }
    }
}

// ============================================================================
// Firestore REST client
// ============================================================================

/// Client for the managed document database's REST surface
pub struct FirestoreStore {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: String,
}

impl FirestoreStore {
    pub fn new(base_url: String, project_id: String, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::external(SERVICE, e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            project_id,
            api_key,
        })
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, COLLECTION
        )
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url(), id)
    }

    async fn create(&self, record: StudentRecord) -> Result<StudentRecord> {
        let body = json!({ "fields": to_fields(&record) });
        let response = self
            .http
            .post(self.collection_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, e.to_string()))?;

        let document = check_response(response).await?;
        from_document(&document)
    }

    async fn list_all(&self) -> Result<Vec<StudentRecord>> {
        let response = self
            .http
            .get(self.collection_url())
            .query(&[("key", self.api_key.as_str()), ("pageSize", "300")])
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, e.to_string()))?;

        let body = check_response(response).await?;
        let documents = match body.get("documents").and_then(Value::as_array) {
            Some(documents) => documents,
            // An empty collection comes back with no documents key at all
            None => return Ok(Vec::new()),
        };

        debug!(count = documents.len(), "Fetched record snapshot");
        documents.iter().map(from_document).collect()
    }

    async fn get(&self, id: &str) -> Result<StudentRecord> {
        let response = self
            .http
            .get(self.document_url(id))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("student {id}")));
        }
        let document = check_response(response).await?;
        from_document(&document)
    }

    async fn update(&self, id: &str, record: StudentRecord) -> Result<StudentRecord> {
        let body = json!({ "fields": to_fields(&record) });
        let response = self
            .http
            .patch(self.document_url(id))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("student {id}")));
        }
        let document = check_response(response).await?;
        from_document(&document)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.document_url(id))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("student {id}")));
        }
        check_response(response).await?;
        Ok(())
    }
}

/// Surface non-success statuses as external-service failures, else parse JSON
async fn check_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(Error::external(
            SERVICE,
            format!("HTTP {}: {}", status.as_u16(), text),
        ));
    }
    response
        .json()
        .await
        .map_err(|e| Error::external(SERVICE, e.to_string()))
}

/// Convert a record to the store's typed field encoding
fn to_fields(record: &StudentRecord) -> Value {
    let mut fields = serde_json::Map::new();
    fields.insert("name".into(), json!({ "stringValue": record.name }));
    fields.insert(
        "studentId".into(),
        json!({ "stringValue": record.student_id }),
    );
    fields.insert(
        "department".into(),
        json!({ "stringValue": record.department.as_str() }),
    );
    // Integers travel as strings in the document encoding
    fields.insert(
        "admissionYear".into(),
        json!({ "integerValue": record.admission_year.to_string() }),
    );
    let courses: Vec<Value> = record
        .courses
        .iter()
        .map(|c| json!({ "stringValue": c.as_str() }))
        .collect();
    fields.insert(
        "courses".into(),
        json!({ "arrayValue": { "values": courses } }),
    );
    if let Some(hobby) = &record.hobby {
        fields.insert("hobby".into(), json!({ "stringValue": hobby }));
    }
    if let Some(self_intro) = &record.self_intro {
        fields.insert("selfIntro".into(), json!({ "stringValue": self_intro }));
    }
    if let Some(avatar_url) = &record.avatar_url {
        fields.insert("avatarUrl".into(), json!({ "stringValue": avatar_url }));
    }
    if let Some(owner_ref) = &record.owner_ref {
        fields.insert("uid".into(), json!({ "stringValue": owner_ref }));
    }
    Value::Object(fields)
}

/// Convert a stored document back into a record
fn from_document(document: &Value) -> Result<StudentRecord> {
    let fields = document
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::external(SERVICE, "document without fields".to_string()))?;

    // The document resource name ends in the assigned id
    let id = document
        .get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.rsplit('/').next())
        .map(str::to_string);

    let string_field = |key: &str| -> Option<String> {
        fields
            .get(key)
            .and_then(|v| v.get("stringValue"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let name = string_field("name")
        .ok_or_else(|| Error::external(SERVICE, "document missing name".to_string()))?;
    let admission_year = fields
        .get("admissionYear")
        .and_then(|v| v.get("integerValue"))
        .and_then(Value::as_str)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let courses = fields
        .get("courses")
        .and_then(|v| v.get("arrayValue"))
        .and_then(|v| v.get("values"))
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.get("stringValue").and_then(Value::as_str))
                .map(|s| s.to_string().into())
                .collect()
        })
        .unwrap_or_default();

    Ok(StudentRecord {
        id,
        name,
        student_id: string_field("studentId").unwrap_or_default(),
        department: string_field("department").unwrap_or_default().into(),
        admission_year,
        courses,
        hobby: string_field("hobby"),
        self_intro: string_field("selfIntro"),
        avatar_url: string_field("avatarUrl"),
        owner_ref: string_field("uid"),
    })
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory record store: zero-config default and test double
pub struct MemoryStore {
    records: RwLock<Vec<StudentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    async fn create(&self, mut record: StudentRecord) -> Result<StudentRecord> {
        record.id = Some(Uuid::new_v4().to_string());
        let mut records = self.records.write().await;
        records.push(record.clone());
        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<StudentRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<StudentRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("student {id}")))
    }

    async fn update(&self, id: &str, mut record: StudentRecord) -> Result<StudentRecord> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| Error::NotFound(format!("student {id}")))?;
        record.id = Some(id.to_string());
        *slot = record.clone();
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id.as_deref() != Some(id));
        if records.len() == before {
            return Err(Error::NotFound(format!("student {id}")));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdir_common::model::{Course, Department};

    fn record(name: &str) -> StudentRecord {
        StudentRecord {
            id: None,
            name: name.to_string(),
            student_id: "B0001".to_string(),
            department: Department::Management,
            admission_year: 2022,
            courses: vec![Course::IntroToManagement],
            hobby: None,
            self_intro: Some("こんにちは".to_string()),
            avatar_url: None,
            owner_ref: Some("uid-1".to_string()),
        }
    }

    #[tokio::test]
    async fn memory_store_assigns_ids_and_round_trips() {
        let store = MemoryStore::new();
        let created = store.create(record("田中太郎")).await.unwrap();
        let id = created.id.clone().expect("assigned id");

        let fetched = store.get(&id).await.unwrap();
        assert_eq!(fetched, created);

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn memory_store_update_keeps_id_immutable() {
        let store = MemoryStore::new();
        let created = store.create(record("田中太郎")).await.unwrap();
        let id = created.id.clone().unwrap();

        let mut changed = created.clone();
        changed.id = Some("attempted-override".to_string());
        changed.name = "田中次郎".to_string();
        let updated = store.update(&id, changed).await.unwrap();

        assert_eq!(updated.id.as_deref(), Some(id.as_str()));
        assert_eq!(updated.name, "田中次郎");
    }

    #[tokio::test]
    async fn memory_store_missing_id_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("nope").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.delete("nope").await,
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn document_encoding_round_trips() {
        let original = record("田中太郎");
        let mut document = json!({
            "name": "projects/p/databases/(default)/documents/students/doc-123",
        });
        document["fields"] = to_fields(&original);

        let decoded = from_document(&document).unwrap();
        assert_eq!(decoded.id.as_deref(), Some("doc-123"));
        assert_eq!(decoded.name, original.name);
        assert_eq!(decoded.department, original.department);
        assert_eq!(decoded.admission_year, original.admission_year);
        assert_eq!(decoded.courses, original.courses);
        assert_eq!(decoded.self_intro, original.self_intro);
        assert_eq!(decoded.owner_ref, original.owner_ref);
    }

    #[test]
    fn unknown_enum_values_decode_as_non_matching() {
        let document = json!({
            "name": "projects/p/databases/(default)/documents/students/doc-9",
            "fields": {
                "name": { "stringValue": "誰か" },
                "department": { "stringValue": "文学部" },
                "admissionYear": { "integerValue": "2020" },
                "courses": { "arrayValue": { "values": [
                    { "stringValue": "未知の授業" }
                ] } },
            }
        });

        let decoded = from_document(&document).unwrap();
        assert_eq!(decoded.department, Department::Unknown);
        assert_eq!(decoded.courses, vec![Course::Unknown]);
    }
}
