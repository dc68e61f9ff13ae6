//! In-memory collaborator doubles for tests.
//!
//! Compiled for this crate's unit tests and, through the `test-support`
//! feature, for integration tests of downstream crates.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::media::{ImageStore, ImageStoreError, UploadFile};
use crate::notify::{NotifyError, SearchNotifier};
use crate::property::{Dwelling, NewProperty, OperationType, Property, PropertyImage};
use crate::site::SitemapEntry;
use crate::store::{PageRequest, PropertyFilter, PropertyStore, StoreError, UniqueField};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Image whose URL is `url/<name>` and object id `obj/<name>`.
pub fn image(name: &str) -> PropertyImage {
    PropertyImage {
        url: format!("url/{name}"),
        object_id: format!("obj/{name}"),
    }
}

/// A small non-empty upload named `filename`.
pub fn upload(filename: &str) -> UploadFile {
    UploadFile {
        filename: filename.to_string(),
        content_type: Some("image/jpeg".to_string()),
        data: b"\xFF\xD8\xFFimage".to_vec(),
    }
}

/// A complete record with a dwelling, services and one image.
pub fn sample_property(id: DbId, title: &str) -> Property {
    let now = Utc::now();
    Property {
        id,
        ref_code: format!("BARR-2024-TEST{id:02}"),
        slug: Some(crate::slug::slugify(title)),
        title: title.to_string(),
        description: Some("Campo con casco".to_string()),
        operation_type: OperationType::Sale,
        price: Some(1000.0),
        measure: 120.0,
        location: "San José, Entre Ríos".to_string(),
        lat: Some(-32.2),
        lng: Some(-58.2),
        property_type: None,
        services: vec!["Agua".to_string()],
        extras: vec!["Vivienda".to_string()],
        dwelling: Dwelling {
            environments: Some(4),
            environments_list: vec!["Cocina".to_string()],
            bedrooms: Some(2),
            bathrooms: Some(1),
            condition: Some("Bueno".to_string()),
            age: Some("10 años".to_string()),
            house_measures: Some(90.0),
        },
        images: vec![image("A")],
        video_urls: Vec::new(),
        keywords: vec!["stale".to_string()],
        created_at: now,
        updated_at: now,
    }
}

// ---------------------------------------------------------------------------
// Call log
// ---------------------------------------------------------------------------

/// Ordered log of side effects shared between doubles, so a test can assert
/// the order of calls made to different collaborators.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    fn push(&self, event: impl Into<String>) {
        self.0.lock().expect("event log mutex poisoned").push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().expect("event log mutex poisoned").clone()
    }
}

// ---------------------------------------------------------------------------
// Property store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    records: Vec<Property>,
    next_id: DbId,
    every_ref_taken: bool,
    ref_lookups: usize,
    unavailable: bool,
    injected_create_conflicts: VecDeque<UniqueField>,
    saves: usize,
    log: Option<EventLog>,
}

/// Property store backed by a vector. Enforces ref/slug uniqueness the way
/// the database does.
#[derive(Default)]
pub struct MemoryPropertyStore {
    state: Mutex<StoreState>,
}

impl MemoryPropertyStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().expect("store mutex poisoned")
    }

    /// Insert a record directly, bypassing uniqueness checks.
    pub fn insert(&self, mut property: Property) -> DbId {
        let mut state = self.lock();
        state.next_id += 1;
        if property.id == 0 {
            property.id = state.next_id;
        }
        let id = property.id;
        state.records.push(property);
        id
    }

    /// Insert a sample record with the given ref and slug.
    pub fn insert_fixture(&self, ref_code: &str, slug: Option<&str>) -> DbId {
        let mut property = sample_property(0, "Fixture");
        property.ref_code = ref_code.to_string();
        property.slug = slug.map(str::to_string);
        self.insert(property)
    }

    pub fn get(&self, id: DbId) -> Option<Property> {
        self.lock().records.iter().find(|p| p.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every `ref_exists` lookup report a collision.
    pub fn set_every_ref_taken(&self, taken: bool) {
        self.lock().every_ref_taken = taken;
    }

    pub fn ref_lookup_count(&self) -> usize {
        self.lock().ref_lookups
    }

    /// Make every call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Make the next `create` fail with a unique violation on `field`, as if
    /// a concurrent writer took the identifier between lookup and insert.
    pub fn inject_create_conflict(&self, field: UniqueField) {
        self.lock().injected_create_conflicts.push_back(field);
    }

    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// Record `store:save` and `store:delete` into `log`.
    pub fn record_into(&self, log: EventLog) {
        self.lock().log = Some(log);
    }

    fn check_available(state: &StoreState) -> Result<(), StoreError> {
        if state.unavailable {
            Err(StoreError::Unavailable("memory store offline".into()))
        } else {
            Ok(())
        }
    }

    fn check_unique(
        state: &StoreState,
        ref_code: &str,
        slug: Option<&str>,
        id: Option<DbId>,
    ) -> Result<(), StoreError> {
        let others = state.records.iter().filter(|p| Some(p.id) != id);
        for other in others {
            if other.ref_code == ref_code {
                return Err(StoreError::UniqueViolation(UniqueField::Ref));
            }
            if slug.is_some() && other.slug.as_deref() == slug {
                return Err(StoreError::UniqueViolation(UniqueField::Slug));
            }
        }
        Ok(())
    }

    fn matches(property: &Property, filter: &PropertyFilter) -> bool {
        if let Some(op) = filter.operation_type {
            if property.operation_type != op {
                return false;
            }
        }
        match filter.search.as_deref().map(str::to_lowercase) {
            Some(needle) => [
                Some(property.ref_code.as_str()),
                Some(property.title.as_str()),
                Some(property.location.as_str()),
                property.description.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle)),
            None => true,
        }
    }
}

#[async_trait]
impl PropertyStore for MemoryPropertyStore {
    async fn find(
        &self,
        filter: &PropertyFilter,
        page: PageRequest,
    ) -> Result<Vec<Property>, StoreError> {
        let state = self.lock();
        Self::check_available(&state)?;
        let mut matching: Vec<Property> = state
            .records
            .iter()
            .filter(|p| Self::matches(p, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .collect())
    }

    async fn count(&self, filter: &PropertyFilter) -> Result<i64, StoreError> {
        let state = self.lock();
        Self::check_available(&state)?;
        Ok(state.records.iter().filter(|p| Self::matches(p, filter)).count() as i64)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Property>, StoreError> {
        let state = self.lock();
        Self::check_available(&state)?;
        Ok(state.records.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Property>, StoreError> {
        let state = self.lock();
        Self::check_available(&state)?;
        Ok(state
            .records
            .iter()
            .find(|p| p.slug.as_deref() == Some(slug))
            .cloned())
    }

    async fn ref_exists(&self, ref_code: &str) -> Result<bool, StoreError> {
        let mut state = self.lock();
        Self::check_available(&state)?;
        state.ref_lookups += 1;
        Ok(state.every_ref_taken || state.records.iter().any(|p| p.ref_code == ref_code))
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<DbId>) -> Result<bool, StoreError> {
        let state = self.lock();
        Self::check_available(&state)?;
        Ok(state
            .records
            .iter()
            .any(|p| p.slug.as_deref() == Some(slug) && Some(p.id) != exclude_id))
    }

    async fn create(&self, input: &NewProperty) -> Result<Property, StoreError> {
        let mut state = self.lock();
        Self::check_available(&state)?;
        if let Some(field) = state.injected_create_conflicts.pop_front() {
            return Err(StoreError::UniqueViolation(field));
        }
        Self::check_unique(&state, &input.ref_code, Some(&input.slug), None)?;

        state.next_id += 1;
        let now = Utc::now();
        let property = Property {
            id: state.next_id,
            ref_code: input.ref_code.clone(),
            slug: Some(input.slug.clone()),
            title: input.title.clone(),
            description: input.description.clone(),
            operation_type: input.operation_type,
            price: input.price,
            measure: input.measure,
            location: input.location.clone(),
            lat: input.lat,
            lng: input.lng,
            property_type: input.property_type.clone(),
            services: input.services.clone(),
            extras: input.extras.clone(),
            dwelling: input.dwelling.clone(),
            images: input.images.clone(),
            video_urls: input.video_urls.clone(),
            keywords: input.keywords.clone(),
            created_at: now,
            updated_at: now,
        };
        state.records.push(property.clone());
        Ok(property)
    }

    async fn save(&self, property: &Property) -> Result<Property, StoreError> {
        let mut state = self.lock();
        Self::check_available(&state)?;
        Self::check_unique(
            &state,
            &property.ref_code,
            property.slug.as_deref(),
            Some(property.id),
        )?;

        let mut saved = property.clone();
        saved.updated_at = Utc::now();
        let slot = state
            .records
            .iter_mut()
            .find(|p| p.id == property.id)
            .ok_or(StoreError::Missing(property.id))?;
        *slot = saved.clone();
        state.saves += 1;
        if let Some(log) = &state.log {
            log.push("store:save");
        }
        Ok(saved)
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        let mut state = self.lock();
        Self::check_available(&state)?;
        if let Some(log) = &state.log {
            log.push("store:delete");
        }
        let before = state.records.len();
        state.records.retain(|p| p.id != id);
        Ok(state.records.len() < before)
    }

    async fn sitemap_entries(&self) -> Result<Vec<SitemapEntry>, StoreError> {
        let state = self.lock();
        Self::check_available(&state)?;
        let mut entries: Vec<SitemapEntry> = state
            .records
            .iter()
            .map(|p| SitemapEntry {
                id: p.id,
                slug: p.slug.clone(),
                last_modified: p.updated_at,
            })
            .collect();
        entries.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(entries)
    }

    async fn list_all(&self) -> Result<Vec<Property>, StoreError> {
        let state = self.lock();
        Self::check_available(&state)?;
        Ok(state.records.clone())
    }
}

// ---------------------------------------------------------------------------
// Image store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ImageState {
    uploaded: Vec<String>,
    delete_attempts: Vec<String>,
    deleted: Vec<String>,
    failing_uploads: HashSet<String>,
    fail_deletes: bool,
    log: Option<EventLog>,
}

/// Image store that records calls. Uploads get URL `mem://<filename>` and
/// object id `mem/<filename>`.
#[derive(Default)]
pub struct MemoryImageStore {
    state: Mutex<ImageState>,
}

impl MemoryImageStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, ImageState> {
        self.state.lock().expect("image store mutex poisoned")
    }

    pub fn fail_uploads_named(&self, filename: &str) {
        self.lock().failing_uploads.insert(filename.to_string());
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.lock().fail_deletes = fail;
    }

    /// Record `img:<object id>` into `log` for every delete call.
    pub fn record_into(&self, log: EventLog) {
        self.lock().log = Some(log);
    }

    /// Object ids of successful uploads, in completion order.
    pub fn uploaded(&self) -> Vec<String> {
        self.lock().uploaded.clone()
    }

    /// Object ids passed to `delete`, in call order.
    pub fn delete_attempts(&self) -> Vec<String> {
        self.lock().delete_attempts.clone()
    }

    /// Object ids successfully deleted, in call order.
    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(&self, file: &UploadFile) -> Result<PropertyImage, ImageStoreError> {
        let mut state = self.lock();
        if state.failing_uploads.contains(&file.filename) {
            return Err(ImageStoreError::Unavailable(format!(
                "refused {}",
                file.filename
            )));
        }
        let object_id = format!("mem/{}", file.filename);
        state.uploaded.push(object_id.clone());
        Ok(PropertyImage {
            url: format!("mem://{}", file.filename),
            object_id,
        })
    }

    async fn delete(&self, object_id: &str) -> Result<(), ImageStoreError> {
        let mut state = self.lock();
        state.delete_attempts.push(object_id.to_string());
        if let Some(log) = &state.log {
            log.push(format!("img:{object_id}"));
        }
        if state.fail_deletes {
            return Err(ImageStoreError::Unavailable("delete refused".into()));
        }
        state.deleted.push(object_id.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Notifier that records every URL batch it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<Vec<String>>>,
    failing: bool,
}

impl RecordingNotifier {
    /// A notifier that records calls and then reports failure.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl SearchNotifier for RecordingNotifier {
    async fn notify(&self, urls: &[String]) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .expect("notifier mutex poisoned")
            .push(urls.to_vec());
        if self.failing {
            Err(NotifyError::HttpStatus(503))
        } else {
            Ok(())
        }
    }
}
