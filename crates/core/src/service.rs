//! Property reconciliation service.
//!
//! Orchestrates create, update and delete of property records: validation,
//! image reconciliation, identifier assignment, keyword derivation,
//! persistence and detached search-engine notification.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::CoreError;
use crate::form::{CreateProperty, PropertyChanges, PropertyForm};
use crate::images::ImageSetReconciler;
use crate::keywords::{generate_keywords, KeywordInput};
use crate::media::{validate_uploads, ImageStore, UploadFile};
use crate::notify::{NotificationDispatcher, SearchNotifier};
use crate::property::{NewProperty, Property, PropertyImage};
use crate::ref_code::{generate_unique_ref, DEFAULT_REF_PREFIX};
use crate::site::{normalize_base, property_url, render_robots, render_sitemap};
use crate::slug::make_unique_slug;
use crate::store::{PageRequest, PropertyFilter, PropertyStore, StoreError, UniqueField};
use crate::types::DbId;

/// Default cap on ref/slug generation attempts.
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 20;

/// Default bound on the total time of one request's uploads.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Tunables for [`PropertyService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Public site origin used to build canonical URLs.
    pub site_base_url: String,
    pub ref_prefix: String,
    pub max_generation_attempts: u32,
    pub upload_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            site_base_url: "http://localhost:3000".to_string(),
            ref_prefix: DEFAULT_REF_PREFIX.to_string(),
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }
}

/// One page of a property listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPage {
    pub properties: Vec<Property>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Create, update, delete and read properties.
///
/// Cheap to clone; collaborators are shared behind `Arc`.
#[derive(Clone)]
pub struct PropertyService {
    store: Arc<dyn PropertyStore>,
    images: ImageSetReconciler,
    notifications: NotificationDispatcher,
    config: Arc<ServiceConfig>,
}

impl PropertyService {
    pub fn new(
        store: Arc<dyn PropertyStore>,
        image_store: Arc<dyn ImageStore>,
        notifier: Arc<dyn SearchNotifier>,
        mut config: ServiceConfig,
    ) -> Self {
        config.site_base_url = normalize_base(&config.site_base_url);
        config.max_generation_attempts = config.max_generation_attempts.max(1);
        Self {
            images: ImageSetReconciler::new(image_store, config.upload_timeout),
            notifications: NotificationDispatcher::new(notifier),
            store,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &Arc<dyn PropertyStore> {
        &self.store
    }

    pub fn notifications(&self) -> &NotificationDispatcher {
        &self.notifications
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Canonical public URL of `property`.
    pub fn canonical_url(&self, property: &Property) -> String {
        property_url(
            &self.config.site_base_url,
            property.id,
            property.slug.as_deref(),
        )
    }

    fn attempts(&self) -> u32 {
        self.config.max_generation_attempts
    }

    async fn fresh_ref(&self) -> Result<String, CoreError> {
        generate_unique_ref(self.store.as_ref(), &self.config.ref_prefix, self.attempts()).await
    }

    async fn fresh_slug(&self, title: &str, current_id: Option<DbId>) -> Result<String, CoreError> {
        make_unique_slug(self.store.as_ref(), title, current_id, self.attempts()).await
    }

    async fn ensure_ref_free(&self, ref_code: &str) -> Result<(), CoreError> {
        if self.store.ref_exists(ref_code).await? {
            return Err(CoreError::Conflict(format!(
                "A property with ref '{ref_code}' already exists"
            )));
        }
        Ok(())
    }

    /// Release images uploaded for a write that was then abandoned.
    async fn discard_uploads(&self, uploaded: &[PropertyImage]) {
        if uploaded.is_empty() {
            return;
        }
        tracing::warn!(count = uploaded.len(), "Releasing images of a failed write");
        self.images.release(uploaded).await;
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Create a property from raw form fields and image files.
    ///
    /// Nothing is uploaded until every field and file has been validated.
    pub async fn create(
        &self,
        form: &PropertyForm,
        files: &[UploadFile],
    ) -> Result<Property, CoreError> {
        let input = CreateProperty::from_form(form)?;
        validate_uploads(files)?;

        let client_ref = input.ref_code.clone();
        let ref_code = match &client_ref {
            Some(r) => {
                self.ensure_ref_free(r).await?;
                r.clone()
            }
            None => self.fresh_ref().await?,
        };
        let slug = self.fresh_slug(&input.title, None).await?;

        let images = self.images.upload_all(files).await?;

        let keywords = generate_keywords(&KeywordInput {
            title: Some(&input.title),
            location: Some(&input.location),
            operation_type: Some(input.operation_type),
            measure: Some(input.measure),
            property_type: input.property_type.as_deref(),
        });

        let mut record = NewProperty {
            ref_code,
            slug,
            title: input.title,
            description: input.description,
            operation_type: input.operation_type,
            price: input.price,
            measure: input.measure,
            location: input.location,
            lat: input.lat,
            lng: input.lng,
            property_type: input.property_type,
            services: input.services,
            extras: input.extras,
            dwelling: input.dwelling,
            images,
            video_urls: input.video_urls,
            keywords,
        };

        let created = match self.insert_with_retry(&mut record, client_ref.is_some()).await {
            Ok(created) => created,
            Err(e) => {
                self.discard_uploads(&record.images).await;
                return Err(e);
            }
        };

        tracing::info!(
            property_id = created.id,
            ref_code = %created.ref_code,
            slug = ?created.slug,
            images = created.images.len(),
            "Property created"
        );
        self.notifications.schedule(vec![self.canonical_url(&created)]);
        Ok(created)
    }

    /// Insert `record`, regenerating a generated ref or slug that lost a race
    /// against a concurrent writer.
    async fn insert_with_retry(
        &self,
        record: &mut NewProperty,
        ref_is_client_supplied: bool,
    ) -> Result<Property, CoreError> {
        for attempt in 1..=self.attempts() {
            match self.store.create(record).await {
                Ok(created) => return Ok(created),
                Err(StoreError::UniqueViolation(UniqueField::Ref)) if !ref_is_client_supplied => {
                    tracing::warn!(attempt, ref_code = %record.ref_code, "Ref taken on insert, regenerating");
                    record.ref_code = self.fresh_ref().await?;
                }
                Err(StoreError::UniqueViolation(UniqueField::Slug)) => {
                    tracing::warn!(attempt, slug = %record.slug, "Slug taken on insert, regenerating");
                    record.slug = self.fresh_slug(&record.title, None).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::GenerationExhausted {
            what: "identifier",
            attempts: self.attempts(),
        })
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Apply a partial update. Omitted fields keep their stored values.
    ///
    /// Removed images are released only after the record is saved.
    pub async fn update(
        &self,
        id: DbId,
        form: &PropertyForm,
        files: &[UploadFile],
    ) -> Result<Property, CoreError> {
        let mut property = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::property_not_found(id))?;

        let changes = PropertyChanges::from_form(form)?;
        validate_uploads(files)?;

        let old_url = self.canonical_url(&property);
        let title_changed = changes.changes_title(&property.title);

        if let Some(new_ref) = &changes.ref_code {
            if *new_ref != property.ref_code {
                self.ensure_ref_free(new_ref).await?;
                property.ref_code = new_ref.clone();
            }
        }

        let existing_images = property.images.clone();
        let staged = self
            .images
            .stage(&existing_images, changes.keep_images.as_deref(), files)
            .await?;

        changes.apply_to(&mut property);
        property.images = staged.final_images;

        if title_changed || property.slug.is_none() {
            property.slug = Some(self.fresh_slug(&property.title, Some(id)).await?);
        }
        property.keywords = generate_keywords(&property.keyword_input());

        let saved = match self.save_with_retry(&mut property).await {
            Ok(saved) => saved,
            Err(e) => {
                let uploaded: Vec<PropertyImage> = property
                    .images
                    .iter()
                    .filter(|img| !existing_images.contains(img))
                    .cloned()
                    .collect();
                self.discard_uploads(&uploaded).await;
                return Err(e);
            }
        };

        self.images.release(&staged.to_delete).await;

        tracing::info!(
            property_id = saved.id,
            title_changed,
            images = saved.images.len(),
            released = staged.to_delete.len(),
            "Property updated"
        );

        let new_url = self.canonical_url(&saved);
        let mut urls = vec![new_url.clone()];
        if old_url != new_url {
            urls.push(old_url);
        }
        self.notifications.schedule(urls);
        Ok(saved)
    }

    /// Save `property`, regenerating its slug if a concurrent writer took it.
    async fn save_with_retry(&self, property: &mut Property) -> Result<Property, CoreError> {
        for attempt in 1..=self.attempts() {
            match self.store.save(property).await {
                Ok(saved) => return Ok(saved),
                Err(StoreError::UniqueViolation(UniqueField::Slug)) => {
                    tracing::warn!(attempt, slug = ?property.slug, "Slug taken on save, regenerating");
                    property.slug = Some(self.fresh_slug(&property.title, Some(property.id)).await?);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::GenerationExhausted {
            what: "slug",
            attempts: self.attempts(),
        })
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Delete a property, releasing its images first.
    pub async fn delete(&self, id: DbId) -> Result<(), CoreError> {
        let property = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::property_not_found(id))?;
        let url = self.canonical_url(&property);

        self.images.release(&property.images).await;

        if !self.store.delete(id).await? {
            return Err(CoreError::property_not_found(id));
        }

        tracing::info!(property_id = id, images = property.images.len(), "Property deleted");
        self.notifications.schedule(vec![url]);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn list(
        &self,
        filter: &PropertyFilter,
        page: PageRequest,
    ) -> Result<PropertyPage, CoreError> {
        let properties = self.store.find(filter, page).await?;
        let total = self.store.count(filter).await?;
        Ok(PropertyPage {
            properties,
            total,
            page: page.page,
            page_size: page.page_size,
        })
    }

    /// Fetch by numeric id, falling back to a slug lookup.
    pub async fn get(&self, id_or_slug: &str) -> Result<Property, CoreError> {
        let key = id_or_slug.trim();
        if let Ok(id) = key.parse::<DbId>() {
            if let Some(property) = self.store.find_by_id(id).await? {
                return Ok(property);
            }
        }
        self.store
            .find_by_slug(key)
            .await?
            .ok_or_else(|| CoreError::property_not_found(key))
    }

    /// Every canonical property URL, for bulk search-engine submission.
    pub async fn canonical_urls(&self) -> Result<Vec<String>, CoreError> {
        let entries = self.store.sitemap_entries().await?;
        Ok(entries
            .iter()
            .map(|e| property_url(&self.config.site_base_url, e.id, e.slug.as_deref()))
            .collect())
    }

    pub async fn sitemap_xml(&self) -> Result<String, CoreError> {
        let entries = self.store.sitemap_entries().await?;
        Ok(render_sitemap(&self.config.site_base_url, &entries))
    }

    pub fn robots_txt(&self) -> String {
        render_robots(&self.config.site_base_url)
    }
}
