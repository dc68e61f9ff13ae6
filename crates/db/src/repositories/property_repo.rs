//! Repository for the `properties` table.

use async_trait::async_trait;
use campos_core::property::{NewProperty, Property};
use campos_core::site::SitemapEntry;
use campos_core::store::{PageRequest, PropertyFilter, PropertyStore, StoreError, UniqueField};
use campos_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::property::{PropertyRow, SitemapRow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, ref_code, slug, title, description, operation_type, price, measure, \
     location, lat, lng, property_type, services, extras, environments, environments_list, \
     bedrooms, bathrooms, condition, age, house_measures, images, video_urls, keywords, \
     created_at, updated_at";

/// Search and operation-type predicate shared by listing and counting.
/// `$1` is an ILIKE pattern or NULL, `$2` an operation type or NULL.
const FILTER: &str = "($1::text IS NULL
        OR ref_code ILIKE $1 ESCAPE '\\'
        OR title ILIKE $1 ESCAPE '\\'
        OR location ILIKE $1 ESCAPE '\\'
        OR description ILIKE $1 ESCAPE '\\')
     AND ($2::text IS NULL OR operation_type = $2)";

/// Turn free text into a substring ILIKE pattern, escaping wildcards.
pub fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn filter_binds(filter: &PropertyFilter) -> (Option<String>, Option<&'static str>) {
    let pattern = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);
    (pattern, filter.operation_type.map(|op| op.as_str()))
}

/// Provides CRUD operations for properties.
pub struct PropertyRepo;

impl PropertyRepo {
    /// List one page of properties matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &PropertyFilter,
        page: PageRequest,
    ) -> Result<Vec<PropertyRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM properties
             WHERE {FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        let (pattern, operation_type) = filter_binds(filter);
        sqlx::query_as::<_, PropertyRow>(&query)
            .bind(pattern)
            .bind(operation_type)
            .bind(page.page_size)
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &PropertyFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM properties WHERE {FILTER}");
        let (pattern, operation_type) = filter_binds(filter);
        sqlx::query_scalar::<_, i64>(&query)
            .bind(pattern)
            .bind(operation_type)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PropertyRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM properties WHERE id = $1");
        sqlx::query_as::<_, PropertyRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<PropertyRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM properties WHERE slug = $1");
        sqlx::query_as::<_, PropertyRow>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn ref_exists(pool: &PgPool, ref_code: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM properties WHERE ref_code = $1)",
        )
        .bind(ref_code)
        .fetch_one(pool)
        .await
    }

    /// Whether `slug` is held by a row other than `exclude_id`.
    pub async fn slug_exists(
        pool: &PgPool,
        slug: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM properties
                WHERE slug = $1 AND ($2::bigint IS NULL OR id <> $2)
             )",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Insert a new property, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewProperty) -> Result<PropertyRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO properties (
                ref_code, slug, title, description, operation_type, price, measure,
                location, lat, lng, property_type, services, extras, environments,
                environments_list, bedrooms, bathrooms, condition, age, house_measures,
                images, video_urls, keywords)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                     $15, $16, $17, $18, $19, $20, $21, $22, $23)
             RETURNING {COLUMNS}"
        );
        let d = &input.dwelling;
        sqlx::query_as::<_, PropertyRow>(&query)
            .bind(&input.ref_code)
            .bind(&input.slug)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.operation_type.as_str())
            .bind(input.price)
            .bind(input.measure)
            .bind(&input.location)
            .bind(input.lat)
            .bind(input.lng)
            .bind(&input.property_type)
            .bind(&input.services)
            .bind(&input.extras)
            .bind(d.environments)
            .bind(&d.environments_list)
            .bind(d.bedrooms)
            .bind(d.bathrooms)
            .bind(&d.condition)
            .bind(&d.age)
            .bind(d.house_measures)
            .bind(Json(&input.images))
            .bind(&input.video_urls)
            .bind(&input.keywords)
            .fetch_one(pool)
            .await
    }

    /// Overwrite every mutable column. Returns `None` if the row is gone.
    pub async fn save(pool: &PgPool, property: &Property) -> Result<Option<PropertyRow>, sqlx::Error> {
        let query = format!(
            "UPDATE properties SET
                ref_code = $2,
                slug = $3,
                title = $4,
                description = $5,
                operation_type = $6,
                price = $7,
                measure = $8,
                location = $9,
                lat = $10,
                lng = $11,
                property_type = $12,
                services = $13,
                extras = $14,
                environments = $15,
                environments_list = $16,
                bedrooms = $17,
                bathrooms = $18,
                condition = $19,
                age = $20,
                house_measures = $21,
                images = $22,
                video_urls = $23,
                keywords = $24,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let d = &property.dwelling;
        sqlx::query_as::<_, PropertyRow>(&query)
            .bind(property.id)
            .bind(&property.ref_code)
            .bind(&property.slug)
            .bind(&property.title)
            .bind(&property.description)
            .bind(property.operation_type.as_str())
            .bind(property.price)
            .bind(property.measure)
            .bind(&property.location)
            .bind(property.lat)
            .bind(property.lng)
            .bind(&property.property_type)
            .bind(&property.services)
            .bind(&property.extras)
            .bind(d.environments)
            .bind(&d.environments_list)
            .bind(d.bedrooms)
            .bind(d.bathrooms)
            .bind(&d.condition)
            .bind(&d.age)
            .bind(d.house_measures)
            .bind(Json(&property.images))
            .bind(&property.video_urls)
            .bind(&property.keywords)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a property. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Id, slug and modification time of every property, most recently
    /// updated first.
    pub async fn sitemap(pool: &PgPool) -> Result<Vec<SitemapRow>, sqlx::Error> {
        sqlx::query_as::<_, SitemapRow>(
            "SELECT id, slug, updated_at FROM properties ORDER BY updated_at DESC, id DESC",
        )
        .fetch_all(pool)
        .await
    }

    /// Every property, oldest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<PropertyRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM properties ORDER BY id ASC");
        sqlx::query_as::<_, PropertyRow>(&query)
            .fetch_all(pool)
            .await
    }
}

// ---------------------------------------------------------------------------
// PropertyStore adapter
// ---------------------------------------------------------------------------

/// Classify a sqlx error into a [`StoreError`].
///
/// Unique violations (PostgreSQL code 23505) on `uq_properties_ref` and
/// `uq_properties_slug` become [`StoreError::UniqueViolation`]; everything
/// else is logged and reported as unavailable.
pub fn classify_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            match db_err.constraint() {
                Some("uq_properties_ref") => return StoreError::UniqueViolation(UniqueField::Ref),
                Some("uq_properties_slug") => {
                    return StoreError::UniqueViolation(UniqueField::Slug)
                }
                _ => {}
            }
        }
    }
    tracing::error!(error = %err, "Database error");
    StoreError::Unavailable(err.to_string())
}

fn into_property(row: PropertyRow) -> Result<Property, StoreError> {
    let id = row.id;
    Property::try_from(row).map_err(|e| {
        tracing::error!(property_id = id, error = %e, "Corrupt property row");
        StoreError::Unavailable(e.to_string())
    })
}

fn into_properties(rows: Vec<PropertyRow>) -> Result<Vec<Property>, StoreError> {
    rows.into_iter().map(into_property).collect()
}

/// [`PropertyStore`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgPropertyStore {
    pool: PgPool,
}

impl PgPropertyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PropertyStore for PgPropertyStore {
    async fn find(
        &self,
        filter: &PropertyFilter,
        page: PageRequest,
    ) -> Result<Vec<Property>, StoreError> {
        let rows = PropertyRepo::list(&self.pool, filter, page)
            .await
            .map_err(classify_error)?;
        into_properties(rows)
    }

    async fn count(&self, filter: &PropertyFilter) -> Result<i64, StoreError> {
        PropertyRepo::count(&self.pool, filter)
            .await
            .map_err(classify_error)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Property>, StoreError> {
        PropertyRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify_error)?
            .map(into_property)
            .transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Property>, StoreError> {
        PropertyRepo::find_by_slug(&self.pool, slug)
            .await
            .map_err(classify_error)?
            .map(into_property)
            .transpose()
    }

    async fn ref_exists(&self, ref_code: &str) -> Result<bool, StoreError> {
        PropertyRepo::ref_exists(&self.pool, ref_code)
            .await
            .map_err(classify_error)
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<DbId>) -> Result<bool, StoreError> {
        PropertyRepo::slug_exists(&self.pool, slug, exclude_id)
            .await
            .map_err(classify_error)
    }

    async fn create(&self, input: &NewProperty) -> Result<Property, StoreError> {
        let row = PropertyRepo::create(&self.pool, input)
            .await
            .map_err(classify_error)?;
        into_property(row)
    }

    async fn save(&self, property: &Property) -> Result<Property, StoreError> {
        let row = PropertyRepo::save(&self.pool, property)
            .await
            .map_err(classify_error)?
            .ok_or(StoreError::Missing(property.id))?;
        into_property(row)
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        PropertyRepo::delete(&self.pool, id)
            .await
            .map_err(classify_error)
    }

    async fn sitemap_entries(&self) -> Result<Vec<SitemapEntry>, StoreError> {
        let rows = PropertyRepo::sitemap(&self.pool)
            .await
            .map_err(classify_error)?;
        Ok(rows.into_iter().map(SitemapEntry::from).collect())
    }

    async fn list_all(&self) -> Result<Vec<Property>, StoreError> {
        let rows = PropertyRepo::list_all(&self.pool)
            .await
            .map_err(classify_error)?;
        into_properties(rows)
    }
}
