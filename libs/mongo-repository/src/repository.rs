//! Generic MongoDB repository with soft-delete semantics.

use futures_util::TryStreamExt;
use futures_util::future::BoxFuture;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, DateTime, Document, doc, from_document, to_document};
use mongodb::options::ReturnDocument;
use mongodb::{ClientSession, Collection, Database};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::{RepositoryError, RepositoryResult};
use crate::options::{FindOptions, ReadOptions, RepositoryConfig, UpdateOptions};
use crate::{CREATED_AT_FIELD, DELETED_AT_FIELD, SOFT_DELETED_FIELD, UPDATED_AT_FIELD};

/// Generic repository over one MongoDB collection.
///
/// Wraps a typed collection handle and layers three behaviours on top of
/// the raw driver: timestamp management on writes, optional soft-delete
/// exclusion on reads, and neutral (non-error) handling of malformed ids.
///
/// Absence semantics: plain lookups return `None`/`false`/`0`; only the
/// `*_or_fail` variants produce [`RepositoryError::NotFound`]. A
/// syntactically invalid id passed to any `*_by_id` operation is a
/// deterministic non-match, never an error.
pub struct BaseRepository<T: Send + Sync> {
    collection: Collection<T>,
    raw: Collection<Document>,
    database: Database,
    collection_name: String,
    config: RepositoryConfig,
}

impl<T> BaseRepository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Create a repository with default configuration (no soft delete).
    pub fn new(database: Database, collection_name: &str) -> Self {
        Self::with_config(database, collection_name, RepositoryConfig::default())
    }

    pub fn with_config(
        database: Database,
        collection_name: &str,
        config: RepositoryConfig,
    ) -> Self {
        let collection = database.collection::<T>(collection_name);
        let raw = database.collection::<Document>(collection_name);
        Self {
            collection,
            raw,
            database,
            collection_name: collection_name.to_string(),
            config,
        }
    }

    /// The underlying typed collection, for operations this wrapper
    /// does not cover (sessions, change streams, index management).
    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Field name the `*_by_id` and save paths key on.
    pub fn primary_key(&self) -> &str {
        &self.config.primary_key
    }

    // ---- reads -----------------------------------------------------------

    pub async fn find(&self, filter: Document, options: FindOptions) -> RepositoryResult<Vec<T>> {
        let filter = self.narrow(filter, options.included_soft_deleted);
        let driver_options = mongodb::options::FindOptions::builder()
            .skip(options.skip)
            .limit(options.limit)
            .sort(options.sort)
            .build();

        let cursor = self
            .collection
            .find(filter)
            .with_options(driver_options)
            .await?;
        let records = cursor.try_collect().await?;
        Ok(records)
    }

    pub async fn find_one(
        &self,
        filter: Document,
        options: ReadOptions,
    ) -> RepositoryResult<Option<T>> {
        let filter = self.narrow(filter, options.included_soft_deleted);
        let record = self.collection.find_one(filter).await?;
        Ok(record)
    }

    pub async fn find_by_id(&self, id: &str, options: ReadOptions) -> RepositoryResult<Option<T>> {
        match self.id_filter(id) {
            Some(filter) => self.find_one(filter, options).await,
            None => Ok(None),
        }
    }

    pub async fn find_one_or_fail(
        &self,
        filter: Document,
        options: ReadOptions,
    ) -> RepositoryResult<T> {
        self.find_one(filter, options)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    pub async fn find_by_id_or_fail(&self, id: &str, options: ReadOptions) -> RepositoryResult<T> {
        self.find_by_id(id, options)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Look up by `filter`; when absent, create a record from the filter
    /// fields merged with `defaults`. Fields in `defaults` win.
    pub async fn find_one_or_create(
        &self,
        filter: Document,
        defaults: &T,
    ) -> RepositoryResult<T> {
        if let Some(existing) = self.find_one(filter.clone(), ReadOptions::default()).await? {
            return Ok(existing);
        }

        let overlay = to_document(defaults)?;
        self.insert_document(merge_documents(filter, overlay)).await
    }

    // ---- writes ----------------------------------------------------------

    /// Insert one record. Assigns an id when the record carries none and
    /// stamps creation/modification times.
    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn create(&self, record: &T) -> RepositoryResult<T> {
        let document = to_document(record)?;
        self.insert_document(document).await
    }

    /// Insert records one at a time, preserving order. The first failure
    /// propagates and aborts the remainder; earlier inserts stay committed.
    #[instrument(skip_all, fields(collection = %self.collection_name, records = records.len()))]
    pub async fn create_many(&self, records: &[T]) -> RepositoryResult<Vec<T>> {
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            created.push(self.create(record).await?);
        }
        Ok(created)
    }

    /// Persist a record: replace-by-id when it already carries an id
    /// (bumping the modification timestamp), otherwise insert it.
    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn save(&self, record: &T) -> RepositoryResult<T> {
        let mut document = to_document(record)?;
        let Some(id) = document.get(&self.config.primary_key).cloned() else {
            return self.insert_document(document).await;
        };

        document.insert(UPDATED_AT_FIELD, DateTime::now());
        let filter = doc! { &self.config.primary_key: id };
        self.raw
            .replace_one(filter, &document)
            .upsert(true)
            .await?;
        Ok(from_document(document)?)
    }

    /// Sequential, order-preserving [`save`](Self::save) over a slice.
    pub async fn save_many(&self, records: &[T]) -> RepositoryResult<Vec<T>> {
        let mut saved = Vec::with_capacity(records.len());
        for record in records {
            saved.push(self.save(record).await?);
        }
        Ok(saved)
    }

    // ---- deletes ---------------------------------------------------------

    /// Hard-delete a record by its id field. Returns the removed record,
    /// or `None` when it carries no id or nothing matched.
    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn delete(&self, record: &T) -> RepositoryResult<Option<T>> {
        let document = to_document(record)?;
        let Some(id) = document.get(&self.config.primary_key).cloned() else {
            return Ok(None);
        };
        self.delete_one(doc! { &self.config.primary_key: id }).await
    }

    /// Sequential, order-preserving hard delete of each record.
    pub async fn delete_batch(&self, records: &[T]) -> RepositoryResult<Vec<Option<T>>> {
        let mut removed = Vec::with_capacity(records.len());
        for record in records {
            removed.push(self.delete(record).await?);
        }
        Ok(removed)
    }

    /// Hard-delete the first match and return it.
    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn delete_one(&self, filter: Document) -> RepositoryResult<Option<T>> {
        let record = self.collection.find_one_and_delete(filter).await?;
        Ok(record)
    }

    pub async fn delete_by_id(&self, id: &str) -> RepositoryResult<Option<T>> {
        match self.id_filter(id) {
            Some(filter) => self.delete_one(filter).await,
            None => Ok(None),
        }
    }

    /// Hard-delete everything matching `filter`, regardless of soft-delete
    /// configuration. Returns the number of records removed.
    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn delete_many(&self, filter: Document) -> RepositoryResult<u64> {
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    // ---- soft deletes ----------------------------------------------------
    //
    // These always set the flag, whether or not the repository was
    // configured with soft-delete support; only read paths consult
    // the configuration.

    /// Soft-delete a record by its id field. Returns the updated record,
    /// or `None` when it carries no id or was already soft-deleted.
    pub async fn soft_delete(&self, record: &T) -> RepositoryResult<Option<T>> {
        let document = to_document(record)?;
        let Some(id) = document.get(&self.config.primary_key).cloned() else {
            return Ok(None);
        };
        self.soft_delete_one(doc! { &self.config.primary_key: id })
            .await
    }

    /// Sequential, order-preserving soft delete of each record.
    pub async fn soft_delete_batch(&self, records: &[T]) -> RepositoryResult<Vec<Option<T>>> {
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            results.push(self.soft_delete(record).await?);
        }
        Ok(results)
    }

    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn soft_delete_one(&self, filter: Document) -> RepositoryResult<Option<T>> {
        self.update_one(filter, soft_delete_update(), UpdateOptions::default())
            .await
    }

    pub async fn soft_delete_by_id(&self, id: &str) -> RepositoryResult<Option<T>> {
        match self.id_filter(id) {
            Some(filter) => self.soft_delete_one(filter).await,
            None => Ok(None),
        }
    }

    /// Flag everything matching `filter`. Returns the number of records
    /// newly flagged.
    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn soft_delete_many(&self, filter: Document) -> RepositoryResult<u64> {
        let filter = self.narrow(filter, false);
        let result = self.raw.update_many(filter, soft_delete_update()).await?;
        Ok(result.modified_count)
    }

    /// Flag every record in the collection that is not already flagged.
    pub async fn soft_delete_all(&self) -> RepositoryResult<u64> {
        self.soft_delete_many(doc! {}).await
    }

    // ---- updates ---------------------------------------------------------

    /// Apply an operator update to everything matching `filter` as-is
    /// (no soft-delete narrowing). Returns the modified count.
    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn update(&self, filter: Document, update: Document) -> RepositoryResult<u64> {
        let update = with_updated_timestamp(update);
        let result = self.raw.update_many(filter, update).await?;
        Ok(result.modified_count)
    }

    /// Update the first match and return the post-update record,
    /// or `None` when nothing matched.
    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> RepositoryResult<Option<T>> {
        let filter = self.narrow(filter, options.included_soft_deleted);
        let update = with_updated_timestamp(update);

        let record = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .upsert(options.upsert)
            .await?;
        Ok(record)
    }

    pub async fn update_by_id(
        &self,
        id: &str,
        update: Document,
        options: UpdateOptions,
    ) -> RepositoryResult<Option<T>> {
        match self.id_filter(id) {
            Some(filter) => self.update_one(filter, update, options).await,
            None => Ok(None),
        }
    }

    /// [`update_one`](Self::update_one) with upsert semantics: when the
    /// filter matches nothing, a new record is inserted from the filter
    /// equality fields plus the update, so a record always comes back.
    pub async fn update_one_or_create(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> RepositoryResult<T> {
        let options = UpdateOptions {
            upsert: true,
            ..options
        };
        self.update_one(filter, update, options)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> RepositoryResult<u64> {
        let filter = self.narrow(filter, options.included_soft_deleted);
        let update = with_updated_timestamp(update);
        let result = self.raw.update_many(filter, update).await?;
        Ok(result.modified_count)
    }

    // ---- counts / existence ----------------------------------------------

    pub async fn count(&self, filter: Document, options: ReadOptions) -> RepositoryResult<u64> {
        let filter = self.narrow(filter, options.included_soft_deleted);
        let count = self.collection.count_documents(filter).await?;
        Ok(count)
    }

    /// Count honoring the window of a find call (skip/limit).
    pub async fn count_with_find_options(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> RepositoryResult<u64> {
        let filter = self.narrow(filter, options.included_soft_deleted);
        let driver_options = mongodb::options::CountOptions::builder()
            .skip(options.skip)
            .limit(options.limit.map(|limit| limit.max(0) as u64))
            .build();
        let count = self
            .collection
            .count_documents(filter)
            .with_options(driver_options)
            .await?;
        Ok(count)
    }

    pub async fn exists(&self, filter: Document, options: ReadOptions) -> RepositoryResult<bool> {
        let filter = self.narrow(filter, options.included_soft_deleted);
        let driver_options = mongodb::options::CountOptions::builder().limit(1).build();
        let count = self
            .collection
            .count_documents(filter)
            .with_options(driver_options)
            .await?;
        Ok(count > 0)
    }

    pub async fn exists_by_id(&self, id: &str, options: ReadOptions) -> RepositoryResult<bool> {
        match self.id_filter(id) {
            Some(filter) => self.exists(filter, options).await,
            None => Ok(false),
        }
    }

    // ---- aggregation / transactions --------------------------------------

    pub async fn aggregate(&self, pipeline: Vec<Document>) -> RepositoryResult<Vec<Document>> {
        let cursor = self.collection.aggregate(pipeline).await?;
        let documents = cursor.try_collect().await?;
        Ok(documents)
    }

    /// Run `operation` inside a transaction on a fresh session. Commits on
    /// `Ok`, aborts on `Err`; the session is released when it drops, on
    /// every exit path.
    pub async fn with_transaction<R, F>(&self, operation: F) -> RepositoryResult<R>
    where
        R: Send,
        F: for<'a> FnOnce(&'a mut ClientSession) -> BoxFuture<'a, RepositoryResult<R>> + Send,
    {
        let mut session = self.database.client().start_session().await?;
        session.start_transaction().await?;

        match operation(&mut session).await {
            Ok(result) => {
                session.commit_transaction().await?;
                Ok(result)
            }
            Err(err) => {
                session.abort_transaction().await?;
                Err(err)
            }
        }
    }

    // ---- collection lifecycle --------------------------------------------

    /// Create the backing collection if it does not exist yet.
    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn create_collection(&self) -> RepositoryResult<()> {
        if self.collection_exists().await? {
            return Ok(());
        }
        self.database
            .create_collection(&self.collection_name)
            .await?;
        tracing::debug!("collection created");
        Ok(())
    }

    /// Drop the backing collection if it exists.
    #[instrument(skip_all, fields(collection = %self.collection_name))]
    pub async fn drop_collection(&self) -> RepositoryResult<()> {
        if !self.collection_exists().await? {
            return Ok(());
        }
        self.raw.drop().await?;
        tracing::debug!("collection dropped");
        Ok(())
    }

    async fn collection_exists(&self) -> RepositoryResult<bool> {
        let names = self
            .database
            .list_collection_names()
            .filter(doc! { "name": &self.collection_name })
            .await?;
        Ok(!names.is_empty())
    }

    // ---- internals -------------------------------------------------------

    async fn insert_document(&self, mut document: Document) -> RepositoryResult<T> {
        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }
        let now = DateTime::now();
        document.insert(CREATED_AT_FIELD, now);
        document.insert(UPDATED_AT_FIELD, now);

        self.raw.insert_one(&document).await?;
        Ok(from_document(document)?)
    }

    /// Build the `primary_key` equality filter for a textual id, or `None`
    /// when the id is not a valid ObjectId.
    fn id_filter(&self, id: &str) -> Option<Document> {
        let object_id = parse_object_id(id)?;
        Some(doc! { &self.config.primary_key: object_id })
    }

    /// Exclude soft-deleted records when the repository supports soft
    /// deletion and the caller did not opt in.
    fn narrow(&self, mut filter: Document, included_soft_deleted: bool) -> Document {
        if self.config.soft_delete_supported && !included_soft_deleted {
            filter.insert(SOFT_DELETED_FIELD, doc! { "$ne": true });
        }
        filter
    }
}

pub(crate) fn parse_object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// The operator document that flags a record as soft-deleted.
fn soft_delete_update() -> Document {
    doc! {
        "$set": {
            SOFT_DELETED_FIELD: true,
            DELETED_AT_FIELD: DateTime::now(),
        }
    }
}

/// Stamp `updated_at` into an operator update unless the caller already
/// sets it. Expects an operator document, not a replacement document.
fn with_updated_timestamp(mut update: Document) -> Document {
    match update.get_document_mut("$set") {
        Ok(set) => {
            if !set.contains_key(UPDATED_AT_FIELD) {
                set.insert(UPDATED_AT_FIELD, DateTime::now());
            }
        }
        Err(_) => {
            update.insert("$set", doc! { UPDATED_AT_FIELD: DateTime::now() });
        }
    }
    update
}

/// Merge `overlay` over `base`; overlay fields win on key collisions.
fn merge_documents(base: Document, overlay: Document) -> Document {
    let mut merged = base;
    for (key, value) in overlay {
        // Missing optional fields serialize as Null; do not let them
        // clobber a concrete filter value.
        if matches!(value, Bson::Null) && merged.contains_key(&key) {
            continue;
        }
        merged.insert(key, value);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_shareable_across_tasks() {
        fn assert_send_sync<V: Send + Sync>() {}
        assert_send_sync::<BaseRepository<Document>>();
    }

    #[test]
    fn parse_object_id_accepts_valid_hex() {
        let id = ObjectId::new().to_hex();
        assert!(parse_object_id(&id).is_some());
    }

    #[test]
    fn parse_object_id_rejects_malformed_input() {
        assert!(parse_object_id("not-an-id").is_none());
        assert!(parse_object_id("").is_none());
        assert!(parse_object_id("123").is_none());
    }

    #[test]
    fn soft_delete_update_sets_flag_and_timestamp() {
        let update = soft_delete_update();
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_bool(SOFT_DELETED_FIELD), Ok(true));
        assert!(set.get_datetime(DELETED_AT_FIELD).is_ok());
    }

    #[test]
    fn with_updated_timestamp_adds_set_stage() {
        let update = with_updated_timestamp(doc! { "$inc": { "views": 1 } });
        let set = update.get_document("$set").unwrap();
        assert!(set.get_datetime(UPDATED_AT_FIELD).is_ok());
        assert!(update.get_document("$inc").is_ok());
    }

    #[test]
    fn with_updated_timestamp_respects_caller_value() {
        let epoch = DateTime::from_millis(0);
        let update = with_updated_timestamp(doc! { "$set": { UPDATED_AT_FIELD: epoch } });
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_datetime(UPDATED_AT_FIELD), Ok(&epoch));
    }

    #[test]
    fn with_updated_timestamp_extends_existing_set_stage() {
        let update = with_updated_timestamp(doc! { "$set": { "title": "new" } });
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("title"), Ok("new"));
        assert!(set.get_datetime(UPDATED_AT_FIELD).is_ok());
    }

    #[test]
    fn merge_documents_overlay_wins() {
        let merged = merge_documents(
            doc! { "name": "base", "kind": "filter" },
            doc! { "name": "overlay" },
        );
        assert_eq!(merged.get_str("name"), Ok("overlay"));
        assert_eq!(merged.get_str("kind"), Ok("filter"));
    }

    #[test]
    fn merge_documents_null_overlay_keeps_base_value() {
        let merged = merge_documents(doc! { "name": "base" }, doc! { "name": Bson::Null });
        assert_eq!(merged.get_str("name"), Ok("base"));
    }
}
