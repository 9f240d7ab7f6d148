//! Note Service - Business logic layer

use std::sync::Arc;

use mongodb::Database;
use mongodb::bson::doc;
use tokio::sync::Mutex;
use tracing::instrument;
use validator::Validate;

use mongo_repository::{BaseRepository, FindOptions, ReadOptions, RepositoryConfig};
use pagination::{Pagination, walk_pages};

use crate::error::{NoteError, NoteResult};
use crate::models::{CreateNote, Note, NoteFilter, UpdateNote};

/// Collection backing the notes domain.
pub const NOTES_COLLECTION: &str = "notes";

/// Note service providing business logic operations.
///
/// The service layer handles validation and business rules on top of the
/// generic repository. Notes are soft-deleted: deleted notes stay in the
/// collection but disappear from every read path.
pub struct NoteService {
    repository: Arc<BaseRepository<Note>>,
}

impl NoteService {
    /// Create a new NoteService on the given database.
    pub fn new(db: Database) -> Self {
        let repository = BaseRepository::with_config(
            db,
            NOTES_COLLECTION,
            RepositoryConfig::with_soft_delete(),
        );
        Self {
            repository: Arc::new(repository),
        }
    }

    /// The underlying repository, for bootstrap tasks and tests.
    pub fn repository(&self) -> &BaseRepository<Note> {
        &self.repository
    }

    /// Create a new note
    #[instrument(skip(self, input), fields(note_title = %input.title))]
    pub async fn create_note(&self, input: CreateNote) -> NoteResult<Note> {
        input
            .validate()
            .map_err(|e| NoteError::Validation(e.to_string()))?;

        let note = self.repository.create(&Note::new(input)).await?;
        tracing::info!(note_id = ?note.id, "Note created successfully");
        Ok(note)
    }

    /// Get a note by its hex id
    #[instrument(skip(self))]
    pub async fn get_note(&self, id: &str) -> NoteResult<Note> {
        self.repository
            .find_by_id(id, ReadOptions::default())
            .await?
            .ok_or(NoteError::NotFound)
    }

    /// List one page of notes plus the total matching count.
    #[instrument(skip(self))]
    pub async fn list_notes(
        &self,
        filter: NoteFilter,
        window: Pagination,
    ) -> NoteResult<(Vec<Note>, u64)> {
        let filter = filter.to_document();

        let options = FindOptions::default()
            .skip(window.offset)
            .limit(window.page_size as i64)
            .sort(doc! { "created_at": -1 });
        let notes = self.repository.find(filter.clone(), options).await?;
        let total = self.repository.count(filter, ReadOptions::default()).await?;

        Ok((notes, total))
    }

    /// Update an existing note
    #[instrument(skip(self, input))]
    pub async fn update_note(&self, id: &str, input: UpdateNote) -> NoteResult<Note> {
        input
            .validate()
            .map_err(|e| NoteError::Validation(e.to_string()))?;
        if input.is_empty() {
            return Err(NoteError::Validation("No fields to update".to_string()));
        }

        self.repository
            .update_by_id(id, input.into_update_document(), Default::default())
            .await?
            .ok_or(NoteError::NotFound)
    }

    /// Soft-delete a note. The record stays in the collection but
    /// disappears from reads.
    #[instrument(skip(self))]
    pub async fn delete_note(&self, id: &str) -> NoteResult<()> {
        self.repository
            .soft_delete_by_id(id)
            .await?
            .map(|_| ())
            .ok_or(NoteError::NotFound)
    }

    /// Permanently remove a note. Unlike [`delete_note`](Self::delete_note)
    /// this is a hard delete: the record is gone, soft-deleted or not.
    #[instrument(skip(self))]
    pub async fn purge_note(&self, id: &str) -> NoteResult<()> {
        self.repository
            .delete_by_id(id)
            .await?
            .map(|_| ())
            .ok_or(NoteError::NotFound)
    }

    /// Count notes matching the filter
    #[instrument(skip(self))]
    pub async fn count_notes(&self, filter: NoteFilter) -> NoteResult<u64> {
        let count = self
            .repository
            .count(filter.to_document(), ReadOptions::default())
            .await?;
        Ok(count)
    }

    /// Collect every matching note by walking pages until exhaustion.
    ///
    /// Uses the default window size; intended for export-style endpoints
    /// where the caller wants the full result set rather than one page.
    #[instrument(skip(self))]
    pub async fn export_notes(&self, filter: NoteFilter) -> NoteResult<Vec<Note>> {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let filter = filter.to_document();

        let sink = collected.clone();
        let repository = self.repository.clone();
        walk_pages::<Note, NoteError, _, _>(
            move |window| {
                let repository = repository.clone();
                let filter = filter.clone();
                let sink = sink.clone();
                async move {
                    let options = FindOptions::default()
                        .skip(window.offset)
                        .limit(window.page_size as i64)
                        .sort(doc! { "created_at": 1 });
                    let page = repository.find(filter, options).await?;
                    sink.lock().await.extend(page.iter().cloned());
                    Ok(page)
                }
            },
            None,
        )
        .await?;

        let collected = Arc::try_unwrap(collected)
            .map_err(|_| NoteError::Internal("export sink still shared".to_string()))?;
        Ok(collected.into_inner())
    }
}
