use mongodb::bson::oid::ObjectId;
use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Note entity - represents a note stored in MongoDB.
///
/// Stored field names are the internal ones (`_id`, `_deleted`); the
/// sanitizer renames/strips them before a note leaves the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier (stored as _id in MongoDB, assigned on insert)
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Note title
    pub title: String,
    /// Note body
    #[serde(default)]
    pub content: String,
    /// Tags for organization
    #[serde(default)]
    pub tags: Vec<String>,
    /// Soft-delete flag
    #[serde(rename = "_deleted", default)]
    pub deleted: bool,
    /// Set when the note is soft-deleted
    #[serde(default)]
    pub deleted_at: Option<DateTime>,
    /// Creation timestamp, assigned on insert
    #[serde(default)]
    pub created_at: Option<DateTime>,
    /// Last update timestamp, bumped on every write
    #[serde(default)]
    pub updated_at: Option<DateTime>,
}

impl Note {
    /// Build a fresh note from a create request. Identifier and
    /// timestamps are assigned by the repository on insert.
    pub fn new(input: CreateNote) -> Self {
        Self {
            id: None,
            title: input.title,
            content: input.content,
            tags: input.tags,
            deleted: false,
            deleted_at: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// API-facing shape of a sanitized note, for documentation purposes.
///
/// Actual responses are produced by the object sanitizer: `_id` becomes
/// `id` (hex string), timestamps become RFC 3339 strings, and internal
/// fields are stripped.
#[derive(Serialize, ToSchema)]
pub struct NoteView {
    /// Hex ObjectId
    #[schema(example = "65f0a2c8b7e4a93d2c8f0e11")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    /// Set when the note is soft-deleted
    pub deleted_at: Option<String>,
    #[schema(example = "2026-01-15T09:30:00Z")]
    pub created_at: String,
    pub updated_at: String,
}

/// DTO for creating a new note
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateNote {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// DTO for updating an existing note
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateNote {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 20000))]
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateNote {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }

    /// Build the `$set` stage for this update. The repository adds the
    /// `updated_at` bump.
    pub fn into_update_document(self) -> Document {
        let mut set = doc! {};
        if let Some(title) = self.title {
            set.insert("title", title);
        }
        if let Some(content) = self.content {
            set.insert("content", content);
        }
        if let Some(tags) = self.tags {
            set.insert("tags", tags);
        }
        doc! { "$set": set }
    }
}

/// Query filters for listing notes
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct NoteFilter {
    /// Filter by tag (notes containing this tag)
    pub tag: Option<String>,
    /// Search in title and content
    pub search: Option<String>,
}

impl NoteFilter {
    /// Build the MongoDB filter document. Soft-delete narrowing is the
    /// repository's job, not ours.
    pub fn to_document(&self) -> Document {
        let mut filter = doc! {};

        if let Some(ref tag) = self.tag {
            filter.insert("tags", doc! { "$in": [tag] });
        }

        if let Some(ref search) = self.search {
            filter.insert(
                "$or",
                vec![
                    doc! { "title": { "$regex": search, "$options": "i" } },
                    doc! { "content": { "$regex": search, "$options": "i" } },
                ],
            );
        }

        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_builds_empty_document() {
        assert_eq!(NoteFilter::default().to_document(), doc! {});
    }

    #[test]
    fn tag_filter_uses_in_operator() {
        let filter = NoteFilter {
            tag: Some("work".to_string()),
            search: None,
        };
        assert_eq!(
            filter.to_document(),
            doc! { "tags": { "$in": ["work"] } }
        );
    }

    #[test]
    fn search_filter_matches_title_and_content() {
        let filter = NoteFilter {
            tag: None,
            search: Some("meeting".to_string()),
        };
        let document = filter.to_document();
        let or = document.get_array("$or").unwrap();
        assert_eq!(or.len(), 2);
    }

    #[test]
    fn update_document_contains_only_provided_fields() {
        let update = UpdateNote {
            title: Some("new title".to_string()),
            content: None,
            tags: None,
        };
        let document = update.into_update_document();
        let set = document.get_document("$set").unwrap();
        assert_eq!(set.get_str("title"), Ok("new title"));
        assert!(!set.contains_key("content"));
        assert!(!set.contains_key("tags"));
    }

    #[test]
    fn new_note_has_no_id_or_timestamps() {
        let note = Note::new(CreateNote {
            title: "t".to_string(),
            content: String::new(),
            tags: vec![],
        });
        assert!(note.id.is_none());
        assert!(note.created_at.is_none());
        assert!(!note.deleted);
    }

    #[test]
    fn stored_note_round_trips_through_bson() {
        let note = Note {
            id: Some(ObjectId::new()),
            title: "t".to_string(),
            content: "c".to_string(),
            tags: vec!["a".to_string()],
            deleted: true,
            deleted_at: Some(DateTime::now()),
            created_at: Some(DateTime::now()),
            updated_at: Some(DateTime::now()),
        };
        let document = mongodb::bson::to_document(&note).unwrap();
        assert!(document.get_object_id("_id").is_ok());
        assert_eq!(document.get_bool("_deleted"), Ok(true));

        let back: Note = mongodb::bson::from_document(document).unwrap();
        assert_eq!(back.id, note.id);
        assert!(back.deleted);
    }
}
