use mongodb::bson::Document;

/// Per-repository behaviour knobs, fixed at construction time.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// When `true`, read paths exclude records flagged as soft-deleted
    /// unless the call opts back in via `included_soft_deleted`.
    pub soft_delete_supported: bool,
    /// Field name used by the `*_by_id` operations.
    pub primary_key: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            soft_delete_supported: false,
            primary_key: crate::DEFAULT_PRIMARY_KEY.to_string(),
        }
    }
}

impl RepositoryConfig {
    pub fn with_soft_delete() -> Self {
        Self {
            soft_delete_supported: true,
            ..Self::default()
        }
    }

    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = key.into();
        self
    }
}

/// Options for single-record reads.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Include soft-deleted records even when the repository
    /// supports soft deletion.
    pub included_soft_deleted: bool,
}

impl ReadOptions {
    pub fn with_soft_deleted() -> Self {
        Self {
            included_soft_deleted: true,
        }
    }
}

/// Options for multi-record reads.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub included_soft_deleted: bool,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
    pub sort: Option<Document>,
}

impl FindOptions {
    pub fn with_soft_deleted() -> Self {
        Self {
            included_soft_deleted: true,
            ..Self::default()
        }
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// Options for update operations.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub included_soft_deleted: bool,
    /// Insert a new record when the filter matches nothing.
    pub upsert: bool,
}

impl UpdateOptions {
    pub fn with_soft_deleted() -> Self {
        Self {
            included_soft_deleted: true,
            ..Self::default()
        }
    }

    pub fn upsert() -> Self {
        Self {
            upsert: true,
            ..Self::default()
        }
    }
}
