//! Integration tests against a live MongoDB instance.
//!
//! Run with `cargo test -- --ignored` after starting MongoDB locally,
//! e.g. `docker run -p 27017:27017 mongo:8`.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{DateTime, doc};
use mongodb::{Client, Database, IndexModel};
use serde::{Deserialize, Serialize};

use mongo_repository::{
    BaseRepository, FindOptions, ReadOptions, RepositoryConfig, RepositoryError, UpdateOptions,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Gadget {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    #[serde(default)]
    stock: i64,
    #[serde(rename = "_deleted", default)]
    deleted: bool,
    #[serde(default)]
    deleted_at: Option<DateTime>,
    #[serde(default)]
    created_at: Option<DateTime>,
    #[serde(default)]
    updated_at: Option<DateTime>,
}

impl Gadget {
    fn named(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            stock: 0,
            deleted: false,
            deleted_at: None,
            created_at: None,
            updated_at: None,
        }
    }
}

async fn test_database() -> Database {
    let url = std::env::var("MONGODB_URL")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let client = Client::with_uri_str(&url).await.expect("connect");
    client.database("mongo_repository_test")
}

/// Fresh soft-delete-enabled repository on its own collection.
async fn soft_delete_repo(collection: &str) -> BaseRepository<Gadget> {
    let repo = BaseRepository::with_config(
        test_database().await,
        collection,
        RepositoryConfig::with_soft_delete(),
    );
    repo.delete_many(doc! {}).await.expect("clean collection");
    repo
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn create_assigns_id_and_timestamps() {
    let repo = soft_delete_repo("create_assigns").await;

    let created = repo.create(&Gadget::named("widget")).await.unwrap();

    assert!(created.id.is_some());
    assert!(created.created_at.is_some());
    assert!(created.updated_at.is_some());
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn soft_deleted_records_hidden_unless_opted_in() {
    let repo = soft_delete_repo("soft_delete_visibility").await;
    let created = repo.create(&Gadget::named("ephemeral")).await.unwrap();
    let id = created.id.unwrap().to_hex();

    let flagged = repo.soft_delete_by_id(&id).await.unwrap();
    assert!(flagged.is_some_and(|gadget| gadget.deleted));

    let hidden = repo.find_by_id(&id, ReadOptions::default()).await.unwrap();
    assert!(hidden.is_none());

    let visible = repo
        .find_by_id(&id, ReadOptions::with_soft_deleted())
        .await
        .unwrap()
        .unwrap();
    assert!(visible.deleted);
    assert!(visible.deleted_at.is_some());

    // A second soft delete finds nothing through the narrowed read path.
    let again = repo.soft_delete_by_id(&id).await.unwrap();
    assert!(again.is_none());
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn or_fail_raises_while_plain_lookup_stays_neutral() {
    let repo = soft_delete_repo("or_fail").await;
    let missing = ObjectId::new().to_hex();

    let neutral = repo
        .find_by_id(&missing, ReadOptions::default())
        .await
        .unwrap();
    assert!(neutral.is_none());

    let err = repo
        .find_by_id_or_fail(&missing, ReadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn malformed_id_is_a_non_match_everywhere() {
    let repo = soft_delete_repo("malformed_id").await;

    assert!(repo
        .find_by_id("not-an-id", ReadOptions::default())
        .await
        .unwrap()
        .is_none());
    assert!(!repo
        .exists_by_id("not-an-id", ReadOptions::default())
        .await
        .unwrap());
    assert!(repo.delete_by_id("not-an-id").await.unwrap().is_none());
    assert!(repo.soft_delete_by_id("not-an-id").await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn find_one_or_create_merges_defaults_over_filter() {
    let repo = soft_delete_repo("find_one_or_create").await;

    let created = repo
        .find_one_or_create(doc! { "name": "from-filter", "stock": 1 }, &{
            let mut defaults = Gadget::named("from-defaults");
            defaults.stock = 7;
            defaults
        })
        .await
        .unwrap();

    // Supplied record overrides the filter fields.
    assert_eq!(created.name, "from-defaults");
    assert_eq!(created.stock, 7);

    let found = repo
        .find_one_or_create(doc! { "name": "from-defaults" }, &Gadget::named("unused"))
        .await
        .unwrap();
    assert_eq!(found.id, created.id);
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn sequential_create_aborts_on_first_failure() {
    let repo = soft_delete_repo("sequential_create").await;
    repo.collection()
        .create_index(
            IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(
                    mongodb::options::IndexOptions::builder()
                        .unique(true)
                        .build(),
                )
                .build(),
        )
        .await
        .unwrap();

    let batch = vec![
        Gadget::named("alpha"),
        Gadget::named("alpha"), // duplicate key
        Gadget::named("gamma"),
    ];
    let err = repo.create_many(&batch).await;
    assert!(err.is_err());

    // First entry committed, third never attempted.
    assert_eq!(repo.count(doc! {}, ReadOptions::default()).await.unwrap(), 1);
    assert!(repo
        .find_one(doc! { "name": "gamma" }, ReadOptions::default())
        .await
        .unwrap()
        .is_none());

    repo.drop_collection().await.unwrap();
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn update_one_returns_post_update_record() {
    let repo = soft_delete_repo("update_one").await;
    repo.create(&Gadget::named("widget")).await.unwrap();

    let updated = repo
        .update_one(
            doc! { "name": "widget" },
            doc! { "$set": { "stock": 42 } },
            UpdateOptions::default(),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.stock, 42);
    assert!(updated.updated_at.is_some());

    let missing = repo
        .update_one(
            doc! { "name": "nothing" },
            doc! { "$set": { "stock": 1 } },
            UpdateOptions::default(),
        )
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn update_one_or_create_upserts() {
    let repo = soft_delete_repo("upsert").await;

    let upserted = repo
        .update_one_or_create(
            doc! { "name": "fresh" },
            doc! { "$set": { "stock": 3 } },
            UpdateOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(upserted.name, "fresh");
    assert_eq!(upserted.stock, 3);
    assert_eq!(repo.count(doc! {}, ReadOptions::default()).await.unwrap(), 1);
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn hard_delete_returns_the_removed_record() {
    let repo = soft_delete_repo("hard_delete").await;
    let created = repo.create(&Gadget::named("scrap")).await.unwrap();

    let removed = repo.delete(&created).await.unwrap();
    assert_eq!(removed.map(|gadget| gadget.name), Some("scrap".to_string()));

    // Gone means gone; a second delete is a neutral miss.
    assert!(repo.delete(&created).await.unwrap().is_none());
    assert_eq!(
        repo.count(doc! {}, ReadOptions::with_soft_deleted())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn soft_delete_all_flags_every_live_record() {
    let repo = soft_delete_repo("soft_delete_all").await;
    for index in 0..3 {
        repo.create(&Gadget::named(&format!("g{index}")))
            .await
            .unwrap();
    }

    assert_eq!(repo.soft_delete_all().await.unwrap(), 3);
    assert_eq!(repo.count(doc! {}, ReadOptions::default()).await.unwrap(), 0);
    // Already-flagged records are outside the narrowed filter.
    assert_eq!(repo.soft_delete_all().await.unwrap(), 0);
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn count_and_find_respect_soft_delete_and_window() {
    let repo = soft_delete_repo("count_window").await;
    for index in 0..5 {
        repo.create(&Gadget::named(&format!("g{index}"))).await.unwrap();
    }
    repo.soft_delete_one(doc! { "name": "g0" }).await.unwrap();

    assert_eq!(repo.count(doc! {}, ReadOptions::default()).await.unwrap(), 4);
    assert_eq!(
        repo.count(doc! {}, ReadOptions::with_soft_deleted())
            .await
            .unwrap(),
        5
    );

    let page = repo
        .find(
            doc! {},
            FindOptions::default().sort(doc! { "name": 1 }).skip(1).limit(2),
        )
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].name, "g2");

    assert_eq!(
        repo.count_with_find_options(doc! {}, FindOptions::default().skip(1).limit(2))
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
#[ignore] // requires MongoDB
async fn collection_lifecycle_is_idempotent() {
    let repo: BaseRepository<Gadget> =
        BaseRepository::new(test_database().await, "lifecycle_test");

    repo.create_collection().await.unwrap();
    repo.create_collection().await.unwrap();

    repo.drop_collection().await.unwrap();
    repo.drop_collection().await.unwrap();
}

#[tokio::test]
#[ignore] // requires a MongoDB replica set
async fn with_transaction_commits_and_releases_session() {
    let repo = soft_delete_repo("transactions").await;
    let collection = repo.collection().clone();

    let name = repo
        .with_transaction(move |session| {
            let collection = collection.clone();
            Box::pin(async move {
                collection
                    .insert_one(&Gadget::named("txn"))
                    .session(&mut *session)
                    .await?;
                Ok("txn".to_string())
            })
        })
        .await
        .unwrap();

    assert_eq!(name, "txn");
    assert!(repo
        .find_one(doc! { "name": "txn" }, ReadOptions::default())
        .await
        .unwrap()
        .is_some());
}
