use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use crate::config::AppConfig;
use crate::models::{Comment, Like, Playlist, Subscription, Tweet, User, Video};

pub const USERS: &str = "users";
pub const VIDEOS: &str = "videos";
pub const COMMENTS: &str = "comments";
pub const LIKES: &str = "likes";
pub const TWEETS: &str = "tweets";
pub const PLAYLISTS: &str = "playlists";
pub const SUBSCRIPTIONS: &str = "subscriptions";

pub async fn init_db(config: &AppConfig) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(&config.mongodb_uri).await?;

    // Ping the database to verify connection
    client
        .database("admin")
        .run_command(doc! {"ping": 1})
        .await?;

    log::info!("Successfully connected to MongoDB");

    Ok(client.database(&config.database_name))
}

/// Create the indexes the handlers rely on. Safe to run on every start.
pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let unique = || IndexOptions::builder().unique(true).build();

    users(db)
        .create_index(IndexModel::builder().keys(doc! { "username": 1 }).options(unique()).build())
        .await?;
    users(db)
        .create_index(IndexModel::builder().keys(doc! { "email": 1 }).options(unique()).build())
        .await?;
    subscriptions(db)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "subscriber": 1, "channel": 1 })
                .options(unique())
                .build(),
        )
        .await?;
    subscriptions(db)
        .create_index(IndexModel::builder().keys(doc! { "channel": 1 }).build())
        .await?;
    videos(db)
        .create_index(IndexModel::builder().keys(doc! { "owner": 1, "createdAt": -1 }).build())
        .await?;
    comments(db)
        .create_index(IndexModel::builder().keys(doc! { "video": 1, "createdAt": -1 }).build())
        .await?;
    likes(db).create_indexes(like_index_models()).await?;
    tweets(db)
        .create_index(IndexModel::builder().keys(doc! { "owner": 1 }).build())
        .await?;
    playlists(db)
        .create_index(IndexModel::builder().keys(doc! { "owner": 1 }).build())
        .await?;

    log::info!("MongoDB indexes are in place");
    Ok(())
}

/// One like per (target, user); each index only covers likes on its own target kind
pub fn like_index_models() -> Vec<IndexModel> {
    let mut models = vec![IndexModel::builder().keys(doc! { "likedBy": 1 }).build()];
    for field in ["video", "comment", "tweet"] {
        let options = IndexOptions::builder()
            .unique(true)
            .partial_filter_expression(doc! { field: { "$exists": true } })
            .build();
        models.push(
            IndexModel::builder()
                .keys(doc! { field: 1, "likedBy": 1 })
                .options(options)
                .build(),
        );
    }
    models
}

pub fn users(db: &Database) -> Collection<User> {
    db.collection(USERS)
}

pub fn videos(db: &Database) -> Collection<Video> {
    db.collection(VIDEOS)
}

pub fn comments(db: &Database) -> Collection<Comment> {
    db.collection(COMMENTS)
}

pub fn likes(db: &Database) -> Collection<Like> {
    db.collection(LIKES)
}

pub fn tweets(db: &Database) -> Collection<Tweet> {
    db.collection(TWEETS)
}

pub fn playlists(db: &Database) -> Collection<Playlist> {
    db.collection(PLAYLISTS)
}

pub fn subscriptions(db: &Database) -> Collection<Subscription> {
    db.collection(SUBSCRIPTIONS)
}
