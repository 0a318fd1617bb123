// Common test utilities for server integration tests
#![allow(dead_code)]

use std::env;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Database};
use serde_json::Value;

use videotube::config::{AppConfig, AuthConfig, CloudinaryConfig};
use videotube::db;
use videotube::models::User;
use videotube::routes;
use videotube::services::MediaStorage;
use videotube::utils::create_access_token;

pub const TEST_ORIGIN: &str = "http://localhost:5173";

/// Get MongoDB URL from environment or use default
/// Uses MONGODB_URI from .env or constructs from MONGODB_PORT
pub fn get_mongodb_url() -> String {
    env::var("MONGODB_URI").unwrap_or_else(|_| {
        let port = env::var("MONGODB_PORT").unwrap_or_else(|_| "27017".to_string());
        format!("mongodb://localhost:{}", port)
    })
}

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        mongodb_uri: get_mongodb_url(),
        database_name: "videotube_test".to_string(),
        cors_origins: vec![TEST_ORIGIN.to_string()],
        max_upload_size: 1024 * 1024,
        auth: AuthConfig {
            access_token_secret: "test-access-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_secret: "test-refresh-secret".to_string(),
            refresh_token_expiry: 7200,
        },
        cloudinary: CloudinaryConfig {
            cloud_name: "test".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            // Nothing listens here; tests never reach the media host
            api_base: "http://127.0.0.1:9".to_string(),
        },
    }
}

/// Database handle that never connects until used; requests that touch it fail fast
pub async fn lazy_database() -> Database {
    let client = Client::with_uri_str("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=500")
        .await
        .expect("a well-formed connection string");
    client.database("videotube_test")
}

/// Fresh, uniquely named database on the configured MongoDB with indexes in place.
/// `None` when no server answers, so callers can skip.
pub async fn live_database() -> Option<Database> {
    let mongodb_url = get_mongodb_url();
    let separator = if mongodb_url.contains('?') { '&' } else { '?' };
    let uri = format!("{}{}serverSelectionTimeoutMS=1000", mongodb_url, separator);

    let client = match Client::with_uri_str(&uri).await {
        Ok(client) => client,
        Err(e) => {
            println!("⚠️  MongoDB client error, skipping: {}", e);
            return None;
        }
    };
    if let Err(e) = client.database("admin").run_command(doc! { "ping": 1 }).await {
        println!("⚠️  MongoDB not available, skipping: {}", e);
        return None;
    }

    let database = client.database(&format!("videotube_test_{}", ObjectId::new().to_hex()));
    if let Err(e) = db::ensure_indexes(&database).await {
        println!("⚠️  Could not create indexes, skipping: {}", e);
        return None;
    }
    Some(database)
}

/// Insert a user directly and return its id
pub async fn insert_user(database: &Database, username: &str) -> ObjectId {
    let user = User::new(
        username,
        &format!("{}@example.com", username),
        "Test User",
        "https://res.cloudinary.com/test/image/upload/avatar.png".to_string(),
        String::new(),
        "hash".to_string(),
    );
    db::users(database)
        .insert_one(&user)
        .await
        .expect("insert user")
        .inserted_id
        .as_object_id()
        .expect("object id")
}

pub fn test_app(
    db: Database,
    config: AppConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let media = MediaStorage::new(config.cloudinary.clone());
    App::new()
        .app_data(web::Data::new(db))
        .app_data(web::Data::new(config))
        .app_data(web::Data::new(media))
        .configure(routes::configure)
}

/// Signed access token for a user with the given id
pub fn access_token(user_id: ObjectId, config: &AppConfig) -> String {
    let mut user = User::new(
        "tester",
        "tester@example.com",
        "Test User",
        "https://res.cloudinary.com/test/image/upload/avatar.png".to_string(),
        String::new(),
        "hash".to_string(),
    );
    user.id = Some(user_id);
    create_access_token(&user, &config.auth).expect("token")
}

/// Status and JSON body, whether the service answered or a middleware rejected the request
pub async fn response_json<B: MessageBody>(
    result: Result<ServiceResponse<B>, actix_web::Error>,
) -> (StatusCode, Value) {
    match result {
        Ok(resp) => {
            let status = resp.status();
            let body = test::read_body(resp).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let body = actix_web::body::to_bytes(resp.into_body())
                .await
                .unwrap_or_default();
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
    }
}
