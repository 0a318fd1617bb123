use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use mongodb::Database;
use serde_json::json;

use crate::db;
use crate::error::ApiError;
use crate::models::{ContentRequest, Tweet, TweetResponse};
use crate::services::aggregations;
use crate::utils::{
    current_user_id, documents_to_json, parse_object_id, require_non_blank, ApiResponse,
};

async fn find_owned_tweet(db: &Database, tweet_id: ObjectId, uid: ObjectId) -> Result<Tweet, ApiError> {
    let tweet = db::tweets(db)
        .find_one(doc! { "_id": tweet_id })
        .await?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;

    if tweet.owner != uid {
        return Err(ApiError::unauthorized("You are not allowed to modify this tweet"));
    }
    Ok(tweet)
}

/// POST /api/v1/tweets
pub async fn create_tweet(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    request: web::Json<ContentRequest>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let content = require_non_blank(&request.content, "content")?;

    let mut tweet = Tweet::new(uid, content);
    let result = db::tweets(&db).insert_one(&tweet).await?;
    tweet.id = result.inserted_id.as_object_id();

    Ok(ApiResponse::created(
        TweetResponse::from(tweet),
        "Tweet created successfully",
    ))
}

/// GET /api/v1/tweets/user/{userId}
pub async fn get_user_tweets(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    owner_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let viewer = current_user_id(&user_id)?;
    let owner = parse_object_id(&owner_id, "userId")?;

    if db::users(&db).count_documents(doc! { "_id": owner }).await? == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    let tweets: Vec<Document> = db::tweets(&db)
        .aggregate(aggregations::user_tweets(owner, viewer))
        .await?
        .try_collect()
        .await?;

    Ok(ApiResponse::ok(
        documents_to_json(tweets),
        "Tweets fetched successfully",
    ))
}

/// PATCH /api/v1/tweets/{tweetId}
pub async fn update_tweet(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    tweet_id: web::Path<String>,
    request: web::Json<ContentRequest>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let tweet_id = parse_object_id(&tweet_id, "tweetId")?;
    let content = require_non_blank(&request.content, "content")?;
    find_owned_tweet(&db, tweet_id, uid).await?;

    let tweet = db::tweets(&db)
        .find_one_and_update(
            doc! { "_id": tweet_id },
            doc! { "$set": { "content": content, "updatedAt": mongodb::bson::DateTime::now() } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;

    Ok(ApiResponse::ok(
        TweetResponse::from(tweet),
        "Tweet updated successfully",
    ))
}

/// DELETE /api/v1/tweets/{tweetId}
pub async fn delete_tweet(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    tweet_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let tweet_id = parse_object_id(&tweet_id, "tweetId")?;
    find_owned_tweet(&db, tweet_id, uid).await?;

    db::tweets(&db).delete_one(doc! { "_id": tweet_id }).await?;
    db::likes(&db).delete_many(doc! { "tweet": tweet_id }).await?;

    Ok(ApiResponse::ok(
        json!({ "tweetId": tweet_id.to_hex() }),
        "Tweet deleted successfully",
    ))
}
