use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::Database;

use super::video::find_visible_video;
use crate::db;
use crate::error::{is_duplicate_key, ApiError};
use crate::models::{LikeTarget, LikeToggleResponse};
use crate::services::aggregations;
use crate::utils::{current_user_id, documents_to_json, parse_object_id, ApiResponse};

/// 404 unless `target` exists and, for videos, `viewer` may see it
async fn ensure_target_visible(db: &Database, target: LikeTarget, viewer: ObjectId) -> Result<(), ApiError> {
    let filter = doc! { "_id": target.id() };
    let (found, message) = match target {
        LikeTarget::Video(id) => {
            find_visible_video(db, id, viewer).await?;
            return Ok(());
        }
        LikeTarget::Comment(_) => (db::comments(db).count_documents(filter).await?, "Comment not found"),
        LikeTarget::Tweet(_) => (db::tweets(db).count_documents(filter).await?, "Tweet not found"),
    };
    if found == 0 {
        return Err(ApiError::not_found(message));
    }
    Ok(())
}

/// Remove the requester's like on `target` if present, create it otherwise
async fn toggle_like(db: &Database, sub: &str, target: LikeTarget) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(sub)?;
    ensure_target_visible(db, target, uid).await?;

    let removed = db::likes(db)
        .find_one_and_delete(target.filter(uid))
        .await?;

    let is_liked = match removed {
        Some(_) => false,
        None => match db::likes(db).insert_one(target.into_like(uid)).await {
            Ok(_) => true,
            // a concurrent toggle inserted the same like first
            Err(e) if is_duplicate_key(&e) => true,
            Err(e) => return Err(e.into()),
        },
    };

    log::debug!("User {} like on {} {} -> {}", uid, target.field(), target.id(), is_liked);
    Ok(ApiResponse::ok(
        LikeToggleResponse { is_liked },
        if is_liked { "Liked" } else { "Unliked" },
    ))
}

/// POST /api/v1/likes/toggle/v/{videoId}
pub async fn toggle_video_like(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    video_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let video_id = parse_object_id(&video_id, "videoId")?;
    toggle_like(&db, &user_id, LikeTarget::Video(video_id)).await
}

/// POST /api/v1/likes/toggle/c/{commentId}
pub async fn toggle_comment_like(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    comment_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let comment_id = parse_object_id(&comment_id, "commentId")?;
    toggle_like(&db, &user_id, LikeTarget::Comment(comment_id)).await
}

/// POST /api/v1/likes/toggle/t/{tweetId}
pub async fn toggle_tweet_like(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    tweet_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tweet_id = parse_object_id(&tweet_id, "tweetId")?;
    toggle_like(&db, &user_id, LikeTarget::Tweet(tweet_id)).await
}

/// GET /api/v1/likes/videos
pub async fn get_liked_videos(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;

    let videos: Vec<Document> = db::likes(&db)
        .aggregate(aggregations::liked_videos(uid))
        .await?
        .try_collect()
        .await?;

    Ok(ApiResponse::ok(
        documents_to_json(videos),
        "Liked videos fetched successfully",
    ))
}
