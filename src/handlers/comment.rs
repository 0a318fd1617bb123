use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use mongodb::Database;
use serde_json::json;

use super::video::find_visible_video;
use crate::db;
use crate::error::ApiError;
use crate::models::{Comment, CommentResponse, ContentRequest};
use crate::services::aggregations;
use crate::utils::{
    current_user_id, documents_to_json, parse_object_id, require_non_blank, ApiResponse,
    PaginatedResponse, PaginationParams,
};

async fn find_owned_comment(
    db: &Database,
    comment_id: ObjectId,
    uid: ObjectId,
) -> Result<Comment, ApiError> {
    let comment = db::comments(db)
        .find_one(doc! { "_id": comment_id })
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if comment.owner != uid {
        return Err(ApiError::unauthorized(
            "You are not allowed to modify this comment",
        ));
    }
    Ok(comment)
}

/// GET /api/v1/comments/{videoId}
pub async fn get_video_comments(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    video_id: web::Path<String>,
    params: web::Query<PaginationParams>,
) -> Result<HttpResponse, ApiError> {
    let viewer = current_user_id(&user_id)?;
    let video_id = parse_object_id(&video_id, "videoId")?;
    find_visible_video(&db, video_id, viewer).await?;

    let total = db::comments(&db)
        .count_documents(doc! { "video": video_id })
        .await?;
    let docs: Vec<Document> = db::comments(&db)
        .aggregate(aggregations::video_comments(
            video_id,
            viewer,
            params.skip(),
            params.limit(),
        ))
        .await?
        .try_collect()
        .await?;

    Ok(ApiResponse::ok(
        PaginatedResponse::new(documents_to_json(docs), total, &params),
        "Comments fetched successfully",
    ))
}

/// POST /api/v1/comments/{videoId}
pub async fn add_comment(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    video_id: web::Path<String>,
    request: web::Json<ContentRequest>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let video_id = parse_object_id(&video_id, "videoId")?;
    let content = require_non_blank(&request.content, "content")?;
    find_visible_video(&db, video_id, uid).await?;

    let mut comment = Comment::new(video_id, uid, content);
    let result = db::comments(&db).insert_one(&comment).await?;
    comment.id = result.inserted_id.as_object_id();

    Ok(ApiResponse::created(
        CommentResponse::from(comment),
        "Comment added successfully",
    ))
}

/// PATCH /api/v1/comments/c/{commentId}
pub async fn update_comment(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    comment_id: web::Path<String>,
    request: web::Json<ContentRequest>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let comment_id = parse_object_id(&comment_id, "commentId")?;
    let content = require_non_blank(&request.content, "content")?;
    find_owned_comment(&db, comment_id, uid).await?;

    let comment = db::comments(&db)
        .find_one_and_update(
            doc! { "_id": comment_id },
            doc! { "$set": { "content": content, "updatedAt": mongodb::bson::DateTime::now() } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    Ok(ApiResponse::ok(
        CommentResponse::from(comment),
        "Comment updated successfully",
    ))
}

/// DELETE /api/v1/comments/c/{commentId}
pub async fn delete_comment(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    comment_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let comment_id = parse_object_id(&comment_id, "commentId")?;
    find_owned_comment(&db, comment_id, uid).await?;

    db::comments(&db).delete_one(doc! { "_id": comment_id }).await?;
    db::likes(&db)
        .delete_many(doc! { "comment": comment_id })
        .await?;

    Ok(ApiResponse::ok(
        json!({ "commentId": comment_id.to_hex() }),
        "Comment deleted successfully",
    ))
}
