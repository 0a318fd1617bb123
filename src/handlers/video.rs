use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::ReturnDocument;
use mongodb::Database;
use serde_json::json;

use crate::config::AppConfig;
use crate::db;
use crate::error::ApiError;
use crate::models::{Video, VideoListQuery, VideoResponse};
use crate::services::{aggregations, MediaKind, MediaStorage};
use crate::utils::{
    current_user_id, document_to_json, documents_to_json, parse_object_id, ApiResponse,
    MultipartForm, PaginatedResponse,
};

/// Fields clients may pass as `sortBy`
const SORTABLE_FIELDS: &[&str] = &["createdAt", "views", "duration", "title"];

/// Load a video and make sure `uid` owns it
async fn find_owned_video(
    db: &Database,
    video_id: ObjectId,
    uid: ObjectId,
    action: &str,
) -> Result<Video, ApiError> {
    let video = db::videos(db)
        .find_one(doc! { "_id": video_id })
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    if video.owner != uid {
        log::warn!("User {} tried to {} video {}", uid, action, video_id);
        return Err(ApiError::unauthorized(format!(
            "You are not allowed to {} this video",
            action
        )));
    }
    Ok(video)
}

/// Load a video `viewer` may see; other users' drafts read as missing
pub(crate) async fn find_visible_video(
    db: &Database,
    video_id: ObjectId,
    viewer: ObjectId,
) -> Result<Video, ApiError> {
    db::videos(db)
        .find_one(doc! { "_id": video_id })
        .await?
        .filter(|v| v.is_visible_to(&viewer))
        .ok_or_else(|| ApiError::not_found("Video not found"))
}

/// List a channel's videos with search, sort and pagination
/// GET /api/v1/videos
pub async fn get_all_videos(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    query: web::Query<VideoListQuery>,
) -> Result<HttpResponse, ApiError> {
    let viewer = current_user_id(&user_id)?;
    let owner = parse_object_id(query.user_id.as_deref().unwrap_or_default(), "userId")?;
    let params = query.pagination();

    let filter = aggregations::video_list_filter(owner, viewer, query.search());
    let sort = params.build_sort_doc("createdAt", SORTABLE_FIELDS);

    let total = db::videos(&db).count_documents(filter.clone()).await?;
    let docs: Vec<Document> = db::videos(&db)
        .aggregate(aggregations::video_list(filter, sort, params.skip(), params.limit()))
        .await?
        .try_collect()
        .await?;

    Ok(ApiResponse::ok(
        PaginatedResponse::new(documents_to_json(docs), total, &params),
        "Videos fetched successfully",
    ))
}

/// POST /api/v1/videos
pub async fn publish_video(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    storage: web::Data<MediaStorage>,
    user_id: web::ReqData<String>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let mut form = MultipartForm::read(payload, config.max_upload_size).await?;

    let title = form.require_text("title")?;
    let description = form.require_text("description")?;
    let video_file = form.require_file("videoFile")?;
    let thumbnail_file = form.require_file("thumbnail")?;

    let uploaded_video = storage.upload(video_file, MediaKind::Video).await?;
    let thumbnail = match storage.upload(thumbnail_file, MediaKind::Image).await {
        Ok(media) => media,
        Err(e) => {
            storage.delete_quietly(&uploaded_video.url, MediaKind::Video).await;
            return Err(e);
        }
    };

    let mut video = Video::new(
        uid,
        title,
        description,
        uploaded_video.url,
        thumbnail.url,
        uploaded_video.duration.unwrap_or_default(),
    );

    let result = match db::videos(&db).insert_one(&video).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("Saving video for user {} failed, removing its uploads", uid);
            storage.delete_quietly(&video.video_file, MediaKind::Video).await;
            storage.delete_quietly(&video.thumbnail, MediaKind::Image).await;
            return Err(e.into());
        }
    };
    video.id = result.inserted_id.as_object_id();

    log::info!("User {} published video {:?}", uid, video.id);
    Ok(ApiResponse::created(
        VideoResponse::from(video),
        "Video published successfully",
    ))
}

/// Video with owner channel and like info; counts a view and records watch history
/// GET /api/v1/videos/{videoId}
pub async fn get_video(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    video_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let viewer = current_user_id(&user_id)?;
    let video_id = parse_object_id(&video_id, "videoId")?;

    let video = find_visible_video(&db, video_id, viewer).await?;

    db::videos(&db)
        .update_one(doc! { "_id": video_id }, doc! { "$inc": { "views": 1 } })
        .await?;

    // Most recent first, no duplicates
    let users = db::users(&db);
    users
        .update_one(
            doc! { "_id": viewer },
            doc! { "$pull": { "watchHistory": video_id } },
        )
        .await?;
    users
        .update_one(
            doc! { "_id": viewer },
            doc! { "$push": { "watchHistory": { "$each": [video_id], "$position": 0 } } },
        )
        .await?;

    let details: Vec<Document> = db::videos(&db)
        .aggregate(aggregations::video_details(video_id, viewer))
        .await?
        .try_collect()
        .await?;

    let details = details.into_iter().next().ok_or_else(|| {
        log::error!("Video {} vanished while loading details", video.title);
        ApiError::not_found("Video not found")
    })?;

    Ok(ApiResponse::ok(
        document_to_json(details),
        "Video fetched successfully",
    ))
}

/// Update title, description and thumbnail
/// PATCH /api/v1/videos/{videoId}
pub async fn update_video(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    storage: web::Data<MediaStorage>,
    user_id: web::ReqData<String>,
    video_id: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let video_id = parse_object_id(&video_id, "videoId")?;
    let mut form = MultipartForm::read(payload, config.max_upload_size).await?;

    let title = form.require_text("title")?;
    let description = form.require_text("description")?;
    let thumbnail_file = form.require_file("thumbnail")?;

    let existing = find_owned_video(&db, video_id, uid, "update").await?;
    let thumbnail = storage.upload(thumbnail_file, MediaKind::Image).await?;

    let updated = db::videos(&db)
        .find_one_and_update(
            doc! { "_id": video_id },
            doc! { "$set": {
                "title": title,
                "description": description,
                "thumbnail": &thumbnail.url,
                "updatedAt": mongodb::bson::DateTime::now(),
            } },
        )
        .return_document(ReturnDocument::After)
        .await;

    let video = match updated {
        Ok(Some(video)) => video,
        outcome => {
            // the new thumbnail is not referenced by any document
            storage.delete_quietly(&thumbnail.url, MediaKind::Image).await;
            return Err(match outcome {
                Err(e) => e.into(),
                _ => ApiError::not_found("Video not found"),
            });
        }
    };

    storage.delete_quietly(&existing.thumbnail, MediaKind::Image).await;

    Ok(ApiResponse::ok(
        VideoResponse::from(video),
        "Video updated successfully",
    ))
}

/// Delete a video with its comments, likes, playlist entries and history entries
/// DELETE /api/v1/videos/{videoId}
pub async fn delete_video(
    db: web::Data<Database>,
    storage: web::Data<MediaStorage>,
    user_id: web::ReqData<String>,
    video_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let video_id = parse_object_id(&video_id, "videoId")?;
    let video = find_owned_video(&db, video_id, uid, "delete").await?;

    db::videos(&db).delete_one(doc! { "_id": video_id }).await?;

    let comment_ids: Vec<Bson> = db::comments(&db)
        .distinct("_id", doc! { "video": video_id })
        .await?;

    let likes = db::likes(&db)
        .delete_many(doc! { "$or": [
            { "video": video_id },
            { "comment": { "$in": comment_ids } },
        ] })
        .await?;
    let comments = db::comments(&db)
        .delete_many(doc! { "video": video_id })
        .await?;
    db::playlists(&db)
        .update_many(
            doc! { "videos": video_id },
            doc! { "$pull": { "videos": video_id } },
        )
        .await?;
    db::users(&db)
        .update_many(
            doc! { "watchHistory": video_id },
            doc! { "$pull": { "watchHistory": video_id } },
        )
        .await?;

    storage.delete_quietly(&video.video_file, MediaKind::Video).await;
    storage.delete_quietly(&video.thumbnail, MediaKind::Image).await;

    log::info!(
        "Deleted video {} ({} comments, {} likes)",
        video_id,
        comments.deleted_count,
        likes.deleted_count
    );
    Ok(ApiResponse::ok(
        json!({ "videoId": video_id.to_hex() }),
        "Video deleted successfully",
    ))
}

/// PATCH /api/v1/videos/toggle/publish/{videoId}
pub async fn toggle_publish_status(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    video_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let video_id = parse_object_id(&video_id, "videoId")?;
    let video = find_owned_video(&db, video_id, uid, "publish").await?;

    let updated = db::videos(&db)
        .find_one_and_update(
            doc! { "_id": video_id },
            doc! { "$set": {
                "isPublished": !video.is_published,
                "updatedAt": mongodb::bson::DateTime::now(),
            } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    Ok(ApiResponse::ok(
        json!({ "isPublished": updated.is_published }),
        "Video publish status toggled successfully",
    ))
}
