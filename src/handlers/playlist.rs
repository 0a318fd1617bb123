use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use mongodb::Database;
use serde_json::json;

use crate::db;
use crate::error::ApiError;
use crate::models::{Playlist, PlaylistRequest, PlaylistResponse};
use crate::services::aggregations;
use crate::utils::{
    current_user_id, document_to_json, documents_to_json, parse_object_id, require_non_blank,
    ApiResponse,
};

async fn find_owned_playlist(
    db: &Database,
    playlist_id: ObjectId,
    uid: ObjectId,
) -> Result<Playlist, ApiError> {
    let playlist = db::playlists(db)
        .find_one(doc! { "_id": playlist_id })
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;

    if playlist.owner != uid {
        return Err(ApiError::unauthorized(
            "You are not allowed to modify this playlist",
        ));
    }
    Ok(playlist)
}

/// Apply `update` to the playlist and return the stored result
async fn update_and_fetch(
    db: &Database,
    playlist_id: ObjectId,
    update: Document,
) -> Result<Playlist, ApiError> {
    db::playlists(db)
        .find_one_and_update(doc! { "_id": playlist_id }, update)
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))
}

/// POST /api/v1/playlists
pub async fn create_playlist(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    request: web::Json<PlaylistRequest>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let name = require_non_blank(&request.name, "name")?;
    let description = require_non_blank(&request.description, "description")?;

    let mut playlist = Playlist::new(uid, name, description);
    let result = db::playlists(&db).insert_one(&playlist).await?;
    playlist.id = result.inserted_id.as_object_id();

    log::info!("User {} created playlist {}", uid, playlist.name);
    Ok(ApiResponse::created(
        PlaylistResponse::from(playlist),
        "Playlist created successfully",
    ))
}

/// GET /api/v1/playlists/user/{userId}
pub async fn get_user_playlists(
    db: web::Data<Database>,
    owner_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let owner = parse_object_id(&owner_id, "userId")?;

    let playlists: Vec<Document> = db::playlists(&db)
        .aggregate(aggregations::user_playlists(owner))
        .await?
        .try_collect()
        .await?;

    Ok(ApiResponse::ok(
        documents_to_json(playlists),
        "User playlists fetched successfully",
    ))
}

/// GET /api/v1/playlists/{playlistId}
pub async fn get_playlist_by_id(
    db: web::Data<Database>,
    playlist_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let playlist_id = parse_object_id(&playlist_id, "playlistId")?;

    let found: Vec<Document> = db::playlists(&db)
        .aggregate(aggregations::playlist_details(playlist_id))
        .await?
        .try_collect()
        .await?;

    let playlist = found
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;

    Ok(ApiResponse::ok(
        document_to_json(playlist),
        "Playlist fetched successfully",
    ))
}

/// PATCH /api/v1/playlists/{playlistId}
pub async fn update_playlist(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    playlist_id: web::Path<String>,
    request: web::Json<PlaylistRequest>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let playlist_id = parse_object_id(&playlist_id, "playlistId")?;
    let name = require_non_blank(&request.name, "name")?;
    let description = require_non_blank(&request.description, "description")?;
    find_owned_playlist(&db, playlist_id, uid).await?;

    let playlist = update_and_fetch(
        &db,
        playlist_id,
        doc! { "$set": {
            "name": name,
            "description": description,
            "updatedAt": mongodb::bson::DateTime::now(),
        } },
    )
    .await?;

    Ok(ApiResponse::ok(
        PlaylistResponse::from(playlist),
        "Playlist updated successfully",
    ))
}

/// DELETE /api/v1/playlists/{playlistId}
pub async fn delete_playlist(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    playlist_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let playlist_id = parse_object_id(&playlist_id, "playlistId")?;
    find_owned_playlist(&db, playlist_id, uid).await?;

    db::playlists(&db)
        .delete_one(doc! { "_id": playlist_id })
        .await?;

    Ok(ApiResponse::ok(
        json!({ "playlistId": playlist_id.to_hex() }),
        "Playlist deleted successfully",
    ))
}

/// PATCH /api/v1/playlists/add/{videoId}/{playlistId}
pub async fn add_video_to_playlist(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let (video_id, playlist_id) = path.into_inner();
    let video_id = parse_object_id(&video_id, "videoId")?;
    let playlist_id = parse_object_id(&playlist_id, "playlistId")?;

    let playlist = find_owned_playlist(&db, playlist_id, uid).await?;
    if db::videos(&db).count_documents(doc! { "_id": video_id }).await? == 0 {
        return Err(ApiError::not_found("Video not found"));
    }

    if playlist.contains(&video_id) {
        return Ok(ApiResponse::ok(
            json!({ "added": false, "playlist": PlaylistResponse::from(playlist) }),
            "Video is already in the playlist",
        ));
    }

    let playlist = update_and_fetch(
        &db,
        playlist_id,
        doc! {
            "$addToSet": { "videos": video_id },
            "$set": { "updatedAt": mongodb::bson::DateTime::now() },
        },
    )
    .await?;

    Ok(ApiResponse::ok(
        json!({ "added": true, "playlist": PlaylistResponse::from(playlist) }),
        "Video added to playlist successfully",
    ))
}

/// PATCH /api/v1/playlists/remove/{videoId}/{playlistId}
pub async fn remove_video_from_playlist(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let (video_id, playlist_id) = path.into_inner();
    let video_id = parse_object_id(&video_id, "videoId")?;
    let playlist_id = parse_object_id(&playlist_id, "playlistId")?;

    let playlist = find_owned_playlist(&db, playlist_id, uid).await?;
    if !playlist.contains(&video_id) {
        return Ok(ApiResponse::ok(
            json!({ "removed": false, "playlist": PlaylistResponse::from(playlist) }),
            "Video is not in the playlist",
        ));
    }

    let playlist = update_and_fetch(
        &db,
        playlist_id,
        doc! {
            "$pull": { "videos": video_id },
            "$set": { "updatedAt": mongodb::bson::DateTime::now() },
        },
    )
    .await?;

    Ok(ApiResponse::ok(
        json!({ "removed": true, "playlist": PlaylistResponse::from(playlist) }),
        "Video removed from playlist successfully",
    ))
}
