use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Database;
use serde::Serialize;

use crate::db;
use crate::error::ApiError;
use crate::services::aggregations;
use crate::utils::{current_user_id, documents_to_json, get_number, ApiResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_subscribers: u64,
    pub total_videos: u64,
    pub total_views: i64,
    pub total_likes: i64,
}

/// GET /api/v1/dashboard/stats
pub async fn get_channel_stats(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
) -> Result<HttpResponse, ApiError> {
    let owner = current_user_id(&user_id)?;

    let subscriptions = db::subscriptions(&db);
    let videos = db::videos(&db);
    let (subscribers, video_count, totals) = tokio::join!(
        async { subscriptions.count_documents(doc! { "channel": owner }).await },
        async { videos.count_documents(doc! { "owner": owner }).await },
        async {
            let rows: Vec<Document> = videos
                .aggregate(aggregations::channel_video_totals(owner))
                .await?
                .try_collect()
                .await?;
            Ok::<_, ApiError>(rows)
        },
    );

    // No videos means no $group row
    let totals = totals?.into_iter().next().unwrap_or_default();
    let stats = ChannelStats {
        total_subscribers: subscribers?,
        total_videos: video_count?,
        total_views: get_number(&totals, "totalViews"),
        total_likes: get_number(&totals, "totalLikes"),
    };

    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

/// GET /api/v1/dashboard/videos
pub async fn get_channel_videos(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
) -> Result<HttpResponse, ApiError> {
    let owner = current_user_id(&user_id)?;

    let videos: Vec<Document> = db::videos(&db)
        .aggregate(aggregations::channel_videos(owner))
        .await?
        .try_collect()
        .await?;

    Ok(ApiResponse::ok(
        documents_to_json(videos),
        "Channel videos fetched successfully",
    ))
}
