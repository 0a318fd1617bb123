use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Database;

use crate::db;
use crate::error::{is_duplicate_key, ApiError};
use crate::models::{Subscription, SubscriptionToggleResponse};
use crate::services::aggregations;
use crate::utils::{current_user_id, documents_to_json, parse_object_id, ApiResponse};

/// Subscribe to or unsubscribe from a channel
/// POST /api/v1/subscriptions/u/{channelId}
pub async fn toggle_subscription(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    channel_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let subscriber = current_user_id(&user_id)?;
    let channel = parse_object_id(&channel_id, "channelId")?;

    if subscriber == channel {
        return Err(ApiError::bad_request("You cannot subscribe to your own channel"));
    }
    if db::users(&db).count_documents(doc! { "_id": channel }).await? == 0 {
        return Err(ApiError::not_found("Channel not found"));
    }

    let removed = db::subscriptions(&db)
        .find_one_and_delete(doc! { "subscriber": subscriber, "channel": channel })
        .await?;

    let subscribed = match removed {
        Some(_) => false,
        None => match db::subscriptions(&db)
            .insert_one(Subscription::new(subscriber, channel))
            .await
        {
            Ok(_) => true,
            // lost a race with a concurrent subscribe
            Err(e) if is_duplicate_key(&e) => true,
            Err(e) => return Err(e.into()),
        },
    };

    log::info!(
        "User {} {} channel {}",
        subscriber,
        if subscribed { "subscribed to" } else { "unsubscribed from" },
        channel
    );
    Ok(ApiResponse::ok(
        SubscriptionToggleResponse { subscribed },
        if subscribed {
            "Subscribed successfully"
        } else {
            "Unsubscribed successfully"
        },
    ))
}

/// GET /api/v1/subscriptions/u/{channelId}
pub async fn get_channel_subscribers(
    db: web::Data<Database>,
    channel_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let channel = parse_object_id(&channel_id, "channelId")?;

    let subscribers: Vec<Document> = db::subscriptions(&db)
        .aggregate(aggregations::channel_subscribers(channel))
        .await?
        .try_collect()
        .await?;

    Ok(ApiResponse::ok(
        documents_to_json(subscribers),
        "Subscribers fetched successfully",
    ))
}

/// GET /api/v1/subscriptions/c/{subscriberId}
pub async fn get_subscribed_channels(
    db: web::Data<Database>,
    subscriber_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let subscriber = parse_object_id(&subscriber_id, "subscriberId")?;

    let channels: Vec<Document> = db::subscriptions(&db)
        .aggregate(aggregations::subscribed_channels(subscriber))
        .await?
        .try_collect()
        .await?;

    Ok(ApiResponse::ok(
        documents_to_json(channels),
        "Subscribed channels fetched successfully",
    ))
}
