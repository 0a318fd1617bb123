use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub content: String,
    pub video: ObjectId,
    pub owner: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(video: ObjectId, owner: ObjectId, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            content,
            video,
            owner,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub video: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        CommentResponse {
            id: comment.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            content: comment.content,
            video: comment.video.to_hex(),
            owner: comment.owner.to_hex(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// Body shared by comment and tweet create/update
#[derive(Debug, Deserialize, Default)]
pub struct ContentRequest {
    #[serde(default)]
    pub content: String,
}
