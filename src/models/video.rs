use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::utils::pagination::PaginationParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    /// Seconds, as reported by the media host
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub views: i64,
    #[serde(default = "default_published")]
    pub is_published: bool,
    pub owner: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_published() -> bool {
    true
}

impl Video {
    pub fn new(
        owner: ObjectId,
        title: String,
        description: String,
        video_file: String,
        thumbnail: String,
        duration: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            video_file,
            thumbnail,
            title,
            description,
            duration,
            views: 0,
            is_published: true,
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Unpublished videos are only visible to their owner
    pub fn is_visible_to(&self, viewer: &ObjectId) -> bool {
        self.is_published || &self.owner == viewer
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        VideoResponse {
            id: video.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            video_file: video.video_file,
            thumbnail: video.thumbnail,
            title: video.title,
            description: video.description,
            duration: video.duration,
            views: video.views,
            is_published: video.is_published,
            owner: video.owner.to_hex(),
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

/// Query string of `GET /videos`
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}

impl VideoListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
            sort_by: self.sort_by.clone(),
            sort_type: self.sort_type.clone(),
        }
    }

    /// Trimmed search text, `None` when blank
    pub fn search(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility() {
        let owner = ObjectId::new();
        let stranger = ObjectId::new();
        let mut video = Video::new(owner, "t".into(), "d".into(), "v".into(), "th".into(), 12.5);
        assert!(video.is_visible_to(&stranger));

        video.is_published = false;
        assert!(video.is_visible_to(&owner));
        assert!(!video.is_visible_to(&stranger));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = VideoListQuery {
            query: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(query.search(), None);

        let query = VideoListQuery {
            query: Some(" rust ".into()),
            ..Default::default()
        };
        assert_eq!(query.search(), Some("rust"));
    }
}
