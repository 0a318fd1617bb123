use chrono::{DateTime, Utc};
use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

/// A like points at exactly one of a video, a comment or a tweet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<ObjectId>,
    pub liked_by: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video(ObjectId),
    Comment(ObjectId),
    Tweet(ObjectId),
}

impl LikeTarget {
    /// Field name of the target on the like document
    pub fn field(&self) -> &'static str {
        match self {
            Self::Video(_) => "video",
            Self::Comment(_) => "comment",
            Self::Tweet(_) => "tweet",
        }
    }

    pub fn id(&self) -> ObjectId {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Tweet(id) => *id,
        }
    }

    /// Filter matching the like of `liked_by` on this target
    pub fn filter(&self, liked_by: ObjectId) -> Document {
        let field = self.field();
        doc! { field: self.id(), "likedBy": liked_by }
    }

    pub fn into_like(self, liked_by: ObjectId) -> Like {
        let now = Utc::now();
        let mut like = Like {
            id: None,
            video: None,
            comment: None,
            tweet: None,
            liked_by,
            created_at: now,
            updated_at: now,
        };
        match self {
            Self::Video(id) => like.video = Some(id),
            Self::Comment(id) => like.comment = Some(id),
            Self::Tweet(id) => like.tweet = Some(id),
        }
        like
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggleResponse {
    pub is_liked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_targets_single_field() {
        let tweet = ObjectId::new();
        let user = ObjectId::new();
        let filter = LikeTarget::Tweet(tweet).filter(user);

        assert_eq!(filter.get_object_id("tweet").unwrap(), tweet);
        assert_eq!(filter.get_object_id("likedBy").unwrap(), user);
        assert!(!filter.contains_key("video"));
        assert!(!filter.contains_key("comment"));
    }

    #[test]
    fn test_into_like_sets_exactly_one_target() {
        let comment = ObjectId::new();
        let like = LikeTarget::Comment(comment).into_like(ObjectId::new());
        assert_eq!(like.comment, Some(comment));
        assert!(like.video.is_none());
        assert!(like.tweet.is_none());

        let stored = mongodb::bson::to_document(&like).unwrap();
        assert!(stored.contains_key("comment"));
        assert!(!stored.contains_key("video"));
        assert!(!stored.contains_key("tweet"));
    }
}
