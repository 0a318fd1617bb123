/// Aggregation pipelines behind the read endpoints
///
/// Each function only builds stages; handlers run them against the matching
/// collection. Joins use `$lookup` with a sub-pipeline, which needs MongoDB 5.0+.
use mongodb::bson::{doc, oid::ObjectId, Document, Regex};

use crate::db::{LIKES, SUBSCRIPTIONS, USERS, VIDEOS};

/// `$lookup` of the `owner` user, reduced to the public profile fields in `fields`
pub fn owner_lookup(fields: &[&str]) -> Document {
    let mut projection = Document::new();
    for field in fields {
        projection.insert(*field, 1);
    }
    doc! {
        "$lookup": {
            "from": USERS,
            "localField": "owner",
            "foreignField": "_id",
            "as": "owner",
            "pipeline": [ { "$project": projection } ],
        }
    }
}

/// Replace the single-element `owner` array with its element
pub fn first_owner() -> Document {
    doc! { "$addFields": { "owner": { "$first": "$owner" } } }
}

/// Adds `likesCount` and `isLiked` for documents referenced by `field` on the like
pub fn like_stats(field: &str, viewer: ObjectId) -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": LIKES,
                "localField": "_id",
                "foreignField": field,
                "as": "likes",
            }
        },
        doc! {
            "$addFields": {
                "likesCount": { "$size": "$likes" },
                "isLiked": { "$in": [viewer, "$likes.likedBy"] },
            }
        },
        doc! { "$project": { "likes": 0 } },
    ]
}

/// Escape regex metacharacters so user search text matches literally
pub fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Filter for the video listing: one owner, optional text search, drafts only for the owner
pub fn video_list_filter(owner: ObjectId, viewer: ObjectId, search: Option<&str>) -> Document {
    let mut filter = doc! { "owner": owner };
    if owner != viewer {
        filter.insert("isPublished", true);
    }
    if let Some(text) = search {
        let pattern = Regex {
            pattern: escape_regex(text),
            options: "i".to_string(),
        };
        filter.insert(
            "$or",
            vec![
                doc! { "title": pattern.clone() },
                doc! { "description": pattern },
            ],
        );
    }
    filter
}

pub fn video_list(filter: Document, sort: Document, skip: i64, limit: i64) -> Vec<Document> {
    vec![
        doc! { "$match": filter },
        doc! { "$sort": sort },
        doc! { "$skip": skip },
        doc! { "$limit": limit },
        owner_lookup(&["username", "fullname", "avatar"]),
        first_owner(),
    ]
}

/// Single video with owner channel info and like stats for `viewer`
pub fn video_details(video_id: ObjectId, viewer: ObjectId) -> Vec<Document> {
    let mut pipeline = vec![
        doc! { "$match": { "_id": video_id } },
        doc! {
            "$lookup": {
                "from": USERS,
                "localField": "owner",
                "foreignField": "_id",
                "as": "owner",
                "pipeline": [
                    {
                        "$lookup": {
                            "from": SUBSCRIPTIONS,
                            "localField": "_id",
                            "foreignField": "channel",
                            "as": "subscribers",
                        }
                    },
                    {
                        "$addFields": {
                            "subscribersCount": { "$size": "$subscribers" },
                            "isSubscribed": { "$in": [viewer, "$subscribers.subscriber"] },
                        }
                    },
                    {
                        "$project": {
                            "username": 1,
                            "fullname": 1,
                            "avatar": 1,
                            "subscribersCount": 1,
                            "isSubscribed": 1,
                        }
                    },
                ],
            }
        },
        first_owner(),
    ];
    pipeline.extend(like_stats("video", viewer));
    pipeline
}

/// Channel page of `username` as seen by `viewer`
pub fn channel_profile(username: &str, viewer: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "username": username } },
        doc! {
            "$lookup": {
                "from": SUBSCRIPTIONS,
                "localField": "_id",
                "foreignField": "channel",
                "as": "subscribers",
            }
        },
        doc! {
            "$lookup": {
                "from": SUBSCRIPTIONS,
                "localField": "_id",
                "foreignField": "subscriber",
                "as": "subscribedTo",
            }
        },
        doc! {
            "$addFields": {
                "subscribersCount": { "$size": "$subscribers" },
                "channelsSubscribedToCount": { "$size": "$subscribedTo" },
                "isSubscribed": { "$in": [viewer, "$subscribers.subscriber"] },
            }
        },
        doc! {
            "$project": {
                "fullname": 1,
                "username": 1,
                "email": 1,
                "avatar": 1,
                "coverImage": 1,
                "subscribersCount": 1,
                "channelsSubscribedToCount": 1,
                "isSubscribed": 1,
                "createdAt": 1,
            }
        },
    ]
}

/// Videos of the user's watch history, in history order
pub fn watch_history(user_id: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "_id": user_id } },
        doc! { "$project": { "watchHistory": 1 } },
        doc! { "$unwind": { "path": "$watchHistory", "includeArrayIndex": "position" } },
        doc! {
            "$lookup": {
                "from": VIDEOS,
                "localField": "watchHistory",
                "foreignField": "_id",
                "as": "video",
                "pipeline": [
                    // drafts stay in the history but only their owner sees them
                    { "$match": { "$or": [{ "isPublished": true }, { "owner": user_id }] } },
                    owner_lookup(&["fullname", "username", "avatar"]),
                    first_owner(),
                ],
            }
        },
        doc! { "$unwind": "$video" },
        doc! { "$sort": { "position": 1 } },
        doc! { "$replaceRoot": { "newRoot": "$video" } },
    ]
}

pub fn video_comments(video_id: ObjectId, viewer: ObjectId, skip: i64, limit: i64) -> Vec<Document> {
    let mut pipeline = vec![
        doc! { "$match": { "video": video_id } },
        doc! { "$sort": { "createdAt": -1, "_id": -1 } },
        doc! { "$skip": skip },
        doc! { "$limit": limit },
        owner_lookup(&["username", "fullname", "avatar"]),
        first_owner(),
    ];
    pipeline.extend(like_stats("comment", viewer));
    pipeline
}

/// Published videos liked by `user`, most recent like first
pub fn liked_videos(user: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "likedBy": user, "video": { "$exists": true } } },
        doc! { "$sort": { "createdAt": -1 } },
        doc! {
            "$lookup": {
                "from": VIDEOS,
                "localField": "video",
                "foreignField": "_id",
                "as": "likedVideo",
                "pipeline": [
                    { "$match": { "isPublished": true } },
                    owner_lookup(&["username", "fullname", "avatar"]),
                    first_owner(),
                ],
            }
        },
        doc! { "$unwind": "$likedVideo" },
        doc! { "$replaceRoot": { "newRoot": "$likedVideo" } },
    ]
}

pub fn user_tweets(owner: ObjectId, viewer: ObjectId) -> Vec<Document> {
    let mut pipeline = vec![
        doc! { "$match": { "owner": owner } },
        doc! { "$sort": { "createdAt": -1 } },
        owner_lookup(&["username", "avatar"]),
        first_owner(),
    ];
    pipeline.extend(like_stats("tweet", viewer));
    pipeline
}

/// Playlists of `owner` with video count and summed views
pub fn user_playlists(owner: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "owner": owner } },
        doc! { "$sort": { "createdAt": -1 } },
        doc! {
            "$lookup": {
                "from": VIDEOS,
                "localField": "videos",
                "foreignField": "_id",
                "as": "resolved",
            }
        },
        doc! {
            "$addFields": {
                "totalVideos": { "$size": "$resolved" },
                "totalViews": { "$sum": "$resolved.views" },
            }
        },
        doc! { "$project": { "resolved": 0 } },
    ]
}

/// Playlist with its published videos resolved in playlist order
pub fn playlist_details(playlist_id: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "_id": playlist_id } },
        doc! {
            "$lookup": {
                "from": VIDEOS,
                "localField": "videos",
                "foreignField": "_id",
                "as": "resolved",
                "pipeline": [
                    { "$match": { "isPublished": true } },
                    owner_lookup(&["username", "fullname", "avatar"]),
                    first_owner(),
                ],
            }
        },
        // $lookup loses array order; keep the stored ids that resolved, then map them onto the videos
        doc! {
            "$addFields": {
                "videos": {
                    "$map": {
                        "input": {
                            "$filter": {
                                "input": "$videos",
                                "as": "id",
                                "cond": { "$in": ["$$id", "$resolved._id"] },
                            }
                        },
                        "as": "id",
                        "in": {
                            "$first": {
                                "$filter": {
                                    "input": "$resolved",
                                    "as": "v",
                                    "cond": { "$eq": ["$$v._id", "$$id"] },
                                }
                            }
                        },
                    }
                }
            }
        },
        doc! {
            "$addFields": {
                "totalVideos": { "$size": "$videos" },
                "totalViews": { "$sum": "$videos.views" },
            }
        },
        owner_lookup(&["username", "fullname", "avatar"]),
        first_owner(),
        doc! { "$project": { "resolved": 0 } },
    ]
}

/// Subscribers of `channel`; `subscribedToSubscriber` tells whether the channel follows them back
pub fn channel_subscribers(channel: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "channel": channel } },
        doc! { "$sort": { "createdAt": -1 } },
        doc! {
            "$lookup": {
                "from": USERS,
                "localField": "subscriber",
                "foreignField": "_id",
                "as": "subscriber",
                "pipeline": [
                    {
                        "$lookup": {
                            "from": SUBSCRIPTIONS,
                            "localField": "_id",
                            "foreignField": "channel",
                            "as": "subscribersOfSubscriber",
                        }
                    },
                    {
                        "$addFields": {
                            "subscribedToSubscriber": {
                                "$in": [channel, "$subscribersOfSubscriber.subscriber"]
                            },
                            "subscribersCount": { "$size": "$subscribersOfSubscriber" },
                        }
                    },
                    {
                        "$project": {
                            "username": 1,
                            "fullname": 1,
                            "avatar": 1,
                            "subscribedToSubscriber": 1,
                            "subscribersCount": 1,
                        }
                    },
                ],
            }
        },
        doc! { "$unwind": "$subscriber" },
        doc! { "$replaceRoot": { "newRoot": "$subscriber" } },
    ]
}

/// Channels `subscriber` follows, each with its latest published video
pub fn subscribed_channels(subscriber: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "subscriber": subscriber } },
        doc! { "$sort": { "createdAt": -1 } },
        doc! {
            "$lookup": {
                "from": USERS,
                "localField": "channel",
                "foreignField": "_id",
                "as": "channel",
                "pipeline": [
                    {
                        "$lookup": {
                            "from": VIDEOS,
                            "localField": "_id",
                            "foreignField": "owner",
                            "as": "videos",
                            "pipeline": [
                                { "$match": { "isPublished": true } },
                                { "$sort": { "createdAt": -1 } },
                                { "$limit": 1 },
                            ],
                        }
                    },
                    { "$addFields": { "latestVideo": { "$first": "$videos" } } },
                    {
                        "$project": {
                            "username": 1,
                            "fullname": 1,
                            "avatar": 1,
                            "latestVideo": 1,
                        }
                    },
                ],
            }
        },
        doc! { "$unwind": "$channel" },
        doc! { "$replaceRoot": { "newRoot": "$channel" } },
    ]
}

/// Total views and likes across all videos of `owner`, as a single `{totalViews, totalLikes}` row
pub fn channel_video_totals(owner: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "owner": owner } },
        doc! {
            "$lookup": {
                "from": LIKES,
                "localField": "_id",
                "foreignField": "video",
                "as": "likes",
            }
        },
        doc! {
            "$group": {
                "_id": null,
                "totalViews": { "$sum": "$views" },
                "totalLikes": { "$sum": { "$size": "$likes" } },
            }
        },
    ]
}

/// Every video of `owner`, drafts included, with like counts
pub fn channel_videos(owner: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "owner": owner } },
        doc! { "$sort": { "createdAt": -1 } },
        doc! {
            "$lookup": {
                "from": LIKES,
                "localField": "_id",
                "foreignField": "video",
                "as": "likes",
            }
        },
        doc! { "$addFields": { "likesCount": { "$size": "$likes" } } },
        doc! { "$project": { "likes": 0 } },
    ]
}
