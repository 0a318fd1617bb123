// Request flows that need a running MongoDB; each test skips when none answers
use actix_web::http::{header, StatusCode};
use actix_web::test;
use mongodb::bson::{doc, oid::ObjectId};
use serde_json::json;

use videotube::db;
use videotube::error::is_duplicate_key;
use videotube::models::{Comment, LikeTarget, Playlist, Tweet, Video};

mod common;
use common::{access_token, insert_user, live_database, response_json, test_app, test_config};

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

fn sample_video(owner: ObjectId, published: bool) -> Video {
    let mut video = Video::new(
        owner,
        "Original title".to_string(),
        "Original description".to_string(),
        "https://res.cloudinary.com/test/video/upload/v1/clip.mp4".to_string(),
        "https://res.cloudinary.com/test/image/upload/v1/thumb.png".to_string(),
        12.5,
    );
    video.is_published = published;
    video
}

async fn insert_video(database: &mongodb::Database, owner: ObjectId, published: bool) -> ObjectId {
    db::videos(database)
        .insert_one(sample_video(owner, published))
        .await
        .expect("insert video")
        .inserted_id
        .as_object_id()
        .expect("object id")
}

#[actix_web::test]
async fn test_only_owners_modify_content() {
    let Some(database) = live_database().await else { return };
    let config = test_config();
    let app = test::init_service(test_app(database.clone(), config.clone())).await;

    let owner = insert_user(&database, "owner").await;
    let intruder = insert_user(&database, "intruder").await;
    let token = access_token(intruder, &config);

    let video = insert_video(&database, owner, true).await;
    let comment = db::comments(&database)
        .insert_one(Comment::new(video, owner, "first".to_string()))
        .await
        .unwrap()
        .inserted_id
        .as_object_id()
        .unwrap();
    let tweet = db::tweets(&database)
        .insert_one(Tweet::new(owner, "hello".to_string()))
        .await
        .unwrap()
        .inserted_id
        .as_object_id()
        .unwrap();
    let playlist = db::playlists(&database)
        .insert_one(Playlist::new(owner, "Mix".to_string(), "Songs".to_string()))
        .await
        .unwrap()
        .inserted_id
        .as_object_id()
        .unwrap();

    // Video update is multipart; ownership is checked before anything is uploaded
    let boundary = "videotubeboundary";
    let payload = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nTaken over\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\nmine now\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"thumbnail\"; filename=\"t.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
        b = boundary
    );
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/videos/{}", video.to_hex()))
        .insert_header(bearer(&token))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(payload)
        .to_request();
    let (status, body) = response_json(test::try_call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", body);

    let edits = [
        (format!("/api/v1/comments/c/{}", comment.to_hex()), json!({ "content": "edited" })),
        (format!("/api/v1/tweets/{}", tweet.to_hex()), json!({ "content": "edited" })),
        (
            format!("/api/v1/playlists/{}", playlist.to_hex()),
            json!({ "name": "Edited", "description": "edited" }),
        ),
    ];
    for (uri, payload) in &edits {
        let req = test::TestRequest::patch()
            .uri(uri)
            .insert_header(bearer(&token))
            .set_json(payload)
            .to_request();
        let (status, body) = response_json(test::try_call_service(&app, req).await).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "PATCH {}", uri);
        assert_eq!(body["success"], false);
    }

    let deletions = [
        format!("/api/v1/videos/{}", video.to_hex()),
        format!("/api/v1/comments/c/{}", comment.to_hex()),
        format!("/api/v1/tweets/{}", tweet.to_hex()),
        format!("/api/v1/playlists/{}", playlist.to_hex()),
    ];
    for uri in &deletions {
        let req = test::TestRequest::delete()
            .uri(uri)
            .insert_header(bearer(&token))
            .to_request();
        let (status, _) = response_json(test::try_call_service(&app, req).await).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "DELETE {}", uri);
    }

    // Nothing changed underneath
    let stored = db::videos(&database)
        .find_one(doc! { "_id": video })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Original title");
    let stored = db::tweets(&database)
        .find_one(doc! { "_id": tweet })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.content, "hello");
    assert_eq!(db::comments(&database).count_documents(doc! {}).await.unwrap(), 1);
    assert_eq!(db::playlists(&database).count_documents(doc! {}).await.unwrap(), 1);

    database.drop().await.ok();
}

#[actix_web::test]
async fn test_like_toggles_return_to_start() {
    let Some(database) = live_database().await else { return };
    let config = test_config();
    let app = test::init_service(test_app(database.clone(), config.clone())).await;

    let owner = insert_user(&database, "creator").await;
    let viewer = insert_user(&database, "viewer").await;
    let token = access_token(viewer, &config);

    let video = insert_video(&database, owner, true).await;
    let comment = db::comments(&database)
        .insert_one(Comment::new(video, owner, "nice".to_string()))
        .await
        .unwrap()
        .inserted_id
        .as_object_id()
        .unwrap();
    let tweet = db::tweets(&database)
        .insert_one(Tweet::new(owner, "news".to_string()))
        .await
        .unwrap()
        .inserted_id
        .as_object_id()
        .unwrap();

    let targets = [
        format!("/api/v1/likes/toggle/v/{}", video.to_hex()),
        format!("/api/v1/likes/toggle/c/{}", comment.to_hex()),
        format!("/api/v1/likes/toggle/t/{}", tweet.to_hex()),
    ];
    for uri in &targets {
        for expected in [true, false] {
            let req = test::TestRequest::post()
                .uri(uri)
                .insert_header(bearer(&token))
                .to_request();
            let (status, body) = response_json(test::try_call_service(&app, req).await).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body["data"]["isLiked"], expected, "{}", uri);
        }
    }
    assert_eq!(db::likes(&database).count_documents(doc! {}).await.unwrap(), 0);

    database.drop().await.ok();
}

#[actix_web::test]
async fn test_subscription_toggle_returns_to_start() {
    let Some(database) = live_database().await else { return };
    let config = test_config();
    let app = test::init_service(test_app(database.clone(), config.clone())).await;

    let channel = insert_user(&database, "channel").await;
    let fan = insert_user(&database, "fan").await;
    let token = access_token(fan, &config);
    let uri = format!("/api/v1/subscriptions/u/{}", channel.to_hex());

    for expected in [true, false] {
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&token))
            .to_request();
        let (status, body) = response_json(test::try_call_service(&app, req).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["subscribed"], expected);
    }
    assert_eq!(
        db::subscriptions(&database).count_documents(doc! {}).await.unwrap(),
        0
    );

    database.drop().await.ok();
}

#[actix_web::test]
async fn test_drafts_cannot_be_commented_or_liked_by_others() {
    let Some(database) = live_database().await else { return };
    let config = test_config();
    let app = test::init_service(test_app(database.clone(), config.clone())).await;

    let owner = insert_user(&database, "drafter").await;
    let other = insert_user(&database, "outsider").await;
    let draft = insert_video(&database, owner, false).await;

    let other_token = access_token(other, &config);
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/comments/{}", draft.to_hex()))
        .insert_header(bearer(&other_token))
        .set_json(json!({ "content": "first!" }))
        .to_request();
    let (status, _) = response_json(test::try_call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/likes/toggle/v/{}", draft.to_hex()))
        .insert_header(bearer(&other_token))
        .to_request();
    let (status, _) = response_json(test::try_call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The owner still can
    let owner_token = access_token(owner, &config);
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/comments/{}", draft.to_hex()))
        .insert_header(bearer(&owner_token))
        .set_json(json!({ "content": "note to self" }))
        .to_request();
    let (status, body) = response_json(test::try_call_service(&app, req).await).await;
    assert!(status.is_success(), "{}", body);

    assert_eq!(db::likes(&database).count_documents(doc! {}).await.unwrap(), 0);
    assert_eq!(db::comments(&database).count_documents(doc! {}).await.unwrap(), 1);

    database.drop().await.ok();
}

#[actix_web::test]
async fn test_playlist_skips_deleted_and_draft_videos() {
    let Some(database) = live_database().await else { return };
    let config = test_config();
    let app = test::init_service(test_app(database.clone(), config.clone())).await;

    let owner = insert_user(&database, "curator").await;
    let published = insert_video(&database, owner, true).await;
    let draft = insert_video(&database, owner, false).await;
    let deleted = ObjectId::new();

    let mut playlist = Playlist::new(owner, "Mix".to_string(), "Best of".to_string());
    playlist.videos = vec![deleted, published, draft];
    let playlist = db::playlists(&database)
        .insert_one(playlist)
        .await
        .unwrap()
        .inserted_id
        .as_object_id()
        .unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/playlists/{}", playlist.to_hex()))
        .insert_header(bearer(&access_token(owner, &config)))
        .to_request();
    let (status, body) = response_json(test::try_call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let videos = body["data"]["videos"].as_array().expect("videos array");
    assert_eq!(videos.len(), 1);
    assert!(!videos[0].is_null());
    assert_eq!(videos[0]["_id"], published.to_hex());
    assert_eq!(body["data"]["totalVideos"], 1);

    database.drop().await.ok();
}

#[actix_web::test]
async fn test_like_index_rejects_second_like_on_same_target() {
    let Some(database) = live_database().await else { return };

    let user = insert_user(&database, "liker").await;
    let video = ObjectId::new();
    let likes = db::likes(&database);

    likes.insert_one(LikeTarget::Video(video).into_like(user)).await.unwrap();
    let err = likes
        .insert_one(LikeTarget::Video(video).into_like(user))
        .await
        .unwrap_err();
    assert!(is_duplicate_key(&err));

    // Likes on other target kinds have no `video` field and must not collide
    likes.insert_one(LikeTarget::Tweet(ObjectId::new()).into_like(user)).await.unwrap();
    likes.insert_one(LikeTarget::Comment(ObjectId::new()).into_like(user)).await.unwrap();
    likes.insert_one(LikeTarget::Comment(ObjectId::new()).into_like(user)).await.unwrap();

    database.drop().await.ok();
}
