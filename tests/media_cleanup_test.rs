// Uploads are removed from the media host when the video document cannot be saved
use std::collections::HashMap;
use std::sync::Mutex;

use actix_web::http::{header, StatusCode};
use actix_web::{rt, test, web, App, HttpResponse, HttpServer};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

mod common;
use common::{access_token, lazy_database, response_json, test_app, test_config};

#[derive(Default)]
struct HostLog {
    uploads: Mutex<u32>,
    destroyed: Mutex<Vec<String>>,
}

async fn fake_upload(
    log: web::Data<HostLog>,
    path: web::Path<(String, String)>,
    _body: web::Bytes,
) -> HttpResponse {
    let (_cloud, kind) = path.into_inner();
    let mut uploads = log.uploads.lock().unwrap();
    *uploads += 1;
    let public_id = format!("{}-{}", kind, uploads);
    HttpResponse::Ok().json(json!({
        "secure_url": format!("https://res.cloudinary.com/test/{}/upload/v1/{}.bin", kind, public_id),
        "public_id": public_id,
        "resource_type": kind,
        "duration": 42.0,
    }))
}

async fn fake_destroy(
    log: web::Data<HostLog>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    if let Some(public_id) = form.get("public_id") {
        log.destroyed.lock().unwrap().push(public_id.clone());
    }
    HttpResponse::Ok().json(json!({ "result": "ok" }))
}

#[actix_web::test]
async fn test_publish_removes_uploads_when_save_fails() {
    let host_log = web::Data::new(HostLog::default());
    let shared = host_log.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(shared.clone())
            .route("/{cloud}/{kind}/upload", web::post().to(fake_upload))
            .route("/{cloud}/{kind}/destroy", web::post().to(fake_destroy))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind fake media host");
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    rt::spawn(server);

    let mut config = test_config();
    config.cloudinary.api_base = format!("http://{}", addr);
    // The lazy database never connects, so the insert fails after both uploads
    let app = test::init_service(test_app(lazy_database().await, config.clone())).await;

    let boundary = "videotubeboundary";
    let payload = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nMy clip\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\nShort one\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"videoFile\"; filename=\"clip.mp4\"\r\n\
         Content-Type: video/mp4\r\n\r\nVIDEODATA\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"thumbnail\"; filename=\"thumb.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
        b = boundary
    );
    let req = test::TestRequest::post()
        .uri("/api/v1/videos")
        .insert_header((
            header::AUTHORIZATION,
            format!("Bearer {}", access_token(ObjectId::new(), &config)),
        ))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(payload)
        .to_request();
    let (status, body) = response_json(test::try_call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", body);
    assert_eq!(body["success"], false);
    assert_eq!(*host_log.uploads.lock().unwrap(), 2);

    let mut destroyed = host_log.destroyed.lock().unwrap().clone();
    destroyed.sort();
    assert_eq!(destroyed, vec!["image-2".to_string(), "video-1".to_string()]);

    handle.stop(false).await;
}
