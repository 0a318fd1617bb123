use actix_web::web;

use crate::error::ApiError;
use crate::handlers;
use crate::middleware::AuthMiddleware;

/// Extractor failures (bad JSON, query or path) use the same error envelope as handlers
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| ApiError::bad_request(format!("Invalid JSON body: {}", err)).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::bad_request(format!("Invalid query string: {}", err)).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| ApiError::bad_request(format!("Invalid path: {}", err)).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api/v1")
                .route("/health", web::get().to(handlers::health))
                // Users: registration, login and refresh are public
                .service(
                    web::scope("/users")
                        .route("/register", web::post().to(handlers::register))
                        .route("/login", web::post().to(handlers::login))
                        .route("/refresh-token", web::post().to(handlers::refresh_token))
                        .service(
                            web::resource("/logout")
                                .wrap(AuthMiddleware)
                                .route(web::post().to(handlers::logout)),
                        )
                        .service(
                            web::resource("/change-password")
                                .wrap(AuthMiddleware)
                                .route(web::post().to(handlers::change_password)),
                        )
                        .service(
                            web::resource("/current-user")
                                .wrap(AuthMiddleware)
                                .route(web::get().to(handlers::current_user))
                                .route(web::post().to(handlers::current_user)),
                        )
                        .service(
                            web::resource("/update-account")
                                .wrap(AuthMiddleware)
                                .route(web::patch().to(handlers::update_account)),
                        )
                        .service(
                            web::resource("/avatar")
                                .wrap(AuthMiddleware)
                                .route(web::patch().to(handlers::update_avatar)),
                        )
                        .service(
                            web::resource("/cover-image")
                                .wrap(AuthMiddleware)
                                .route(web::patch().to(handlers::update_cover_image)),
                        )
                        .service(
                            web::resource("/c/{username}")
                                .wrap(AuthMiddleware)
                                .route(web::get().to(handlers::channel_profile)),
                        )
                        .service(
                            web::resource("/history")
                                .wrap(AuthMiddleware)
                                .route(web::get().to(handlers::watch_history)),
                        ),
                )
                .service(
                    web::scope("/videos")
                        .wrap(AuthMiddleware)
                        .route("", web::get().to(handlers::get_all_videos))
                        .route("", web::post().to(handlers::publish_video))
                        .route(
                            "/toggle/publish/{videoId}",
                            web::patch().to(handlers::toggle_publish_status),
                        )
                        .route("/{videoId}", web::get().to(handlers::get_video))
                        .route("/{videoId}", web::patch().to(handlers::update_video))
                        .route("/{videoId}", web::delete().to(handlers::delete_video)),
                )
                .service(
                    web::scope("/comments")
                        .wrap(AuthMiddleware)
                        .route("/c/{commentId}", web::patch().to(handlers::update_comment))
                        .route("/c/{commentId}", web::delete().to(handlers::delete_comment))
                        .route("/{videoId}", web::get().to(handlers::get_video_comments))
                        .route("/{videoId}", web::post().to(handlers::add_comment)),
                )
                .service(
                    web::scope("/likes")
                        .wrap(AuthMiddleware)
                        .route("/toggle/v/{videoId}", web::post().to(handlers::toggle_video_like))
                        .route("/toggle/c/{commentId}", web::post().to(handlers::toggle_comment_like))
                        .route("/toggle/t/{tweetId}", web::post().to(handlers::toggle_tweet_like))
                        .route("/videos", web::get().to(handlers::get_liked_videos)),
                )
                .service(
                    web::scope("/tweets")
                        .wrap(AuthMiddleware)
                        .route("", web::post().to(handlers::create_tweet))
                        .route("/user/{userId}", web::get().to(handlers::get_user_tweets))
                        .route("/{tweetId}", web::patch().to(handlers::update_tweet))
                        .route("/{tweetId}", web::delete().to(handlers::delete_tweet)),
                )
                .service(
                    web::scope("/playlists")
                        .wrap(AuthMiddleware)
                        .route("", web::post().to(handlers::create_playlist))
                        .route("/user/{userId}", web::get().to(handlers::get_user_playlists))
                        .route(
                            "/add/{videoId}/{playlistId}",
                            web::patch().to(handlers::add_video_to_playlist),
                        )
                        .route(
                            "/remove/{videoId}/{playlistId}",
                            web::patch().to(handlers::remove_video_from_playlist),
                        )
                        .route("/{playlistId}", web::get().to(handlers::get_playlist_by_id))
                        .route("/{playlistId}", web::patch().to(handlers::update_playlist))
                        .route("/{playlistId}", web::delete().to(handlers::delete_playlist)),
                )
                .service(
                    web::scope("/subscriptions")
                        .wrap(AuthMiddleware)
                        .route("/u/{channelId}", web::post().to(handlers::toggle_subscription))
                        .route("/u/{channelId}", web::get().to(handlers::get_channel_subscribers))
                        .route("/c/{subscriberId}", web::get().to(handlers::get_subscribed_channels)),
                )
                .service(
                    web::scope("/dashboard")
                        .wrap(AuthMiddleware)
                        .route("/stats", web::get().to(handlers::get_channel_stats))
                        .route("/videos", web::get().to(handlers::get_channel_videos)),
                ),
        );
}
