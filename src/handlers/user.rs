use actix_multipart::Multipart;
use actix_web::cookie::Cookie;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use mongodb::Database;
use serde_json::json;
use validator::Validate;

use crate::config::AppConfig;
use crate::db;
use crate::error::ApiError;
use crate::middleware::ACCESS_TOKEN_COOKIE;
use crate::models::user::{normalize_email, normalize_username};
use crate::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, UpdateAccountRequest,
    User, UserResponse,
};
use crate::services::{aggregations, MediaKind, MediaStorage};
use crate::utils::{
    current_user_id, document_to_json, documents_to_json, issue_token_pair, require_non_blank,
    verify_refresh_token, ApiResponse, MultipartForm, TokenPair,
};

pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

// ========== Request/Response Types ==========

/// Text fields of the registration form
#[derive(Debug, Validate)]
pub struct RegisterRequest {
    pub fullname: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    fn from_form(form: &MultipartForm) -> Result<Self, ApiError> {
        Ok(Self {
            fullname: form.require_text("fullname")?,
            email: form.require_text("email")?,
            username: form.require_text("username")?,
            password: form.require_text("password")?,
        })
    }
}

// ========== Helpers ==========

fn auth_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(name, value)
        .http_only(true)
        .secure(true)
        .path("/")
        .finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = auth_cookie(name, String::new());
    cookie.make_removal();
    cookie
}

fn with_token_cookies<T: serde::Serialize>(
    tokens: &TokenPair,
    data: T,
    message: &str,
) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(auth_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone()))
        .cookie(auth_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone()))
        .json(ApiResponse::new(actix_web::http::StatusCode::OK, data, message))
}

async fn find_user(db: &Database, id: ObjectId) -> Result<User, ApiError> {
    db::users(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Issue a fresh token pair and make its refresh token the only valid one
async fn rotate_tokens(db: &Database, user: &User, config: &AppConfig) -> Result<TokenPair, ApiError> {
    let tokens = issue_token_pair(user, &config.auth)?;
    db::users(db)
        .update_one(
            doc! { "_id": user.id },
            doc! { "$set": { "refreshToken": &tokens.refresh_token } },
        )
        .await?;
    Ok(tokens)
}

// ========== Handlers ==========

/// Register a new user (multipart with avatar and optional cover image)
/// POST /api/v1/users/register
pub async fn register(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    storage: web::Data<MediaStorage>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut form = MultipartForm::read(payload, config.max_upload_size).await?;
    let request = RegisterRequest::from_form(&form)?;
    request.validate()?;

    let avatar_file = form.require_file("avatar")?;
    let cover_file = form.take_file("coverImage");

    let username = normalize_username(&request.username);
    let email = normalize_email(&request.email);

    let existing = db::users(&db)
        .find_one(doc! { "$or": [{ "username": &username }, { "email": &email }] })
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "User with email or username already exists".to_string(),
        ));
    }

    let avatar = storage.upload(avatar_file, MediaKind::Image).await?;
    let cover_image = match cover_file {
        Some(file) => match storage.upload(file, MediaKind::Image).await {
            Ok(media) => media.url,
            Err(e) => {
                storage.delete_quietly(&avatar.url, MediaKind::Image).await;
                return Err(e);
            }
        },
        None => String::new(),
    };

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)?;
    let mut user = User::new(
        &username,
        &email,
        &request.fullname,
        avatar.url,
        cover_image,
        password_hash,
    );

    let result = match db::users(&db).insert_one(&user).await {
        Ok(result) => result,
        Err(e) => {
            storage.delete_quietly(&user.avatar, MediaKind::Image).await;
            storage.delete_quietly(&user.cover_image, MediaKind::Image).await;
            return Err(e.into());
        }
    };
    user.id = result.inserted_id.as_object_id();

    log::info!("Registered user {}", user.username);
    Ok(ApiResponse::created(
        UserResponse::from(user),
        "User registered successfully",
    ))
}

/// POST /api/v1/users/login
pub async fn login(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();

    let mut identifiers: Vec<Document> = Vec::new();
    if let Some(username) = request.username.as_deref().filter(|u| !u.trim().is_empty()) {
        identifiers.push(doc! { "username": normalize_username(username) });
    }
    if let Some(email) = request.email.as_deref().filter(|e| !e.trim().is_empty()) {
        identifiers.push(doc! { "email": normalize_email(email) });
    }
    if identifiers.is_empty() {
        return Err(ApiError::bad_request("username or email is required"));
    }
    if request.password.is_empty() {
        return Err(ApiError::bad_request("password is required"));
    }

    let user = db::users(&db)
        .find_one(doc! { "$or": identifiers })
        .await?
        .ok_or_else(|| ApiError::not_found("User does not exist"))?;

    if !bcrypt::verify(&request.password, &user.password)? {
        log::warn!("Failed login for {}", user.username);
        return Err(ApiError::unauthorized("Invalid user credentials"));
    }

    let tokens = rotate_tokens(&db, &user, &config).await?;
    log::info!("User {} logged in", user.username);

    let data = LoginResponse {
        user: UserResponse::from(user),
        access_token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
    };
    Ok(with_token_cookies(&tokens, data, "User logged in successfully"))
}

/// POST /api/v1/users/logout
pub async fn logout(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;

    db::users(&db)
        .update_one(doc! { "_id": uid }, doc! { "$unset": { "refreshToken": 1 } })
        .await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE))
        .json(ApiResponse::new(
            actix_web::http::StatusCode::OK,
            json!({}),
            "User logged out",
        )))
}

/// Exchange a refresh token (cookie or body) for a new token pair
/// POST /api/v1/users/refresh-token
pub async fn refresh_token(
    req: HttpRequest,
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    body: Option<web::Json<RefreshTokenRequest>>,
) -> Result<HttpResponse, ApiError> {
    let incoming = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| body.and_then(|b| b.into_inner().refresh_token))
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::unauthorized("Unauthorized request"))?;

    let claims = verify_refresh_token(incoming.trim(), &config.auth)?;
    let uid = current_user_id(&claims.sub)?;

    let user = db::users(&db)
        .find_one(doc! { "_id": uid })
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    if user.refresh_token.as_deref() != Some(incoming.trim()) {
        log::warn!("Stale refresh token presented for {}", user.username);
        return Err(ApiError::unauthorized("Refresh token is expired or used"));
    }

    let tokens = rotate_tokens(&db, &user, &config).await?;
    let data = json!({
        "accessToken": &tokens.access_token,
        "refreshToken": &tokens.refresh_token,
    });
    Ok(with_token_cookies(&tokens, data, "Access token refreshed"))
}

/// POST /api/v1/users/change-password
pub async fn change_password(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    request: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate()?;
    let uid = current_user_id(&user_id)?;
    let user = find_user(&db, uid).await?;

    if !bcrypt::verify(&request.old_password, &user.password)? {
        return Err(ApiError::unauthorized("Invalid old password"));
    }

    let password_hash = bcrypt::hash(&request.new_password, bcrypt::DEFAULT_COST)?;
    db::users(&db)
        .update_one(
            doc! { "_id": uid },
            doc! { "$set": { "password": password_hash, "updatedAt": mongodb::bson::DateTime::now() } },
        )
        .await?;

    log::info!("User {} changed password", user.username);
    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

/// GET|POST /api/v1/users/current-user
pub async fn current_user(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let user = find_user(&db, uid).await?;
    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Current user fetched successfully",
    ))
}

/// PATCH /api/v1/users/update-account
pub async fn update_account(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    request: web::Json<UpdateAccountRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate()?;
    let uid = current_user_id(&user_id)?;
    let fullname = require_non_blank(&request.fullname, "fullname")?;
    let email = normalize_email(&request.email);

    let taken = db::users(&db)
        .find_one(doc! { "email": &email, "_id": { "$ne": uid } })
        .await?;
    if taken.is_some() {
        return Err(ApiError::Conflict("Email is already in use".to_string()));
    }

    let user = db::users(&db)
        .find_one_and_update(
            doc! { "_id": uid },
            doc! { "$set": {
                "fullname": fullname,
                "email": email,
                "updatedAt": mongodb::bson::DateTime::now(),
            } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Account details updated successfully",
    ))
}

/// Upload `form_field` and store its URL in `user_field`, removing the previous image
async fn replace_profile_image(
    db: &Database,
    config: &AppConfig,
    storage: &MediaStorage,
    uid: ObjectId,
    payload: Multipart,
    form_field: &str,
    user_field: &str,
) -> Result<User, ApiError> {
    let mut form = MultipartForm::read(payload, config.max_upload_size).await?;
    let file = form.require_file(form_field)?;
    let previous = find_user(db, uid).await?;

    let media = storage.upload(file, MediaKind::Image).await?;
    let user = db::users(db)
        .find_one_and_update(
            doc! { "_id": uid },
            doc! { "$set": { user_field: &media.url, "updatedAt": mongodb::bson::DateTime::now() } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let old_url = if user_field == "avatar" {
        previous.avatar
    } else {
        previous.cover_image
    };
    storage.delete_quietly(&old_url, MediaKind::Image).await;

    log::info!("User {} replaced {}", user.username, user_field);
    Ok(user)
}

/// PATCH /api/v1/users/avatar
pub async fn update_avatar(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    storage: web::Data<MediaStorage>,
    user_id: web::ReqData<String>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let user = replace_profile_image(&db, &config, &storage, uid, payload, "avatar", "avatar").await?;
    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Avatar image updated successfully",
    ))
}

/// PATCH /api/v1/users/cover-image
pub async fn update_cover_image(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    storage: web::Data<MediaStorage>,
    user_id: web::ReqData<String>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;
    let user =
        replace_profile_image(&db, &config, &storage, uid, payload, "coverImage", "coverImage")
            .await?;
    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Cover image updated successfully",
    ))
}

/// GET /api/v1/users/c/{username}
pub async fn channel_profile(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
    username: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let viewer = current_user_id(&user_id)?;
    let username = normalize_username(&require_non_blank(&username, "username")?);

    let channel: Vec<Document> = db::users(&db)
        .aggregate(aggregations::channel_profile(&username, viewer))
        .await?
        .try_collect()
        .await?;

    let profile = channel
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Channel does not exist"))?;

    Ok(ApiResponse::ok(
        document_to_json(profile),
        "User channel fetched successfully",
    ))
}

/// GET /api/v1/users/history
pub async fn watch_history(
    db: web::Data<Database>,
    user_id: web::ReqData<String>,
) -> Result<HttpResponse, ApiError> {
    let uid = current_user_id(&user_id)?;

    let videos: Vec<Document> = db::users(&db)
        .aggregate(aggregations::watch_history(uid))
        .await?
        .try_collect()
        .await?;

    Ok(ApiResponse::ok(
        documents_to_json(videos),
        "Watch history fetched successfully",
    ))
}
