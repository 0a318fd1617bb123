use mongodb::bson::oid::ObjectId;

use crate::error::ApiError;

/// Parse a path/query id, `what` names it in the 400 message
pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", what)));
    }
    ObjectId::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid {}", what)))
}

/// Id of the authenticated user, taken from the token subject
pub fn current_user_id(sub: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(sub).map_err(|_| {
        log::warn!("Token subject is not an ObjectId: {}", sub);
        ApiError::unauthorized("Invalid access token")
    })
}

/// Trimmed value or a 400 naming the field
pub fn require_non_blank(value: &str, field: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
