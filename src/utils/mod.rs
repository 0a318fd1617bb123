pub mod api_response;
pub mod bson_json;
pub mod jwt;
pub mod multipart;
pub mod object_id;
pub mod pagination;

pub use api_response::ApiResponse;
pub use bson_json::{document_to_json, documents_to_json, get_number};
pub use jwt::{
    create_access_token, create_refresh_token, issue_token_pair, verify_access_token,
    verify_refresh_token, Claims, RefreshClaims, TokenPair,
};
pub use multipart::{MultipartForm, UploadedFile};
pub use object_id::{current_user_id, parse_object_id, require_non_blank};
pub use pagination::{PaginatedResponse, PaginationParams};
