pub mod user;
pub mod video;
pub mod comment;
pub mod like;
pub mod tweet;
pub mod playlist;
pub mod subscription;

pub use user::{
    User, UserResponse, LoginRequest, LoginResponse, RefreshTokenRequest,
    ChangePasswordRequest, UpdateAccountRequest,
};
pub use video::{Video, VideoResponse, VideoListQuery};
pub use comment::{Comment, CommentResponse, ContentRequest};
pub use like::{Like, LikeTarget, LikeToggleResponse};
pub use tweet::{Tweet, TweetResponse};
pub use playlist::{Playlist, PlaylistResponse, PlaylistRequest};
pub use subscription::{Subscription, SubscriptionToggleResponse};
