pub mod comment;
pub mod dashboard;
mod health;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::{add_comment, delete_comment, get_video_comments, update_comment};
pub use dashboard::{get_channel_stats, get_channel_videos};
pub use health::health;
pub use like::{get_liked_videos, toggle_comment_like, toggle_tweet_like, toggle_video_like};
pub use playlist::{
    add_video_to_playlist, create_playlist, delete_playlist, get_playlist_by_id,
    get_user_playlists, remove_video_from_playlist, update_playlist,
};
pub use subscription::{get_channel_subscribers, get_subscribed_channels, toggle_subscription};
pub use tweet::{create_tweet, delete_tweet, get_user_tweets, update_tweet};
pub use user::{
    change_password, channel_profile, current_user, login, logout, refresh_token, register,
    update_account, update_avatar, update_cover_image, watch_history,
};
pub use video::{
    delete_video, get_all_videos, get_video, publish_video, toggle_publish_status, update_video,
};
