//! HTTP request handlers organized by functionality

pub mod cover;
pub mod health;
pub mod upload;
pub mod videos;

pub use cover::upload_cover_handler;
pub use health::ping_handler;
pub use upload::upload_videos_handler;
pub use videos::{
    delete_video_handler, list_videos_handler, regenerate_slate_handler, rename_video_handler,
};
