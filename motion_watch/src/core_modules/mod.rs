pub mod blob_detector;
pub mod cell;
pub mod frame;
pub mod frame_mailbox;
pub mod geometry;
pub mod grid_manager;
pub mod screen_region;
pub mod smart_blob;
pub mod tracker;
