//! Domain types: the content-provider contract and status images.

pub mod provider;
pub mod status_images;
