pub mod access;
pub mod callbacks;
pub mod chat;
pub mod commands;
pub mod media;
pub mod photos;
pub mod render;
pub mod responses;
