//! Kaption - media subtitling pipeline
//!
//! Extracts audio, transcribes it, translates the transcript, writes SRT
//! subtitles and burns them back into the video, behind a small HTTP
//! upload/download server.

pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod media;
pub mod segment;
pub mod server;
pub mod setup;
pub mod storage;
pub mod subtitle;
pub mod transcribe;
pub mod translate;
pub mod workflow;
