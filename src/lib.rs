//! Upload a photo, hand it to a generative image API with a fixed prompt, show what comes back.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gemini;
pub mod generator;
pub mod materialize;
pub mod prompt;
pub mod request;
pub mod task;
pub mod upload;
pub mod web_pages;
