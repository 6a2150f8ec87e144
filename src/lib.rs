// src/lib.rs

//! pagewatch: a daemon that polls web pages and flags the ones whose
//! selected content changed.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
