//! Service layer of the page watcher.
//!
//! This module contains the business logic for:
//! - Selection extraction (`extract`)
//! - Page download (`Fetcher`, `HttpFetcher`)
//! - Update notification (`Mailer`, `SmtpMailer`)
//! - Checking a single page (`PageChecker`)

pub mod checker;
pub mod extractor;
mod fetcher;
mod mailer;
mod render;

pub use checker::{CHECK_TIMEOUT, CheckOutcome, PageChecker};
pub use extractor::{extract, extract_markup};
pub use fetcher::{Fetcher, HttpFetcher};
pub use mailer::{Mailer, SmtpMailer, compose};
