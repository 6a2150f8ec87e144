//! Stubs shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pagewatch::error::{AppError, Result};
use pagewatch::models::{MailSettings, Page, PagesFile, ProgramSettings};
use pagewatch::services::{Fetcher, Mailer, PageChecker};
use pagewatch::storage::{CacheStore, UpdateRegistry};
use tempfile::TempDir;
use url::Url;

/// Serves queued bodies in order, repeating the last one.
pub struct StubFetcher {
    bodies: Mutex<VecDeque<String>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new(bodies: &[&str]) -> Self {
        Self::with_delay(bodies, Duration::ZERO)
    }

    pub fn with_delay(bodies: &[&str], delay: Duration) -> Self {
        Self {
            bodies: Mutex::new(bodies.iter().map(|b| b.to_string()).collect()),
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, _page: &Page) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut bodies = self.bodies.lock().unwrap();
        let body = if bodies.len() > 1 {
            bodies.pop_front()
        } else {
            bodies.front().cloned()
        };
        Ok(body.unwrap_or_default())
    }
}

/// A mail handed to [`StubMailer`].
#[derive(Debug, Clone)]
pub struct SentMail {
    pub url: String,
    pub recipient: String,
    pub body: String,
}

/// Records mails instead of sending them.
#[derive(Default)]
pub struct StubMailer {
    pub sent: Mutex<Vec<SentMail>>,
    pub fail: bool,
}

impl StubMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for StubMailer {
    async fn send(
        &self,
        _account: &MailSettings,
        url: &Url,
        recipient: &str,
        body: &str,
    ) -> Result<()> {
        if self.fail {
            return Err(AppError::mail("relay refused the message"));
        }
        self.sent.lock().unwrap().push(SentMail {
            url: url.to_string(),
            recipient: recipient.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Checker wired to stubs and temporary storage.
pub struct Harness {
    pub dir: TempDir,
    pub fetcher: Arc<StubFetcher>,
    pub mailer: Arc<StubMailer>,
    pub cache: Arc<CacheStore>,
    pub registry: Arc<UpdateRegistry>,
    pub checker: Arc<PageChecker>,
}

impl Harness {
    pub fn new(fetcher: StubFetcher, mailer: StubMailer) -> Self {
        Self::with_timeout(fetcher, mailer, pagewatch::services::CHECK_TIMEOUT)
    }

    pub fn with_timeout(fetcher: StubFetcher, mailer: StubMailer, timeout: Duration) -> Self {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(fetcher);
        let mailer = Arc::new(mailer);
        let cache = Arc::new(CacheStore::new(dir.path()));
        let registry = Arc::new(UpdateRegistry::new(dir.path().join("updates.json"), 0o600));
        let checker = Arc::new(
            PageChecker::new(
                fetcher.clone(),
                mailer.clone(),
                Arc::clone(&cache),
                Arc::clone(&registry),
            )
            .with_timeout(timeout),
        );
        Self {
            dir,
            fetcher,
            mailer,
            cache,
            registry,
            checker,
        }
    }
}

/// Settings with a complete mail account.
pub fn mail_settings() -> ProgramSettings {
    let mut settings = ProgramSettings::default();
    settings.mail = MailSettings {
        address: "watcher@example.com".into(),
        password: "secret".into(),
        auth_server: "smtp.example.com".into(),
        out_server: "smtp.example.com:587".into(),
    };
    settings
}

/// Parse a single `[[page]]` table.
pub fn page(toml: &str, settings: &ProgramSettings) -> Page {
    PagesFile::parse(&format!("[[page]]\n{toml}"), settings)
        .unwrap()
        .remove(0)
}
