//! # Mailer
//!
//! A bounded queue in front of outbound email. There is no SMTP integration
//! here: sending a verification link logs it at `info` level, the same
//! log-only behavior the business-domain core this was adapted from used in
//! place of a real mail provider. The queue/worker shape exists so callers
//! never block on it, and so a real provider can be dropped in behind
//! [`Mailer::spawn`] without touching call sites.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct VerificationEmail {
    to: String,
    link: String,
    expires_in: Duration,
}

/// Handle held by [`crate::service::auth_service::AuthService`]. Cheap to
/// clone: wraps a single `mpsc::Sender`.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::Sender<VerificationEmail>,
}

impl Mailer {
    /// Spawns `worker_count` workers draining a channel of `capacity` and
    /// returns the handle.
    pub fn spawn(capacity: usize, worker_count: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let rx = std::sync::Arc::new(tokio::sync::Mutex::new(rx));

        for worker_id in 0..worker_count.max(1) {
            let rx = rx.clone();
            tokio::spawn(async move {
                loop {
                    let job = {
                        let mut rx = rx.lock().await;
                        rx.recv().await
                    };
                    let Some(job) = job else {
                        break;
                    };
                    info!(
                        worker_id,
                        to = %job.to,
                        link = %job.link,
                        expires_in_secs = job.expires_in.as_secs(),
                        "sending verification email"
                    );
                }
            });
        }

        Self { tx }
    }

    /// Enqueues a verification email. Non-blocking: drops and logs if the
    /// queue is full.
    pub fn send_verification(&self, to: &str, link: &str, expires_in: Duration) {
        let job = VerificationEmail { to: to.to_string(), link: link.to_string(), expires_in };
        if let Err(e) = self.tx.try_send(job) {
            warn!(error = %e, "mail queue full, verification email dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_verification_does_not_block() {
        let mailer = Mailer::spawn(4, 1);
        mailer.send_verification("ada@example.com", "https://example.com/verify?token=abc", Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
