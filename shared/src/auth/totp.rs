//! TOTP (RFC 6238) secret generation, enrollment URLs, and code verification.
//!
//! Shape of the configuration (issuer/digits/step/skew) follows the
//! `TotpConfig` used elsewhere in the ecosystem for bank-grade 2FA; the
//! verification itself is delegated to `totp-rs`, the standard crate for
//! this, rather than hand-rolling HOTP counters.

use totp_rs::{Algorithm, Secret, TOTP};

#[derive(Debug, thiserror::Error)]
pub enum TotpError {
    #[error("invalid TOTP secret")]
    InvalidSecret,
    #[error("failed to build TOTP generator: {0}")]
    BuildFailed(String),
}

/// Enrollment and verification for a single user's TOTP secret.
///
/// Holds no state of its own beyond the service-wide issuer/digits/step/skew
/// policy; the per-user secret is passed in on each call since it lives
/// encrypted at rest and is decrypted by the caller just before use.
#[derive(Debug, Clone)]
pub struct TotpService {
    issuer: String,
    digits: usize,
    step: u64,
    skew: u8,
}

impl TotpService {
    pub fn new(issuer: impl Into<String>, digits: usize, step: u64, skew: u8) -> Self {
        Self { issuer: issuer.into(), digits, step, skew }
    }

    /// Generates a new random base32-encoded secret suitable for enrollment.
    pub fn generate_secret() -> String {
        Secret::generate_secret().to_encoded().to_string()
    }

    /// Builds the `otpauth://` URL an authenticator app scans to enroll.
    pub fn provisioning_uri(&self, account_name: &str, secret: &str) -> Result<String, TotpError> {
        let totp = self.build(account_name, secret)?;
        Ok(totp.get_url())
    }

    /// Verifies a submitted code against the secret, allowing codes from
    /// `skew` steps before or after the current one to absorb clock drift.
    pub fn verify(&self, account_name: &str, secret: &str, code: &str) -> Result<bool, TotpError> {
        let totp = self.build(account_name, secret)?;
        Ok(totp.check_current(code).unwrap_or(false))
    }

    fn build(&self, account_name: &str, secret: &str) -> Result<TOTP, TotpError> {
        let secret_bytes = Secret::Encoded(secret.to_string())
            .to_bytes()
            .map_err(|_| TotpError::InvalidSecret)?;

        TOTP::new(
            Algorithm::SHA1,
            self.digits,
            self.skew,
            self.step,
            secret_bytes,
            Some(self.issuer.clone()),
            account_name.to_string(),
        )
        .map_err(|e| TotpError::BuildFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TotpService {
        TotpService::new("Identity Core", 6, 30, 1)
    }

    #[test]
    fn generated_secret_round_trips_through_verification() {
        let svc = service();
        let secret = TotpService::generate_secret();
        let totp = svc.build("user@example.com", &secret).unwrap();
        let code = totp.generate_current().unwrap();
        assert!(svc.verify("user@example.com", &secret, &code).unwrap());
    }

    #[test]
    fn wrong_code_is_rejected() {
        let svc = service();
        let secret = TotpService::generate_secret();
        assert!(!svc.verify("user@example.com", &secret, "000000").unwrap());
    }

    #[test]
    fn provisioning_uri_contains_issuer_and_account() {
        let svc = service();
        let secret = TotpService::generate_secret();
        let uri = svc.provisioning_uri("user@example.com", &secret).unwrap();
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("user%40example.com") || uri.contains("user@example.com"));
    }

    #[test]
    fn invalid_secret_is_rejected() {
        let svc = service();
        assert!(matches!(svc.build("user@example.com", "not-base32!!!"), Err(TotpError::InvalidSecret)));
    }
}
