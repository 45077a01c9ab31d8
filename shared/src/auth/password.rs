//! # Password Hashing with Argon2id
//!
//! Secure password storage using the Argon2id algorithm.
//!
//! ## Why Argon2id?
//!
//! Argon2 won the [Password Hashing Competition](https://www.password-hashing.net/)
//! in 2015 and is recommended by [OWASP](https://cheatsheetseries.owasp.org/cheatsheets/Password_Storage_Cheat_Sheet.html).
//!
//! There are three variants:
//!
//! | Variant | Resistance | Use Case |
//! |---------|------------|----------|
//! | Argon2d | GPU attacks | Cryptocurrency |
//! | Argon2i | Side-channel | General use |
//! | **Argon2id** | **Both** | **Passwords (recommended)** |
//!
//! We use **Argon2id** which combines the strengths of both variants.
//!
//! ## How Password Hashing Works
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        Password Hashing                              │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  "MyPassword123!"  ──►  Argon2id  ──►  $argon2id$v=19$m=65536...    │
//! │         │                   │                   │                   │
//! │    (plaintext)          (salt +            (PHC string:            │
//! │                         params)             algorithm +            │
//! │                                             version +              │
//! │                                             params +               │
//! │                                             salt +                 │
//! │                                             hash)                  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Parameters (OWASP Recommended)
//!
//! Our implementation uses these parameters:
//!
//! | Parameter | Value | Purpose |
//! |-----------|-------|---------|
//! | Memory | 64 MiB | Makes attacks expensive (GPU memory) |
//! | Iterations | 3 | Time cost (slows brute force) |
//! | Parallelism | 4 | CPU lanes (matches typical cores) |
//! | Output | 32 bytes | Hash length |
//!
//! These settings balance security with acceptable response time (~100ms).
//!
//! ## PHC String Format
//!
//! We use the [PHC String Format](https://github.com/P-H-C/phc-string-format)
//! which is self-describing and includes:
//!
//! ```text
//! $argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>
//!   │         │    │      │   │   │       └── The hash output
//!   │         │    │      │   │   └────────── Random salt (base64)
//!   │         │    │      │   └────────────── Parallelism (4 lanes)
//!   │         │    │      └────────────────── Time cost (3 iterations)
//!   │         │    └───────────────────────── Memory (64 MiB)
//!   │         └────────────────────────────── Version (0x13 = 19)
//!   └──────────────────────────────────────── Algorithm identifier
//! ```
//!
//! ## Password Requirements
//!
//! The `PasswordValidator` enforces:
//!
//! - Minimum 8 characters
//! - Not one of a small set of known-weak passwords
//!
//! No complexity-class rule (uppercase/lowercase/digit/symbol) is enforced.
//! NIST SP 800-63B argues those rules push users toward predictable
//! substitutions ("Password1!") without adding real entropy, and the
//! evidence is better spent rejecting known-weak passwords outright.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use shared::auth::password::{PasswordHasher, PasswordValidator};
//!
//! let hasher = PasswordHasher::new();
//!
//! // During registration
//! if let Err(errors) = PasswordValidator::validate(&password) {
//!     return Err(ApiError::ValidationError { ... });
//! }
//! let hash = hasher.hash(&password)?;
//! // Store hash in database
//!
//! // During login
//! if hasher.verify(&password, &stored_hash)? {
//!     // Password correct
//! } else {
//!     return Err(ApiError::InvalidCredentials);
//! }
//! ```
//!
//! ## Security Notes
//!
//! - **Never store plaintext passwords**
//! - **Each hash includes a unique salt** - Same password → different hashes
//! - **Verification is constant-time** - Prevents timing attacks
//! - **Hash updates** - If parameters change, re-hash on successful login
//!
//! ## Related Documentation
//!
//! - [OWASP Password Storage Cheat Sheet](https://cheatsheetseries.owasp.org/cheatsheets/Password_Storage_Cheat_Sheet.html)

use crate::errors::ApiError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2, Algorithm, Params, Version,
};

// =============================================================================
// Password Hasher
// =============================================================================

/// Secure password hashing service using Argon2id.
///
/// This service handles:
/// - Hashing passwords for storage
/// - Verifying passwords during login
///
/// ## Thread Safety
///
/// This type is `Clone` and `Send + Sync`, safe for concurrent use.
/// Each hash operation generates a new random salt.
///
/// ## Example
///
/// ```rust,ignore
/// let hasher = PasswordHasher::new();
///
/// // Hash a password
/// let hash = hasher.hash("MySecureP@ssw0rd!")?;
///
/// // Verify later
/// let is_valid = hasher.verify("MySecureP@ssw0rd!", &hash)?;
/// ```
#[derive(Clone)]
pub struct PasswordHasher {
    /// Pre-configured Argon2 instance
    argon2: Argon2<'static>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    /// Memory cost, in KiB, used by [`Self::new`].
    const MEMORY_COST_KIB: u32 = 64 * 1024;
    /// Time cost (iterations) used by [`Self::new`].
    const TIME_COST: u32 = 3;
    /// Parallelism (lanes) used by [`Self::new`].
    const PARALLELISM: u32 = 4;

    /// Creates a new hasher with OWASP-recommended parameters.
    ///
    /// ## Parameters Used
    ///
    /// - Memory: 64 MiB (protects against GPU attacks)
    /// - Iterations: 3 (time cost)
    /// - Parallelism: 4 lanes (uses multiple CPU cores)
    ///
    /// These parameters provide strong security while keeping
    /// verification time around 100ms on modern hardware.
    pub fn new() -> Self {
        // OWASP-recommended parameters for password hashing
        // See: https://cheatsheetseries.owasp.org/cheatsheets/Password_Storage_Cheat_Sheet.html
        let params = Params::new(
            Self::MEMORY_COST_KIB,
            Self::TIME_COST,
            Self::PARALLELISM,
            None, // Default output length (32 bytes)
        )
        .expect("Invalid Argon2 params"); // Safe: these params are always valid

        // Use Argon2id variant (v0x13 = version 19)
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Self { argon2 }
    }

    /// Hashes a password for secure storage.
    ///
    /// ## Process
    ///
    /// 1. Generate a cryptographically random salt
    /// 2. Apply Argon2id with configured parameters
    /// 3. Return the result in PHC string format
    ///
    /// ## Returns
    ///
    /// A PHC-formatted string containing the algorithm, version,
    /// parameters, salt, and hash. Example:
    ///
    /// ```text
    /// $argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>
    /// ```
    ///
    /// ## Errors
    ///
    /// Returns `ApiError::InternalError` if hashing fails (rare).
    pub fn hash(&self, password: &str) -> Result<String, ApiError> {
        // Generate a cryptographically secure random salt
        let salt = SaltString::generate(&mut OsRng);

        // Hash the password
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::InternalError {
                message: format!("Password hashing failed: {}", e),
            })
    }

    /// Verifies a password against a stored hash.
    ///
    /// ## Process
    ///
    /// 1. Parse the PHC string to extract parameters and salt
    /// 2. Re-hash the provided password with the same salt
    /// 3. Compare in constant time (prevents timing attacks)
    ///
    /// ## Returns
    ///
    /// - `Ok(true)` - Password matches
    /// - `Ok(false)` - Password doesn't match
    /// - `Err(...)` - Invalid hash format or other error
    ///
    /// ## Security Note
    ///
    /// This uses constant-time comparison to prevent timing attacks.
    /// An attacker cannot determine how "close" a guess was.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, ApiError> {
        // Parse the stored hash
        let parsed_hash = PasswordHash::new(hash).map_err(|e| ApiError::InternalError {
            message: format!("Invalid password hash format: {}", e),
        })?;

        // Verify with constant-time comparison
        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ApiError::InternalError {
                message: format!("Password verification failed: {}", e),
            }),
        }
    }

    /// Checks whether a stored hash was produced with weaker parameters
    /// than this hasher currently uses.
    ///
    /// Called after a successful login so the caller can re-hash the
    /// password (still available in plaintext at that point) and persist
    /// the upgraded hash, letting parameters be raised over time without a
    /// bulk migration.
    ///
    /// Returns `true` for any hash this instance can't parse the params of
    /// - treating an unreadable hash as needing an upgrade is the safer
    /// default than silently leaving it alone.
    pub fn needs_upgrade(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };
        let Ok(params) = Params::try_from(&parsed) else {
            return true;
        };
        params.m_cost() < Self::MEMORY_COST_KIB
            || params.t_cost() < Self::TIME_COST
            || params.p_cost() < Self::PARALLELISM
    }
}

// Implement Debug manually to avoid exposing internal state
impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

// =============================================================================
// Password Validator
// =============================================================================

/// Validates password strength before hashing.
///
/// ## Requirements
///
/// | Requirement | Reason |
/// |-------------|--------|
/// | 8+ characters | Increases search space |
/// | Not a known-weak password | Blocks the passwords attackers try first |
///
/// Deliberately no complexity-class rule (uppercase/lowercase/digit/symbol).
/// Length and a deny-list catch far more real-world weak passwords than
/// forcing users into "Password1!"-style substitutions does.
///
/// ## Example
///
/// ```rust,ignore
/// match PasswordValidator::validate("weak") {
///     Ok(()) => println!("Password is strong enough"),
///     Err(errors) => {
///         for error in errors {
///             println!("- {}", error);
///         }
///     }
/// }
/// ```
pub struct PasswordValidator;

impl PasswordValidator {
    /// Common passwords rejected outright regardless of length.
    ///
    /// Not meant to be exhaustive - a small, high-signal list of the
    /// passwords that show up at the top of every leaked-credential
    /// frequency table. Checked case-insensitively.
    const DENY_LIST: &'static [&'static str] = &[
        "password", "password1", "password123", "12345678", "123456789",
        "qwertyui", "qwerty123", "letmein1", "iloveyou", "admin1234",
        "welcome1", "changeme", "00000000", "11111111", "abc12345",
    ];

    /// Validates that a password meets minimum strength requirements.
    ///
    /// ## Returns
    ///
    /// - `Ok(())` - Password meets all requirements
    /// - `Err(Vec<&str>)` - List of failed requirements
    ///
    /// ## Requirements
    ///
    /// - Minimum 8 characters
    /// - Not in the known-weak deny-list
    pub fn validate(password: &str) -> Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();

        if password.len() < 8 {
            errors.push("Password must be at least 8 characters long");
        }

        let lowered = password.to_lowercase();
        if Self::DENY_LIST.contains(&lowered.as_str()) {
            errors.push("Password is too common, please choose a stronger one");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_correct_password() {
        let hasher = PasswordHasher::new();
        let password = "MySecureP@ssw0rd!";

        let hash = hasher.hash(password).unwrap();

        // Hash should be different from plaintext
        assert_ne!(hash, password);

        // Verification should pass with correct password
        assert!(hasher.verify(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hasher = PasswordHasher::new();
        let password = "MySecureP@ssw0rd!";
        let wrong_password = "WrongP@ssw0rd!";

        let hash = hasher.hash(password).unwrap();

        // Verification should fail with wrong password
        assert!(!hasher.verify(wrong_password, &hash).unwrap());
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hasher = PasswordHasher::new();
        let password = "MySecureP@ssw0rd!";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        // Each hash should be unique due to random salt
        assert_ne!(hash1, hash2);

        // But both should verify correctly
        assert!(hasher.verify(password, &hash1).unwrap());
        assert!(hasher.verify(password, &hash2).unwrap());
    }

    #[test]
    fn test_hash_is_phc_format() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("TestP@ssw0rd!").unwrap();

        // PHC string should start with algorithm identifier
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_password_validator_valid_password() {
        assert!(PasswordValidator::validate("correcthorsebattery").is_ok());
        assert!(PasswordValidator::validate("my8letter").is_ok());
        assert!(PasswordValidator::validate("tr0ub4dor").is_ok());
    }

    #[test]
    fn test_password_validator_too_short() {
        let result = PasswordValidator::validate("sh0rt1");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains(&"Password must be at least 8 characters long"));
    }

    #[test]
    fn test_password_validator_rejects_deny_list_entries() {
        let result = PasswordValidator::validate("password123");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains(&"Password is too common, please choose a stronger one"));
    }

    #[test]
    fn test_password_validator_deny_list_is_case_insensitive() {
        let result = PasswordValidator::validate("PASSWORD1");
        assert!(result.is_err());
    }

    #[test]
    fn test_password_validator_multiple_errors() {
        let result = PasswordValidator::validate("abc123");
        assert!(result.is_err());
        // Too short only - "abc123" isn't itself on the deny list
        assert_eq!(result.unwrap_err().len(), 1);
    }

    #[test]
    fn test_needs_upgrade_false_for_current_params() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("correcthorsebattery").unwrap();
        assert!(!hasher.needs_upgrade(&hash));
    }

    #[test]
    fn test_needs_upgrade_true_for_weaker_params() {
        let weak_params = Params::new(8 * 1024, 1, 1, None).unwrap();
        let weak_argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, weak_params);
        let weak_hasher = PasswordHasher { argon2: weak_argon2 };
        let hash = weak_hasher.hash("correcthorsebattery").unwrap();

        let current_hasher = PasswordHasher::new();
        assert!(current_hasher.needs_upgrade(&hash));
    }

    #[test]
    fn test_needs_upgrade_true_for_garbage_hash() {
        let hasher = PasswordHasher::new();
        assert!(hasher.needs_upgrade("not-a-real-hash"));
    }
}

