//! Security capability: symmetric encryption for stored dialogue rows plus
//! coarse permission levels for sensitive actions.
//!
//! Ciphertext layout is `base64(nonce || aes-256-gcm ciphertext)` with a
//! fresh random 12-byte nonce per encryption; the key is the SHA-256 digest
//! of a passphrase.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

#[derive(Debug)]
pub enum SecurityError {
    /// Cipher rejected the input (wrong key, truncated or tampered data)
    Crypto,
    Decode(base64::DecodeError),
    Utf8(std::string::FromUtf8Error),
}

impl std::fmt::Display for SecurityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Crypto => write!(f, "cryptographic operation failed"),
            Self::Decode(err) => write!(f, "decode error: {err}"),
            Self::Utf8(err) => write!(f, "utf8 error: {err}"),
        }
    }
}

impl std::error::Error for SecurityError {}

impl From<base64::DecodeError> for SecurityError {
    fn from(value: base64::DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<std::string::FromUtf8Error> for SecurityError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        Self::Utf8(value)
    }
}

/// User authority, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PermissionLevel {
    Guest,
    User,
    Admin,
    SuperAdmin,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::User => "user",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

/// Minimum level required to run an action. Unlisted actions require a
/// regular user.
pub fn required_level(action: &str) -> PermissionLevel {
    match action {
        "greeting" | "help" | "time" | "date" | "weather" | "news" | "joke" => {
            PermissionLevel::Guest
        }
        "open_application" | "open_folder" | "play_music" | "search_internet" | "search_map"
        | "list_files" => PermissionLevel::User,
        "settings" | "config" | "restart" => PermissionLevel::Admin,
        "shutdown" | "update" | "install" => PermissionLevel::SuperAdmin,
        _ => PermissionLevel::User,
    }
}

/// Opaque security collaborator consumed by the dialogue core.
pub trait SecurityCapability: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, SecurityError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, SecurityError>;
    fn has_permission(&self, action: &str) -> bool;
    fn permission_level(&self) -> PermissionLevel;
}

/// AES-256-GCM implementation keyed from a passphrase.
pub struct AesGcmSecurity {
    key: [u8; 32],
    level: PermissionLevel,
}

impl AesGcmSecurity {
    pub fn new(passphrase: &str, level: PermissionLevel) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key, level }
    }
}

impl SecurityCapability for AesGcmSecurity {
    fn encrypt(&self, plaintext: &str) -> Result<String, SecurityError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| SecurityError::Crypto)?;
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| SecurityError::Crypto)?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(payload))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, SecurityError> {
        let payload = BASE64.decode(ciphertext)?;
        if payload.len() <= NONCE_LEN {
            return Err(SecurityError::Crypto);
        }
        let (nonce, body) = payload.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| SecurityError::Crypto)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|_| SecurityError::Crypto)?;
        Ok(String::from_utf8(plaintext)?)
    }

    fn has_permission(&self, action: &str) -> bool {
        self.level >= required_level(action)
    }

    fn permission_level(&self) -> PermissionLevel {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let security = AesGcmSecurity::new("口令", PermissionLevel::User);
        for text in ["你好，世界", "", "hello 123", "今天北京天气怎么样？"] {
            let sealed = security.encrypt(text).unwrap();
            assert_ne!(sealed, text);
            assert_eq!(security.decrypt(&sealed).unwrap(), text);
        }
    }

    #[test]
    fn test_nonce_makes_ciphertext_unique() {
        let security = AesGcmSecurity::new("口令", PermissionLevel::User);
        let a = security.encrypt("同一句话").unwrap();
        let b = security.encrypt("同一句话").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_corrupted_ciphertext_fails_cleanly() {
        let security = AesGcmSecurity::new("口令", PermissionLevel::User);
        let sealed = security.encrypt("机密内容").unwrap();
        let mut corrupted = sealed.into_bytes();
        let last = corrupted.len() - 1;
        corrupted[last] = if corrupted[last] == b'A' { b'B' } else { b'A' };
        let corrupted = String::from_utf8(corrupted).unwrap();
        assert!(security.decrypt(&corrupted).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealer = AesGcmSecurity::new("key-one", PermissionLevel::User);
        let opener = AesGcmSecurity::new("key-two", PermissionLevel::User);
        let sealed = sealer.encrypt("机密内容").unwrap();
        assert!(opener.decrypt(&sealed).is_err());
    }

    #[test]
    fn test_permission_ordering() {
        assert!(PermissionLevel::Admin > PermissionLevel::User);
        let guest = AesGcmSecurity::new("k", PermissionLevel::Guest);
        assert!(guest.has_permission("weather"));
        assert!(!guest.has_permission("open_application"));
        let admin = AesGcmSecurity::new("k", PermissionLevel::Admin);
        assert!(admin.has_permission("open_application"));
        assert!(!admin.has_permission("shutdown"));
    }
}
