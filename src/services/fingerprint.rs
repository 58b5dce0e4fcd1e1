use rand::RngCore;
use sha2::{Digest, Sha256};

/// Raw per-request signals the fingerprint is derived from. The IP is
/// advisory only and never enters the digest.
#[derive(Debug, Clone, Default)]
pub struct DeviceSignals {
    pub user_agent: String,
    pub accept_language: String,
    pub accept_encoding: String,
    pub device_token: Option<String>,
    pub ip: Option<String>,
}

pub const DEVICE_TOKEN_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
#[error("Presented device token is malformed")]
pub struct MalformedDeviceToken;

pub struct Fingerprint {
    pub hash: String,
    /// Set when no token was presented; the caller owes the browser a
    /// durable Set-Cookie carrying it.
    pub minted_token: Option<String>,
}

pub fn mint_device_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn is_valid_device_token(token: &str) -> bool {
    token.len() == DEVICE_TOKEN_LEN
        && token
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Token-anchored fingerprint: SHA-256 over the header signals plus the
/// durable device token. Two browsers on one machine get distinct
/// fingerprints because each holds its own token; clearing cookies makes
/// the browser a new device that must pass registration again.
pub fn fingerprint(signals: &DeviceSignals) -> Result<Fingerprint, MalformedDeviceToken> {
    match signals.device_token.as_deref() {
        Some(token) if is_valid_device_token(token) => Ok(Fingerprint {
            hash: digest(signals, token),
            minted_token: None,
        }),
        Some(_) => Err(MalformedDeviceToken),
        None => {
            let token = mint_device_token();
            let hash = digest(signals, &token);
            Ok(Fingerprint {
                hash,
                minted_token: Some(token),
            })
        }
    }
}

fn digest(signals: &DeviceSignals, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signals.user_agent.as_bytes());
    hasher.update(signals.accept_language.as_bytes());
    hasher.update(signals.accept_encoding.as_bytes());
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Best-effort device label for the admin listing. Order matters: Android
/// user agents also contain "Linux".
pub fn device_label(user_agent: &str) -> &'static str {
    const LABELS: &[(&str, &str)] = &[
        ("iPhone", "iPhone"),
        ("iPad", "iPad"),
        ("Android", "Android Device"),
        ("Windows", "Windows PC"),
        ("Macintosh", "Mac"),
        ("Linux", "Linux Device"),
    ];
    LABELS
        .iter()
        .find(|(needle, _)| user_agent.contains(needle))
        .map(|(_, label)| *label)
        .unwrap_or("Unknown Device")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(token: Option<&str>) -> DeviceSignals {
        DeviceSignals {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)".into(),
            accept_language: "en-US,en;q=0.9".into(),
            accept_encoding: "gzip, deflate, br".into(),
            device_token: token.map(String::from),
            ip: Some("203.0.113.9".into()),
        }
    }

    #[test]
    fn stable_for_identical_signals() {
        let token = mint_device_token();
        let a = fingerprint(&signals(Some(&token))).unwrap();
        let b = fingerprint(&signals(Some(&token))).unwrap();
        assert_eq!(a.hash, b.hash);
        assert!(a.minted_token.is_none());
    }

    #[test]
    fn token_distinguishes_browsers_on_one_machine() {
        let a = fingerprint(&signals(Some(&mint_device_token()))).unwrap();
        let b = fingerprint(&signals(Some(&mint_device_token()))).unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn ip_change_does_not_move_the_fingerprint() {
        let token = mint_device_token();
        let mut roaming = signals(Some(&token));
        let home = fingerprint(&roaming).unwrap();
        roaming.ip = Some("198.51.100.1".into());
        assert_eq!(fingerprint(&roaming).unwrap().hash, home.hash);
    }

    #[test]
    fn missing_token_mints_one() {
        let fp = fingerprint(&signals(None)).unwrap();
        let minted = fp.minted_token.expect("token should be minted");
        assert!(is_valid_device_token(&minted));
        // The digest is anchored to the minted token
        let mut replay = signals(None);
        replay.device_token = Some(minted);
        assert_eq!(fingerprint(&replay).unwrap().hash, fp.hash);
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(fingerprint(&signals(Some("not-hex"))).is_err());
        assert!(fingerprint(&signals(Some(&"A".repeat(64)))).is_err());
    }

    #[test]
    fn labels_follow_user_agent() {
        assert_eq!(device_label("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)"), "iPhone");
        assert_eq!(
            device_label("Mozilla/5.0 (Linux; Android 14; Pixel 8)"),
            "Android Device"
        );
        assert_eq!(device_label("Mozilla/5.0 (X11; Linux x86_64)"), "Linux Device");
        assert_eq!(device_label("curl/8.4.0"), "Unknown Device");
    }
}
