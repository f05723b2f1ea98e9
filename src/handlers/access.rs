use std::collections::HashMap;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::session::Session;

const UNLOCK_RETRY_SECONDS: u64 = 3;

static UNLOCK_ATTEMPTS: Lazy<Mutex<HashMap<i64, Instant>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// One password attempt per chat every few seconds.
pub fn is_unlock_rate_limited(chat_id: i64) -> bool {
    let mut attempts = UNLOCK_ATTEMPTS.lock();
    let now = Instant::now();

    if let Some(last) = attempts.get(&chat_id) {
        if now.duration_since(*last) < Duration::from_secs(UNLOCK_RETRY_SECONDS) {
            return true;
        }
    }

    attempts.insert(chat_id, now);
    false
}

/// Exact comparison. Without a configured secret nothing unlocks, not even an empty attempt.
pub fn check_gallery_password(configured: Option<&str>, attempt: &str) -> bool {
    match configured {
        Some(secret) if !secret.is_empty() => attempt == secret,
        _ => false,
    }
}

/// Applies an unlock attempt to the session; a wrong password never re-locks.
pub fn unlock_gallery(session: &mut Session, configured: Option<&str>, attempt: &str) -> bool {
    if configured.map_or(true, str::is_empty) {
        warn!("Gallery unlock attempted but LOVE_GALLERY_PASS is not set");
    }
    if check_gallery_password(configured, attempt) {
        session.gallery_unlocked = true;
        info!("Gallery unlocked");
    }
    session.gallery_unlocked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_exact_password_unlocks() {
        assert!(check_gallery_password(Some("roses"), "roses"));
        assert!(check_gallery_password(Some(" roses "), " roses "));
        assert!(!check_gallery_password(Some("roses"), "  roses\n"));
    }

    #[test]
    fn wrong_or_empty_attempts_are_denied() {
        assert!(!check_gallery_password(Some("roses"), "Roses"));
        assert!(!check_gallery_password(Some("roses"), ""));
    }

    #[test]
    fn unset_secret_denies_everything() {
        assert!(!check_gallery_password(None, ""));
        assert!(!check_gallery_password(None, "anything"));
        assert!(!check_gallery_password(Some(""), ""));
    }

    #[test]
    fn unlocking_sticks_for_the_session() {
        let mut session = Session::default();
        assert!(!unlock_gallery(&mut session, Some("roses"), "tulips"));
        assert!(unlock_gallery(&mut session, Some("roses"), "roses"));
        assert!(unlock_gallery(&mut session, Some("roses"), "wrong"));
    }

    #[test]
    fn rapid_attempts_are_throttled_per_chat() {
        assert!(!is_unlock_rate_limited(-901));
        assert!(is_unlock_rate_limited(-901));
        assert!(!is_unlock_rate_limited(-902));
    }
}
