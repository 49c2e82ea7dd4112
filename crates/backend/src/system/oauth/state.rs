use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::distributions::Alphanumeric;
use rand::Rng;

pub const STATE_LEN: usize = 32;

struct PendingState {
    settings_code: String,
    expires_at: Instant,
}

/// Одноразовые значения `state`, выданные при переходе на страницу согласия
pub struct OAuthStateStore {
    ttl: Duration,
    states: Mutex<HashMap<String, PendingState>>,
}

impl OAuthStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Выдать новый `state` для настроек продавца
    pub fn issue(&self, settings_code: &str) -> String {
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_LEN)
            .map(char::from)
            .collect();
        let now = Instant::now();

        let mut states = self.states.lock().unwrap_or_else(|p| p.into_inner());
        states.retain(|_, pending| pending.expires_at > now);
        states.insert(
            state.clone(),
            PendingState {
                settings_code: settings_code.to_string(),
                expires_at: now + self.ttl,
            },
        );
        state
    }

    /// Погасить `state`. Возвращает код настроек, если значение выдавалось
    /// и ещё не истекло.
    pub fn take(&self, state: &str) -> Option<String> {
        let mut states = self.states.lock().unwrap_or_else(|p| p.into_inner());
        let pending = states.remove(state)?;
        (pending.expires_at > Instant::now()).then_some(pending.settings_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_single_use() {
        let store = OAuthStateStore::new(Duration::from_secs(120));
        let state = store.issue("IN-MAIN");
        assert_eq!(state.len(), STATE_LEN);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));

        assert_eq!(store.take(&state).as_deref(), Some("IN-MAIN"));
        assert_eq!(store.take(&state), None);
        assert_eq!(store.take("forged"), None);
    }

    #[test]
    fn test_expired_state_is_rejected() {
        let store = OAuthStateStore::new(Duration::ZERO);
        let state = store.issue("IN-MAIN");
        assert_eq!(store.take(&state), None);
    }
}
