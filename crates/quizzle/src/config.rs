//! Server configuration.

use std::time::Duration;

/// Tunables for a Word Quizzle deployment.
///
/// Defaults: sessions on 8888, registration on 5678, one-minute matches,
/// fifteen-second invitation windows, five words per match.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the session listener binds to.
    pub bind_addr: String,

    /// Address the registration front door binds to.
    pub registration_addr: String,

    /// Wall-clock budget of one duel.
    pub match_duration: Duration,

    /// How long a challenged player gets to answer an invitation.
    pub invite_window: Duration,

    /// Words in each duel's batch.
    pub match_words: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8888".to_string(),
            registration_addr: "0.0.0.0:5678".to_string(),
            match_duration: Duration::from_secs(60),
            invite_window: Duration::from_secs(15),
            match_words: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8888");
        assert_eq!(config.registration_addr, "0.0.0.0:5678");
        assert_eq!(config.match_duration, Duration::from_secs(60));
        assert_eq!(config.invite_window, Duration::from_secs(15));
        assert_eq!(config.match_words, 5);
    }
}
