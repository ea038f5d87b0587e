//! Configuration module for the Motorist bot.
//!
//! Loads configuration from environment variables. The RAG backend has
//! its own config in `crate::rag`.

use std::env;

/// Bot running mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotMode {
    Polling,
    Webhook,
}

impl Default for BotMode {
    fn default() -> Self {
        Self::Polling
    }
}

/// An administrator seeded from `ADMIN_USER_IDS` at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub user_id: i64,
    pub username: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Admins seeded into the roster at startup.
    pub admin_seeds: Vec<AdminSeed>,

    /// Secret for the /bootstrap command. Unset disables the command.
    pub bootstrap_secret: Option<String>,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if required environment variables are not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bot_mode = env::var("BOT_MODE")
            .unwrap_or_else(|_| "polling".to_string())
            .to_lowercase();

        let bot_mode = match bot_mode.as_str() {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = env::var("WEBHOOK_URL").ok();

        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            panic!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let webhook_port = env::var("WEBHOOK_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8443);

        let webhook_secret = env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());

        let admin_seeds = parse_admin_seeds(&env::var("ADMIN_USER_IDS").unwrap_or_default());

        let bootstrap_secret = env::var("ADMIN_BOOTSTRAP_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        Self {
            bot_token: env::var("BOT_TOKEN").expect("BOT_TOKEN must be set"),
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret,
            admin_seeds,
            bootstrap_secret,
            mongodb_uri: env::var("MONGODB_URI").expect("MONGODB_URI must be set"),
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "motorist".to_string()),
        }
    }
}

/// Parse the `ADMIN_USER_IDS` list.
///
/// Comma-separated entries, each either `363046871` or `363046871@ergottli`.
/// Invalid entries are skipped.
fn parse_admin_seeds(raw: &str) -> Vec<AdminSeed> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let (id_part, name_part) = match entry.split_once('@') {
                Some((id, name)) => (id, Some(name)),
                None => (entry, None),
            };
            let user_id = id_part.trim().parse::<i64>().ok().filter(|id| *id > 0)?;
            let username = name_part
                .map(|n| n.trim().to_lowercase())
                .filter(|n| !n.is_empty());
            Some(AdminSeed { user_id, username })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_seeds() {
        let seeds = parse_admin_seeds("363046871@Ergottli, 42,bogus, 7@");
        assert_eq!(
            seeds,
            vec![
                AdminSeed {
                    user_id: 363046871,
                    username: Some("ergottli".to_string()),
                },
                AdminSeed {
                    user_id: 42,
                    username: None,
                },
                AdminSeed {
                    user_id: 7,
                    username: None,
                },
            ]
        );
    }

    #[test]
    fn test_parse_admin_seeds_empty() {
        assert!(parse_admin_seeds("").is_empty());
        assert!(parse_admin_seeds(" , ,").is_empty());
    }
}
