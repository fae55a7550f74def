//! Shared types used across all mindmates crates.

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Returns the current Unix timestamp in milliseconds.
pub fn unix_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Role tag for a wire-level chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Wire-level message sent to (or received from) the completion endpoint.
/// Constructed per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One entry in a session transcript shown to the user. Held in gateway
/// memory only; not persisted across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub role: Role,
    pub timestamp_ms: i64,
}

impl ChatMessage {
    /// Creates a transcript entry stamped with the current time.
    pub fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            content: content.into(),
            role,
            timestamp_ms: unix_millis(),
        }
    }
}

/// Fixed set of emotional categories the model may annotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MindTributeType {
    Anxiety,
    Sadness,
    Loneliness,
    Fear,
    Anger,
}

/// A scored, summarized annotation of one emotional category, inferred by
/// the model from a user's messages. The set stored on a [`User`] is
/// wholesale-replaced on each successful chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindTribute {
    #[serde(rename = "type")]
    pub kind: MindTributeType,
    pub score: f32,
    pub summary: String,
}

/// A member of the peer-support network. Persisted as JSON bytes in the
/// user directory. `mind_tributes` reflects only the most recent
/// successful chat turn; no history is retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub pronouns: String,
    #[serde(default)]
    pub my_supporters: Vec<String>,
    #[serde(default)]
    pub supporting: Vec<String>,
    #[serde(default)]
    pub mind_tributes: Option<Vec<MindTribute>>,
}

impl User {
    /// Serializes to JSON bytes for storage in the directory.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Deserializes from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }

    /// The tribute shown when a single emotional state must represent the
    /// user: the highest-scoring one, latest-in-list winning ties.
    pub fn dominant_tribute(&self) -> Option<&MindTribute> {
        self.mind_tributes.as_deref().and_then(|tributes| {
            tributes
                .iter()
                .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
        })
    }
}

/// Global application configuration (gateway + pipeline). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Application identity.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Base directory for the Sled user directory DB.
    pub storage_path: String,
    /// Chat-completion endpoint URL.
    pub api_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Path to the instruction template asset (single `{{userMessages}}` placeholder).
    pub template_path: String,
    /// Path to the seed users JSON loaded on first startup.
    pub seed_path: String,
}

impl CoreConfig {
    /// Load config from file and environment. Precedence: env `MINDMATES_CONFIG`
    /// path > `config/gateway.toml` > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("MINDMATES_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "mindmates")?
            .set_default("port", 8002_i64)?
            .set_default("storage_path", "./data/mindmates_directory")?
            .set_default("api_url", "https://api.openai.com/v1/chat/completions")?
            .set_default("model", "gpt-4o-mini")?
            .set_default("template_path", "config/companion_prompt.txt")?
            .set_default("seed_path", "config/seed_users.json")?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("MINDMATES").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tribute(kind: MindTributeType, score: f32) -> MindTribute {
        MindTribute {
            kind,
            score,
            summary: format!("{:?} at {}", kind, score),
        }
    }

    #[test]
    fn user_round_trips_through_bytes() {
        let user = User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "hunter2".into(),
            pronouns: "she/her".into(),
            my_supporters: vec!["u2".into()],
            supporting: vec![],
            mind_tributes: Some(vec![tribute(MindTributeType::Anxiety, 0.4)]),
        };
        let restored = User::from_bytes(&user.to_bytes()).expect("round trip");
        assert_eq!(restored.id, "u1");
        assert_eq!(restored.my_supporters, vec!["u2".to_string()]);
        assert_eq!(
            restored.mind_tributes.unwrap()[0].kind,
            MindTributeType::Anxiety
        );
    }

    #[test]
    fn user_parses_original_seed_shape() {
        // Field names on disk are camelCase, tribute category is "type".
        let raw = r#"{
            "id": "1",
            "name": "Sam",
            "email": "sam@example.com",
            "password": "pass",
            "pronouns": "they/them",
            "mySupporters": ["2"],
            "supporting": [],
            "mindTributes": [{"type": "loneliness", "score": 7.5, "summary": "misses friends"}]
        }"#;
        let user: User = serde_json::from_str(raw).expect("seed shape");
        assert_eq!(user.my_supporters, vec!["2".to_string()]);
        let tributes = user.mind_tributes.expect("tributes");
        assert_eq!(tributes[0].kind, MindTributeType::Loneliness);
        assert_eq!(tributes[0].score, 7.5);
    }

    #[test]
    fn dominant_tribute_picks_highest_score() {
        let mut user = User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "a@e".into(),
            password: String::new(),
            pronouns: String::new(),
            my_supporters: vec![],
            supporting: vec![],
            mind_tributes: Some(vec![
                tribute(MindTributeType::Sadness, 3.0),
                tribute(MindTributeType::Fear, 9.0),
                tribute(MindTributeType::Anger, 5.0),
            ]),
        };
        assert_eq!(
            user.dominant_tribute().unwrap().kind,
            MindTributeType::Fear
        );

        user.mind_tributes = None;
        assert!(user.dominant_tribute().is_none());
    }
}
