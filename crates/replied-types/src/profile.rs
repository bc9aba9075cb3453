use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Point-in-time copy of the recipient's inbox settings.
///
/// `email` is the sealed contact address exactly as stored; it has to be
/// opened with the vault before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipientPolicy {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_paused: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocked_phrases: Vec<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl RecipientPolicy {
    /// Name used to greet the recipient in notifications
    pub fn greeting_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }

    pub fn sealed_contact(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }
}

/// Identity resolved from a bearer token by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "id")]
    pub user_id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
