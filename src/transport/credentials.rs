//! Per-call credentials attached by the transport to every RPC.

use std::fmt;

use crate::config::Identity;

/// Supplies the metadata pairs attached to each call.
pub trait Credentials: Send + Sync + 'static {
    fn metadata(&self) -> Vec<(&'static str, String)>;

    /// Whether the transport may send these credentials over plaintext.
    fn require_transport_security(&self) -> bool {
        false
    }
}

/// Client secret + client id authentication, as expected by the collector.
#[derive(Clone)]
pub struct SecretAuth {
    client_secret: String,
    client_uuid: String,
}

impl SecretAuth {
    pub fn new(client_secret: impl Into<String>, client_uuid: impl Into<String>) -> Self {
        Self {
            client_secret: client_secret.into(),
            client_uuid: client_uuid.into(),
        }
    }
}

impl From<&Identity> for SecretAuth {
    fn from(id: &Identity) -> Self {
        Self::new(id.client_secret.clone(), id.client_id.clone())
    }
}

impl Credentials for SecretAuth {
    fn metadata(&self) -> Vec<(&'static str, String)> {
        vec![
            ("client_secret", self.client_secret.clone()),
            ("client_uuid", self.client_uuid.clone()),
        ]
    }
}

// Keeps the secret out of logs.
impl fmt::Debug for SecretAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretAuth")
            .field("client_uuid", &self.client_uuid)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_pairs() {
        let auth = SecretAuth::from(&Identity {
            client_secret: "s3cr3t".into(),
            client_id: "8d1f".into(),
        });
        assert_eq!(
            auth.metadata(),
            vec![
                ("client_secret", "s3cr3t".to_string()),
                ("client_uuid", "8d1f".to_string())
            ]
        );
        assert!(!format!("{auth:?}").contains("s3cr3t"));
    }
}
