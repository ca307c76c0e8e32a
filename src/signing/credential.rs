//! Provider credentials.

use std::fmt;

/// Access credentials for the remote recognition service.
///
/// Built once at startup from settings and shared read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_id: String,
    pub access_secret: String,
    pub region: String,
    pub service_name: String,
}

impl Credential {
    pub fn new(
        access_id: impl Into<String>,
        access_secret: impl Into<String>,
        region: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            access_id: access_id.into(),
            access_secret: access_secret.into(),
            region: region.into(),
            service_name: service_name.into(),
        }
    }

    /// Access id with everything but the first four characters masked.
    pub fn masked_id(&self) -> String {
        let visible: String = self.access_id.chars().take(4).collect();
        format!("{}****", visible)
    }
}

// Never print the secret, even in debug output.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_id", &self.masked_id())
            .field("access_secret", &"<redacted>")
            .field("region", &self.region)
            .field("service_name", &self.service_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let cred = Credential::new("AKIDEXAMPLE", "super-secret", "ap-guangzhou", "asr");
        let printed = format!("{:?}", cred);
        assert!(!printed.contains("super-secret"));
        assert!(!printed.contains("AKIDEXAMPLE"));
        assert!(printed.contains("AKID****"));
    }
}
