use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NotifyConfig {
    /// POST booking outcomes and reminders as JSON to this URL. Unset logs them only.
    /// TOML: `notify.webhook_url`.
    #[serde(default)]
    pub webhook_url: Option<Url>,
}
