use crate::config::ProviderResolvedConfig;
use crate::error::SlotbotError;
use std::time::Duration;

/// Builds the reqwest client for one provider instance.
pub fn build_client(cfg: &ProviderResolvedConfig) -> Result<reqwest::Client, SlotbotError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(cfg.user_agent.clone())
        .connect_timeout(Duration::from_secs(5))
        .timeout(cfg.timeout);

    if let Some(proxy_url) = cfg.proxy.as_ref() {
        let proxy = reqwest::Proxy::all(proxy_url.as_str())?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}
