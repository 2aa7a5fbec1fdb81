//! User-Agent sent with every request to the download manager.

/// Default User-Agent for manager requests (identifies the broker and its version).
#[must_use]
pub(crate) fn default_manager_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("download-broker/{version} (local-bridge)")
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_contains_crate_version() {
        let ua = default_manager_user_agent();
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("download-broker/")
                .and_then(|s| s.split(' ').next())
                .expect("UA has version"),
            "UA must contain crate version"
        );
    }
}
