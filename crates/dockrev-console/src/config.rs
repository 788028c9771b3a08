use url::Url;

/// Deployment-provided runtime configuration for the console core.
///
/// `self_upgrade_url` is the base under which the supervisor (the separate
/// self-upgrade helper) is expected to be reachable; it is always normalized
/// to end with `/`.
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    pub self_upgrade_url: String,
    pub image_repo: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            self_upgrade_url: "/supervisor/".to_string(),
            image_repo: "ghcr.io/ivanli-cn/dockrev".to_string(),
        }
    }
}

impl ConsoleConfig {
    pub fn new(self_upgrade_url: impl Into<String>, image_repo: impl Into<String>) -> Self {
        Self {
            self_upgrade_url: normalize_self_upgrade_url(&self_upgrade_url.into()),
            image_repo: image_repo.into(),
        }
    }

    pub fn from_env() -> Self {
        let self_upgrade_url = match std::env::var("DOCKREV_SELF_UPGRADE_URL") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => "/supervisor/".to_string(),
        };

        let image_repo = match std::env::var("DOCKREV_IMAGE_REPO") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => "ghcr.io/ivanli-cn/dockrev".to_string(),
        };

        Self::new(self_upgrade_url, image_repo)
    }

    /// Path component of `self_upgrade_url` (which may be a full URL),
    /// without a trailing slash. `None` when the path is trivial (`/` or
    /// empty): a trivial base cannot be distinguished from normal routes.
    pub fn supervisor_base_path(&self) -> Option<String> {
        let s = self.self_upgrade_url.trim();
        if s.is_empty() {
            return None;
        }

        let base = Url::parse("http://example.invalid").ok()?;
        let joined = base.join(s).ok()?;
        let path = joined.path().trim_end_matches('/');
        if path.is_empty() || path == "/" {
            return None;
        }

        Some(path.to_string())
    }
}

fn normalize_self_upgrade_url(input: &str) -> String {
    let t = input.trim();
    if t.is_empty() {
        return "/supervisor/".to_string();
    }
    if t.ends_with('/') {
        t.to_string()
    } else {
        format!("{t}/")
    }
}
