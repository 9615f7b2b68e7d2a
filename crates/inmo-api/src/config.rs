//! Backend base-URL resolution

/// Backend used when nothing else is configured
pub const DEFAULT_LOCAL_URL: &str = "http://localhost:8000";

/// Hosting domain of the preview deployments
pub const HOSTED_PREVIEW_DOMAIN: &str = "vercel.app";

/// Backend paired with the preview deployments
pub const HOSTED_BACKEND_URL: &str = "https://inmo-backend-e6zz.onrender.com";

/// Pick the backend URL: an explicit override wins, then the deployment host
/// heuristic, then the local default.
pub fn resolve_base_url(override_url: Option<&str>, deploy_host: Option<&str>) -> String {
    let url = match override_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => url.to_string(),
        None => match deploy_host {
            Some(host) if host.contains(HOSTED_PREVIEW_DOMAIN) => HOSTED_BACKEND_URL.to_string(),
            _ => DEFAULT_LOCAL_URL.to_string(),
        },
    };
    url.trim_end_matches('/').to_string()
}
