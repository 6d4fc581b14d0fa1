use reqwest::Url;
use uuid::Uuid;

/// Read-only link to a user's journal: `<app_url>?user=<id>`
pub fn share_link(app_url: &str, user_id: Uuid) -> String {
    let base = app_url.split(['?', '#']).next().unwrap_or(app_url);
    format!("{}?user={}", base, user_id)
}

/// Target user of a shared view, from either a bare id or a share link.
/// Anything that does not carry a valid id yields `None`.
pub fn parse_share_link(value: &str) -> Option<Uuid> {
    let value = value.trim();
    if let Ok(id) = Uuid::parse_str(value) {
        return Some(id);
    }
    let url = Url::parse(value).ok()?;
    let (_, user) = url.query_pairs().find(|(key, _)| key == "user")?;
    Uuid::parse_str(&user).ok()
}
