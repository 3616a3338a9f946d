//! Visit history entry recorded each time a short link is followed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ShortLink;

/// One access-log entry.
///
/// `url` is the link destination at the time of the visit, so the entry stays
/// meaningful after the link is edited. The link itself is not stored; its id
/// only selects the list the entry lives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestHistory {
    pub url: String,
    pub ip: String,
    #[serde(rename = "ua")]
    pub user_agent: String,
    pub time: DateTime<Utc>,
}

impl RequestHistory {
    /// Snapshots `link.url` and stamps the entry with the current time.
    pub fn new(link: &ShortLink, ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            url: link.url.clone(),
            ip: ip.into(),
            user_agent: user_agent.into(),
            time: Utc::now(),
        }
    }
}
