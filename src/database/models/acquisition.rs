//! User acquisition model.
//!
//! Records the /start deep-link payload that brought a user to the
//! bot. Written once per user; the first payload wins.

use serde::{Deserialize, Serialize};

/// Acquisition attribution for one user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcquisitionRecord {
    pub user_id: i64,
    pub payload_raw: String,
    pub payload_decoded: String,
    pub src: Option<String>,
    pub campaign: Option<String>,
    pub ad: Option<String>,
    pub language_code: Option<String>,
    pub created_at: i64,
}

impl AcquisitionRecord {
    /// Build a record from a `src-campaign-ad` deep-link payload.
    ///
    /// Missing segments stay unset; the raw payload is kept verbatim.
    pub fn from_payload(user_id: i64, payload: &str, language_code: Option<String>) -> Self {
        let decoded = payload.trim().to_lowercase();
        let mut parts = decoded.splitn(3, '-');
        let src = parts.next().map(str::to_string).filter(|s| !s.is_empty());
        let campaign = parts.next().map(str::to_string).filter(|s| !s.is_empty());
        let ad = parts.next().map(str::to_string).filter(|s| !s.is_empty());

        Self {
            user_id,
            payload_raw: payload.to_string(),
            payload_decoded: decoded,
            src,
            campaign,
            ad,
            language_code,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_payload() {
        let rec = AcquisitionRecord::from_payload(1, "TG-Spring-Banner7", None);
        assert_eq!(rec.payload_decoded, "tg-spring-banner7");
        assert_eq!(rec.src.as_deref(), Some("tg"));
        assert_eq!(rec.campaign.as_deref(), Some("spring"));
        assert_eq!(rec.ad.as_deref(), Some("banner7"));
    }

    #[test]
    fn test_partial_payload() {
        let rec = AcquisitionRecord::from_payload(1, "vk", None);
        assert_eq!(rec.src.as_deref(), Some("vk"));
        assert_eq!(rec.campaign, None);
        assert_eq!(rec.ad, None);
    }
}
