use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::folder::RecordStatus;
use crate::error::{AppError, FieldError};

/// Shareable link: a time-limited, publicly resolvable pointer to a folder's
/// contents. Folder attributes are snapshotted at issuance so public
/// resolution never depends on folder state that may change or disappear; the
/// expiry instant is link-owned and immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShareLink {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub smart_folder_id: Uuid,
    pub smart_folder_name: String,
    pub smart_folder_category: i64,
    pub smart_folder_sub_category: i64,
    pub smart_folder_description: String,
    /// Requested lifetime in hours, kept for display; `expiry_date` is the
    /// authoritative instant.
    pub expires_in: i64,
    pub expiry_date: DateTime<Utc>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub created_by_user_id: Uuid,
    pub created_by_user_name: String,
}

impl ShareLink {
    /// A link is live strictly before its expiry instant and expired from that
    /// instant on. There is no soft renewal.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_date
    }

    /// Expiry for a link issued at `now` with a requested lifetime in hours.
    pub fn expiry_for(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
        now + Duration::hours(expires_in)
    }
}

/// Request DTO for issuing a shareable link
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLinkRequest {
    #[serde(default)]
    pub smart_folder_id: Uuid,
    /// Requested lifetime in hours.
    #[serde(default)]
    pub expires_in: i64,
}

impl CreateLinkRequest {
    /// Field-level validation, before any lock or database round-trip.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut e = Vec::new();

        if self.smart_folder_id.is_nil() {
            e.push(FieldError::missing("smart_folder_id"));
        }
        if self.expires_in == 0 {
            e.push(FieldError::missing("expires_in"));
        } else if self.expires_in < 0 {
            e.push(FieldError::new(
                "expires_in",
                "must be a positive number of hours",
            ));
        }

        if !e.is_empty() {
            return Err(AppError::Validation(e));
        }
        Ok(())
    }
}

/// One file in a public resolution, with a freshly minted presigned URL.
#[derive(Debug, Clone, Serialize)]
pub struct PublicFileView {
    pub id: Uuid,
    pub name: String,
    pub filename: String,
    pub content_type: String,
    pub classification: i64,
    /// Short-lived presigned URL, recomputed on every resolution.
    pub url: String,
}

/// Anonymous view of a live link: the folder snapshot carried by the link plus
/// the current file list. Assembled per request and never cached.
#[derive(Debug, Clone, Serialize)]
pub struct PublicLinkView {
    pub id: Uuid,
    pub smart_folder_name: String,
    pub smart_folder_category: i64,
    pub smart_folder_sub_category: i64,
    pub smart_folder_description: String,
    pub expiry_date: DateTime<Utc>,
    pub files: Vec<PublicFileView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_is_live_strictly_before_expiry() {
        let now = Utc::now();
        let link = ShareLink {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            tenant_name: "Acme".to_string(),
            smart_folder_id: Uuid::new_v4(),
            smart_folder_name: "Tax Returns".to_string(),
            smart_folder_category: 2,
            smart_folder_sub_category: 3,
            smart_folder_description: String::new(),
            expires_in: 24,
            expiry_date: ShareLink::expiry_for(now, 24),
            status: RecordStatus::Active,
            created_at: now,
            created_by_user_id: Uuid::new_v4(),
            created_by_user_name: "bob".to_string(),
        };

        assert!(!link.is_expired(now));
        assert!(!link.is_expired(now + Duration::hours(23)));
        // Expiry is inclusive: at the instant itself the link is expired.
        assert!(link.is_expired(link.expiry_date));
        assert!(link.is_expired(now + Duration::hours(25)));
    }

    #[test]
    fn create_request_requires_folder_and_lifetime() {
        let req = CreateLinkRequest {
            smart_folder_id: Uuid::nil(),
            expires_in: 0,
        };
        let err = req.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("smart_folder_id: missing value"));
        assert!(msg.contains("expires_in: missing value"));
    }

    #[test]
    fn create_request_rejects_negative_lifetime() {
        let req = CreateLinkRequest {
            smart_folder_id: Uuid::new_v4(),
            expires_in: -2,
        };
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("positive number of hours"));
    }

    #[test]
    fn create_request_accepts_valid_input() {
        let req = CreateLinkRequest {
            smart_folder_id: Uuid::new_v4(),
            expires_in: 24,
        };
        assert!(req.validate().is_ok());
    }
}
