//! Club directory client.
//!
//! Fetches the full club list, applies point reads/writes to single club
//! attributes (the denormalized members counter lives here), lists the clubs
//! a user administers, and creates new clubs.
//!
//! Reads are idempotent and retried a fixed number of times. Writes are
//! never retried: the members-count update is a read-modify-write and a
//! blind retry could double-apply it.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::CoreConfig;
use crate::error::{Error, Result};
use crate::retry::retry_read;

/// Club id — the string form of the backend's numeric primary key.
pub type ClubId = String;

/// One club in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    /// Club id, normalized to a string even when the wire carries a number.
    #[serde(deserialize_with = "id_as_string")]
    pub id: ClubId,
    /// Display name.
    pub name: String,
    /// Where the club meets.
    pub location: String,
    /// Denormalized member counter. Maintained by increment/decrement on
    /// toggle, not by recomputation, so it can drift under races.
    #[serde(default)]
    pub members_count: u64,
    /// Optional bio.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Optional Instagram handle.
    #[serde(default)]
    pub instagram: Option<String>,
}

/// Accept either a JSON string or a JSON number for the club id.
fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "club id must be a string or number, got {}",
            other
        ))),
    }
}

/// One row of the administered-clubs listing.
#[derive(Debug, Deserialize)]
struct AdminRow {
    #[serde(deserialize_with = "id_as_string")]
    club_id: ClubId,
}

/// Response to a club creation.
#[derive(Debug, Deserialize)]
struct CreatedClub {
    #[serde(deserialize_with = "id_as_string")]
    id: ClubId,
}

/// Remote directory of clubs.
#[async_trait]
pub trait ClubDirectory: Send + Sync {
    /// Full snapshot of the directory, ids normalized to strings.
    async fn list_clubs(&self) -> Result<Vec<Club>>;

    /// Point read of one club attribute. `Ok(None)` when absent.
    async fn get_club_attribute(&self, club_id: &str, name: &str) -> Result<Option<String>>;

    /// Point write of one club attribute. Errors are logged, not surfaced —
    /// fire-and-forget from the caller's perspective.
    async fn set_club_attribute(&self, club_id: &str, name: &str, value: &str);

    /// Ids of all clubs the given subject administers.
    async fn list_administered(&self, subject: &str) -> Result<Vec<ClubId>>;

    /// Insert a club row, then register the creator as its admin.
    ///
    /// These are two dependent remote operations. If the second fails after
    /// the first succeeded, the directory holds an orphan club with no listed
    /// admin; this surfaces as [`Error::PartialFailure`] and the orphan id is
    /// logged distinctly rather than masked.
    async fn create_club(&self, name: &str, location: &str, admin_subject: &str)
        -> Result<ClubId>;
}

/// HTTP implementation against the club endpoints of the clubs backend.
pub struct HttpClubDirectory {
    client: Client,
    base_url: String,
    read_retries: u32,
}

impl HttpClubDirectory {
    /// Create a client from the core configuration.
    pub fn new(config: &CoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Network(format!("build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base().to_string(),
            read_retries: config.read_retries,
        })
    }

    async fn fetch_clubs(&self) -> Result<Vec<Club>> {
        let url = format!("{}/clubs", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvalidResponse(format!(
                "club listing failed: {} - {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_administered(&self, subject: &str) -> Result<Vec<ClubId>> {
        let url = format!(
            "{}/clubs/admins?admin_id={}",
            self.base_url,
            urlencoding::encode(subject)
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvalidResponse(format!(
                "admin listing failed: {} - {}",
                status, body
            )));
        }

        let rows: Vec<AdminRow> = response.json().await?;
        Ok(rows.into_iter().map(|row| row.club_id).collect())
    }

    async fn fetch_club_attribute(&self, club_id: &str, name: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/clubs/{}/attribute?name={}",
            self.base_url,
            urlencoding::encode(club_id),
            urlencoding::encode(name)
        );
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(Error::ClubNotFound(club_id.to_string())),
            status if status.is_success() => {
                let body: Value = response.json().await?;
                Ok(body.get(name).and_then(Value::as_str).map(str::to_string))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::InvalidResponse(format!(
                    "club attribute fetch failed: {} - {}",
                    status, body
                )))
            }
        }
    }

}

#[async_trait]
impl ClubDirectory for HttpClubDirectory {
    async fn list_clubs(&self) -> Result<Vec<Club>> {
        retry_read(self.read_retries, "club listing", || self.fetch_clubs()).await
    }

    async fn get_club_attribute(&self, club_id: &str, name: &str) -> Result<Option<String>> {
        retry_read(self.read_retries, "club attribute fetch", || {
            self.fetch_club_attribute(club_id, name)
        })
        .await
    }

    async fn set_club_attribute(&self, club_id: &str, name: &str, value: &str) {
        let url = format!(
            "{}/clubs/{}/attribute",
            self.base_url,
            urlencoding::encode(club_id)
        );
        let body = serde_json::json!({
            "attribute": name,
            "value": value,
        });

        match self.client.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::error!(
                    club_id,
                    attribute = name,
                    "Club attribute write failed: {} - {}",
                    status,
                    body
                );
            }
            Err(e) => {
                tracing::error!(
                    club_id,
                    attribute = name,
                    "Club attribute write failed: {}",
                    e
                );
            }
        }
    }

    async fn list_administered(&self, subject: &str) -> Result<Vec<ClubId>> {
        retry_read(self.read_retries, "admin listing", || {
            self.fetch_administered(subject)
        })
        .await
    }

    async fn create_club(
        &self,
        name: &str,
        location: &str,
        admin_subject: &str,
    ) -> Result<ClubId> {
        // First dependent write: the club row itself.
        let url = format!("{}/clubs", self.base_url);
        let body = serde_json::json!({
            "name": name,
            "location": location,
            "admin_id": admin_subject,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvalidResponse(format!(
                "club creation failed: {} - {}",
                status, body
            )));
        }
        let created: CreatedClub = response.json().await?;

        // Second dependent write: the admin association row.
        let admin_url = format!(
            "{}/clubs/{}/admins",
            self.base_url,
            urlencoding::encode(&created.id)
        );
        let admin_body = serde_json::json!({ "admin_id": admin_subject });

        let admin_ok = match self.client.post(&admin_url).json(&admin_body).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::error!(
                    club_id = created.id.as_str(),
                    "Admin association failed after club insert: {} - {}",
                    status,
                    body
                );
                false
            }
            Err(e) => {
                tracing::error!(
                    club_id = created.id.as_str(),
                    "Admin association failed after club insert: {}",
                    e
                );
                false
            }
        };

        if !admin_ok {
            // Known inconsistency window: the club row exists with no admin.
            tracing::error!(
                club_id = created.id.as_str(),
                "Orphan club left in directory with no listed admin"
            );
            return Err(Error::PartialFailure(format!(
                "club {} created but admin association failed",
                created.id
            )));
        }

        Ok(created.id)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_club_id_decoded_from_number() {
        let club: Club = serde_json::from_str(
            r#"{"id": 42, "name": "Chess", "location": "Union 2F", "membersCount": 5}"#,
        )
        .unwrap();
        assert_eq!(club.id, "42");
        assert_eq!(club.members_count, 5);
    }

    #[test]
    fn test_club_id_decoded_from_string() {
        let club: Club =
            serde_json::from_str(r#"{"id": "7", "name": "Cycling", "location": "Gym"}"#).unwrap();
        assert_eq!(club.id, "7");
        assert_eq!(club.members_count, 0);
        assert!(club.description.is_none());
    }

    #[test]
    fn test_club_id_rejects_other_types() {
        let result: std::result::Result<Club, _> =
            serde_json::from_str(r#"{"id": [1], "name": "Chess", "location": "Union"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_admin_row_decoding() {
        let rows: Vec<AdminRow> =
            serde_json::from_str(r#"[{"club_id": 3}, {"club_id": "9"}]"#).unwrap();
        let ids: Vec<ClubId> = rows.into_iter().map(|r| r.club_id).collect();
        assert_eq!(ids, vec!["3", "9"]);
    }
}
