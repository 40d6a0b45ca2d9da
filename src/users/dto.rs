use serde::Deserialize;
use uuid::Uuid;

/// Profile changes; absent or blank fields keep their current values.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpgradeUserRequest {
    #[serde(default)]
    pub role: String,
    pub id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct AutomatedEmailRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub send_to: String,
    #[serde(default)]
    pub reply_to: String,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub url: String,
}
