use serde::{Deserialize, Serialize};

/// Credentials for `sign-in/`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SignIn {
    pub username: String,
    pub password: String,
}

/// Registration details for `sign-up/`. The server requires a phone number starting with `+`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SignUp {
    pub username: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
}

/// A user record as returned by `sign-up/`, `get-user-data/` and `update_profile/`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// A partial profile update. Only the fields that are set are sent.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
