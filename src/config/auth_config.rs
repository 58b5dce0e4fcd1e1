use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for session tokens.
    pub secret: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// When set and no admin account exists yet, one is created at startup.
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
    pub bootstrap_admin_name: Option<String>,
}

fn default_session_ttl_hours() -> i64 {
    12
}

impl AuthConfig {
    pub fn session_ttl_secs(&self) -> i64 {
        self.session_ttl_hours * 3600
    }
}
