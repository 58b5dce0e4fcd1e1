use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct MediaConfig {
    /// Lifetime of end-user playback URLs.
    #[serde(default = "default_stream_ttl_minutes")]
    pub stream_ttl_minutes: i64,
    /// Lifetime of admin preview URLs, deliberately short.
    #[serde(default = "default_preview_ttl_minutes")]
    pub preview_ttl_minutes: i64,
}

fn default_stream_ttl_minutes() -> i64 {
    120
}

fn default_preview_ttl_minutes() -> i64 {
    30
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            stream_ttl_minutes: default_stream_ttl_minutes(),
            preview_ttl_minutes: default_preview_ttl_minutes(),
        }
    }
}

impl MediaConfig {
    pub fn stream_ttl_secs(&self) -> i64 {
        self.stream_ttl_minutes * 60
    }

    pub fn preview_ttl_secs(&self) -> i64 {
        self.preview_ttl_minutes * 60
    }
}
