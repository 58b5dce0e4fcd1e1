use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginBodyDto {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponseDto {
    /// Role landing page, `/admin/dashboard` or `/my/courses`.
    pub redirect: &'static str,
}
