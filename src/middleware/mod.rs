use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;

use crate::errors::EngineError;

/// An authenticated staff member. Extracting this guards a handler: requests
/// without valid staff credentials never reach the lifecycle mutations.
#[derive(Debug, Clone)]
pub struct StaffUser {
    pub staff_id: i32,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

#[derive(sqlx::FromRow)]
struct StaffRow {
    staff_id: i32,
    email: String,
    password_hash: String,
    full_name: String,
    role: String,
}

const STAFF_ROLES: [&str; 2] = ["manager", "reception"];

fn bad_credentials() -> EngineError {
    EngineError::Unauthorized("valid staff credentials are required".to_string())
}

// Basic Auth extractor against the staff table. Rejections go through
// EngineError so auth failures carry the same JSON body as every other error.
impl FromRequestParts<Arc<crate::AppState>> for StaffUser {
    type Rejection = EngineError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(bad_credentials)?;

        let encoded = auth_header
            .strip_prefix("Basic ")
            .ok_or_else(bad_credentials)?;

        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| bad_credentials())?;

        let credentials = String::from_utf8(decoded).map_err(|_| bad_credentials())?;

        let mut parts = credentials.splitn(2, ':');
        let email = parts.next().ok_or_else(bad_credentials)?;
        let password = parts.next().ok_or_else(bad_credentials)?;

        let row: Option<StaffRow> = sqlx::query_as(
            "SELECT staff_id, email, password_hash, full_name, role \
             FROM staff \
             WHERE email = $1 AND is_active = true",
        )
        .bind(email)
        .fetch_optional(&state.db.pool)
        .await?;

        let staff = row.ok_or_else(bad_credentials)?;

        let valid = bcrypt::verify(password, &staff.password_hash).unwrap_or(false);
        if !valid {
            return Err(bad_credentials());
        }

        // Lifecycle mutations are reserved to front-desk roles.
        if !STAFF_ROLES.contains(&staff.role.as_str()) {
            return Err(EngineError::Forbidden(format!(
                "role {} may not manage bookings",
                staff.role
            )));
        }

        Ok(StaffUser {
            staff_id: staff.staff_id,
            email: staff.email,
            full_name: staff.full_name,
            role: staff.role,
        })
    }
}
