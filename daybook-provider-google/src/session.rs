//! Checks a stored token is usable before calling the API.

use chrono::{DateTime, Utc};
use daybook_core::error::{DaybookError, DaybookResult};

use crate::token_store::{StoredToken, TokenStore};

/// Return the stored token if it is present, unexpired and grants calendar
/// read access.
pub fn ensure_authenticated(store: &TokenStore, now: DateTime<Utc>) -> DaybookResult<StoredToken> {
    let Some(token) = store.load() else {
        return Err(DaybookError::Unauthenticated(
            "Not signed in to Google Calendar. Run `daybook auth import` first.".into(),
        ));
    };

    if token.is_expired(now) {
        tracing::info!(expires_at = ?token.expires_at(), "stored token is expired");
        return Err(DaybookError::Unauthenticated(
            "Google access token has expired".into(),
        ));
    }

    if !token.has_calendar_scope() {
        tracing::warn!(scope = %token.scope, "token missing calendar scope");
        return Err(DaybookError::InsufficientScope(format!(
            "Token scopes '{}' do not include calendar access",
            token.scope
        )));
    }

    Ok(token)
}
