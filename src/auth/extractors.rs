use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};

/// Identifies the caller from the session-less `user` cookie set at login.
/// The value is an opaque owner id string; nothing here checks that it
/// resolves to a stored user.
#[derive(Debug)]
pub struct CurrentUser(pub String);

pub(crate) fn user_cookie(cookie_header: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(name, _)| *name == "user")
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts
            .headers
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Not logged in".to_string()))?;

        let user = user_cookie(cookies)
            .ok_or((StatusCode::UNAUTHORIZED, "Not logged in".to_string()))?;

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_user_cookie_out_of_many() {
        let header = "theme=dark; user=abc-123; lang=de";
        assert_eq!(user_cookie(header).as_deref(), Some("abc-123"));
    }

    #[test]
    fn missing_or_empty_user_cookie_is_none() {
        assert_eq!(user_cookie("theme=dark"), None);
        assert_eq!(user_cookie("user="), None);
        assert_eq!(user_cookie(""), None);
    }

    #[test]
    fn tolerates_whitespace_around_pairs() {
        assert_eq!(user_cookie(" user=xyz ; theme=dark"), Some("xyz".to_string()));
    }
}
