use axum::{ extract::FromRequestParts, http::{ request::Parts, HeaderMap } };
use uuid::Uuid;

use crate::enums::CallerRole;
use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authenticated caller, as asserted by the upstream gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Vendor(Uuid),
    /// Doctors are vendor accounts; their id is the vendor id.
    Doctor(Uuid),
    Staff(Uuid),
    Admin(Uuid),
    Customer(Uuid),
}

impl Caller {
    pub fn new(user_id: Uuid, role: CallerRole) -> Self {
        match role {
            CallerRole::Vendor => Caller::Vendor(user_id),
            CallerRole::Doctor => Caller::Doctor(user_id),
            CallerRole::Staff => Caller::Staff(user_id),
            CallerRole::Admin => Caller::Admin(user_id),
            CallerRole::Customer => Caller::Customer(user_id),
        }
    }

    pub fn user_id(&self) -> Uuid {
        match *self {
            | Caller::Vendor(id)
            | Caller::Doctor(id)
            | Caller::Staff(id)
            | Caller::Admin(id)
            | Caller::Customer(id) => id,
        }
    }

    pub fn role(&self) -> CallerRole {
        match self {
            Caller::Vendor(_) => CallerRole::Vendor,
            Caller::Doctor(_) => CallerRole::Doctor,
            Caller::Staff(_) => CallerRole::Staff,
            Caller::Admin(_) => CallerRole::Admin,
            Caller::Customer(_) => CallerRole::Customer,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let user_id = header(headers, USER_ID_HEADER)?
            .parse::<Uuid>()
            .map_err(|_| AppError::Unauthorized("Invalid session".to_string()))?;
        let role = header(headers, USER_ROLE_HEADER)?.parse::<CallerRole>()?;

        Ok(Self::new(user_id, role))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Please log in to continue".to_string()))
}

impl<S> FromRequestParts<S> for Caller where S: Send + Sync {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Caller::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(id: &str, role: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(USER_ID_HEADER, HeaderValue::from_str(id).unwrap());
        map.insert(USER_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        map
    }

    #[test]
    fn test_resolves_role_variant() {
        let id = Uuid::new_v4();
        let caller = Caller::from_headers(&headers(&id.to_string(), "Staff")).unwrap();

        assert_eq!(caller, Caller::Staff(id));
        assert_eq!(caller.user_id(), id);
        assert_eq!(caller.role(), CallerRole::Staff);
    }

    #[test]
    fn test_missing_or_bad_headers_are_unauthorized() {
        assert!(matches!(Caller::from_headers(&HeaderMap::new()), Err(AppError::Unauthorized(_))));
        assert!(
            matches!(
                Caller::from_headers(&headers("not-a-uuid", "vendor")),
                Err(AppError::Unauthorized(_))
            )
        );
        assert!(
            matches!(
                Caller::from_headers(&headers(&Uuid::new_v4().to_string(), "root")),
                Err(AppError::Unauthorized(_))
            )
        );
    }
}
