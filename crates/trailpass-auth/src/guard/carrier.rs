//! Where a session token can arrive from.

/// The raw places a request may carry a session token.
///
/// `authorization` is the full `Authorization` header value; `cookie` is the
/// value of the `jwt` cookie alone.
#[derive(Clone, Default)]
pub struct CredentialCarrier {
    pub authorization: Option<String>,
    pub cookie: Option<String>,
}

impl std::fmt::Debug for CredentialCarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCarrier")
            .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialCarrier {
    /// A carrier holding only an `Authorization: Bearer` header.
    pub fn bearer(token: &str) -> Self {
        Self {
            authorization: Some(format!("Bearer {token}")),
            cookie: None,
        }
    }

    /// A carrier holding only the session cookie.
    pub fn cookie(token: &str) -> Self {
        Self {
            authorization: None,
            cookie: Some(token.to_string()),
        }
    }

    /// The token to verify.
    ///
    /// A bearer header wins over the cookie. A header with any other scheme
    /// is ignored rather than rejected.
    pub fn token(&self) -> Option<&str> {
        self.authorization
            .as_deref()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .or_else(|| {
                self.cookie
                    .as_deref()
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_wins_over_cookie() {
        let carrier = CredentialCarrier {
            authorization: Some("Bearer from-header".to_string()),
            cookie: Some("from-cookie".to_string()),
        };
        assert_eq!(carrier.token(), Some("from-header"));
    }

    #[test]
    fn test_non_bearer_header_falls_back_to_cookie() {
        let carrier = CredentialCarrier {
            authorization: Some("Basic dXNlcjpwYXNz".to_string()),
            cookie: Some("from-cookie".to_string()),
        };
        assert_eq!(carrier.token(), Some("from-cookie"));

        let carrier = CredentialCarrier {
            authorization: Some("Bearer ".to_string()),
            cookie: None,
        };
        assert_eq!(carrier.token(), None);
    }

    #[test]
    fn test_empty_carrier() {
        assert_eq!(CredentialCarrier::default().token(), None);
    }
}
