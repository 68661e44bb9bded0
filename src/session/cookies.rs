use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::{
    token::TokenConfig,
    types::{TokenKind, TokenPair},
};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Base cookie shared by set and clear: HttpOnly, Secure, SameSite=None, Path=/
fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .build()
}

pub fn set_token_cookie(
    jar: CookieJar,
    name: &'static str,
    token: String,
    max_age: chrono::Duration,
) -> CookieJar {
    let mut cookie = token_cookie(name, token);
    cookie.set_max_age(time::Duration::seconds(max_age.num_seconds()));
    jar.add(cookie)
}

/// Emits an expired cookie even when the request carried none,
/// so a logout always reaches the browser
pub fn clear_token_cookie(jar: CookieJar, name: &'static str) -> CookieJar {
    let mut cookie = token_cookie(name, String::new());
    cookie.make_removal();
    jar.add(cookie)
}

/// Puts both tokens of a freshly issued pair into the jar
pub fn set_token_pair(jar: CookieJar, pair: TokenPair, config: &TokenConfig) -> CookieJar {
    let jar = set_token_cookie(
        jar,
        ACCESS_TOKEN_COOKIE,
        pair.access_token,
        config.ttl(TokenKind::Access),
    );
    set_token_cookie(
        jar,
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token,
        config.ttl(TokenKind::Refresh),
    )
}

pub fn clear_token_pair(jar: CookieJar) -> CookieJar {
    let jar = clear_token_cookie(jar, ACCESS_TOKEN_COOKIE);
    clear_token_cookie(jar, REFRESH_TOKEN_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use axum::http::header::SET_COOKIE;

    fn set_cookie_headers(jar: CookieJar) -> Vec<String> {
        let response = jar.into_response();
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_set_token_cookie_attributes() {
        let jar = set_token_cookie(
            CookieJar::new(),
            ACCESS_TOKEN_COOKIE,
            "abc".to_string(),
            chrono::Duration::minutes(15),
        );

        let headers = set_cookie_headers(jar);
        assert_eq!(headers.len(), 1);
        let header = &headers[0];
        assert!(header.starts_with("accessToken=abc"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=None"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=900"));
    }

    #[test]
    fn test_clear_token_pair_keeps_attributes() {
        let headers = set_cookie_headers(clear_token_pair(CookieJar::new()));

        assert_eq!(headers.len(), 2);
        for header in headers {
            assert!(
                header.starts_with("accessToken=;") || header.starts_with("refreshToken=;"),
                "unexpected header {header}"
            );
            assert!(header.contains("HttpOnly"));
            assert!(header.contains("Secure"));
            assert!(header.contains("SameSite=None"));
            assert!(header.contains("Path=/"));
        }
    }

    #[test]
    fn test_set_token_pair_uses_configured_lifetimes() {
        let config = TokenConfig::new("a".to_string(), "r".to_string());
        let pair = TokenPair {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
        };
        let headers = set_cookie_headers(set_token_pair(CookieJar::new(), pair, &config));

        let refresh = headers
            .iter()
            .find(|h| h.starts_with("refreshToken="))
            .unwrap();
        assert!(refresh.contains("Max-Age=604800"));
        let access = headers
            .iter()
            .find(|h| h.starts_with("accessToken="))
            .unwrap();
        assert!(access.contains("Max-Age=900"));
    }
}
