use axum::http::{header, HeaderMap};

use crate::config::Config;

/// The cookie only asserts "passcode verified"; its value carries no identity.
pub const COOKIE_VALUE: &str = "true";

/// Attributes of the passcode session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub max_age_secs: u64,
    pub secure: bool,
}

impl SessionCookie {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.auth.cookie_name.clone(),
            max_age_secs: config.cookie_max_age_secs(),
            secure: config.server.production,
        }
    }

    /// `Set-Cookie` value asserting a verified passcode.
    pub fn issue(&self) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, COOKIE_VALUE, self.max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that deletes the cookie.
    pub fn clear(&self) -> String {
        let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.name);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Presence is proof of authentication; the value is not re-checked.
    pub fn is_present(&self, headers: &HeaderMap) -> bool {
        get_cookie_value(headers, &self.name).is_some()
    }
}

pub fn get_cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}
