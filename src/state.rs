use std::sync::Arc;

use crate::auth::cookie::SessionCookie;
use crate::auth::passcode::PasscodeVerifier;
use crate::config::Config;
use crate::gate::Upstream;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub cookie: SessionCookie,
    pub verifier: PasscodeVerifier,
    pub upstream: Arc<dyn Upstream>,
}

impl AppState {
    pub fn new(config: Config, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            cookie: SessionCookie::from_config(&config),
            verifier: PasscodeVerifier::new(config.auth.passcode.clone()),
            config,
            upstream,
        }
    }
}
