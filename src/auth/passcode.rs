use crate::error::{AppError, AppResult};

pub const INCORRECT_PASSCODE: &str = "Helytelen jelkód";

/// Outcome of a passcode attempt that reached a configured secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Accepted,
    Rejected { error: String },
}

/// Compares submitted passcodes with the server-held secret.
#[derive(Debug, Clone)]
pub struct PasscodeVerifier {
    secret: Option<String>,
}

impl PasscodeVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// Exact, case-sensitive comparison; no trimming, no lockout.
    pub fn verify(&self, submitted: &str) -> AppResult<Verification> {
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| AppError::Configuration("AUTH_PASSCODE is not set".into()))?;

        if submitted == secret {
            Ok(Verification::Accepted)
        } else {
            Ok(Verification::Rejected {
                error: INCORRECT_PASSCODE.to_string(),
            })
        }
    }
}
