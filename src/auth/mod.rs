pub mod cookie;
pub mod handlers;
pub mod passcode;

pub use cookie::SessionCookie;
pub use passcode::{PasscodeVerifier, Verification};
