// Maps serenity errors onto the core's platform error kinds.

use crate::core::moderation::PlatformError;
use poise::serenity_prelude as serenity;

pub fn platform_error(err: serenity::Error) -> PlatformError {
    if let serenity::Error::Http(http_err) = &err {
        match http_err.status_code().map(|status| status.as_u16()) {
            Some(404) => return PlatformError::NotFound,
            Some(403) => return PlatformError::Forbidden,
            _ => {}
        }
    }
    PlatformError::Other(err.to_string())
}
