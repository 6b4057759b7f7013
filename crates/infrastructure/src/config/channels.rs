//! Channel configuration: the `(whatsapp_session_name,
//! signal_destination_phone_number)` pairs fed to the Channel Registry.

use domain::{Channel, DomainError, SessionName};
use serde::{Deserialize, Serialize};

/// One configured channel pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub whatsapp_session_name: String,
    pub signal_destination_phone_number: String,
}

impl ChannelConfig {
    /// Convert into the domain `Channel` entity, validating both fields.
    pub fn into_channel(self) -> Result<Channel, DomainError> {
        let session = SessionName::new(self.whatsapp_session_name)?;
        Channel::new(session, self.signal_destination_phone_number)
    }
}

/// Validate and convert a configured channel list into domain entities.
///
/// A failure here is a configuration error: the caller should treat it as
/// fatal at startup (exit code 1), not a runtime panic.
pub fn load_channels(configs: Vec<ChannelConfig>) -> Result<Vec<Channel>, DomainError> {
    configs.into_iter().map(ChannelConfig::into_channel).collect()
}
