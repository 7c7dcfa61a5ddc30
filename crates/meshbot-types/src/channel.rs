use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Number of channel slots a mesh node exposes.
pub const MAX_CHANNELS: u32 = 8;

/// Name given to slot 0 when the node does not report one.
pub const PRIMARY_CHANNEL_NAME: &str = "primary";

/// Index of a channel on the node (slot number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u32);

impl ChannelId {
    /// The node's primary channel.
    pub const PRIMARY: ChannelId = ChannelId(0);
}

impl Default for ChannelId {
    fn default() -> Self {
        ChannelId::PRIMARY
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChannelId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<u32> for ChannelId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A named channel on the node. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub name: String,
}

impl ChannelRef {
    pub fn new(id: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The primary channel (slot 0).
    pub fn primary() -> Self {
        Self::new(ChannelId::PRIMARY, PRIMARY_CHANNEL_NAME)
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Request body for creating (or looking up) a channel by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
}
