use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target size of one HLS rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Every video is transcoded to these sizes, in this order.
pub const RENDITIONS: [Resolution; 4] = [
    Resolution::new(480, 270),
    Resolution::new(640, 360),
    Resolution::new(1280, 720),
    Resolution::new(1920, 1080),
];

/// Rendition used for playback links when none is requested.
pub const DEFAULT_PLAYBACK: Resolution = Resolution::new(1280, 720);

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// File name of the HLS manifest for this rendition, e.g. `quality_640x360.m3u8`.
    pub fn manifest_name(&self) -> String {
        format!("quality_{}.m3u8", self)
    }

    /// Video filter argument handed to the transcoder.
    pub fn scale_filter(&self) -> String {
        format!("scale={}", self)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resolution `{0}`, expected WIDTHxHEIGHT")]
pub struct ParseResolutionError(String);

impl FromStr for Resolution {
    type Err = ParseResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseResolutionError(s.to_string());
        let (width, height) = s.split_once('x').ok_or_else(invalid)?;
        let width: u32 = width.parse().map_err(|_| invalid())?;
        let height: u32 = height.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self::new(width, height))
    }
}
