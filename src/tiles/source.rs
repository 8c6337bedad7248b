use crate::core::geo::TileCoord;
use serde::{Deserialize, Serialize};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// Built-in raster tile providers. The URL templates are
/// compatibility-relevant and must not be altered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileProvider {
    #[default]
    Osm,
    Light,
    Dark,
}

impl TileProvider {
    /// Parses the host-facing provider name. Unknown names get the default.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::Light,
            "dark" => Self::Dark,
            _ => Self::Osm,
        }
    }

    pub fn url_for(&self, z: u8, x: u32, y: u32) -> String {
        match self {
            Self::Osm => format!("https://tile.openstreetmap.org/{}/{}/{}.png", z, x, y),
            Self::Light => format!(
                "https://basemaps.cartocdn.com/light_all/{}/{}/{}.png",
                z, x, y
            ),
            Self::Dark => format!(
                "https://basemaps.cartocdn.com/dark_all/{}/{}/{}.png",
                z, x, y
            ),
        }
    }
}

impl TileSource for TileProvider {
    fn url(&self, coord: TileCoord) -> String {
        self.url_for(coord.z, coord.x, coord.y)
    }
}
