//! Map styles: the enumerated set of raster tile providers and their base URLs.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TileMapError;
use crate::tile_schema::TileKey;

/// Identifier of a raster tile style (provider).
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StyleId {
    /// OpenStreetMap standard style.
    #[default]
    Osm,
    /// Humanitarian OpenStreetMap Team style.
    Hot,
    /// OpenCycleMap.
    Ocm,
    /// ÖPNVKarte public transport map.
    Opm,
    /// Thunderforest Landscape.
    Landscape,
    /// Thunderforest Outdoors.
    Outdoors,
}

impl StyleId {
    /// All known styles.
    pub const ALL: [StyleId; 6] = [
        StyleId::Osm,
        StyleId::Hot,
        StyleId::Ocm,
        StyleId::Opm,
        StyleId::Landscape,
        StyleId::Outdoors,
    ];

    /// Name of the style as used in configuration and by the host application.
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleId::Osm => "osm",
            StyleId::Hot => "hot",
            StyleId::Ocm => "ocm",
            StyleId::Opm => "opm",
            StyleId::Landscape => "landscape",
            StyleId::Outdoors => "outdoors",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            StyleId::Osm => "https://tile.openstreetmap.org",
            StyleId::Hot => "https://a.tile.openstreetmap.fr/hot",
            StyleId::Ocm => "https://tile.thunderforest.com/cycle",
            StyleId::Opm => "https://tileserver.memomaps.de/tilegen",
            StyleId::Landscape => "https://tile.thunderforest.com/landscape",
            StyleId::Outdoors => "https://tile.thunderforest.com/outdoors",
        }
    }
}

impl Display for StyleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StyleId {
    type Err = TileMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| TileMapError::InvalidStyle(s.to_string()))
    }
}

/// Table mapping every [`StyleId`] to the base URL of its tile server.
///
/// Tiles are requested as `{base}/{z}/{x}/{y}.png`. A base URL containing a `{z}` placeholder is
/// used as a template instead, with `{z}`, `{x}` and `{y}` replaced by the tile index.
///
/// The default Thunderforest servers of the `ocm`, `landscape` and `outdoors` styles answer
/// `401 Unauthorized` without an API key, so every tile of these styles fails out of the box.
/// Give them a keyed URL through [`TileMapConfig::styles`](crate::TileMapConfig::styles):
///
/// ```
/// use std::collections::BTreeMap;
///
/// use tilemap::{StyleId, StyleTable};
///
/// let overrides = BTreeMap::from([(
///     StyleId::Ocm,
///     "https://tile.thunderforest.com/cycle/{z}/{x}/{y}.png?apikey=KEY".to_string(),
/// )]);
/// let table = StyleTable::with_overrides(&overrides);
/// assert!(table.base_url(StyleId::Ocm).ends_with("?apikey=KEY"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    urls: BTreeMap<StyleId, String>,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self {
            urls: StyleId::ALL
                .into_iter()
                .map(|style| (style, style.default_base_url().to_string()))
                .collect(),
        }
    }
}

impl StyleTable {
    /// Creates the default table, replacing base URLs of the styles present in `overrides`.
    pub fn with_overrides(overrides: &BTreeMap<StyleId, String>) -> Self {
        let mut table = Self::default();
        for (style, url) in overrides {
            table
                .urls
                .insert(*style, url.trim_end_matches('/').to_string());
        }

        table
    }

    /// Base URL of the style.
    pub fn base_url(&self, style: StyleId) -> &str {
        self.urls
            .get(&style)
            .map(String::as_str)
            .unwrap_or_else(|| style.default_base_url())
    }

    /// Full URL of the tile.
    pub fn tile_url(&self, key: &TileKey) -> String {
        let base = self.base_url(key.style);
        if base.contains("{z}") {
            return base
                .replace("{z}", &key.index.z.to_string())
                .replace("{x}", &key.index.x.to_string())
                .replace("{y}", &key.index.y.to_string());
        }

        format!(
            "{}/{}/{}/{}.png",
            base, key.index.z, key.index.x, key.index.y
        )
    }
}
