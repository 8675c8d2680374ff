//! Configuration of a [`TileMap`](crate::TileMap).

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tilemap_types::Size;

use crate::error::TileMapError;
use crate::platform::DEFAULT_USER_AGENT;
use crate::style::StyleId;

/// Largest accepted [`TileMapConfig::tile_margin`].
pub const MAX_TILE_MARGIN: u32 = 8;

/// Engine settings. Every field has a default, so a configuration document only needs to contain
/// the values it changes.
///
/// ```
/// use tilemap::{StyleId, TileMapConfig};
///
/// let config = TileMapConfig::from_json(r#"{ "style": "ocm", "debounce_ms": 50 }"#).unwrap();
/// assert_eq!(config.style, StyleId::Ocm);
/// assert_eq!(config.tile_margin, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileMapConfig {
    /// Initial style of the map.
    pub style: StyleId,
    /// Initial size of the viewport in pixels.
    pub viewport: Size<u32>,
    /// Bias added to the automatically selected zoom level.
    pub base_zoom_offset: i32,
    /// Time in milliseconds the viewport must stay unchanged before a redraw pass starts.
    pub debounce_ms: u64,
    /// Number of tiles loaded around the visible range on every side. At most
    /// [`MAX_TILE_MARGIN`].
    pub tile_margin: u32,
    /// Maximum number of tiles in the cache. `None` means the cache is never evicted.
    pub cache_capacity: Option<usize>,
    /// User agent of the tile requests.
    pub user_agent: String,
    /// Base URLs replacing the default ones of the given styles.
    pub styles: BTreeMap<StyleId, String>,
}

impl Default for TileMapConfig {
    fn default() -> Self {
        Self {
            style: StyleId::default(),
            viewport: Size::new(800, 600),
            base_zoom_offset: 0,
            debounce_ms: 100,
            tile_margin: 1,
            cache_capacity: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            styles: BTreeMap::new(),
        }
    }
}

impl TileMapConfig {
    /// Parses the configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, TileMapError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Debounce window of the redraw scheduler.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), TileMapError> {
        if self.viewport.is_zero() {
            return Err(TileMapError::Configuration(
                "viewport must not be empty".into(),
            ));
        }

        if self.tile_margin > MAX_TILE_MARGIN {
            return Err(TileMapError::Configuration(format!(
                "tile margin {} is larger than {MAX_TILE_MARGIN}",
                self.tile_margin
            )));
        }

        if self.cache_capacity == Some(0) {
            return Err(TileMapError::Configuration(
                "cache capacity must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(
            TileMapConfig::from_json("{}").unwrap(),
            TileMapConfig::default()
        );
    }

    #[test]
    fn parse_full_document() {
        let config = TileMapConfig::from_json(
            r#"{
                "style": "hot",
                "viewport": { "width": 1024, "height": 768 },
                "base_zoom_offset": -1,
                "debounce_ms": 250,
                "tile_margin": 2,
                "cache_capacity": 500,
                "user_agent": "test-agent",
                "styles": { "osm": "http://localhost:8080/osm" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.style, StyleId::Hot);
        assert_eq!(config.viewport, Size::new(1024, 768));
        assert_eq!(config.base_zoom_offset, -1);
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.tile_margin, 2);
        assert_eq!(config.cache_capacity, Some(500));
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(
            config.styles.get(&StyleId::Osm).map(String::as_str),
            Some("http://localhost:8080/osm")
        );
    }

    #[test]
    fn invalid_documents() {
        assert_matches!(
            TileMapConfig::from_json(r#"{ "style": "satellite" }"#),
            Err(TileMapError::Configuration(_))
        );
        assert_matches!(
            TileMapConfig::from_json(r#"{ "viewport": { "width": 0, "height": 10 } }"#),
            Err(TileMapError::Configuration(_))
        );
        assert_matches!(
            TileMapConfig::from_json(r#"{ "cache_capacity": 0 }"#),
            Err(TileMapError::Configuration(_))
        );
        assert_matches!(
            TileMapConfig::from_json(r#"{ "tile_margin": 4294967295 }"#),
            Err(TileMapError::Configuration(_))
        );
    }

    #[test]
    fn tile_margin_bound() {
        let config = TileMapConfig {
            tile_margin: MAX_TILE_MARGIN,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = TileMapConfig {
            tile_margin: MAX_TILE_MARGIN + 1,
            ..Default::default()
        };
        assert_matches!(config.validate(), Err(TileMapError::Configuration(_)));
    }
}
