//! Geocoders turn place names into the geographic extent to show on the map.
//!
//! The map itself never calls a geocoder. A host application resolves the name the user typed and
//! passes the result to [`TileMap::set_bounding_box`](crate::TileMap::set_bounding_box).

use async_trait::async_trait;
use maybe_sync::{MaybeSend, MaybeSync};
use reqwest::Url;
use serde::Deserialize;
use tilemap_types::GeoBoundingBox;

use crate::error::TileMapError;
use crate::platform::{PlatformService, PlatformServiceImpl};

/// Resolves place names into bounding boxes.
#[async_trait]
pub trait Geocoder: MaybeSend + MaybeSync {
    /// Returns the extent of the place, or [`TileMapError::PlaceNotFound`].
    async fn resolve_place(&self, name: &str) -> Result<GeoBoundingBox, TileMapError>;
}

const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Geocoder using the OpenStreetMap Nominatim search API.
pub struct NominatimGeocoder {
    search_url: String,
    platform_service: PlatformServiceImpl,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    /// `[south, north, west, east]` as decimal strings.
    boundingbox: [String; 4],
}

impl NominatimGeocoder {
    /// Creates a geocoder using the public Nominatim instance.
    ///
    /// Nominatim usage policy requires an identifying user agent.
    pub fn new(user_agent: &str) -> Result<Self, TileMapError> {
        Self::with_search_url(NOMINATIM_SEARCH_URL, user_agent)
    }

    /// Creates a geocoder using a custom Nominatim-compatible search endpoint.
    pub fn with_search_url(search_url: &str, user_agent: &str) -> Result<Self, TileMapError> {
        Ok(Self {
            search_url: search_url.to_string(),
            platform_service: PlatformServiceImpl::new(user_agent)?,
        })
    }

    fn query_url(&self, name: &str) -> Result<Url, TileMapError> {
        Url::parse_with_params(
            &self.search_url,
            &[("q", name), ("format", "json"), ("limit", "1")],
        )
        .map_err(|err| TileMapError::Configuration(format!("invalid geocoder url: {err}")))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve_place(&self, name: &str) -> Result<GeoBoundingBox, TileMapError> {
        let url = self.query_url(name)?;

        log::info!("Resolving place '{name}'");
        let data = self.platform_service.load_bytes_from_url(url.as_str()).await?;
        parse_search_response(name, &data)
    }
}

fn parse_search_response(name: &str, data: &[u8]) -> Result<GeoBoundingBox, TileMapError> {
    let places: Vec<NominatimPlace> = serde_json::from_slice(data)
        .map_err(|err| TileMapError::IO(format!("invalid geocoder response: {err}")))?;

    let Some(place) = places.into_iter().next() else {
        return Err(TileMapError::PlaceNotFound(name.to_string()));
    };

    let mut values = [0.0; 4];
    for (value, raw) in values.iter_mut().zip(&place.boundingbox) {
        *value = raw
            .parse()
            .map_err(|_| TileMapError::IO(format!("invalid coordinate '{raw}' in geocoder response")))?;
    }

    let [south, north, west, east] = values;
    Ok(GeoBoundingBox::from_corners((west, south), (east, north))?)
}
