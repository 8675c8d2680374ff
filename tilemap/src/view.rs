use serde::{Deserialize, Serialize};
use tilemap_types::{GeoBoundingBox, Size};

use crate::style::StyleId;
use crate::tile_schema::TileSchema;

/// Geographic extent, style and pixel size of the map, and the zoom level derived from them.
///
/// The zoom is recalculated on every change, so it always corresponds to the current extent,
/// viewport size and base zoom offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    bbox: GeoBoundingBox,
    style: StyleId,
    size: Size<u32>,
    base_zoom_offset: i32,
    zoom: u32,
}

impl ViewportState {
    /// Creates a new state, selecting the zoom level with the given schema.
    pub fn new(
        bbox: GeoBoundingBox,
        style: StyleId,
        size: Size<u32>,
        base_zoom_offset: i32,
        schema: &TileSchema,
    ) -> Self {
        let zoom = schema.select_zoom(&bbox, size, base_zoom_offset);
        Self {
            bbox,
            style,
            size,
            base_zoom_offset,
            zoom,
        }
    }

    /// Displayed geographic extent.
    pub fn bbox(&self) -> GeoBoundingBox {
        self.bbox
    }

    /// Style of the displayed tiles.
    pub fn style(&self) -> StyleId {
        self.style
    }

    /// Size of the viewport in pixels.
    pub fn size(&self) -> Size<u32> {
        self.size
    }

    /// Bias added to the automatically selected zoom level.
    pub fn base_zoom_offset(&self) -> i32 {
        self.base_zoom_offset
    }

    /// Zoom level of the displayed tiles.
    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    pub(crate) fn set_bbox(&mut self, bbox: GeoBoundingBox, schema: &TileSchema) {
        self.bbox = bbox;
        self.update_zoom(schema);
    }

    pub(crate) fn set_style(&mut self, style: StyleId) {
        self.style = style;
    }

    pub(crate) fn set_size(&mut self, size: Size<u32>, schema: &TileSchema) {
        self.size = size;
        self.update_zoom(schema);
    }

    pub(crate) fn set_base_zoom_offset(&mut self, offset: i32, schema: &TileSchema) {
        self.base_zoom_offset = offset;
        self.update_zoom(schema);
    }

    fn update_zoom(&mut self, schema: &TileSchema) {
        self.zoom = schema.select_zoom(&self.bbox, self.size, self.base_zoom_offset);
    }
}
