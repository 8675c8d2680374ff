use std::sync::Arc;

use tilemap_types::{GeoBoundingBox, Size};
use tokio::sync::{mpsc, watch};

use crate::cache::TileCache;
use crate::error::TileMapError;
use crate::style::StyleId;
use crate::tile_schema::TileSchema;
use crate::view::ViewportState;

mod builder;
mod draw_order;
mod scheduler;

pub use builder::TileMapBuilder;
pub use scheduler::{PassReport, PassStatus, SchedulerState};

use scheduler::RedrawRequest;

/// Slippy map showing raster tiles of a geographic extent.
///
/// The map owns the viewport state. Every change of the viewport is sent to a background redraw
/// scheduler, which waits for the changes to settle, then loads the needed tiles and paints them on
/// the surface given to the [`TileMapBuilder`]. Changing methods never block: they return a
/// [`RedrawHandle`] that can be awaited to learn the outcome of the redraw, or simply dropped.
///
/// The scheduler stops when the map is dropped.
#[derive(Debug)]
pub struct TileMap {
    view: ViewportState,
    schema: TileSchema,
    cache: Arc<TileCache>,
    generation: u64,
    requests: mpsc::UnboundedSender<RedrawRequest>,
    state: watch::Receiver<SchedulerState>,
    reports: watch::Receiver<Option<PassReport>>,
}

impl TileMap {
    /// Current viewport of the map.
    pub fn view(&self) -> &ViewportState {
        &self.view
    }

    /// Tile schema used to select tiles.
    pub fn tile_schema(&self) -> &TileSchema {
        &self.schema
    }

    /// Cache of loaded tiles.
    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    /// Shows the given extent.
    pub fn set_bounding_box(&mut self, bbox: GeoBoundingBox) -> RedrawHandle {
        self.view.set_bbox(bbox, &self.schema);
        self.request_redraw()
    }

    /// Changes the style of the map by its name, e.g. `"ocm"`.
    ///
    /// Fails with [`TileMapError::InvalidStyle`] if the name is not a known style. In that case the
    /// map state is not changed and no redraw is requested.
    pub fn set_style(&mut self, style: &str) -> Result<RedrawHandle, TileMapError> {
        let style: StyleId = style.parse()?;
        Ok(self.set_style_id(style))
    }

    /// Changes the style of the map.
    ///
    /// All tiles on the surface become stale, so this always starts a full redraw pass.
    pub fn set_style_id(&mut self, style: StyleId) -> RedrawHandle {
        self.view.set_style(style);
        self.request_redraw()
    }

    /// Sets the bias added to the automatically selected zoom level. Negative values load fewer
    /// coarser tiles, positive values load more detailed ones.
    pub fn set_base_zoom_offset(&mut self, offset: i32) -> RedrawHandle {
        self.view.set_base_zoom_offset(offset, &self.schema);
        self.request_redraw()
    }

    /// Must be called when the pixel size of the surface changes.
    pub fn set_viewport_size(&mut self, size: Size<u32>) -> RedrawHandle {
        self.view.set_size(size, &self.schema);
        self.request_redraw()
    }

    /// Requests a redraw of the unchanged viewport. Tiles that failed to load before are requested
    /// again.
    pub fn redraw(&mut self) -> RedrawHandle {
        self.request_redraw()
    }

    /// Current state of the redraw scheduler.
    pub fn scheduler_state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Report of the latest finished redraw pass.
    pub fn last_report(&self) -> Option<PassReport> {
        self.reports.borrow().clone()
    }

    fn request_redraw(&mut self) -> RedrawHandle {
        self.generation += 1;
        let request = RedrawRequest {
            generation: self.generation,
            view: self.view.clone(),
        };

        if self.requests.send(request).is_err() {
            log::warn!("Redraw requested after the redraw scheduler stopped");
        }

        RedrawHandle {
            generation: self.generation,
            reports: self.reports.clone(),
        }
    }
}

/// Handle of a requested redraw.
///
/// Redraw requests made in a quick succession are merged into one pass, so several handles can
/// resolve with the same report.
#[derive(Debug, Clone)]
pub struct RedrawHandle {
    generation: u64,
    reports: watch::Receiver<Option<PassReport>>,
}

impl RedrawHandle {
    /// Sequential number of the viewport change this handle was created for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits until a redraw pass including this change is finished and returns its report.
    ///
    /// If several passes finish before this method is polled, the report of the latest one is
    /// returned. Fails with [`TileMapError::SchedulerStopped`] if the map was dropped before the
    /// pass was done.
    pub async fn wait(mut self) -> Result<PassReport, TileMapError> {
        let generation = self.generation;
        let report = self
            .reports
            .wait_for(|report| {
                report
                    .as_ref()
                    .is_some_and(|report| report.generation >= generation)
            })
            .await
            .map_err(|_| TileMapError::SchedulerStopped)?;

        report.clone().ok_or(TileMapError::SchedulerStopped)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ahash::AHashSet;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::time::Instant;

    use super::*;
    use crate::config::TileMapConfig;
    use crate::decoded_image::{DecodedImage, TileImage};
    use crate::provider::TileProvider;
    use crate::render::{MemorySurface, SurfaceItem, ZBand};
    use crate::tile_schema::{TileIndex, TileKey, TileRange};

    #[derive(Default)]
    struct TestProvider {
        calls: Arc<Mutex<Vec<TileKey>>>,
        fail_once: Mutex<AHashSet<TileKey>>,
        slow: AHashSet<TileKey>,
        delay: Duration,
    }

    #[async_trait]
    impl TileProvider for TestProvider {
        async fn load(&self, key: TileKey) -> Result<TileImage, TileMapError> {
            self.calls.lock().push(key);

            if self.slow.contains(&key) {
                tokio::time::sleep(self.delay).await;
            }

            if self.fail_once.lock().remove(&key) {
                return Err(TileMapError::TileUnavailable {
                    key,
                    reason: "test failure".into(),
                });
            }

            let image = DecodedImage::from_raw(vec![255; 4], Size::new(1, 1))?;
            Ok(TileImage::new(key, image))
        }
    }

    fn bremen() -> GeoBoundingBox {
        GeoBoundingBox::new(8.0, 8.4, 53.05, 53.25).unwrap()
    }

    fn hamburg() -> GeoBoundingBox {
        GeoBoundingBox::new(9.8, 10.2, 53.45, 53.65).unwrap()
    }

    fn bremen_visible() -> TileRange {
        TileRange {
            z: 12,
            x_min: 2139,
            x_max: 2143,
            y_min: 1329,
            y_max: 1333,
        }
    }

    fn bremen_margin() -> AHashSet<TileKey> {
        let visible = bremen_visible();
        visible
            .expand(1)
            .iter()
            .filter(|index| !visible.contains(*index))
            .map(|index| TileKey::new(index, StyleId::Osm))
            .collect()
    }

    fn osm_key(x: i32, y: i32) -> TileKey {
        TileKey::new(TileIndex::new(x, y, 12), StyleId::Osm)
    }

    fn build(provider: TestProvider, surface: &MemorySurface) -> TileMap {
        let _ = env_logger::builder().is_test(true).try_init();
        TileMapBuilder::new(TileMapConfig::default())
            .with_bounding_box(bremen())
            .with_provider(provider)
            .build(surface.clone())
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_changes_produce_one_pass() {
        let provider = TestProvider::default();
        let calls = provider.calls.clone();
        let surface = MemorySurface::new();
        let mut map = build(provider, &surface);

        map.set_bounding_box(GeoBoundingBox::new(-10.0, 30.0, 35.0, 60.0).unwrap());
        map.set_bounding_box(hamburg());
        map.set_base_zoom_offset(-2);
        map.set_base_zoom_offset(0);
        let handle = map.set_bounding_box(bremen());

        let report = handle.wait().await.unwrap();
        assert_eq!(report.pass, 1);
        assert_eq!(report.generation, 6);
        assert_eq!(report.visible, bremen_visible());

        let calls = calls.lock();
        assert_eq!(calls.len(), 49);
        assert!(calls
            .iter()
            .all(|key| report.range.contains(key.index) && key.style == StyleId::Osm));
    }

    #[tokio::test(start_paused = true)]
    async fn loads_viewport_with_margin_once() {
        let provider = TestProvider::default();
        let calls = provider.calls.clone();
        let surface = MemorySurface::new();
        let mut map = build(provider, &surface);

        let report = map.redraw().wait().await.unwrap();
        assert_eq!(report.zoom, 12);
        assert_eq!(report.visible, bremen_visible());
        assert_eq!(
            report.range,
            TileRange {
                z: 12,
                x_min: 2138,
                x_max: 2144,
                y_min: 1328,
                y_max: 1334,
            }
        );
        assert_eq!(report.fetched, 49);
        assert_eq!(report.status, PassStatus::Complete);
        assert!(report.failed.is_empty());

        {
            let calls = calls.lock();
            let unique: AHashSet<_> = calls.iter().collect();
            assert_eq!(calls.len(), 49);
            assert_eq!(unique.len(), 49);
        }

        assert!(map.cache().contains(&osm_key(2139, 1329)));
        assert!(map.cache().contains(&osm_key(2144, 1334)));
        assert_eq!(surface.tiles().len(), 49);
        assert!(surface.flush_count() > 0);
        assert_eq!(map.scheduler_state(), SchedulerState::Idle);

        let quad = surface.tile_quad(&osm_key(2139, 1329)).unwrap();
        assert!(quad.intersects(&bremen()));

        let report = map.redraw().wait().await.unwrap();
        assert_eq!(report.pass, 2);
        assert_eq!(report.reused, 49);
        assert_eq!(report.fetched, 0);
        assert_eq!(calls.lock().len(), 49);
    }

    #[tokio::test(start_paused = true)]
    async fn style_change_demotes_previous_tiles() {
        let provider = TestProvider::default();
        let surface = MemorySurface::new();
        surface.add_user_content("track");
        let mut map = build(provider, &surface);
        map.redraw().wait().await.unwrap();

        let report = map.set_style("ocm").unwrap().wait().await.unwrap();
        assert_eq!(report.style, StyleId::Ocm);
        assert_eq!(report.fetched, 49);

        let stack = surface.stack();
        assert_eq!(stack.len(), 99);
        assert_matches!(&stack[0], SurfaceItem::Tile(key, ZBand::Stale) if key.style == StyleId::Osm);
        assert_matches!(&stack[48], SurfaceItem::Tile(key, ZBand::Stale) if key.style == StyleId::Osm);
        assert_matches!(&stack[49], SurfaceItem::Tile(key, ZBand::Current) if key.style == StyleId::Ocm);
        assert_eq!(stack[98], SurfaceItem::UserContent("track".into()));

        assert!(map.cache().contains(&osm_key(2139, 1329)));
        assert_eq!(map.cache().len(), 98);
    }

    #[tokio::test(start_paused = true)]
    async fn returning_to_previous_zoom_reuses_placed_tiles() {
        let provider = TestProvider::default();
        let calls = provider.calls.clone();
        let surface = MemorySurface::new();
        let mut map = build(provider, &surface);
        map.redraw().wait().await.unwrap();

        let report = map.set_base_zoom_offset(-1).wait().await.unwrap();
        assert_eq!(report.zoom, 11);
        let coarse_calls = calls.lock().len();

        let report = map.set_base_zoom_offset(0).wait().await.unwrap();
        assert_eq!(report.zoom, 12);
        assert_eq!(report.reused, 49);
        assert_eq!(report.fetched, 0);
        assert_eq!(calls.lock().len(), coarse_calls);

        let tiles = surface.tiles();
        let first_current = tiles
            .iter()
            .position(|tile| tile.band == ZBand::Current)
            .unwrap();
        assert!(tiles[..first_current]
            .iter()
            .all(|tile| tile.key.zoom() == 11 && tile.band == ZBand::Stale));
        assert!(tiles[first_current..]
            .iter()
            .all(|tile| tile.key.zoom() == 12 && tile.band == ZBand::Current));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_style_is_rejected() {
        let surface = MemorySurface::new();
        let mut map = build(TestProvider::default(), &surface);
        let generation = map.redraw().generation();

        assert_matches!(
            map.set_style("satellite"),
            Err(TileMapError::InvalidStyle(name)) if name == "satellite"
        );
        assert_eq!(map.view().style(), StyleId::Osm);
        assert_eq!(map.redraw().generation(), generation + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tile_is_retried_on_next_pass() {
        let failing = osm_key(2141, 1331);
        let provider = TestProvider::default();
        provider.fail_once.lock().insert(failing);
        let calls = provider.calls.clone();
        let surface = MemorySurface::new();
        let mut map = build(provider, &surface);

        let report = map.redraw().wait().await.unwrap();
        assert_eq!(report.status, PassStatus::Complete);
        assert_eq!(report.failed, vec![failing]);
        assert_eq!(report.fetched, 48);
        assert!(!map.cache().contains(&failing));

        let report = map.redraw().wait().await.unwrap();
        assert!(report.failed.is_empty());
        assert_eq!(report.fetched, 1);
        assert_eq!(report.reused, 48);
        assert!(map.cache().contains(&failing));
        assert_eq!(calls.lock().iter().filter(|key| **key == failing).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_surface_aborts_pass() {
        let surface = MemorySurface::new();
        surface.close();
        let mut map = build(TestProvider::default(), &surface);

        let report = map.redraw().wait().await.unwrap();
        assert_matches!(report.status, PassStatus::Aborted(_));
        assert!(surface.tiles().is_empty());
        assert_eq!(map.scheduler_state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn new_request_does_not_wait_for_margin_tiles() {
        let provider = TestProvider {
            slow: bremen_margin(),
            delay: Duration::from_secs(10),
            ..Default::default()
        };
        let surface = MemorySurface::new();
        let start = Instant::now();
        let mut map = build(provider, &surface);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let report = map.set_bounding_box(hamburg()).wait().await.unwrap();

        assert_eq!(report.pass, 2);
        assert_eq!(report.status, PassStatus::Complete);
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(!map.cache().contains(&osm_key(2138, 1328)));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(map.cache().contains(&osm_key(2138, 1328)));
    }

    #[tokio::test(start_paused = true)]
    async fn margin_failures_after_hand_over_are_reported_later() {
        let margin = bremen_margin();
        assert_eq!(margin.len(), 24);
        let provider = TestProvider {
            slow: margin.clone(),
            fail_once: Mutex::new(margin.clone()),
            delay: Duration::from_secs(5),
            ..Default::default()
        };
        let surface = MemorySurface::new();
        let mut map = build(provider, &surface);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let report = map.set_bounding_box(hamburg()).wait().await.unwrap();
        assert_eq!(report.pass, 2);
        assert!(report.failed.is_empty());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(map.scheduler_state(), SchedulerState::Idle);

        let report = map.redraw().wait().await.unwrap();
        assert_eq!(report.pass, 3);
        assert_eq!(report.status, PassStatus::Complete);
        assert_eq!(report.failed.len(), 24);
        let failed: AHashSet<TileKey> = report.failed.iter().copied().collect();
        assert_eq!(failed, margin);

        let report = map.redraw().wait().await.unwrap();
        assert!(report.failed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_state_follows_the_pass() {
        let provider = TestProvider {
            slow: bremen_visible()
                .expand(1)
                .iter()
                .map(|index| TileKey::new(index, StyleId::Osm))
                .collect(),
            delay: Duration::from_secs(1),
            ..Default::default()
        };
        let surface = MemorySurface::new();
        let mut map = build(provider, &surface);
        let handle = map.redraw();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(map.scheduler_state(), SchedulerState::Pending);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(map.scheduler_state(), SchedulerState::Fetching);

        let report = handle.wait().await.unwrap();
        assert_eq!(report.pass, 1);
        assert_eq!(report.fetched, 49);
        assert_eq!(map.scheduler_state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn handle_fails_after_map_is_dropped() {
        let surface = MemorySurface::new();
        let mut map = build(TestProvider::default(), &surface);
        let handle = map.redraw();
        drop(map);

        assert_matches!(handle.wait().await, Err(TileMapError::SchedulerStopped));
    }
}
