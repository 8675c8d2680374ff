use std::sync::Arc;
use std::time::Duration;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use web_time::Instant;

use crate::async_runtime;
use crate::cache::TileCache;
use crate::decoded_image::TileImage;
use crate::error::TileMapError;
use crate::map::draw_order::DrawOrder;
use crate::provider::TileProvider;
use crate::render::{TilePlacement, TileSurface, ZBand};
use crate::style::StyleId;
use crate::tile_schema::{TileKey, TileRange, TileSchema};
use crate::view::ViewportState;

/// Number of tiles a pass walks through before letting other tasks run.
const YIELD_EVERY: usize = 1024;

/// State of the redraw scheduler of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedulerState {
    /// Nothing to do.
    Idle,
    /// The viewport changed, waiting for it to settle.
    Pending,
    /// A redraw pass is loading and painting tiles.
    Fetching,
}

/// How a redraw pass ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassStatus {
    /// All tiles of the pass were processed. Some of them might still be unavailable, see
    /// [`PassReport::failed`].
    Complete,
    /// The pass was stopped by a surface error.
    Aborted(String),
}

/// Summary of one redraw pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    /// Sequential number of the pass, starting from 1.
    pub pass: u64,
    /// Generation of the latest viewport change included into the pass.
    pub generation: u64,
    /// Zoom level of the pass.
    pub zoom: u32,
    /// Style of the pass.
    pub style: StyleId,
    /// Tiles covering the viewport.
    pub visible: TileRange,
    /// Visible tiles together with the margin around them.
    pub range: TileRange,
    /// Number of tiles that were already on the surface.
    pub reused: usize,
    /// Number of tiles painted from the cache.
    pub from_cache: usize,
    /// Number of tiles loaded and painted by this pass.
    pub fetched: usize,
    /// Tiles that could not be loaded. Includes tiles of earlier passes that failed after those
    /// passes had already ended.
    pub failed: Vec<TileKey>,
    /// How the pass ended.
    pub status: PassStatus,
}

impl PassReport {
    fn new(
        pass: u64,
        generation: u64,
        view: &ViewportState,
        schema: &TileSchema,
        margin: u32,
    ) -> Self {
        let visible = schema.tile_range(&view.bbox(), view.zoom());
        Self {
            pass,
            generation,
            zoom: view.zoom(),
            style: view.style(),
            visible,
            range: visible.expand(margin),
            reused: 0,
            from_cache: 0,
            fetched: 0,
            failed: vec![],
            status: PassStatus::Complete,
        }
    }
}

/// Snapshot of the viewport sent by the map to its scheduler.
#[derive(Debug, Clone)]
pub(crate) struct RedrawRequest {
    pub(crate) generation: u64,
    pub(crate) view: ViewportState,
}

struct FetchOutcome {
    key: TileKey,
    result: Result<Arc<TileImage>, TileMapError>,
}

/// Channels connecting the scheduler to its map.
pub(crate) struct SchedulerChannels {
    pub(crate) requests: mpsc::UnboundedReceiver<RedrawRequest>,
    pub(crate) state: watch::Sender<SchedulerState>,
    pub(crate) reports: watch::Sender<Option<PassReport>>,
}

/// Background task that turns viewport changes into drawn tiles.
///
/// The scheduler exclusively owns the draw order and the surface, so all painting happens in one
/// place. Tile loading runs in separate tasks, which store loaded tiles in the cache and send the
/// outcome back to the scheduler.
pub(crate) struct RedrawScheduler {
    schema: TileSchema,
    provider: Arc<dyn TileProvider>,
    cache: Arc<TileCache>,
    surface: Box<dyn TileSurface>,
    draw_order: DrawOrder,
    debounce: Duration,
    margin: u32,

    requests: mpsc::UnboundedReceiver<RedrawRequest>,
    requests_closed: bool,
    pending: Option<RedrawRequest>,
    outcomes_sender: mpsc::UnboundedSender<FetchOutcome>,
    outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    in_flight: AHashSet<TileKey>,
    late_failures: Vec<TileKey>,

    state: watch::Sender<SchedulerState>,
    reports: watch::Sender<Option<PassReport>>,
    passes: u64,
    unflushed: bool,
}

impl RedrawScheduler {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        schema: TileSchema,
        provider: Arc<dyn TileProvider>,
        cache: Arc<TileCache>,
        surface: Box<dyn TileSurface>,
        debounce: Duration,
        margin: u32,
        channels: SchedulerChannels,
    ) -> Self {
        let (outcomes_sender, outcomes) = mpsc::unbounded_channel();
        Self {
            schema,
            provider,
            cache,
            surface,
            draw_order: DrawOrder::new(),
            debounce,
            margin,
            requests: channels.requests,
            requests_closed: false,
            pending: None,
            outcomes_sender,
            outcomes,
            in_flight: AHashSet::new(),
            late_failures: Vec::new(),
            state: channels.state,
            reports: channels.reports,
            passes: 0,
            unflushed: false,
        }
    }

    /// Runs until the map is dropped.
    pub(crate) async fn run(mut self) {
        loop {
            let request = match self.pending.take() {
                Some(request) => request,
                None => match self.next_request().await {
                    Some(request) => request,
                    None => break,
                },
            };

            self.set_state(SchedulerState::Pending);
            let Some(request) = self.debounce(request).await else {
                break;
            };

            self.run_pass(request).await;
        }

        log::debug!("Redraw scheduler stopped after {} passes", self.passes);
    }

    /// Waits for a viewport change while idle, settling outcomes of tiles no pass waits for.
    async fn next_request(&mut self) -> Option<RedrawRequest> {
        if self.requests_closed {
            return None;
        }

        loop {
            tokio::select! {
                request = self.requests.recv() => return request,
                Some(outcome) = self.outcomes.recv() => self.settle_late(outcome),
            }
        }
    }

    /// Loaded tiles are already in the cache, so only failures are kept until the next report.
    fn settle_late(&mut self, outcome: FetchOutcome) {
        self.in_flight.remove(&outcome.key);
        if let Err(err) = outcome.result {
            log::debug!("Tile {} is unavailable: {err}", outcome.key);
            self.late_failures.push(outcome.key);
        }
    }

    /// Restarts the timer on every new request and returns the last one once the viewport was not
    /// changed for the debounce window.
    async fn debounce(&mut self, mut request: RedrawRequest) -> Option<RedrawRequest> {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.debounce) => return Some(request),
                next = self.requests.recv(), if !self.requests_closed => match next {
                    Some(next) => request = next,
                    None => {
                        self.requests_closed = true;
                        return None;
                    }
                },
            }
        }
    }

    async fn run_pass(&mut self, request: RedrawRequest) {
        let started = Instant::now();
        self.passes += 1;
        self.set_state(SchedulerState::Fetching);

        let mut report = PassReport::new(
            self.passes,
            request.generation,
            &request.view,
            &self.schema,
            self.margin,
        );
        log::debug!(
            "Starting redraw pass {} for zoom {} style {} ({} tiles)",
            report.pass,
            report.zoom,
            report.style,
            report.range.len()
        );

        if let Err(err) = self.paint_pass(&mut report).await {
            log::error!("Redraw pass {} aborted: {err}", report.pass);
            report.status = PassStatus::Aborted(err.to_string());
        }

        for key in std::mem::take(&mut self.late_failures) {
            if !report.failed.contains(&key) {
                report.failed.push(key);
            }
        }

        if !report.failed.is_empty() {
            let keys: Vec<String> = report.failed.iter().map(ToString::to_string).collect();
            log::warn!(
                "{} tiles are unavailable in redraw pass {}: {}",
                keys.len(),
                report.pass,
                keys.join(", ")
            );
        }

        log::debug!(
            "Redraw pass {} finished in {:?}: {} reused, {} from cache, {} fetched",
            report.pass,
            started.elapsed(),
            report.reused,
            report.from_cache,
            report.fetched
        );

        if self.pending.is_none() {
            self.set_state(SchedulerState::Idle);
        }
        self.reports.send_replace(Some(report));
    }

    async fn paint_pass(&mut self, report: &mut PassReport) -> Result<(), TileMapError> {
        if self.draw_order.begin_pass(report.zoom, report.style) {
            self.surface.restack(self.draw_order.placed())?;
        }

        let visible = report.visible;
        let mut outstanding = AHashSet::new();
        for (n, index) in report.range.iter().enumerate() {
            if n % YIELD_EVERY == YIELD_EVERY - 1 {
                tokio::task::yield_now().await;
            }

            let key = TileKey::new(index, report.style);
            if self.draw_order.is_current(&key) {
                report.reused += 1;
            } else if let Some(tile) = self.cache.get(&key) {
                self.paint(tile)?;
                report.from_cache += 1;
            } else {
                outstanding.insert(key);
                if self.in_flight.insert(key) {
                    self.dispatch(key);
                }
            }
        }

        self.flush()?;

        let mut visible_outstanding = outstanding
            .iter()
            .filter(|key| visible.contains(key.index))
            .count();

        while !outstanding.is_empty() {
            if self.pending.is_some() && visible_outstanding == 0 {
                log::debug!(
                    "Redraw pass {} hands over with {} margin tiles still loading",
                    report.pass,
                    outstanding.len()
                );
                break;
            }

            tokio::select! {
                request = self.requests.recv(), if !self.requests_closed => match request {
                    Some(request) => self.pending = Some(request),
                    None => self.requests_closed = true,
                },
                Some(outcome) = self.outcomes.recv() => {
                    if !outstanding.remove(&outcome.key) {
                        self.settle_late(outcome);
                        continue;
                    }
                    self.in_flight.remove(&outcome.key);

                    let is_visible = visible.contains(outcome.key.index);
                    if is_visible {
                        visible_outstanding -= 1;
                    }

                    match outcome.result {
                        Ok(tile) => {
                            self.paint(tile)?;
                            report.fetched += 1;
                            if is_visible {
                                self.flush()?;
                            }
                        }
                        Err(err) => {
                            log::debug!("Tile {} is unavailable: {err}", outcome.key);
                            report.failed.push(outcome.key);
                        }
                    }
                }
            }
        }

        self.flush()
    }

    fn dispatch(&self, key: TileKey) {
        let provider = self.provider.clone();
        let cache = self.cache.clone();
        let outcomes = self.outcomes_sender.clone();

        async_runtime::spawn(async move {
            let result = provider.load(key).await.map(|tile| {
                let tile = Arc::new(tile);
                cache.insert(key, tile.clone());
                tile
            });

            if outcomes.send(FetchOutcome { key, result }).is_err() {
                log::debug!("Tile {key} loaded after the redraw scheduler stopped");
            }
        });
    }

    fn paint(&mut self, tile: Arc<TileImage>) -> Result<(), TileMapError> {
        let key = tile.key();
        let Some(quad) = self.schema.tile_bbox(key.index) else {
            log::warn!("Tile {key} is outside of the tile schema");
            return Ok(());
        };

        let position = self.draw_order.top_position(&key);
        self.surface.place(TilePlacement {
            tile,
            quad,
            band: ZBand::Current,
            position,
        })?;
        self.draw_order.place(key);
        self.unflushed = true;

        Ok(())
    }

    fn flush(&mut self) -> Result<(), TileMapError> {
        if self.unflushed {
            self.surface.flush()?;
            self.unflushed = false;
        }

        Ok(())
    }

    fn set_state(&self, state: SchedulerState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            log::debug!("Redraw scheduler state: {previous:?} -> {state:?}");
        }
    }
}
