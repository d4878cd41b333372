//! Pan/zoom camera over a world-space plane.
//!
//! World space is the board's pixel space at zoom 1.0: cell `(x, y)` has its top-left corner at
//! `(x * pitch, y * pitch)`. Screen space is viewport pixels with the origin at the top-left corner. The camera
//! position is the world point shown at the viewport centre:
//!
//! ```text
//! world  = camera + (screen - viewport_center) / zoom
//! screen = (world - camera) * zoom + viewport_center
//! ```
//!
//! A disabled camera is the identity transform and ignores pan/zoom requests, so the same call sites work for boards
//! small enough to need no camera at all.

use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Axis-aligned rectangle in world space.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// On-screen cell geometry at zoom 1.0.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellMetrics {
    pub size: f32,
    pub padding: f32,
}

impl CellMetrics {
    pub const fn new(size: f32, padding: f32) -> Self {
        Self { size, padding }
    }

    /// Distance between the origins of two adjacent cells.
    pub fn pitch(&self) -> f32 {
        self.size + self.padding
    }

    /// World-space top-left corner of a cell.
    pub fn cell_origin(&self, (x, y): Coord2) -> Point {
        let pitch = self.pitch();
        Point::new(x as f32 * pitch, y as f32 * pitch)
    }

    /// Pixel size of a `cols` x `rows` board, without trailing padding.
    pub fn grid_size(&self, cols: Coord, rows: Coord) -> Size {
        let extent = |count: Coord| (count as f32 * self.pitch() - self.padding).max(0.0);
        Size::new(extent(cols), extent(rows))
    }
}

/// Inclusive range of cell indices. Empty when a minimum exceeds its maximum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub min_col: Coord,
    pub max_col: Coord,
    pub min_row: Coord,
    pub max_row: Coord,
}

impl CellRange {
    /// Every cell of a `cols` x `rows` board.
    pub const fn full(cols: Coord, rows: Coord) -> Self {
        Self {
            min_col: 0,
            max_col: cols - 1,
            min_row: 0,
            max_row: rows - 1,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.min_col > self.max_col || self.min_row > self.max_row
    }

    pub const fn cols(&self) -> Coord {
        if self.is_empty() {
            0
        } else {
            self.max_col - self.min_col + 1
        }
    }

    pub const fn rows(&self) -> Coord {
        if self.is_empty() {
            0
        } else {
            self.max_row - self.min_row + 1
        }
    }

    pub const fn contains(&self, (x, y): Coord2) -> bool {
        x >= self.min_col && x <= self.max_col && y >= self.min_row && y <= self.max_row
    }

    /// Row-major walk over the range, for draw loops.
    pub fn iter(&self) -> impl Iterator<Item = Coord2> + use<> {
        let Self {
            min_col,
            max_col,
            min_row,
            max_row,
        } = *self;
        (min_row..=max_row).flat_map(move |y| (min_col..=max_col).map(move |x| (x, y)))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Screen-space margin kept around the board by [`Camera::fit_to_grid`].
    pub fit_padding: f32,
    /// Screen-space margin [`Camera::pan_to_cell`] keeps between the cursor cell and the viewport edge.
    pub pan_margin: f32,
}

impl CameraConfig {
    const MIN_ZOOM_FLOOR: f32 = 1.0e-3;

    /// Zoom limits ordered and strictly positive, so clamping can't panic. `min_zoom` is capped at 1.0 so a fitted
    /// board always stays within the limits.
    fn sanitized(self) -> Self {
        let min_zoom = self.min_zoom.max(Self::MIN_ZOOM_FLOOR).min(1.0);
        let max_zoom = self.max_zoom.max(min_zoom);
        if min_zoom != self.min_zoom || max_zoom != self.max_zoom {
            log::warn!(
                "Camera zoom limits [{}, {}] adjusted to [{}, {}]",
                self.min_zoom,
                self.max_zoom,
                min_zoom,
                max_zoom
            );
        }
        Self {
            min_zoom,
            max_zoom,
            ..self
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 3.0,
            fit_padding: 20.0,
            pan_margin: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    position: Point,
    zoom: f32,
    config: CameraConfig,
    world_bounds: Option<Size>,
    enabled: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::with_config(CameraConfig::default())
    }

    pub fn with_config(config: CameraConfig) -> Self {
        let config = config.sanitized();
        Self {
            position: Point::default(),
            zoom: 1.0_f32.clamp(config.min_zoom, config.max_zoom),
            config,
            world_bounds: None,
            enabled: true,
        }
    }

    pub fn config(&self) -> CameraConfig {
        self.config
    }

    /// World point at the viewport centre.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn min_zoom(&self) -> f32 {
        self.config.min_zoom
    }

    pub fn max_zoom(&self) -> f32 {
        self.config.max_zoom
    }

    pub fn world_bounds(&self) -> Option<Size> {
        self.world_bounds
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_world_bounds(&mut self, width: f32, height: f32) {
        log::debug!("Camera world bounds set to {width}x{height}");
        self.world_bounds = Some(Size::new(width, height));
    }

    pub fn clear_world_bounds(&mut self) {
        self.world_bounds = None;
    }

    /// Back to zoom 1.0, centred on the world bounds, or on the origin without them.
    pub fn reset(&mut self) {
        self.zoom = self.clamp_zoom(1.0);
        self.position = self
            .world_bounds
            .map(Size::center)
            .unwrap_or_default();
        log::debug!("Camera reset to {:?}", self.position);
    }

    /// For display only.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    pub fn screen_to_world(&self, screen: Point, viewport: Size) -> Point {
        if !self.enabled {
            return screen;
        }
        let center = viewport.center();
        Point::new(
            self.position.x + (screen.x - center.x) / self.zoom,
            self.position.y + (screen.y - center.y) / self.zoom,
        )
    }

    pub fn world_to_screen(&self, world: Point, viewport: Size) -> Point {
        if !self.enabled {
            return world;
        }
        let center = viewport.center();
        Point::new(
            (world.x - self.position.x) * self.zoom + center.x,
            (world.y - self.position.y) * self.zoom + center.y,
        )
    }

    /// Moves the camera by a screen-space delta.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !self.enabled {
            return;
        }
        self.position.x += dx / self.zoom;
        self.position.y += dy / self.zoom;
    }

    /// Sets the zoom, keeping the world point under `focal` fixed on screen.
    pub fn zoom_to(&mut self, new_zoom: f32, focal: Point, viewport: Size) {
        if !self.enabled || new_zoom.is_nan() {
            return;
        }

        let anchor = self.screen_to_world(focal, viewport);
        self.zoom = self.clamp_zoom(new_zoom);

        // invert world_to_screen for the camera position with anchor pinned at focal
        let center = viewport.center();
        self.position = Point::new(
            anchor.x - (focal.x - center.x) / self.zoom,
            anchor.y - (focal.y - center.y) / self.zoom,
        );
    }

    /// Multiplicative zoom, `delta = 0.1` zooms in by 10%.
    pub fn zoom_by(&mut self, delta: f32, focal: Point, viewport: Size) {
        self.zoom_to(self.zoom * (1.0 + delta), focal, viewport);
    }

    /// Keeps the visible window inside the world bounds, or centres an axis on which the whole world fits.
    pub fn clamp_to_bounds(&mut self, viewport: Size) {
        if !self.enabled {
            return;
        }
        let Some(world) = self.world_bounds else {
            return;
        };

        self.position.x = clamp_axis(self.position.x, viewport.width / self.zoom, world.width);
        self.position.y = clamp_axis(self.position.y, viewport.height / self.zoom, world.height);
    }

    /// Frames a board of `grid` pixels inside the viewport with the configured padding.
    pub fn fit_to_grid(&mut self, grid: Size, viewport: Size) {
        self.fit_to_grid_with_padding(grid, viewport, self.config.fit_padding);
    }

    /// Sets the world bounds to the board, centres on it, and shrinks to fit. Never zooms past 1.0.
    pub fn fit_to_grid_with_padding(&mut self, grid: Size, viewport: Size, padding: f32) {
        self.world_bounds = Some(grid);
        self.position = grid.center();

        let available = Size::new(viewport.width - padding * 2.0, viewport.height - padding * 2.0);
        let fit = (available.width / grid.width.max(f32::EPSILON))
            .min(available.height / grid.height.max(f32::EPSILON));
        self.zoom = fit.max(self.config.min_zoom).min(1.0);

        log::debug!(
            "Camera fit {}x{} board into {}x{} viewport at zoom {}",
            grid.width,
            grid.height,
            viewport.width,
            viewport.height,
            self.zoom
        );
    }

    /// World-space rectangle covered by the viewport.
    pub fn visible_world_rect(&self, viewport: Size) -> Rect {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(viewport.width, 0.0),
            Point::new(0.0, viewport.height),
            Point::new(viewport.width, viewport.height),
        ]
        .map(|corner| self.screen_to_world(corner, viewport));

        corners.iter().fold(
            Rect {
                min: corners[0],
                max: corners[0],
            },
            |rect, corner| Rect {
                min: Point::new(rect.min.x.min(corner.x), rect.min.y.min(corner.y)),
                max: Point::new(rect.max.x.max(corner.x), rect.max.y.max(corner.y)),
            },
        )
    }

    /// Cell indices a renderer has to draw, padded by one cell on each side for partially visible edges.
    pub fn visible_cells(
        &self,
        cols: Coord,
        rows: Coord,
        metrics: CellMetrics,
        viewport: Size,
    ) -> CellRange {
        if !self.enabled || cols <= 0 || rows <= 0 {
            return CellRange::full(cols, rows);
        }

        let rect = self.visible_world_rect(viewport);
        let pitch = metrics.pitch().max(f32::EPSILON);
        let to_index = |world: f32| (world / pitch).floor() as Coord;

        CellRange {
            min_col: to_index(rect.min.x).saturating_sub(1).clamp(0, cols - 1),
            max_col: to_index(rect.max.x).saturating_add(1).clamp(0, cols - 1),
            min_row: to_index(rect.min.y).saturating_sub(1).clamp(0, rows - 1),
            max_row: to_index(rect.max.y).saturating_add(1).clamp(0, rows - 1),
        }
    }

    /// Scrolls just enough to keep `cell` at least the configured margin away from every viewport edge.
    pub fn pan_to_cell(&mut self, cell: Coord2, metrics: CellMetrics, viewport: Size) {
        self.pan_to_cell_with_margin(cell, metrics, viewport, self.config.pan_margin);
    }

    pub fn pan_to_cell_with_margin(
        &mut self,
        cell: Coord2,
        metrics: CellMetrics,
        viewport: Size,
        margin: f32,
    ) {
        if !self.enabled {
            return;
        }

        let origin = metrics.cell_origin(cell);
        let screen = self.world_to_screen(origin, viewport);
        let extent = metrics.size * self.zoom;
        let center = viewport.center();

        let target_x = edge_target(screen.x, extent, viewport.width, margin);
        let target_y = edge_target(screen.y, extent, viewport.height, margin);
        if target_x.is_none() && target_y.is_none() {
            return;
        }

        if let Some(target) = target_x {
            self.position.x = origin.x - (target - center.x) / self.zoom;
        }
        if let Some(target) = target_y {
            self.position.y = origin.y - (target - center.y) / self.zoom;
        }
        self.clamp_to_bounds(viewport);
    }

    /// Deserialized cameras skip `sanitized`, so this must not assume ordered limits.
    fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.min(self.config.max_zoom).max(self.config.min_zoom)
    }
}

fn clamp_axis(position: f32, visible: f32, extent: f32) -> f32 {
    if !visible.is_finite() || !extent.is_finite() {
        position
    } else if visible >= extent {
        extent * 0.5
    } else {
        position.clamp(visible * 0.5, extent - visible * 0.5)
    }
}

/// Screen coordinate a cell edge should move to, if it sits inside the margin on either side of an axis.
fn edge_target(start: f32, extent: f32, viewport: f32, margin: f32) -> Option<f32> {
    if start < margin {
        Some(margin)
    } else if start + extent > viewport - margin {
        Some(viewport - margin - extent)
    } else {
        None
    }
}
