//! One glass effect instance: config, position, drag session and the
//! frame-scheduled recompute that keeps the surface in sync with them.

use crate::cache::FieldCache;
use crate::config::{GlassConfig, ShapeParams};
use crate::drag::{DragBounds, DragEvent, DragMachine, InputCapture, PointerInput};
use crate::error::Result;
use crate::field::{Field, FieldKey};
use crate::filter::{compose_filter, ComposedFilter, FilterGraph};
use crate::layout::{Cursor, EffectBox, OverlayLayout, Position};
use crate::scheduler::{Debouncer, FrameSource, FrameToken, UpdateScheduler};
use crate::surface::{MeasureMode, Surface};
use instant::Instant;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Result of one successful recompute.
#[derive(Clone, Debug)]
pub struct Applied {
    pub effect_box: EffectBox,
    pub shape: ShapeParams,
    pub field: Rc<Field>,
    pub filter: ComposedFilter,
    pub layout: OverlayLayout,
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EffectStats {
    pub recomputes: u64,
    pub failures: u64,
    pub skipped: u64,
}

// What the surface currently shows, so unchanged parts are not re-sent.
#[derive(Clone, Debug, Default)]
struct SurfaceState {
    graph: Option<FilterGraph>,
    source: Option<(FieldKey, u64, u64)>,
}

pub struct GlassEffect<S: Surface, F: FrameSource> {
    id: String,
    config: GlassConfig,
    position: Position,
    // Position has been taken from a measurement.
    placed: bool,
    surface: S,
    frames: F,
    cache: Rc<RefCell<FieldCache>>,
    scheduler: UpdateScheduler,
    notifier: Debouncer<Position>,
    drag: DragMachine,
    shown: SurfaceState,
    stats: EffectStats,
}

impl<S: Surface, F: FrameSource> GlassEffect<S, F> {
    pub fn new(
        id: impl Into<String>,
        config: GlassConfig,
        surface: S,
        frames: F,
        cache: Rc<RefCell<FieldCache>>,
    ) -> Self {
        Self {
            id: id.into(),
            config: config.sanitized(),
            position: Position::ZERO,
            placed: false,
            surface,
            frames,
            cache,
            scheduler: UpdateScheduler::default(),
            notifier: Debouncer::default(),
            drag: DragMachine::new(),
            shown: SurfaceState::default(),
            stats: EffectStats::default(),
        }
    }

    /// Take the initial position from the mounted content and schedule the
    /// first recompute.
    ///
    /// A surface that is not mounted yet is placed by the first recompute
    /// that can measure it.
    pub fn mount(&mut self) {
        if !self.place() {
            log::debug!("[effect] {} mounted before its surface", self.id);
        }
        self.schedule();
    }

    fn place(&mut self) -> bool {
        let Some(bounds) = self.surface.measure(MeasureMode::Inline) else {
            return false;
        };
        self.position = bounds.center();
        self.placed = true;
        log::info!(
            "[effect] {} placed at ({:.1},{:.1})",
            self.id,
            self.position.x,
            self.position.y
        );
        true
    }

    /// Cancel pending work and end any drag session.
    pub fn unmount(&mut self, capture: &mut dyn InputCapture) {
        self.scheduler.cancel(&mut self.frames);
        self.notifier.cancel(&mut self.frames);
        self.drag.reset(capture);
        log::info!("[effect] {} unmounted", self.id);
    }

    /// Replace the config. Turning `draggable` off ends a running drag and
    /// releases its capture.
    pub fn set_config(&mut self, config: GlassConfig, capture: &mut dyn InputCapture) {
        self.config = config.sanitized();
        if !self.config.draggable && self.drag.is_dragging() {
            self.drag.reset(capture);
            log::debug!("[effect] {} drag ended by config", self.id);
        }
        self.schedule();
    }

    /// Geometry of the host changed.
    pub fn resize(&mut self) {
        self.schedule();
    }

    pub fn schedule(&mut self) -> FrameToken {
        self.scheduler.schedule(&mut self.frames)
    }

    /// Frame callback. Runs the recompute if `token` is still the pending one.
    pub fn on_frame(&mut self, token: FrameToken) -> bool {
        if !self.scheduler.fire(token) {
            return false;
        }
        match self.recompute() {
            Ok(Some(applied)) => {
                self.stats.recomputes += 1;
                log::debug!(
                    "[effect] {} recompute {}x{} in {:?}",
                    self.id,
                    applied.effect_box.raster_width,
                    applied.effect_box.raster_height,
                    applied.elapsed
                );
            }
            Ok(None) => self.stats.skipped += 1,
            Err(err) => {
                self.stats.failures += 1;
                log::error!("[effect] {} recompute failed: {}", self.id, err);
            }
        }
        true
    }

    /// Timer callback. Returns the settled position to report, if any.
    pub fn on_timer(&mut self, token: FrameToken) -> Option<Position> {
        self.notifier.fire(token)
    }

    /// Measure, look up or rasterize the field, compose and apply.
    ///
    /// `Ok(None)` when the surface is not mounted yet. Encoding happens before
    /// the surface is touched, so an encode failure leaves the old state.
    pub fn recompute(&mut self) -> Result<Option<Applied>> {
        let mode = if self.config.draggable {
            MeasureMode::Floating
        } else {
            MeasureMode::Inline
        };
        let Some(measured) = self.surface.measure(mode) else {
            log::trace!("[effect] {} not mounted; skipping", self.id);
            return Ok(None);
        };
        if !self.placed {
            self.place();
        }

        let started = Instant::now();
        let effect_box = EffectBox::resolve(&self.config, &measured);
        let shape = self.config.shape();
        let field = self.cache.borrow_mut().field(
            effect_box.raster_width as f64,
            effect_box.raster_height as f64,
            &shape,
        );
        let filter = compose_filter(&self.id, &field, &self.config.style());
        let layout = OverlayLayout::new(&self.config, &effect_box, self.position, self.cursor());

        let stamp = (
            FieldKey::new(field.width, field.height, shape),
            effect_box.width.to_bits(),
            effect_box.height.to_bits(),
        );
        let regraph = self.shown.graph.as_ref() != Some(&filter.graph);
        let data_uri = if regraph || self.shown.source != Some(stamp) {
            Some(field.to_data_uri()?)
        } else {
            None
        };

        self.surface.apply_layout(&layout)?;
        if regraph {
            self.shown = SurfaceState::default();
            self.surface.attach_filter(&filter.graph)?;
            self.shown.graph = Some(filter.graph.clone());
        }
        if let Some(uri) = data_uri {
            self.surface
                .set_displacement_source(&uri, effect_box.width, effect_box.height)?;
            self.shown.source = Some(stamp);
        }
        self.surface.set_displacement_scale(filter.displacement_scale)?;
        self.surface.apply_backdrop_filter(&filter.backdrop_filter)?;

        Ok(Some(Applied {
            effect_box,
            shape,
            field,
            filter,
            layout,
            elapsed: started.elapsed(),
        }))
    }

    pub fn pointer_down(&mut self, input: PointerInput, capture: &mut dyn InputCapture) -> DragEvent {
        if !self.config.draggable {
            return DragEvent::Ignored;
        }
        let event = self.drag.pointer_down(input, self.position, capture);
        if event == DragEvent::Started {
            self.schedule();
        }
        event
    }

    pub fn pointer_move(&mut self, input: PointerInput) -> DragEvent {
        if !self.config.draggable {
            return DragEvent::Ignored;
        }
        let event = self.drag.pointer_move(input);
        if let DragEvent::Moved(next) = event {
            self.position = next;
            self.schedule();
            let delay = self.config.positioning_delay();
            self.notifier.push(next, delay, &mut self.frames);
        }
        event
    }

    pub fn pointer_up(&mut self, input: PointerInput, capture: &mut dyn InputCapture) -> DragEvent {
        let event = self.drag.pointer_up(input, capture);
        if event == DragEvent::Ended {
            self.schedule();
        }
        event
    }

    pub fn pointer_cancel(&mut self, input: PointerInput, capture: &mut dyn InputCapture) -> DragEvent {
        self.pointer_up(input, capture)
    }

    pub fn cursor(&self) -> Cursor {
        match (self.config.draggable, self.drag.is_dragging()) {
            (false, _) => Cursor::Default,
            (true, false) => Cursor::Grab,
            (true, true) => Cursor::Grabbing,
        }
    }

    pub fn set_drag_bounds(&mut self, bounds: Option<DragBounds>) {
        self.drag.set_bounds(bounds);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &GlassConfig {
        &self.config
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn drag(&self) -> &DragMachine {
        &self.drag
    }

    pub fn stats(&self) -> EffectStats {
        self.stats
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut F {
        &mut self.frames
    }
}
