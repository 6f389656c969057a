//! Session - current room scene plus everything that drives it.
//!
//! **Architecture**: the session owns the scene, its image cache, the
//! animation clock, the render and preview surfaces and the event bus.
//! Hosts call into it for every operator action and poll `update()` from
//! their main loop.
//!
//! # Mutation Policy
//!
//! Every mutation (room switch, field edit, toggle, reorder, tick) ends with
//! a full recomposite of the main surface, a preview redraw if a layer is
//! being previewed, and one `SceneChangedEvent`. There is no dirty tracking.
//!
//! # Room Switch
//!
//! `switch_room()` bumps the generation counter and builds into a fresh
//! cache. Only a fully built scene replaces the current one; on failure the
//! previous scene and cache stay installed. Loads finishing for an older
//! generation are dropped by the cache (`accept_loaded`).

use std::time::Instant;

use log::{debug, info, warn};
use uuid::Uuid;

use crate::entities::attrs::AttrValue;
use crate::entities::builder::SceneBuilder;
use crate::entities::compositor::{self, RenderStats, PREVIEW_MAX};
use crate::entities::error::{Result, SceneError};
use crate::entities::image::Image;
use crate::entities::loader::AssetLoader;
use crate::entities::room::Room;
use crate::entities::scene::Scene;
use crate::entities::surface::Surface;

use super::clock::AnimationClock;
use super::event_bus::EventBus;
use super::events::{PreviewChangedEvent, RoomLoadFailedEvent, SceneChange, SceneChangedEvent};
use super::image_cache::{CacheStats, ImageCache};

pub struct Session<L: AssetLoader, S: Surface> {
    loader: L,
    surface: S,
    preview_surface: S,
    scene: Option<Scene>,
    cache: ImageCache,
    clock: AnimationClock,
    /// Builds started so far; the installed scene's generation is `cache.generation()`
    generation: u64,
    preview: Option<Uuid>,
    preview_max: f32,
    bus: EventBus,
}

impl<L: AssetLoader, S: Surface> Session<L, S> {
    pub fn new(loader: L, surface: S, preview_surface: S) -> Self {
        Self {
            loader,
            surface,
            preview_surface,
            scene: None,
            cache: ImageCache::new(0),
            clock: AnimationClock::default(),
            generation: 0,
            preview: None,
            preview_max: PREVIEW_MAX,
            bus: EventBus::new(),
        }
    }

    pub fn with_clock(mut self, clock: AnimationClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_preview_max(mut self, max: f32) -> Self {
        self.preview_max = if max > 0.0 { max } else { PREVIEW_MAX };
        self
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    // === Accessors ===

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn preview_surface(&self) -> &S {
        &self.preview_surface
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Generation of the installed scene (0 before the first room).
    pub fn generation(&self) -> u64 {
        self.cache.generation()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn preview(&self) -> Option<Uuid> {
        self.preview
    }

    // === Room switch ===

    /// Build `room` and install it. The previous scene stays on failure.
    pub fn switch_room(&mut self, room: &Room) -> Result<()> {
        self.generation += 1;
        let generation = self.generation;
        let mut cache = ImageCache::new(generation);

        let built = SceneBuilder::new(&self.loader, &mut cache).build(room);
        let scene = match built {
            Ok(scene) => scene,
            Err(e) => {
                warn!("Room '{}' failed to load, keeping current scene: {}", room.display_name(), e);
                self.bus.emit(RoomLoadFailedEvent {
                    room: room.display_name().to_string(),
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        info!(
            "Room '{}' installed (generation {}, {} layers, {} images)",
            room.display_name(),
            generation,
            scene.len(),
            cache.len()
        );
        let layers = scene.len();
        self.scene = Some(scene);
        self.cache = cache;
        self.clock.reset();
        if self.preview.take().is_some() {
            self.bus.emit(PreviewChangedEvent { layer: None });
        }
        self.changed(SceneChange::Loaded { layers });
        Ok(())
    }

    /// Hand a finished asynchronous image load to the cache.
    ///
    /// Returns false if the load belongs to an older scene and was dropped.
    pub fn accept_loaded(&mut self, generation: u64, key: &str, image: Image) -> bool {
        self.cache.insert(generation, key, image)
    }

    // === Edits ===

    pub fn edit_field(&mut self, index: usize, field: &str, value: AttrValue) -> Result<()> {
        let scene = self.scene_mut()?;
        scene.edit_field(index, field, value)?;
        let layer = scene.layers()[index].uuid;
        self.changed(SceneChange::FieldEdited {
            layer,
            field: field.to_string(),
        });
        Ok(())
    }

    /// Edit from control text (`"12"`, `"true"`, `"bg.png"`).
    pub fn edit_field_text(&mut self, index: usize, field: &str, text: &str) -> Result<()> {
        let scene = self.scene_mut()?;
        scene.edit_field_text(index, field, text)?;
        let layer = scene.layers()[index].uuid;
        self.changed(SceneChange::FieldEdited {
            layer,
            field: field.to_string(),
        });
        Ok(())
    }

    pub fn toggle_visible(&mut self, index: usize) -> Result<bool> {
        let scene = self.scene_mut()?;
        let visible = scene.toggle_visible(index)?;
        let layer = scene.layers()[index].uuid;
        self.changed(SceneChange::VisibilityToggled { layer, visible });
        Ok(visible)
    }

    /// Apply a reorder-completed event (movable layers, new visual order).
    pub fn reorder(&mut self, rows: &[Uuid]) -> Result<()> {
        self.scene_mut()?.reorder(rows)?;
        self.changed(SceneChange::Reordered);
        Ok(())
    }

    pub fn reorder_rows(&mut self, rows: &[usize]) -> Result<()> {
        self.scene_mut()?.reorder_rows(rows)?;
        self.changed(SceneChange::Reordered);
        Ok(())
    }

    // === Preview ===

    /// Mark the layer at `index` as previewed (hover), or clear with None.
    pub fn set_preview(&mut self, index: Option<usize>) -> Result<()> {
        let uuid = match index {
            Some(i) => Some(self.scene_ref()?.layer(i).ok_or(SceneError::LayerIndex(i))?.uuid),
            None => None,
        };
        if uuid == self.preview {
            return Ok(());
        }
        self.preview = uuid;
        self.render_preview();
        self.bus.emit(PreviewChangedEvent { layer: uuid });
        Ok(())
    }

    // === Animation ===

    pub fn set_playing(&mut self, playing: bool) {
        self.clock.set_playing(playing);
    }

    pub fn toggle_playing(&mut self) -> bool {
        self.clock.toggle()
    }

    /// Poll the animation clock; recomposites when a tick did work.
    pub fn update(&mut self, now: Instant) -> Result<Option<usize>> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(None);
        };
        let advanced = self.clock.update(now, scene)?;
        if let Some(advanced) = advanced {
            self.changed(SceneChange::FramesAdvanced { advanced });
        }
        Ok(advanced)
    }

    /// Manual single tick, playback state ignored.
    pub fn step(&mut self) -> Result<usize> {
        let scene = self.scene.as_mut().ok_or(SceneError::NoScene)?;
        let advanced = self.clock.step(scene)?;
        self.changed(SceneChange::FramesAdvanced { advanced });
        Ok(advanced)
    }

    // === Rendering ===

    /// Full repaint of the main surface, plus the preview if one is set.
    pub fn recomposite(&mut self) -> RenderStats {
        let Some(scene) = self.scene.as_ref() else {
            return RenderStats::default();
        };
        let stats = compositor::render(scene, &mut self.surface, &mut self.cache, &self.loader);
        self.render_preview();
        stats
    }

    fn render_preview(&mut self) {
        let (Some(scene), Some(uuid)) = (self.scene.as_ref(), self.preview) else {
            return;
        };
        let Some(layer) = scene.index_of(uuid).and_then(|i| scene.layer(i)) else {
            debug!("Previewed layer {} is gone", uuid);
            return;
        };
        if let Err(e) = compositor::render_preview(
            layer,
            &mut self.preview_surface,
            &mut self.cache,
            &self.loader,
            self.preview_max,
        ) {
            warn!("Preview of '{}' failed: {}", layer.name, e);
        }
    }

    fn changed(&mut self, change: SceneChange) {
        let stats = self.recomposite();
        debug!("Scene changed: {:?} ({:?})", change, stats);
        self.bus.emit(SceneChangedEvent {
            generation: self.cache.generation(),
            change,
            stats,
        });
    }

    fn scene_ref(&self) -> Result<&Scene> {
        self.scene.as_ref().ok_or(SceneError::NoScene)
    }

    fn scene_mut(&mut self) -> Result<&mut Scene> {
        self.scene.as_mut().ok_or(SceneError::NoScene)
    }
}
