//! Scene builder: room descriptor -> ordered layer stack.
//!
//! Layer order produced:
//! 1. size layer (immovable, `frameW/frameH` = room size)
//! 2. `background` (if present)
//! 3. playground placements, ascending `y`
//! 4. `foreground` (if present)
//! 5. `navMesh`, `treasure` overlays (immovable, hidden, alpha 0.5)
//!
//! Error policy:
//! - placement problems (unknown/empty animation, bad frame refs) are logged
//!   and the placement is dropped
//! - media with an unknown file type is logged and the slot skipped
//! - no layout: placement phase skipped, media layers still built
//! - loader failures and malformed descriptors abort the build; the caller
//!   keeps whatever scene it had

use std::sync::Arc;

use log::{debug, info, warn};

use crate::core::image_cache::ImageCache;

use super::error::{Result, SceneError};
use super::image::AudioHandle;
use super::keys::{A_ALPHA, A_VISIBLE};
use super::attrs::AttrValue;
use super::layer::Layer;
use super::loader::{url_ext, AssetLoader, MediaKind};
use super::room::{MediaRef, Playground, Room, SpriteSheetRef};
use super::scene::Scene;
use super::sprite_sheet::{FrameSet, SpriteSheet};

/// Opacity of navMesh/treasure overlays
pub const OVERLAY_ALPHA: f32 = 0.5;

/// Media slot after file-type dispatch.
#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    /// Image source key, decoded into the cache
    Image(String),
    Audio(AudioHandle),
}

/// Builds scenes, decoding images into the cache it was given.
pub struct SceneBuilder<'a, L: AssetLoader + ?Sized> {
    loader: &'a L,
    cache: &'a mut ImageCache,
}

impl<'a, L: AssetLoader + ?Sized> SceneBuilder<'a, L> {
    pub fn new(loader: &'a L, cache: &'a mut ImageCache) -> Self {
        Self { loader, cache }
    }

    pub fn build(&mut self, room: &Room) -> Result<Scene> {
        if room.width == 0 || room.height == 0 {
            return Err(SceneError::MalformedRoom(format!(
                "room size {}x{} is empty",
                room.width, room.height
            )));
        }
        info!("Building scene for '{}' ({}x{})", room.display_name(), room.width, room.height);

        // Decode all media up front so a failing load leaves nothing half-built
        let background = self.resolve_media("background", room.media.background.as_ref())?;
        let foreground = self.resolve_media("foreground", room.media.foreground.as_ref())?;
        let nav_mesh = self.resolve_media("navMesh", room.media.nav_mesh.as_ref())?;
        let treasure = self.resolve_media("treasure", room.media.treasure.as_ref())?;
        let music = self.resolve_media("music", room.media.music.as_ref())?;

        // Sheet images decode with the media, placements or not
        let sheet = self.sprite_sheet(room)?;
        if let Some(sheet) = &sheet {
            for url in &sheet.images {
                self.cache.resolve(url, self.loader)?;
            }
        }

        let (w, h) = (room.width, room.height);
        let mut layers = vec![Layer::surface(w, h)];

        if let Some(src) = image_src("background", background) {
            layers.push(Layer::image("background", &src, w, h));
        }

        match &room.layout {
            Some(layout) => layers.extend(placements(sheet.as_ref(), &layout.playground)),
            None => debug!("{}: placement phase skipped", SceneError::MissingLayout),
        }

        if let Some(src) = image_src("foreground", foreground) {
            layers.push(Layer::image("foreground", &src, w, h));
        }

        for (name, slot) in [("navMesh", nav_mesh), ("treasure", treasure)] {
            if let Some(src) = image_src(name, slot) {
                layers.push(overlay(name, &src, w, h)?);
            }
        }

        let music = match music {
            Some(Resolved::Audio(handle)) => Some(handle),
            Some(Resolved::Image(src)) => {
                warn!("music slot holds an image ({}), ignored", src);
                None
            }
            None => None,
        };

        info!("Scene built: {} layers", layers.len());
        Ok(Scene::new(layers, music))
    }

    fn sprite_sheet(&mut self, room: &Room) -> Result<Option<SpriteSheet>> {
        match &room.sprite_sheet {
            None => Ok(None),
            Some(SpriteSheetRef::Inline(sheet)) => Ok(Some(sheet.clone())),
            Some(SpriteSheetRef::Url(url)) => {
                debug!("Fetching sprite sheet {}", url);
                let doc = self.loader.fetch_json(url)?;
                SpriteSheet::from_json(doc).map(Some)
            }
        }
    }

    /// Dispatch one media slot by file type.
    ///
    /// Images are decoded into the cache now; audio handles are lazy.
    fn resolve_media(&mut self, slot: &str, media: Option<&MediaRef>) -> Result<Option<Resolved>> {
        let Some(media) = media else {
            return Ok(None);
        };
        let url = match media {
            MediaRef::Url(url) => url,
            MediaRef::Object(_) => {
                return Ok(match media.object_src() {
                    Some(src) => {
                        debug!("{}: already resolved ({})", slot, src);
                        Some(resolved_object(slot, src))
                    }
                    None => {
                        warn!("{}: object without src, skipped", slot);
                        None
                    }
                });
            }
        };

        match MediaKind::from_url(url) {
            Some(MediaKind::Image) => {
                self.cache.resolve(url, self.loader)?;
                Ok(Some(Resolved::Image(url.clone())))
            }
            Some(MediaKind::Audio) => Ok(Some(Resolved::Audio(self.loader.load_audio(url)))),
            None => {
                let err = SceneError::UnknownFrameHandler {
                    ext: url_ext(url),
                    url: url.clone(),
                };
                warn!("{}: {}", slot, err);
                Ok(None)
            }
        }
    }
}

/// Animated layers for the playground, in ascending `y`.
fn placements(sheet: Option<&SpriteSheet>, playground: &Playground) -> Vec<Layer> {
    let sorted = playground.sorted();
    if sorted.is_empty() {
        return Vec::new();
    }
    let Some(sheet) = sheet else {
        warn!("Room has {} placements but no sprite sheet, skipping them", sorted.len());
        return Vec::new();
    };
    let pool: Arc<[String]> = sheet.images.clone().into();

    let mut layers = Vec::with_capacity(sorted.len());
    for placement in &sorted {
        let frames = match sheet.resolve_animation(&placement.id) {
            Ok(frames) => frames,
            Err(e) => {
                warn!("Skipping placement '{}' at ({}, {}): {}", placement.id, placement.x, placement.y, e);
                continue;
            }
        };
        let Some(frames) = FrameSet::new(frames) else {
            warn!("Skipping placement '{}': {}", placement.id, SceneError::EmptyAnimation(placement.id.clone()));
            continue;
        };
        layers.push(Layer::animated(
            &placement.id,
            (placement.x, placement.y),
            (placement.reg_x, placement.reg_y),
            frames,
            Arc::clone(&pool),
        ));
    }
    debug!("Placements: {} of {} resolved", layers.len(), sorted.len());
    layers
}

/// Pre-resolved objects: music stays audio, everything else is an image key.
fn resolved_object(slot: &str, src: &str) -> Resolved {
    if slot == "music" {
        Resolved::Audio(AudioHandle::new(src))
    } else {
        Resolved::Image(src.to_string())
    }
}

fn image_src(slot: &str, resolved: Option<Resolved>) -> Option<String> {
    match resolved {
        Some(Resolved::Image(src)) => Some(src),
        Some(Resolved::Audio(handle)) => {
            warn!("{} slot holds audio ({}), ignored", slot, handle.src());
            None
        }
        None => None,
    }
}

/// Hidden half-transparent overlay kept above everything else.
fn overlay(name: &str, src: &str, w: u32, h: u32) -> Result<Layer> {
    let mut layer = Layer::image(name, src, w, h)
        .with_field(A_VISIBLE, AttrValue::Bool(false))?
        .with_field(A_ALPHA, AttrValue::Float(OVERLAY_ALPHA))?;
    layer.immovable = true;
    Ok(layer)
}
