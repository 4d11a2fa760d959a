//! Icon resolution and caching.
//!
//! This module provides the [`IconResolver`], which classifies a request,
//! answers it from the [`IconCache`] when it can, and otherwise decodes the
//! backing resource, derives the requested size and composites badges.
//!
//! Every entry point follows the same pattern: build the family key, return
//! an exact-size hit, else fetch or derive the family and store the result.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use horizon_icons_render::{
    Classifier, Compositor, DecodeMode, FamilyKey, IconCache, IconCacheStats, IconIdentity,
    IconImage, IconStream, ImageBuffer, ImageDecoder, ImageOps, NearestFitResolver, RasterOps,
    RenderError,
};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};

use crate::classify::{ALIAS_BADGE, BaseIcon, classify};
use crate::config::IconConfig;
use crate::error::{Error, Result};
use crate::protocol::Protocol;
use crate::source::StreamSource;
use crate::subject::FileSubject;

/// Icon resolver with caching.
///
/// The resolver is `Send + Sync`. Concurrent requests for the same family
/// are serialized on a per-family guard, so a family is decoded at most once
/// and a waiting caller receives the result of the first one.
pub struct IconResolver {
    /// Resolver settings
    config: IconConfig,
    /// Where encoded bytes come from
    source: Arc<dyn StreamSource>,
    /// Resize and draw primitives
    ops: Arc<dyn RasterOps>,
    decoder: ImageDecoder,
    /// Resolution cache
    cache: RwLock<IconCache>,
    /// One guard per family with a decode or composition in progress
    in_flight: Mutex<HashMap<FamilyKey, Arc<Mutex<()>>>>,
}

impl IconResolver {
    /// Create a resolver with the default configuration.
    pub fn new(source: impl StreamSource + 'static) -> Self {
        Self::with_config(source, IconConfig::default())
    }

    /// Create a resolver with a custom configuration.
    pub fn with_config(source: impl StreamSource + 'static, config: IconConfig) -> Self {
        Self {
            ops: Arc::new(ImageOps::new(config.resize_filter.into())),
            decoder: ImageDecoder::new(config.reference_dpi),
            source: Arc::new(source),
            config,
            cache: RwLock::new(IconCache::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the rendering primitives.
    #[must_use]
    pub fn with_raster_ops(mut self, ops: Arc<dyn RasterOps>) -> Self {
        self.ops = ops;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &IconConfig {
        &self.config
    }

    /// Read access to the cache.
    pub fn cache(&self) -> RwLockReadGuard<'_, IconCache> {
        self.cache.read()
    }

    /// Cache statistics.
    pub fn stats(&self) -> IconCacheStats {
        self.cache.read().stats()
    }

    // ========================================================================
    // ENTRY POINTS
    // ========================================================================

    /// Resolve the icon of a file-system entry at `size` pixels.
    ///
    /// The subject is classified first. Badged classes are composited from
    /// the base icon and the badge and cached under the classified key.
    pub fn resolve_for_subject(&self, subject: &dyn FileSubject, size: u32) -> Result<IconImage> {
        if size == 0 {
            return Err(RenderError::InvalidKey("subject icons need a size".to_string()).into());
        }

        let classification = classify(subject);
        tracing::trace!(?classification, size, "classified subject");

        let sources = match &classification.base {
            BaseIcon::Executable => {
                let name = self.config.executable_resource.clone();
                return self.resource(&name, size);
            }
            BaseIcon::Folder => vec![self.config.folder_resource.clone()],
            BaseIcon::File(extension) => self.file_sources(extension),
        };

        let base = FamilyKey::new(classification.identity.clone(), Classifier::DEFAULT);
        match classification.badge {
            None => self.resolve_family(&base, &sources, size),
            Some(badge) => {
                let family = FamilyKey::new(classification.identity, classification.classifier);
                self.resolve_badged(&family, &base, &sources, badge, size)
            }
        }
    }

    /// Resolve a named resource in the given role, without classification.
    ///
    /// A size of 0 returns the family default without resizing.
    pub fn resolve_named(&self, name: &str, size: u32, classifier: Classifier) -> Result<IconImage> {
        let family = FamilyKey::new(IconIdentity::name(name), classifier);
        self.resolve_family(&family, &[name.to_string()], size)
    }

    /// A representative image of the named family, never resized.
    ///
    /// This is the first image decoded for the family.
    pub fn resolve_named_default(&self, name: &str, classifier: Classifier) -> Result<IconImage> {
        self.resolve_named(name, 0, classifier)
    }

    /// A resource (badge, executable artwork, ...) in the default role.
    pub fn resource(&self, name: &str, size: u32) -> Result<IconImage> {
        self.resolve_named(name, size, Classifier::DEFAULT)
    }

    /// The disk icon of a protocol.
    pub fn protocol_disk(&self, protocol: &Protocol, size: u32) -> Result<IconImage> {
        let name = protocol
            .disk
            .as_deref()
            .ok_or_else(|| Error::missing_protocol_icon(&protocol.identifier, "disk"))?;
        let family = FamilyKey::new(IconIdentity::protocol(&protocol.identifier), Classifier::DISK);
        self.resolve_family(&family, &[name.to_string()], size)
    }

    /// The application icon of a protocol.
    pub fn protocol_icon(&self, protocol: &Protocol, size: u32) -> Result<IconImage> {
        let name = protocol
            .icon
            .as_deref()
            .ok_or_else(|| Error::missing_protocol_icon(&protocol.identifier, "application"))?;
        let family = FamilyKey::new(IconIdentity::protocol(&protocol.identifier), Classifier::ICON);
        self.resolve_family(&family, &[name.to_string()], size)
    }

    /// The folder icon with the alias badge.
    pub fn alias_folder(&self, size: u32) -> Result<IconImage> {
        if size == 0 {
            return Err(RenderError::InvalidKey("alias folder needs a size".to_string()).into());
        }
        let base = FamilyKey::new(IconIdentity::folder(), Classifier::DEFAULT);
        let family = FamilyKey::new(IconIdentity::folder(), Classifier::ALIAS);
        let sources = vec![self.config.folder_resource.clone()];
        self.resolve_badged(&family, &base, &sources, ALIAS_BADGE, size)
    }

    // ========================================================================
    // RESOLUTION
    // ========================================================================

    /// Resolve one size of a family, decoding the first available source on
    /// a miss.
    fn resolve_family(&self, family: &FamilyKey, sources: &[String], size: u32) -> Result<IconImage> {
        if size == 0 {
            return self.resolve_default(family, sources);
        }
        if let Some(hit) = self.lookup(family, size) {
            return Ok(hit);
        }

        self.with_family_guard(family, || -> Result<IconImage> {
            if let Some(hit) = self.lookup(family, size) {
                return Ok(hit);
            }

            let cached = self.cache.read().filter(family);
            let candidates = if cached.is_empty() {
                let decoded = self.decode_into_cache(family, sources);
                if let Some(exact) = decoded.iter().find(|frame| frame.width() == size) {
                    return Ok(exact.clone());
                }
                decoded
            } else {
                cached
            };

            // Stream-bound frames are never resized: derive from fresh owned copies.
            let mut owned = if candidates.iter().any(IconImage::is_stream_bound) {
                self.decode_detached(family, sources)
            } else {
                Vec::new()
            };
            owned.extend(candidates.iter().filter_map(|frame| frame.as_owned().cloned()));

            let fitter = NearestFitResolver::new(self.ops.as_ref());
            let fit = fitter.resolve(&owned, size, |size, derived| {
                if let Err(err) = self
                    .cache
                    .write()
                    .put(family, size, IconImage::Owned(Arc::clone(derived)))
                {
                    tracing::warn!(%family, size, "failed to cache derived icon: {}", err);
                }
            })?;
            Ok(IconImage::Owned(fit))
        })
    }

    /// The family default: the first image decoded for it.
    fn resolve_default(&self, family: &FamilyKey, sources: &[String]) -> Result<IconImage> {
        if let Some(hit) = self.cache.read().get_any(family) {
            return Ok(hit);
        }

        self.with_family_guard(family, || -> Result<IconImage> {
            if let Some(hit) = self.cache.read().get_any(family) {
                return Ok(hit);
            }

            self.decode_into_cache(family, sources)
                .into_iter()
                .next()
                .ok_or_else(|| RenderError::EmptyCandidateSet { size: 0 }.into())
        })
    }

    /// Resolve a family that is a composition of base artwork and a badge.
    fn resolve_badged(
        &self,
        family: &FamilyKey,
        base: &FamilyKey,
        base_sources: &[String],
        badge: &'static str,
        size: u32,
    ) -> Result<IconImage> {
        if let Some(hit) = self.lookup(family, size) {
            return Ok(hit);
        }

        self.with_family_guard(family, || -> Result<IconImage> {
            if let Some(hit) = self.lookup(family, size) {
                return Ok(hit);
            }

            let base_image = self.resolve_owned(base, base_sources, size)?;
            let badge_family = FamilyKey::new(IconIdentity::name(badge), Classifier::DEFAULT);
            let badge_image = self.resolve_owned(&badge_family, &[badge.to_string()], size)?;

            let compositor = Compositor::new(self.ops.as_ref());
            let composed = IconImage::owned(compositor.overlay(&base_image, &badge_image, size));
            self.cache.write().put(family, size, composed.clone())?;
            Ok(composed)
        })
    }

    /// Like [`resolve_family`](Self::resolve_family), but always an owned
    /// image that may be resized or drawn.
    fn resolve_owned(
        &self,
        family: &FamilyKey,
        sources: &[String],
        size: u32,
    ) -> Result<Arc<ImageBuffer>> {
        match self.resolve_family(family, sources, size)? {
            IconImage::Owned(buffer) => Ok(buffer),
            IconImage::StreamBound(_) => {
                let owned = self.decode_detached(family, sources);
                Ok(NearestFitResolver::new(self.ops.as_ref()).resolve(&owned, size, |_, _| {})?)
            }
        }
    }

    // ========================================================================
    // DECODING
    // ========================================================================

    /// Decode the family's stream and store every frame.
    ///
    /// Sizes already stored are kept and their decoded frames dropped, so
    /// the returned frames are exactly the ones now in the cache. The first
    /// frame stored for a previously empty family becomes its default.
    /// Failures are logged and yield no frames.
    fn decode_into_cache(&self, family: &FamilyKey, sources: &[String]) -> Vec<IconImage> {
        let stream = match self.open_first(sources) {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(%family, "no icon stream: {}", err);
                return Vec::new();
            }
        };

        let mut is_default = !self.cache.read().contains_family(family);
        let frames = match self.decoder.decode(stream, DecodeMode::Cached, |width| {
            self.cache.read().contains(family, width)
        }) {
            Ok(frames) => frames,
            Err(err) => {
                tracing::warn!(%family, "failed to decode icon: {}", err);
                return Vec::new();
            }
        };

        let mut cache = self.cache.write();
        let mut stored = Vec::with_capacity(frames.len());
        for frame in frames {
            let width = frame.width();
            if cache.contains(family, width) {
                tracing::trace!(%family, width, "keeping cached frame");
                continue;
            }
            if let Err(err) = cache.put(family, width, frame.clone()) {
                tracing::warn!(%family, width, "failed to cache decoded frame: {}", err);
                continue;
            }
            if is_default {
                cache.mark_default(family, width);
                is_default = false;
            }
            stored.push(frame);
        }
        tracing::debug!(
            %family,
            frames = stored.len(),
            sizes = ?stored.iter().map(IconImage::width).collect::<Vec<_>>(),
            "decoded icon family"
        );
        stored
    }

    /// Decode the family's stream again into owned frames, without caching.
    fn decode_detached(&self, family: &FamilyKey, sources: &[String]) -> Vec<Arc<ImageBuffer>> {
        tracing::debug!(%family, "re-decoding stream-bound family into owned frames");
        let frames = self
            .open_first(sources)
            .and_then(|stream| Ok(self.decoder.decode(stream, DecodeMode::Detached, |_| false)?));
        match frames {
            Ok(frames) => frames
                .iter()
                .filter_map(|frame| frame.as_owned().cloned())
                .collect(),
            Err(err) => {
                tracing::warn!(%family, "failed to re-decode icon: {}", err);
                Vec::new()
            }
        }
    }

    /// Open the first source that exists.
    fn open_first(&self, sources: &[String]) -> Result<Box<dyn IconStream>> {
        for name in sources {
            match self.source.open_stream(name) {
                Ok(stream) => return Ok(stream),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    tracing::trace!(name = %name, "icon resource not found, trying next");
                }
                Err(err) => return Err(RenderError::Io(err).into()),
            }
        }
        Err(Error::missing_resource(sources.join(", ")))
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn lookup(&self, family: &FamilyKey, size: u32) -> Option<IconImage> {
        let hit = self.cache.read().get(family, size);
        if hit.is_some() {
            tracing::trace!(%family, size, "icon cache hit");
        }
        hit
    }

    /// Run `work` holding the family's guard.
    ///
    /// The guard entry is dropped again once no other caller holds or waits
    /// on it, so `in_flight` only lists families with work in progress.
    fn with_family_guard<T>(&self, family: &FamilyKey, work: impl FnOnce() -> T) -> T {
        let guard = Arc::clone(self.in_flight.lock().entry(family.clone()).or_default());
        let result = {
            let _held = guard.lock();
            work()
        };

        let mut in_flight = self.in_flight.lock();
        // one reference in the map, one here
        if Arc::strong_count(&guard) == 2 {
            in_flight.remove(family);
        }
        result
    }

    /// Extension-specific file icon first, then the generic one.
    fn file_sources(&self, extension: &str) -> Vec<String> {
        let mut sources = Vec::with_capacity(2);
        if !extension.trim().is_empty() {
            sources.push(self.config.file_resource(extension));
        }
        sources.push(self.config.generic_file_resource.clone());
        sources
    }
}

impl std::fmt::Debug for IconResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconResolver")
            .field("config", &self.config)
            .field("decoder", &self.decoder)
            .field("cache", &self.cache.read().stats())
            .finish_non_exhaustive()
    }
}
