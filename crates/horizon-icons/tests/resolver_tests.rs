//! Tests for icon resolution, caching and badge composition.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use horizon_icons::prelude::*;
use horizon_icons::render::{
    Compositor, IconStream, ImageOps, OutputFormat, RasterOps, RenderError, Rgba,
};
use horizon_icons::{Error, classify::DROP_FOLDER_BADGE};
use parking_lot::Mutex;
use tiff::encoder::{TiffEncoder, colortype};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("horizon_icons=trace")
        .with_test_writer()
        .try_init();
}

fn png(size: u32, pixel: [u8; 4]) -> Vec<u8> {
    ImageBuffer::from_pixel(size, size, Rgba(pixel)).to_png().unwrap()
}

fn gif(size: u32) -> Vec<u8> {
    ImageBuffer::from_pixel(size, size, Rgba([200, 40, 40, 255]))
        .encode(OutputFormat::Gif)
        .unwrap()
}

/// One RGBA page per `(size, fill)`, every channel set to `fill`.
fn tiff_pages(pages: &[(u32, u8)]) -> Vec<u8> {
    let mut out = io::Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut out).unwrap();
        for &(size, fill) in pages {
            let data = vec![fill; (size * size * 4) as usize];
            encoder.write_image::<colortype::RGBA8>(size, size, &data).unwrap();
        }
    }
    out.into_inner()
}

/// Memory source that counts successful opens per resource.
#[derive(Default)]
struct CountingSource {
    inner: MemorySource,
    opens: Mutex<Vec<String>>,
}

impl CountingSource {
    fn with(self, name: &str, bytes: Vec<u8>) -> Self {
        self.inner.insert(name, bytes);
        self
    }

    fn opens(&self, name: &str) -> usize {
        self.opens.lock().iter().filter(|n| n.as_str() == name).count()
    }
}

impl StreamSource for CountingSource {
    fn open_stream(&self, name: &str) -> io::Result<Box<dyn IconStream>> {
        let stream = self.inner.open_stream(name)?;
        self.opens.lock().push(name.to_string());
        Ok(stream)
    }
}

/// Raster ops that record the source width of every resize.
#[derive(Default)]
struct CountingOps {
    inner: ImageOps,
    resized_from: Mutex<Vec<(u32, u32)>>,
    draws: AtomicUsize,
}

impl RasterOps for CountingOps {
    fn resize(&self, image: &ImageBuffer, width: u32, height: u32) -> ImageBuffer {
        self.resized_from.lock().push((image.width(), width));
        self.inner.resize(image, width, height)
    }

    fn draw_full(&self, target: &mut ImageBuffer, overlay: &ImageBuffer) {
        self.draws.fetch_add(1, Ordering::SeqCst);
        self.inner.draw_full(target, overlay);
    }
}

fn resolver_with(source: CountingSource) -> (IconResolver, Arc<CountingSource>, Arc<CountingOps>) {
    let source = Arc::new(source);
    let ops = Arc::new(CountingOps::default());
    let resolver = IconResolver::new(Arc::clone(&source)).with_raster_ops(ops.clone());
    (resolver, source, ops)
}

#[test]
fn test_repeated_resolution_decodes_once() {
    init_tracing();
    let source = CountingSource::default().with("file-pdf", png(32, [255, 0, 0, 255]));
    let (resolver, source, _) = resolver_with(source);
    let subject = PathSubject::file("report.pdf");

    let first = resolver.resolve_for_subject(&subject, 16).unwrap();
    let second = resolver.resolve_for_subject(&subject, 16).unwrap();

    assert_eq!(first.width(), 16);
    assert!(first.ptr_eq(&second));
    assert_eq!(source.opens("file-pdf"), 1);
}

#[test]
fn test_exact_match_not_reinserted() {
    let source = CountingSource::default().with("folder", png(32, [0, 0, 255, 255]));
    let (resolver, source, ops) = resolver_with(source);
    let folder = PathSubject::directory();

    let native = resolver.resolve_for_subject(&folder, 32).unwrap();
    let family = FamilyKey::new(IconIdentity::folder(), Classifier::DEFAULT);
    assert_eq!(resolver.cache().sizes(&family), vec![32]);

    let again = resolver.resolve_for_subject(&folder, 32).unwrap();
    assert!(native.ptr_eq(&again));
    assert_eq!(resolver.cache().sizes(&family), vec![32]);
    assert!(ops.resized_from.lock().is_empty());
    assert_eq!(source.opens("folder"), 1);
}

#[test]
fn test_nearest_fit_prefers_larger() {
    let source = CountingSource::default().with("badge", png(24, [0, 255, 0, 255]));
    let (resolver, _, ops) = resolver_with(source);

    // seed the family with {24, 8}
    let small = resolver.resource("badge", 8).unwrap();
    assert_eq!(small.width(), 8);

    let mid = resolver.resource("badge", 16).unwrap();
    assert_eq!(mid.width(), 16);
    assert_eq!(*ops.resized_from.lock(), vec![(24, 8), (24, 16)]);

    let family = FamilyKey::new(IconIdentity::name("badge"), Classifier::DEFAULT);
    assert_eq!(resolver.cache().sizes(&family), vec![24, 8, 16]);
}

#[test]
fn test_disk_and_icon_families_are_isolated() {
    let source = CountingSource::default().with("sftp", png(32, [9, 9, 9, 255]));
    let (resolver, source, _) = resolver_with(source);
    let protocol = Protocol::new("sftp").with_disk("sftp").with_icon("sftp");

    let disk = resolver.protocol_disk(&protocol, 32).unwrap();
    let icon = resolver.protocol_icon(&protocol, 32).unwrap();
    assert!(!disk.ptr_eq(&icon));
    assert_eq!(source.opens("sftp"), 2);

    let cache = resolver.cache();
    let disk_family = FamilyKey::new(IconIdentity::protocol("sftp"), Classifier::DISK);
    let icon_family = FamilyKey::new(IconIdentity::protocol("sftp"), Classifier::ICON);
    assert!(cache.get(&disk_family, 32).unwrap().ptr_eq(&disk));
    assert!(cache.get(&icon_family, 32).unwrap().ptr_eq(&icon));
}

#[test]
fn test_protocol_without_disk() {
    let (resolver, _, _) = resolver_with(CountingSource::default());
    let err = resolver.protocol_disk(&Protocol::new("local"), 16).unwrap_err();
    assert!(matches!(err, Error::MissingProtocolIcon { role: "disk", .. }));
    assert!(err.is_miss());
}

#[test]
fn test_drop_folder_is_composited() {
    let source = CountingSource::default()
        .with("folder", png(32, [0, 0, 255, 255]))
        .with(DROP_FOLDER_BADGE, png(32, [255, 255, 0, 128]));
    let (resolver, _, ops) = resolver_with(source);
    let subject = PathSubject::directory().with_permission(Permission::from_symbolic("-wx").unwrap());

    let composed = resolver.resolve_for_subject(&subject, 32).unwrap();
    assert_eq!(ops.draws.load(Ordering::SeqCst), 1);

    let reference = IconResolver::new(
        MemorySource::new()
            .with("folder", png(32, [0, 0, 255, 255]))
            .with(DROP_FOLDER_BADGE, png(32, [255, 255, 0, 128])),
    );
    let base = reference.resource("folder", 32).unwrap();
    let badge = reference.resource(DROP_FOLDER_BADGE, 32).unwrap();
    let expected = Compositor::new(&ImageOps::default()).overlay(
        base.as_owned().unwrap(),
        badge.as_owned().unwrap(),
        32,
    );
    assert_eq!(composed.rgba_bytes().into_owned(), expected.as_rgba8_bytes());

    // stored under the classified key, composed once
    let again = resolver.resolve_for_subject(&subject, 32).unwrap();
    assert!(composed.ptr_eq(&again));
    assert_eq!(ops.draws.load(Ordering::SeqCst), 1);
    let family = FamilyKey::new(IconIdentity::folder(), Classifier::DROP_FOLDER);
    assert!(resolver.cache().get(&family, 32).is_some());
}

#[test]
fn test_alias_folder() {
    let source = CountingSource::default()
        .with("folder", png(32, [0, 0, 255, 255]))
        .with("aliasbadge", png(16, [0, 0, 0, 255]));
    let (resolver, _, _) = resolver_with(source);

    let alias = resolver.alias_folder(32).unwrap();
    let linked = resolver
        .resolve_for_subject(&PathSubject::directory().with_symbolic_link(true), 32)
        .unwrap();
    assert!(alias.ptr_eq(&linked));
}

#[test]
fn test_stream_bound_gif() {
    let source = CountingSource::default().with("spinner", gif(32));
    let (resolver, source, _) = resolver_with(source);

    let native = resolver.resource("spinner", 32).unwrap();
    assert!(native.is_stream_bound());
    assert_eq!(source.opens("spinner"), 1);

    let smaller = resolver.resource("spinner", 16).unwrap();
    assert!(!smaller.is_stream_bound());
    assert_eq!(smaller.width(), 16);
    assert_eq!(source.opens("spinner"), 2);

    let again = resolver.resource("spinner", 16).unwrap();
    assert!(smaller.ptr_eq(&again));
    assert_eq!(source.opens("spinner"), 2);
}

#[test]
fn test_stream_bound_gif_new_sizes_derive_from_native_frame() {
    let source = CountingSource::default().with("spinner", gif(32));
    let (resolver, source, ops) = resolver_with(source);

    assert_eq!(resolver.resource("spinner", 16).unwrap().width(), 16);
    assert_eq!(source.opens("spinner"), 2);

    // 16 is cached, but 24 must still come from the native frame
    assert_eq!(resolver.resource("spinner", 24).unwrap().width(), 24);
    assert_eq!(source.opens("spinner"), 3);
    assert_eq!(*ops.resized_from.lock(), vec![(32, 16), (32, 24)]);
}

#[test]
fn test_tiff_family_nearest_page() {
    let pages = tiff_pages(&[(16, 40), (32, 80), (48, 120)]);
    let source = CountingSource::default().with("stack", pages);
    let (resolver, source, ops) = resolver_with(source);

    let first = resolver.resource("stack", 24).unwrap();
    assert_eq!(first.width(), 24);
    assert_eq!(*ops.resized_from.lock(), vec![(32, 24)]);

    let family = FamilyKey::new(IconIdentity::name("stack"), Classifier::DEFAULT);
    assert_eq!(resolver.cache().default_size(&family), Some(16));
    assert_eq!(resolver.cache().sizes(&family), vec![16, 32, 48, 24]);

    let second = resolver.resource("stack", 24).unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(source.opens("stack"), 1);
    assert_eq!(ops.resized_from.lock().len(), 1);

    // other page sizes come straight from the cache
    assert_eq!(resolver.resource("stack", 48).unwrap().width(), 48);
    assert_eq!(source.opens("stack"), 1);
}

#[test]
fn test_tiff_duplicate_width_keeps_first_page() {
    let source = CountingSource::default().with("pages", tiff_pages(&[(16, 10), (16, 250)]));
    let (resolver, _, _) = resolver_with(source);

    let first = resolver.resource("pages", 16).unwrap();
    let second = resolver.resource("pages", 16).unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(
        first.as_owned().unwrap().get_pixel(0, 0),
        Some(Rgba([10, 10, 10, 10]))
    );

    let default = resolver.resolve_named_default("pages", Classifier::DEFAULT).unwrap();
    assert!(default.ptr_eq(&first));
}

#[test]
fn test_executable_resource() {
    let source = CountingSource::default().with("executable", png(32, [1, 2, 3, 255]));
    let (resolver, _, ops) = resolver_with(source);
    let subject = PathSubject::file("configure").with_permission(Permission::FULL);

    let icon = resolver.resolve_for_subject(&subject, 32).unwrap();
    assert_eq!(icon.width(), 32);
    assert_eq!(ops.draws.load(Ordering::SeqCst), 0);
}

#[test]
fn test_generic_file_fallback() {
    let source = CountingSource::default().with("file", png(32, [7, 7, 7, 255]));
    let (resolver, source, _) = resolver_with(source);

    let icon = resolver
        .resolve_for_subject(&PathSubject::file("notes.unknown"), 32)
        .unwrap();
    assert_eq!(icon.width(), 32);
    assert_eq!(source.opens("file"), 1);

    let family = FamilyKey::new(IconIdentity::extension("unknown"), Classifier::DEFAULT);
    assert!(resolver.cache().contains_family(&family));
}

#[test]
fn test_missing_resource_is_empty_candidate_set() {
    let (resolver, _, _) = resolver_with(CountingSource::default());
    let err = resolver.resource("nothing", 16).unwrap_err();
    assert!(matches!(
        err,
        Error::Render(RenderError::EmptyCandidateSet { size: 16 })
    ));
    assert!(err.is_miss());
}

#[test]
fn test_undecodable_resource() {
    let source = CountingSource::default().with("broken", b"not an image".to_vec());
    let (resolver, _, _) = resolver_with(source);
    assert!(resolver.resource("broken", 16).unwrap_err().is_miss());
}

#[test]
fn test_named_default() {
    let source = CountingSource::default().with("logo", png(48, [5, 5, 5, 255]));
    let (resolver, source, _) = resolver_with(source);

    let default = resolver.resolve_named_default("logo", Classifier::DEFAULT).unwrap();
    assert_eq!(default.width(), 48);

    // later derived sizes do not change the default
    resolver.resource("logo", 16).unwrap();
    let again = resolver.resolve_named_default("logo", Classifier::DEFAULT).unwrap();
    assert!(default.ptr_eq(&again));
    assert_eq!(source.opens("logo"), 1);
}

#[test]
fn test_concurrent_requests_share_one_decode() {
    let source = CountingSource::default().with("folder", png(64, [0, 0, 255, 255]));
    let (resolver, source, _) = resolver_with(source);
    let resolver = Arc::new(resolver);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            thread::spawn(move || {
                resolver
                    .resolve_for_subject(&PathSubject::directory(), 16)
                    .unwrap()
            })
        })
        .collect();
    let results: Vec<IconImage> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(source.opens("folder"), 1);
    assert!(results.iter().all(|r| r.ptr_eq(&results[0])));
}

#[test]
fn test_directory_source_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("folder.png"), png(32, [0, 0, 255, 255])).unwrap();

    let config = IconConfig::default().with_search_path(dir.path());
    let resolver = IconResolver::with_config(DirectorySource::from_config(&config), config);
    let icon = resolver.resolve_for_subject(&PathSubject::directory(), 16).unwrap();
    assert_eq!(icon.width(), 16);

    let stats = resolver.stats();
    assert_eq!(stats.families, 1);
    assert_eq!(stats.variants, 2);
}

#[test]
fn test_configured_resource_names() {
    let config = IconConfig::from_toml_str(
        r#"
        folder_resource = "directory"
        file_resource_pattern = "mime-{ext}"
        "#,
    )
    .unwrap();
    let source = MemorySource::new()
        .with("directory", png(16, [1, 1, 1, 255]))
        .with("mime-txt", png(16, [2, 2, 2, 255]));
    let resolver = IconResolver::with_config(source, config);

    assert!(resolver.resolve_for_subject(&PathSubject::directory(), 16).is_ok());
    assert!(resolver.resolve_for_subject(&PathSubject::file("a.TXT"), 16).is_ok());
}
