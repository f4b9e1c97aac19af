use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Sender};
use std::thread;
use tiny_skia::{Pixmap, Transform};

use image::ImageReader;

/// Cache for entries whose icon field names an image file. Lookups that miss
/// are loaded on a worker thread and delivered back over the calloop channel,
/// so a draw never blocks on decoding.
pub struct IconCache {
    cache: HashMap<String, Option<Pixmap>>,
    pending: HashSet<String>,
    request_tx: Sender<(String, u32)>,
}

impl IconCache {
    pub fn new(response_tx: calloop::channel::Sender<(String, Option<Pixmap>)>) -> Self {
        // Relative icon paths resolve against the config dir's icons/
        // subdirectory, then the working directory.
        let mut search_dirs = Vec::new();
        if let Some(dir) = crate::config::config_dir() {
            search_dirs.push(dir.join("icons"));
        }
        search_dirs.push(PathBuf::from("."));

        let (request_tx, request_rx) = channel::<(String, u32)>();

        thread::spawn(move || {
            let loader = IconLoader { search_dirs };
            while let Ok((icon, size)) = request_rx.recv() {
                let pixmap = loader.find_and_load(&icon, size);
                let _ = response_tx.send((icon, pixmap));
            }
        });

        Self {
            cache: HashMap::new(),
            pending: HashSet::new(),
            request_tx,
        }
    }

    pub fn get(&mut self, icon: &str, size: u32) -> Option<Pixmap> {
        if let Some(cached) = self.cache.get(icon) {
            return cached.clone();
        }

        if !self.pending.contains(icon) {
            self.pending.insert(icon.to_string());
            let _ = self.request_tx.send((icon.to_string(), size));
        }

        None
    }

    pub fn insert(&mut self, icon: String, pixmap: Option<Pixmap>) {
        self.cache.insert(icon.clone(), pixmap);
        self.pending.remove(&icon);
    }
}

struct IconLoader {
    search_dirs: Vec<PathBuf>,
}

impl IconLoader {
    fn find_and_load(&self, icon: &str, size: u32) -> Option<Pixmap> {
        let path = Path::new(icon);
        if path.is_absolute() {
            return path.exists().then(|| self.load_from_path(path, size)).flatten();
        }

        for dir in &self.search_dirs {
            let candidate = dir.join(icon);
            if candidate.exists() {
                return self.load_from_path(&candidate, size);
            }
        }
        None
    }

    fn load_from_path(&self, path: &Path, size: u32) -> Option<Pixmap> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match ext.to_ascii_lowercase().as_str() {
            "svg" => self.load_svg(path, size),
            _ => self.load_raster(path, size),
        }
    }

    fn load_raster(&self, path: &Path, size: u32) -> Option<Pixmap> {
        let img = ImageReader::open(path).ok()?.decode().ok()?;
        let img = img.resize(size, size, image::imageops::FilterType::Lanczos3);
        let mut rgba = img.into_rgba8();

        for pixel in rgba.chunks_exact_mut(4) {
            let a = pixel[3] as f32 / 255.0;
            pixel[0] = (pixel[0] as f32 * a) as u8;
            pixel[1] = (pixel[1] as f32 * a) as u8;
            pixel[2] = (pixel[2] as f32 * a) as u8;
        }

        let width = rgba.width();
        let height = rgba.height();

        Pixmap::from_vec(rgba.into_vec(), tiny_skia::IntSize::from_wh(width, height)?)
    }

    fn load_svg(&self, path: &Path, size: u32) -> Option<Pixmap> {
        let opt = resvg::usvg::Options::default();
        let svg_data = fs::read(path).ok()?;
        let tree = resvg::usvg::Tree::from_data(&svg_data, &opt).ok()?;

        let mut pixmap = Pixmap::new(size, size)?;
        let transform = Transform::from_scale(
            size as f32 / tree.size().width(),
            size as f32 / tree.size().height(),
        );

        resvg::render(&tree, transform, &mut pixmap.as_mut());
        Some(pixmap)
    }
}
