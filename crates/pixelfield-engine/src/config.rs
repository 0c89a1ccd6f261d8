//! Engine configuration.
//!
//! Provides configurable parameters for the canvas, the cell population,
//! the spatial index, animation tuning and the headless session.
//! Configuration can be loaded from and saved to a file.

use pixelfield_common::{PixelfieldError, PixelfieldResult, Rgb};
use pixelfield_kernel::{AnimationConfig, FocusEasing, GridConfig, IndexConfig, PopulationConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "pixelfield.toml";

/// Engine configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Canvas Settings ===
    /// Drawable width in pixels
    pub canvas_width: u32,
    /// Drawable height in pixels
    pub canvas_height: u32,
    /// Target frames per second
    pub target_fps: u32,
    /// Pace frames against the wall clock instead of a simulated one
    pub realtime: bool,

    // === Population Settings ===
    /// Number of cells to build
    pub cell_count: usize,
    /// Side length of an unscaled cell in pixels
    pub cell_size: f32,
    /// Cells generated per frame while building
    pub build_batch_size: usize,
    /// Maximum drift speed per reference frame
    pub drift: f32,
    /// Random seed (None = random)
    pub seed: Option<u64>,
    /// Cell size to rebuild at once the session script has run (None = keep)
    pub zoom_cell_size: Option<f32>,

    // === Index Settings ===
    /// Items per quadtree node before subdividing
    pub index_capacity: usize,
    /// Maximum quadtree depth
    pub index_max_depth: usize,
    /// Frames between periodic index rebuilds
    pub index_rebuild_interval: u32,
    /// Side of the pointer probe box
    pub probe_size: f32,

    // === Animation Settings ===
    /// Wave lifetime in milliseconds
    pub wave_duration_ms: f64,
    /// Final wave radius
    pub wave_max_offset: f32,
    /// Wave push strength
    pub wave_damping: f32,
    /// Explosion lifetime in milliseconds
    pub explosion_duration_ms: f64,
    /// Final explosion radius
    pub explosion_max_radius: f32,
    /// Scale of the focused cell
    pub focus_scale: f32,
    /// Focus transition duration in milliseconds
    pub focus_duration_ms: f64,
    /// Focus easing curve name
    pub focus_easing: String,

    // === Session Settings ===
    /// Grid event bus capacity
    pub event_capacity: usize,
    /// Color given to cells when an answer is submitted
    pub answer_color: String,
    /// Image used to recolor cells after the build
    pub theme_image: Option<PathBuf>,
    /// Where to write a PNG of the last frame
    pub snapshot_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Canvas
            canvas_width: 800,
            canvas_height: 600,
            target_fps: 60,
            realtime: false,

            // Population
            cell_count: 2000,
            cell_size: 10.0,
            build_batch_size: 500,
            drift: 0.3,
            seed: None,
            zoom_cell_size: None,

            // Index
            index_capacity: 8,
            index_max_depth: 6,
            index_rebuild_interval: 3,
            probe_size: 2.0,

            // Animation
            wave_duration_ms: 600.0,
            wave_max_offset: 40.0,
            wave_damping: 0.1,
            explosion_duration_ms: 500.0,
            explosion_max_radius: 60.0,
            focus_scale: 10.0,
            focus_duration_ms: 800.0,
            focus_easing: "linear".to_string(),

            // Session
            event_capacity: 1024,
            answer_color: "#ff0000".to_string(),
            theme_image: None,
            snapshot_path: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location, writing the
    /// defaults there first if no file exists yet.
    pub fn load_or_create() -> Self {
        let path = Self::config_path();
        if path.exists() {
            return Self::load_from(path);
        }

        let config = Self::default();
        if let Err(e) = config.save() {
            warn!("Failed to write default config to {}: {}", path.display(), e);
        }
        config
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::try_load_from(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("{e}, using defaults");
                Self::default()
            },
        }
    }

    /// Load configuration from a specific path, reporting any failure.
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> PixelfieldResult<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| PixelfieldError::Config(e.to_string()))
    }

    /// Save configuration to the default file location.
    pub fn save(&self) -> io::Result<()> {
        self.save_to(Self::config_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    fn config_path() -> PathBuf {
        if let Some(config_dir) = dirs_config_path() {
            config_dir.join("pixelfield").join(CONFIG_FILE)
        } else {
            PathBuf::from(CONFIG_FILE)
        }
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Canvas
        self.canvas_width = self.canvas_width.clamp(16, 7680);
        self.canvas_height = self.canvas_height.clamp(16, 4320);
        self.target_fps = self.target_fps.clamp(1, 240);

        // Population
        self.cell_count = self.cell_count.min(200_000);
        self.cell_size = self.cell_size.clamp(1.0, 64.0);
        self.build_batch_size = self.build_batch_size.clamp(1, 50_000);
        self.drift = self.drift.clamp(0.0, 20.0);
        self.zoom_cell_size = self.zoom_cell_size.map(|size| size.clamp(1.0, 64.0));

        // Index
        self.index_capacity = self.index_capacity.clamp(1, 256);
        self.index_max_depth = self.index_max_depth.clamp(1, 16);
        self.index_rebuild_interval = self.index_rebuild_interval.clamp(1, 120);
        self.probe_size = self.probe_size.clamp(0.5, 32.0);

        // Animation
        self.wave_duration_ms = self.wave_duration_ms.clamp(1.0, 10_000.0);
        self.wave_max_offset = self.wave_max_offset.clamp(0.0, 1000.0);
        self.wave_damping = self.wave_damping.clamp(0.0, 1.0);
        self.explosion_duration_ms = self.explosion_duration_ms.clamp(1.0, 10_000.0);
        self.explosion_max_radius = self.explosion_max_radius.clamp(0.0, 1000.0);
        self.focus_scale = self.focus_scale.clamp(1.0, 50.0);
        self.focus_duration_ms = self.focus_duration_ms.clamp(1.0, 10_000.0);
        if FocusEasing::from_name(&self.focus_easing).is_none() {
            warn!("Unknown focus easing {:?}, using linear", self.focus_easing);
            self.focus_easing = "linear".to_string();
        }

        // Session
        self.event_capacity = self.event_capacity.clamp(16, 65_536);
    }

    /// Parsed answer color.
    pub fn answer_color(&self) -> PixelfieldResult<Rgb> {
        Ok(self.answer_color.parse::<Rgb>()?)
    }

    /// Kernel configuration for a grid.
    #[must_use]
    pub fn to_grid_config(&self) -> GridConfig {
        GridConfig {
            population: PopulationConfig {
                base_size: self.cell_size,
                batch_size: self.build_batch_size,
                drift: self.drift,
                seed: self.seed,
            },
            index: IndexConfig {
                capacity: self.index_capacity,
                max_depth: self.index_max_depth,
                rebuild_interval: self.index_rebuild_interval,
                probe_size: self.probe_size,
            },
            animation: AnimationConfig {
                wave_duration_ms: self.wave_duration_ms,
                wave_max_offset: self.wave_max_offset,
                wave_damping: self.wave_damping,
                explosion_duration_ms: self.explosion_duration_ms,
                explosion_max_radius: self.explosion_max_radius,
                focus_scale: self.focus_scale,
                focus_duration_ms: self.focus_duration_ms,
                focus_easing: FocusEasing::from_name(&self.focus_easing).unwrap_or_default(),
            },
            event_capacity: self.event_capacity,
        }
    }
}

/// Get platform-specific config directory.
fn dirs_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Application Support"))
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.canvas_width, 800);
        assert_eq!(config.canvas_height, 600);
        assert_eq!(config.index_capacity, 8);
        assert!(!config.realtime);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.canvas_width = 0;
        config.wave_damping = 3.0;
        config.index_rebuild_interval = 0;
        config.focus_easing = "bouncy".to_string();
        config.zoom_cell_size = Some(500.0);

        config.validate();

        assert_eq!(config.canvas_width, 16);
        assert!((config.wave_damping - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.index_rebuild_interval, 1);
        assert_eq!(config.focus_easing, "linear");
        assert_eq!(config.zoom_cell_size, Some(64.0));
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("pixelfield.toml");

        let mut config = EngineConfig::default();
        config.cell_count = 42;
        config.realtime = true;
        config.seed = Some(12345);
        config.focus_easing = "smooth_step".to_string();

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.cell_count, 42);
        assert!(loaded.realtime);
        assert_eq!(loaded.seed, Some(12345));
        assert_eq!(
            loaded.to_grid_config().animation.focus_easing,
            FocusEasing::SmoothStep
        );
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/config.toml");
        assert_eq!(config.cell_count, 2000);
    }

    #[test]
    fn test_config_load_invalid_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "cell_count = \"many\"").expect("Failed to write");

        assert!(matches!(
            EngineConfig::try_load_from(&config_path),
            Err(PixelfieldError::Config(_))
        ));
        assert_eq!(EngineConfig::load_from(&config_path).cell_count, 2000);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: EngineConfig = toml::from_str("cell_size = 4.0").expect("valid toml");
        assert!((config.cell_size - 4.0).abs() < f32::EPSILON);
        assert_eq!(config.build_batch_size, 500);
        assert_eq!(config.zoom_cell_size, None);

        let zoomed: EngineConfig = toml::from_str("zoom_cell_size = 20.0").expect("valid toml");
        assert_eq!(zoomed.zoom_cell_size, Some(20.0));
    }

    #[test]
    fn test_answer_color() {
        let mut config = EngineConfig::default();
        assert_eq!(config.answer_color().expect("default color"), Rgb::RED);

        config.answer_color = "rgb(0, 10, 20)".to_string();
        assert_eq!(config.answer_color().expect("css color"), Rgb::new(0, 10, 20));

        config.answer_color = "crimson".to_string();
        assert!(matches!(config.answer_color(), Err(PixelfieldError::Color(_))));
    }

    #[test]
    fn test_grid_config_mapping() {
        let mut config = EngineConfig::default();
        config.cell_size = 12.0;
        config.index_max_depth = 4;
        config.focus_scale = 6.0;

        let grid = config.to_grid_config();
        assert!((grid.population.base_size - 12.0).abs() < f32::EPSILON);
        assert_eq!(grid.index.max_depth, 4);
        assert!((grid.animation.focus_scale - 6.0).abs() < f32::EPSILON);
        assert_eq!(grid.event_capacity, 1024);
    }
}
