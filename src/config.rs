use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_camera")]
    pub camera: CameraConfig,

    #[serde(default = "default_starfield")]
    pub starfield: StarfieldConfig,

    #[serde(default = "default_scroll")]
    pub scroll: ScrollConfig,

    #[serde(default = "default_cubes")]
    pub cubes: CubesConfig,

    #[serde(default = "default_glyphs")]
    pub glyphs: GlyphsConfig,

    /// Viewport width at or below which the mobile tuning applies.
    #[serde(default = "default_mobile_breakpoint")]
    pub mobile_breakpoint: f32,

    /// Resize coalescing window, milliseconds.
    #[serde(default = "default_resize_debounce_ms")]
    pub resize_debounce_ms: u32,

    #[serde(default)]
    pub reduced_motion: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Camera distance from the z=0 plane. Must match the scene camera.
    pub z: f32,
    /// Vertical field of view, degrees. Must match the scene camera.
    pub fov_deg: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StarfieldConfig {
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Exponential approach factor per frame.
    pub smoothing: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CubesConfig {
    /// Cube rows; each row holds a left and a right cube.
    pub rows: usize,
    pub orbit_turns: f32,
    pub orbit_turns_mobile: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GlyphsConfig {
    /// Total heading glyph count.
    pub count: usize,
    /// Index range of the name glyphs, which never scatter.
    pub name_start: usize,
    pub name_end: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: default_camera(),
            starfield: default_starfield(),
            scroll: default_scroll(),
            cubes: default_cubes(),
            glyphs: default_glyphs(),
            mobile_breakpoint: default_mobile_breakpoint(),
            resize_debounce_ms: default_resize_debounce_ms(),
            reduced_motion: false,
        }
    }
}

fn default_camera() -> CameraConfig {
    CameraConfig {
        z: 5.0,
        fov_deg: 50.0,
    }
}

fn default_starfield() -> StarfieldConfig {
    StarfieldConfig { count: 220 }
}

fn default_scroll() -> ScrollConfig {
    ScrollConfig { smoothing: 0.1 }
}

fn default_cubes() -> CubesConfig {
    CubesConfig {
        rows: 6,
        orbit_turns: 1.6,
        orbit_turns_mobile: 1.2,
    }
}

fn default_glyphs() -> GlyphsConfig {
    // "Hi, I'm " + "Mani" + "coding EXPERIENCES"
    GlyphsConfig {
        count: 30,
        name_start: 8,
        name_end: 12,
    }
}

fn default_mobile_breakpoint() -> f32 {
    768.0
}

fn default_resize_debounce_ms() -> u32 {
    100
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        let config_path = config_dir.join("nocturne").join("config.toml");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        let config_dir = config_dir.join("nocturne");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)?;

        Ok(())
    }
}
