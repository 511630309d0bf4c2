use std::path::PathBuf;

use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Near clip plane of the scene camera.
pub const Z_NEAR: f32 = 0.1;
/// Far clip plane of the scene camera.
pub const Z_FAR: f32 = 100.0;

/// Post-processing effect selector: no effect.
pub const EFFECT_NONE: i32 = 0;
/// Post-processing effect selector: color inversion.
pub const EFFECT_INVERT: i32 = 1;
/// Post-processing effect selector: 3x3 convolution kernel.
pub const EFFECT_KERNEL: i32 = 2;

/// Compiled-in configuration, optionally overridden by a `settings.json`
/// next to the binary. There are no CLI flags; a missing or broken file
/// falls back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window_width: u32,
    pub window_height: u32,

    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// World units moved per frame while a movement key is held.
    pub move_speed: f32,
    /// Radians turned per frame while a look key is held.
    pub look_speed: f32,

    /// Ground grid dimensions; `grid_width * grid_depth` cube instances.
    pub grid_width: u32,
    pub grid_depth: u32,
    pub grid_spacing: f32,

    pub mesh_path: PathBuf,
    pub mesh_texture: PathBuf,
    pub ground_texture: PathBuf,
    /// Linear filtering for both textures when set; nearest otherwise.
    pub anti_alias: bool,

    /// Optional soundtrack, looped from startup when set.
    pub music: Option<PathBuf>,

    /// One of the `EFFECT_*` selectors.
    pub post_effect: i32,
    /// Blend factor between the raw scene and the kernel result.
    pub post_strength: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 70.0,
            move_speed: 0.125,
            look_speed: 0.0625,
            grid_width: 64,
            grid_depth: 64,
            grid_spacing: 2.0,
            mesh_path: PathBuf::from("assets/obj/cube.obj"),
            mesh_texture: PathBuf::from("assets/tex/crate.png"),
            ground_texture: PathBuf::from("assets/tex/grass.png"),
            anti_alias: false,
            music: None,
            post_effect: EFFECT_KERNEL,
            post_strength: 1.0,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
                Ok(settings) => {
                    info!("loaded settings from {}", path.display());
                    settings.validated()
                }
                Err(err) => {
                    warn!(
                        "failed to parse {} ({err}); using default settings",
                        path.display()
                    );
                    Settings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(err) => {
                warn!(
                    "failed to read {} ({err}); using default settings",
                    path.display()
                );
                Settings::default()
            }
        }
    }

    fn validated(mut self) -> Self {
        if self.grid_width == 0 || self.grid_depth == 0 {
            warn!(
                "grid dimensions {}x{} clamped to 1x1",
                self.grid_width, self.grid_depth
            );
            self.grid_width = self.grid_width.max(1);
            self.grid_depth = self.grid_depth.max(1);
        }
        if !(EFFECT_NONE..=EFFECT_KERNEL).contains(&self.post_effect) {
            warn!("unknown post effect {}; disabling", self.post_effect);
            self.post_effect = EFFECT_NONE;
        }
        self
    }
}
