/*
 *  config.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, CLI overrides
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::error::DisplayError;
use crate::face::Expression;

pub const DEFAULT_CS_PIN: u32 = 8;
pub const DEFAULT_DC_PIN: u32 = 25;
pub const DEFAULT_RESET_PIN: u32 = 24;
pub const DEFAULT_ROTATION: u16 = 90;
pub const DEFAULT_WIDTH: u32 = 128;
pub const DEFAULT_HEIGHT: u32 = 160;
pub const DEFAULT_SPI_SPEED_HZ: u32 = 24_000_000;
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Panel rotation, applied by remapping canvas coordinates onto the
/// panel's native scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// True when the canvas is the panel turned on its side
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl TryFrom<u16> for Rotation {
    type Error = DisplayError;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(DisplayError::InvalidRotation(other)),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Immutable panel wiring and geometry, fixed once at startup.
///
/// `width` and `height` are the panel's native column and row counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    cs_pin: u32,
    dc_pin: u32,
    reset_pin: u32,
    backlight_pin: Option<u32>,
    rotation: Rotation,
    width: u32,
    height: u32,
    spi_speed_hz: u32,
    gpio_chip: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            cs_pin: DEFAULT_CS_PIN,
            dc_pin: DEFAULT_DC_PIN,
            reset_pin: DEFAULT_RESET_PIN,
            backlight_pin: None,
            rotation: Rotation::Deg90,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            spi_speed_hz: DEFAULT_SPI_SPEED_HZ,
            gpio_chip: DEFAULT_GPIO_CHIP.to_string(),
        }
    }
}

impl DisplayConfig {
    /// Default wiring with the given geometry
    pub fn with_geometry(width: u32, height: u32, rotation: Rotation) -> Result<Self, ConfigError> {
        DisplayOptions {
            width: Some(width),
            height: Some(height),
            rotation: Some(rotation.degrees()),
            ..Default::default()
        }
        .resolve()
    }

    pub fn cs_pin(&self) -> u32 { self.cs_pin }
    pub fn dc_pin(&self) -> u32 { self.dc_pin }
    pub fn reset_pin(&self) -> u32 { self.reset_pin }
    pub fn backlight_pin(&self) -> Option<u32> { self.backlight_pin }
    pub fn rotation(&self) -> Rotation { self.rotation }
    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn spi_speed_hz(&self) -> u32 { self.spi_speed_hz }
    pub fn gpio_chip(&self) -> &str { &self.gpio_chip }

    /// Size of the caller-facing canvas after rotation, as (width, height)
    pub fn canvas_size(&self) -> (u32, u32) {
        if self.rotation.swaps_axes() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Kernel spidev node whose hardware chip-select is the configured CS line
    pub fn spi_device_path(&self) -> String {
        // CE0 is BCM 8, CE1 is BCM 7 on the primary SPI bus
        let ce = if self.cs_pin == 7 { 1 } else { 0 };
        format!("/dev/spidev0.{}", ce)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Real panel on the primary SPI bus
    #[default]
    Spi,
    /// No hardware, bus traffic is recorded and discarded
    Headless,
}

/// The `display` section as written in YAML; every field optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub rotation: Option<u16>,
    pub cs_pin: Option<u32>,
    pub dc_pin: Option<u32>,
    pub reset_pin: Option<u32>,
    pub backlight_pin: Option<u32>,
    pub spi_speed_hz: Option<u32>,
    pub gpio_chip: Option<String>,
    pub backend: Option<BackendKind>,
}

impl DisplayOptions {
    /// Apply defaults and check every invariant of `DisplayConfig`
    pub fn resolve(&self) -> Result<DisplayConfig, ConfigError> {
        let width = self.width.unwrap_or(DEFAULT_WIDTH);
        let height = self.height.unwrap_or(DEFAULT_HEIGHT);
        if width == 0 || height == 0 {
            return Err(ConfigError::Validation("display width/height must be > 0".into()));
        }
        // CASET/RASET carry 16-bit addresses
        if width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(ConfigError::Validation("display width/height must fit in 16 bits".into()));
        }

        let rotation = Rotation::try_from(self.rotation.unwrap_or(DEFAULT_ROTATION))
            .map_err(|_| ConfigError::Validation("display rotation must be 0|90|180|270".into()))?;

        let cs_pin = self.cs_pin.unwrap_or(DEFAULT_CS_PIN);
        if cs_pin != 7 && cs_pin != 8 {
            return Err(ConfigError::Validation(format!(
                "cs_pin {} is not a hardware chip-select (use 8 for CE0 or 7 for CE1)",
                cs_pin
            )));
        }

        let dc_pin = self.dc_pin.unwrap_or(DEFAULT_DC_PIN);
        let reset_pin = self.reset_pin.unwrap_or(DEFAULT_RESET_PIN);
        let mut lines = vec![cs_pin, dc_pin, reset_pin];
        lines.extend(self.backlight_pin);
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != lines.len() {
            return Err(ConfigError::Validation(format!(
                "control lines must be distinct, got {:?}",
                lines
            )));
        }

        let spi_speed_hz = self.spi_speed_hz.unwrap_or(DEFAULT_SPI_SPEED_HZ);
        if spi_speed_hz == 0 {
            return Err(ConfigError::Validation("spi_speed_hz must be > 0".into()));
        }

        Ok(DisplayConfig {
            cs_pin,
            dc_pin,
            reset_pin,
            backlight_pin: self.backlight_pin,
            rotation,
            width,
            height,
            spi_speed_hz,
            gpio_chip: self.gpio_chip.clone().unwrap_or_else(|| DEFAULT_GPIO_CHIP.to_string()),
        })
    }
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// Expression drawn once the panel is ready, "none" to leave it blank
    pub startup_face: Option<String>,
    pub display: Option<DisplayOptions>,
}

impl Config {
    pub fn display_config(&self) -> Result<DisplayConfig, ConfigError> {
        self.display.clone().unwrap_or_default().resolve()
    }

    pub fn backend(&self) -> BackendKind {
        self.display
            .as_ref()
            .and_then(|d| d.backend)
            .unwrap_or_default()
    }

    pub fn startup_face(&self) -> Result<Option<Expression>, ConfigError> {
        match self.startup_face.as_deref() {
            None => Ok(Some(Expression::Neutral)),
            Some("none") => Ok(None),
            Some(name) => name
                .parse::<Expression>()
                .map(Some)
                .map_err(|_| ConfigError::Validation(format!("unknown startup_face '{}'", name))),
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "roboface", version, about = "Robot face display driver")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(long, short = 'v', alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long)]
    pub startup_face: Option<String>,
    #[arg(long)]
    pub display_width: Option<u32>,
    #[arg(long)]
    pub display_height: Option<u32>,
    #[arg(long)]
    pub display_rotation: Option<u16>,
    #[arg(long)]
    pub cs_pin: Option<u32>,
    #[arg(long)]
    pub dc_pin: Option<u32>,
    #[arg(long)]
    pub reset_pin: Option<u32>,
    #[arg(long)]
    pub backlight_pin: Option<u32>,
    /// Run without hardware, discarding bus traffic
    #[arg(long, action = ArgAction::SetTrue)]
    pub headless: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: read YAML, merge CLI overrides, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/roboface/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/roboface.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["roboface.yaml", "config.yaml", "config/roboface.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

pub fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()     { dst.log_level = src.log_level; }
    if src.startup_face.is_some()  { dst.startup_face = src.startup_face; }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayOptions, src: DisplayOptions) {
    if src.width.is_some()          { dst.width = src.width; }
    if src.height.is_some()         { dst.height = src.height; }
    if src.rotation.is_some()       { dst.rotation = src.rotation; }
    if src.cs_pin.is_some()         { dst.cs_pin = src.cs_pin; }
    if src.dc_pin.is_some()         { dst.dc_pin = src.dc_pin; }
    if src.reset_pin.is_some()      { dst.reset_pin = src.reset_pin; }
    if src.backlight_pin.is_some()  { dst.backlight_pin = src.backlight_pin; }
    if src.spi_speed_hz.is_some()   { dst.spi_speed_hz = src.spi_speed_hz; }
    if src.gpio_chip.is_some()      { dst.gpio_chip = src.gpio_chip; }
    if src.backend.is_some()        { dst.backend = src.backend; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()     { cfg.log_level = cli.log_level.clone(); }
    if cli.startup_face.is_some()  { cfg.startup_face = cli.startup_face.clone(); }

    let display = cfg.display.get_or_insert_with(DisplayOptions::default);
    if cli.display_width.is_some()     { display.width = cli.display_width; }
    if cli.display_height.is_some()    { display.height = cli.display_height; }
    if cli.display_rotation.is_some()  { display.rotation = cli.display_rotation; }
    if cli.cs_pin.is_some()            { display.cs_pin = cli.cs_pin; }
    if cli.dc_pin.is_some()            { display.dc_pin = cli.dc_pin; }
    if cli.reset_pin.is_some()         { display.reset_pin = cli.reset_pin; }
    if cli.backlight_pin.is_some()     { display.backlight_pin = cli.backlight_pin; }
    if cli.headless                    { display.backend = Some(BackendKind::Headless); }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    cfg.display_config()?;
    cfg.startup_face()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_wiring() {
        let display = DisplayOptions::default().resolve().unwrap();
        assert_eq!(display.cs_pin(), 8);
        assert_eq!(display.dc_pin(), 25);
        assert_eq!(display.reset_pin(), 24);
        assert_eq!(display.rotation(), Rotation::Deg90);
        assert_eq!((display.width(), display.height()), (128, 160));
        assert_eq!(display.canvas_size(), (160, 128));
        assert_eq!(display.spi_device_path(), "/dev/spidev0.0");
        assert_eq!(display, DisplayConfig::default());
    }

    #[test]
    fn test_rejects_zero_area() {
        let opts = DisplayOptions { width: Some(0), ..Default::default() };
        assert!(matches!(opts.resolve(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_odd_rotation() {
        let opts = DisplayOptions { rotation: Some(45), ..Default::default() };
        assert!(matches!(opts.resolve(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_shared_lines() {
        let opts = DisplayOptions { dc_pin: Some(24), ..Default::default() };
        assert!(opts.resolve().is_err());

        let opts = DisplayOptions { cs_pin: Some(5), ..Default::default() };
        assert!(opts.resolve().is_err());
    }

    #[test]
    fn test_ce1_selects_second_device() {
        let opts = DisplayOptions { cs_pin: Some(7), ..Default::default() };
        assert_eq!(opts.resolve().unwrap().spi_device_path(), "/dev/spidev0.1");
    }

    #[test]
    fn test_yaml_then_cli_precedence() {
        let yaml = "
log_level: debug
startup_face: sleepy
display:
  width: 128
  height: 128
  rotation: 180
  backend: headless
";
        let mut cfg = Config::default();
        merge(&mut cfg, serde_yaml::from_str(yaml).unwrap());

        let cli = Cli { display_rotation: Some(0), ..Default::default() };
        apply_cli_overrides(&mut cfg, &cli);
        validate(&cfg).unwrap();

        let display = cfg.display_config().unwrap();
        assert_eq!(display.rotation(), Rotation::Deg0);
        assert_eq!(display.height(), 128);
        assert_eq!(cfg.backend(), BackendKind::Headless);
        assert_eq!(cfg.startup_face().unwrap(), Some(Expression::Sleepy));
    }

    #[test]
    fn test_startup_face_none_and_invalid() {
        let cfg = Config { startup_face: Some("none".into()), ..Default::default() };
        assert_eq!(cfg.startup_face().unwrap(), None);

        let cfg = Config { startup_face: Some("confused".into()), ..Default::default() };
        assert!(cfg.startup_face().is_err());

        assert_eq!(Config::default().startup_face().unwrap(), Some(Expression::Neutral));
    }
}
