use std::{
    env,
    io::Write,
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, anyhow};
use fb565::{FbPanel, PixelOrder};
use log::{info, warn};
use thermview_core::{
    app::ThermalApp,
    compositor::{Compositor, CompositorConfig},
    frame::{FrameSource, SENSOR_SIZE},
    image::Size,
    menu::MenuTree,
    palette::BuiltinPalettes,
};
use thermview_hal::{
    render::MenuRenderer,
    storage::settings_record::{RECORD_CAPACITY, StorageSettingsBackend},
};

use fbdev::{FbDevice, FbGeometry};
use file_storage::FileStorage;
use hardware::LogHardware;
use keyboard::KeyboardInput;
use terminal::TerminalGuard;
use video::YuyvSource;

#[path = "main/fbdev.rs"]
mod fbdev;
#[path = "main/file_storage.rs"]
mod file_storage;
#[path = "main/hardware.rs"]
mod hardware;
#[path = "main/keyboard.rs"]
mod keyboard;
#[path = "main/terminal.rs"]
mod terminal;
#[path = "main/video.rs"]
mod video;

const TITLE: &str = "thermview";
const SETTINGS_OFFSET: u32 = 0;
const READ_RETRY_BACKOFF_MS: u64 = 50;

/// Runtime configuration, overridable through `THERMVIEW_*` variables.
#[derive(Debug, Clone)]
struct RunnerConfig {
    video: PathBuf,
    fb_name: String,
    store: PathBuf,
    mirror_menu: bool,
    pixel_order: PixelOrder,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            video: PathBuf::from("/dev/video0"),
            fb_name: String::from("fb0"),
            store: PathBuf::from("store.bin"),
            mirror_menu: true,
            pixel_order: PixelOrder::Bgr,
        }
    }
}

impl RunnerConfig {
    fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(video) = env::var("THERMVIEW_VIDEO") {
            config.video = PathBuf::from(video);
        }
        if let Ok(fb_name) = env::var("THERMVIEW_FB") {
            config.fb_name = fb_name;
        }
        if let Ok(store) = env::var("THERMVIEW_STORE") {
            config.store = PathBuf::from(store);
        }
        if let Ok(mirror) = env::var("THERMVIEW_MIRROR_MENU") {
            config.mirror_menu = parse_flag(&mirror)
                .with_context(|| format!("THERMVIEW_MIRROR_MENU={mirror:?}"))?;
        }
        if let Ok(order) = env::var("THERMVIEW_PIXEL_ORDER") {
            config.pixel_order = PixelOrder::from_name(&order)
                .with_context(|| format!("THERMVIEW_PIXEL_ORDER={order:?}, expected rgb or bgr"))?;
        }

        Ok(config)
    }

    fn fb_device(&self) -> PathBuf {
        PathBuf::from("/dev").join(&self.fb_name)
    }

    fn fb_sysfs(&self) -> PathBuf {
        PathBuf::from("/sys/class/graphics").join(&self.fb_name)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn init_logger() {
    // Raw mode disables the implicit carriage return.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{:<5} {}: {}\r",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn main() -> Result<()> {
    init_logger();
    let config = RunnerConfig::from_env()?;
    info!("{TITLE}: starting config={config:?}");

    let geometry = FbGeometry::from_sysfs(&config.fb_sysfs())?;
    let panel_config = fb565::Config::new(geometry.width, geometry.height)
        .with_stride(geometry.stride());
    let mut panel = FbPanel::new(FbDevice::open(&config.fb_device())?, panel_config)
        .map_err(|err| anyhow!("framebuffer geometry rejected: {err:?}"))?;
    let mut frame_buffer = panel.frame_buffer(config.pixel_order);

    let mut video = YuyvSource::open(&config.video, SENSOR_SIZE)?;
    let mut compositor = Compositor::new(
        CompositorConfig::default()
            .with_canvas(Size::new(geometry.width as u32, geometry.height as u32))
            .with_source(video.frame_size())
            .with_mirror_menu(config.mirror_menu),
    )
    .map_err(|err| anyhow!("compositor setup failed: {err:?}"))?;
    let mut renderer = MenuRenderer::default();

    let storage = FileStorage::open(&config.store, RECORD_CAPACITY)?;
    let mut backend = StorageSettingsBackend::new(storage, SETTINGS_OFFSET)
        .map_err(|err| anyhow!("settings store rejected: {err:?}"))?;

    let tree = MenuTree::standard().map_err(|err| anyhow!("menu layout invalid: {err:?}"))?;
    let mut app = ThermalApp::new(
        tree,
        KeyboardInput::default(),
        LogHardware::default(),
        BuiltinPalettes::new(),
    );

    let _terminal = TerminalGuard::enter().context("entering raw terminal mode")?;
    let report = app.start(&mut backend);
    info!(
        "{TITLE}: ready applied={} rejected={}",
        report.applied.len(),
        report.rejected.len()
    );

    let started = Instant::now();
    loop {
        let tick = app.process_inputs(&mut backend);
        if app.input().quit_requested() {
            break;
        }
        if tick.resync_requested()
            && let Err(err) = video.resync()
        {
            warn!("{TITLE}: sensor resync failed err={err:#}");
        }

        let frame = video.read_frame();
        app.record_frame(started.elapsed().as_millis() as u64);
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                warn!("{TITLE}: frame skipped err={err}");
                thread::sleep(Duration::from_millis(READ_RETRY_BACKOFF_MS));
                continue;
            }
        };

        let canvas = app
            .compose(&mut compositor, &frame, &mut renderer)
            .map_err(|err| anyhow!("compose failed: {err:?}"))?;
        let size = canvas.size();
        frame_buffer.blit_rgb888(
            canvas.as_bytes(),
            size.width as usize,
            size.height as usize,
        );
        panel
            .flush_full(&frame_buffer)
            .map_err(|err| anyhow!("framebuffer write failed: {err:?}"))?;
    }

    info!(
        "{TITLE}: exit hardware_writes={}",
        app.hardware().applied()
    );
    Ok(())
}
