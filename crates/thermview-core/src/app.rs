//! Application controller tying input, menu, settings and hardware together.

use core::fmt::Debug;

use heapless::Vec;
use log::{debug, info, warn};

use crate::{
    compositor::{ComposeError, Compositor, OverlayRenderer},
    image::{GrayImage, Image},
    input::{InputEvent, InputProvider},
    menu::{MenuCommand, MenuContext, MenuNavigator, MenuTree},
    palette::PaletteProvider,
    settings::{
        HardwareSink, RestoreReport, SettingChange, SettingKey, SettingsBackend, SettingsStore,
    },
};

/// Upper bound on input events applied between two frames.
pub const MAX_EVENTS_PER_TICK: usize = 16;

/// Menu commands as carried out by the app.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AppCommand {
    Saved,
    SaveFailed,
    DefaultsRestored,
    /// The sensor stream must be re-initialised by the caller.
    ResyncRequested,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TickResult {
    pub events: usize,
    pub commands: Vec<AppCommand, MAX_EVENTS_PER_TICK>,
}

impl TickResult {
    pub fn resync_requested(&self) -> bool {
        self.commands.contains(&AppCommand::ResyncRequested)
    }
}

pub struct ThermalApp<IN, HW, P> {
    input: IN,
    hardware: HW,
    store: SettingsStore,
    menu: MenuNavigator,
    palettes: P,
    fps: Option<f32>,
    last_frame_ms: Option<u64>,
}

impl<IN, HW, P> ThermalApp<IN, HW, P>
where
    IN: InputProvider,
    IN::Error: Debug,
    HW: HardwareSink,
    HW::Error: Debug,
    P: PaletteProvider,
{
    pub fn new(tree: MenuTree, input: IN, hardware: HW, palettes: P) -> Self {
        Self {
            input,
            hardware,
            store: SettingsStore::new(),
            menu: MenuNavigator::new(tree),
            palettes,
            fps: None,
            last_frame_ms: None,
        }
    }

    /// Loads persisted settings and pushes every hooked value to the sensor.
    pub fn start<B>(&mut self, backend: &mut B) -> RestoreReport
    where
        B: SettingsBackend,
        B::Error: Debug,
    {
        let report = match backend.load() {
            Ok(Some(snapshot)) => {
                let report = self.store.restore(&snapshot);
                info!(
                    "app: settings restored applied={} rejected={}",
                    report.applied.len(),
                    report.rejected.len()
                );
                report
            }
            Ok(None) => {
                info!("app: no saved settings, using defaults");
                RestoreReport::default()
            }
            Err(err) => {
                warn!("app: settings load failed err={:?}", err);
                RestoreReport::default()
            }
        };

        for key in SettingKey::ALL {
            let change = self.store.notification(key);
            self.dispatch(&change);
        }
        report
    }

    /// Applies every pending input event, one at a time.
    pub fn process_inputs<B>(&mut self, backend: &mut B) -> TickResult
    where
        B: SettingsBackend,
        B::Error: Debug,
    {
        let mut result = TickResult::default();

        for _ in 0..MAX_EVENTS_PER_TICK {
            let event = match self.input.poll_event() {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(err) => {
                    warn!("app: input poll failed err={:?}", err);
                    break;
                }
            };

            result.events += 1;
            if let Some(command) = self.handle_event(event, backend) {
                // At most one command per event, so this never overflows.
                let _ = result.commands.push(command);
            }
        }

        result
    }

    fn handle_event<B>(&mut self, event: InputEvent, backend: &mut B) -> Option<AppCommand>
    where
        B: SettingsBackend,
        B::Error: Debug,
    {
        let outcome = self.menu.apply(event, &mut self.store);
        if let Some(change) = outcome.change {
            self.dispatch(&change);
        }
        outcome
            .command
            .map(|command| self.run_command(command, backend))
    }

    fn run_command<B>(&mut self, command: MenuCommand, backend: &mut B) -> AppCommand
    where
        B: SettingsBackend,
        B::Error: Debug,
    {
        match command {
            MenuCommand::Save => match backend.save(&self.store.snapshot()) {
                Ok(()) => {
                    info!("app: settings saved");
                    AppCommand::Saved
                }
                Err(err) => {
                    warn!("app: settings save failed err={:?}", err);
                    AppCommand::SaveFailed
                }
            },
            MenuCommand::RestoreDefaults => {
                for change in self.store.reset_to_defaults() {
                    self.dispatch(&change);
                }
                AppCommand::DefaultsRestored
            }
            MenuCommand::ResyncSensor => {
                debug!("app: sensor resync requested");
                AppCommand::ResyncRequested
            }
        }
    }

    fn dispatch(&mut self, change: &SettingChange) {
        let Some(hook) = change.hook else {
            return;
        };
        if let Err(err) = self.hardware.apply(hook, change.value) {
            warn!(
                "app: hardware apply failed hook={:?} value={:?} err={:?}",
                hook, change.value, err
            );
        }
    }

    /// Marks a frame boundary; also called when a read fails.
    pub fn record_frame(&mut self, now_ms: u64) {
        if let Some(last) = self.last_frame_ms {
            let dt = now_ms.saturating_sub(last);
            if dt > 0 {
                self.fps = Some(1_000.0 / dt as f32);
            }
        }
        self.last_frame_ms = Some(now_ms);
    }

    pub fn fps(&self) -> Option<f32> {
        self.fps
    }

    pub fn compose<'c, R>(
        &self,
        compositor: &'c mut Compositor,
        frame: &GrayImage,
        renderer: &mut R,
    ) -> Result<&'c Image, ComposeError<R::Error>>
    where
        R: OverlayRenderer,
    {
        let view = self
            .menu
            .view(&self.store, &MenuContext { fps: self.fps });
        compositor.compose(
            frame,
            self.palettes.palette(self.store.palette_id()),
            self.store.viewport_params(),
            view.as_ref(),
            renderer,
        )
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn menu(&self) -> &MenuNavigator {
        &self.menu
    }

    pub fn input(&self) -> &IN {
        &self.input
    }

    pub fn hardware(&self) -> &HW {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut HW {
        &mut self.hardware
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::{
        compositor::CompositorConfig,
        frame::SENSOR_SIZE,
        image::{Rgb, Size},
        input::{InputEvent::*, mock::ScriptedInput},
        menu::MenuView,
        palette::{BuiltinPalettes, Palette, PaletteId},
        settings::{ChangeValue, HardwareHook, SettingsSnapshot},
    };

    #[derive(Default)]
    struct MemoryBackend {
        saved: Option<SettingsSnapshot>,
        fail: bool,
    }

    impl SettingsBackend for MemoryBackend {
        type Error = &'static str;

        fn load(&mut self) -> Result<Option<SettingsSnapshot>, Self::Error> {
            if self.fail {
                return Err("io");
            }
            Ok(self.saved.clone())
        }

        fn save(&mut self, snapshot: &SettingsSnapshot) -> Result<(), Self::Error> {
            if self.fail {
                return Err("io");
            }
            self.saved = Some(snapshot.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        applied: std::vec::Vec<(HardwareHook, ChangeValue)>,
    }

    impl HardwareSink for RecordingSink {
        type Error = ();

        fn apply(&mut self, hook: HardwareHook, value: ChangeValue) -> Result<(), Self::Error> {
            self.applied.push((hook, value));
            Ok(())
        }
    }

    struct Blank;

    impl OverlayRenderer for Blank {
        type Error = ();

        fn render(&mut self, _: &mut Image, _: &MenuView) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    type TestApp<'a, P = BuiltinPalettes> = ThermalApp<ScriptedInput<'a>, RecordingSink, P>;

    fn app_with<P: PaletteProvider>(events: &[InputEvent], palettes: P) -> TestApp<'_, P> {
        ThermalApp::new(
            MenuTree::standard().unwrap(),
            ScriptedInput::new(events),
            RecordingSink::default(),
            palettes,
        )
    }

    fn app(events: &[InputEvent]) -> TestApp<'_> {
        app_with(events, BuiltinPalettes::new())
    }

    /// Hands out one palette for every id and remembers the last id asked for.
    struct SinglePalette {
        palette: Palette,
        requested: Cell<Option<PaletteId>>,
    }

    impl PaletteProvider for SinglePalette {
        fn palette(&self, id: PaletteId) -> &Palette {
            self.requested.set(Some(id));
            &self.palette
        }
    }

    #[test]
    fn start_without_saved_state_syncs_defaults() {
        let mut app = app(&[]);
        let report = app.start(&mut MemoryBackend::default());

        assert!(report.applied.is_empty());
        assert_eq!(
            app.hardware().applied,
            [
                (HardwareHook::Brightness, ChangeValue::Number(30.0)),
                (HardwareHook::Contrast, ChangeValue::Number(100.0)),
                (
                    HardwareHook::Scene,
                    ChangeValue::Option {
                        index: 0,
                        name: "LowHighlight"
                    }
                ),
            ]
        );
    }

    #[test]
    fn start_keeps_defaults_when_loading_fails() {
        let mut app = app(&[]);
        let mut backend = MemoryBackend {
            fail: true,
            ..MemoryBackend::default()
        };

        let report = app.start(&mut backend);

        assert!(report.applied.is_empty());
        assert_eq!(app.store(), &SettingsStore::new());
        assert_eq!(app.hardware().applied.len(), 3);
    }

    #[test]
    fn start_adopts_valid_entries_only() {
        let mut snapshot = SettingsSnapshot::new();
        snapshot.push_number("brightness", 75.0).unwrap();
        snapshot.push_number("contrast", 101.0).unwrap();
        let mut backend = MemoryBackend {
            saved: Some(snapshot),
            fail: false,
        };
        let mut app = app(&[]);

        let report = app.start(&mut backend);

        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(
            app.hardware().applied[..2],
            [
                (HardwareHook::Brightness, ChangeValue::Number(75.0)),
                (HardwareHook::Contrast, ChangeValue::Number(100.0)),
            ]
        );
    }

    #[test]
    fn editing_forwards_hooked_changes() {
        // Open menu, Image Settings, edit Brightness, two steps up.
        let events = [Press, Press, Press, RotateCw, RotateCw];
        let mut app = app(&events);
        let mut backend = MemoryBackend::default();

        let tick = app.process_inputs(&mut backend);

        assert_eq!(tick.events, events.len());
        assert!(tick.commands.is_empty());
        assert_eq!(
            app.hardware().applied,
            [
                (HardwareHook::Brightness, ChangeValue::Number(31.0)),
                (HardwareHook::Brightness, ChangeValue::Number(32.0)),
            ]
        );
    }

    #[test]
    fn unhooked_changes_stay_local() {
        // Root "Color" selector.
        let events = [Press, RotateCw, RotateCw, RotateCw, Press];
        let mut app = app(&events);

        app.process_inputs(&mut MemoryBackend::default());

        assert!(app.hardware().applied.is_empty());
        assert_eq!(app.store().palette_id(), crate::palette::PaletteId::BlackHot);
    }

    #[test]
    fn save_and_restore_commands() {
        // Store -> Save, then Restore.
        let events = [Press, RotateCw, RotateCw, Press, Press, RotateCw, Press];
        let mut app = app(&events);
        let mut backend = MemoryBackend::default();

        let tick = app.process_inputs(&mut backend);

        assert_eq!(
            tick.commands.as_slice(),
            &[AppCommand::Saved, AppCommand::DefaultsRestored]
        );
        assert_eq!(backend.saved, Some(SettingsStore::new().snapshot()));
        assert_eq!(app.hardware().applied.len(), 3);
    }

    #[test]
    fn failed_save_is_reported() {
        let events = [Press, RotateCw, RotateCw, Press, Press];
        let mut app = app(&events);
        let mut backend = MemoryBackend {
            fail: true,
            ..MemoryBackend::default()
        };

        let tick = app.process_inputs(&mut backend);

        assert_eq!(tick.commands.as_slice(), &[AppCommand::SaveFailed]);
    }

    #[test]
    fn fps_entry_requests_resync() {
        let events = [Press, RotateCcw, RotateCcw, Press];
        let mut app = app(&events);

        let tick = app.process_inputs(&mut MemoryBackend::default());

        assert!(tick.resync_requested());
    }

    #[test]
    fn frame_rate_is_instantaneous() {
        let mut app = app(&[]);

        app.record_frame(1_000);
        assert_eq!(app.fps(), None);

        app.record_frame(1_040);
        assert_eq!(app.fps(), Some(25.0));

        app.record_frame(1_040);
        assert_eq!(app.fps(), Some(25.0));

        app.record_frame(1_140);
        assert_eq!(app.fps(), Some(10.0));
    }

    #[test]
    fn compose_overlays_menu_only_when_visible() {
        let frame = GrayImage::new(SENSOR_SIZE).unwrap();
        let mut compositor = Compositor::new(CompositorConfig::default()).unwrap();

        let hidden = app(&[]);
        let canvas = hidden.compose(&mut compositor, &frame, &mut Blank).unwrap();
        assert_eq!(canvas.pixel(0, 0), Some(Rgb::BLACK));

        let events = [Press];
        let mut shown = app(&events);
        shown.process_inputs(&mut MemoryBackend::default());
        let canvas = shown.compose(&mut compositor, &frame, &mut Blank).unwrap();
        assert_eq!(canvas.size(), CompositorConfig::default().canvas);
        assert_eq!(canvas.pixel(0, 0), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(319, 239), Some(Rgb::WHITE));
    }

    #[test]
    fn compose_uses_the_given_palette_provider() {
        const GREEN: Rgb = Rgb::new(0, 255, 0);
        let palettes = SinglePalette {
            palette: Palette::from_fn(|_| GREEN),
            requested: Cell::new(None),
        };
        // Root "Color" selector.
        let events = [Press, RotateCw, RotateCw, RotateCw, Press];
        let mut app = app_with(&events, palettes);
        app.process_inputs(&mut MemoryBackend::default());

        let frame = GrayImage::new(Size::new(4, 3)).unwrap();
        let mut compositor = Compositor::new(
            CompositorConfig::default()
                .with_canvas(Size::new(8, 6))
                .with_source(Size::new(4, 3))
                .with_menu_size(Size::new(4, 2))
                .with_menu_origin(1, 1),
        )
        .unwrap();
        let canvas = app.compose(&mut compositor, &frame, &mut Blank).unwrap();

        assert_eq!(canvas.pixel(7, 5), Some(GREEN));
        assert_eq!(app.palettes.requested.get(), Some(PaletteId::BlackHot));
    }
}
