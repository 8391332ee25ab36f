//! Tunable device settings, change notifications and persistence traits.

use core::fmt;

use heapless::{String, Vec};
use log::{debug, warn};

use crate::{palette::PaletteId, viewport::ViewportParams};

/// Number of entries in the fixed key set.
pub const SETTING_COUNT: usize = 7;
/// Upper bound on entries a persisted snapshot may carry.
pub const MAX_SNAPSHOT_ENTRIES: usize = 16;
/// Longest setting name a snapshot entry can hold.
pub const NAME_CAPACITY: usize = 16;
/// Longest selector option a snapshot entry can hold.
pub const OPTION_CAPACITY: usize = 16;

pub type SettingChanges = Vec<SettingChange, SETTING_COUNT>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SettingKey {
    Brightness,
    Contrast,
    Scene,
    XOffset,
    YOffset,
    Scale,
    Color,
}

impl SettingKey {
    pub const ALL: [SettingKey; SETTING_COUNT] = [
        SettingKey::Brightness,
        SettingKey::Contrast,
        SettingKey::Scene,
        SettingKey::XOffset,
        SettingKey::YOffset,
        SettingKey::Scale,
        SettingKey::Color,
    ];

    /// Persisted name of the key.
    pub const fn name(self) -> &'static str {
        match self {
            SettingKey::Brightness => "brightness",
            SettingKey::Contrast => "contrast",
            SettingKey::Scene => "scene",
            SettingKey::XOffset => "x_offset",
            SettingKey::YOffset => "y_offset",
            SettingKey::Scale => "scale",
            SettingKey::Color => "color",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }

    /// Hardware control this key is wired to, if any.
    pub const fn hook(self) -> Option<HardwareHook> {
        match self {
            SettingKey::Brightness => Some(HardwareHook::Brightness),
            SettingKey::Contrast => Some(HardwareHook::Contrast),
            SettingKey::Scene => Some(HardwareHook::Scene),
            _ => None,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Sensor-side control a setting change must be forwarded to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HardwareHook {
    Brightness,
    Contrast,
    Scene,
}

/// Fixed-point numeric setting.
///
/// The value is `raw / divisor`; `min`, `max` and `step` are in raw units,
/// so stepping up and back down is exact.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AdjustableValue {
    raw: i32,
    min: i32,
    max: i32,
    step: i32,
    divisor: i32,
}

impl AdjustableValue {
    /// Integer setting with a step of one.
    pub const fn integer(value: i32, min: i32, max: i32) -> Self {
        Self::fixed(value, min, max, 1, 1)
    }

    /// `raw`, `min`, `max` and `step` are scaled by `divisor`.
    ///
    /// Bounds given in the wrong order are swapped and `raw` is clamped.
    pub const fn fixed(raw: i32, min: i32, max: i32, step: i32, divisor: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let divisor = if divisor > 0 { divisor } else { 1 };
        let step = if step > 0 { step } else { 1 };
        Self {
            raw: clamp_i32(raw, min, max),
            min,
            max,
            step,
            divisor,
        }
    }

    pub const fn raw(&self) -> i32 {
        self.raw
    }

    pub const fn raw_min(&self) -> i32 {
        self.min
    }

    pub const fn raw_max(&self) -> i32 {
        self.max
    }

    pub const fn raw_step(&self) -> i32 {
        self.step
    }

    pub const fn divisor(&self) -> i32 {
        self.divisor
    }

    pub fn value(&self) -> f32 {
        self.raw as f32 / self.divisor as f32
    }

    pub fn min(&self) -> f32 {
        self.min as f32 / self.divisor as f32
    }

    pub fn max(&self) -> f32 {
        self.max as f32 / self.divisor as f32
    }

    /// Decimal places implied by the divisor.
    pub const fn precision(&self) -> usize {
        let mut digits = 0;
        let mut d = self.divisor;
        while d >= 10 {
            d /= 10;
            digits += 1;
        }
        digits
    }

    /// Moves the value by `steps` steps, clamping at the bounds.
    pub fn adjust(&mut self, steps: i32) {
        let delta = i64::from(steps) * i64::from(self.step);
        let next = (i64::from(self.raw) + delta).clamp(i64::from(self.min), i64::from(self.max));
        self.raw = next as i32;
    }

    /// Adopts `value` when it is finite and within bounds.
    pub fn try_set(&mut self, value: f32) -> Result<(), RejectReason> {
        if !value.is_finite() {
            return Err(RejectReason::NotFinite);
        }

        let scaled = f64::from(value) * f64::from(self.divisor);
        let rounded = if scaled >= 0.0 {
            (scaled + 0.5) as i64
        } else {
            (scaled - 0.5) as i64
        };
        if rounded < i64::from(self.min) || rounded > i64::from(self.max) {
            return Err(RejectReason::OutOfRange);
        }

        self.raw = rounded as i32;
        Ok(())
    }
}

impl fmt::Display for AdjustableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.precision();
        if precision == 0 {
            return write!(f, "{}", self.raw / self.divisor);
        }

        let magnitude = self.raw.unsigned_abs();
        let divisor = self.divisor.unsigned_abs();
        let sign = if self.raw < 0 { "-" } else { "" };
        write!(
            f,
            "{sign}{}.{:0width$}",
            magnitude / divisor,
            magnitude % divisor,
            width = precision
        )
    }
}

const fn clamp_i32(v: i32, min: i32, max: i32) -> i32 {
    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

/// Enumerated setting cycling through a fixed list of options.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SelectorValue {
    options: &'static [&'static str],
    index: usize,
}

impl SelectorValue {
    /// An out-of-range `index` selects the first option.
    pub const fn new<const N: usize>(options: &'static [&'static str; N], index: usize) -> Self {
        const { assert!(N > 0, "a selector needs at least one option") };
        Self {
            options,
            index: if index < N { index } else { 0 },
        }
    }

    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &'static str {
        self.options[self.index]
    }

    pub const fn options(&self) -> &'static [&'static str] {
        self.options
    }

    /// Selects the next option, wrapping after the last one.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.options.len();
    }

    /// Selects the option called `name`.
    pub fn select(&mut self, name: &str) -> Result<(), RejectReason> {
        match self.options.iter().position(|option| *option == name) {
            Some(index) => {
                self.index = index;
                Ok(())
            }
            None => Err(RejectReason::UnknownOption),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Setting {
    Adjustable(AdjustableValue),
    Selector(SelectorValue),
}

impl Setting {
    fn change_value(&self) -> ChangeValue {
        match self {
            Setting::Adjustable(value) => ChangeValue::Number(value.value()),
            Setting::Selector(selector) => ChangeValue::Option {
                index: selector.index(),
                name: selector.current(),
            },
        }
    }

    fn snapshot_value(&self) -> SnapshotValue {
        match self {
            Setting::Adjustable(value) => SnapshotValue::Number(value.value()),
            Setting::Selector(selector) => {
                let mut name = String::new();
                // Built-in option names are shorter than the capacity.
                let _ = name.push_str(selector.current());
                SnapshotValue::Option(name)
            }
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Adjustable(value) => fmt::Display::fmt(value, f),
            Setting::Selector(selector) => f.write_str(selector.current()),
        }
    }
}

/// New value carried by a [`SettingChange`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChangeValue {
    Number(f32),
    Option { index: usize, name: &'static str },
}

/// Emitted by every successful mutation of the store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SettingChange {
    pub key: SettingKey,
    pub value: ChangeValue,
    pub hook: Option<HardwareHook>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SettingsError {
    UnknownKey,
    NotAdjustable(SettingKey),
    NotSelector(SettingKey),
}

/// Why a persisted entry was not adopted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RejectReason {
    WrongType,
    OutOfRange,
    NotFinite,
    UnknownOption,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SnapshotValue {
    Number(f32),
    Option(String<OPTION_CAPACITY>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotEntry {
    pub name: String<NAME_CAPACITY>,
    pub value: SnapshotValue,
}

/// Snapshot capacity exhausted or a name too long to store.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SnapshotFull;

/// Name/value pairs exchanged with a [`SettingsBackend`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsSnapshot {
    entries: Vec<SnapshotEntry, MAX_SNAPSHOT_ENTRIES>,
}

impl SettingsSnapshot {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &str, value: SnapshotValue) -> Result<(), SnapshotFull> {
        let mut owned = String::new();
        owned.push_str(name).map_err(|_| SnapshotFull)?;
        self.entries
            .push(SnapshotEntry { name: owned, value })
            .map_err(|_| SnapshotFull)
    }

    pub fn push_number(&mut self, name: &str, value: f32) -> Result<(), SnapshotFull> {
        self.push(name, SnapshotValue::Number(value))
    }

    pub fn push_option(&mut self, name: &str, option: &str) -> Result<(), SnapshotFull> {
        let mut owned = String::new();
        owned.push_str(option).map_err(|_| SnapshotFull)?;
        self.push(name, SnapshotValue::Option(owned))
    }

    /// First entry named `name`.
    pub fn get(&self, name: &str) -> Option<&SnapshotValue> {
        self.entries
            .iter()
            .find(|entry| entry.name.as_str() == name)
            .map(|entry| &entry.value)
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of [`SettingsStore::restore`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RestoreReport {
    pub applied: SettingChanges,
    pub rejected: Vec<(SettingKey, RejectReason), SETTING_COUNT>,
}

/// Scene modes understood by the sensor core.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SceneMode {
    LowHighlight,
    Linear,
    LowContrast,
    General,
    HighContrast,
    Highlight,
    Outline,
}

impl SceneMode {
    pub const ALL: [SceneMode; 7] = [
        SceneMode::LowHighlight,
        SceneMode::Linear,
        SceneMode::LowContrast,
        SceneMode::General,
        SceneMode::HighContrast,
        SceneMode::Highlight,
        SceneMode::Outline,
    ];

    /// Option names shown in the menu, index-aligned with [`SceneMode::ALL`].
    pub const NAMES: [&'static str; 7] = [
        "LowHighlight",
        "Linear",
        "LowContrast",
        "General",
        "HighContrast",
        "Highlight",
        "Outline",
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub const fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }
}

/// Settings persistence backend.
pub trait SettingsBackend {
    type Error;

    /// `Ok(None)` when nothing has been saved yet.
    fn load(&mut self) -> Result<Option<SettingsSnapshot>, Self::Error>;
    fn save(&mut self, snapshot: &SettingsSnapshot) -> Result<(), Self::Error>;
}

/// Applies hooked setting changes to the sensor.
pub trait HardwareSink {
    type Error;

    fn apply(&mut self, hook: HardwareHook, value: ChangeValue) -> Result<(), Self::Error>;
}

/// Sink for setups without controllable sensor hardware.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHardware;

impl HardwareSink for NoHardware {
    type Error = core::convert::Infallible;

    fn apply(&mut self, _hook: HardwareHook, _value: ChangeValue) -> Result<(), Self::Error> {
        Ok(())
    }
}

const SCALE_DIVISOR: i32 = 100;

fn default_setting(key: SettingKey) -> Setting {
    match key {
        SettingKey::Brightness => Setting::Adjustable(AdjustableValue::integer(30, 0, 100)),
        SettingKey::Contrast => Setting::Adjustable(AdjustableValue::integer(100, 0, 100)),
        SettingKey::Scene => Setting::Selector(SelectorValue::new(&SceneMode::NAMES, 0)),
        SettingKey::XOffset => Setting::Adjustable(AdjustableValue::integer(0, -256, 256)),
        SettingKey::YOffset => Setting::Adjustable(AdjustableValue::integer(0, -192, 192)),
        SettingKey::Scale => Setting::Adjustable(AdjustableValue::fixed(
            SCALE_DIVISOR,
            10,
            8 * SCALE_DIVISOR,
            1,
            SCALE_DIVISOR,
        )),
        SettingKey::Color => Setting::Selector(SelectorValue::new(&PaletteId::NAMES, 0)),
    }
}

/// The fixed set of device settings.
#[derive(Clone, Debug, PartialEq)]
pub struct SettingsStore {
    entries: [Setting; SETTING_COUNT],
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            entries: SettingKey::ALL.map(default_setting),
        }
    }

    pub fn get(&self, key: SettingKey) -> &Setting {
        &self.entries[key.index()]
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Setting, SettingsError> {
        SettingKey::from_name(name)
            .map(|key| self.get(key))
            .ok_or(SettingsError::UnknownKey)
    }

    pub fn adjust(&mut self, key: SettingKey, steps: i32) -> Result<SettingChange, SettingsError> {
        let Setting::Adjustable(value) = &mut self.entries[key.index()] else {
            return Err(SettingsError::NotAdjustable(key));
        };
        value.adjust(steps);
        debug!("settings: adjust key={} value={}", key.name(), value);
        Ok(self.notification(key))
    }

    pub fn advance(&mut self, key: SettingKey) -> Result<SettingChange, SettingsError> {
        let Setting::Selector(selector) = &mut self.entries[key.index()] else {
            return Err(SettingsError::NotSelector(key));
        };
        selector.advance();
        debug!(
            "settings: advance key={} option={}",
            key.name(),
            selector.current()
        );
        Ok(self.notification(key))
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        let mut snapshot = SettingsSnapshot::new();
        for key in SettingKey::ALL {
            // SETTING_COUNT < MAX_SNAPSHOT_ENTRIES and every key name fits.
            let _ = snapshot.push(key.name(), self.get(key).snapshot_value());
        }
        snapshot
    }

    /// Adopts every valid entry of `snapshot`.
    ///
    /// Invalid entries are rejected one by one and keep their current
    /// value; names outside the key set are ignored.
    pub fn restore(&mut self, snapshot: &SettingsSnapshot) -> RestoreReport {
        let mut report = RestoreReport::default();

        for key in SettingKey::ALL {
            let Some(stored) = snapshot.get(key.name()) else {
                continue;
            };

            let mut candidate = *self.get(key);
            let outcome = match (&mut candidate, stored) {
                (Setting::Adjustable(value), SnapshotValue::Number(n)) => value.try_set(*n),
                (Setting::Selector(selector), SnapshotValue::Option(name)) => {
                    selector.select(name.as_str())
                }
                _ => Err(RejectReason::WrongType),
            };

            match outcome {
                Ok(()) => {
                    self.entries[key.index()] = candidate;
                    let _ = report.applied.push(self.notification(key));
                }
                Err(reason) => {
                    warn!(
                        "settings: restore rejected key={} reason={:?}",
                        key.name(),
                        reason
                    );
                    let _ = report.rejected.push((key, reason));
                }
            }
        }

        debug!(
            "settings: restore applied={} rejected={}",
            report.applied.len(),
            report.rejected.len()
        );
        report
    }

    /// Restores every entry's startup default, one change per entry.
    pub fn reset_to_defaults(&mut self) -> SettingChanges {
        let mut changes = SettingChanges::new();
        for key in SettingKey::ALL {
            self.entries[key.index()] = default_setting(key);
            let _ = changes.push(self.notification(key));
        }
        debug!("settings: reset to defaults");
        changes
    }

    pub fn viewport_params(&self) -> ViewportParams {
        ViewportParams::new(
            self.adjustable_whole(SettingKey::XOffset),
            self.adjustable_whole(SettingKey::YOffset),
            self.adjustable_value(SettingKey::Scale),
        )
    }

    pub fn palette_id(&self) -> PaletteId {
        PaletteId::ALL
            .get(self.selector_index(SettingKey::Color))
            .copied()
            .unwrap_or(PaletteId::WhiteHot)
    }

    pub fn scene_mode(&self) -> SceneMode {
        SceneMode::from_index(self.selector_index(SettingKey::Scene))
            .unwrap_or(SceneMode::LowHighlight)
    }

    /// Notification describing the current value of `key`.
    pub fn notification(&self, key: SettingKey) -> SettingChange {
        SettingChange {
            key,
            value: self.get(key).change_value(),
            hook: key.hook(),
        }
    }

    fn adjustable_whole(&self, key: SettingKey) -> i32 {
        match self.get(key) {
            Setting::Adjustable(value) => value.raw() / value.divisor(),
            Setting::Selector(_) => 0,
        }
    }

    fn adjustable_value(&self, key: SettingKey) -> f32 {
        match self.get(key) {
            Setting::Adjustable(value) => value.value(),
            Setting::Selector(_) => 1.0,
        }
    }

    fn selector_index(&self, key: SettingKey) -> usize {
        match self.get(key) {
            Setting::Selector(selector) => selector.index(),
            Setting::Adjustable(_) => 0,
        }
    }
}
