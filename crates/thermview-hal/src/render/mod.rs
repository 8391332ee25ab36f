//! Menu overlay drawn with a monospace font.

use core::convert::Infallible;

use embedded_graphics::{
    Drawable,
    mono_font::{MonoTextStyle, ascii::FONT_10X20},
    pixelcolor::Rgb888,
    prelude::{Point, RgbColor},
    text::{Baseline, Text},
};
use log::trace;
use thermview_core::{compositor::OverlayRenderer, image::Image, menu::MenuView};

#[derive(Debug, Clone, Copy)]
pub struct MenuRendererConfig {
    left: i32,
    first_baseline: i32,
    line_pitch: i32,
    text_color: Rgb888,
    disabled_color: Rgb888,
}

impl Default for MenuRendererConfig {
    fn default() -> Self {
        Self {
            left: 20,
            first_baseline: 40,
            line_pitch: 40,
            text_color: Rgb888::BLACK,
            disabled_color: Rgb888::new(128, 128, 128),
        }
    }
}

impl MenuRendererConfig {
    pub const fn with_left(mut self, left: i32) -> Self {
        self.left = left;
        self
    }

    pub const fn with_line_layout(mut self, first_baseline: i32, line_pitch: i32) -> Self {
        self.first_baseline = first_baseline;
        self.line_pitch = line_pitch;
        self
    }

    pub const fn with_text_color(mut self, text_color: Rgb888) -> Self {
        self.text_color = text_color;
        self
    }

    pub const fn with_disabled_color(mut self, disabled_color: Rgb888) -> Self {
        self.disabled_color = disabled_color;
        self
    }
}

/// One line per node: label, then the selection or editing marker.
#[derive(Debug, Default, Clone, Copy)]
pub struct MenuRenderer {
    config: MenuRendererConfig,
}

impl MenuRenderer {
    pub const fn new(config: MenuRendererConfig) -> Self {
        Self { config }
    }

    fn baseline(&self, line: usize) -> i32 {
        self.config.first_baseline + self.config.line_pitch * line as i32
    }
}

impl OverlayRenderer for MenuRenderer {
    type Error = Infallible;

    fn render(&mut self, surface: &mut Image, view: &MenuView) -> Result<(), Self::Error> {
        for (i, line) in view.lines.iter().enumerate() {
            let color = if line.disabled {
                self.config.disabled_color
            } else {
                self.config.text_color
            };
            let style = MonoTextStyle::new(&FONT_10X20, color);
            let origin = Point::new(self.config.left, self.baseline(i));

            let next = Text::with_baseline(line.text.as_str(), origin, style, Baseline::Alphabetic)
                .draw(surface)?;
            let marker = line.marker();
            if !marker.is_empty() {
                Text::with_baseline(marker, next, style, Baseline::Alphabetic).draw(surface)?;
            }
        }

        trace!(
            "render: menu={} lines={}",
            view.menu.index(),
            view.lines.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use thermview_core::{
        image::{Rgb, Size},
        menu::{MenuContext, MenuNavigator, MenuTree},
        settings::SettingsStore,
    };

    use super::*;

    fn surface() -> Image {
        Image::filled(Size::new(400, 250), Rgb::WHITE).unwrap()
    }

    /// Rows covered by the glyph cells of a line drawn on `baseline`.
    fn text_band(baseline: i32) -> core::ops::RangeInclusive<i32> {
        let top = baseline - FONT_10X20.baseline as i32;
        top..=top + FONT_10X20.character_size.height as i32 - 1
    }

    /// Rows holding at least one pixel of `color`.
    fn rows_with(img: &Image, color: Rgb) -> std::vec::Vec<u32> {
        (0..img.height())
            .filter(|&y| (0..img.width()).any(|x| img.pixel(x, y) == Some(color)))
            .collect()
    }

    fn root_view(store: &SettingsStore) -> MenuView {
        let mut nav = MenuNavigator::new(MenuTree::standard().unwrap());
        nav.confirm(&mut SettingsStore::new());
        nav.view(store, &MenuContext::default()).unwrap()
    }

    #[test]
    fn lines_sit_on_their_baselines() {
        let store = SettingsStore::new();
        let view = root_view(&store);
        let mut img = surface();

        MenuRenderer::default().render(&mut img, &view).unwrap();

        let rows = rows_with(&img, Rgb::BLACK);
        assert!(!rows.is_empty());
        for y in rows {
            let line = (y as i32 + FONT_10X20.baseline as i32) / 40;
            assert!(
                text_band(40 * line).contains(&(y as i32)),
                "row {y} outside any text band"
            );
            assert!(line >= 1 && (line as usize) <= view.lines.len());
        }
    }

    #[test]
    fn text_starts_at_left_margin() {
        let store = SettingsStore::new();
        let view = root_view(&store);
        let mut img = surface();

        MenuRenderer::default().render(&mut img, &view).unwrap();

        for y in 0..img.height() {
            for x in 0..20 {
                assert_eq!(img.pixel(x, y), Some(Rgb::WHITE));
            }
        }
    }

    #[test]
    fn marker_extends_selected_line() {
        let store = SettingsStore::new();
        let view = root_view(&store);
        let mut plain = view.clone();
        for line in plain.lines.iter_mut() {
            line.selected = false;
        }

        let mut with_marker = surface();
        let mut without_marker = surface();
        let mut renderer = MenuRenderer::default();
        renderer.render(&mut with_marker, &view).unwrap();
        renderer.render(&mut without_marker, &plain).unwrap();

        let rightmost = |img: &Image| {
            (0..img.width())
                .rev()
                .find(|&x| text_band(40).any(|y| img.pixel(x, y as u32) == Some(Rgb::BLACK)))
        };
        assert!(rightmost(&with_marker) > rightmost(&without_marker));
    }

    #[test]
    fn disabled_lines_use_disabled_color() {
        let store = SettingsStore::new();
        let mut view = root_view(&store);
        view.lines[1].disabled = true;
        let mut img = surface();

        MenuRenderer::default().render(&mut img, &view).unwrap();

        let gray = Rgb::new(128, 128, 128);
        let rows = rows_with(&img, gray);
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|&y| text_band(80).contains(&(y as i32))));
    }
}
