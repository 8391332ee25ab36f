//! Per-frame composition: palette, viewport and menu overlay onto the
//! output canvas.

use log::trace;

use crate::{
    frame::SENSOR_SIZE,
    image::{GrayImage, Image, ImageError, Rgb, Size},
    menu::MenuView,
    palette::{Palette, map_palette_into},
    viewport::{ViewportParams, render_viewport_into},
};

/// Draws a menu view onto the (already cleared) menu surface.
pub trait OverlayRenderer {
    type Error;

    fn render(&mut self, surface: &mut Image, view: &MenuView) -> Result<(), Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositorConfig {
    pub canvas: Size,
    pub source: Size,
    pub menu_size: Size,
    pub menu_origin: (u32, u32),
    /// The device is viewed through a mirror, so text must be flipped.
    pub mirror_menu: bool,
    pub background: Rgb,
    pub menu_background: Rgb,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            canvas: Size::new(320, 240),
            source: SENSOR_SIZE,
            menu_size: Size::new(400, 250),
            menu_origin: (0, 0),
            mirror_menu: true,
            background: Rgb::BLACK,
            menu_background: Rgb::WHITE,
        }
    }
}

impl CompositorConfig {
    pub const fn with_canvas(mut self, canvas: Size) -> Self {
        self.canvas = canvas;
        self
    }

    pub const fn with_source(mut self, source: Size) -> Self {
        self.source = source;
        self
    }

    pub const fn with_menu_size(mut self, menu_size: Size) -> Self {
        self.menu_size = menu_size;
        self
    }

    pub const fn with_menu_origin(mut self, x: u32, y: u32) -> Self {
        self.menu_origin = (x, y);
        self
    }

    pub const fn with_mirror_menu(mut self, mirror_menu: bool) -> Self {
        self.mirror_menu = mirror_menu;
        self
    }

    pub const fn with_background(mut self, background: Rgb) -> Self {
        self.background = background;
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComposeError<E> {
    Image(ImageError),
    Overlay(E),
}

impl<E> From<ImageError> for ComposeError<E> {
    fn from(value: ImageError) -> Self {
        Self::Image(value)
    }
}

/// Owns the output canvas and the scratch buffers reused every frame.
#[derive(Debug)]
pub struct Compositor {
    config: CompositorConfig,
    canvas: Image,
    mapped: Image,
    menu_surface: Image,
}

impl Compositor {
    pub fn new(config: CompositorConfig) -> Result<Self, ImageError> {
        Ok(Self {
            canvas: Image::filled(config.canvas, config.background)?,
            mapped: Image::new(config.source)?,
            menu_surface: Image::filled(config.menu_size, config.menu_background)?,
            config,
        })
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Most recently composed frame.
    pub fn canvas(&self) -> &Image {
        &self.canvas
    }

    /// Composes one output frame.
    ///
    /// The menu surface is only touched when `overlay` is given.
    pub fn compose<R>(
        &mut self,
        frame: &GrayImage,
        palette: &Palette,
        params: ViewportParams,
        overlay: Option<&MenuView>,
        renderer: &mut R,
    ) -> Result<&Image, ComposeError<R::Error>>
    where
        R: OverlayRenderer,
    {
        if self.mapped.size() != frame.size() {
            self.mapped = Image::new(frame.size())?;
        }
        map_palette_into(&mut self.mapped, frame, palette)?;

        self.canvas.fill(self.config.background);
        let plan = render_viewport_into(&mut self.canvas, &self.mapped, params);
        trace!(
            "compose: window={:?} placement={:?} visible={:?}",
            plan.window, plan.placement, plan.visible
        );

        if let Some(view) = overlay {
            self.menu_surface.fill(self.config.menu_background);
            renderer
                .render(&mut self.menu_surface, view)
                .map_err(ComposeError::Overlay)?;
            if self.config.mirror_menu {
                self.menu_surface.mirror_horizontal();
            }
            let (x, y) = self.config.menu_origin;
            self.canvas.blit(&self.menu_surface, x, y);
        }

        Ok(&self.canvas)
    }
}

#[cfg(test)]
mod tests {
    use heapless::Vec;

    use super::*;
    use crate::{
        menu::{MenuId, MenuLine},
        palette::{BuiltinPalettes, PaletteId, PaletteProvider},
    };

    const RED: Rgb = Rgb::new(255, 0, 0);

    /// Marks the top-left pixel of the surface for every line.
    struct CornerMark;

    impl OverlayRenderer for CornerMark {
        type Error = ();

        fn render(&mut self, surface: &mut Image, view: &MenuView) -> Result<(), Self::Error> {
            for (i, _) in view.lines.iter().enumerate() {
                surface.set_pixel(0, i as u32, RED);
            }
            Ok(())
        }
    }

    struct Failing;

    impl OverlayRenderer for Failing {
        type Error = &'static str;

        fn render(&mut self, _: &mut Image, _: &MenuView) -> Result<(), Self::Error> {
            Err("font missing")
        }
    }

    fn small_config() -> CompositorConfig {
        CompositorConfig::default()
            .with_canvas(Size::new(8, 6))
            .with_source(Size::new(4, 3))
            .with_menu_size(Size::new(4, 2))
            .with_menu_origin(1, 1)
    }

    fn ramp_frame() -> GrayImage {
        GrayImage::from_raw(Size::new(4, 3), (0..12u8).map(|v| v * 20).collect()).unwrap()
    }

    fn one_line_view() -> MenuView {
        let mut lines = Vec::new();
        lines
            .push(MenuLine {
                text: heapless::String::new(),
                selected: true,
                editing: false,
                disabled: false,
            })
            .unwrap();
        MenuView {
            menu: MenuId(0),
            lines,
        }
    }

    #[test]
    fn frame_fills_canvas_through_palette() {
        let palettes = BuiltinPalettes::new();
        let mut compositor = Compositor::new(small_config()).unwrap();

        let canvas = compositor
            .compose(
                &ramp_frame(),
                palettes.palette(PaletteId::BlackHot),
                ViewportParams::default(),
                None,
                &mut CornerMark,
            )
            .unwrap();

        assert_eq!(canvas.size(), Size::new(8, 6));
        assert_eq!(canvas.pixel(0, 0), Some(Rgb::WHITE));
        // Source (3, 2) holds 11 * 20 = 220, black-hot maps it to 35.
        assert_eq!(canvas.pixel(7, 5), Some(Rgb::new(35, 35, 35)));
    }

    #[test]
    fn menu_surface_is_mirrored_and_placed() {
        let palettes = BuiltinPalettes::new();
        let mut compositor = Compositor::new(small_config()).unwrap();
        let view = one_line_view();

        let canvas = compositor
            .compose(
                &ramp_frame(),
                palettes.palette(PaletteId::WhiteHot),
                ViewportParams::default(),
                Some(&view),
                &mut CornerMark,
            )
            .unwrap();

        // Surface x = 0 lands on surface x = 3 after the flip, canvas x = 4.
        assert_eq!(canvas.pixel(4, 1), Some(RED));
        assert_eq!(canvas.pixel(1, 1), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(4, 2), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(0, 0), Some(Rgb::BLACK));
    }

    #[test]
    fn unmirrored_menu_keeps_orientation() {
        let palettes = BuiltinPalettes::new();
        let mut compositor =
            Compositor::new(small_config().with_mirror_menu(false)).unwrap();
        let view = one_line_view();

        let canvas = compositor
            .compose(
                &ramp_frame(),
                palettes.palette(PaletteId::WhiteHot),
                ViewportParams::default(),
                Some(&view),
                &mut CornerMark,
            )
            .unwrap();

        assert_eq!(canvas.pixel(1, 1), Some(RED));
        assert_eq!(canvas.pixel(4, 1), Some(Rgb::WHITE));
    }

    #[test]
    fn background_shows_around_letterboxed_frame() {
        let palettes = BuiltinPalettes::new();
        let config = small_config().with_background(Rgb::new(0, 0, 90));
        let mut compositor = Compositor::new(config).unwrap();
        let square = GrayImage::from_raw(Size::new(2, 2), vec![255; 4]).unwrap();

        let canvas = compositor
            .compose(
                &square,
                palettes.palette(PaletteId::WhiteHot),
                ViewportParams::default(),
                None,
                &mut CornerMark,
            )
            .unwrap();

        // 2x2 fits as 6x6 centred at x = 1.
        assert_eq!(canvas.pixel(0, 3), Some(Rgb::new(0, 0, 90)));
        assert_eq!(canvas.pixel(1, 3), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(7, 3), Some(Rgb::new(0, 0, 90)));
    }

    #[test]
    fn renderer_errors_propagate() {
        let palettes = BuiltinPalettes::new();
        let mut compositor = Compositor::new(small_config()).unwrap();
        let view = one_line_view();

        let result = compositor.compose(
            &ramp_frame(),
            palettes.palette(PaletteId::WhiteHot),
            ViewportParams::default(),
            Some(&view),
            &mut Failing,
        );

        assert!(matches!(result, Err(ComposeError::Overlay("font missing"))));
    }
}
