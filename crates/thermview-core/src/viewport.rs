//! Pan/zoom of a source frame into a fixed destination canvas.
//!
//! The source window is centred, shifted by the user offset and clamped so
//! it never leaves the source. Whatever the clamp swallowed is given back on
//! the destination side: the fitted image is chopped and shifted by the same
//! amount (in destination pixels), so panning past an edge reveals
//! background instead of freezing the picture.
//!
//! Every request resolves to a valid plan; there is no error path.

use alloc::vec::Vec;

use log::trace;

use crate::image::{Image, Rect, Rgb, Size};

/// User-controlled pan and zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportParams {
    /// Horizontal window shift in source pixels.
    pub offset_x: i32,
    /// Vertical window shift in source pixels.
    pub offset_y: i32,
    /// Zoom factor; values below 1 show the full source.
    pub scale: f32,
}

impl Default for ViewportParams {
    fn default() -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            scale: 1.0,
        }
    }
}

impl ViewportParams {
    pub const fn new(offset_x: i32, offset_y: i32, scale: f32) -> Self {
        Self {
            offset_x,
            offset_y,
            scale,
        }
    }
}

/// Resolved geometry of one viewport render.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ViewportPlan {
    /// Source window after clamping, in source coordinates.
    pub window: Rect,
    /// Requested minus actual window start, in source pixels.
    pub clamp_delta: (i32, i32),
    /// Size the window is resized to before chopping.
    pub fitted: Size,
    /// Part of the fitted image that is drawn, in fitted coordinates.
    pub visible: Rect,
    /// Destination coordinate of `visible`'s top-left corner.
    pub placement: (u32, u32),
}

impl ViewportPlan {
    /// Destination rectangle covered by the render.
    pub fn destination_rect(&self) -> Rect {
        Rect::new(
            self.placement.0,
            self.placement.1,
            self.visible.width,
            self.visible.height,
        )
    }
}

/// Largest size with `small`'s aspect ratio that fits inside `big`.
///
/// The limiting axis always equals `big` on that axis. Integer arithmetic
/// keeps the result exact; an empty input yields an empty size.
pub fn fit_within(small: Size, big: Size) -> Size {
    if small.is_empty() || big.is_empty() {
        return Size::default();
    }

    let (sw, sh) = (small.width as u64, small.height as u64);
    let (bw, bh) = (big.width as u64, big.height as u64);

    if sw * bh >= sh * bw {
        Size::new(big.width, (sh * bw / sw) as u32)
    } else {
        Size::new((sw * bh / sh) as u32, big.height)
    }
}

fn window_extent(source: u32, scale: f32) -> u32 {
    if !(scale.is_finite() && scale > 0.0) {
        return source;
    }

    let scaled = source as f32 / scale;
    if scaled >= source as f32 {
        return source;
    }

    (scaled as u32).clamp(1, source)
}

/// Returns `(actual_start, requested - actual)` for one axis.
fn clamp_window_start(source: u32, window: u32, offset: i32) -> (u32, i64) {
    let requested = (source / 2) as i64 - (window / 2) as i64 + offset as i64;
    let max_start = (source - window) as i64;
    let actual = requested.clamp(0, max_start);
    (actual as u32, requested - actual)
}

/// Returns `(visible_start, visible_len, placement)` for one axis.
fn resolve_axis(fitted: u32, window: u32, delta_src: i64, destination: u32) -> (u32, u32, u32) {
    let delta = if window == 0 {
        0
    } else {
        delta_src * fitted as i64 / window as i64
    };

    let chop = delta.unsigned_abs().min(fitted as u64) as u32;
    let visible_len = fitted - chop;
    let visible_start = if delta > 0 { chop } else { 0 };

    let centered = (destination / 2) as i64 - (fitted / 2) as i64;
    let requested = centered - delta + visible_start as i64;
    let placement = requested.clamp(0, (destination - visible_len) as i64) as u32;

    (visible_start, visible_len, placement)
}

/// Computes the viewport geometry without touching pixels.
pub fn plan_viewport(source: Size, params: ViewportParams, destination: Size) -> ViewportPlan {
    if source.is_empty() || destination.is_empty() {
        return ViewportPlan {
            window: Rect::default(),
            clamp_delta: (0, 0),
            fitted: Size::default(),
            visible: Rect::default(),
            placement: (0, 0),
        };
    }

    let window_w = window_extent(source.width, params.scale);
    let window_h = window_extent(source.height, params.scale);

    let (start_x, delta_x) = clamp_window_start(source.width, window_w, params.offset_x);
    let (start_y, delta_y) = clamp_window_start(source.height, window_h, params.offset_y);

    let window = Rect::new(start_x, start_y, window_w, window_h);
    let fitted = fit_within(window.size(), destination);

    let (vis_x, vis_w, place_x) = resolve_axis(fitted.width, window_w, delta_x, destination.width);
    let (vis_y, vis_h, place_y) =
        resolve_axis(fitted.height, window_h, delta_y, destination.height);

    if delta_x != 0 || delta_y != 0 {
        trace!(
            "viewport: window clamped requested_delta=({}, {}) window={:?}",
            delta_x, delta_y, window
        );
    }

    ViewportPlan {
        window,
        clamp_delta: (saturate_i32(delta_x), saturate_i32(delta_y)),
        fitted,
        visible: Rect::new(vis_x, vis_y, vis_w, vis_h),
        placement: (place_x, place_y),
    }
}

fn saturate_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Draws `src` through the viewport onto `dst` without clearing it first.
///
/// Destination pixels outside the returned plan's destination rect are left
/// untouched.
pub fn render_viewport_into(dst: &mut Image, src: &Image, params: ViewportParams) -> ViewportPlan {
    let plan = plan_viewport(src.size(), params, dst.size());
    if plan.visible.is_empty() || plan.fitted.is_empty() {
        return plan;
    }

    let window = plan.window;
    let fitted = plan.fitted;
    let visible = plan.visible;

    // Nearest-neighbour column lookup, reused for every row.
    let columns: Vec<usize> = (0..visible.width)
        .map(|vx| {
            let fx = (visible.x + vx) as u64;
            let sx = window.x as u64 + fx * window.width as u64 / fitted.width as u64;
            sx as usize * 3
        })
        .collect();

    for vy in 0..visible.height {
        let fy = (visible.y + vy) as u64;
        let sy = window.y as u64 + fy * window.height as u64 / fitted.height as u64;

        let Some(src_row) = src.row(sy as u32) else {
            break;
        };
        let Some(dst_row) = dst.row_mut(plan.placement.1 + vy) else {
            break;
        };

        let dst_start = plan.placement.0 as usize * 3;
        for (i, &src_at) in columns.iter().enumerate() {
            let dst_at = dst_start + i * 3;
            dst_row[dst_at..dst_at + 3].copy_from_slice(&src_row[src_at..src_at + 3]);
        }
    }

    plan
}

/// Renders `src` through the viewport onto a fresh `destination`-sized canvas.
///
/// Returns `None` only when `destination` is empty.
pub fn render_viewport(
    src: &Image,
    params: ViewportParams,
    destination: Size,
    background: Rgb,
) -> Option<Image> {
    let mut dst = Image::filled(destination, background).ok()?;
    render_viewport_into(&mut dst, src, params);
    Some(dst)
}
