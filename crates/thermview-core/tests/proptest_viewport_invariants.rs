//! Property-based invariants of the viewport transform.
//!
//! 1. The rendered canvas always has the destination size.
//! 2. Every pixel is background or a copy of an in-bounds source pixel.
//! 3. The plan stays inside source, fitted image and destination.
//! 4. `fit_within` never exceeds the container and touches one edge.
//! 5. Unclamped requests are centred on the destination.

use proptest::prelude::*;
use thermview_core::{
    image::{Image, Rgb, Size},
    viewport::{ViewportParams, fit_within, plan_viewport, render_viewport},
};

fn size_strategy(max: u32) -> impl Strategy<Value = Size> {
    (1..=max, 1..=max).prop_map(|(w, h)| Size::new(w, h))
}

fn params_strategy() -> impl Strategy<Value = ViewportParams> {
    (-400i32..=400, -400i32..=400, 0.05f32..=8.0)
        .prop_map(|(x, y, scale)| ViewportParams::new(x, y, scale))
}

/// r = x, g = y, b = 1; background has b = 0.
fn coordinate_image(size: Size) -> Image {
    let mut img = Image::new(size).unwrap();
    for y in 0..size.height {
        for x in 0..size.width {
            img.set_pixel(x, y, Rgb::new(x as u8, y as u8, 1));
        }
    }
    img
}

proptest! {
    #[test]
    fn output_has_destination_size_and_valid_pixels(
        source in size_strategy(64),
        destination in size_strategy(96),
        params in params_strategy(),
    ) {
        let src = coordinate_image(source);
        let out = render_viewport(&src, params, destination, Rgb::BLACK).unwrap();

        prop_assert_eq!(out.size(), destination);
        for y in 0..destination.height {
            for x in 0..destination.width {
                let px = out.pixel(x, y).unwrap();
                if px == Rgb::BLACK {
                    continue;
                }
                prop_assert_eq!(px.b(), 1, "garbage pixel at ({}, {})", x, y);
                prop_assert!(u32::from(px.r()) < source.width);
                prop_assert!(u32::from(px.g()) < source.height);
            }
        }
    }
}

proptest! {
    #[test]
    fn plan_stays_in_bounds(
        source in size_strategy(512),
        destination in size_strategy(512),
        params in params_strategy(),
    ) {
        let plan = plan_viewport(source, params, destination);

        prop_assert!(plan.window.width >= 1 && plan.window.height >= 1);
        prop_assert!(plan.window.fits_in(source), "window {:?} leaves {:?}", plan.window, source);
        prop_assert!(plan.visible.fits_in(plan.fitted));
        prop_assert!(
            plan.destination_rect().fits_in(destination),
            "{:?} leaves {:?}",
            plan.destination_rect(),
            destination
        );
    }
}

proptest! {
    #[test]
    fn fit_within_touches_an_edge(small in size_strategy(2_000), big in size_strategy(2_000)) {
        let fitted = fit_within(small, big);

        prop_assert!(fitted.width <= big.width && fitted.height <= big.height);
        prop_assert!(fitted.width == big.width || fitted.height == big.height);
    }
}

proptest! {
    #[test]
    fn unclamped_request_is_centred(
        source in size_strategy(256),
        destination in size_strategy(320),
        scale in 1.0f32..=8.0,
    ) {
        let plan = plan_viewport(source, ViewportParams::new(0, 0, scale), destination);

        prop_assert_eq!(plan.clamp_delta, (0, 0));
        prop_assert_eq!(plan.visible.size(), plan.fitted);
        prop_assert_eq!(plan.placement.0, destination.width / 2 - plan.fitted.width / 2);
        prop_assert_eq!(plan.placement.1, destination.height / 2 - plan.fitted.height / 2);
    }
}
