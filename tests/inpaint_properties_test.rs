// Property tests for the fill engine over random images and masks
use proptest::prelude::*;
use watermark_inpaint::inpaint::{
    Channels, Mask, PixelBuffer, PixelState, build_distance_field, fill, fill_with_hook, inpaint,
};

#[derive(Debug, Clone)]
struct Case {
    width: u32,
    height: u32,
    channels: Channels,
    pixels: Vec<u8>,
    masked: Vec<bool>,
    radius: u32,
}

impl Case {
    fn image(&self) -> PixelBuffer {
        PixelBuffer::from_raw(self.width, self.height, self.channels, self.pixels.clone())
            .expect("valid buffer")
    }

    fn mask(&self) -> Mask {
        let width = self.width as usize;
        Mask::from_fn(self.width, self.height, |x, y| {
            self.masked[y as usize * width + x as usize]
        })
        .expect("valid mask")
    }
}

fn case_strategy() -> impl Strategy<Value = Case> {
    (
        1u32..20,
        1u32..20,
        prop_oneof![Just(Channels::Gray), Just(Channels::Rgb)],
        1u32..=5,
    )
        .prop_flat_map(|(width, height, channels, radius)| {
            let len = (width * height) as usize;
            (
                prop::collection::vec(any::<u8>(), len * channels.count()),
                prop::collection::vec(prop::bool::weighted(0.3), len),
            )
                .prop_map(move |(pixels, masked)| Case {
                    width,
                    height,
                    channels,
                    pixels,
                    masked,
                    radius,
                })
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn clear_mask_leaves_image_untouched(case in case_strategy()) {
        let image = case.image();
        let mask = Mask::from_fn(case.width, case.height, |_, _| false).expect("mask");

        let output = inpaint(&image, &mask, case.radius).expect("inpaint");

        prop_assert_eq!(output, image);
    }

    #[test]
    fn unmasked_pixels_are_never_modified(case in case_strategy()) {
        let image = case.image();
        let mask = case.mask();

        let output = inpaint(&image, &mask, case.radius).expect("inpaint");

        prop_assert_eq!(output.dimensions(), image.dimensions());
        prop_assert_eq!(output.channels(), image.channels());
        for y in 0..case.height {
            for x in 0..case.width {
                if !mask.get(x, y) {
                    prop_assert_eq!(output.pixel(x, y), image.pixel(x, y));
                }
            }
        }
    }

    #[test]
    fn repeated_runs_are_identical(case in case_strategy()) {
        let image = case.image();
        let mask = case.mask();

        let first = inpaint(&image, &mask, case.radius).expect("inpaint");
        let second = inpaint(&image, &mask, case.radius).expect("inpaint");

        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_masked_pixel_is_finalized(case in case_strategy()) {
        let mut image = case.image();
        let mask = case.mask();
        let mut march = build_distance_field(&mask, case.radius);

        let report = fill(&mut image, &mut march).expect("fill");

        prop_assert_eq!(march.pending(), 0);
        prop_assert!(march.states().iter().all(|&state| state == PixelState::Known));
        prop_assert_eq!(report.frontier_pops, report.filled);
        if !report.border_seeded {
            prop_assert_eq!(report.filled, mask.masked_count());
            for y in 0..case.height {
                for x in 0..case.width {
                    if mask.get(x, y) {
                        prop_assert!(march.field().get(x, y) > 0.0);
                    } else {
                        prop_assert!(march.field().get(x, y) <= 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn fill_follows_arrival_time_order(case in case_strategy()) {
        let mut image = case.image();
        let mask = case.mask();
        let mut march = build_distance_field(&mask, case.radius);

        let mut order = Vec::new();
        fill_with_hook(&mut image, &mut march, |x, y, t| order.push((x, y, t))).expect("fill");

        prop_assert!(order.windows(2).all(|pair| pair[0].2 <= pair[1].2 + 1e-4));
        let field = march.field();
        for &(x, y, t) in &order {
            // 完成后的距离不再变化
            prop_assert_eq!(field.get(x, y), t);

            // 迎风因果：不早于最早的邻居，且至多晚一个单位
            let neighbors: Vec<f32> = [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)]
                .iter()
                .filter_map(|&(dx, dy)| {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    let inside = nx >= 0 && ny >= 0 && nx < case.width as i64 && ny < case.height as i64;
                    inside.then(|| field.get(nx as u32, ny as u32))
                })
                .collect();
            let nearest = neighbors.iter().copied().fold(f32::INFINITY, f32::min);
            prop_assert!(t >= nearest);
            prop_assert!(t <= 1.0 + nearest + 1e-4);
        }
    }
}
