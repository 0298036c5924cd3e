//! Tonal palette generation.
//!
//! Produces ten shades from one base color: five lighter, the base itself,
//! then four darker. Lighter steps drift hue toward the nearest warm/cool
//! pole, drop saturation and raise brightness; darker steps do the reverse.

use super::color::{Hsv, Rgb};

const HUE_STEP: f64 = 2.0;
const SATURATION_STEP: f64 = 0.16;
const SATURATION_STEP2: f64 = 0.05;
const BRIGHTNESS_STEP1: f64 = 0.05;
const BRIGHTNESS_STEP2: f64 = 0.15;
const LIGHT_COLOR_COUNT: u32 = 5;
const DARK_COLOR_COUNT: u32 = 4;

/// Number of shades in a palette.
pub const PALETTE_LEN: usize = (LIGHT_COLOR_COUNT + 1 + DARK_COLOR_COUNT) as usize;

/// Index of the base color inside a palette.
pub const BASE_INDEX: usize = LIGHT_COLOR_COUNT as usize;

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn hue(hsv: Hsv, i: u32, light: bool) -> f64 {
    let base = hsv.h.round();
    let shift = HUE_STEP * f64::from(i);
    let cool = (60.0..=240.0).contains(&base);
    let hue = if cool == light { base - shift } else { base + shift };
    if hue < 0.0 {
        hue + 360.0
    } else if hue >= 360.0 {
        hue - 360.0
    } else {
        hue
    }
}

fn saturation(hsv: Hsv, i: u32, light: bool) -> f64 {
    // Greys stay grey.
    if hsv.h == 0.0 && hsv.s == 0.0 {
        return hsv.s;
    }
    let mut s = if light {
        hsv.s - SATURATION_STEP * f64::from(i)
    } else if i == DARK_COLOR_COUNT {
        hsv.s + SATURATION_STEP
    } else {
        hsv.s + SATURATION_STEP2 * f64::from(i)
    };
    if s > 1.0 {
        s = 1.0;
    }
    if light && i == LIGHT_COLOR_COUNT && s > 0.1 {
        s = 0.1;
    }
    if s < 0.06 {
        s = 0.06;
    }
    round2(s)
}

fn value(hsv: Hsv, i: u32, light: bool) -> f64 {
    let v = if light {
        hsv.v + BRIGHTNESS_STEP1 * f64::from(i)
    } else {
        hsv.v - BRIGHTNESS_STEP2 * f64::from(i)
    };
    round2(v.min(1.0))
}

fn shade(hsv: Hsv, i: u32, light: bool) -> Rgb {
    Rgb::from_hsv(Hsv {
        h: hue(hsv, i, light),
        s: saturation(hsv, i, light),
        v: value(hsv, i, light),
    })
}

/// Generate the ten-shade palette for `base`, lightest first.
pub fn generate(base: Rgb) -> [Rgb; PALETTE_LEN] {
    let hsv = base.to_hsv();
    let mut out = [base; PALETTE_LEN];

    for (slot, i) in (1..=LIGHT_COLOR_COUNT).rev().enumerate() {
        out[slot] = shade(hsv, i, true);
    }
    for i in 1..=DARK_COLOR_COUNT {
        out[BASE_INDEX + i as usize] = shade(hsv, i, false);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(palette: &[Rgb; PALETTE_LEN]) -> Vec<String> {
        palette.iter().map(Rgb::to_hex).collect()
    }

    #[test]
    fn blue_palette_matches_reference() {
        let palette = generate(Rgb::parse("#1890ff").unwrap());
        assert_eq!(
            hex(&palette),
            vec![
                "#e6f7ff", "#bae7ff", "#91d5ff", "#69c0ff", "#40a9ff", "#1890ff", "#096dd9",
                "#0050b3", "#003a8c", "#002766",
            ]
        );
    }

    #[test]
    fn default_entity_palette() {
        let palette = generate(Rgb::parse("#2975B2").unwrap());
        assert_eq!(
            hex(&palette)[2..=5],
            ["#9ac3d9", "#70a9cc", "#4b8fbf", "#2975b2"]
        );
    }

    #[test]
    fn warm_hues_shift_the_other_way() {
        let palette = generate(Rgb::parse("#ff0000").unwrap());
        assert_eq!(palette[BASE_INDEX].to_hex(), "#ff0000");
        assert_eq!(palette[4].to_hex(), "#ff3029");
        assert_eq!(palette[6].to_hex(), "#d90007");
    }

    #[test]
    fn grey_stays_grey_and_clamps_dark_end() {
        let palette = generate(Rgb::new(128, 128, 128));
        assert_eq!(palette[0].to_hex(), "#bfbfbf");
        assert_eq!(palette[9].to_hex(), "#000000");
        for shade in palette {
            assert_eq!(shade.r, shade.g);
            assert_eq!(shade.g, shade.b);
        }
    }
}
