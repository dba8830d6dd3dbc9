use crate::interval::Interval;
use image::Rgb;

/// Color definitions
pub struct Colors;

impl Colors {
    pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    pub const LIGHT_GRAY: Rgb<u8> = Rgb([220, 220, 220]);
    pub const DARK_GRAY: Rgb<u8> = Rgb([96, 96, 96]);
    pub const BLUE: Rgb<u8> = Rgb([0, 70, 190]);
    pub const LIGHT_BLUE: Rgb<u8> = Rgb([121, 166, 242]);
    pub const RED: Rgb<u8> = Rgb([190, 20, 20]);
    pub const LIGHT_RED: Rgb<u8> = Rgb([242, 140, 140]);
}

/// Fill and outline for one block; the sign of the polarity picks the family
pub fn block_colors(interval: &Interval) -> (Rgb<u8>, Rgb<u8>) {
    if interval.is_positive() {
        (Colors::LIGHT_BLUE, Colors::BLUE)
    } else {
        (Colors::LIGHT_RED, Colors::RED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_picks_family() {
        let positive = Interval::new(0, 1);
        let negative = Interval::new(0, 1).with_polarity(-0.5);
        let zero = Interval::new(0, 1).with_polarity(0.0);
        assert_eq!(block_colors(&positive).0, Colors::LIGHT_BLUE);
        assert_eq!(block_colors(&negative).0, Colors::LIGHT_RED);
        assert_eq!(block_colors(&zero), block_colors(&positive));
    }
}
