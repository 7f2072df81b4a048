//! Fixed output palettes for e-ink panels.
//!
//! An e-ink panel can only show a handful of colors: eight or sixteen shades
//! of gray on most devices, or a small set of inks on color panels.  Every
//! image we send must be reduced to exactly those colors, because the firmware
//! on the other end indexes into the same palette.
//!
//! # Nearest-color rules
//!
//! - **Grayscale palettes** use a 256-entry lookup table: entry `i` is the
//!   palette intensity nearest to `i`.  On an exact midpoint the *lower*
//!   intensity wins (91 between 73 and 109 maps to 73, 92 maps to 109).
//! - **Color palettes** use squared Euclidean distance in RGB space.  On a tie
//!   the color with the lowest palette index wins.
//!
//! Both rules are deterministic so that repeated renders of the same content
//! produce identical bytes.
//!
//! # Standard palettes
//!
//! The standard palettes are `static` values.  Their lookup tables are
//! computed at compile time by `const fn`, so there is no lazy initialisation
//! and nothing to race on when several exchanges run in parallel.

use std::borrow::Cow;

use thiserror::Error;

/// An RGB color with components in `0..=255`.
pub type Color = [u8; 3];

/// The maximum number of colors in a palette.
///
/// Indexed PNG (and the firmware's palette table) store indices in one byte.
pub const MAX_COLORS: usize = 256;

/// Errors raised when constructing a [`Palette`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
    /// The palette has more colors than a one-byte index can address.
    #[error("palette has {0} colors; at most {MAX_COLORS} are supported")]
    TooManyColors(usize),

    /// The palette has no colors, so no pixel has a nearest color.
    #[error("palette must contain at least one color")]
    Empty,
}

/// An immutable, ordered set of output colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Cow<'static, [Color]>,
    /// Identifier used by firmware configuration, e.g. `3_BIT_GRAYSCALE`.
    name: Cow<'static, str>,
    is_grayscale: bool,
    round_table: [u8; 256],
}

// ── Standard palettes ─────────────────────────────────────────────────────────

/// Eight shades of gray: `round(255 * i / 7)` for `i` in `0..8`.
pub static THREE_BIT_GRAYSCALE: Palette = Palette::from_static(
    &[
        [0, 0, 0],
        [36, 36, 36],
        [73, 73, 73],
        [109, 109, 109],
        [146, 146, 146],
        [182, 182, 182],
        [219, 219, 219],
        [255, 255, 255],
    ],
    "3_BIT_GRAYSCALE",
);

/// Sixteen shades of gray: `17 * i` for `i` in `0..16`.
pub static FOUR_BIT_GRAYSCALE: Palette = Palette::from_static(
    &[
        [0, 0, 0],
        [17, 17, 17],
        [34, 34, 34],
        [51, 51, 51],
        [68, 68, 68],
        [85, 85, 85],
        [102, 102, 102],
        [119, 119, 119],
        [136, 136, 136],
        [153, 153, 153],
        [170, 170, 170],
        [187, 187, 187],
        [204, 204, 204],
        [221, 221, 221],
        [238, 238, 238],
        [255, 255, 255],
    ],
    "4_BIT_GRAYSCALE",
);

/// Black and white.
pub static MONOCHROME: Palette =
    Palette::from_static(&[[0, 0, 0], [255, 255, 255]], "MONOCHROME");

/// Black, white, and red (three-ink panels).
pub static BLACK_WHITE_AND_RED: Palette = Palette::from_static(
    &[[0, 0, 0], [255, 255, 255], [255, 0, 0]],
    "BLACK_WHITE_AND_RED",
);

/// The seven inks of color Inkplate panels: black, white, green, blue, red,
/// yellow, and orange, as the panel actually renders them.
pub static SEVEN_COLOR: Palette = Palette::from_static(
    &[
        [0, 0, 0],
        [255, 255, 255],
        [67, 138, 28],
        [85, 94, 126],
        [138, 76, 91],
        [255, 243, 56],
        [232, 126, 0],
    ],
    "7_COLOR",
);

static STANDARD_PALETTES: [&Palette; 5] = [
    &THREE_BIT_GRAYSCALE,
    &FOUR_BIT_GRAYSCALE,
    &MONOCHROME,
    &BLACK_WHITE_AND_RED,
    &SEVEN_COLOR,
];

// ── Construction ──────────────────────────────────────────────────────────────

impl Palette {
    /// Creates a palette from the given colors.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::TooManyColors`] for more than [`MAX_COLORS`]
    /// colors and [`PaletteError::Empty`] for no colors.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use eink_core::graphics::Palette;
    ///
    /// let palette = Palette::new(vec![[0, 0, 0], [128, 128, 128], [255, 255, 255]], "GRAY3")
    ///     .unwrap();
    /// assert!(palette.is_grayscale());
    /// assert_eq!(palette.nearest_gray(100), 128);
    /// ```
    pub fn new(colors: Vec<Color>, name: impl Into<String>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        if colors.len() > MAX_COLORS {
            return Err(PaletteError::TooManyColors(colors.len()));
        }
        Ok(Self {
            is_grayscale: all_gray(&colors),
            round_table: build_round_table(&colors),
            colors: Cow::Owned(colors),
            name: Cow::Owned(name.into()),
        })
    }

    /// Compile-time constructor for the standard palettes.
    const fn from_static(colors: &'static [Color], name: &'static str) -> Self {
        assert!(!colors.is_empty() && colors.len() <= MAX_COLORS);
        Self {
            colors: Cow::Borrowed(colors),
            name: Cow::Borrowed(name),
            is_grayscale: all_gray(colors),
            round_table: build_round_table(colors),
        }
    }

    /// Looks up a standard palette by its firmware name (e.g. `"7_COLOR"`).
    pub fn standard(name: &str) -> Option<&'static Palette> {
        STANDARD_PALETTES
            .iter()
            .copied()
            .find(|palette| palette.name() == name)
    }

    /// All standard palettes, in declaration order.
    pub fn standard_palettes() -> &'static [&'static Palette] {
        &STANDARD_PALETTES
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

impl Palette {
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; construction rejects empty palettes.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Whether every color has equal red, green, and blue components.
    pub fn is_grayscale(&self) -> bool {
        self.is_grayscale
    }

    /// Whether `color` is exactly one of the palette colors.
    pub fn contains(&self, color: Color) -> bool {
        self.colors.contains(&color)
    }

    /// The 256-entry intensity lookup table.
    ///
    /// Built from the first (red) component of each color, so it is only
    /// meaningful for grayscale palettes.
    pub fn round_table(&self) -> &[u8; 256] {
        &self.round_table
    }

    /// Returns the palette intensity nearest to `intensity`.
    ///
    /// Ties go to the lower intensity.
    pub fn nearest_gray(&self, intensity: u8) -> u8 {
        self.round_table[intensity as usize]
    }

    /// Returns the index of the palette color nearest to `pixel`.
    ///
    /// Ties go to the lowest index.
    pub fn nearest_index(&self, pixel: Color) -> usize {
        let mut best_index = 0;
        let mut best_distance = u32::MAX;
        for (index, color) in self.colors.iter().enumerate() {
            let distance = distance_squared(*color, pixel);
            if distance < best_distance {
                best_index = index;
                best_distance = distance;
            }
        }
        best_index
    }

    /// Returns the palette color nearest to `pixel`.
    ///
    /// Grayscale palettes still use the 3-D rule here; callers that already
    /// hold a luminance value should use [`Palette::nearest_gray`].
    pub fn nearest_color(&self, pixel: Color) -> Color {
        self.colors[self.nearest_index(pixel)]
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn distance_squared(a: Color, b: Color) -> u32 {
    let mut sum = 0;
    for channel in 0..3 {
        let delta = i32::from(a[channel]) - i32::from(b[channel]);
        sum += (delta * delta) as u32;
    }
    sum
}

const fn all_gray(colors: &[Color]) -> bool {
    let mut i = 0;
    while i < colors.len() {
        let [r, g, b] = colors[i];
        if r != g || r != b {
            return false;
        }
        i += 1;
    }
    true
}

/// Builds the intensity lookup table in one merge pass over the sorted
/// intensities.  The cursor only moves when the next color is strictly
/// closer, which is what sends exact midpoints to the lower color.
const fn build_round_table(colors: &[Color]) -> [u8; 256] {
    let len = colors.len();

    let mut sorted = [0u8; MAX_COLORS];
    let mut i = 0;
    while i < len {
        sorted[i] = colors[i][0];
        i += 1;
    }

    // Insertion sort; `sort` is not available in const context.
    let mut i = 1;
    while i < len {
        let value = sorted[i];
        let mut j = i;
        while j > 0 && sorted[j - 1] > value {
            sorted[j] = sorted[j - 1];
            j -= 1;
        }
        sorted[j] = value;
        i += 1;
    }

    let mut table = [0u8; 256];
    let mut cursor = 0;
    let mut intensity = 0;
    while intensity < 256 {
        let here = intensity as i32;
        while cursor + 1 < len
            && (sorted[cursor + 1] as i32 - here) < (here - sorted[cursor] as i32)
        {
            cursor += 1;
        }
        table[intensity] = sorted[cursor];
        intensity += 1;
    }
    table
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Expected 3-bit table: one row per palette color with the inclusive
    /// range of intensities that should map to it.
    const THREE_BIT_RANGES: [(u8, u8, u8); 8] = [
        (0, 18, 0),
        (19, 54, 36),
        (55, 91, 73),
        (92, 127, 109),
        (128, 164, 146),
        (165, 200, 182),
        (201, 237, 219),
        (238, 255, 255),
    ];

    #[test]
    fn test_standard_grayscale_flags() {
        assert!(THREE_BIT_GRAYSCALE.is_grayscale());
        assert!(FOUR_BIT_GRAYSCALE.is_grayscale());
        assert!(MONOCHROME.is_grayscale());
        assert!(!BLACK_WHITE_AND_RED.is_grayscale());
        assert!(!SEVEN_COLOR.is_grayscale());
    }

    #[test]
    fn test_three_bit_round_table_matches_ranges() {
        let table = THREE_BIT_GRAYSCALE.round_table();
        for (low, high, expected) in THREE_BIT_RANGES {
            for intensity in low..=high {
                assert_eq!(
                    table[intensity as usize], expected,
                    "intensity {intensity} should map to {expected}"
                );
            }
        }
    }

    #[test]
    fn test_three_bit_exact_midpoints_prefer_lower_intensity() {
        // Each of these is exactly 18 from both neighbours.
        for (midpoint, lower, upper) in [(18, 0, 36), (91, 73, 109), (164, 146, 182), (237, 219, 255)] {
            assert_eq!(THREE_BIT_GRAYSCALE.nearest_gray(midpoint), lower);
            assert_eq!(THREE_BIT_GRAYSCALE.nearest_gray(midpoint + 1), upper);
        }
    }

    #[test]
    fn test_three_bit_nearest_across_uneven_gap() {
        // 109 and 146 are 37 apart, so there is no exact tie between them:
        // 127 is 18 from 109 and 19 from 146.
        assert_eq!(THREE_BIT_GRAYSCALE.nearest_gray(127), 109);
        assert_eq!(THREE_BIT_GRAYSCALE.nearest_gray(128), 146);
    }

    #[test]
    fn test_monochrome_round_table_splits_at_128() {
        let expected: Vec<u8> = (0..256).map(|i| if i < 128 { 0 } else { 255 }).collect();
        assert_eq!(MONOCHROME.round_table().to_vec(), expected);
    }

    #[test]
    fn test_four_bit_round_table_is_identity_on_palette_colors() {
        for color in FOUR_BIT_GRAYSCALE.colors() {
            assert_eq!(FOUR_BIT_GRAYSCALE.nearest_gray(color[0]), color[0]);
        }
    }

    #[test]
    fn test_unsorted_palette_builds_same_table_as_sorted() {
        let shuffled = Palette::new(
            vec![[255, 255, 255], [0, 0, 0], [146, 146, 146], [36, 36, 36]],
            "SHUFFLED",
        )
        .unwrap();
        let sorted = Palette::new(
            vec![[0, 0, 0], [36, 36, 36], [146, 146, 146], [255, 255, 255]],
            "SORTED",
        )
        .unwrap();
        assert_eq!(shuffled.round_table(), sorted.round_table());
    }

    #[test]
    fn test_duplicate_intensities_do_not_stall_cursor() {
        let palette =
            Palette::new(vec![[0, 0, 0], [50, 50, 50], [50, 50, 50], [100, 100, 100]], "DUP")
                .unwrap();
        assert_eq!(palette.nearest_gray(24), 0);
        assert_eq!(palette.nearest_gray(50), 50);
        assert_eq!(palette.nearest_gray(76), 100);
    }

    #[test]
    fn test_new_rejects_more_than_256_colors() {
        let colors: Vec<Color> = (0..257).map(|i| [(i % 256) as u8, 0, (i / 256) as u8]).collect();
        assert_eq!(
            Palette::new(colors, "TOO_BIG"),
            Err(PaletteError::TooManyColors(257))
        );
    }

    #[test]
    fn test_new_accepts_exactly_256_colors() {
        let colors: Vec<Color> = (0..=255u8).map(|i| [i, i, i]).collect();
        let palette = Palette::new(colors, "FULL").unwrap();
        assert_eq!(palette.len(), 256);
        for intensity in 0..=255u8 {
            assert_eq!(palette.nearest_gray(intensity), intensity);
        }
    }

    #[test]
    fn test_new_rejects_empty_palette() {
        assert_eq!(Palette::new(Vec::new(), "EMPTY"), Err(PaletteError::Empty));
    }

    #[test]
    fn test_nearest_color_on_seven_color_palette() {
        assert_eq!(SEVEN_COLOR.nearest_color([250, 250, 250]), [255, 255, 255]);
        assert_eq!(SEVEN_COLOR.nearest_color([240, 130, 10]), [232, 126, 0]);
        assert_eq!(SEVEN_COLOR.nearest_color([60, 140, 30]), [67, 138, 28]);
    }

    #[test]
    fn test_nearest_index_tie_prefers_lowest_index() {
        // (0,0,0) and (2,0,0) are both at distance 1 from (1,0,0).
        let palette = Palette::new(vec![[2, 0, 0], [0, 0, 0]], "TIE").unwrap();
        assert_eq!(palette.nearest_index([1, 0, 0]), 0);
    }

    #[test]
    fn test_standard_lookup_by_name() {
        assert_eq!(Palette::standard("7_COLOR"), Some(&SEVEN_COLOR));
        assert_eq!(Palette::standard("3_BIT_GRAYSCALE"), Some(&THREE_BIT_GRAYSCALE));
        assert_eq!(Palette::standard("NOT_A_PALETTE"), None);
        assert_eq!(Palette::standard_palettes().len(), 5);
    }

    #[test]
    fn test_contains_only_exact_members() {
        assert!(MONOCHROME.contains([0, 0, 0]));
        assert!(!MONOCHROME.contains([1, 1, 1]));
    }
}
