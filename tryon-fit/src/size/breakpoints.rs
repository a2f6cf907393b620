/// Maps a continuous measurement to a label: the first step whose threshold
/// the value is strictly below, otherwise the fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoints {
    pub steps: &'static [(f32, &'static str)],
    pub fallback: &'static str,
}

impl Breakpoints {
    pub fn label_for(&self, value: f32) -> &'static str {
        self.steps
            .iter()
            .find(|(threshold, _)| value < *threshold)
            .map(|(_, label)| *label)
            .unwrap_or(self.fallback)
    }
}

pub const MALE_WAIST: Breakpoints = Breakpoints {
    steps: &[
        (76., "28"),
        (81., "30"),
        (86., "32"),
        (91., "34"),
        (96., "36"),
        (101., "38"),
        (106., "40"),
    ],
    fallback: "42",
};

pub const FEMALE_WAIST: Breakpoints = Breakpoints {
    steps: &[
        (64., "24"),
        (67., "26"),
        (71., "28"),
        (76., "30"),
        (81., "32"),
        (86., "34"),
        (91., "36"),
    ],
    fallback: "38",
};

pub const MALE_CHEST: Breakpoints = Breakpoints {
    steps: &[
        (92., "S"),
        (100., "M"),
        (108., "L"),
        (116., "XL"),
        (124., "XXL"),
    ],
    fallback: "XXXL",
};

pub const FEMALE_CHEST: Breakpoints = Breakpoints {
    steps: &[
        (80., "XS"),
        (86., "S"),
        (92., "M"),
        (100., "L"),
        (108., "XL"),
        (116., "XXL"),
    ],
    fallback: "XXXL",
};
