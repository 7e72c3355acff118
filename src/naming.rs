/// Prefix and extension of the numbered card files.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FilenameTemplate {
    pub prefix: String,
    pub extension: String,
}

impl Default for FilenameTemplate {
    fn default() -> Self {
        FilenameTemplate {
            prefix: "card".to_string(),
            extension: "jpg".to_string(),
        }
    }
}

impl FilenameTemplate {
    pub fn new(prefix: impl Into<String>) -> Self {
        FilenameTemplate {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Name for the 1-based `index` out of `total`, zero-padded to the width
    /// of `total` so names sort the same lexicographically and numerically.
    pub fn filename(&self, index: usize, total: usize) -> String {
        let width = digit_count(total);
        format!("{}-{index:0width$}.{}", self.prefix, self.extension)
    }
}

/// `card-<padded index>.jpg`.
pub fn filename_for(index: usize, total: usize) -> String {
    FilenameTemplate::default().filename(index, total)
}

fn digit_count(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(7, 150, "card-007.jpg")]
    #[case(1, 1, "card-1.jpg")]
    #[case(9, 10, "card-09.jpg")]
    #[case(10, 10, "card-10.jpg")]
    #[case(42, 1000, "card-0042.jpg")]
    fn test_filename_for(#[case] index: usize, #[case] total: usize, #[case] expected: &str) {
        assert_eq!(filename_for(index, total), expected);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(9, 1)]
    #[case(10, 2)]
    #[case(99, 2)]
    #[case(100, 3)]
    #[case(123_456, 6)]
    fn test_digit_count(#[case] n: usize, #[case] digits: usize) {
        assert_eq!(digit_count(n), digits);
    }

    #[rstest]
    #[case(9)]
    #[case(10)]
    #[case(150)]
    #[case(1000)]
    fn names_have_equal_length_and_sort_numerically(#[case] total: usize) {
        let names: Vec<String> = (1..=total).map(|i| filename_for(i, total)).collect();
        let len = names[0].len();
        assert!(names.iter().all(|name| name.len() == len));

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, names);
    }

    #[rstest]
    fn custom_prefix_keeps_padding() {
        let template = FilenameTemplate::new("deck");
        assert_eq!(template.filename(3, 12), "deck-03.jpg");
    }

    #[rstest]
    fn names_are_stable_across_runs() {
        let first: Vec<String> = (1..=25).map(|i| filename_for(i, 25)).collect();
        let second: Vec<String> = (1..=25).map(|i| filename_for(i, 25)).collect();
        assert_eq!(first, second);
    }
}
