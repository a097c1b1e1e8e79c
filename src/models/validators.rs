use std::sync::LazyLock;

use regex::Regex;

/// Regex for the canonical textual UUID form: five hyphen-separated hex
/// groups of 8, 4, 4, 4 and 12 digits, either case.
///
/// Version and variant nibbles are not checked; panels issue ids that
/// stricter parsers would reject.
pub static CLIENT_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

/// Returns true if `input` is a syntactically valid client identifier.
pub fn is_valid_client_id(input: &str) -> bool {
    CLIENT_ID_REGEX.is_match(input)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::all_ones("11111111-1111-1111-1111-111111111111")]
    #[case::lowercase("3f2504e0-4f89-11d3-9a0c-0305e82c3301")]
    #[case::uppercase("3F2504E0-4F89-11D3-9A0C-0305E82C3301")]
    #[case::mixed_case("3f2504E0-4f89-11D3-9a0c-0305e82C3301")]
    #[case::nil("00000000-0000-0000-0000-000000000000")]
    fn test_valid_client_ids(#[case] input: &str) {
        assert!(is_valid_client_id(input));
    }

    #[rstest]
    #[case::empty("")]
    #[case::not_a_uuid("not-a-uuid")]
    #[case::truncated_group("3f2504e0-4f89-11d3-9a0c-0305e82c330")]
    #[case::long_group("3f2504e0-4f89-11d3-9a0c-0305e82c33011")]
    #[case::wrong_dash_positions("3f2504e04-f89-11d3-9a0c-0305e82c3301")]
    #[case::no_dashes("3f2504e04f8911d39a0c0305e82c3301")]
    #[case::braced("{3f2504e0-4f89-11d3-9a0c-0305e82c3301}")]
    #[case::non_hex("3f2504e0-4f89-11d3-9a0c-0305e82c330g")]
    #[case::surrounding_whitespace(" 3f2504e0-4f89-11d3-9a0c-0305e82c3301 ")]
    #[case::trailing_newline("3f2504e0-4f89-11d3-9a0c-0305e82c3301\n")]
    #[case::sql_injection("' OR 1=1 --")]
    fn test_invalid_client_ids(#[case] input: &str) {
        assert!(!is_valid_client_id(input));
    }
}
