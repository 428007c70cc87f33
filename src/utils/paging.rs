/// Largest page number a listing will seek to. Offsets past this point
/// return empty pages anyway, so the cap only bounds the arithmetic.
pub const MAX_PAGE: i64 = 100_000;

/// Largest page size a client may request.
pub const MAX_PER_PAGE: i64 = 100;

/// Clamp client-supplied paging to safe bounds and return `(limit, offset)`
/// ready to bind into a query.
pub fn limit_offset(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> (i64, i64) {
    let limit = per_page.unwrap_or(default_per_page).clamp(1, MAX_PER_PAGE);
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    (limit, (page - 1) * limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page() {
        assert_eq!(limit_offset(None, None, 20), (20, 0));
    }

    #[test]
    fn offset_skips_earlier_pages() {
        assert_eq!(limit_offset(Some(3), Some(25), 20), (25, 50));
    }

    #[test]
    fn clamps_out_of_range_inputs() {
        assert_eq!(limit_offset(Some(0), Some(0), 20), (1, 0));
        assert_eq!(limit_offset(Some(-5), Some(-5), 20), (1, 0));
        assert_eq!(limit_offset(None, Some(10_000), 20), (MAX_PER_PAGE, 0));
    }

    #[test]
    fn extreme_page_numbers_do_not_overflow() {
        let (limit, offset) = limit_offset(Some(i64::MAX), Some(i64::MAX), 20);
        assert_eq!(limit, MAX_PER_PAGE);
        assert_eq!(offset, (MAX_PAGE - 1) * MAX_PER_PAGE);
    }
}
