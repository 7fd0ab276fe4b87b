/// Standard half-open-interval bisection: the smallest index in `[lo, hi)`
/// for which `pred` returns `false`, or `hi` if `pred` holds everywhere.
/// `pred` is assumed monotonic (true, true, ..., true, false, false, ...)
/// over the interval — the frontier's two working assumptions (§4.3) are
/// what make that monotonicity hold in practice.
pub fn find_first_false<E>(
    mut lo: usize,
    mut hi: usize,
    mut pred: impl FnMut(usize) -> Result<bool, E>,
) -> Result<usize, E> {
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid)? {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_boundary() {
        let truthy_until = 7usize;
        let result: Result<usize, ()> =
            find_first_false(0, 20, |i| Ok(i < truthy_until));
        assert_eq!(result.unwrap(), truthy_until);
    }

    #[test]
    fn all_true_returns_hi() {
        let result: Result<usize, ()> = find_first_false(0, 10, |_| Ok(true));
        assert_eq!(result.unwrap(), 10);
    }

    #[test]
    fn all_false_returns_lo() {
        let result: Result<usize, ()> = find_first_false(3, 10, |_| Ok(false));
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn propagates_error() {
        let result: Result<usize, &'static str> =
            find_first_false(0, 10, |i| if i == 3 { Err("boom") } else { Ok(true) });
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn empty_range() {
        let result: Result<usize, ()> = find_first_false(5, 5, |_| Ok(true));
        assert_eq!(result.unwrap(), 5);
    }
}
