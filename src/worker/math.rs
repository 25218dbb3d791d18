use std::time::{Duration, Instant};

// Trial division by every d in 2..=isqrt(n).
// isqrt is exact, so there is no float rounding at perfect squares.
pub fn is_prime(n: i64) -> bool {
    if n <= 1 {
        return false;
    }
    let limit = n.isqrt();
    (2..=limit).all(|d| n % d != 0)
}

/// All primes in `2..=max`. Bounds below 2, negative ones included, yield
/// nothing.
pub fn find_primes(max: i64) -> Vec<i64> {
    if max < 2 {
        return Vec::new();
    }
    (2..=max).filter(|&n| is_prime(n)).collect()
}

/// Count the primes up to `max` and time how long the search took.
pub fn count_primes(max: i64) -> (usize, Duration) {
    let start = Instant::now();
    let count = find_primes(max).len();
    (count, start.elapsed())
}
