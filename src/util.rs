/// Decimal digits of `n`, not counting the sign.
pub fn number_of_digits(n: i64) -> usize {
    n.unsigned_abs().to_string().len()
}

/// Right-align `n` in a field of `width` characters.
pub fn pad_start(n: i64, width: usize) -> String {
    format!("{:>width$}", n, width = width)
}
