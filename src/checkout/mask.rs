//! As-you-type input masks. Each strips non-digits, caps the digit count and
//! re-inserts separators from the digits collected so far.

fn digits(input: &str, max: usize) -> String {
    input.chars().filter(char::is_ascii_digit).take(max).collect()
}

/// `4111111111111111` → `4111 1111 1111 1111`, at most 16 digits.
pub fn card_number(input: &str) -> String {
    let digits = digits(input, 16);
    digits
        .as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `5551234567` → `(555) 123-4567`, at most 10 digits.
pub fn phone_number(input: &str) -> String {
    let d = digits(input, 10);
    match d.len() {
        0 => String::new(),
        1..=2 => format!("({d}"),
        3..=5 => format!("({}) {}", &d[..3], &d[3..]),
        _ => format!("({}) {}-{}", &d[..3], &d[3..6], &d[6..]),
    }
}

/// `1229` → `12/29`, at most 4 digits.
pub fn expiration_date(input: &str) -> String {
    let d = digits(input, 4);
    if d.len() >= 2 {
        format!("{}/{}", &d[..2], &d[2..])
    } else {
        d
    }
}
