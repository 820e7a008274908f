//! Ordering of installed version directories.
//!
//! Version directory names are read as a digit stream: every non-digit
//! character is dropped and the rest parsed as one integer, so `1.0.1`
//! orders as `101`. Names are assumed to be digits and separators.

/// Ordering key for a version directory name.
///
/// Returns `None` when the name contains no digits or the digit stream does
/// not fit in a `u64`.
pub fn version_key(name: &str) -> Option<u64> {
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Pick the latest version name under the digit-stream ordering.
///
/// Names without a key are ignored. On equal keys the first name seen wins.
pub fn latest_version<'a, I>(names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(u64, &'a str)> = None;
    for name in names {
        let Some(key) = version_key(name) else {
            continue;
        };
        match best {
            Some((best_key, _)) if best_key >= key => {}
            _ => best = Some((key, name)),
        }
    }
    best.map(|(_, name)| name)
}
