//! Administrator password generation.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Random string of ASCII letters and digits.
#[must_use]
pub fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
