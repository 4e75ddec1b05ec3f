use rand::{distributions::Alphanumeric, Rng};
use tracing::info;

pub fn print_startup_string(
    pkg_description: &str,
    pkg_version: &str,
    git_version: Option<&str>,
    target: &str,
    built_time: &str,
    rustc_version: &str,
) {
    let git_information = match git_version {
        None => "".to_string(),
        Some(git) => format!(" (Git information: {git})"),
    };
    info!("Starting {}", pkg_description);
    info!(
        "This is version {}{}, built for {} by {} at {}",
        pkg_version, git_information, target, rustc_version, built_time
    )
}

pub fn print_shutdown_string() {
    info!("Exiting");
}

// get random name with length specified
pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Hex encoding of `n` random bytes, so the returned string has `2 * n` characters.
pub fn generate_random_hex(n: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_random_string_test() {
        let random_string = generate_random_string(10);
        assert_eq!(random_string.len(), 10);
    }

    #[test]
    fn generate_random_hex_test() {
        let hex = generate_random_hex(10);
        assert_eq!(hex.len(), 20);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
