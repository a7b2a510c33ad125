/// Gets the value of an environment variable, treating empty values as unset.
///
/// # Arguments
///
/// * `key` - The environment variable name to retrieve
///
/// # Returns
///
/// * `Option<String>` - The environment variable value if it exists
pub fn get_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Gets the value of an environment variable and parses it into `T`.
///
/// Values which are missing or fail to parse are returned as `None`.
pub fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    get_env(key).and_then(|value| value.parse().ok())
}
