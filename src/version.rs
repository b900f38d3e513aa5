/// Release version, taken from `APP_VERSION` at build time when the release pipeline sets it.
pub const VERSION: &str = match option_env!("APP_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// `User-Agent` sent with every outbound freight-exchange request.
pub fn user_agent() -> String {
    format!("freight-broker/{VERSION}")
}
