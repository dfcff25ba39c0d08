use env_logger::Target;

/// Log to stderr so command results on stdout stay machine-readable.
/// `RUST_LOG` overrides the default `info` level.
pub fn init() {
    env_logger::Builder::new()
        .target(Target::Stderr)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
