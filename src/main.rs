fn main() {
    #[cfg(feature = "cli")]
    vbprox::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("vbprox: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
