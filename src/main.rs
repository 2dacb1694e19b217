fn main() {
    #[cfg(feature = "cli")]
    hmqc::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("hmqc: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
