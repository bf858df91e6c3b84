fn main() -> anyhow::Result<()> {
    adsnap::cli::run()
}
