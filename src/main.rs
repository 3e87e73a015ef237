fn main() -> anyhow::Result<()> {
    jobtrack::cli::run()
}
