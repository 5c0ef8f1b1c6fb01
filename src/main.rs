fn main() -> anyhow::Result<()> {
    timescroll::cli::run()
}
