fn main() -> anyhow::Result<()> {
    aurora::cli::run_cli()
}
