fn main() -> anyhow::Result<()> {
    vet_appointments::cli::run()
}
