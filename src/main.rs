fn main() -> anyhow::Result<()> {
    env_logger::init();
    notran::run()
}
