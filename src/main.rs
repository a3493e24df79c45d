fn main() -> anyhow::Result<()> {
    tube_grabber_lib::run()
}
