fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    // Dialogs and backend requests are spawned onto this runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!("Failed to start async runtime: {err}");
            return automata_workbench::run_app();
        }
    };
    let _guard = runtime.enter();

    automata_workbench::run_app()
}
