fn main() {
    if let Err(err) = solar_panel_api::app::run() {
        eprintln!("application startup failed: {err}");
        std::process::exit(1);
    }
}
