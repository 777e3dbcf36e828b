fn main() {
    if let Err(err) = solar_panel_api::app::run() {
        eprintln!("api startup failed: {err}");
        std::process::exit(1);
    }
}
