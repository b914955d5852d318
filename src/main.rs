fn main() {
    if let Err(err) = archplan_renderer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
