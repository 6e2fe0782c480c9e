fn main() {
    if let Err(err) = cloud_diagram_renderer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
