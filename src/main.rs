fn main() {
    env_logger::init();
    if let Err(err) = techroadmap::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
