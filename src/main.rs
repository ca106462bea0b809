fn main() {
    if let Err(err) = figgen::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
