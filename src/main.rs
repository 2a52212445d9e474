fn main() {
    if let Err(e) = validation_copilot_lib::run() {
        eprintln!("validation-copilot: {}", e);
        std::process::exit(1);
    }
}
