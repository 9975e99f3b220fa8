use std::process;

fn main() {
    if let Err(e) = jrebuild::cli::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
