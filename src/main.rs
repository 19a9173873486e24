fn main() {
    if let Err(err) = smartstep::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
