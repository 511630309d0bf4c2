fn main() {
    if let Err(err) = wgpu_meadow::run() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}
