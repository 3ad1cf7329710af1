fn main() {
    if let Err(e) = directory_admin_lib::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
