//! ghbackup binary entry point.

fn main() {
    if let Err(err) = ghbackup::cli::run() {
        ghbackup::ui::output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
