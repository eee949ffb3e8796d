use vergen::{
    vergen,
    Config,
};

fn main() {
    // build info falls back to "<none>" when this fails
    if let Err(e) = vergen(Config::default()) {
        eprintln!("vergen failed, building without version info: {e}");
    }
}
