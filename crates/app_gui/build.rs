use std::env;

fn main() {
    let version = env::var("NEUROSCAN_VERSION")
        .unwrap_or_else(|_| env::var("CARGO_PKG_VERSION").unwrap());
    println!("cargo:rustc-env=NEUROSCAN_VERSION={version}");
    println!("cargo:rerun-if-env-changed=NEUROSCAN_VERSION");
}
