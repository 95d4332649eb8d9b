use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let out = PathBuf::from(env::var_os("OUT_DIR").unwrap());

    // Put the linker scripts somewhere the linker can find them.
    fs::copy("memory.x", out.join("memory.x")).unwrap();
    if env::var_os("CARGO_FEATURE_RT").is_some() {
        fs::copy("device.x", out.join("device.x")).unwrap();
    }
    println!("cargo:rustc-link-search={}", out.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=device.x");
    println!("cargo:rerun-if-changed=build.rs");
}
