use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

fn main() {
    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()));
    let header = crate_dir.join("include").join("doggie_ffi.h");

    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    // A missing header should not break `cargo build` for Rust consumers.
    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("DOGGIE_FFI_H")
        .with_pragma_once(true)
        .generate()
    {
        Ok(bindings) => write_header(&bindings, &header),
        Err(e) => println!("cargo:warning=cbindgen could not generate {}: {e}", header.display()),
    }
}

fn write_header(bindings: &cbindgen::Bindings, header: &Path) {
    if let Some(dir) = header.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            println!("cargo:warning=could not create {}: {e}", dir.display());
            return;
        }
    }
    match File::create(header) {
        Ok(file) => bindings.write(file),
        Err(e) => println!("cargo:warning=could not write {}: {e}", header.display()),
    }
}
