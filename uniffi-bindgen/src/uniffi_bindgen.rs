//! Generates Swift and Kotlin bindings for `kvstorage_core`.
//!
//! ```sh
//! cargo build -p kvstorage-core --features ffi
//! cargo run -p uniffi-bindgen -- generate --library target/debug/libkvstorage_core.so \
//!     --language swift --out-dir swift/Sources
//! ```

fn main() {
    uniffi::uniffi_bindgen_main();
}
