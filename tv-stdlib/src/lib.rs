//! Example plug-in: exports `putchar`, `puts`, and `getchar` the way a
//! real stdlib plug-in would, so `tv-asm`'s loader (C2) has something
//! concrete to bind against in its integration tests.

use std::ffi::CString;
use std::io::Write;
use std::os::raw::c_char;
use std::sync::OnceLock;

use tv_format::{Callback, RegisterFile, SymbolTable};

extern "C" fn __putchar(_regs: *mut RegisterFile) {
    print!("\0");
    let _ = std::io::stdout().flush();
}

extern "C" fn __puts(_regs: *mut RegisterFile) {
    let _ = std::io::stdout().flush();
}

extern "C" fn __getchar(_regs: *mut RegisterFile) {}

fn name(n: &'static str) -> *const c_char {
    static NAMES: OnceLock<Vec<CString>> = OnceLock::new();
    let names = NAMES.get_or_init(|| {
        vec![
            CString::new("putchar").unwrap(),
            CString::new("puts").unwrap(),
            CString::new("getchar").unwrap(),
        ]
    });
    names
        .iter()
        .find(|c| c.to_str() == Ok(n))
        .expect("name requested must be one of the three exported symbols")
        .as_ptr()
}

static TABLE: OnceLock<[SymbolTable; 4]> = OnceLock::new();

fn table() -> &'static [SymbolTable; 4] {
    TABLE.get_or_init(|| {
        [
            SymbolTable {
                name: name("putchar"),
                callback: Some(__putchar as Callback),
            },
            SymbolTable {
                name: name("puts"),
                callback: Some(__puts as Callback),
            },
            SymbolTable {
                name: name("getchar"),
                callback: Some(__getchar as Callback),
            },
            SymbolTable {
                name: std::ptr::null(),
                callback: None,
            },
        ]
    })
}

/// Entry point the loader resolves by the `<basename>_init` convention.
#[no_mangle]
pub extern "C" fn tvstdlib_init() -> *const SymbolTable {
    table().as_ptr()
}
