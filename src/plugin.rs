use std::os::raw::c_char;

/// Opaque handle a plug-in callback would receive at VM execution time.
/// The assembler never constructs one; it only needs the `SymbolTable`
/// layout below to walk a plug-in's exported names.
#[repr(C)]
pub struct RegisterFile {
    _private: [u8; 0],
}

pub type Callback = extern "C" fn(*mut RegisterFile);

/// One exported symbol, C-ABI compatible with a plug-in's
/// `{name, callback}` record. A `{null, null}` entry terminates the
/// array returned by `<basename>_init`.
#[repr(C)]
pub struct SymbolTable {
    pub name: *const c_char,
    pub callback: Option<Callback>,
}

/// The signature every plug-in's `<basename>_init` export must match.
pub type ModuleInit = unsafe extern "C" fn() -> *const SymbolTable;

#[cfg(test)]
mod test {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn symbol_table_entry_is_a_plain_two_pointer_record() {
        assert_eq!(size_of::<SymbolTable>(), 2 * size_of::<usize>());
    }
}
