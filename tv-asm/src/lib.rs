//! Assembler and linker for the toy virtual machine's "TV" image format.
//!
//! Source goes through a fixed pipeline: parse each translation unit into
//! a [`ParsedUnit`](instructions::ParsedUnit), merge all units into one
//! [`MergeStore`](merge::MergeStore), load every declared library and
//! populate its external symbol index, resolve every label/data/symbol
//! reference into concrete `argv` slots, pick each argument's narrowest
//! encoding width, and finally serialize the result to a `tv_format::Image`.
//!
//! A program must define a `main` label and emit at least one
//! instruction; everything else about its shape is driven by the
//! individual mnemonics used.

mod data;
pub mod error;
mod frontend;
mod instructions;
mod labels;
mod loader;
mod merge;
mod parser;
mod resolver;
mod sizer;

use std::path::PathBuf;

pub use error::{AssembleError, Error, ParseError};
pub use instructions::{Operand, ParsedInstruction, ParsedUnit};
pub use loader::Loader;
pub use merge::MergeStore;

use tv_format::Image;

/// Assembles a single translation unit's source into a linked image,
/// loading its declared libraries from the current directory, any
/// `-L`-style extra search path, or `TVASM_LIB_PATH`.
pub fn assemble(source: &str, lib_search_paths: &[PathBuf]) -> Result<Image, Error> {
    assemble_units(&[source], lib_search_paths)
}

/// Assembles and links several translation units together, in the order
/// given.
pub fn assemble_units(sources: &[&str], lib_search_paths: &[PathBuf]) -> Result<Image, Error> {
    let mut store = MergeStore::new();
    let mut libs = Vec::new();

    for source in sources {
        let unit = frontend::parse_unit(source)?;
        libs.extend(unit.libs.iter().cloned());
        store.merge_unit(unit)?;
    }

    let loader = Loader::new(lib_search_paths);
    loader.load_all(&libs, &mut store.externals)?;

    if store.instructions.is_empty() {
        return Err(AssembleError::EmptyCode.into());
    }
    if !store.labels.contains_key("main") {
        return Err(AssembleError::NoMain.into());
    }

    let resolved = resolver::resolve(store)?;
    let mut code = resolved.code;
    sizer::size_instructions(&mut code);

    let entry = resolved.main_entry_index.unwrap_or(0);

    Ok(Image {
        code,
        data: resolved.data,
        libraries: resolved.libraries,
        strings: resolved.strings,
        entry,
    })
}
