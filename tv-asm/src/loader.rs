use std::env;
use std::ffi::CStr;
use std::path::PathBuf;

use libloading::{Library, Symbol};
use log::{debug, warn};

use tv_format::{ExternalIndex, ModuleInit};

use crate::error::AssembleError;

const LIB_PATH_VAR: &str = "TVASM_LIB_PATH";

/// Where the loader looks for a declared library's shared-object file:
/// explicit `-L` directories first, then `TVASM_LIB_PATH`, then the
/// current directory.
pub struct Loader {
    search_paths: Vec<PathBuf>,
}

impl Loader {
    pub fn new(extra_paths: &[PathBuf]) -> Self {
        let mut search_paths: Vec<PathBuf> = extra_paths.to_vec();
        if let Ok(var) = env::var(LIB_PATH_VAR) {
            search_paths.extend(env::split_paths(&var));
        }
        search_paths.push(PathBuf::from("."));
        Loader { search_paths }
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        let filename = platform_filename(name);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&filename))
            .find(|path| path.is_file())
    }

    /// Loads every library in `libs` and declares each of its exported
    /// symbols in `externals`, surfacing the first failure encountered.
    pub fn load_all(&self, libs: &[String], externals: &mut ExternalIndex) -> Result<(), AssembleError> {
        for lib in libs {
            self.load_one(lib, externals)?;
        }
        Ok(())
    }

    fn load_one(&self, lib: &str, externals: &mut ExternalIndex) -> Result<(), AssembleError> {
        let path = self
            .locate(lib)
            .ok_or_else(|| AssembleError::Load(lib.to_string()))?;
        debug!("loading library {} from {}", lib, path.display());

        let library = unsafe { Library::new(&path) }
            .map_err(|_| AssembleError::Load(lib.to_string()))?;

        let init_symbol = format!("{}_init", lib);
        let init: Symbol<ModuleInit> = unsafe { library.get(init_symbol.as_bytes()) }
            .map_err(|_| AssembleError::MissingInit(lib.to_string()))?;

        let table = unsafe { init() };
        if table.is_null() {
            return Err(AssembleError::InitFailed(lib.to_string()));
        }

        let mut i = 0isize;
        loop {
            let entry = unsafe { &*table.offset(i) };
            if entry.name.is_null() {
                break;
            }
            let name = unsafe { CStr::from_ptr(entry.name) }
                .to_string_lossy()
                .into_owned();
            if !externals.declare(&name, lib) {
                warn!("{} redeclares symbol {} already owned elsewhere", lib, name);
                return Err(AssembleError::DupSym(name));
            }
            i += 1;
        }

        Ok(())
    }
}

fn platform_filename(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{}.dll", name)
    } else if cfg!(target_os = "macos") {
        format!("lib{}.dylib", name)
    } else {
        format!("lib{}.so", name)
    }
}
