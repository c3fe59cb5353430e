//! Test library loading
//!
//! A test library is a dynamic library exporting `clarity_register_tests`, an
//! `extern "C" fn()` that registers its suites with the running framework
//! (see [`export_tests!`](crate::export_tests)). Loading a library opens it,
//! resolves that symbol, binds the library to this process's registry when
//! it exports [`BIND_SYMBOL`], and calls the entry point once.
//!
//! Libraries stay resident after registration since the registered tests
//! point into their code; [`TestLibraries::unload_all`] closes them once the
//! tests are done.
//!
//! # Safety
//!
//! Loading a dynamic library runs its initialization code in this process.
//! Only load libraries you trust.

use crate::error::{ClarityError, ClarityResult};
use crate::host::{BindFn, HostBinding, BIND_SYMBOL};
use libloading::Library;
use std::path::{Path, PathBuf};

/// Entry point every test library must export
pub const REGISTER_SYMBOL: &str = "clarity_register_tests";

/// Signature of [`REGISTER_SYMBOL`]
pub type RegisterFn = unsafe extern "C" fn();

/// Platform-neutral access to one loaded module
pub trait ModuleLoader {
    /// Open the module at `path`
    fn open(&mut self, path: &Path) -> ClarityResult<()>;

    /// Resolve the registration entry point under `symbol`, if exported
    fn lookup(&self, symbol: &str) -> Option<RegisterFn>;

    /// Resolve the host binding entry point under `symbol`, if exported
    fn lookup_bind(&self, _symbol: &str) -> Option<BindFn> {
        None
    }

    /// Close the module
    fn close(&mut self) -> ClarityResult<()>;

    fn is_loaded(&self) -> bool;
}

/// [`ModuleLoader`] backed by the platform dynamic loader
#[derive(Debug, Default)]
pub struct DynamicLoader {
    path: Option<PathBuf>,
    library: Option<Library>,
}

impl ModuleLoader for DynamicLoader {
    fn open(&mut self, path: &Path) -> ClarityResult<()> {
        if !path.exists() {
            return Err(ClarityError::FileNotFound(path.to_path_buf()));
        }

        let library = unsafe {
            Library::new(path).map_err(|e| ClarityError::LoadLibraryFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        self.library = Some(library);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn lookup(&self, symbol: &str) -> Option<RegisterFn> {
        let library = self.library.as_ref()?;
        // The symbol type is fixed by the registration contract.
        unsafe {
            library
                .get::<RegisterFn>(symbol.as_bytes())
                .ok()
                .map(|sym| *sym)
        }
    }

    fn lookup_bind(&self, symbol: &str) -> Option<BindFn> {
        let library = self.library.as_ref()?;
        unsafe {
            library
                .get::<BindFn>(symbol.as_bytes())
                .ok()
                .map(|sym| *sym)
        }
    }

    fn close(&mut self) -> ClarityResult<()> {
        let library = self.library.take().ok_or(ClarityError::LibraryNotLoaded)?;
        let path = self.path.take().unwrap_or_default();

        library
            .close()
            .map_err(|e| ClarityError::UnloadLibraryFailed {
                path,
                reason: e.to_string(),
            })
    }

    fn is_loaded(&self) -> bool {
        self.library.is_some()
    }
}

/// Resolves library names to files using platform naming conventions
#[derive(Debug, Clone)]
pub struct LibraryResolver {
    search_paths: Vec<PathBuf>,
}

impl Default for LibraryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryResolver {
    /// Resolver searching the current working directory
    pub fn new() -> Self {
        let mut search_paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            search_paths.push(cwd);
        }
        Self { search_paths }
    }

    /// Resolver with no search paths; only existing paths resolve
    pub fn empty() -> Self {
        Self {
            search_paths: Vec::new(),
        }
    }

    /// Add a search path (prepended to search list)
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.insert(0, path);
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Resolve `name` to an existing file.
    ///
    /// An existing path is used as-is. Otherwise each search path is tried
    /// with the platform library naming:
    /// - Linux: lib{name}.so
    /// - macOS: lib{name}.dylib or lib{name}.so
    /// - Windows: {name}.dll
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_file() {
            return Some(path.to_path_buf());
        }

        let extensions: &[&str] = if cfg!(target_os = "windows") {
            &["dll"]
        } else if cfg!(target_os = "macos") {
            &["dylib", "so"]
        } else {
            &["so"]
        };

        let prefixes: &[&str] = if cfg!(target_os = "windows") {
            &["", "lib"]
        } else {
            &["lib", ""]
        };

        for search_path in &self.search_paths {
            let direct = search_path.join(name);
            if direct.is_file() {
                return Some(direct);
            }

            for prefix in prefixes {
                for ext in extensions {
                    let full_path = search_path.join(format!("{}{}.{}", prefix, name, ext));
                    if full_path.is_file() {
                        return Some(full_path);
                    }
                }
            }
        }

        None
    }
}

/// Test libraries loaded into this process, in load order
pub struct TestLibraries<L: ModuleLoader = DynamicLoader> {
    resolver: LibraryResolver,
    loaded: Vec<(PathBuf, L)>,
}

impl<L: ModuleLoader + Default> Default for TestLibraries<L> {
    fn default() -> Self {
        Self::new(LibraryResolver::new())
    }
}

impl<L: ModuleLoader + Default> TestLibraries<L> {
    pub fn new(resolver: LibraryResolver) -> Self {
        Self {
            resolver,
            loaded: Vec::new(),
        }
    }

    pub fn resolver_mut(&mut self) -> &mut LibraryResolver {
        &mut self.resolver
    }

    /// Load a test library and run its registration entry point.
    ///
    /// A library that is already loaded is not opened or registered again.
    pub fn load(&mut self, name: &str) -> ClarityResult<()> {
        if let Some(pending) = self.open(name)? {
            let pending = pending.register()?;
            self.commit(pending);
        }
        Ok(())
    }

    /// Resolve and open a library and find its entry points, without
    /// running any of its code. `None` if it is already loaded.
    pub fn open(&mut self, name: &str) -> ClarityResult<Option<PendingLibrary<L>>> {
        if name.is_empty() {
            return Err(ClarityError::InvalidArgument(
                "library path cannot be empty".to_string(),
            ));
        }

        let path = self
            .resolver
            .resolve(name)
            .ok_or_else(|| ClarityError::FileNotFound(PathBuf::from(name)))?;

        if self.is_loaded(&path) {
            tracing::debug!(path = %path.display(), "test library already loaded");
            return Ok(None);
        }

        let mut loader = L::default();
        loader.open(&path)?;

        let Some(register) = loader.lookup(REGISTER_SYMBOL) else {
            close_rejected(&path, &mut loader);
            return Err(ClarityError::InvalidFormat {
                path,
                symbol: REGISTER_SYMBOL.to_string(),
            });
        };
        let bind = loader.lookup_bind(BIND_SYMBOL);

        Ok(Some(PendingLibrary {
            path,
            loader,
            register,
            bind,
        }))
    }

    /// Keep a registered library resident until [`unload_all`](Self::unload_all).
    ///
    /// If the same path was committed in the meantime the duplicate handle
    /// is closed.
    pub fn commit(&mut self, pending: PendingLibrary<L>) {
        let PendingLibrary {
            path, mut loader, ..
        } = pending;

        if self.is_loaded(&path) {
            close_rejected(&path, &mut loader);
            return;
        }
        self.loaded.push((path, loader));
    }

    /// Close every loaded library, most recent first.
    ///
    /// Every library is attempted; the first failure is returned afterwards.
    pub fn unload_all(&mut self) -> ClarityResult<()> {
        if self.loaded.is_empty() {
            return Err(ClarityError::LibraryNotLoaded);
        }

        let mut first_error = None;
        while let Some((path, mut loader)) = self.loaded.pop() {
            tracing::debug!(path = %path.display(), "unloading test library");
            if let Err(e) = loader.close() {
                tracing::warn!(path = %path.display(), error = %e, "failed to unload test library");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.loaded.iter().any(|(p, _)| p == path)
    }

    /// Get the number of loaded libraries
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn loaded_paths(&self) -> impl Iterator<Item = &Path> {
        self.loaded.iter().map(|(p, _)| p.as_path())
    }
}

/// A library opened by [`TestLibraries::open`] whose entry point has not run
pub struct PendingLibrary<L: ModuleLoader> {
    path: PathBuf,
    loader: L,
    register: RegisterFn,
    bind: Option<BindFn>,
}

impl<L: ModuleLoader> PendingLibrary<L> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bind the library to this process's registry, then call its
    /// registration entry point.
    ///
    /// This runs library code, which may load further libraries; callers
    /// must not hold a lock the library could need. A refused binding closes
    /// the library.
    pub fn register(mut self) -> ClarityResult<Self> {
        if let Some(bind) = self.bind {
            let binding = HostBinding::current();
            let status = unsafe { bind(&binding) };
            if status != 0 {
                close_rejected(&self.path, &mut self.loader);
                return Err(ClarityError::LoadLibraryFailed {
                    path: self.path,
                    reason: format!(
                        "library was built against a different clarity build (status {})",
                        status
                    ),
                });
            }
        }

        tracing::debug!(path = %self.path.display(), "registering tests from library");
        unsafe { (self.register)() };
        Ok(self)
    }
}

fn close_rejected<L: ModuleLoader>(path: &Path, loader: &mut L) {
    if let Err(e) = loader.close() {
        tracing::warn!(path = %path.display(), error = %e, "failed to close rejected library");
    }
}
