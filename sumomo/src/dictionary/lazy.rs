use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::dictionary::Dictionary;
use crate::errors::Result;

/// Dictionary loaded from a fixed path on first use.
///
/// ```no_run
/// use sumomo::dictionary::LazyDictionary;
///
/// static IPA: LazyDictionary = LazyDictionary::new("/usr/local/share/sumomo/ipa.zip");
///
/// let dict = IPA.get()?;
/// # Ok::<(), sumomo::errors::SumomoError>(())
/// ```
pub struct LazyDictionary {
    path: &'static str,
    cell: OnceCell<Arc<Dictionary>>,
}

impl LazyDictionary {
    /// Creates a new instance without loading anything.
    pub const fn new(path: &'static str) -> Self {
        Self {
            path,
            cell: OnceCell::new(),
        }
    }

    /// Gets the dictionary, loading it by [`Dictionary::from_path()`] on the
    /// first successful call.
    ///
    /// # Errors
    ///
    /// [`SumomoError`](crate::errors::SumomoError) is returned when loading
    /// fails. A later call retries.
    pub fn get(&self) -> Result<Arc<Dictionary>> {
        self.cell
            .get_or_try_init(|| {
                tracing::info!(path = self.path, "loading the dictionary");
                Dictionary::from_path(self.path).map(Arc::new)
            })
            .map(Arc::clone)
    }

    /// Gets the path to the dictionary.
    pub const fn path(&self) -> &'static str {
        self.path
    }
}
