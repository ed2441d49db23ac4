use super::document::ConfigDocument;
use anyhow::Result;
use camino::Utf8PathBuf;

/// Where an option currently lives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// File holding the value sshd actually uses, if any.
    pub effective_location: Option<Utf8PathBuf>,
    /// Every file where the option appears in the scope, effective one included.
    pub all_locations: Vec<Utf8PathBuf>,
}

impl Resolution {
    /// Locations other than the effective one
    pub fn shadowed(&self) -> impl Iterator<Item = &Utf8PathBuf> {
        self.all_locations
            .iter()
            .filter(move |path| Some(*path) != self.effective_location.as_ref())
    }
}

/// Answers where an option is defined for a given scope.
///
/// The editor only decides which files to touch from this answer; it never
/// follows `Include` directives itself.
#[cfg_attr(test, mockall::automock)]
pub trait LocationResolver {
    fn resolve(&self, key: &str, scope: &str) -> Result<Resolution>;
}

/// Resolver over an explicit, ordered list of files.
///
/// The first file containing the option in the scope is effective (sshd
/// keeps the first value it reads). Missing files are skipped; `Include`
/// lines are not followed.
#[derive(Debug, Clone, Default)]
pub struct ScanResolver {
    files: Vec<Utf8PathBuf>,
}

impl ScanResolver {
    pub fn new(files: Vec<Utf8PathBuf>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[Utf8PathBuf] {
        &self.files
    }
}

impl LocationResolver for ScanResolver {
    fn resolve(&self, key: &str, scope: &str) -> Result<Resolution> {
        let key_lower = key.to_lowercase();
        let mut resolution = Resolution::default();

        for path in &self.files {
            if resolution.all_locations.contains(path) {
                continue;
            }
            let Some(doc) = ConfigDocument::load(path)? else {
                tracing::debug!("Skipping missing file {}", path);
                continue;
            };

            let defined_here = doc.lines().iter().any(|tagged| {
                tagged.scope == scope
                    && tagged
                        .line
                        .as_directive()
                        .is_some_and(|d| d.matches_key(&key_lower))
            });

            if defined_here {
                if resolution.effective_location.is_none() {
                    resolution.effective_location = Some(path.clone());
                }
                resolution.all_locations.push(path.clone());
            }
        }

        tracing::debug!(
            "Resolved {} in {}: effective={:?}, locations={}",
            key,
            scope,
            resolution.effective_location,
            resolution.all_locations.len()
        );
        Ok(resolution)
    }
}
