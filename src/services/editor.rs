use super::document::ConfigDocument;
use super::insertion::insert;
use super::mutation::{MutationMode, mutate};
use super::resolver::LocationResolver;
use super::writer::AtomicWriter;
use crate::models::{DesiredState, EditOutcome, EditRequest, FileEditResult, RequestError};
use anyhow::Result;
use camino::Utf8Path;

/// Applies one change request across every file that defines the option.
///
/// - `absent`: comment the option out wherever the resolver found it
/// - `present`, already defined: update the effective location, then comment
///   out the shadowed copies
/// - `present`, not defined: insert into the request's primary config file
///
/// Files are written only when their contents change, so repeating a request
/// touches nothing. There is no cross-file transaction: if a later file fails,
/// earlier files keep their new contents.
pub struct SshdConfigEditor<R> {
    resolver: R,
}

impl<R: LocationResolver> SshdConfigEditor<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn apply(&self, request: &EditRequest) -> Result<EditOutcome> {
        let scope = request.validate()?;
        let writer = AtomicWriter::new(request.backup);
        let key = request.key.as_str();

        let resolution = self.resolver.resolve(key, &scope)?;
        let mut outcome = EditOutcome::default();

        match request.state {
            DesiredState::Absent => {
                if resolution.all_locations.is_empty() {
                    tracing::info!("{} is not set in {}, nothing to remove", key, scope);
                }
                for path in &resolution.all_locations {
                    let result = self.edit_file(&writer, path, &scope, key, MutationMode::EnsureAbsent, &mut outcome)?;
                    outcome.push_file(result);
                }
            }
            DesiredState::Present => {
                let value = request.value.as_deref().ok_or(RequestError::MissingValue)?;
                match &resolution.effective_location {
                    Some(effective) => {
                        let mut result = self.edit_file(
                            &writer,
                            effective,
                            &scope,
                            key,
                            MutationMode::EnsurePresent(value),
                            &mut outcome,
                        )?;
                        if !result.found_in_target_scope {
                            tracing::warn!(
                                "{} was expected in {} but is not there, inserting it",
                                key,
                                effective
                            );
                            result = self.insert_into(&writer, effective, &scope, key, value, &mut outcome)?;
                        }
                        outcome.push_file(result);

                        for path in resolution.shadowed() {
                            let result = self.edit_file(&writer, path, &scope, key, MutationMode::EnsureAbsent, &mut outcome)?;
                            outcome.push_file(result);
                        }
                    }
                    None => {
                        let result =
                            self.insert_into(&writer, &request.config_path, &scope, key, value, &mut outcome)?;
                        outcome.push_file(result);
                    }
                }
            }
        }

        tracing::info!(
            "Request for {} in {} done: changed={}, edits={}",
            key,
            scope,
            outcome.changed,
            outcome.diff.len()
        );
        Ok(outcome)
    }

    /// Runs the mutation engine on one file and writes it if anything changed.
    fn edit_file(
        &self,
        writer: &AtomicWriter,
        path: &Utf8Path,
        scope: &str,
        key: &str,
        mode: MutationMode<'_>,
        outcome: &mut EditOutcome,
    ) -> Result<FileEditResult> {
        let Some(mut doc) = ConfigDocument::load(path)? else {
            tracing::warn!("{} does not exist, skipping", path);
            return Ok(FileEditResult::untouched(path.to_path_buf()));
        };

        let report = mutate(&mut doc, scope, key, mode);
        let modified = report.modified();
        if modified {
            self.persist(writer, path, &doc, outcome)?;
        }

        Ok(FileEditResult {
            path: path.to_path_buf(),
            found_in_target_scope: report.found,
            modified,
            change_log: report.changes,
        })
    }

    fn insert_into(
        &self,
        writer: &AtomicWriter,
        path: &Utf8Path,
        scope: &str,
        key: &str,
        value: &str,
        outcome: &mut EditOutcome,
    ) -> Result<FileEditResult> {
        let mut doc = ConfigDocument::load(path)?.unwrap_or_default();
        let change = insert(&mut doc, scope, key, value);
        self.persist(writer, path, &doc, outcome)?;
        tracing::info!("Inserted {} ({}) into {}", key, change.action, path);

        Ok(FileEditResult {
            path: path.to_path_buf(),
            found_in_target_scope: false,
            modified: true,
            change_log: vec![change],
        })
    }

    fn persist(
        &self,
        writer: &AtomicWriter,
        path: &Utf8Path,
        doc: &ConfigDocument,
        outcome: &mut EditOutcome,
    ) -> Result<()> {
        if let Some(backup) = writer.write(path, &doc.render())? {
            outcome.backups.insert(path.to_path_buf(), backup);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeAction;
    use crate::services::resolver::{MockLocationResolver, Resolution};
    use camino::Utf8PathBuf;
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::TempDir;

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, root)
    }

    fn resolver_returning(resolution: Resolution) -> MockLocationResolver {
        let mut resolver = MockLocationResolver::new();
        resolver
            .expect_resolve()
            .times(1)
            .returning(move |_, _| Ok(resolution.clone()));
        resolver
    }

    #[test]
    fn test_missing_value_rejected_before_resolving() {
        let mut resolver = MockLocationResolver::new();
        resolver.expect_resolve().never();
        let editor = SshdConfigEditor::new(resolver);

        let err = editor.apply(&EditRequest::new("Port")).unwrap_err();
        assert_eq!(err.downcast_ref::<RequestError>(), Some(&RequestError::MissingValue));
    }

    #[test]
    fn test_resolver_receives_normalized_scope() {
        let (_temp_dir, root) = temp_root();
        let config = root.join("sshd_config");
        fs::write(&config, "Port 22\n").unwrap();

        let mut resolver = MockLocationResolver::new();
        resolver
            .expect_resolve()
            .with(eq("Port"), eq("global"))
            .times(1)
            .returning(|_, _| Ok(Resolution::default()));
        let editor = SshdConfigEditor::new(resolver);

        let request = EditRequest::new("Port")
            .with_config_path(config)
            .with_state(DesiredState::Absent)
            .with_condition("All");
        let outcome = editor.apply(&request).unwrap();
        assert!(!outcome.changed);
    }

    #[test]
    fn test_update_effective_and_remove_shadowed() {
        let (_temp_dir, root) = temp_root();
        let a = root.join("a.conf");
        let b = root.join("b.conf");
        fs::write(&a, "Port 22\n").unwrap();
        fs::write(&b, "# dup\nPort 2200\n").unwrap();

        let editor = SshdConfigEditor::new(resolver_returning(Resolution {
            effective_location: Some(a.clone()),
            all_locations: vec![a.clone(), b.clone()],
        }));
        let request = EditRequest::new("Port").with_config_path(a.clone()).with_value("2222");
        let outcome = editor.apply(&request).unwrap();

        assert!(outcome.changed);
        assert_eq!(fs::read_to_string(&a).unwrap(), "Port 2222\n");
        assert_eq!(
            fs::read_to_string(&b).unwrap(),
            "# dup\n# Port 2200 # Removed by Ansible\n"
        );
        assert_eq!(outcome.diff.len(), 2);
        assert_eq!(outcome.diff[0].file, a);
        assert_eq!(outcome.diff[0].change.action, ChangeAction::Update);
        assert_eq!(outcome.diff[1].file, b);
        assert_eq!(outcome.diff[1].change.action, ChangeAction::Remove);
    }

    #[test]
    fn test_stale_effective_location_falls_back_to_insert() {
        let (_temp_dir, root) = temp_root();
        let a = root.join("a.conf");
        fs::write(&a, "UseDNS no\n").unwrap();

        let editor = SshdConfigEditor::new(resolver_returning(Resolution {
            effective_location: Some(a.clone()),
            all_locations: vec![a.clone()],
        }));
        let outcome = editor
            .apply(&EditRequest::new("Port").with_config_path(root.join("other")).with_value("2222"))
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(fs::read_to_string(&a).unwrap(), "UseDNS no\nPort 2222\n");
        assert_eq!(outcome.diff[0].change.action, ChangeAction::InsertGlobal);
        assert!(!root.join("other").exists());
    }

    #[test]
    fn test_insert_into_missing_primary_creates_it() {
        let (_temp_dir, root) = temp_root();
        let config = root.join("sshd_config.d").join("50-custom.conf");

        let editor = SshdConfigEditor::new(resolver_returning(Resolution::default()));
        let outcome = editor
            .apply(
                &EditRequest::new("PasswordAuthentication")
                    .with_config_path(config.clone())
                    .with_value("no")
                    .with_condition("User bob"),
            )
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(
            fs::read_to_string(&config).unwrap(),
            "Match User bob\n    PasswordAuthentication no\n"
        );
        assert_eq!(outcome.diff[0].change.action, ChangeAction::InsertNewBlock);
    }

    #[test]
    fn test_absent_skips_missing_file() {
        let (_temp_dir, root) = temp_root();
        let gone = root.join("gone.conf");

        let editor = SshdConfigEditor::new(resolver_returning(Resolution {
            effective_location: Some(gone.clone()),
            all_locations: vec![gone.clone()],
        }));
        let outcome = editor
            .apply(&EditRequest::new("Port").with_state(DesiredState::Absent))
            .unwrap();

        assert!(!outcome.changed);
        assert_eq!(outcome.files, vec![FileEditResult::untouched(gone.clone())]);
        assert!(!gone.exists());
    }

    #[test]
    fn test_backup_recorded_in_outcome() {
        let (_temp_dir, root) = temp_root();
        let config = root.join("sshd_config");
        fs::write(&config, "Port 22\n").unwrap();

        let editor = SshdConfigEditor::new(resolver_returning(Resolution {
            effective_location: Some(config.clone()),
            all_locations: vec![config.clone()],
        }));
        let outcome = editor
            .apply(
                &EditRequest::new("Port")
                    .with_config_path(config.clone())
                    .with_value("2222")
                    .with_backup(true),
            )
            .unwrap();

        let backup = outcome.backups.get(&config).unwrap();
        assert_eq!(fs::read_to_string(backup).unwrap(), "Port 22\n");
    }

    #[test]
    fn test_resolver_error_propagates() {
        let mut resolver = MockLocationResolver::new();
        resolver
            .expect_resolve()
            .returning(|_, _| Err(anyhow::anyhow!("parser unavailable")));
        let editor = SshdConfigEditor::new(resolver);

        let err = editor
            .apply(&EditRequest::new("Port").with_value("22"))
            .unwrap_err();
        assert!(err.to_string().contains("parser unavailable"));
    }
}
