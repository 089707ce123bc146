//! Gateway operations
//!
//! Synchronous implementations of every request family. Each one checks the
//! capability it needs, resolves client paths against the tenant root and only
//! then touches the host filesystem.

use log::{debug, info, warn};
use std::fs::{self, File};
use std::io;
use std::path::Path;

use crate::error::SftpError;
use crate::error::handlers::{classify_io, classify_resolve};
use crate::gateway::request::{Method, Request};
use crate::gateway::results::{CommandOutcome, FileReader, FileWriter};
use crate::session::{Permission, SessionContext};
use crate::storage::filesystem::{
    DEFAULT_FILE_MODE, DIRECTORY_MODE, create_directory, fix_ownership, set_mode,
};
use crate::storage::{EntryInfo, ResolvedPath, resolve, resolve_entry};

fn resolve_for(session: &SessionContext, raw_path: &str) -> Result<ResolvedPath, SftpError> {
    resolve(session.root_dir(), raw_path).map_err(|e| classify_resolve(session, raw_path, e))
}

/// Like `resolve_for`, but the final component is not followed.
fn resolve_entry_for(session: &SessionContext, raw_path: &str) -> Result<ResolvedPath, SftpError> {
    resolve_entry(session.root_dir(), raw_path)
        .map_err(|e| classify_resolve(session, raw_path, e))
}

fn require(session: &SessionContext, permission: Permission) -> Result<(), SftpError> {
    if session.can(permission) {
        Ok(())
    } else {
        debug!("[{}] missing permission {}", session.identity(), permission);
        Err(SftpError::PermissionDenied)
    }
}

/// Open a file for reading.
pub fn file_read(session: &SessionContext, filepath: &str) -> Result<FileReader, SftpError> {
    require(session, Permission::FileReadContent)?;
    let path = resolve_for(session, filepath)?;

    File::open(path.as_path())
        .map(FileReader::new)
        .map_err(|e| classify_io(session, "open file for reading", filepath, e))
}

/// Create or truncate a file for writing.
///
/// Which capability applies depends on whether the file already exists, and
/// that is settled before anything is created on disk.
pub fn file_write(session: &SessionContext, filepath: &str) -> Result<FileWriter, SftpError> {
    if session.is_read_only() {
        return Err(SftpError::OpUnsupported);
    }
    let path = resolve_for(session, filepath)?;
    if path.is_root() {
        warn!("[{}] refused to write over the tenant root", session.identity());
        return Err(SftpError::Failure);
    }

    let permission = match fs::metadata(path.as_path()) {
        Ok(_) => Permission::FileUpdate,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Permission::FileCreate,
        Err(e) => return Err(classify_io(session, "stat before write", filepath, e)),
    };
    require(session, permission)?;

    if let Some(parent) = path.as_path().parent() {
        create_directory(parent)
            .map_err(|e| classify_io(session, "create parent directories", filepath, e))?;
    }

    let file = File::create(path.as_path())
        .map_err(|e| classify_io(session, "create file", filepath, e))?;

    fix_ownership(session, path.as_path());
    Ok(FileWriter::new(file))
}

/// Run a command request: setstat, rename, rmdir, mkdir, symlink or remove.
pub fn file_cmd(session: &SessionContext, request: &Request) -> Result<CommandOutcome, SftpError> {
    if session.is_read_only() {
        return Err(SftpError::OpUnsupported);
    }

    match request.method {
        Method::Setstat => {}
        Method::Rename => require(session, Permission::FileUpdate)?,
        Method::Rmdir | Method::Remove => require(session, Permission::FileDelete)?,
        Method::Mkdir | Method::Symlink => require(session, Permission::FileCreate)?,
        _ => return Err(SftpError::OpUnsupported),
    }

    // Remove and rename act on the entry itself, even when it is a symlink.
    let source = match request.method {
        Method::Remove | Method::Rename => resolve_entry_for(session, &request.filepath)?,
        _ => resolve_for(session, &request.filepath)?,
    };
    let target = match request.target() {
        Some(raw) => Some(resolve_for(session, raw)?),
        None => None,
    };
    let log_source = match request.target() {
        Some(raw) => format!("{} -> {}", request.filepath, raw),
        None => request.filepath.clone(),
    };
    let fail = |action: &str, e: io::Error| classify_io(session, action, &log_source, e);

    let outcome = match request.method {
        Method::Setstat => {
            let is_dir = fs::metadata(source.as_path())
                .map(|m| m.is_dir())
                .map_err(|e| fail("stat before setstat", e))?;

            let mode = if is_dir || request.attrs.is_dir() {
                DIRECTORY_MODE
            } else if request.attrs.perm() != 0 {
                request.attrs.perm()
            } else {
                DEFAULT_FILE_MODE
            };

            set_mode(source.as_path(), mode).map_err(|e| fail("setstat", e))?;
            CommandOutcome::Applied
        }
        Method::Rename => {
            let target = target.as_ref().ok_or(SftpError::OpUnsupported)?;
            if source.is_root() || target.is_root() {
                return Err(SftpError::PermissionDenied);
            }
            fs::rename(source.as_path(), target.as_path()).map_err(|e| fail("rename", e))?;
            CommandOutcome::Applied
        }
        Method::Rmdir => {
            if source.is_root() {
                return Err(SftpError::PermissionDenied);
            }
            fs::remove_dir_all(source.as_path()).map_err(|e| fail("remove directory", e))?;
            info!("[{}] removed directory {}", session.identity(), request.filepath);
            CommandOutcome::Removed
        }
        Method::Mkdir => {
            create_directory(source.as_path()).map_err(|e| fail("create directory", e))?;
            CommandOutcome::Applied
        }
        Method::Symlink => {
            let target = target.as_ref().ok_or(SftpError::OpUnsupported)?;
            std::os::unix::fs::symlink(source.as_path(), target.as_path())
                .map_err(|e| fail("create symlink", e))?;
            CommandOutcome::Applied
        }
        Method::Remove => {
            fs::remove_file(source.as_path()).map_err(|e| fail("remove file", e))?;
            info!("[{}] removed file {}", session.identity(), request.filepath);
            CommandOutcome::Removed
        }
        _ => return Err(SftpError::OpUnsupported),
    };

    if let Some(location) = ownership_target(outcome, &source, target.as_ref()) {
        fix_ownership(session, location);
    }

    Ok(outcome)
}

/// Entry whose owner is fixed after a command: the target when there is one,
/// otherwise the source. Nothing is left to fix once an entry was removed.
fn ownership_target<'a>(
    outcome: CommandOutcome,
    source: &'a ResolvedPath,
    target: Option<&'a ResolvedPath>,
) -> Option<&'a Path> {
    match outcome {
        CommandOutcome::Removed => None,
        CommandOutcome::Applied => Some(target.unwrap_or(source).as_path()),
    }
}

/// List a directory or stat a single entry.
pub fn file_list(session: &SessionContext, request: &Request) -> Result<Vec<EntryInfo>, SftpError> {
    require(session, Permission::FileRead)?;
    if !matches!(request.method, Method::List | Method::Stat) {
        return Err(SftpError::OpUnsupported);
    }
    let path = resolve_for(session, &request.filepath)?;

    if request.method == Method::Stat {
        let metadata = fs::metadata(path.as_path())
            .map_err(|e| classify_io(session, "stat", &request.filepath, e))?;
        return Ok(vec![EntryInfo::from_metadata(
            display_name(&request.filepath),
            &metadata,
        )]);
    }

    let fail = |e| classify_io(session, "list directory", &request.filepath, e);
    let mut entries = Vec::new();
    for entry in fs::read_dir(path.as_path()).map_err(fail)? {
        let entry = entry.map_err(fail)?;
        // DirEntry::metadata does not follow symlinks.
        let metadata = entry.metadata().map_err(fail)?;
        entries.push(EntryInfo::from_metadata(
            entry.file_name().to_string_lossy(),
            &metadata,
        ));
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(entries)
}

/// Name shown for a stat result: the last client path component, `/` for the root.
fn display_name(raw_path: &str) -> String {
    Path::new(raw_path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "/".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OwnerConfig;
    use crate::gateway::request::FileAttrs;
    use crate::session::PermissionSet;
    use std::os::unix::fs::{MetadataExt, PermissionsExt};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn session_with(permissions: &str, read_only: bool) -> (TempDir, PathBuf, SessionContext) {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap().join("tenant");
        fs::create_dir_all(&root).unwrap();
        let session = SessionContext::new(&root, PermissionSet::parse(permissions), read_only);
        (dir, root, session)
    }

    #[test]
    fn read_requires_read_content() {
        let (_dir, root, session) = session_with("file.read", false);
        fs::write(root.join("a.txt"), "data").unwrap();

        assert_eq!(
            file_read(&session, "a.txt").unwrap_err(),
            SftpError::PermissionDenied
        );
    }

    #[test]
    fn read_missing_file_is_no_such_file() {
        let (_dir, _root, session) = session_with("file.read-content", false);

        assert_eq!(
            file_read(&session, "missing.txt").unwrap_err(),
            SftpError::NoSuchFile
        );
    }

    #[test]
    fn write_without_create_leaves_no_trace() {
        let (_dir, root, session) = session_with("file.update", false);

        assert_eq!(
            file_write(&session, "new/dir/file.txt").unwrap_err(),
            SftpError::PermissionDenied
        );
        assert!(!root.join("new").exists());
    }

    #[test]
    fn overwrite_requires_update() {
        let (_dir, root, session) = session_with("file.create", false);
        fs::write(root.join("a.txt"), "old").unwrap();

        assert_eq!(
            file_write(&session, "a.txt").unwrap_err(),
            SftpError::PermissionDenied
        );
        assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "old");
    }

    #[test]
    fn overwrite_truncates() {
        let (_dir, root, session) = session_with("file.update", false);
        fs::write(root.join("a.txt"), "old contents").unwrap();

        let writer = file_write(&session, "a.txt").unwrap();
        writer.write_all_at(b"new", 0).unwrap();
        drop(writer);

        assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "new");
    }

    #[test]
    fn setstat_modes() {
        let (_dir, root, session) = session_with("", false);
        fs::write(root.join("a.txt"), "x").unwrap();
        fs::create_dir(root.join("d")).unwrap();
        let mode_of = |p: &str| fs::metadata(root.join(p)).unwrap().permissions().mode() & 0o777;

        let request = Request::new(Method::Setstat, "a.txt").with_attrs(FileAttrs::with_mode(0o600));
        assert_eq!(file_cmd(&session, &request).unwrap(), CommandOutcome::Applied);
        assert_eq!(mode_of("a.txt"), 0o600);

        let request = Request::new(Method::Setstat, "a.txt");
        file_cmd(&session, &request).unwrap();
        assert_eq!(mode_of("a.txt"), DEFAULT_FILE_MODE);

        let request = Request::new(Method::Setstat, "d").with_attrs(FileAttrs::with_mode(0o700));
        file_cmd(&session, &request).unwrap();
        assert_eq!(mode_of("d"), DIRECTORY_MODE);
    }

    #[test]
    fn remove_short_circuits() {
        let (_dir, root, session) = session_with("file.delete", false);
        fs::write(root.join("a.txt"), "x").unwrap();

        let outcome = file_cmd(&session, &Request::new(Method::Remove, "a.txt")).unwrap();
        assert_eq!(outcome, CommandOutcome::Removed);
        assert!(!root.join("a.txt").exists());
    }

    #[test]
    fn rmdir_refuses_the_root() {
        let (_dir, root, session) = session_with("*", false);

        assert_eq!(
            file_cmd(&session, &Request::new(Method::Rmdir, "/")).unwrap_err(),
            SftpError::PermissionDenied
        );
        assert!(root.is_dir());
    }

    #[test]
    fn rename_without_target_is_unsupported() {
        let (_dir, root, session) = session_with("file.update", false);
        fs::write(root.join("a.txt"), "x").unwrap();

        assert_eq!(
            file_cmd(&session, &Request::new(Method::Rename, "a.txt")).unwrap_err(),
            SftpError::OpUnsupported
        );
    }

    #[test]
    fn rename_missing_source_is_no_such_file() {
        let (_dir, _root, session) = session_with("file.update", false);
        let request = Request::new(Method::Rename, "ghost.txt").with_target("b.txt");

        assert_eq!(file_cmd(&session, &request).unwrap_err(), SftpError::NoSuchFile);
    }

    #[test]
    fn symlink_points_at_resolved_source() {
        let (_dir, root, session) = session_with("file.create", false);
        fs::write(root.join("a.txt"), "x").unwrap();

        let request = Request::new(Method::Symlink, "a.txt").with_target("link.txt");
        assert_eq!(file_cmd(&session, &request).unwrap(), CommandOutcome::Applied);
        assert_eq!(fs::read_link(root.join("link.txt")).unwrap(), root.join("a.txt"));
    }

    #[test]
    fn unknown_command_is_unsupported() {
        let (_dir, _root, session) = session_with("*", false);
        let request = Request::new(Method::Other("Readlink".into()), "a.txt");

        assert_eq!(file_cmd(&session, &request).unwrap_err(), SftpError::OpUnsupported);
        assert_eq!(file_list(&session, &request).unwrap_err(), SftpError::OpUnsupported);
    }

    #[test]
    fn list_is_sorted_and_stat_names_entry() {
        let (_dir, root, session) = session_with("file.read", false);
        fs::write(root.join("b.txt"), "bb").unwrap();
        fs::create_dir(root.join("a")).unwrap();

        let entries = file_list(&session, &Request::new(Method::List, "/")).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b.txt"]);
        assert!(entries[0].is_dir);
        assert_eq!(entries[1].size, 2);

        let stat = file_list(&session, &Request::new(Method::Stat, "/b.txt")).unwrap();
        assert_eq!(stat[0].name, "b.txt");
        let root_stat = file_list(&session, &Request::new(Method::Stat, "/")).unwrap();
        assert_eq!(root_stat[0].name, "/");
        assert!(root_stat[0].is_dir);
    }

    #[test]
    fn list_and_stat_missing_are_no_such_file() {
        let (_dir, _root, session) = session_with("file.read", false);

        assert_eq!(
            file_list(&session, &Request::new(Method::List, "nope")).unwrap_err(),
            SftpError::NoSuchFile
        );
        assert_eq!(
            file_list(&session, &Request::new(Method::Stat, "nope")).unwrap_err(),
            SftpError::NoSuchFile
        );
    }

    /// Session with an owner the current process is able to assign.
    fn owned_session(permissions: &str) -> (TempDir, PathBuf, SessionContext, OwnerConfig) {
        let (dir, root, session) = session_with(permissions, false);
        let metadata = fs::metadata(&root).unwrap();
        let owner = match metadata.uid() {
            0 => OwnerConfig {
                uid: 4242,
                gid: 4242,
            },
            uid => OwnerConfig {
                uid,
                gid: metadata.gid(),
            },
        };
        (dir, root, session.with_owner(owner), owner)
    }

    fn owner_of(path: &Path) -> (u32, u32) {
        let metadata = fs::symlink_metadata(path).unwrap();
        (metadata.uid(), metadata.gid())
    }

    #[test]
    fn put_on_the_root_is_refused() {
        let (_dir, root, session) = session_with("file.update,file.create", false);

        for raw in ["/", "", "docs/.."] {
            assert_eq!(file_write(&session, raw).unwrap_err(), SftpError::Failure);
        }
        assert!(root.is_dir());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn dangling_link_can_be_removed_and_renamed() {
        let (_dir, root, session) = session_with("file.create,file.update,file.delete", false);

        let link = Request::new(Method::Symlink, "later.txt").with_target("link");
        file_cmd(&session, &link).unwrap();
        let rename = Request::new(Method::Rename, "link").with_target("moved");
        assert_eq!(file_cmd(&session, &rename).unwrap(), CommandOutcome::Applied);
        assert!(fs::symlink_metadata(root.join("link")).is_err());
        assert_eq!(fs::read_link(root.join("moved")).unwrap(), root.join("later.txt"));

        let remove = Request::new(Method::Remove, "moved");
        assert_eq!(file_cmd(&session, &remove).unwrap(), CommandOutcome::Removed);
        assert!(fs::symlink_metadata(root.join("moved")).is_err());

        file_cmd(&session, &link).unwrap();
        let remove = Request::new(Method::Remove, "link");
        assert_eq!(file_cmd(&session, &remove).unwrap(), CommandOutcome::Removed);
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn remove_deletes_the_link_and_keeps_its_target() {
        let (_dir, root, session, _owner) = owned_session("file.create,file.delete");
        fs::write(root.join("keep.txt"), "kept").unwrap();
        let kept_owner = owner_of(&root.join("keep.txt"));
        std::os::unix::fs::symlink(root.join("keep.txt"), root.join("link")).unwrap();

        let outcome = file_cmd(&session, &Request::new(Method::Remove, "link")).unwrap();
        assert_eq!(outcome, CommandOutcome::Removed);
        assert!(fs::symlink_metadata(root.join("link")).is_err());
        assert_eq!(fs::read_to_string(root.join("keep.txt")).unwrap(), "kept");
        assert_eq!(owner_of(&root.join("keep.txt")), kept_owner);
    }

    #[test]
    fn rename_moves_a_link_not_its_target() {
        let (_dir, root, session) = session_with("file.update", false);
        fs::write(root.join("keep.txt"), "kept").unwrap();
        std::os::unix::fs::symlink(root.join("keep.txt"), root.join("link")).unwrap();

        let request = Request::new(Method::Rename, "link").with_target("renamed");
        file_cmd(&session, &request).unwrap();
        assert!(root.join("keep.txt").is_file());
        assert_eq!(fs::read_link(root.join("renamed")).unwrap(), root.join("keep.txt"));
    }

    #[test]
    fn ownership_follows_every_create_and_modify() {
        let (_dir, root, session, owner) = owned_session("*");
        let expected = (owner.uid, owner.gid);

        drop(file_write(&session, "written.txt").unwrap());
        assert_eq!(owner_of(&root.join("written.txt")), expected);

        file_cmd(&session, &Request::new(Method::Mkdir, "made/deep")).unwrap();
        assert_eq!(owner_of(&root.join("made/deep")), expected);

        let request = Request::new(Method::Symlink, "written.txt").with_target("link");
        file_cmd(&session, &request).unwrap();
        assert_eq!(owner_of(&root.join("link")), expected);

        // entries below were created outside the gateway, by the test process
        fs::write(root.join("plain.txt"), "x").unwrap();
        let request = Request::new(Method::Rename, "plain.txt").with_target("moved.txt");
        file_cmd(&session, &request).unwrap();
        assert_eq!(owner_of(&root.join("moved.txt")), expected);

        fs::write(root.join("chmod.txt"), "x").unwrap();
        let request =
            Request::new(Method::Setstat, "chmod.txt").with_attrs(FileAttrs::with_mode(0o600));
        file_cmd(&session, &request).unwrap();
        assert_eq!(owner_of(&root.join("chmod.txt")), expected);
    }

    #[test]
    fn deletes_skip_ownership() {
        let (_dir, root, _session) = session_with("", false);
        fs::write(root.join("a.txt"), "x").unwrap();
        let source = resolve(&root, "a.txt").unwrap();
        let target = resolve(&root, "b.txt").unwrap();

        assert_eq!(ownership_target(CommandOutcome::Removed, &source, None), None);
        assert_eq!(
            ownership_target(CommandOutcome::Removed, &source, Some(&target)),
            None
        );
        assert_eq!(
            ownership_target(CommandOutcome::Applied, &source, None),
            Some(source.as_path())
        );
        assert_eq!(
            ownership_target(CommandOutcome::Applied, &source, Some(&target)),
            Some(target.as_path())
        );
    }

    #[test]
    fn rmdir_and_remove_report_removed() {
        let (_dir, root, session, _owner) = owned_session("file.delete");
        fs::create_dir(root.join("d")).unwrap();
        fs::write(root.join("f.txt"), "x").unwrap();

        for request in [
            Request::new(Method::Rmdir, "d"),
            Request::new(Method::Remove, "f.txt"),
        ] {
            assert_eq!(file_cmd(&session, &request).unwrap(), CommandOutcome::Removed);
        }
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn failed_chown_does_not_fail_the_operation() {
        let (_dir, root, session) = session_with("*", false);
        let before = owner_of(&root);
        let session = session.with_owner(OwnerConfig {
            uid: u32::MAX - 1,
            gid: u32::MAX - 1,
        });

        drop(file_write(&session, "a.txt").unwrap());
        let outcome = file_cmd(&session, &Request::new(Method::Mkdir, "d")).unwrap();
        assert_eq!(outcome, CommandOutcome::Applied);

        if before.0 != 0 {
            assert_eq!(owner_of(&root.join("a.txt")).0, before.0);
            assert_eq!(owner_of(&root.join("d")).0, before.0);
        }
    }
}
