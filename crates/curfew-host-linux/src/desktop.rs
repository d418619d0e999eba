//! Application enumeration from XDG desktop entries

use async_trait::async_trait;
use curfew_host_api::{AppEnumerator, HostError, HostResult, RawAppInfo};
use curfew_util::PackageId;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DESKTOP_SUFFIX: &str = ".desktop";
const MAIN_GROUP: &str = "[Desktop Entry]";

/// Enumerates launchable applications from `applications/` directories.
///
/// Directories are scanned in order; an entry shadows any later entry with
/// the same desktop file ID. Entries outside the user's home are reported
/// as system applications.
pub struct DesktopEnumerator {
    dirs: Vec<PathBuf>,
    home: Option<PathBuf>,
}

impl DesktopEnumerator {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            home: dirs::home_dir(),
        }
    }

    /// Override the home directory used for the system app check
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn scan(dirs: &[PathBuf], home: Option<&Path>) -> HostResult<Vec<RawAppInfo>> {
        let mut seen = HashSet::new();
        let mut apps = Vec::new();
        let mut readable = 0;

        for dir in dirs {
            let is_system = home.is_none_or(|home| !dir.starts_with(home));
            let mut found = Vec::new();

            match collect_entries(dir, "", &mut found) {
                Ok(()) => readable += 1,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "Skipping application directory");
                    continue;
                }
            }

            for (id, path) in found {
                if !seen.insert(id.clone()) {
                    continue;
                }
                match parse_entry(&path) {
                    Ok(Some(entry)) => apps.push(RawAppInfo {
                        package_id: PackageId::new(id),
                        display_name: entry.name,
                        icon_ref: entry.icon,
                        is_system_app: is_system,
                    }),
                    Ok(None) => {}
                    Err(e) => warn!(path = %path.display(), error = %e, "Unreadable desktop entry"),
                }
            }
        }

        if readable == 0 {
            return Err(HostError::EnumerationFailed(format!(
                "none of {} application directories could be read",
                dirs.len()
            )));
        }

        debug!(count = apps.len(), dirs = readable, "Enumerated desktop entries");
        Ok(apps)
    }
}

#[async_trait]
impl AppEnumerator for DesktopEnumerator {
    async fn list_installed_applications(&self) -> HostResult<Vec<RawAppInfo>> {
        let dirs = self.dirs.clone();
        let home = self.home.clone();

        tokio::task::spawn_blocking(move || Self::scan(&dirs, home.as_deref()))
            .await
            .map_err(|e| HostError::Internal(format!("enumeration task failed: {}", e)))?
    }
}

/// Desktop file IDs map `sub/dir/app.desktop` to `sub-dir-app`.
fn collect_entries(dir: &Path, prefix: &str, out: &mut Vec<(String, PathBuf)>) -> std::io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.filter_map(Result::ok).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        if path.is_dir() {
            let nested = format!("{}{}-", prefix, name);
            if let Err(e) = collect_entries(&path, &nested, out) {
                debug!(dir = %path.display(), error = %e, "Skipping nested directory");
            }
        } else if let Some(stem) = name.strip_suffix(DESKTOP_SUFFIX) {
            out.push((format!("{}{}", prefix, stem), path));
        }
    }

    Ok(())
}

struct DesktopEntry {
    name: String,
    icon: Option<String>,
}

/// `Ok(None)` for entries that should not be listed: non-applications,
/// hidden or nameless entries.
fn parse_entry(path: &Path) -> std::io::Result<Option<DesktopEntry>> {
    let contents = fs::read_to_string(path)?;
    Ok(parse_entry_str(&contents))
}

fn parse_entry_str(contents: &str) -> Option<DesktopEntry> {
    let mut in_main = false;
    let mut kind = None;
    let mut name = None;
    let mut icon = None;
    let mut hidden = false;

    for line in contents.lines().map(str::trim) {
        if line.starts_with('[') {
            in_main = line == MAIN_GROUP;
            continue;
        }
        if !in_main || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "Type" => kind = Some(value.to_string()),
            "Name" => name = Some(value.to_string()),
            "Icon" if !value.is_empty() => icon = Some(value.to_string()),
            "NoDisplay" | "Hidden" => hidden |= value.eq_ignore_ascii_case("true"),
            _ => {}
        }
    }

    if hidden || kind.as_deref() != Some("Application") {
        return None;
    }

    Some(DesktopEntry {
        name: name.filter(|n| !n.is_empty())?,
        icon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_entry(dir: &Path, file: &str, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(file), body).unwrap();
    }

    fn app_entry(name: &str) -> String {
        format!(
            "[Desktop Entry]\nType=Application\nName={}\nName[de]=Lokal\nIcon=icon-{}\nExec=run\n",
            name,
            name.to_lowercase()
        )
    }

    #[test]
    fn test_parse_entry_fields() {
        let entry = parse_entry_str(&app_entry("Calculator")).unwrap();
        assert_eq!(entry.name, "Calculator");
        assert_eq!(entry.icon.as_deref(), Some("icon-calculator"));
    }

    #[test]
    fn test_parse_entry_skips_hidden_and_non_apps() {
        assert!(parse_entry_str("[Desktop Entry]\nType=Link\nName=Docs\n").is_none());
        assert!(parse_entry_str("[Desktop Entry]\nType=Application\nName=X\nNoDisplay=true\n").is_none());
        assert!(parse_entry_str("[Desktop Entry]\nType=Application\nName=X\nHidden=True\n").is_none());
        assert!(parse_entry_str("[Desktop Entry]\nType=Application\n").is_none());
    }

    #[test]
    fn test_parse_entry_ignores_other_groups() {
        let body = "[Desktop Entry]\nType=Application\nName=Editor\n\n[Desktop Action new]\nName=New Window\n";
        assert_eq!(parse_entry_str(body).unwrap().name, "Editor");
    }

    #[tokio::test]
    async fn test_enumerates_and_shadows() {
        let temp = tempfile::tempdir().unwrap();
        let home = temp.path().join("home");
        let user = home.join(".local/share/applications");
        let system = temp.path().join("usr/share/applications");

        write_entry(&user, "org.example.Game.desktop", &app_entry("My Game"));
        write_entry(&system, "org.example.Game.desktop", &app_entry("Game"));
        write_entry(&system, "org.example.Chat.desktop", &app_entry("Chat"));
        write_entry(&system, "README.txt", "not an entry");
        write_entry(&system.join("kde"), "konsole.desktop", &app_entry("Konsole"));

        let enumerator = DesktopEnumerator::new(vec![user, system]).with_home(&home);
        let mut apps = enumerator.list_installed_applications().await.unwrap();
        apps.sort_by(|a, b| a.package_id.cmp(&b.package_id));

        let ids: Vec<_> = apps.iter().map(|a| a.package_id.as_str()).collect();
        assert_eq!(ids, vec!["kde-konsole", "org.example.Chat", "org.example.Game"]);

        let game = &apps[2];
        assert_eq!(game.display_name, "My Game");
        assert!(!game.is_system_app);
        assert!(apps[1].is_system_app);
    }

    #[tokio::test]
    async fn test_missing_directories_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let system = temp.path().join("applications");
        write_entry(&system, "org.example.Chat.desktop", &app_entry("Chat"));

        let enumerator = DesktopEnumerator::new(vec![temp.path().join("missing"), system]);
        let apps = enumerator.list_installed_applications().await.unwrap();
        assert_eq!(apps.len(), 1);
    }

    #[tokio::test]
    async fn test_fails_when_nothing_is_readable() {
        let temp = tempfile::tempdir().unwrap();
        let enumerator = DesktopEnumerator::new(vec![temp.path().join("missing")]);

        let result = enumerator.list_installed_applications().await;
        assert!(matches!(result, Err(HostError::EnumerationFailed(_))));
    }
}
