//! Open documents, one editor per tab.

use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::Config;
use crate::editor::CodeEditor;
use crate::language::{LanguageMap, PLAIN_TEXT};
use crate::{CoreError, CoreResult};

/// Title of a tab that has never been saved.
pub const UNTITLED: &str = "Untitled";

/// Unique identifier for a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(Uuid);

impl TabId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One open document.
#[derive(Debug)]
pub struct Tab {
    id: TabId,
    path: Option<PathBuf>,
    title: String,
    language: String,
    editor: CodeEditor,
}

impl Tab {
    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn editor(&self) -> &CodeEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut CodeEditor {
        &mut self.editor
    }

    pub fn is_modified(&self) -> bool {
        self.editor.surface().is_modified()
    }

    /// Title with a marker for unsaved changes.
    pub fn display_title(&self) -> String {
        if self.is_modified() {
            format!("{} \u{25cf}", self.title)
        } else {
            self.title.clone()
        }
    }

    fn set_path(&mut self, path: PathBuf, languages: &LanguageMap) {
        self.title = title_for(&path);
        self.language = languages.detect(&path);
        self.path = Some(path);
    }
}

/// The ordered set of open tabs and which one is active.
#[derive(Debug)]
pub struct Tabs {
    tabs: Vec<Tab>,
    active: Option<TabId>,
    config: Config,
    languages: LanguageMap,
}

impl Tabs {
    pub fn new(config: Config) -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            languages: LanguageMap::new(&config.languages),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Opening ====================

    /// Opens an empty, unsaved tab and activates it.
    pub fn new_untitled(&mut self) -> TabId {
        let tab = Tab {
            id: TabId::new(),
            path: None,
            title: UNTITLED.to_string(),
            language: PLAIN_TEXT.to_string(),
            editor: CodeEditor::new(&self.config),
        };
        self.push(tab)
    }

    /// Opens a file, or focuses its tab if it is already open.
    pub fn open(&mut self, path: impl AsRef<Path>) -> CoreResult<TabId> {
        let path = path.as_ref();
        if let Some(id) = self.focus_existing(path) {
            return Ok(id);
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            e
        })?;
        Ok(self.open_loaded(path.to_path_buf(), &content))
    }

    /// Opens a tab for content that has already been read from `path`.
    /// Focuses the existing tab instead if the path is already open.
    pub fn open_loaded(&mut self, path: PathBuf, content: &str) -> TabId {
        if let Some(id) = self.focus_existing(&path) {
            return id;
        }

        let mut editor = CodeEditor::new(&self.config);
        editor.set_text(content);
        let mut tab = Tab {
            id: TabId::new(),
            path: None,
            title: String::new(),
            language: String::new(),
            editor,
        };
        tab.set_path(path, &self.languages);
        tracing::debug!(
            "Opened {} as {} ({} lines)",
            tab.title,
            tab.language,
            tab.editor.surface().line_count()
        );
        self.push(tab)
    }

    fn push(&mut self, tab: Tab) -> TabId {
        let id = tab.id;
        self.tabs.push(tab);
        self.active = Some(id);
        id
    }

    fn focus_existing(&mut self, path: &Path) -> Option<TabId> {
        let id = self.find_by_path(path)?.id;
        self.active = Some(id);
        Some(id)
    }

    // ==================== Saving ====================

    /// Writes a tab to its file. Untitled tabs fail with
    /// [`CoreError::Untitled`] so the caller can ask for a path instead.
    pub fn save(&mut self, id: TabId) -> CoreResult<PathBuf> {
        let tab = self.get_mut(id)?;
        let path = tab.path.clone().ok_or(CoreError::Untitled(id))?;
        write_atomic(&path, &tab.editor.text())?;
        tab.editor.surface_mut().mark_saved();
        tracing::debug!("Saved {}", path.display());
        Ok(path)
    }

    /// Writes a tab to `path` and makes that its file.
    pub fn save_as(&mut self, id: TabId, path: impl Into<PathBuf>) -> CoreResult<()> {
        let path = path.into();
        let tab = self.get(id)?;
        let (text, revision) = (tab.editor.text(), tab.editor.surface().revision());
        write_atomic(&path, &text)?;
        self.mark_saved(id, Some(path), revision)?;
        Ok(())
    }

    /// Records a save done elsewhere (e.g. by an async task) of the content
    /// at `revision`. A new path retitles the tab and re-detects its
    /// language. The tab only counts as clean if it was not edited since;
    /// returns whether it does.
    pub fn mark_saved(
        &mut self,
        id: TabId,
        path: Option<PathBuf>,
        revision: u64,
    ) -> CoreResult<bool> {
        let index = self.index_of(id)?;
        let tab = &mut self.tabs[index];
        if let Some(path) = path {
            tab.set_path(path, &self.languages);
        }
        let clean = tab.editor.surface_mut().mark_saved_at(revision);
        if !clean {
            tracing::debug!("{} changed while saving, still modified", tab.title);
        }
        Ok(clean)
    }

    // ==================== Closing & Focus ====================

    /// Closes a tab. The next tab (or the previous one, at the end) becomes
    /// active.
    pub fn close(&mut self, id: TabId) -> CoreResult<Tab> {
        let index = self.index_of(id)?;
        let tab = self.tabs.remove(index);
        if self.active == Some(id) {
            self.active = self
                .tabs
                .get(index)
                .or_else(|| self.tabs.last())
                .map(|t| t.id);
        }
        tracing::debug!("Closed tab {}", tab.title);
        Ok(tab)
    }

    pub fn activate(&mut self, id: TabId) -> CoreResult<()> {
        self.index_of(id)?;
        self.active = Some(id);
        Ok(())
    }

    // ==================== Lookup ====================

    pub fn active_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn active(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.get(id).ok())
    }

    pub fn active_mut(&mut self) -> Option<&mut Tab> {
        let id = self.active?;
        self.get_mut(id).ok()
    }

    pub fn get(&self, id: TabId) -> CoreResult<&Tab> {
        self.tabs
            .iter()
            .find(|t| t.id == id)
            .ok_or(CoreError::TabNotFound(id))
    }

    pub fn get_mut(&mut self, id: TabId) -> CoreResult<&mut Tab> {
        self.tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(CoreError::TabNotFound(id))
    }

    pub fn find_by_path(&self, path: &Path) -> Option<&Tab> {
        let wanted = normalize(path);
        self.tabs
            .iter()
            .find(|t| t.path.as_deref().map(normalize).as_ref() == Some(&wanted))
    }

    fn index_of(&self, id: TabId) -> CoreResult<usize> {
        self.tabs
            .iter()
            .position(|t| t.id == id)
            .ok_or(CoreError::TabNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tab> {
        self.tabs.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

/// Writes `contents` next to `path` first, then renames it into place.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.lyra-tmp"));
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })
}

fn title_for(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(UNTITLED)
        .to_string()
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tabs() -> Tabs {
        Tabs::new(Config::default())
    }

    fn file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_new_untitled() {
        let mut tabs = tabs();
        let id = tabs.new_untitled();
        let tab = tabs.get(id).unwrap();
        assert_eq!(tab.title(), UNTITLED);
        assert_eq!(tab.language(), PLAIN_TEXT);
        assert_eq!(tabs.active_id(), Some(id));
    }

    #[test]
    fn test_open_detects_language_and_loads_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = file(&dir, "main.rs", "fn main() {}\r\n");

        let mut tabs = tabs();
        let id = tabs.open(&path).unwrap();
        let tab = tabs.get(id).unwrap();
        assert_eq!(tab.title(), "main.rs");
        assert_eq!(tab.language(), "rust");
        assert_eq!(tab.editor().text(), "fn main() {}\r\n");
        assert!(!tab.is_modified());
    }

    #[test]
    fn test_open_twice_focuses_existing_tab() {
        let dir = tempfile::tempdir().unwrap();
        let path = file(&dir, "notes.txt", "hello");

        let mut tabs = tabs();
        let first = tabs.open(&path).unwrap();
        let other = tabs.new_untitled();
        assert_eq!(tabs.active_id(), Some(other));

        let second = tabs.open(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs.active_id(), Some(first));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut tabs = tabs();
        let result = tabs.open(dir.path().join("missing.rs"));
        assert!(matches!(result, Err(CoreError::Io(_))));
        assert!(tabs.is_empty());
    }

    #[test]
    fn test_save_untitled_asks_for_path() {
        let mut tabs = tabs();
        let id = tabs.new_untitled();
        assert!(matches!(tabs.save(id), Err(CoreError::Untitled(i)) if i == id));
    }

    #[test]
    fn test_save_writes_and_clears_modified() {
        let dir = tempfile::tempdir().unwrap();
        let path = file(&dir, "a.py", "x = 1");

        let mut tabs = tabs();
        let id = tabs.open(&path).unwrap();
        tabs.get_mut(id).unwrap().editor_mut().surface_mut().insert_str("# ");
        assert!(tabs.get(id).unwrap().is_modified());
        assert!(tabs.get(id).unwrap().display_title().ends_with('\u{25cf}'));

        tabs.save(id).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# x = 1");
        assert!(!tabs.get(id).unwrap().is_modified());
        assert!(!dir.path().join(".a.py.lyra-tmp").exists());
    }

    #[test]
    fn test_save_as_retitles() {
        let dir = tempfile::tempdir().unwrap();
        let mut tabs = tabs();
        let id = tabs.new_untitled();
        tabs.get_mut(id).unwrap().editor_mut().set_text("body { }");

        let path = dir.path().join("style.css");
        tabs.save_as(id, &path).unwrap();
        let tab = tabs.get(id).unwrap();
        assert_eq!(tab.title(), "style.css");
        assert_eq!(tab.language(), "css");
        assert_eq!(tab.path(), Some(path.as_path()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "body { }");

        assert_eq!(tabs.save(id).unwrap(), path);
    }

    #[test]
    fn test_mark_saved_keeps_later_edits_dirty() {
        let mut tabs = tabs();
        let id = tabs.new_untitled();
        let surface = tabs.get_mut(id).unwrap().editor_mut().surface_mut();
        surface.insert_str("saved");
        let snapshot = surface.revision();
        surface.insert_str("!");

        let clean = tabs
            .mark_saved(id, Some(PathBuf::from("/tmp/notes.txt")), snapshot)
            .unwrap();
        assert!(!clean);
        let tab = tabs.get(id).unwrap();
        assert!(tab.is_modified());
        assert_eq!(tab.title(), "notes.txt");

        let current = tab.editor().surface().revision();
        assert!(tabs.mark_saved(id, None, current).unwrap());
        assert!(!tabs.get(id).unwrap().is_modified());
    }

    #[test]
    fn test_config_language_overrides() {
        let mut config = Config::default();
        config.languages.insert("inc".to_string(), "cpp".to_string());
        let mut tabs = Tabs::new(config);
        let id = tabs.open_loaded(PathBuf::from("/tmp/defs.inc"), "");
        assert_eq!(tabs.get(id).unwrap().language(), "cpp");
    }

    #[test]
    fn test_close_moves_focus() {
        let mut tabs = tabs();
        let a = tabs.new_untitled();
        let b = tabs.new_untitled();
        let c = tabs.new_untitled();

        tabs.activate(b).unwrap();
        tabs.close(b).unwrap();
        assert_eq!(tabs.active_id(), Some(c));
        tabs.close(c).unwrap();
        assert_eq!(tabs.active_id(), Some(a));
        tabs.close(a).unwrap();
        assert_eq!(tabs.active_id(), None);
        assert!(tabs.active().is_none());
    }

    #[test]
    fn test_unknown_tab() {
        let mut tabs = tabs();
        let stray = TabId::new();
        assert!(matches!(tabs.activate(stray), Err(CoreError::TabNotFound(_))));
        assert!(matches!(tabs.close(stray), Err(CoreError::TabNotFound(_))));
    }
}
