//! File operations for saving and loading workspaces and parse trees.
//!
//! Dialogs run on spawned tasks and report back over the file channel, which
//! is drained once per frame.

use super::backend_ops::spawn_task;
use super::state::{AutomataApp, FileOperationResult, PendingFileOperation};
use crate::parse_tree::ParseTree;
use crate::workspace::WorkspaceData;
use eframe::egui;
use std::sync::mpsc::Sender;

const DEFAULT_FILE_NAME: &str = "workspace.json";

impl AutomataApp {
    /// Handles completed file operations and starts the one requested, if any.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context for requesting repaints
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.file.receiver.try_recv() {
            self.apply_file_result(result);
        }

        let Some(operation) = self.file.pending_operation.take() else {
            return;
        };
        match operation {
            PendingFileOperation::Save => match self.file.current_path.clone() {
                Some(path) => self.write_workspace(path),
                None => self.save_workspace_as(ctx),
            },
            PendingFileOperation::SaveAs => self.save_workspace_as(ctx),
            PendingFileOperation::Open => {
                self.pick_file(ctx, FileOperationResult::WorkspaceLoaded)
            }
            PendingFileOperation::OpenParseTree => {
                self.pick_file(ctx, FileOperationResult::ParseTreeLoaded)
            }
        }
    }

    /// Applies the outcome of a file operation.
    pub fn apply_file_result(&mut self, result: FileOperationResult) {
        match result {
            FileOperationResult::SaveCompleted(path) => {
                log::info!("Saved workspace to {path}");
                self.file.current_path = Some(path);
            }
            FileOperationResult::WorkspaceLoaded(path, content) => {
                let restored = WorkspaceData::from_json(&content)
                    .and_then(|data| self.editor.restore(data));
                match restored {
                    Ok(()) => {
                        log::info!("Loaded workspace from {path}");
                        self.file.current_path = Some(path);
                        self.sync_option_inputs();
                        self.canvas.show_parse_tree = false;
                        self.clear_string_result();
                    }
                    Err(err) => {
                        log::error!("Failed to load workspace from {path}: {err}");
                        self.editor
                            .set_dialogue(format!("Could not open {path}: {err}"));
                    }
                }
            }
            FileOperationResult::ParseTreeLoaded(path, content) => {
                match serde_json::from_str::<ParseTree>(&content) {
                    Ok(tree) => {
                        log::info!("Loaded parse tree with {} tokens from {path}", tree.size());
                        self.parse_tree = Some(tree);
                        self.canvas.show_parse_tree = true;
                    }
                    Err(err) => {
                        log::error!("Failed to parse tree in {path}: {err}");
                        self.editor.set_dialogue(format!(
                            "Could not read a parse tree from {path}: {err}"
                        ));
                    }
                }
            }
            FileOperationResult::OperationFailed(error) => {
                log::error!("File operation failed: {error}");
                self.editor.set_dialogue(error);
            }
        }
    }

    fn workspace_json(&self) -> Option<String> {
        match self.editor.snapshot().to_json() {
            Ok(json) => Some(json),
            Err(err) => {
                log::error!("Failed to serialize workspace: {err}");
                self.file
                    .sender
                    .send(FileOperationResult::OperationFailed(err.to_string()))
                    .ok();
                None
            }
        }
    }

    /// Writes the workspace to `path` without asking.
    #[cfg(not(target_arch = "wasm32"))]
    fn write_workspace(&mut self, path: String) {
        let Some(json) = self.workspace_json() else {
            return;
        };
        let result = match std::fs::write(&path, json) {
            Ok(()) => FileOperationResult::SaveCompleted(path),
            Err(err) => {
                FileOperationResult::OperationFailed(format!("Failed to write {path}: {err}"))
            }
        };
        self.apply_file_result(result);
    }

    #[cfg(target_arch = "wasm32")]
    fn write_workspace(&mut self, _path: String) {
        self.apply_file_result(FileOperationResult::OperationFailed(
            "Saving files is not available in the browser".to_string(),
        ));
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn save_workspace_as(&mut self, ctx: &egui::Context) {
        let Some(json) = self.workspace_json() else {
            return;
        };
        let sender = self.file.sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("JSON", &["json"])
                .set_file_name(DEFAULT_FILE_NAME)
                .save_file()
                .await
            else {
                return;
            };
            let path = handle.path().display().to_string();
            let result = match std::fs::write(handle.path(), json) {
                Ok(()) => FileOperationResult::SaveCompleted(path),
                Err(err) => {
                    FileOperationResult::OperationFailed(format!("Failed to write {path}: {err}"))
                }
            };
            report(&sender, result);
            ctx.request_repaint();
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn save_workspace_as(&mut self, _ctx: &egui::Context) {
        self.write_workspace(DEFAULT_FILE_NAME.to_string());
    }

    /// Asks for a JSON file and reports its content wrapped by `wrap`.
    fn pick_file(&mut self, ctx: &egui::Context, wrap: fn(String, String) -> FileOperationResult) {
        let sender = self.file.sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("JSON", &["json"])
                .pick_file()
                .await
            else {
                return;
            };
            let location = location_of(&handle);
            let bytes = handle.read().await;
            let result = match String::from_utf8(bytes) {
                Ok(content) => wrap(location, content),
                Err(err) => {
                    FileOperationResult::OperationFailed(format!("{location} is not UTF-8: {err}"))
                }
            };
            report(&sender, result);
            ctx.request_repaint();
        });
    }
}

/// Where a picked file lives, so a later plain Save writes back to it.
#[cfg(not(target_arch = "wasm32"))]
fn location_of(handle: &rfd::FileHandle) -> String {
    handle.path().display().to_string()
}

/// Browsers only expose the file name.
#[cfg(target_arch = "wasm32")]
fn location_of(handle: &rfd::FileHandle) -> String {
    handle.file_name()
}

fn report(sender: &Sender<FileOperationResult>, result: FileOperationResult) {
    if sender.send(result).is_err() {
        log::warn!("File result dropped: the app has shut down");
    }
}
