//! Requests to the automata backend and handling of their answers.
//!
//! Each request clones what it needs out of the app, runs on a spawned task,
//! and sends a [`BackendResult`] back over the backend channel.

use super::state::{AutomataApp, BackendResult};
use crate::backend::check_string;
use crate::workspace::sanitize_alphabet;
use eframe::egui;
use std::future::Future;

/// Runs `task` on the tokio runtime, or to completion right here when there
/// is none.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn spawn_task<F>(task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(task);
        }
        Err(_) => futures::executor::block_on(task),
    }
}

/// Runs `task` on the browser's event loop.
#[cfg(target_arch = "wasm32")]
pub(crate) fn spawn_task<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(task);
}

impl AutomataApp {
    fn spawn_request<F>(&mut self, ctx: &egui::Context, request: F)
    where
        F: Future<Output = BackendResult> + Send + 'static,
    {
        let sender = self.backend.sender.clone();
        let ctx = ctx.clone();
        self.backend.in_flight += 1;
        spawn_task(async move {
            if sender.send(request.await).is_err() {
                log::warn!("Backend result dropped: the app has shut down");
            }
            ctx.request_repaint();
        });
    }

    /// Whether any request is still waiting for an answer.
    pub fn backend_busy(&self) -> bool {
        self.backend.in_flight > 0
    }

    /// Tests the string in the input field against the diagram.
    pub fn request_string_check(&mut self, ctx: &egui::Context) {
        let check = self
            .editor
            .string_check(Some(self.backend.string_input.clone()));
        let backend = self.backend.backend.clone();
        log::debug!("checking {:?} as {:?}", check.input, check.kind);
        self.spawn_request(ctx, async move {
            BackendResult::Checked(check_string(backend.as_ref(), check).await)
        });
    }

    /// Stores the diagram under the current session.
    pub fn request_save(&mut self, ctx: &egui::Context) {
        let request = self
            .backend
            .backend
            .save_workspace(self.session.clone(), self.editor.snapshot());
        self.spawn_request(ctx, async move { BackendResult::Saved(request.await) });
    }

    /// Fetches the diagram saved under the current session.
    pub fn request_load(&mut self, ctx: &egui::Context) {
        let request = self.backend.backend.load_workspace(self.session.clone());
        self.spawn_request(ctx, async move { BackendResult::Loaded(request.await) });
    }

    /// Applies the typed alphabet, and stores it when a workspace is open.
    pub fn request_alphabet_update(&mut self, ctx: &egui::Context) {
        let alphabet = sanitize_alphabet(self.backend.alphabet_input.split(','));
        self.editor.options.alphabet = alphabet.clone();
        self.backend.alphabet_input = alphabet.join(", ");
        if self.session.credentials().is_some() {
            let request = self
                .backend
                .backend
                .update_workspace_alphabet(self.session.clone(), alphabet);
            self.spawn_request(ctx, async move {
                BackendResult::AlphabetUpdated(request.await)
            });
        }
    }

    /// Stores the strict-checking flag when a workspace is open.
    pub fn request_strict_checking_update(&mut self, ctx: &egui::Context) {
        if self.session.credentials().is_none() {
            return;
        }
        let request = self.backend.backend.update_strict_checking(
            self.session.clone(),
            self.editor.options.should_strict_check,
        );
        self.spawn_request(ctx, async move {
            BackendResult::StrictCheckingUpdated(request.await)
        });
    }

    /// Stores the traversal-highlighting flag when a workspace is open.
    pub fn request_traversal_update(&mut self, ctx: &egui::Context) {
        if !self.editor.options.should_show_string_traversal {
            self.backend.highlighted.clear();
        }
        if self.session.credentials().is_none() {
            return;
        }
        let request = self.backend.backend.update_showing_string_traversal(
            self.session.clone(),
            self.editor.options.should_show_string_traversal,
        );
        self.spawn_request(ctx, async move { BackendResult::TraversalUpdated(request.await) });
    }

    /// Takes the edge character field's text as the default edge character.
    ///
    /// Exactly one character is accepted. Anything longer is refused at once.
    /// An empty field is left alone while it is being edited and reverts to
    /// the current default once `finished` is set.
    pub fn commit_character_input(&mut self, ctx: &egui::Context, finished: bool) {
        let current = &self.editor.options.default_connection_character;
        match self.backend.character_input.chars().count() {
            1 if self.backend.character_input != *current => {
                self.editor.options.default_connection_character =
                    self.backend.character_input.clone();
                self.request_default_character_update(ctx);
            }
            1 => {}
            0 if !finished => {}
            _ => self.backend.character_input = current.clone(),
        }
    }

    /// Copies the alphabet and edge character options into their text fields.
    pub fn sync_option_inputs(&mut self) {
        self.backend.alphabet_input = self.editor.options.alphabet.join(", ");
        self.backend.character_input = self.editor.options.default_connection_character.clone();
    }

    /// Stores the default edge character when a workspace is open.
    pub fn request_default_character_update(&mut self, ctx: &egui::Context) {
        if self.session.credentials().is_none() {
            return;
        }
        let request = self.backend.backend.update_default_connection_character(
            self.session.clone(),
            self.editor.options.default_connection_character.clone(),
        );
        self.spawn_request(ctx, async move {
            BackendResult::DefaultCharacterUpdated(request.await)
        });
    }

    /// Drains answered requests.
    pub fn handle_backend_results(&mut self) {
        while let Ok(result) = self.backend.receiver.try_recv() {
            self.backend.in_flight = self.backend.in_flight.saturating_sub(1);
            self.apply_backend_result(result);
        }
    }

    /// Applies one backend answer to the app.
    ///
    /// Failures never change the diagram; their message becomes the dialogue.
    pub fn apply_backend_result(&mut self, result: BackendResult) {
        let outcome = match result {
            BackendResult::Checked(result) => result.map(|checked| {
                if !checked.dialogue.is_empty() {
                    self.editor.set_dialogue(checked.dialogue.clone());
                }
                self.backend.highlighted = if self.editor.options.should_show_string_traversal {
                    checked.states_traversed.iter().map(|node| node.key()).collect()
                } else {
                    Vec::new()
                };
                self.backend.last_check = Some(checked);
            }),
            BackendResult::Saved(result) => result.map(|()| {
                log::info!("Workspace saved to the backend");
            }),
            BackendResult::Loaded(result) => result.and_then(|data| {
                self.editor.restore(data).map_err(|err| {
                    crate::error::BackendError::MalformedResponse {
                        command: "load_workspace".to_string(),
                        message: err.to_string(),
                    }
                })?;
                self.sync_option_inputs();
                self.clear_string_result();
                Ok(())
            }),
            BackendResult::AlphabetUpdated(result) => result.map(|alphabet| {
                self.backend.alphabet_input = alphabet.join(", ");
                self.editor.options.alphabet = alphabet;
            }),
            BackendResult::StrictCheckingUpdated(result) => result.map(|enabled| {
                self.editor.options.should_strict_check = enabled;
            }),
            BackendResult::TraversalUpdated(result) => result.map(|enabled| {
                self.editor.options.should_show_string_traversal = enabled;
            }),
            BackendResult::DefaultCharacterUpdated(result) => result.map(|character| {
                self.backend.character_input = character.clone();
                self.editor.options.default_connection_character = character;
            }),
        };

        if let Err(err) = outcome {
            log::error!("Backend request failed: {err}");
            self.editor.set_dialogue(err.to_string());
        }
    }

    /// Forgets the last string check and its highlighted states.
    pub fn clear_string_result(&mut self) {
        self.backend.last_check = None;
        self.backend.highlighted.clear();
    }
}
