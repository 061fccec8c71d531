use super::state::FileOperationResult;
use super::*;
use crate::backend::INVALID_DFA_MESSAGE;
use crate::parse_tree::ParseTree;
use crate::types::Coordinate;
use eframe::egui;

fn screen() -> egui::Rect {
    egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1200.0, 800.0))
}

/// An app whose screen and world coordinates coincide.
fn app_at_origin() -> AutomataApp {
    let mut app = AutomataApp::default();
    app.canvas.centred = true;
    app.canvas.offset = egui::Vec2::ZERO;
    app.canvas.zoom_factor = 1.0;
    app
}

/// Draws one canvas frame on `ctx` with the given input events.
fn canvas_frame(ctx: &egui::Context, app: &mut AutomataApp, events: Vec<egui::Event>) {
    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(screen());
    raw.events = events;
    let _ = ctx.run(raw, |ctx| {
        ctx.set_visuals(egui::Visuals::dark());
        egui::CentralPanel::default().show(ctx, |ui| {
            app.draw_canvas(ui);
        });
    });
}

fn button(pos: egui::Pos2, pressed: bool) -> egui::Event {
    egui::Event::PointerButton {
        pos,
        button: egui::PointerButton::Primary,
        pressed,
        modifiers: egui::Modifiers::NONE,
    }
}

/// Moves to `pos`, presses and releases over three frames.
fn click_canvas(ctx: &egui::Context, app: &mut AutomataApp, pos: egui::Pos2) {
    canvas_frame(ctx, app, vec![egui::Event::PointerMoved(pos)]);
    canvas_frame(ctx, app, vec![button(pos, true)]);
    canvas_frame(ctx, app, vec![button(pos, false)]);
}

fn click(app: &mut AutomataApp, mode: EditorMode, x: f32, y: f32) {
    app.editor.set_mode(mode);
    app.click_world(egui::pos2(x, y));
}

/// Start state at (100,100), final state at (300,100), joined by `a`.
fn single_transition(app: &mut AutomataApp) {
    click(app, EditorMode::AddingStartNode, 100.0, 100.0);
    click(app, EditorMode::AddingNode, 300.0, 100.0);
    click(app, EditorMode::AddingFinalNode, 300.0, 100.0);
    click(app, EditorMode::PlacingEdgeStart, 100.0, 100.0);
    app.click_world(egui::pos2(300.0, 100.0));
}

#[test]
fn clicking_canvas_places_node_on_snapped_coordinate() {
    let mut app = app_at_origin();
    let ctx = egui::Context::default();

    click_canvas(&ctx, &mut app, egui::pos2(112.0, 138.0));

    let positions: Vec<_> = app.editor.graph().nodes().map(|n| n.position).collect();
    assert_eq!(positions, vec![Coordinate::new(100, 150)]);
    assert!(app.editor.history().can_undo());
}

#[test]
fn clicking_occupied_position_shows_dialogue() {
    let mut app = app_at_origin();
    let ctx = egui::Context::default();

    click_canvas(&ctx, &mut app, egui::pos2(200.0, 200.0));
    click_canvas(&ctx, &mut app, egui::pos2(205.0, 190.0));

    assert_eq!(app.editor.graph().node_count(), 1);
    assert_eq!(
        app.editor.dialogue(),
        Some("You cannot place a Node on top of another Node.")
    );
}

#[test]
fn undo_and_redo_follow_canvas_clicks() {
    let mut app = app_at_origin();
    click(&mut app, EditorMode::AddingNode, 100.0, 100.0);
    click(&mut app, EditorMode::AddingNode, 200.0, 100.0);

    app.perform_undo();
    assert_eq!(app.editor.graph().node_count(), 1);
    app.perform_redo();
    assert_eq!(app.editor.graph().node_count(), 2);

    app.perform_discard_all();
    assert_eq!(app.editor.graph().node_count(), 0);
    app.perform_redo();
    assert!(app.editor.graph().node_at(Coordinate::new(100, 100)).is_some());
}

#[test]
fn pending_edge_follows_pointer() {
    let mut app = app_at_origin();
    let ctx = egui::Context::default();
    click(&mut app, EditorMode::AddingNode, 100.0, 100.0);
    click(&mut app, EditorMode::PlacingEdgeStart, 100.0, 100.0);

    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(egui::pos2(240.0, 311.0))]);

    let pending = app.editor.pending_edge().expect("edge in progress");
    assert_eq!(pending.curve.control1, Coordinate::new(240, 311));
    assert_eq!(app.interaction.hover_world, Some(egui::pos2(240.0, 311.0)));
}

#[test]
fn select_tool_picks_up_and_bends_curve() {
    let mut app = app_at_origin();
    let ctx = egui::Context::default();
    single_transition(&mut app);

    click(&mut app, EditorMode::Idle, 200.0, 110.0);
    assert_eq!(app.editor.mode(), EditorMode::DraggingEdge);
    assert_eq!(app.editor.selected_edge(), Some(0));

    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(egui::pos2(300.0, 260.0))]);
    assert_eq!(
        app.editor.graph().edges()[0].curve.control1,
        Coordinate::new(300, 260)
    );

    // The next click lets go of the curve.
    app.click_world(egui::pos2(500.0, 500.0));
    assert_eq!(app.editor.mode(), EditorMode::Idle);
    assert!(app.editor.selected_edge().is_none());
}

#[test]
fn string_check_highlights_traversal() {
    let mut app = app_at_origin();
    single_transition(&mut app);
    app.backend.string_input = "a".to_string();

    app.request_string_check(&egui::Context::default());
    app.handle_backend_results();

    assert!(!app.backend_busy());
    let checked = app.backend.last_check.as_ref().expect("string was checked");
    assert_eq!(checked.is_string_accepted, Some(true));
    assert_eq!(
        app.backend.highlighted,
        vec![Coordinate::new(100, 100).key(), Coordinate::new(300, 100).key()]
    );

    // Editing the diagram makes the result stale.
    click(&mut app, EditorMode::AddingNode, 500.0, 100.0);
    assert!(app.backend.last_check.is_none());
    assert!(app.backend.highlighted.is_empty());
}

#[test]
fn traversal_is_not_highlighted_when_disabled() {
    let mut app = app_at_origin();
    single_transition(&mut app);
    app.editor.options.should_show_string_traversal = false;
    app.backend.string_input = "a".to_string();

    app.request_string_check(&egui::Context::default());
    app.handle_backend_results();

    assert!(app.backend.highlighted.is_empty());
    assert_eq!(
        app.backend.last_check.as_ref().and_then(|c| c.is_string_accepted),
        Some(true)
    );
}

#[test]
fn strict_check_reports_incomplete_dfa() {
    let mut app = app_at_origin();
    single_transition(&mut app);
    app.editor.options.should_strict_check = true;
    app.backend.string_input = "a".to_string();

    app.request_string_check(&egui::Context::default());
    app.handle_backend_results();

    assert_eq!(app.editor.dialogue(), Some(INVALID_DFA_MESSAGE));
    assert_eq!(
        app.backend.last_check.as_ref().map(|c| c.is_string_accepted),
        Some(None)
    );
}

#[test]
fn backend_save_and_load_round_trip() {
    let mut app = app_at_origin();
    let ctx = egui::Context::default();
    app.session.workspace_name = Some("homework".to_string());
    app.session.email = Some("student@example.com".to_string());
    single_transition(&mut app);
    let saved = app.editor.graph().clone();

    app.request_save(&ctx);
    app.handle_backend_results();
    app.perform_discard_all();
    assert_eq!(app.editor.graph().node_count(), 0);

    app.request_load(&ctx);
    app.handle_backend_results();
    assert_eq!(app.editor.graph(), &saved);
    assert!(!app.editor.history().can_redo());
    assert!(app.editor.dialogue().is_none());
}

#[test]
fn backend_failure_becomes_dialogue() {
    let mut app = app_at_origin();
    click(&mut app, EditorMode::AddingNode, 100.0, 100.0);

    app.request_load(&egui::Context::default());
    app.handle_backend_results();

    let dialogue = app.editor.dialogue().expect("failure is reported");
    assert!(dialogue.contains("no workspace is open"));
    assert_eq!(app.editor.graph().node_count(), 1);
}

#[test]
fn alphabet_field_is_sanitized() {
    let mut app = app_at_origin();
    app.backend.alphabet_input = "0, 1, 1, xy, ".to_string();

    app.request_alphabet_update(&egui::Context::default());

    assert_eq!(app.editor.options.alphabet, vec!["0", "1"]);
    assert_eq!(app.backend.alphabet_input, "0, 1");
    assert!(!app.backend_busy());
}

#[test]
fn opening_workspace_file_replaces_diagram() {
    let mut source = app_at_origin();
    single_transition(&mut source);
    let json = source.editor.snapshot().to_json().unwrap();

    let mut app = app_at_origin();
    click(&mut app, EditorMode::AddingNode, 700.0, 700.0);
    app.apply_file_result(FileOperationResult::WorkspaceLoaded(
        "automaton.json".to_string(),
        json,
    ));

    assert_eq!(app.editor.graph(), source.editor.graph());
    assert_eq!(app.file.current_path.as_deref(), Some("automaton.json"));
}

#[test]
fn opening_broken_workspace_keeps_diagram() {
    let mut app = app_at_origin();
    click(&mut app, EditorMode::AddingNode, 100.0, 100.0);

    app.apply_file_result(FileOperationResult::WorkspaceLoaded(
        "broken.json".to_string(),
        "{ not json".to_string(),
    ));

    assert_eq!(app.editor.graph().node_count(), 1);
    assert!(app.editor.dialogue().is_some_and(|d| d.contains("broken.json")));
    assert!(app.file.current_path.is_none());
}

#[test]
fn parse_tree_view_ignores_canvas_clicks() {
    let mut app = app_at_origin();
    let ctx = egui::Context::default();
    let tree = ParseTree::kleene(ParseTree::literal("a"));
    app.apply_file_result(FileOperationResult::ParseTreeLoaded(
        "tree.json".to_string(),
        serde_json::to_string(&tree).unwrap(),
    ));
    assert!(app.showing_parse_tree());

    click_canvas(&ctx, &mut app, egui::pos2(100.0, 100.0));
    assert_eq!(app.editor.graph().node_count(), 0);

    app.canvas.show_parse_tree = false;
    click_canvas(&ctx, &mut app, egui::pos2(100.0, 100.0));
    assert_eq!(app.editor.graph().node_count(), 1);
}

#[test]
fn first_frame_centres_world_origin() {
    let mut app = AutomataApp::default();
    let ctx = egui::Context::default();
    canvas_frame(&ctx, &mut app, Vec::new());

    assert!(app.canvas.centred);
    let origin = app.world_to_screen(egui::pos2(0.0, 0.0));
    assert!(screen().contains(origin));
    assert!(origin.x > 100.0 && origin.y > 100.0);
}

#[test]
fn app_state_round_trips_through_json() {
    let mut app = app_at_origin();
    single_transition(&mut app);
    app.canvas.zoom_factor = 1.5;
    app.dark_mode = false;
    app.editor.options.alphabet = vec!["a".to_string()];

    let json = app.to_json().unwrap();
    let restored = AutomataApp::from_json(&json).unwrap();

    assert_eq!(restored.editor.graph(), app.editor.graph());
    assert_eq!(restored.editor.options, app.editor.options);
    assert_eq!(restored.canvas.zoom_factor, 1.5);
    assert!(!restored.dark_mode);
    assert_eq!(restored.editor.history().applied().len(), 3);
}

#[test]
fn stored_state_with_bad_diagram_is_rejected() {
    let json = r#"{"editor": {"list_of_states": [
        {"position": {"x": 0, "y": 0}, "is_start": true, "is_final": false},
        {"position": {"x": 0, "y": 0}, "is_start": false, "is_final": false}
    ]}}"#;
    assert!(AutomataApp::from_json(json).is_err());
}

#[test]
fn toolbar_highlights_tool_for_follow_up_modes() {
    assert!(tool_is_active(EditorMode::PlacingEdgeEnd, EditorMode::PlacingEdgeStart));
    assert!(tool_is_active(EditorMode::DraggingEdge, EditorMode::Idle));
    assert!(tool_is_active(EditorMode::AddingNode, EditorMode::AddingNode));
    assert!(!tool_is_active(EditorMode::AddingNode, EditorMode::AddingStartNode));
}

#[test]
fn clearing_edge_character_field_reverts_on_blur() {
    let mut app = app_at_origin();
    let ctx = egui::Context::default();
    assert_eq!(app.backend.character_input, "a");

    app.backend.character_input.clear();
    app.commit_character_input(&ctx, false);
    assert_eq!(app.editor.options.default_connection_character, "a");
    assert_eq!(app.backend.character_input, "");

    app.commit_character_input(&ctx, true);
    assert_eq!(app.backend.character_input, "a");
    assert_eq!(app.editor.options.default_connection_character, "a");

    app.backend.character_input = "xy".to_string();
    app.commit_character_input(&ctx, false);
    assert_eq!(app.backend.character_input, "a");

    app.backend.character_input = "c".to_string();
    app.commit_character_input(&ctx, false);
    assert_eq!(app.editor.options.default_connection_character, "c");

    click(&mut app, EditorMode::AddingNode, 100.0, 100.0);
    click(&mut app, EditorMode::PlacingEdgeStart, 100.0, 100.0);
    app.click_world(egui::pos2(100.0, 100.0));
    assert_eq!(app.editor.graph().edges()[0].character, "c");
}

#[test]
fn save_after_open_writes_to_opened_file() {
    let path = std::env::temp_dir().join(format!(
        "automata-workbench-save-after-open-{}.json",
        std::process::id()
    ));
    let mut source = app_at_origin();
    click(&mut source, EditorMode::AddingNode, 100.0, 100.0);
    std::fs::write(&path, source.editor.snapshot().to_json().unwrap()).unwrap();

    let mut app = app_at_origin();
    let location = path.display().to_string();
    app.apply_file_result(FileOperationResult::WorkspaceLoaded(
        location.clone(),
        std::fs::read_to_string(&path).unwrap(),
    ));
    click(&mut app, EditorMode::AddingNode, 300.0, 100.0);

    app.file.pending_operation = Some(PendingFileOperation::Save);
    app.handle_pending_operations(&egui::Context::default());

    let content = std::fs::read_to_string(&path).unwrap();
    let written = crate::workspace::WorkspaceData::from_json(&content).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(written.list_of_states.len(), 2);
    assert_eq!(app.file.current_path.as_deref(), Some(location.as_str()));
}
