mod common;

use common::{call_log, count, memory_store, TestMode};
use modeswitch::config::Config;
use modeswitch::host::{HostEvent, MessageLevel};
use modeswitch::modes::builtin_modes;
use modeswitch::registry::{ModeError, ShutdownOutcome};
use modeswitch::session::{
    select, BootOutcome, PositionDispatcher, SelectionTarget, Session, DISABLE_ALL_COMMAND,
    SELECT_MODE_COMMAND,
};
use modeswitch::store::{PersistedActiveMode, SharedStore};
use std::rc::Rc;

fn builtin_session(config: Config, store: SharedStore) -> Session {
    let session = Session::new(config, store);
    for mode in builtin_modes(session.config(), session.status_bar(), session.notifications()) {
        session.register(mode).unwrap();
    }
    session
}

#[test]
fn test_first_start_defaults_to_position() {
    let session = builtin_session(Config::default(), memory_store());

    assert_eq!(
        session.start(),
        BootOutcome::Defaulted("position".to_string())
    );
    assert!(session.notifications().is_empty());
    assert!(session
        .status_bar()
        .visible_texts()
        .contains(&"[Position HUD]".to_string()));
    assert_eq!(
        session.status_bar().command_for("[Position HUD]").as_deref(),
        Some(SELECT_MODE_COMMAND)
    );
}

#[test]
fn test_restores_mode_from_previous_session() {
    let store = memory_store();

    let first = builtin_session(Config::default(), store.clone());
    first.start();
    first.select(&SelectionTarget::Mode("records".to_string())).unwrap();
    assert_eq!(first.shutdown(), ShutdownOutcome::Completed);
    assert_eq!(
        first.registry().persisted(),
        PersistedActiveMode::Mode("records".to_string())
    );

    let second = builtin_session(Config::default(), store);
    assert_eq!(second.start(), BootOutcome::Restored("records".to_string()));
}

#[test]
fn test_disabled_survives_restart() {
    let store = memory_store();

    let first = builtin_session(Config::default(), store.clone());
    first.start();
    first.select(&SelectionTarget::DisableAll).unwrap();
    first.shutdown();

    let second = builtin_session(Config::default(), store);
    assert_eq!(second.start(), BootOutcome::Disabled);
    assert!(second.registry().get_active().is_none());
    assert!(second.status_line(40).ends_with("[no mode]"));
}

#[test]
fn test_unregistered_persisted_mode_falls_to_default() {
    let store = memory_store();
    PersistedActiveMode::Mode("retired".to_string())
        .write(&mut *store.borrow_mut())
        .unwrap();

    let session = builtin_session(Config::default(), store);
    assert_eq!(
        session.start(),
        BootOutcome::Defaulted("position".to_string())
    );
}

#[test]
fn test_configured_default_mode() {
    let config = Config {
        default_mode: Some("line-length".to_string()),
        ..Config::default()
    };
    let session = builtin_session(config, memory_store());
    assert_eq!(
        session.start(),
        BootOutcome::Defaulted("line-length".to_string())
    );
}

#[test]
fn test_unknown_configured_default_uses_fallback() {
    let config = Config {
        default_mode: Some("sparkles".to_string()),
        ..Config::default()
    };
    let session = builtin_session(config, memory_store());
    assert_eq!(
        session.start(),
        BootOutcome::Defaulted("position".to_string())
    );
}

#[test]
fn test_failing_default_falls_back_once() {
    let log = call_log();
    let config = Config {
        default_mode: Some("broken".to_string()),
        ..Config::default()
    };
    let session = Session::new(config, memory_store());
    let (broken, _) = TestMode::new("broken", &log).failing(true);
    session.register(Box::new(broken)).unwrap();
    session
        .register(Box::new(TestMode::new("position", &log)))
        .unwrap();

    assert_eq!(session.start(), BootOutcome::FellBack("position".to_string()));
    assert!(session.notifications().is_empty());
    assert_eq!(count(&log, "broken:activate"), 1);
}

#[test]
fn test_failed_startup_reports_exactly_once() {
    let log = call_log();
    let config = Config {
        default_mode: Some("broken".to_string()),
        ..Config::default()
    };
    let session = Session::new(config, memory_store());
    let (broken, _) = TestMode::new("broken", &log).failing(true);
    let (fallback, _) = TestMode::new("position", &log).failing(true);
    session.register(Box::new(broken)).unwrap();
    session.register(Box::new(fallback)).unwrap();

    assert_eq!(session.start(), BootOutcome::Failed);
    assert!(session.registry().get_active().is_none());

    let messages = session.notifications().drain();
    assert_eq!(messages.len(), 1, "{:?}", messages);
    assert_eq!(messages[0].level, MessageLevel::Error);
    assert!(messages[0].text.starts_with("No mode could be activated"));
    assert_eq!(count(&log, "position:activate"), 1);
}

#[test]
fn test_failing_fallback_is_not_retried() {
    let log = call_log();
    let session = Session::new(Config::default(), memory_store());
    let (fallback, _) = TestMode::new("position", &log).failing(true);
    session.register(Box::new(fallback)).unwrap();

    assert_eq!(session.start(), BootOutcome::Failed);
    assert_eq!(count(&log, "position:activate"), 1);
    assert_eq!(session.notifications().len(), 1);
}

#[test]
fn test_missing_fallback_reports_failure() {
    let log = call_log();
    let config = Config {
        default_mode: Some("broken".to_string()),
        ..Config::default()
    };
    let session = Session::new(config, memory_store());
    let (broken, _) = TestMode::new("broken", &log).failing(true);
    session.register(Box::new(broken)).unwrap();

    assert_eq!(session.start(), BootOutcome::Failed);
    assert_eq!(session.notifications().len(), 1);
}

#[test]
fn test_selection_items_list_modes_then_disable_all() {
    let session = builtin_session(Config::default(), memory_store());
    session.start();

    let items = session.selection_items();
    let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["position", "line-length", "records", "none"]);
    assert!(items[0].active);
    assert!(!items[3].active);
    assert_eq!(items[3].name, "Disable all modes");

    session.select(&SelectionTarget::DisableAll).unwrap();
    let items = session.selection_items();
    assert!(items.iter().take(3).all(|item| !item.active));
    assert!(items[3].active);
}

#[test]
fn test_select_notifies_only_on_change() {
    let session = builtin_session(Config::default(), memory_store());
    session.start();

    session.select(&SelectionTarget::Mode("records".to_string())).unwrap();
    let messages = session.notifications().drain();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Records activated");

    session.select(&SelectionTarget::Mode("records".to_string())).unwrap();
    assert!(session.notifications().is_empty());

    session.select(&SelectionTarget::DisableAll).unwrap();
    assert_eq!(session.notifications().drain()[0].text, "All modes disabled");

    session.select(&SelectionTarget::DisableAll).unwrap();
    assert!(session.notifications().is_empty());
}

#[test]
fn test_select_unknown_mode_reports_once() {
    let session = builtin_session(Config::default(), memory_store());
    session.start();

    let err = session
        .select(&SelectionTarget::Mode("sparkles".to_string()))
        .unwrap_err();
    assert!(matches!(err, ModeError::UnknownMode(_)));

    let messages = session.notifications().drain();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].level, MessageLevel::Error);
    assert_eq!(session.registry().active_id().as_deref(), Some("position"));
}

#[test]
fn test_busy_selection_is_a_warning() {
    let log = call_log();
    let session = Session::new(Config::default(), memory_store());
    let weak = Rc::downgrade(session.registry());
    let notes = session.notifications().clone();
    let a = TestMode::new("a", &log).on_activate(move || {
        let registry = weak.upgrade().unwrap();
        let _ = select(
            &registry,
            &SelectionTarget::Mode("b".to_string()),
            &notes,
        );
    });
    session.register(Box::new(a)).unwrap();
    session.register(Box::new(TestMode::new("b", &log))).unwrap();

    session.select(&SelectionTarget::Mode("a".to_string())).unwrap();

    let messages = session.notifications().drain();
    let levels: Vec<MessageLevel> = messages.iter().map(|m| m.level).collect();
    assert_eq!(levels, vec![MessageLevel::Warning, MessageLevel::Info]);
    assert_eq!(session.registry().active_id().as_deref(), Some("a"));
}

#[test]
fn test_host_commands_drive_selection() {
    let session = builtin_session(Config::default(), memory_store());
    session.start();

    session
        .execute_command(SELECT_MODE_COMMAND, &["records".to_string()])
        .unwrap();
    assert_eq!(session.registry().active_id().as_deref(), Some("records"));
    assert!(session
        .status_bar()
        .visible_texts()
        .contains(&"[Records]".to_string()));

    session.execute_command(DISABLE_ALL_COMMAND, &[]).unwrap();
    assert!(session.registry().active_id().is_none());
    assert_eq!(
        session.registry().persisted(),
        PersistedActiveMode::Disabled
    );

    session
        .execute_command(SELECT_MODE_COMMAND, &["none".to_string()])
        .unwrap();
    assert!(session.registry().active_id().is_none());
}

#[test]
fn test_select_command_without_argument_fails_once() {
    let session = builtin_session(Config::default(), memory_store());
    session.start();
    session.notifications().drain();

    let err = session.execute_command(SELECT_MODE_COMMAND, &[]).unwrap_err();
    assert!(matches!(err, ModeError::CommandFailed { .. }));
    assert_eq!(session.notifications().len(), 1);
}

#[test]
fn test_host_commands_survive_mode_switches() {
    let session = builtin_session(Config::default(), memory_store());
    session.start();
    session.select(&SelectionTarget::Mode("records".to_string())).unwrap();
    session.select(&SelectionTarget::DisableAll).unwrap();

    let ids = session.registry().command_ids();
    assert!(ids.contains(&SELECT_MODE_COMMAND.to_string()));
    assert!(ids.contains(&DISABLE_ALL_COMMAND.to_string()));
}

#[test]
fn test_events_reach_only_the_active_mode() {
    let log = call_log();
    let session = Session::new(Config::default(), memory_store());
    session.register(Box::new(TestMode::new("position", &log))).unwrap();
    session.register(Box::new(TestMode::new("other", &log))).unwrap();
    session.start();

    session.cursor_moved(4, 2);
    session.handle_event(&HostEvent::CursorMoved { line: 5, column: 1 });
    session.handle_event(&HostEvent::DocumentChanged {
        line: 5,
        line_length: 12,
        inserted: 1,
        removed: 0,
    });

    assert_eq!(count(&log, "position:update(4,2)"), 1);
    assert_eq!(count(&log, "position:update(5,1)"), 1);
    assert_eq!(count(&log, "position:event(edit 5 12 1 0)"), 1);
    assert!(log.borrow().iter().all(|entry| !entry.starts_with("other:")));
}

#[test]
fn test_dispatcher_forwards_every_cursor_move() {
    let log = call_log();
    let registry = common::registry();
    registry.register(Box::new(TestMode::new("a", &log))).unwrap();
    registry.activate("a").unwrap();

    let dispatcher = PositionDispatcher::new(registry.clone());
    for column in 0..5 {
        dispatcher.cursor_moved(0, column);
    }
    let updates = log
        .borrow()
        .iter()
        .filter(|entry| entry.starts_with("a:update"))
        .count();
    assert_eq!(updates, 5);
}

#[test]
fn test_shutdown_hides_everything_and_keeps_persisted_mode() {
    let session = builtin_session(Config::default(), memory_store());
    session.start();
    session.select(&SelectionTarget::Mode("records".to_string())).unwrap();

    assert_eq!(session.shutdown(), ShutdownOutcome::Completed);
    assert!(session.status_bar().visible_texts().is_empty());
    assert!(session.registry().command_ids().is_empty());
    assert_eq!(
        session.registry().persisted(),
        PersistedActiveMode::Mode("records".to_string())
    );
}
