mod common;

use common::{descriptor, plan, FakeConnector, HARNESS};
use recette::session::with_session;
use recette::{ErrorCode, LifecycleSession, SessionPlan, SessionState};

#[test]
fn prepares_in_order_and_closes_once() {
    let connector = FakeConnector::new();
    let target = descriptor("15", 5437);

    let total = with_session(&connector, &target, &plan(None), |conn| {
        conn.query_i64("SELECT \"z_asgard_recette\".count_tests()::bigint")
    })
    .unwrap();
    assert_eq!(total, 0);

    let state = connector.state.borrow();
    assert_eq!(
        state.statements_for(5437),
        vec![
            "BEGIN".to_string(),
            "CREATE EXTENSION IF NOT EXISTS \"postgres_fdw\" ;".to_string(),
            "DROP EXTENSION IF EXISTS \"asgard\" ;\nCREATE EXTENSION \"asgard\" ;\nDROP SCHEMA IF EXISTS \"z_asgard_recette\" CASCADE ;".to_string(),
            HARNESS.to_string(),
            "COMMIT".to_string(),
            "SELECT \"z_asgard_recette\".count_tests()::bigint".to_string(),
        ]
    );
    assert_eq!(state.closes_for(5437), 1);
}

#[test]
fn prerequisite_failure_rolls_back_and_closes() {
    let connector = FakeConnector::new().fail_on("postgres_fdw");
    let target = descriptor("15", 5437);

    let err = with_session(&connector, &target, &plan(None), |_| Ok(())).unwrap_err();
    assert_eq!(err.code, ErrorCode::DbStatementFailed);

    let state = connector.state.borrow();
    let statements = state.statements_for(5437);
    assert!(!statements.iter().any(|s| s.contains("DROP EXTENSION")));
    assert_eq!(statements.last().map(String::as_str), Some("ROLLBACK"));
    assert_eq!(state.closes_for(5437), 1);
}

#[test]
fn reset_failure_closes_once() {
    let connector = FakeConnector::new().fail_on("DROP EXTENSION");
    let target = descriptor("14", 5436);

    let err = LifecycleSession::open(&connector, &target, &plan(None)).unwrap_err();
    assert_eq!(err.code, ErrorCode::DbStatementFailed);

    let state = connector.state.borrow();
    assert!(!state.statements_for(5436).iter().any(|s| s == HARNESS));
    assert_eq!(state.closes_for(5436), 1);
}

#[test]
fn harness_failure_closes_once() {
    let connector = FakeConnector::new().fail_on("z_asgard_recette.t001");
    let target = descriptor("14", 5436);

    let err = with_session(&connector, &target, &plan(None), |_| Ok(())).unwrap_err();
    assert_eq!(err.code, ErrorCode::DbStatementFailed);
    assert_eq!(connector.state.borrow().closes_for(5436), 1);
}

#[test]
fn failure_inside_callback_still_closes() {
    let connector = FakeConnector::new();
    let target = descriptor("13", 5435);

    let err = with_session(&connector, &target, &plan(None), |conn| {
        conn.batch_execute("SELECT 1")?;
        Err::<(), _>(recette::Error::internal_unexpected("boom"))
    })
    .unwrap_err();

    assert_eq!(err.code, ErrorCode::InternalUnexpected);
    assert_eq!(connector.state.borrow().closes_for(5435), 1);
}

#[test]
fn refused_connection_never_opens_a_session() {
    let connector = FakeConnector::new().refuse(5437);
    let target = descriptor("15", 5437);

    let mut called = false;
    let err = with_session(&connector, &target, &plan(None), |_| {
        called = true;
        Ok(())
    })
    .unwrap_err();

    assert_eq!(err.code, ErrorCode::DbConnectFailed);
    assert!(!called);
    let state = connector.state.borrow();
    assert!(state.statements.is_empty());
    assert!(state.closes.is_empty());
}

#[test]
fn unavailable_version_is_reported_before_reset() {
    let connector = FakeConnector::new();
    let target = descriptor("15", 5437);

    let err = with_session(&connector, &target, &plan(Some("9.9.9")), |_| Ok(())).unwrap_err();
    assert_eq!(err.code, ErrorCode::ExtensionVersionUnavailable);
    assert_eq!(err.details["version"], "9.9.9");

    let state = connector.state.borrow();
    assert!(!state
        .statements_for(5437)
        .iter()
        .any(|s| s.contains("DROP EXTENSION")));
    assert_eq!(state.closes_for(5437), 1);
}

#[test]
fn available_version_is_pinned() {
    let connector = FakeConnector::new().with_version_available();
    let target = descriptor("15", 5437);

    with_session(&connector, &target, &plan(Some("1.4.0")), |_| Ok(())).unwrap();

    let state = connector.state.borrow();
    let statements = state.statements_for(5437);
    assert!(statements
        .iter()
        .any(|s| s.contains("CREATE EXTENSION \"asgard\" VERSION '1.4.0'")));
    assert!(!statements.iter().any(|s| s.contains("DROP SCHEMA")));
}

#[test]
fn explicit_close_and_drop_release_once() {
    let connector = FakeConnector::new();
    let target = descriptor("12", 5434);

    let mut session = LifecycleSession::open(&connector, &target, &plan(None)).unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    session.connection().unwrap().batch_execute("SELECT 1").unwrap();
    session.close().unwrap();
    assert_eq!(connector.state.borrow().closes_for(5434), 1);

    {
        let _dropped = LifecycleSession::open(&connector, &target, &plan(None)).unwrap();
    }
    assert_eq!(connector.state.borrow().closes_for(5434), 2);
}

#[test]
fn requirements_precede_the_reset() {
    let connector = FakeConnector::new();
    let target = descriptor("15", 5437);
    let with_requirements = SessionPlan {
        extension_requirements: vec!["hstore".to_string(), "pg_trgm".to_string()],
        ..plan(None)
    };

    with_session(&connector, &target, &with_requirements, |_| Ok(())).unwrap();

    let state = connector.state.borrow();
    let statements = state.statements_for(5437);
    assert_eq!(
        &statements[..4],
        &[
            "BEGIN".to_string(),
            "CREATE EXTENSION IF NOT EXISTS \"postgres_fdw\" ;".to_string(),
            "CREATE EXTENSION IF NOT EXISTS \"hstore\" ;".to_string(),
            "CREATE EXTENSION IF NOT EXISTS \"pg_trgm\" ;".to_string(),
        ]
    );
    assert!(statements[4].starts_with("DROP EXTENSION IF EXISTS \"asgard\" ;"));
}

#[test]
fn failed_extension_requirement_stops_before_reset() {
    let connector = FakeConnector::new().fail_on("\"hstore\"");
    let target = descriptor("15", 5437);
    let with_requirements = SessionPlan {
        extension_requirements: vec!["hstore".to_string()],
        ..plan(None)
    };

    let err = LifecycleSession::open(&connector, &target, &with_requirements).unwrap_err();
    assert_eq!(err.code, ErrorCode::DbStatementFailed);

    let state = connector.state.borrow();
    assert!(!state
        .statements_for(5437)
        .iter()
        .any(|s| s.contains("DROP EXTENSION")));
    assert_eq!(state.closes_for(5437), 1);
}

#[test]
fn debug_output_names_target_and_state() {
    let connector = FakeConnector::new();
    let target = descriptor("11", 5433);

    let session = LifecycleSession::open(&connector, &target, &plan(None)).unwrap();
    let shown = format!("{:?}", session);
    assert!(shown.contains("localhost:5433"));
    assert!(shown.contains("Ready"));
    assert!(!shown.contains("secret"));
}
