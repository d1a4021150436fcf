use cardsort_core::LockField;
use cardsort_engine::{CaptureMode, EngineError};
use cardsort_harness::TestApp;

// ============================================================================
// Capture sheet defaults
// ============================================================================

#[test]
fn sheet_defaults_to_base_parallel() -> Result<(), Box<dyn std::error::Error>> {
    let app = TestApp::sample()?;
    let sheet = app.engine.open_capture("2024 Topps", "Base", "1")?;

    assert_eq!(sheet.mode(), CaptureMode::Browse);
    assert_eq!(sheet.player(), "Alice");
    assert_eq!(sheet.parallel_options(), ["Base", "Gold", "Rainbow Foil"]);
    assert_eq!(sheet.values.parallel.as_deref(), Some("Base"));
    assert_eq!(sheet.values.quantity, 1);
    assert_eq!(sheet.max_quantity(), Some(99));
    assert_eq!(sheet.values.serial_number, None);
    assert_eq!(sheet.values.grade, None);
    assert_eq!(sheet.values.location, None);
    Ok(())
}

#[test]
fn set_without_base_flag_uses_first_parallel() -> Result<(), Box<dyn std::error::Error>> {
    let app = TestApp::sample()?;
    let sheet = app.engine.open_capture("2024 Topps", "Autographs", "A-1")?;
    assert_eq!(sheet.values.parallel.as_deref(), Some("Red"));
    Ok(())
}

#[test]
fn set_without_parallels_cannot_be_captured() -> Result<(), Box<dyn std::error::Error>> {
    let app = TestApp::sample()?;
    assert!(matches!(
        app.engine.open_capture("2024 Topps", "Promos", "P-1"),
        Err(EngineError::NoParallels { .. })
    ));
    Ok(())
}

#[test]
fn unknown_targets_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let app = TestApp::sample()?;
    assert!(matches!(
        app.engine.open_capture("1990 Fleer", "Base", "1"),
        Err(EngineError::UnknownProduct(_))
    ));
    assert!(matches!(
        app.engine.open_capture("2024 Topps", "Chrome", "1"),
        Err(EngineError::UnknownSet(_))
    ));
    assert!(matches!(
        app.engine.open_capture("2024 Topps", "Base", "42"),
        Err(EngineError::UnknownCard(_))
    ));
    Ok(())
}

// ============================================================================
// Confirm validation
// ============================================================================

#[test]
fn confirm_requires_a_parallel() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    for parallel in [None, Some(String::new()), Some("   ".to_string())] {
        let result = app.browse_capture("2024 Topps", "Base", "1", |v| v.parallel = parallel);
        assert!(matches!(result, Err(EngineError::MissingParallel)));
    }
    assert!(app.engine.pending().is_empty());
    Ok(())
}

#[test]
fn confirm_rejects_parallel_from_another_set() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    let result =
        app.browse_capture("2024 Topps", "Base", "1", |v| v.parallel = Some("Black".into()));
    assert!(matches!(result, Err(EngineError::UnknownParallel(_))));
    Ok(())
}

#[test]
fn browse_quantity_is_bounded() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    for quantity in [0, 100] {
        let result = app.browse_capture("2024 Topps", "Base", "1", |v| v.quantity = quantity);
        assert!(matches!(
            result,
            Err(EngineError::InvalidQuantity { max: 99, .. })
        ));
    }
    let entry = app.browse_capture("2024 Topps", "Base", "1", |v| v.quantity = 99)?;
    assert_eq!(entry.quantity, 99);
    Ok(())
}

#[test]
fn tags_must_come_from_the_vocabulary() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    let result =
        app.browse_capture("2024 Topps", "Base", "1", |v| v.location = Some("Box Z".into()));
    assert!(matches!(result, Err(EngineError::UnknownTag { .. })));

    let entry = app.browse_capture("2024 Topps", "Base", "1", |v| {
        v.location = Some("Binder 1".into());
        v.price_bucket = Some("$5-20".into());
        v.status = Some(String::new());
    })?;
    assert_eq!(entry.tags.location.as_deref(), Some("Binder 1"));
    assert_eq!(entry.tags.price_bucket.as_deref(), Some("$5-20"));
    assert_eq!(entry.tags.status, None);
    Ok(())
}

#[test]
fn entry_carries_card_details() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    let entry = app.browse_capture("2024 Topps", "Base", "2", |v| {
        v.serial_number = Some(" 5/25 ".into());
        v.grade = Some("BGS 9.5".into());
    })?;
    assert_eq!(entry.player, "Bob");
    assert_eq!(entry.team.as_deref(), Some("Mets"));
    assert_eq!(entry.serial_number.as_deref(), Some("5/25"));
    assert_eq!(entry.grade.as_deref(), Some("BGS 9.5"));
    assert_eq!(entry.notes, None);
    Ok(())
}

// ============================================================================
// Field locks
// ============================================================================

#[test]
fn locked_values_prefill_the_next_capture() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    assert!(app.engine.toggle_lock(LockField::Location, Some("Box A")));
    assert!(app.engine.toggle_lock(LockField::Grade, Some("PSA 10")));

    let sheet = app.engine.open_capture("2024 Topps", "Base", "2")?;
    assert_eq!(sheet.values.location.as_deref(), Some("Box A"));
    assert_eq!(sheet.values.grade.as_deref(), Some("PSA 10"));
    assert_eq!(sheet.values.status, None);
    Ok(())
}

#[test]
fn confirm_writes_submitted_values_into_locks() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    app.engine.toggle_lock(LockField::Location, Some("Box A"));

    app.browse_capture("2024 Topps", "Base", "1", |v| v.location = Some("Box B".into()))?;
    assert_eq!(app.engine.locks().value(LockField::Location), Some("Box B"));

    let sheet = app.engine.open_capture("2024 Topps", "Base", "2")?;
    assert_eq!(sheet.values.location.as_deref(), Some("Box B"));

    // unlocked fields are not captured by write-through
    assert!(!app.engine.locks().is_locked(LockField::Status));
    Ok(())
}

#[test]
fn clearing_a_locked_field_locks_it_empty() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    app.engine.toggle_lock(LockField::Grade, Some("PSA 10"));
    app.browse_capture("2024 Topps", "Base", "1", |v| v.grade = None)?;

    assert!(app.engine.locks().is_locked(LockField::Grade));
    let sheet = app.engine.open_capture("2024 Topps", "Base", "2")?;
    assert_eq!(sheet.values.grade, None);
    Ok(())
}

#[test]
fn locked_parallel_skipped_where_undefined_but_kept() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    app.engine.toggle_lock(LockField::Parallel, Some("Gold"));

    let inserts = app.engine.open_capture("2024 Topps", "Inserts", "I-1")?;
    assert_eq!(inserts.values.parallel.as_deref(), Some("Base"));
    let stored = app.engine.confirm_capture(&inserts)?;
    assert_eq!(stored.parallel, "Base");
    assert_eq!(app.engine.locks().value(LockField::Parallel), Some("Gold"));

    let autos = app.engine.open_capture("2024 Topps", "Autographs", "A-1")?;
    assert_eq!(autos.values.parallel.as_deref(), Some("Gold"));
    Ok(())
}

#[test]
fn explicit_parallel_choice_replaces_skipped_lock() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    app.engine.toggle_lock(LockField::Parallel, Some("Gold"));

    app.browse_capture("2024 Topps", "Inserts", "I-1", |v| v.parallel = Some("Black".into()))?;
    assert_eq!(app.engine.locks().value(LockField::Parallel), Some("Black"));
    Ok(())
}

#[test]
fn failed_capture_leaves_locks_alone() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    app.engine.toggle_lock(LockField::Location, Some("Box A"));
    app.faults().add_pending = true;

    let result =
        app.browse_capture("2024 Topps", "Base", "1", |v| v.location = Some("Box B".into()));
    assert!(matches!(result, Err(EngineError::Storage(_))));
    assert_eq!(app.engine.locks().value(LockField::Location), Some("Box A"));
    Ok(())
}

#[test]
fn toggle_twice_and_unlock_all() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::sample()?;
    app.engine.toggle_lock(LockField::Status, Some("Keep"));
    assert!(!app.engine.toggle_lock(LockField::Status, Some("Keep")));
    assert!(!app.engine.locks().is_locked(LockField::Status));

    app.engine.toggle_lock(LockField::Status, Some("Sell"));
    app.engine.toggle_lock(LockField::PriceBucket, Some("$1-5"));
    app.engine.unlock_all();
    assert!(app.engine.locks().locked_fields().is_empty());

    let sheet = app.engine.open_capture("2024 Topps", "Base", "1")?;
    assert_eq!(sheet.values.status, None);
    assert_eq!(sheet.values.price_bucket, None);
    Ok(())
}
