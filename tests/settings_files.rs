use sqlstencil::settings::Settings;

#[test]
fn missing_file_gives_defaults() {
    let settings = Settings::load("no_such_sqlstencil_config.toml").expect("settings");
    assert_eq!(settings.log.filter, "info");
    assert!(settings.database.path.is_none());
    assert!(!settings.database.recreate_on_startup);
    // in-memory databases need no file
    let mut session = settings.open_session().expect("session");
    assert!(session.catalog().list_tables().expect("tables").is_empty());
}

#[test]
fn file_settings_are_read_and_recreate_clears_the_database() {
    let dir = std::env::temp_dir();
    let database = dir.join("sqlstencil_settings_test.db");
    let config = dir.join("sqlstencil_settings_test.toml");
    let _ = std::fs::remove_file(&database);
    std::fs::write(
        &config,
        format!(
            "[database]\npath = {:?}\nrecreate_on_startup = false\n\n[log]\nfilter = \"debug\"\n",
            database.to_string_lossy()
        ),
    )
    .expect("write config");

    let settings = Settings::load(&config).expect("settings");
    assert_eq!(settings.log.filter, "debug");
    assert_eq!(settings.database.path.as_deref(), Some(database.as_path()));
    {
        let mut session = settings.open_session().expect("session");
        session.catalog().create_tables("create table kept (id integer);").expect("schema");
    }
    {
        let mut session = settings.open_session().expect("reopen");
        assert_eq!(session.catalog().list_tables().expect("tables"), vec!["kept"]);
    }

    let recreate = Settings { database: sqlstencil::settings::DatabaseSettings { recreate_on_startup: true, ..settings.database.clone() }, ..settings };
    let mut session = recreate.open_session().expect("recreate");
    assert!(session.catalog().list_tables().expect("tables").is_empty());
    drop(session);

    let _ = std::fs::remove_file(&database);
    let _ = std::fs::remove_file(&config);
}
