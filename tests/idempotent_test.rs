//! End-to-end tests over migration directories on disk.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::Command;

use qail_idempotent::{FileOutcome, Pipeline, Rewriter};

const USERS: &str = r#"CREATE TABLE public.profiles (
  id uuid PRIMARY KEY REFERENCES auth.users(id),
  username text
);

CREATE UNIQUE INDEX profiles_username_key ON public.profiles(username);

ALTER TABLE public.profiles ENABLE ROW LEVEL SECURITY;

CREATE POLICY "Public profiles are viewable" ON public.profiles
  FOR SELECT USING (true);
"#;

const TYPES: &str = r#"CREATE TYPE public.app_role AS ENUM (
  'admin',
  'moderator'
);
"#;

const SEED: &str = "INSERT INTO public.profiles (id) VALUES ('00000000-0000-0000-0000-000000000000');\n";

fn write_migrations(dir: &Path) {
    fs::write(dir.join("20240101_profiles.sql"), USERS).unwrap();
    fs::write(dir.join("20240102_types.sql"), TYPES).unwrap();
    fs::write(dir.join("20240103_seed.sql"), SEED).unwrap();
}

fn rewriter() -> Rewriter {
    Rewriter::new(Pipeline::new("public").unwrap())
}

#[test]
fn test_batch_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_migrations(dir.path());

    let summary = rewriter().run_dir(dir.path(), "sql").unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.modified, 2);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.failed, 0);

    let names: Vec<_> = summary.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["20240101_profiles.sql", "20240102_types.sql", "20240103_seed.sql"]
    );
    assert_eq!(
        summary.files[0].outcome,
        FileOutcome::Modified {
            rules: vec!["policy_guard", "table_if_not_exists", "index_if_not_exists"],
        }
    );
    assert_eq!(summary.files[2].outcome, FileOutcome::Unchanged);
}

#[test]
fn test_rewritten_content() {
    let dir = tempfile::tempdir().unwrap();
    write_migrations(dir.path());
    rewriter().run_dir(dir.path(), "sql").unwrap();

    let profiles = fs::read_to_string(dir.path().join("20240101_profiles.sql")).unwrap();
    assert_eq!(
        profiles,
        r#"CREATE TABLE IF NOT EXISTS public.profiles (
  id uuid PRIMARY KEY REFERENCES auth.users(id),
  username text
);

CREATE UNIQUE INDEX IF NOT EXISTS profiles_username_key ON public.profiles(username);

ALTER TABLE public.profiles ENABLE ROW LEVEL SECURITY;

DROP POLICY IF EXISTS "Public profiles are viewable" ON public.profiles;
CREATE POLICY "Public profiles are viewable" ON public.profiles
  FOR SELECT USING (true);
"#
    );

    let types = fs::read_to_string(dir.path().join("20240102_types.sql")).unwrap();
    assert_eq!(
        types,
        r#"DO $$ BEGIN
  CREATE TYPE public.app_role AS ENUM (
  'admin',
  'moderator'
);
EXCEPTION
  WHEN duplicate_object THEN null;
END $$;
"#
    );

    assert_eq!(
        fs::read_to_string(dir.path().join("20240103_seed.sql")).unwrap(),
        SEED
    );
}

#[test]
fn test_second_run_modifies_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_migrations(dir.path());

    rewriter().run_dir(dir.path(), "sql").unwrap();
    let second = rewriter().run_dir(dir.path(), "sql").unwrap();
    assert_eq!(second.modified, 0);
    assert_eq!(second.unchanged, 3);
}

#[test]
fn test_existing_guards_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let sql = r#"CREATE TABLE IF NOT EXISTS public.t (id int);
CREATE INDEX IF NOT EXISTS t_id ON public.t(id);
DROP POLICY IF EXISTS "p" ON public.t;
CREATE POLICY "p" ON public.t USING (true);
DROP TRIGGER IF EXISTS tr ON public.t;
CREATE TRIGGER tr AFTER INSERT ON public.t FOR EACH ROW EXECUTE FUNCTION f();
"#;
    let path = dir.path().join("001.sql");
    fs::write(&path, sql).unwrap();

    assert!(!rewriter().process(&path).unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), sql);
}

#[test]
fn test_partially_wrapped_file_keeps_unwrapped_type() {
    let dir = tempfile::tempdir().unwrap();
    let sql = "DO $$ BEGIN\n  CREATE TYPE public.a AS ENUM ('x');\nEXCEPTION\n  WHEN duplicate_object THEN null;\nEND $$;\nCREATE TYPE public.b AS ENUM ('y');\n";
    let path = dir.path().join("001.sql");
    fs::write(&path, sql).unwrap();

    assert!(!rewriter().process(&path).unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), sql);
}

#[test]
fn test_non_utf8_file_is_reported_and_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("001_bad.sql"), [0xff, 0xfe, 0x00]).unwrap();
    fs::write(dir.path().join("002_ok.sql"), "CREATE INDEX i ON t(x);\n").unwrap();

    let summary = rewriter().run_dir(dir.path(), "sql").unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.modified, 1);
    assert_eq!(summary.failed, 1);
    assert!(matches!(summary.files[0].outcome, FileOutcome::Failed { .. }));
}

fn cli(args: &[&str], cwd: &Path) -> std::process::Output {
    let config = cwd.join("empty.toml");
    fs::write(&config, "").unwrap();
    Command::new(env!("CARGO_BIN_EXE_qail-idempotent"))
        .args(["--config", config.to_str().unwrap()])
        .args(args)
        .current_dir(cwd)
        .env("NO_COLOR", "1")
        .env_remove("QAIL_MIGRATIONS_DIR")
        .output()
        .unwrap()
}

#[test]
fn test_cli_missing_directory_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("migrations");

    let output = cli(&["--dir", missing.to_str().unwrap()], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Migrations directory not found"));
    assert!(!missing.exists());
}

#[test]
fn test_cli_json_summary() {
    let dir = tempfile::tempdir().unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir(&migrations).unwrap();
    write_migrations(&migrations);

    let output = cli(&["--dir", migrations.to_str().unwrap(), "--json"], dir.path());
    assert_eq!(output.status.code(), Some(0));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total"], 3);
    assert_eq!(json["modified"], 2);
    assert_eq!(json["unchanged"], 1);
}

#[test]
fn test_cli_dry_run_leaves_files() {
    let dir = tempfile::tempdir().unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir(&migrations).unwrap();
    write_migrations(&migrations);

    let output = cli(&["--dir", migrations.to_str().unwrap(), "--dry-run"], dir.path());
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Would modify"));
    assert!(stdout.contains("Total files: 3"));
    assert_eq!(
        fs::read_to_string(migrations.join("20240101_profiles.sql")).unwrap(),
        USERS
    );
}
