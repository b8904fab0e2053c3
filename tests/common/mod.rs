//! Shared test utilities: stub engine executables and fixture builders.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Writes an executable shell script to `dir/name` and returns its path.
pub fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A galaxy stub that "installs" requested roles by copying them out of a
/// fixture directory (roles without a fixture get an empty directory).
pub fn write_stub_galaxy(dir: &Path, fixtures: &Path) -> PathBuf {
    let body = format!(
        r#"FIXTURES='{fixtures}'
while [ $# -gt 0 ]; do
  case "$1" in
    --role-file) FILE=$2; shift 2;;
    --roles-path) DEST=$2; shift 2;;
    *) shift;;
  esac
done
grep 'name:' "$FILE" | sed 's/.*name: *//' | while read -r name; do
  if [ -d "$FIXTURES/$name" ]; then
    rm -rf "$DEST/$name"
    cp -r "$FIXTURES/$name" "$DEST/$name"
  else
    mkdir -p "$DEST/$name"
  fi
done"#,
        fixtures = fixtures.display()
    );
    write_stub(dir, "stub-galaxy", &body)
}

/// Creates a role directory with a `meta/main.yml` under `base`.
pub fn create_role_with_meta(base: &Path, role_name: &str, meta_yaml: &str) -> PathBuf {
    let role_path = base.join(role_name);
    let meta_dir = role_path.join("meta");
    std::fs::create_dir_all(&meta_dir).unwrap();
    std::fs::write(meta_dir.join("main.yml"), meta_yaml).unwrap();
    role_path
}

/// Formats a structured event line the way the callback plugin emits it.
pub fn event_line(event_name: &str, data: serde_json::Value) -> String {
    format!(
        "GOODPLAY => {}",
        serde_json::json!({ "event_name": event_name, "data": data })
    )
}
