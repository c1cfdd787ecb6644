#![allow(dead_code)]

use assert_cmd::prelude::*;
use std::path::Path;
use std::process::Command;

pub const CHECKOUT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2">
  <file original="checkout.json" source-language="en" target-language="es">
    <body>
      <trans-unit id="btn.submit">
        <source>Submit</source>
        <target state="final">Enviar</target>
      </trans-unit>
      <trans-unit id="btn.cancel">
        <source>Cancel</source>
        <target>Cancelar</target>
      </trans-unit>
    </body>
  </file>
</xliff>
"#;

pub const PROFILE: &str = r#"<xliff version="1.2">
  <file original="profile.json" source-language="en" target-language="es">
    <body>
      <trans-unit id="save">
        <source>submit</source>
        <target state="new">Confirmar</target>
      </trans-unit>
    </body>
  </file>
</xliff>
"#;

/// Binary under test, run from `cwd` so logs and config lookups stay inside it.
pub fn bin_cmd(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("locsync-cli").expect("locsync-cli built");
    cmd.current_dir(cwd).env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let p = root.join(rel);
    std::fs::create_dir_all(p.parent().unwrap()).unwrap();
    std::fs::write(p, content).unwrap();
}

/// Two-document project with one divergent source.
pub fn project(tmp: &Path) -> std::path::PathBuf {
    let root = tmp.join("project");
    write(&root, "a.xlf", CHECKOUT);
    write(&root, "nested/b.xlf", PROFILE);
    write(&root, "notes.txt", "not a translation file");
    root
}

pub fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}
