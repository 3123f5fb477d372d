//! Integration tests for modpak
//!
//! The `go` toolchain is stubbed with a shell script placed first on PATH.
//! The stub records every invocation (pipe-delimited argv plus working
//! directory) and emits the same progress lines the real toolchain prints
//! during a module fetch, so the reuse/rebuild decisions are observable
//! exactly the way platform tooling observes them: by grepping the build
//! log.

#![cfg(unix)]

mod pipeline_tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const FAKE_GO: &str = r#"#!/bin/sh
printf 'PWD=%s|' "$PWD" >> "$GO_RECORD"
printf '%s|' go "$@" >> "$GO_RECORD"
echo >> "$GO_RECORD"
case "$1" in
  mod)
    echo "go: finding github.com/gorilla/mux v1.7.1"
    echo "go: downloading github.com/gorilla/mux v1.7.1"
    echo "go: extracting github.com/gorilla/mux v1.7.1"
    mkdir -p "$GOMODCACHE"
    : > "$GOMODCACHE/modules.txt"
    ;;
  install)
    if [ -z "$GO_NO_INSTALL" ]; then
      mkdir -p "$GOBIN"
      printf 'binary' > "$GOBIN/app"
      chmod +x "$GOBIN/app"
    fi
    ;;
esac
"#;

    /// One application plus its layers dir and a recording `go` stub
    struct BuildContext {
        root: TempDir,
    }

    impl BuildContext {
        fn new() -> Self {
            let root = TempDir::new().unwrap();

            let toolbin = root.path().join("toolbin");
            fs::create_dir_all(&toolbin).unwrap();
            let go = toolbin.join("go");
            fs::write(&go, FAKE_GO).unwrap();
            fs::set_permissions(&go, fs::Permissions::from_mode(0o755)).unwrap();

            fs::create_dir_all(root.path().join("app")).unwrap();
            fs::create_dir_all(root.path().join("layers")).unwrap();
            fs::write(root.path().join("go-record"), "").unwrap();

            let ctx = Self { root };
            ctx.write_app_file("go.mod", "module example.com/app\n");
            ctx.write_app_file("main.go", "package main\n\nfunc main() {}\n");
            ctx
        }

        fn app_dir(&self) -> PathBuf {
            self.root.path().join("app")
        }

        fn layers_dir(&self) -> PathBuf {
            self.root.path().join("layers")
        }

        fn record_path(&self) -> PathBuf {
            self.root.path().join("go-record")
        }

        fn write_app_file(&self, rel: &str, contents: &str) {
            let path = self.app_dir().join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, contents).unwrap();
        }

        fn record(&self) -> String {
            fs::read_to_string(self.record_path()).unwrap()
        }

        fn clear_record(&self) {
            fs::write(self.record_path(), "").unwrap();
        }

        fn modpak(&self) -> Command {
            let mut cmd = Command::cargo_bin("modpak").unwrap();
            let path = format!(
                "{}:{}",
                self.root.path().join("toolbin").display(),
                std::env::var("PATH").unwrap_or_default()
            );
            cmd.env("PATH", path)
                .env("GO_RECORD", self.record_path())
                .env_remove("GO_NO_INSTALL");
            cmd
        }

        fn build(&self) -> Command {
            let mut cmd = self.modpak();
            cmd.arg("build")
                .arg(self.app_dir())
                .arg("--layers")
                .arg(self.layers_dir());
            cmd
        }
    }

    #[test]
    fn detect_succeeds_on_go_module() {
        let ctx = BuildContext::new();

        ctx.modpak()
            .arg("detect")
            .arg(ctx.app_dir())
            .assert()
            .success()
            .stdout(predicate::str::contains("Go module detected"));
    }

    #[test]
    fn detect_fails_without_manifest() {
        let ctx = BuildContext::new();
        fs::remove_file(ctx.app_dir().join("go.mod")).unwrap();

        ctx.modpak()
            .arg("detect")
            .arg(ctx.app_dir())
            .assert()
            .failure()
            .stderr(predicate::str::contains("No Go module found"));
    }

    #[test]
    fn first_build_downloads_and_compiles() {
        let ctx = BuildContext::new();

        ctx.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("go: finding github.com/"))
            .stdout(predicate::str::contains("go: downloading github.com/"))
            .stdout(predicate::str::contains("go: extracting github.com/"))
            .stdout(predicate::str::contains("Compiling application"))
            .stdout(predicate::str::contains("Build complete"));

        let record = ctx.record();
        assert!(record.contains("go|mod|download|"));
        assert!(record.contains("go|install|"));

        let bin = ctx.layers_dir().join("app-binary").join("bin").join("app");
        assert!(bin.is_file());
    }

    #[test]
    fn repeat_build_reuses_both_layers() {
        let ctx = BuildContext::new();
        ctx.build().assert().success();
        ctx.clear_record();

        ctx.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("go: finding").not())
            .stdout(predicate::str::contains("Adding cache layer 'modpak:go-cache'"))
            .stdout(predicate::str::contains("Reusing layer 'modpak:app-binary'"));

        // No toolchain invocation of any kind on a clean repeat
        assert_eq!(ctx.record(), "");
    }

    #[test]
    fn repeat_build_is_idempotent_on_disk() {
        let ctx = BuildContext::new();
        ctx.build().assert().success();

        let cache_metadata = ctx.layers_dir().join("go-cache.toml");
        let binary_metadata = ctx.layers_dir().join("app-binary.toml");
        let cache_before = fs::read_to_string(&cache_metadata).unwrap();
        let binary_before = fs::read_to_string(&binary_metadata).unwrap();

        ctx.build().assert().success();

        assert_eq!(fs::read_to_string(&cache_metadata).unwrap(), cache_before);
        assert_eq!(fs::read_to_string(&binary_metadata).unwrap(), binary_before);
    }

    #[test]
    fn manifest_change_refetches_modules() {
        let ctx = BuildContext::new();
        ctx.build().assert().success();
        ctx.clear_record();

        ctx.write_app_file(
            "go.mod",
            "module example.com/app\n\nrequire github.com/gorilla/mux v1.7.1\n",
        );

        ctx.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("go: downloading github.com/"));

        assert!(ctx.record().contains("go|mod|download|"));
    }

    #[test]
    fn source_change_recompiles_but_keeps_cache() {
        let ctx = BuildContext::new();
        ctx.build().assert().success();
        ctx.clear_record();

        ctx.write_app_file("main.go", "package main\n\nfunc main() { println(1) }\n");

        ctx.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("go: finding").not())
            .stdout(predicate::str::contains("Adding cache layer 'modpak:go-cache'"))
            .stdout(predicate::str::contains("Compiling application"));

        let record = ctx.record();
        assert!(!record.contains("go|mod|download|"));
        assert!(record.contains("go|install|"));
    }

    #[test]
    fn vendored_build_never_downloads() {
        let ctx = BuildContext::new();
        ctx.write_app_file("vendor/modules.txt", "# github.com/gorilla/mux v1.7.1\n");

        for _ in 0..2 {
            ctx.build()
                .assert()
                .success()
                .stdout(predicate::str::contains("go: downloading").not())
                .stdout(predicate::str::contains("Using vendored dependencies"));
        }

        let record = ctx.record();
        assert!(!record.contains("go|mod|download|"));
        assert!(record.contains("|-mod=vendor|"));
    }

    #[test]
    fn non_root_target_sets_working_directory() {
        let ctx = BuildContext::new();
        fs::remove_file(ctx.app_dir().join("go.mod")).unwrap();
        ctx.write_app_file("modpak.toml", "[build]\ntarget = \"cmd/web\"\n");
        ctx.write_app_file("cmd/web/go.mod", "module example.com/web\n");
        ctx.write_app_file("cmd/web/main.go", "package main\n\nfunc main() {}\n");

        ctx.build().assert().success();

        let record = ctx.record();
        assert!(record.contains("cmd/web|go|install|"));

        // Executable reachable via the search-path contribution
        let env_dir = ctx
            .layers_dir()
            .join("app-binary")
            .join("env.launch");
        let prepend = fs::read_to_string(env_dir.join("PATH.prepend")).unwrap();
        assert!(prepend.ends_with("app-binary/bin"));
        assert!(Path::new(&prepend).join("app").is_file());
        assert_eq!(fs::read_to_string(env_dir.join("PATH.delim")).unwrap(), ":");
    }

    #[test]
    fn ldflags_pass_through_as_one_argument() {
        let ctx = BuildContext::new();
        ctx.write_app_file(
            "modpak.toml",
            "[build]\nldflags = [\"-X\", \"main.version=v1.2.3\", \"-X\", \"main.sha=7a82056\"]\n",
        );

        ctx.build().assert().success();

        assert!(ctx
            .record()
            .contains("|-ldflags|-X main.version=v1.2.3 -X main.sha=7a82056|"));
    }

    #[test]
    fn missing_executable_fails_with_install_path() {
        let ctx = BuildContext::new();

        ctx.build()
            .env("GO_NO_INSTALL", "1")
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "`go install` failed to install executable(s) in",
            ))
            .stderr(predicate::str::contains("app-binary/bin"));

        // Failed population must leave the binary layer uninitialized
        assert!(!ctx.layers_dir().join("app-binary.toml").exists());
    }

    #[test]
    fn failed_compile_leaves_cache_layer_committed() {
        let ctx = BuildContext::new();

        ctx.build().env("GO_NO_INSTALL", "1").assert().failure();

        // The fetch phase completed, so the cache layer is valid and the
        // retry reuses it
        assert!(ctx.layers_dir().join("go-cache.toml").exists());
        ctx.clear_record();

        ctx.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("Adding cache layer 'modpak:go-cache'"));
        assert!(!ctx.record().contains("go|mod|download|"));
    }
}
