//! Integration tests for dexuse

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    /// Temp workspace with a config pinning the ISA vocabulary
    struct Env {
        dir: TempDir,
    }

    impl Env {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::write(
                dir.path().join("config.toml"),
                "[isa]\nsupported_abis = [\"arm64-v8a\", \"armeabi-v7a\", \"x86\"]\n",
            )
            .unwrap();
            Self { dir }
        }

        fn usage_file(&self) -> std::path::PathBuf {
            self.dir.path().join("package-dex-usage.list")
        }

        fn dexuse(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("dexuse");
            cmd.env_remove("DEXUSE_CONFIG")
                .env_remove("DEXUSE_FILE")
                .arg("--config")
                .arg(self.dir.path().join("config.toml"))
                .arg("--file")
                .arg(self.usage_file());
            cmd
        }

        fn record(&self, args: &[&str]) -> assert_cmd::assert::Assert {
            self.dexuse().arg("record").args(args).assert()
        }
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("dexuse")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("package dex usage store"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("dexuse")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("dexuse"));
    }

    #[test]
    fn record_persists_usage_file() {
        let env = Env::new();
        env.record(&["pkgA", "/data/a.dex", "--isa", "x86"])
            .success()
            .stdout(predicate::str::contains("Recorded usage"));

        let content = fs::read_to_string(env.usage_file()).unwrap();
        assert_eq!(
            content,
            "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\npkgA,0\n#/data/a.dex\n0,0,x86\n"
        );
    }

    #[test]
    fn repeated_record_is_not_new() {
        let env = Env::new();
        env.record(&["pkgA", "/data/a.dex", "--isa", "x86"]).success();
        env.record(&["pkgA", "/data/a.dex", "--isa", "x86"])
            .success()
            .stdout(predicate::str::contains("already recorded"));
        env.record(&["pkgA", "/data/a.dex", "--isa", "x86", "--other-apps"])
            .success()
            .stdout(predicate::str::contains("Recorded usage"));

        env.dexuse()
            .args(["show", "pkgA", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"used_by_other_apps\": true"))
            .stdout(predicate::str::contains("\"x86\""));
    }

    #[test]
    fn unsupported_isa_fails() {
        let env = Env::new();
        env.record(&["pkgA", "/data/a.dex", "--isa", "mips"])
            .failure()
            .stderr(predicate::str::contains("loader ISA mips is unsupported"));
        assert!(!env.usage_file().exists());
    }

    #[test]
    fn unstorable_package_name_fails_and_keeps_store() {
        let env = Env::new();
        env.record(&["good.pkg", "/data/a.dex", "--isa", "arm"])
            .success();
        env.record(&["bad,pkg", "base.apk", "--isa", "arm", "--primary"])
            .failure()
            .stderr(predicate::str::contains("cannot be stored"));
        env.record(&["#hash", "base.apk", "--isa", "arm", "--primary"])
            .failure();

        env.dexuse().arg("list").assert().success().stdout("good.pkg\n");
    }

    #[test]
    fn owner_change_fails() {
        let env = Env::new();
        env.record(&["pkgA", "/data/a.dex", "--isa", "arm64", "--user", "0"])
            .success();
        env.record(&["pkgA", "/data/a.dex", "--isa", "arm64", "--user", "10"])
            .failure()
            .stderr(predicate::str::contains("from 0 to 10"));
    }

    #[test]
    fn show_missing_package() {
        let env = Env::new();
        env.dexuse()
            .args(["show", "nonexistent"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No usage recorded"));
    }

    #[test]
    fn list_and_dump() {
        let env = Env::new();
        env.record(&["pkgB", "base.apk", "--isa", "arm", "--primary", "--other-apps"])
            .success();
        env.record(&["pkgA", "/data/a.dex", "--isa", "arm"]).success();

        env.dexuse()
            .arg("list")
            .assert()
            .success()
            .stdout("pkgA\npkgB\n");

        env.dexuse()
            .arg("dump")
            .assert()
            .success()
            .stdout(predicate::str::starts_with(
                "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\n",
            ))
            .stdout(predicate::str::contains("pkgB,1\n"));
    }

    #[test]
    fn sync_prunes_uninstalled_packages() {
        let env = Env::new();
        env.record(&["pkgA", "/data/a.dex", "--isa", "arm"]).success();
        env.record(&["pkgB", "/data/b.dex", "--isa", "arm", "--user", "10"])
            .success();

        env.dexuse()
            .args(["sync", "--active", "pkgB=10"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 1 package(s)"));

        env.dexuse().arg("list").assert().success().stdout("pkgB\n");
    }

    #[test]
    fn corrupt_file_is_ignored_and_clearable() {
        let env = Env::new();
        fs::write(
            env.usage_file(),
            "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__2\npkgA,1\n",
        )
        .unwrap();

        env.dexuse()
            .arg("list")
            .assert()
            .success()
            .stdout("")
            .stderr(predicate::str::contains("Ignoring unreadable usage file"));

        env.dexuse().arg("clear").assert().success();
        assert_eq!(
            fs::read_to_string(env.usage_file()).unwrap(),
            "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\n"
        );
    }

    #[test]
    fn config_path() {
        let env = Env::new();
        env.dexuse()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let env = Env::new();
        env.dexuse()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[store]"))
            .stdout(predicate::str::contains("arm64-v8a"));
    }
}
