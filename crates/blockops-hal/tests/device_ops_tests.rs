use blockops_hal::{
    DeviceOps, DeviceOpsConfig, FakeHal, FakeResponse, MountOptions, Operation, UserIdentity,
};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

const MOUNT_TABLE: &str = "\
proc on /proc type proc (rw,nosuid,nodev,noexec,relatime)
/dev/nvme0n1p2 on / type ext4 (rw,relatime)
/dev/sdb1 on /mnt/backup type ext4 (rw,relatime)
";

fn fake_ops() -> (FakeHal, DeviceOps<FakeHal>) {
    let hal = FakeHal::new();
    (hal.clone(), DeviceOps::with_defaults(hal))
}

#[test]
fn filesystem_type_reads_df_rows() {
    let (hal, ops) = fake_ops();
    hal.respond(
        "df",
        FakeResponse::output("/dev/sda1 ext4\n/dev/sdb1 xfs"),
    );

    assert_eq!(ops.filesystem_type("sda1").unwrap(), "ext4");
    assert_eq!(ops.filesystem_type("sdb1").unwrap(), "xfs");
    assert_eq!(ops.filesystem_type("sdc1").unwrap(), "");
}

#[test]
fn filesystem_type_propagates_executor_failure() {
    let (hal, ops) = fake_ops();
    hal.respond("df", FakeResponse::exit(1));

    let err = ops.filesystem_type("sda1").unwrap_err();
    assert!(
        err.to_string().contains("get filesystem type for sda1"),
        "{err}"
    );
}

#[test]
fn unmounted_device_has_no_mount_point() {
    let (hal, ops) = fake_ops();
    hal.respond("mount", FakeResponse::output(MOUNT_TABLE));

    for device in ["sda1", "sdc", "sdb", "nvme0n1"] {
        assert_eq!(ops.mount_point(device).unwrap(), "", "{device}");
    }
    assert_eq!(
        ops.device_from_mount_point(Path::new("/mnt/missing")).unwrap(),
        ""
    );
}

#[test]
fn mount_point_and_device_lookups_are_inverse() {
    let (hal, ops) = fake_ops();
    hal.respond("mount", FakeResponse::output(MOUNT_TABLE));

    assert_eq!(ops.mount_point("sdb1").unwrap(), "/mnt/backup");
    assert_eq!(
        ops.device_from_mount_point(Path::new("/mnt/backup")).unwrap(),
        "/dev/sdb1"
    );
}

#[test]
fn mount_table_failure_is_an_error() {
    let (hal, ops) = fake_ops();
    hal.respond("mount", FakeResponse::Timeout);

    assert!(ops.mount_point("sdb1").is_err());
    assert!(ops.device_from_mount_point(Path::new("/mnt/backup")).is_err());
}

#[test]
fn unmount_ignores_not_mounted_status() {
    let (hal, ops) = fake_ops();
    hal.respond(
        "umount",
        FakeResponse::Exit {
            code: 32,
            stderr: "umount: /dev/sdb1: not mounted.".to_string(),
        },
    );

    ops.unmount(Path::new("/dev/sdb1")).unwrap();
    assert_eq!(hal.commands(), vec![vec!["sudo", "umount", "/dev/sdb1"]]);
}

#[test]
fn unmount_reports_other_failures() {
    for code in [1, 2, 16, 64] {
        let (hal, ops) = fake_ops();
        hal.respond("umount", FakeResponse::exit(code));
        let err = ops.unmount(Path::new("/dev/sdb1")).unwrap_err();
        assert!(err.to_string().contains("umount /dev/sdb1"), "{err}");
    }
}

#[test]
fn disk_uuid_never_fails() {
    let failures = [
        FakeResponse::exit(2),
        FakeResponse::NotFound,
        FakeResponse::Timeout,
    ];
    for failure in failures {
        let (hal, ops) = fake_ops();
        hal.respond("sgdisk", failure);
        assert_eq!(ops.disk_uuid("sdb").unwrap(), "");
    }
}

#[test]
fn disk_uuid_without_guid_line_is_empty() {
    let (hal, ops) = fake_ops();
    hal.respond(
        "sgdisk",
        FakeResponse::output("Disk /dev/sdb: 2048 sectors, 1024.0 KiB\n"),
    );
    assert_eq!(ops.disk_uuid("sdb").unwrap(), "");
}

#[test]
fn has_children_requires_exact_parent_name() {
    let (hal, ops) = fake_ops();
    hal.respond("lsblk", FakeResponse::output("\nsda\nsda\n\nsdb10\n"));

    assert!(ops.has_children("sda").unwrap());
    assert!(!ops.has_children("sdb").unwrap());
    assert!(!ops.has_children("sdb1").unwrap());
    assert!(ops.has_children("sdb10").unwrap());
}

#[test]
fn has_children_propagates_failure() {
    let (hal, ops) = fake_ops();
    hal.respond("lsblk", FakeResponse::NotFound);
    assert!(ops.has_children("sda").is_err());
}

#[test]
fn mount_without_options_uses_plain_form() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("mnt/data");
    let (hal, ops) = fake_ops();

    ops.mount_with_options(Path::new("/dev/sdb1"), &target, &MountOptions::from(""))
        .unwrap();
    ops.mount(Path::new("/dev/sdb1"), &target).unwrap();

    let expected = vec![
        "sudo".to_string(),
        "mount".to_string(),
        "/dev/sdb1".to_string(),
        target.display().to_string(),
    ];
    assert_eq!(hal.commands(), vec![expected.clone(), expected]);
}

#[test]
fn mount_with_options_passes_them_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("ro");
    let (hal, ops) = fake_ops();

    ops.mount_with_options(
        Path::new("/dev/sdb1"),
        &target,
        &MountOptions::with_options("ro,noexec"),
    )
    .unwrap();

    let commands = hal.commands();
    assert_eq!(&commands[0][1..4], &["mount", "-o", "ro,noexec"]);
}

#[test]
fn mount_creates_target_directory() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("a/b/c");
    let (_hal, ops) = fake_ops();

    ops.mount(Path::new("/dev/sdb1"), &target).unwrap();

    let meta = std::fs::metadata(&target).unwrap();
    assert!(meta.is_dir());
    // umask may only remove bits.
    assert_eq!(meta.permissions().mode() & !0o755 & 0o777, 0);
}

#[test]
fn mount_is_attempted_when_directory_creation_fails() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let target = blocker.join("mnt");
    let (hal, ops) = fake_ops();
    hal.respond("mount", FakeResponse::exit(32));

    let err = ops.mount(Path::new("/dev/sdb1"), &target).unwrap_err();
    assert!(err.to_string().contains("mount /dev/sdb1"), "{err}");
    assert_eq!(hal.commands().len(), 1);
}

#[test]
fn reconcile_ownership_chowns_for_current_user() {
    let (hal, ops) = fake_ops();
    hal.set_current_user(UserIdentity {
        name: "alice".to_string(),
        uid: 1001,
        gid: 1001,
    });

    ops.reconcile_ownership(Path::new("/mnt/backup"));

    assert_eq!(
        hal.commands(),
        vec![vec!["sudo", "chown", "-R", "alice:alice", "/mnt/backup"]]
    );
}

#[test]
fn reconcile_ownership_uses_chown_timeout() {
    let (hal, ops) = fake_ops();
    ops.reconcile_ownership(Path::new("/mnt/backup"));

    let chown_secs = DeviceOpsConfig::default().chown_timeout().as_secs();
    assert!(chown_secs > DeviceOpsConfig::default().mount_timeout().as_secs());
    assert!(hal.has_operation(|op| matches!(
        op,
        Operation::Command { args, timeout_secs, .. }
            if args.first().map(String::as_str) == Some("chown") && *timeout_secs == chown_secs
    )));

    let hal = FakeHal::new();
    let config = DeviceOpsConfig {
        chown_timeout_secs: 45,
        ..DeviceOpsConfig::default()
    };
    DeviceOps::new(hal.clone(), config).reconcile_ownership(Path::new("/mnt/backup"));
    assert_eq!(
        hal.operations().last(),
        Some(&Operation::Command {
            program: "sudo".to_string(),
            args: vec![
                "chown".to_string(),
                "-R".to_string(),
                "fake:fake".to_string(),
                "/mnt/backup".to_string(),
            ],
            timeout_secs: 45,
        })
    );
}

#[test]
fn concurrent_reconcile_resolves_user_once() {
    let (hal, ops) = fake_ops();
    let paths: Vec<String> = (0..8).map(|i| format!("/mnt/disk{i}")).collect();

    std::thread::scope(|scope| {
        for path in &paths {
            let ops = &ops;
            scope.spawn(move || ops.reconcile_ownership(Path::new(path)));
        }
    });

    assert_eq!(hal.user_lookups(), 1);
    let commands = hal.commands();
    assert_eq!(commands.len(), paths.len());
    assert!(commands.iter().all(|argv| argv[3] == "fake:fake"), "{commands:?}");
    for path in &paths {
        assert!(commands.iter().any(|argv| &argv[4] == path), "{path}");
    }
}

#[test]
fn escalation_prefix_with_flags() {
    let hal = FakeHal::new();
    let config = DeviceOpsConfig::from_toml_str("escalation = \"sudo -n\"").unwrap();
    let ops = DeviceOps::new(hal.clone(), config);
    hal.respond("umount", FakeResponse::exit(32));

    ops.unmount(Path::new("/dev/sdb1")).unwrap();

    assert_eq!(
        hal.commands(),
        vec![vec!["sudo", "-n", "umount", "/dev/sdb1"]]
    );
}

#[test]
fn reconcile_ownership_swallows_lookup_failure_and_retries() {
    let (hal, ops) = fake_ops();
    hal.fail_current_user("no passwd entry for uid 4242");

    ops.reconcile_ownership(Path::new("/mnt/backup"));
    ops.reconcile_ownership(Path::new("/mnt/backup"));

    assert!(hal.commands().is_empty());
    assert_eq!(hal.user_lookups(), 2);
    assert!(ops.cached_user().is_none());

    hal.set_current_user(UserIdentity {
        name: "bob".to_string(),
        uid: 1002,
        gid: 1002,
    });
    ops.reconcile_ownership(Path::new("/mnt/backup"));
    ops.reconcile_ownership(Path::new("/mnt/other"));

    assert_eq!(hal.user_lookups(), 3);
    assert_eq!(hal.commands().len(), 2);
}

#[test]
fn reconcile_ownership_swallows_chown_failure() {
    let (hal, ops) = fake_ops();
    hal.respond("chown", FakeResponse::exit(1));

    ops.reconcile_ownership(Path::new("/mnt/backup"));

    assert!(hal.has_operation(|op| matches!(
        op,
        Operation::Command { args, .. } if args.first().map(String::as_str) == Some("chown")
    )));
}

#[test]
fn dry_run_skips_destructive_commands() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("never");
    let hal = FakeHal::new();
    let config = DeviceOpsConfig {
        dry_run: true,
        ..DeviceOpsConfig::default()
    };
    let ops = DeviceOps::new(hal.clone(), config);

    ops.format_device(Path::new("/dev/sdb1")).unwrap();
    ops.mount(Path::new("/dev/sdb1"), &target).unwrap();
    ops.unmount(Path::new("/dev/sdb1")).unwrap();
    ops.reconcile_ownership(&target);

    assert!(hal.commands().is_empty());
    assert!(!target.exists());

    hal.respond("mount", FakeResponse::output(MOUNT_TABLE));
    assert_eq!(ops.mount_point("sdb1").unwrap(), "/mnt/backup");
}

#[test]
fn escalation_can_be_disabled() {
    let hal = FakeHal::new();
    let config = DeviceOpsConfig::from_toml_str("escalation = \"\"").unwrap();
    let ops = DeviceOps::new(hal.clone(), config);

    ops.unmount(Path::new("/dev/sdb1")).unwrap();
    ops.format_device(Path::new("/dev/sdb1")).unwrap();

    assert_eq!(
        hal.commands(),
        vec![vec!["umount", "/dev/sdb1"], vec!["mkfs.ext4", "/dev/sdb1"]]
    );
}

#[test]
fn device_names_are_passed_literally() {
    let (hal, ops) = fake_ops();
    ops.format_device(Path::new("/dev/sdb1; reboot")).unwrap();
    assert_eq!(
        hal.commands(),
        vec![vec!["sudo", "mkfs.ext4", "/dev/sdb1; reboot"]]
    );
}
