//! Device and filesystem operations on top of a [`SystemHal`].
//!
//! Each operation runs exactly one command (mount also creates its target
//! directory first) and interprets the output. Absence is not failure: an
//! unmounted device, a disk without a GPT GUID and a device without partitions
//! all come back as empty or `false` results.

use crate::hal::{CommandSpec, MountOptions, SystemHal, UserIdentity};
use crate::parse::{df, lsblk, mounts, sgdisk};
use crate::{DeviceError, DeviceOpsConfig, DeviceResult};
use once_cell::sync::OnceCell;
use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

/// `umount` exits with 32 when the target is not mounted. Unmounting is
/// idempotent, so this status is reported as success.
pub const UMOUNT_NOT_MOUNTED: i32 = 32;

pub struct DeviceOps<H: SystemHal> {
    hal: H,
    config: DeviceOpsConfig,
    /// Resolved on the first successful ownership reconciliation. Failed
    /// lookups are not cached.
    current_user: OnceCell<UserIdentity>,
}

impl<H: SystemHal> DeviceOps<H> {
    pub fn new(hal: H, config: DeviceOpsConfig) -> Self {
        Self {
            hal,
            config,
            current_user: OnceCell::new(),
        }
    }

    pub fn with_defaults(hal: H) -> Self {
        Self::new(hal, DeviceOpsConfig::default())
    }

    pub fn config(&self) -> &DeviceOpsConfig {
        &self.config
    }

    pub fn cached_user(&self) -> Option<&UserIdentity> {
        self.current_user.get()
    }

    fn query(&self, program: &str) -> CommandSpec {
        CommandSpec::new(program).timeout(self.config.query_timeout())
    }

    fn privileged(&self, spec: CommandSpec) -> CommandSpec {
        spec.privileged(self.config.escalation())
    }

    /// Filesystem type of a mounted device, by leaf name (`sda1`).
    ///
    /// Empty when the device is not mounted or its type is unknown.
    pub fn filesystem_type(&self, device: &str) -> DeviceResult<String> {
        let label = format!("get filesystem type for {}", device);
        let spec = self.query("df").arg("--output=source,fstype");
        let output = self
            .hal
            .command_output(&spec)
            .map_err(|e| DeviceError::command(&label, e))?;

        let source = format!("/dev/{}", device);
        Ok(df::filesystem_for_source(&output, &source).unwrap_or_default())
    }

    /// Create an ext4 filesystem on `device_path`.
    ///
    /// Destructive. The caller is responsible for making sure the device is not in use.
    pub fn format_device(&self, device_path: &Path) -> DeviceResult<()> {
        let label = format!("{} {}", self.config.mkfs_program, device_path.display());
        let spec = self.privileged(
            CommandSpec::new(&self.config.mkfs_program)
                .arg(device_path.display().to_string())
                .timeout(self.config.format_timeout()),
        );

        if self.config.dry_run {
            log::info!("DRY RUN: {}", spec);
            return Ok(());
        }

        self.hal
            .command_status(&spec)
            .map_err(|e| DeviceError::command(label, e))
    }

    /// GPT disk GUID of `/dev/<device_name>`.
    ///
    /// Disks without a GPT label are common, so any failure of the lookup is
    /// logged and reported as an empty UUID rather than an error.
    pub fn disk_uuid(&self, device_name: &str) -> DeviceResult<String> {
        let spec = self.privileged(
            self.query("sgdisk")
                .arg("-p")
                .arg(format!("/dev/{}", device_name)),
        );
        match self.hal.command_output(&spec) {
            Ok(output) => Ok(sgdisk::disk_guid(&output).unwrap_or_default()),
            Err(err) => {
                log::warn!("unknown disk uuid for /dev/{}: {}", device_name, err);
                Ok(String::new())
            }
        }
    }

    /// Mount point of `/dev/<device_name>`, or empty if it is not mounted.
    pub fn mount_point(&self, device_name: &str) -> DeviceResult<String> {
        let label = format!("get mount point for {}", device_name);
        let entries = self.mount_table(&label)?;
        let source = format!("/dev/{}", device_name);
        Ok(mounts::mount_point_for_source(&entries, &source).unwrap_or_default())
    }

    /// Device mounted at `mount_point`, or empty if nothing is mounted there.
    pub fn device_from_mount_point(&self, mount_point: &Path) -> DeviceResult<String> {
        let label = format!("get device from mount point {}", mount_point.display());
        let entries = self.mount_table(&label)?;
        let target = mount_point.to_string_lossy();
        Ok(mounts::source_for_mount_point(&entries, &target).unwrap_or_default())
    }

    fn mount_table(&self, label: &str) -> DeviceResult<Vec<mounts::MountEntry>> {
        let output = self
            .hal
            .command_output(&self.query("mount"))
            .map_err(|e| DeviceError::command(label, e))?;
        Ok(mounts::parse_mount_table(&output))
    }

    pub fn mount(&self, device_path: &Path, mount_path: &Path) -> DeviceResult<()> {
        self.mount_with_options(device_path, mount_path, &MountOptions::new())
    }

    /// Mount `device_path` at `mount_path`, creating the directory if needed.
    ///
    /// Options are passed to `mount -o` verbatim; empty options use the plain form.
    pub fn mount_with_options(
        &self,
        device_path: &Path,
        mount_path: &Path,
        options: &MountOptions,
    ) -> DeviceResult<()> {
        let mut spec = CommandSpec::new("mount").timeout(self.config.mount_timeout());
        if let Some(opts) = options.as_arg() {
            spec = spec.arg("-o").arg(opts);
        }
        let spec = self.privileged(
            spec.arg(device_path.display().to_string())
                .arg(mount_path.display().to_string()),
        );

        if self.config.dry_run {
            log::info!("DRY RUN: mkdir -p {}", mount_path.display());
            log::info!("DRY RUN: {}", spec);
            return Ok(());
        }

        self.ensure_mount_dir(mount_path);

        let label = format!("mount {}", device_path.display());
        self.hal
            .command_status(&spec)
            .map_err(|e| DeviceError::command(label, e))
    }

    // Creation failures are logged only; mount reports a missing target itself.
    fn ensure_mount_dir(&self, mount_path: &Path) {
        if let Err(err) = DirBuilder::new()
            .recursive(true)
            .mode(self.config.mount_dir_mode)
            .create(mount_path)
        {
            log::warn!(
                "failed to create mount directory {}: {}",
                mount_path.display(),
                err
            );
        }
    }

    /// Unmount `device_path`. Unmounting a device that is not mounted succeeds.
    pub fn unmount(&self, device_path: &Path) -> DeviceResult<()> {
        let spec = self.privileged(
            CommandSpec::new("umount")
                .arg(device_path.display().to_string())
                .timeout(self.config.mount_timeout()),
        );

        if self.config.dry_run {
            log::info!("DRY RUN: {}", spec);
            return Ok(());
        }

        match self.hal.command_status(&spec) {
            Ok(()) => Ok(()),
            Err(err) if err.exit_status() == Some(UMOUNT_NOT_MOUNTED) => {
                log::info!(
                    "ignoring exit status {} from unmount of device {}: {}",
                    UMOUNT_NOT_MOUNTED,
                    device_path.display(),
                    err
                );
                Ok(())
            }
            Err(err) => Err(DeviceError::command(
                format!("umount {}", device_path.display()),
                err,
            )),
        }
    }

    /// Whether any block device lists `device` as its parent (e.g. a disk with partitions).
    pub fn has_children(&self, device: &str) -> DeviceResult<bool> {
        let label = format!("check children for device {}", device);
        let spec = self
            .query("lsblk")
            .args(["--all", "-n", "-l", "--output", "PKNAME"]);
        let output = self
            .hal
            .command_output(&spec)
            .map_err(|e| DeviceError::command(label, e))?;
        Ok(lsblk::has_parent(&output, device))
    }

    /// Recursively hand `path` to the current user. Best effort: failures are logged only.
    pub fn reconcile_ownership(&self, path: &Path) {
        let user = match self
            .current_user
            .get_or_try_init(|| self.hal.current_user())
        {
            Ok(user) => user,
            Err(err) => {
                log::warn!("unable to find current user: {}", err);
                return;
            }
        };

        let spec = self.privileged(
            CommandSpec::new("chown")
                .arg("-R")
                .arg(user.owner_spec())
                .arg(path.display().to_string())
                .timeout(self.config.chown_timeout()),
        );

        if self.config.dry_run {
            log::info!("DRY RUN: {}", spec);
            return;
        }

        if let Err(err) = self.hal.command_status(&spec) {
            log::warn!("command chown {} failed: {}", path.display(), err);
        }
    }
}
