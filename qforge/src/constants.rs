//! Compilation constants.
//!
//! Centralized location for limits, well-known names and fixed values
//! emitted into QEMU invocations.

/// Filesystem locations used when no override is configured.
pub mod paths {
    /// Configuration directory holding `qforge.conf.json`.
    pub const CONF_DIR: &str = "/etc/qforge";

    /// Machine definitions directory, relative to the configuration directory.
    pub const MACHINE_DIR: &str = "machine.conf.d";

    /// Supplementary system definitions, relative to the configuration directory.
    pub const SYSTEM_DIR: &str = "system.conf.d";

    /// Main system configuration file name.
    pub const SYSTEM_FILE: &str = "qforge.conf.json";

    /// Suffix shared by every configuration file.
    pub const CONF_SUFFIX: &str = ".conf.json";

    /// Runtime directory for sockets.
    pub const RUN_DIR: &str = "/run/qforge";

    /// Sysfs directory of mediated devices.
    pub const MDEV_DEVICES: &str = "/sys/bus/mdev/devices";
}

/// Environment variables overriding [`paths`].
pub mod env {
    pub const CONF_DIR: &str = "QFORGE_CONF_DIR";
    pub const RUN_DIR: &str = "QFORGE_RUN_DIR";
}

/// Device topology limits.
pub mod limits {
    /// Functions per PCI slot.
    pub const FUNCTIONS_PER_SLOT: usize = 8;

    /// Root ports that fit on the root complex (32 slots of 8 functions).
    pub const MAX_ROOTS: usize = 32 * FUNCTIONS_PER_SLOT;

    /// Logical units per virtio-scsi controller.
    pub const MAX_SCSI_DEVICES: usize = 28;

    /// Ports per xHCI controller.
    pub const MAX_USB_PORTS: usize = 15;

    /// Ports per virtio-serial controller, including reserved port 0.
    pub const MAX_SERIAL_PORTS: usize = 31;

    /// Positions on the onboard AHCI controller.
    pub const MAX_SATA_DEVICES: usize = 6;

    /// Maximum length of a character device id.
    pub const MAX_CHARDEV_ID: usize = 127;

    /// QXL display heads.
    pub const MAX_DISPLAYS: u32 = 4;
}

/// Domain labels fed to the identity seed.
pub mod domain {
    pub const VOLUME_WWN: &[&str] = &["volume", "wwn"];
    pub const VOLUME_SERIAL: &[&str] = &["volume", "serial-number"];
    pub const CONNECTION_MAC: &[&str] = &["connection", "mac"];
    pub const DEVICE_ID: &[&str] = &["device", "id"];
    pub const FILESYSTEM_GROUP: &[&str] = &["privilege", "file-system", "group-id"];
}

/// Well-known QEMU names.
pub mod qemu {
    /// Machine type for every compiled guest.
    pub const MACHINE_TYPE: &str = "q35";

    /// Bus of the PCI Express root complex.
    pub const ROOT_BUS: &str = "pcie.0";

    /// Script value that disables tap up/down scripts.
    pub const NO_SCRIPT: &str = "no";

    /// Queues per virtio-scsi and virtio-blk device.
    pub const NUM_QUEUES: u32 = 4;

    /// QXL ram_size and vram_size globals.
    pub const QXL_MEMORY: u64 = 67_108_864;

    /// Loopback address for TCP character devices and SPICE.
    pub const LOOPBACK: &str = "127.0.0.1";

    pub const GUEST_AGENT_CHARDEV: &str = "guestagent";
    pub const GUEST_AGENT_PORT: &str = "org.qemu.guest_agent.0";
    pub const SPICE_AGENT_CHARDEV: &str = "vdagent";
    pub const SPICE_AGENT_PORT: &str = "com.redhat.spice.0";
    pub const USB_REDIR_CHANNELS: usize = 2;
    pub const TPM_CHARDEV: &str = "tpm.0.socket";
    pub const TPM_DEVICE: &str = "tpm.0";
}

/// Privileges assigned to machines.
pub mod privileges {
    /// Prefix of derived file-system group names.
    pub const GROUP_PREFIX: &str = "qforge-";

    /// Lowest derived group id, above typical system and user ranges.
    pub const GROUP_ID_MIN: u32 = 65_536;

    /// Exclusive upper bound of derived group ids.
    pub const GROUP_ID_MAX: u32 = 2_147_483_647;
}
