// Detection constants (No magic values)

/// Debian-family marker file; its presence is authoritative
pub const DEBIAN_MARKERS: &[&str] = &["/etc/debian_version"];

/// RPM-family marker files; any one of them is authoritative
pub const RPM_MARKERS: &[&str] = &["/etc/redhat-release", "/etc/system-release"];

/// Debian-family package tool looked up on the search path
pub const DPKG_COMMAND: &str = "dpkg";

/// RPM-family package tool looked up on the search path
pub const RPM_COMMAND: &str = "rpm";

/// Unit suffix appended to bare service names before asking systemd
pub const SERVICE_UNIT_SUFFIX: &str = ".service";

/// Directory holding traditional init scripts
pub const INIT_SCRIPT_DIR: &str = "/etc/init.d";

/// Runlevel directories scanned for start links of init-script services
pub const RUNLEVEL_DIRS: &[&str] = &["/etc/rc2.d", "/etc/rc3.d", "/etc/rc4.d", "/etc/rc5.d"];
