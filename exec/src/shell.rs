//! Shell detection and configuration for command execution.

use std::path::{Path, PathBuf};

use localgate_types::ShellType;

use crate::config::ShellConfig;

/// Detected shell for command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedShell {
    /// Path or name of the shell binary.
    pub binary: PathBuf,
    /// Arguments to pass before the command (e.g., `["-c"]`).
    pub args: Vec<String>,
    /// Human-readable name for logging.
    pub name: String,
    pub shell_type: ShellType,
}

impl std::fmt::Display for DetectedShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.shell_type)
    }
}

/// Pick a shell binary speaking the requested dialect.
///
/// Priority:
/// - Config override (if set)
/// - Dialect-specific lookup on `PATH`
///
/// A configured binary is labelled with the dialect its name implies, so a
/// `pwsh` override on a Bourne host reports `PowerShell`.
#[must_use]
pub fn detect_shell(shell_type: ShellType, config: Option<&ShellConfig>) -> DetectedShell {
    if let Some(cfg) = config
        && let Some(binary) = &cfg.binary
    {
        let args = cfg.args.clone().unwrap_or_else(|| default_args_for(binary));
        let actual = dialect_of(binary).unwrap_or(shell_type);
        if actual != shell_type {
            tracing::warn!(
                binary,
                requested = %shell_type,
                actual = %actual,
                "configured shell speaks a different dialect than the platform"
            );
        }
        return DetectedShell {
            binary: PathBuf::from(binary),
            args,
            name: "configured".into(),
            shell_type: actual,
        };
    }

    match shell_type {
        ShellType::PowerShell => detect_powershell(),
        ShellType::Bourne => detect_bourne_shell(),
    }
}

fn stem_of(binary: &str) -> String {
    Path::new(binary)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(binary)
        .to_lowercase()
}

/// Dialect a shell binary speaks, when its name gives it away.
fn dialect_of(binary: &str) -> Option<ShellType> {
    match stem_of(binary).as_str() {
        "pwsh" | "powershell" => Some(ShellType::PowerShell),
        "sh" | "bash" | "dash" | "ash" | "ksh" | "zsh" | "busybox" => Some(ShellType::Bourne),
        _ => None,
    }
}

/// Infer default args for a shell binary name.
fn default_args_for(binary: &str) -> Vec<String> {
    match dialect_of(binary) {
        Some(ShellType::PowerShell) => powershell_args(),
        // Most Unix shells use -c
        _ => vec!["-c".to_string()],
    }
}

fn powershell_args() -> Vec<String> {
    vec![
        "-NoProfile".to_string(),
        "-NonInteractive".to_string(),
        "-Command".to_string(),
    ]
}

fn detect_powershell() -> DetectedShell {
    for candidate in ["pwsh", "powershell"] {
        if let Ok(path) = which::which(candidate) {
            return DetectedShell {
                binary: path,
                args: powershell_args(),
                name: candidate.into(),
                shell_type: ShellType::PowerShell,
            };
        }
    }

    // Not on PATH; let spawn report the failure.
    DetectedShell {
        binary: PathBuf::from("powershell"),
        args: powershell_args(),
        name: "powershell".into(),
        shell_type: ShellType::PowerShell,
    }
}

// $SHELL is not consulted: the user's interactive shell (fish, nu, ...) need
// not accept POSIX syntax.
fn detect_bourne_shell() -> DetectedShell {
    if let Ok(path) = which::which("sh") {
        return DetectedShell {
            binary: path,
            args: vec!["-c".to_string()],
            name: "sh".into(),
            shell_type: ShellType::Bourne,
        };
    }

    if let Ok(path) = which::which("bash") {
        return DetectedShell {
            binary: path,
            args: vec!["-c".to_string()],
            name: "bash".into(),
            shell_type: ShellType::Bourne,
        };
    }

    DetectedShell {
        binary: PathBuf::from("/bin/sh"),
        args: vec!["-c".to_string()],
        name: "sh".into(),
        shell_type: ShellType::Bourne,
    }
}

#[cfg(test)]
mod tests {
    use super::{PathBuf, ShellConfig, ShellType, default_args_for, detect_shell, dialect_of};

    #[test]
    fn test_default_args_for_powershell() {
        assert_eq!(
            default_args_for("pwsh"),
            vec!["-NoProfile", "-NonInteractive", "-Command"]
        );
        assert_eq!(
            default_args_for("powershell.exe"),
            vec!["-NoProfile", "-NonInteractive", "-Command"]
        );
    }

    #[test]
    fn test_default_args_for_unix_shells() {
        assert_eq!(default_args_for("sh"), vec!["-c"]);
        assert_eq!(default_args_for("/bin/bash"), vec!["-c"]);
        assert_eq!(default_args_for("/usr/local/bin/dash"), vec!["-c"]);
    }

    #[test]
    fn test_config_override() {
        let config = ShellConfig {
            binary: Some("dash".to_string()),
            args: Some(vec!["-ec".to_string()]),
        };
        let shell = detect_shell(ShellType::Bourne, Some(&config));
        assert_eq!(shell.binary, PathBuf::from("dash"));
        assert_eq!(shell.args, vec!["-ec"]);
        assert_eq!(shell.name, "configured");
        assert_eq!(shell.shell_type, ShellType::Bourne);
    }

    #[test]
    fn test_config_override_is_labelled_by_binary_dialect() {
        let config = ShellConfig {
            binary: Some("/usr/bin/pwsh".to_string()),
            args: None,
        };
        let shell = detect_shell(ShellType::Bourne, Some(&config));
        assert_eq!(shell.shell_type, ShellType::PowerShell);
        assert_eq!(shell.args.last().map(String::as_str), Some("-Command"));

        let config = ShellConfig {
            binary: Some("/opt/bin/mysh".to_string()),
            args: None,
        };
        let shell = detect_shell(ShellType::PowerShell, Some(&config));
        assert_eq!(shell.shell_type, ShellType::PowerShell);
    }

    #[test]
    fn test_dialect_of_known_binaries() {
        assert_eq!(dialect_of("powershell.exe"), Some(ShellType::PowerShell));
        assert_eq!(dialect_of("/bin/dash"), Some(ShellType::Bourne));
        assert_eq!(dialect_of("fish"), None);
    }

    #[test]
    fn test_config_without_binary_is_ignored() {
        let config = ShellConfig {
            binary: None,
            args: Some(vec!["-x".to_string()]),
        };
        let shell = detect_shell(ShellType::Bourne, Some(&config));
        assert_eq!(shell.args, vec!["-c"]);
    }

    #[test]
    fn test_powershell_detection_uses_command_args() {
        let shell = detect_shell(ShellType::PowerShell, None);
        assert_eq!(shell.shell_type, ShellType::PowerShell);
        assert_eq!(shell.args.last().map(String::as_str), Some("-Command"));
    }

    #[test]
    #[cfg(unix)]
    fn test_bourne_detection_on_unix() {
        let shell = detect_shell(ShellType::Bourne, None);
        assert!(!shell.binary.as_os_str().is_empty());
        assert_eq!(shell.args, vec!["-c"]);
    }
}
