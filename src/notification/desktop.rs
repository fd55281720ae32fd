//! Desktop notifications through the platform's own command line tools.
//!
//! Toasts go through `notify-send` (Linux/BSD), `osascript` (macOS) or a PowerShell
//! toast (Windows). The modal fallback uses `zenity`, `osascript display alert` or `msg`.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{Notifier, error::NotificationError};

/// A toast command that has not returned after this long is treated as failed.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

const APP_NAME: &str = "statuswatch";

/// Shows a transient toast notification. This is the active notifier.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: PathBuf,
}

impl DesktopNotifier {
    /// Returns a notifier if the platform's toast command is installed.
    pub fn detect() -> Option<Self> {
        find_program(TOAST_PROGRAM).map(|program| Self { program })
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn show(
        &self,
        title: &str,
        body: &str,
        duration: Duration,
    ) -> Result<(), NotificationError> {
        let args = toast_args(title, body, duration);
        run_to_completion(&self.program, &args).await
    }
}

/// Pops up a dialog the user has to dismiss.
///
/// The dialog process is left running on its own; `show` returns as soon as it started.
#[derive(Debug, Clone)]
pub struct ModalNotifier {
    program: PathBuf,
}

impl ModalNotifier {
    pub fn detect() -> Option<Self> {
        find_program(MODAL_PROGRAM).map(|program| Self { program })
    }
}

#[async_trait]
impl Notifier for ModalNotifier {
    async fn show(
        &self,
        title: &str,
        body: &str,
        _duration: Duration,
    ) -> Result<(), NotificationError> {
        let args = modal_args(title, body);
        Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_child| ())
            .map_err(|source| NotificationError::Spawn {
                program: display_name(&self.program),
                source,
            })
    }
}

async fn run_to_completion(program: &Path, args: &[String]) -> Result<(), NotificationError> {
    let name = display_name(program);
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status();

    match tokio::time::timeout(COMMAND_TIMEOUT, status).await {
        Err(_) => Err(NotificationError::TimedOut {
            program: name,
            seconds: COMMAND_TIMEOUT.as_secs(),
        }),
        Ok(Err(source)) => Err(NotificationError::Spawn {
            program: name,
            source,
        }),
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(NotificationError::Failed {
            program: name,
            status: status.to_string(),
        }),
    }
}

fn display_name(program: &Path) -> String {
    program
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

/// Looks `program` up on `PATH`.
fn find_program(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(executable_name(program)))
        .find(|candidate| candidate.is_file())
}

#[cfg(windows)]
fn executable_name(program: &str) -> String {
    format!("{program}.exe")
}

#[cfg(not(windows))]
fn executable_name(program: &str) -> String {
    program.to_string()
}

/// Quotes a string as an AppleScript literal.
#[cfg(any(target_os = "macos", test))]
fn applescript_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Quotes a string as a single-quoted PowerShell literal.
#[cfg(any(windows, test))]
fn powershell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[cfg(all(unix, not(target_os = "macos")))]
const TOAST_PROGRAM: &str = "notify-send";
#[cfg(all(unix, not(target_os = "macos")))]
const MODAL_PROGRAM: &str = "zenity";

#[cfg(target_os = "macos")]
const TOAST_PROGRAM: &str = "osascript";
#[cfg(target_os = "macos")]
const MODAL_PROGRAM: &str = "osascript";

#[cfg(windows)]
const TOAST_PROGRAM: &str = "powershell";
#[cfg(windows)]
const MODAL_PROGRAM: &str = "msg";

#[cfg(all(unix, not(target_os = "macos")))]
fn toast_args(title: &str, body: &str, duration: Duration) -> Vec<String> {
    vec![
        format!("--app-name={APP_NAME}"),
        "--urgency=critical".to_string(),
        format!("--expire-time={}", duration.as_millis()),
        title.to_string(),
        body.to_string(),
    ]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn modal_args(title: &str, body: &str) -> Vec<String> {
    vec![
        "--warning".to_string(),
        format!("--title={title}"),
        format!("--text={body}"),
        "--no-markup".to_string(),
    ]
}

#[cfg(target_os = "macos")]
fn toast_args(title: &str, body: &str, _duration: Duration) -> Vec<String> {
    vec![
        "-e".to_string(),
        format!(
            "display notification {} with title {} subtitle {}",
            applescript_quote(body),
            applescript_quote(title),
            applescript_quote(APP_NAME)
        ),
    ]
}

#[cfg(target_os = "macos")]
fn modal_args(title: &str, body: &str) -> Vec<String> {
    vec![
        "-e".to_string(),
        format!(
            "display alert {} message {} as warning",
            applescript_quote(title),
            applescript_quote(body)
        ),
    ]
}

#[cfg(windows)]
fn toast_args(title: &str, body: &str, duration: Duration) -> Vec<String> {
    let script = format!(
        "[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] > $null; \
         $template = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02); \
         $texts = $template.GetElementsByTagName('text'); \
         $texts.Item(0).AppendChild($template.CreateTextNode({title})) > $null; \
         $texts.Item(1).AppendChild($template.CreateTextNode({body})) > $null; \
         $toast = [Windows.UI.Notifications.ToastNotification]::new($template); \
         $toast.ExpirationTime = [DateTimeOffset]::Now.AddSeconds({seconds}); \
         [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier({app}).Show($toast)",
        title = powershell_quote(title),
        body = powershell_quote(body),
        seconds = duration.as_secs(),
        app = powershell_quote(APP_NAME),
    );
    vec![
        "-NoProfile".to_string(),
        "-NonInteractive".to_string(),
        "-Command".to_string(),
        script,
    ]
}

#[cfg(windows)]
fn modal_args(title: &str, body: &str) -> Vec<String> {
    vec!["*".to_string(), format!("{title}: {body}")]
}
