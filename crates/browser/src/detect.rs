//! Locating a Chromium-based browser on the host.

use std::{fmt, path::PathBuf};

/// Executable names looked up on `PATH`, in preference order.
const PATH_EXECUTABLES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "chromium",
    "chromium-browser",
    "microsoft-edge",
    "microsoft-edge-stable",
    "msedge",
    "brave-browser",
    "brave",
];

#[cfg(target_os = "macos")]
const PLATFORM_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

#[cfg(target_os = "windows")]
const PLATFORM_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_PATHS: &[&str] = &[];

/// Where a browser executable was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserSource {
    /// `whatsapp.chrome_path` in the config file or `WA2TG_CHROME_PATH`.
    Config,
    /// The `CHROME` environment variable.
    ChromeEnv,
    /// A well-known install location (app bundles, Program Files).
    Platform,
    /// An executable on `PATH`.
    Path,
}

impl fmt::Display for BrowserSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Config => "config",
            Self::ChromeEnv => "CHROME",
            Self::Platform => "platform",
            Self::Path => "PATH",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedBrowser {
    pub path: PathBuf,
    pub source: BrowserSource,
}

/// Outcome of a detection pass.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub executable: Option<DetectedBrowser>,
    /// Install instructions; empty when a browser was found.
    pub install_hint: String,
}

impl DetectionResult {
    pub fn found(&self) -> bool {
        self.executable.is_some()
    }
}

/// Find a browser, checking the configured path, then `CHROME`, then
/// platform install locations, then `PATH`.
///
/// Platform locations come before `PATH` because `PATH` can hold stale
/// wrapper scripts.
pub fn detect_browser(custom_path: Option<&str>) -> DetectionResult {
    detect_with(custom_path, std::env::var("CHROME").ok().as_deref())
}

fn detect_with(custom_path: Option<&str>, chrome_env: Option<&str>) -> DetectionResult {
    let existing = |path: &str, source| {
        let path = PathBuf::from(path);
        path.exists().then_some(DetectedBrowser { path, source })
    };

    let executable = custom_path
        .and_then(|p| existing(p, BrowserSource::Config))
        .or_else(|| chrome_env.and_then(|p| existing(p, BrowserSource::ChromeEnv)))
        .or_else(|| {
            PLATFORM_PATHS
                .iter()
                .find_map(|p| existing(p, BrowserSource::Platform))
        })
        .or_else(|| {
            PATH_EXECUTABLES.iter().find_map(|name| {
                which::which(name).ok().map(|path| DetectedBrowser {
                    path,
                    source: BrowserSource::Path,
                })
            })
        });

    if let Some(path) = custom_path
        && executable
            .as_ref()
            .is_none_or(|e| e.source != BrowserSource::Config)
    {
        tracing::warn!(path, "configured chrome_path does not exist, falling back");
    }

    let install_hint = if executable.is_some() {
        String::new()
    } else {
        install_instructions()
    };

    DetectionResult {
        executable,
        install_hint,
    }
}

/// Platform-specific install instructions.
pub fn install_instructions() -> String {
    let instructions = if cfg!(target_os = "macos") {
        "  brew install --cask google-chrome"
    } else if cfg!(target_os = "windows") {
        "  winget install Google.Chrome"
    } else if cfg!(target_os = "linux") {
        "  Debian/Ubuntu: sudo apt install chromium\n  \
         Fedora:        sudo dnf install chromium\n  \
         Arch:          sudo pacman -S chromium"
    } else {
        "  Download from https://www.google.com/chrome/"
    };

    format!(
        "WhatsApp Web needs a Chromium-based browser. Install one:\n\n\
         {instructions}\n\n\
         Or point at an existing one:\n  \
         [whatsapp]\n  \
         chrome_path = \"/path/to/chrome\"\n\n\
         or set WA2TG_CHROME_PATH / CHROME."
    )
}
