use std::process::Command;

/// Best-effort launch of the platform opener. Failures only print the URL so
/// the run itself never fails on a missing desktop environment.
pub fn open_in_browser(url: &str) {
    let status = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).status()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", "", url]).status()
    } else {
        Command::new("xdg-open").arg(url).status()
    };

    match status {
        Ok(status) if status.success() => {}
        _ => eprintln!("Could not open a browser. Open this URL manually: {url}"),
    }
}
