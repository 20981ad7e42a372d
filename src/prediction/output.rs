use crate::error::Result;
use crate::models::StressCategory;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Key read by the downstream rule engine
pub const STRESS_LEVEL_KEY: &str = "STRESS_LEVEL";

/// The single line handed downstream, without a trailing newline
pub fn stress_level_line(category: StressCategory) -> String {
    format!("{}={}", STRESS_LEVEL_KEY, category)
}

/// Replace the file at `path` with the stress level line
pub fn write_stress_output(path: impl AsRef<Path>, category: StressCategory) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    temp_name.push(".tmp");
    let temp = path.with_file_name(temp_name);

    let written = (|| -> Result<()> {
        let mut file = fs::File::create(&temp)?;
        writeln!(file, "{}", stress_level_line(category))?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }

    info!(path = %path.display(), category = %category, "Wrote stress level");
    Ok(())
}
