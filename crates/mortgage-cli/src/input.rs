use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Load a typed request from a JSON or YAML file, picked by extension.
pub fn read_request<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    if !p.is_file() {
        return Err(format!("File not found: {path}").into());
    }
    let contents =
        fs::read_to_string(p).map_err(|e| format!("Failed to read '{path}': {e}"))?;

    let is_yaml = matches!(
        p.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        Ok(serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{path}': {e}"))?)
    } else {
        Ok(serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{path}': {e}"))?)
    }
}

/// Read a JSON request piped on stdin, if any.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&buffer)?))
}
