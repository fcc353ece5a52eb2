use chunkup_api_client::UploadEvent;

/// Human-readable byte count (binary units)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// One status line per stored chunk; streamed progress is left to the debug log
pub fn describe_event(event: &UploadEvent) -> Option<String> {
    match event {
        UploadEvent::ChunkAcknowledged {
            index,
            total_chunks,
            file_id,
        } => Some(format!(
            "chunk {}/{} stored (upload {})",
            index + 1,
            total_chunks,
            file_id
        )),
        UploadEvent::Progress { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KiB");
        assert_eq!(format_bytes(5 * 512 * 1024), "2.5 MiB");
    }

    #[test]
    fn describe_chunk_acknowledgement() {
        let line = describe_event(&UploadEvent::ChunkAcknowledged {
            index: 0,
            total_chunks: 3,
            file_id: "a.pdf-3-abc".to_string(),
        });
        assert_eq!(line.as_deref(), Some("chunk 1/3 stored (upload a.pdf-3-abc)"));
    }

    #[test]
    fn progress_events_are_silent() {
        let event = UploadEvent::Progress {
            percent: 50.0,
            bytes_sent: 5,
            total_bytes: 10,
        };
        assert!(describe_event(&event).is_none());
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
