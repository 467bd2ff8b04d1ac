//! Capture pretty-printer: render a hex dump of bus traffic frame by frame.
//!
//! Accepts whitespace-separated hex bytes (optionally `0x`-prefixed) from a
//! file or stdin. Useful for eyeballing logic-analyzer exports without
//! plugging anything in.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use spalink_core::protocol::framing::FrameReader;
use spalink_core::protocol::messages::MessageKind;

/// Reads the capture, feeds it through the framer, prints one line per
/// valid frame plus a trailing error count.
pub fn run(input: Option<&Path>) -> anyhow::Result<()> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading capture {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading capture from stdin")?;
            text
        }
    };

    let mut reader = FrameReader::new();
    let mut count = 0usize;
    for token in text.split_whitespace() {
        let token = token.trim_start_matches("0x").trim_start_matches("0X");
        let byte = match u8::from_str_radix(token, 16) {
            Ok(byte) => byte,
            Err(_) => bail!("not a hex byte: {token:?}"),
        };
        if let Some(frame) = reader.feed(byte) {
            count += 1;
            let kind = MessageKind::try_from(frame.kind)
                .map(|k| k.name())
                .unwrap_or("Unknown");
            println!(
                "#{count:<4} dest={:#04X} src={:#04X} kind={:#04X} {kind:<18} payload={}",
                frame.dest,
                frame.src,
                frame.kind,
                hex_string(&frame.payload),
            );
        }
    }
    println!(
        "{count} frames, {} framing errors",
        reader.frames_with_errors()
    );
    Ok(())
}

fn hex_string(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "-".to_string();
    }
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_string_formatting() {
        assert_eq!(hex_string(&[]), "-");
        assert_eq!(hex_string(&[0x02, 0xF1, 0x73]), "02 F1 73");
    }
}
