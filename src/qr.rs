#![cfg(feature = "web")]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::Rgb;
use qrcode::QrCode;
use qrcode::types::QrError;
use std::io::Cursor;
use thiserror::Error;

use crate::result::result_color;

/// Pixel size the QR image is rendered at (quiet zone included)
pub const QR_SIZE: u32 = 200;

#[derive(Debug, Error)]
pub enum QrGenerationError {
    /// The share URL no longer fits in a QR code
    #[error("結果データが大きすぎてQRコードにできません")]
    DataTooLong,

    #[error("QRコードの生成に失敗しました: {0}")]
    Encoding(String),
}

/// Renders the share URL as a PNG QR code
///
/// The dark modules take the result color for the given accuracy (red,
/// blue or green, grey when the score is unknown) on a white background,
/// so a phone camera picking up the code also reads the verdict at a
/// glance.
pub fn result_qr_png(share_url: &str, accuracy: Option<u32>) -> Result<Vec<u8>, QrGenerationError> {
    let code = QrCode::new(share_url.as_bytes()).map_err(|e| match e {
        QrError::DataTooLong => QrGenerationError::DataTooLong,
        other => QrGenerationError::Encoding(other.to_string()),
    })?;

    let image = code
        .render::<Rgb<u8>>()
        .min_dimensions(QR_SIZE, QR_SIZE)
        .dark_color(parse_hex_color(result_color(accuracy)))
        .light_color(Rgb([255, 255, 255]))
        .build();

    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageOutputFormat::Png)
        .map_err(|e| QrGenerationError::Encoding(e.to_string()))?;
    Ok(bytes.into_inner())
}

/// Renders the share URL as a `data:image/png;base64,...` URI
///
/// This is what result pages embed directly in an `<img>` tag.
pub fn result_qr_data_uri(
    share_url: &str,
    accuracy: Option<u32>,
) -> Result<String, QrGenerationError> {
    let png = result_qr_png(share_url, accuracy)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

fn parse_hex_color(hex: &str) -> Rgb<u8> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Rgb([0, 0, 0]);
    }
    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
    Rgb([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_png() {
        let png = result_qr_png("http://localhost:3000/result/abc123", Some(85)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn data_uri_has_png_prefix() {
        let uri = result_qr_data_uri("http://localhost:3000/result/abc123", None).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let huge = "a".repeat(3000);
        match result_qr_png(&huge, Some(100)) {
            Err(QrGenerationError::DataTooLong) => {}
            other => panic!("expected DataTooLong, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn hex_colors_parse_to_rgb() {
        assert_eq!(parse_hex_color("#ef4444"), Rgb([0xef, 0x44, 0x44]));
        assert_eq!(parse_hex_color("#10b981"), Rgb([0x10, 0xb9, 0x81]));
        assert_eq!(parse_hex_color("garbage"), Rgb([0, 0, 0]));
    }
}
