//! Декодирование документа отчёта: расшифровка (AES-256-CBC для документов
//! старого формата), gzip и zip-обёртка.

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use std::io::{Cursor, Read};

use super::models::{EncryptionDetails, ReportDocument};

type Aes256CbcDec = cbc::Decryptor<Aes256>;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Unsupported encryption standard: {0}")]
    UnsupportedEncryption(String),

    #[error("Invalid encryption key or IV: {0}")]
    InvalidKey(String),

    #[error("Decryption failed: {0}")]
    Decrypt(String),

    #[error("Unsupported compression algorithm: {0}")]
    UnsupportedCompression(String),

    #[error("Decompression failed: {0}")]
    Decompress(#[from] std::io::Error),

    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Zip archive contains no files")]
    EmptyArchive,
}

/// Расшифровать документ по `encryptionDetails`
pub fn decrypt_document(data: &[u8], details: &EncryptionDetails) -> Result<Vec<u8>, DocumentError> {
    if !details.standard.eq_ignore_ascii_case("AES") {
        return Err(DocumentError::UnsupportedEncryption(details.standard.clone()));
    }
    let key = BASE64
        .decode(details.key.trim())
        .map_err(|e| DocumentError::InvalidKey(e.to_string()))?;
    let iv = BASE64
        .decode(details.initialization_vector.trim())
        .map_err(|e| DocumentError::InvalidKey(e.to_string()))?;

    let decryptor = Aes256CbcDec::new_from_slices(&key, &iv)
        .map_err(|e| DocumentError::InvalidKey(e.to_string()))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|e| DocumentError::Decrypt(e.to_string()))
}

pub fn gunzip(data: &[u8]) -> Result<Vec<u8>, DocumentError> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

pub fn is_zip(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Если данные - zip-архив, вернуть первый файл архива, иначе данные как есть
pub fn unwrap_zip(data: Vec<u8>) -> Result<Vec<u8>, DocumentError> {
    if !is_zip(&data) {
        return Ok(data);
    }
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        tracing::debug!("Extracting '{}' from report archive", entry.name());
        let mut out = Vec::new();
        entry.read_to_end(&mut out)?;
        return Ok(out);
    }
    Err(DocumentError::EmptyArchive)
}

/// Полное декодирование скачанного документа
pub fn decode_report_document(
    raw: Vec<u8>,
    document: &ReportDocument,
) -> Result<Vec<u8>, DocumentError> {
    let decrypted = match &document.encryption_details {
        Some(details) => decrypt_document(&raw, details)?,
        None => raw,
    };

    let decompressed = match document.compression_algorithm.as_deref() {
        Some(algo) if algo.eq_ignore_ascii_case("GZIP") => gunzip(&decrypted)?,
        Some(other) => return Err(DocumentError::UnsupportedCompression(other.to_string())),
        // reqwest уже снял Content-Encoding, но сам файл может оставаться gzip
        None if decrypted.starts_with(GZIP_MAGIC) => gunzip(&decrypted)?,
        None => decrypted,
    };

    unwrap_zip(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbc::cipher::BlockEncryptMut;
    use std::io::Write;

    fn document(compression: Option<&str>, encryption: Option<EncryptionDetails>) -> ReportDocument {
        ReportDocument {
            report_document_id: "amzn1.spdoc.1".into(),
            url: "https://example.invalid/doc".into(),
            compression_algorithm: compression.map(str::to_string),
            encryption_details: encryption,
        }
    }

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_unwrap_zip_returns_first_member() {
        let data = zip_bytes(&[("mtr.csv", b"Order Id\n1\n"), ("other.csv", b"x")]);
        assert!(is_zip(&data));
        assert_eq!(unwrap_zip(data).unwrap(), b"Order Id\n1\n".to_vec());
    }

    #[test]
    fn test_unwrap_zip_passes_plain_csv() {
        let plain = b"Order Id,Quantity\n".to_vec();
        assert_eq!(unwrap_zip(plain.clone()).unwrap(), plain);
    }

    #[test]
    fn test_gzip_then_zip() {
        let inner = zip_bytes(&[("report.csv", b"a,b\n")]);
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&inner).unwrap();
        let gz = encoder.finish().unwrap();
        let out = decode_report_document(gz, &document(Some("GZIP"), None)).unwrap();
        assert_eq!(out, b"a,b\n".to_vec());
    }

    #[test]
    fn test_decrypt_aes_cbc() {
        let key = [7u8; 32];
        let iv = [3u8; 16];
        let plain = b"Order Id,Quantity\n408-1,1\n";
        let encrypted = cbc::Encryptor::<Aes256>::new_from_slices(&key, &iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(plain);
        let details = EncryptionDetails {
            standard: "AES".into(),
            initialization_vector: BASE64.encode(iv),
            key: BASE64.encode(key),
        };
        let out = decode_report_document(encrypted, &document(None, Some(details))).unwrap();
        assert_eq!(out, plain.to_vec());
    }

    #[test]
    fn test_unknown_compression_is_error() {
        let err = decode_report_document(b"x".to_vec(), &document(Some("BROTLI"), None)).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedCompression(_)));
    }
}
