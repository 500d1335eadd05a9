//! ROM image loading
//!
//! An image is a text file with one S1 record per line. Every record must
//! fit in a single device page so it can be sent as one page command.

use eeburn_core::config::PAGE_SIZE;
use eeburn_core::error::RecordError;
use eeburn_core::page::check_page_bounds;
use eeburn_core::srec;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Image validation errors; line numbers are 1-based
#[derive(Debug, Error)]
pub enum ImageError {
    /// Could not read the file
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),

    /// Line is not a valid S1 record
    #[error("Line {line}: not a valid S1 record: {source}")]
    Record {
        line: usize,
        #[source]
        source: RecordError,
    },

    /// Record lies outside the device
    #[error("Line {line}: address 0x{address:04X} (+{size}) is outside the {rom_size} byte ROM")]
    OutOfRange {
        line: usize,
        address: u16,
        size: usize,
        rom_size: u32,
    },

    /// Record carries more than a page
    #[error("Line {line}: record size {size} is over {max} bytes", max = PAGE_SIZE)]
    TooLarge { line: usize, size: usize },

    /// Record spans two pages
    #[error("Line {line}: record at 0x{address:04X} crosses a page boundary")]
    CrossesPage { line: usize, address: u16 },
}

/// One page-sized record of an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Address of the first byte
    pub address: u16,
    /// Number of data bytes
    pub size: usize,
    /// The record as it appears in the file
    pub text: String,
}

/// A validated ROM image
#[derive(Debug, Clone, Default)]
pub struct Image {
    pub records: Vec<ImageRecord>,
}

impl Image {
    /// Load and validate an image file
    pub fn load(path: &Path, rom_size: u32) -> Result<Self, ImageError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, rom_size)
    }

    /// Validate image text; blank lines are skipped
    pub fn parse(text: &str, rom_size: u32) -> Result<Self, ImageError> {
        let mut records = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let raw = raw.trim_end();
            if raw.is_empty() {
                continue;
            }

            let record = srec::decode(raw.as_bytes())
                .map_err(|source| ImageError::Record { line, source })?;
            let address = record.address;
            let size = record.len();

            if size > PAGE_SIZE {
                return Err(ImageError::TooLarge { line, size });
            }
            if address as u32 + size as u32 > rom_size || address as u32 >= rom_size {
                return Err(ImageError::OutOfRange {
                    line,
                    address,
                    size,
                    rom_size,
                });
            }
            if check_page_bounds(address, size).is_err() {
                return Err(ImageError::CrossesPage { line, address });
            }

            records.push(ImageRecord {
                address,
                size,
                text: raw.to_string(),
            });
        }

        Ok(Self { records })
    }

    /// Number of page commands
    pub fn pages(&self) -> usize {
        self.records.len()
    }

    /// Total number of data bytes
    pub fn size(&self) -> usize {
        self.records.iter().map(|r| r.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image() {
        let text = "S1061234AABBCC82\r\n\nS10380007C\n";
        let image = Image::parse(text, 0x10000).unwrap();
        assert_eq!(image.pages(), 2);
        assert_eq!(image.size(), 3);
        assert_eq!(image.records[0].address, 0x1234);
        assert_eq!(image.records[0].text, "S1061234AABBCC82");
        assert_eq!(image.records[1].address, 0x8000);
        assert_eq!(image.records[1].size, 0);
    }

    #[test]
    fn test_reject_bad_record_with_line_number() {
        let text = "S1061234AABBCC82\nS1061234AABBCC83\n";
        match Image::parse(text, 0x8000) {
            Err(ImageError::Record { line, source }) => {
                assert_eq!(line, 2);
                assert_eq!(source, RecordError::ChecksumMismatch);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_reject_out_of_range() {
        let line = srec::encode(0x8000, &[0x01]).unwrap();
        assert!(matches!(
            Image::parse(&line, 0x8000),
            Err(ImageError::OutOfRange { line: 1, address: 0x8000, .. })
        ));

        let line = srec::encode(0x7FFF, &[0x01, 0x02]).unwrap();
        assert!(matches!(
            Image::parse(&line, 0x8000),
            Err(ImageError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_reject_large_and_crossing_records() {
        let line = srec::encode(0x0000, &[0u8; PAGE_SIZE + 1]).unwrap();
        assert!(matches!(
            Image::parse(&line, 0x8000),
            Err(ImageError::TooLarge { line: 1, size }) if size == PAGE_SIZE + 1
        ));

        let line = srec::encode(0x0030, &[0u8; 32]).unwrap();
        assert!(matches!(
            Image::parse(&line, 0x8000),
            Err(ImageError::CrossesPage { line: 1, address: 0x0030 })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = Image::parse("S1061234AABBCC82\n\nXX\n", 0x8000).unwrap_err();
        assert!(err.to_string().starts_with("Line 3: not a valid S1 record"));
    }
}
