//! Input file handling for the conversion pipeline.
//!
//! # Features
//!
//! - **Format detection**: format id, MIME type, extension and leading bytes
//!   resolve the container; CSV delimiters are sniffed when not pinned
//! - **Encoding fallback**: text is decoded strictly with each candidate
//!   encoding in turn
//! - **Row reading**: CSV, Excel, JSON, XML and PDF forms read into rows
//!   shaped to a target [`StageLayout`](convert_model::StageLayout)
//! - **Header discovery**: header names of sample files, merged into a
//!   [`HeaderCatalog`]
//!
//! # Example
//!
//! ```ignore
//! use convert_ingest::{FormatDetector, ReadMode, RowReader, SourceFile};
//!
//! let file = SourceFile::from_path(Path::new("patients.csv"))?;
//! let detector = FormatDetector::default();
//! let spec = detector.detect_file(&file, None)?;
//! let rows = RowReader::default().read(&file, &spec, &layout, ReadMode::Named)?;
//! ```

mod decode;
mod detect;
mod error;
mod format;
mod headers;
mod reader;
mod source;

// === Error Types ===
pub use error::{IngestError, Result};

// === Formats ===
pub use decode::{DecodedText, decode_text};
pub use detect::{DELIMITER_CANDIDATES, FormatDetector, FormatHint, sniff_delimiter};
pub use format::{Container, EncodingFallback, FileFormatId, FormatSpec, TextEncoding};

// === Reading ===
pub use reader::{ReadMode, RowReader, Rows, normalize_header};
pub use source::{MAX_FILE_SIZE, SourceFile};

// === Header Discovery ===
pub use headers::{HeaderCatalog, HeaderEntry, HeaderPlacement, discover_headers};
