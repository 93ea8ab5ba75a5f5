//! Output generation for converted rows.
//!
//! - **CSV**: delimiter and encoding from the format id; characters the
//!   encoding cannot represent go through a [`SubstitutionTable`] and are
//!   dropped if still unencodable
//! - **Excel**: one named sheet with auto-sized columns
//! - **JSON / XML**: records keyed by header
//! - **ZIP**: several outputs bundled into one archive

mod archive;
mod csv;
mod error;
mod excel;
mod json;
mod substitute;
mod writer;
mod xml;

// === Error Types ===
pub use error::{OutputError, Result};

// === Writers ===
pub use csv::write_csv;
pub use excel::{MAX_COLUMN_WIDTH, column_width, write_excel};
pub use json::write_json;
pub use writer::{DEFAULT_SHEET_NAME, OutputArtifact, OutputWriter};
pub use xml::{element_name, write_xml};

// === Encoding ===
pub use substitute::{SubstitutionTable, encode_lossy};

// === Archives ===
pub use archive::{ArchiveEntry, archive_entry_name, bundle};
