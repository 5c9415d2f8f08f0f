//! Shapefile format layer
//!
//! Archive scanning and extraction, attribute table inspection, text
//! encodings and geometry reading. Each step works on the output of the one
//! before it.

pub mod archive;
pub mod attributes;
pub mod encoding;
pub mod shapefile;

pub use archive::{
    validate_archive, ArchiveValidation, ComponentSet, ExtractedSet, IncompleteSet,
    ShapefileArchive,
};
pub use attributes::{inspect_attributes, AttributeTableInfo, DbfField};
pub use encoding::{encoding_for_code_page, read_code_page};
pub use self::shapefile::{assemble_dataset, read_geometry, read_prj, resolve_prj};
