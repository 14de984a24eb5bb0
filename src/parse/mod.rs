pub mod annotation;
pub mod subject;

pub use annotation::{
    parse_annotations, try_parse_annotations, AnnotationRecord, SpeciesSlot, NODATA, NONE,
    SPECIES_SLOTS,
};
pub use subject::{parse_subject, try_parse_subject};
