mod record;
mod record_class;
mod record_data;
mod record_type;

pub use record::Record;
pub use record_class::RecordClass;
pub use record_data::RecordData;
pub use record_type::RecordType;
