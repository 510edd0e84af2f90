pub mod parser;
pub mod resolver;
pub mod substitute;
pub mod tables;
pub mod translator;

pub use resolver::PathResolver;
pub use substitute::SubstitutionTable;
pub use tables::MappingTables;
pub use translator::PathTranslator;
