pub mod dependency_file;
pub mod parser;
