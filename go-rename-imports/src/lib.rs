pub mod diff;
pub mod discovery;
pub mod error;
pub mod listing;
pub mod mutator;
pub mod pattern;
pub mod source;
pub mod surgical;
pub mod writer;


pub use diff::{file_diff, DiffStats, FileDiff};
pub use discovery::{find_go_files, resolve_inputs};
pub use error::{MutateError, PatternError, SourceError};
pub use listing::{format_import_line, list_file_imports};
pub use mutator::{modify_file, mutate_imports, TargetFile};
pub use pattern::{parse_ordered, ImportCommand, Pattern, PatternKind};
pub use source::GoSource;
pub use writer::{commit, write_atomically};
