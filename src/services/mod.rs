pub mod conflicts;
pub mod export_service;
pub mod id_remapper;
pub mod import_service;
pub mod project_service;
pub mod upload_service;

pub use conflicts::{default_login_mapping, key_conflict, ConflictReport};
pub use export_service::{ExportService, ProjectArchive};
pub use id_remapper::IdRemapper;
pub use import_service::{ImportResolutions, ImportService, PreparedImport};
pub use project_service::ProjectService;
pub use upload_service::UploadService;
