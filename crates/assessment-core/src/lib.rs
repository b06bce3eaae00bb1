pub mod error;
pub mod format;
pub mod locale;
pub mod params;
pub mod scale;
pub mod traits;
pub mod types;
pub mod validate;

pub use error::*;
pub use locale::{resolve_language, Language, LanguagePolicy, Localizer, Phrasebook};
pub use params::*;
pub use traits::*;
pub use types::*;
pub use validate::{validate_intake, ValidatedIntake};
