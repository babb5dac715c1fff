//! Parser and validator for Markdown deployment guides.
//!
//! A guide is an ordered list of steps, optionally grouped into presets,
//! written once per language. Each language is parsed on its own, checked
//! for structural agreement with the base language and merged into one
//! tree whose text fields are keyed by language.
//!
//! ```
//! use deploy_guide::parse_single_language;
//!
//! let guide = parse_single_language(
//!     "## Step 1: Deploy {#deploy type=docker_deploy required=true}\n\nRun it.\n",
//!     "en",
//! );
//! assert!(!guide.has_errors());
//! assert_eq!(guide.steps[0].id, "deploy");
//! ```

pub mod error;
pub mod localized;
pub mod model;
pub mod parser;
pub mod render;
pub mod validate;

pub use error::{ErrorKind, ParseError, ParseWarning, WarningKind};
pub use localized::Localized;
pub use model::*;
pub use parser::{
    parse_bilingual_legacy, parse_bilingual_with, parse_multilang, parse_multilang_with,
    parse_single_language,
    split_by_language, LanguageSplit, MergeConfig,
};
pub use validate::validate_structure;
