pub mod defaults;
pub mod json;
pub mod modernizer;
pub mod orchestrator;
pub mod recovery;
pub mod review;
pub mod sanitizer;
pub mod validator;

pub use modernizer::{CodeModernizer, LintFinding, LintIssue, lint};
pub use recovery::JsonRecovery;
pub use review::SemanticReviewer;
pub use sanitizer::{linear_connections, sanitize};
pub use validator::{ConnectionSource, StructuralValidator};
